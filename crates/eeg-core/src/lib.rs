//! EEG-Core: Foundation types for EEG complexity analysis
//!
//! Recordings, channel signals, time ranges, montage and band tables, and the
//! shared error type.

pub mod error;
pub mod montage;
pub mod recording;

pub use error::{EegError, EegResult};
pub use montage::*;
pub use recording::*;
