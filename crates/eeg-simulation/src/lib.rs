//! EEG-Simulation: synthetic EEG recordings
//!
//! Seeded band-limited rhythms plus noise, for tests, benchmarks and demos.

pub mod eeg_simulator;
pub mod rhythms;

pub use eeg_simulator::*;
pub use rhythms::*;
