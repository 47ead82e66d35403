//! Error handling for the EEG analysis core
//!
//! Errors cover configuration problems and failed lookups. Empty results
//! ("no windows", "no frequencies in range") are not errors and never show up here.

use core::fmt;

/// Result type alias for EEG core operations
pub type EegResult<T> = Result<T, EegError>;

/// Error type for all EEG analysis operations
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum EegError {
    /// Invalid analysis configuration
    InvalidConfig {
        /// Description of the configuration error
        reason: String,
    },

    /// Sampling rate is not usable
    InvalidSamplingRate {
        /// Provided sampling rate
        rate: f64,
    },

    /// Bandpass cutoffs cannot be turned into a filter design
    InvalidFilterBand {
        /// Low cutoff in Hz
        low_hz: f64,
        /// High cutoff in Hz
        high_hz: f64,
        /// Nyquist frequency of the signal in Hz
        nyquist_hz: f64,
    },

    /// Requested channel is absent from the recording
    ChannelNotFound {
        /// Channel name that was requested
        channel: String,
    },

    /// Channel columns of a recording have different lengths
    ChannelLengthMismatch {
        /// Channel whose length differs
        channel: String,
        /// Expected samples per channel
        expected: usize,
        /// Actual samples in the channel
        actual: usize,
    },

    /// A signal with no samples was supplied where samples are required
    EmptySignal {
        /// What was empty
        context: &'static str,
    },

    /// Signal is too short for zero-phase filtering
    SignalTooShort {
        /// Samples available
        len: usize,
        /// Samples required (exclusive lower bound)
        required: usize,
    },

    /// Serialization/deserialization error
    Serialization {
        /// Serialization error description
        reason: String,
    },
}

impl fmt::Display for EegError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EegError::InvalidConfig { reason } => {
                write!(f, "Invalid analysis configuration: {}", reason)
            }
            EegError::InvalidSamplingRate { rate } => {
                write!(f, "Invalid sampling rate: {}Hz, must be positive and finite", rate)
            }
            EegError::InvalidFilterBand { low_hz, high_hz, nyquist_hz } => {
                write!(f, "Invalid bandpass {}-{}Hz: cutoffs must satisfy 0 < low < high < {}Hz (Nyquist)",
                       low_hz, high_hz, nyquist_hz)
            }
            EegError::ChannelNotFound { channel } => {
                write!(f, "Channel '{}' not found in recording", channel)
            }
            EegError::ChannelLengthMismatch { channel, expected, actual } => {
                write!(f, "Channel '{}' has {} samples, expected {}",
                       channel, actual, expected)
            }
            EegError::EmptySignal { context } => {
                write!(f, "Empty signal: {}", context)
            }
            EegError::SignalTooShort { len, required } => {
                write!(f, "Signal too short: {} samples, need more than {}",
                       len, required)
            }
            EegError::Serialization { reason } => {
                write!(f, "Serialization error: {}", reason)
            }
        }
    }
}

impl std::error::Error for EegError {}

/// Convenience macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)+) => {
        $crate::error::EegError::InvalidConfig {
            reason: format!($($arg)+)
        }
    };
}
