//! EEG-Processing: analysis core for EEG recordings
//!
//! Zero-phase bandpass filtering, windowed entropy, wavelet time-frequency
//! decomposition and the aggregation of their results.

pub mod aggregate;
pub mod config;
pub mod entropy;
pub mod filters;
pub mod session;
pub mod wavelet;

pub use aggregate::{entropy_table, ChannelEntropy, EntropyComparison};
pub use config::{AnalysisConfig, AnalysisProfile};
pub use entropy::{
    ComplexityMetric, ComplexitySummary, EntropyRecord, MetricSet, WindowedEntropy,
};
pub use filters::{BandpassFilter, ButterworthBandpass, FilterConfig};
pub use session::{
    AnalysisOutcome, AnalysisSession, ComplexityReport, FrequencyAnalysis, NoDataReason,
};
pub use wavelet::{
    extract_band_power, BandPowerMap, ComplexMorlet, Cwt, TimeFrequencyMap, WaveletConfig,
};
