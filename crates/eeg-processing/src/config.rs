//! Configuration management for EEG analysis

use crate::entropy::MetricSet;
use crate::filters::FilterConfig;
use crate::wavelet::WaveletConfig;
use eeg_core::{BandTable, EegError, EegResult, Montage, DEFAULT_SAMPLING_RATE};
use serde::{Deserialize, Serialize};

/// Analysis configuration shared by every request of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Configuration name/profile
    pub name: String,
    pub profile: AnalysisProfile,
    /// Sampling rate assumed for recordings that do not carry one (Hz)
    pub sampling_rate: f64,
    /// Channels considered relevant
    pub montage: Montage,
    /// Bands reported by the frequency analysis
    pub bands: BandTable,
    /// Bandpass applied before the wavelet transform
    pub filter: FilterConfig,
    /// Skip the bandpass stage of the frequency analysis when false
    pub filter_enabled: bool,
    /// Entropy window length (s)
    pub window_sec: f64,
    pub metrics: MetricSet,
    pub wavelet: WaveletConfig,
}

/// Analysis profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisProfile {
    /// Cheap entropy proxies, as shown on the dashboard
    Dashboard,
    /// Sample, approximate and permutation entropy per window
    Canonical,
    Custom,
}

impl AnalysisConfig {
    /// Dashboard defaults: 256 Hz, 1-50 Hz order-5 bandpass, 5 s windows, entropy proxies
    pub fn schizophrenia_default() -> Self {
        AnalysisConfig {
            name: "Schizophrenia EEG".to_string(),
            profile: AnalysisProfile::Dashboard,
            sampling_rate: DEFAULT_SAMPLING_RATE,
            montage: Montage::schizophrenia(),
            bands: BandTable::standard(),
            filter: FilterConfig::default(),
            filter_enabled: true,
            window_sec: 5.0,
            metrics: MetricSet::proxies(),
            wavelet: WaveletConfig::default(),
        }
    }

    /// Same pipeline with the canonical entropy estimators per window
    pub fn canonical_entropy() -> Self {
        AnalysisConfig {
            name: "Canonical entropy".to_string(),
            profile: AnalysisProfile::Canonical,
            metrics: MetricSet::canonical(),
            ..Self::schizophrenia_default()
        }
    }

    /// Create configuration suitable for given profile
    pub fn for_profile(profile: AnalysisProfile) -> Self {
        match profile {
            AnalysisProfile::Dashboard => Self::schizophrenia_default(),
            AnalysisProfile::Canonical => Self::canonical_entropy(),
            AnalysisProfile::Custom => AnalysisConfig {
                name: "Custom".to_string(),
                profile: AnalysisProfile::Custom,
                ..Self::schizophrenia_default()
            },
        }
    }

    pub fn with_window_sec(mut self, window_sec: f64) -> Self {
        self.window_sec = window_sec;
        self
    }

    pub fn with_metrics(mut self, metrics: MetricSet) -> Self {
        self.metrics = metrics;
        self
    }

    /// Validate entire configuration against its own sampling rate
    pub fn validate(&self) -> EegResult<()> {
        self.validate_for(self.sampling_rate)
    }

    /// Validate entire configuration for data recorded at `sampling_rate`.
    ///
    /// Filter cutoffs and the entropy window depend on the rate of the data
    /// they run over, which may differ from `self.sampling_rate`.
    pub fn validate_for(&self, sampling_rate: f64) -> EegResult<()> {
        if !(sampling_rate.is_finite() && sampling_rate > 0.0) {
            return Err(EegError::InvalidSamplingRate { rate: sampling_rate });
        }

        if self.montage.is_empty() {
            return Err(EegError::InvalidConfig {
                reason: "Montage lists no channels".to_string(),
            });
        }

        // re-check tables that arrived through deserialization
        BandTable::new(self.bands.bands().to_vec())?;

        if self.filter_enabled {
            self.filter.validate(sampling_rate)?;
        }

        if !(self.window_sec.is_finite() && self.window_sec > 0.0) {
            return Err(EegError::InvalidConfig {
                reason: format!("Window size must be positive, got {}s", self.window_sec),
            });
        }

        if self.metrics.is_empty() {
            return Err(EegError::InvalidConfig {
                reason: "No entropy metrics selected".to_string(),
            });
        }

        self.wavelet.validate()
    }

    /// Export configuration to JSON
    pub fn to_json(&self) -> EegResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| EegError::Serialization {
            reason: format!("Failed to serialize configuration: {}", e),
        })
    }

    /// Import configuration from JSON
    pub fn from_json(json: &str) -> EegResult<Self> {
        serde_json::from_str(json).map_err(|e| EegError::Serialization {
            reason: format!("Failed to deserialize configuration: {}", e),
        })
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::schizophrenia_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::ComplexityMetric;

    #[test]
    fn test_default_config() {
        let config = AnalysisConfig::default();
        assert_eq!(config.profile, AnalysisProfile::Dashboard);
        assert_eq!(config.sampling_rate, 256.0);
        assert_eq!(config.filter, FilterConfig::bandpass(1.0, 50.0, 5));
        assert_eq!(config.metrics, MetricSet::proxies());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_profile_creation() {
        let canonical = AnalysisConfig::for_profile(AnalysisProfile::Canonical);
        assert_eq!(canonical.profile, AnalysisProfile::Canonical);
        assert_eq!(canonical.metrics.metrics()[0], ComplexityMetric::SampleEntropy);

        let custom = AnalysisConfig::for_profile(AnalysisProfile::Custom);
        assert_eq!(custom.profile, AnalysisProfile::Custom);
        assert!(custom.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AnalysisConfig::default();

        config.window_sec = 0.0;
        assert!(config.validate().is_err());

        config.window_sec = 5.0;
        config.filter = FilterConfig::bandpass(1.0, 200.0, 5);
        assert!(matches!(config.validate(), Err(EegError::InvalidFilterBand { .. })));

        // cutoffs are irrelevant while the bandpass is off
        config.filter_enabled = false;
        assert!(config.validate().is_ok());

        config.sampling_rate = -1.0;
        assert!(matches!(config.validate(), Err(EegError::InvalidSamplingRate { .. })));
    }

    #[test]
    fn test_builder_methods() {
        let config = AnalysisConfig::default()
            .with_window_sec(10.0)
            .with_metrics(MetricSet::canonical());
        assert_eq!(config.window_sec, 10.0);
        assert_eq!(config.metrics, MetricSet::canonical());
    }

    #[test]
    fn test_json_serialization() {
        let config = AnalysisConfig::canonical_entropy().with_window_sec(7.5);

        let json = config.to_json().unwrap();
        assert!(json.contains("\"window_sec\": 7.5"));

        let restored = AnalysisConfig::from_json(&json).unwrap();
        assert_eq!(restored, config);
    }

    #[test]
    fn test_malformed_json_is_serialization_error() {
        assert!(matches!(
            AnalysisConfig::from_json("{ not json"),
            Err(EegError::Serialization { .. })
        ));
    }

    #[test]
    fn test_deserialized_band_table_is_checked() {
        let mut json: serde_json::Value =
            serde_json::from_str(&AnalysisConfig::default().to_json().unwrap()).unwrap();
        json["bands"]["bands"][0]["high_hz"] = serde_json::json!(-1.0);

        let config: AnalysisConfig = serde_json::from_value(json).unwrap();
        assert!(config.validate().is_err());
    }
}
