//! EEG montage and frequency band tables
//!
//! Both are plain configuration values handed to the analyzers, so tests can
//! build their own tables instead of relying on process-wide constants.

use crate::config_error;
use crate::error::EegResult;
use serde::{Deserialize, Serialize};

/// Clinical EEG sampling rate assumed when nothing else is configured
pub const DEFAULT_SAMPLING_RATE: f64 = 256.0;

/// Electrodes most often reported in schizophrenia EEG studies
pub const SCHIZOPHRENIA_CHANNELS: [&str; 8] = ["F3", "F4", "F7", "F8", "T3", "T4", "Cz", "Pz"];

/// Ordered set of electrode names considered relevant for analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Montage {
    channels: Vec<String>,
}

impl Montage {
    /// Create a montage from electrode names, keeping order and dropping duplicates
    pub fn new<I, S>(channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for channel in channels {
            let channel = channel.into();
            if !unique.contains(&channel) {
                unique.push(channel);
            }
        }
        Montage { channels: unique }
    }

    /// Frontal, temporal and midline electrodes used by the dashboard
    pub fn schizophrenia() -> Self {
        Self::new(SCHIZOPHRENIA_CHANNELS)
    }

    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    pub fn contains(&self, channel: &str) -> bool {
        self.channels.iter().any(|c| c == channel)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

impl Default for Montage {
    fn default() -> Self {
        Self::schizophrenia()
    }
}

/// Conventional EEG frequency bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EegBand {
    Delta,
    Theta,
    Alpha,
    Beta,
    Gamma,
}

impl EegBand {
    pub const ALL: [EegBand; 5] = [
        EegBand::Delta,
        EegBand::Theta,
        EegBand::Alpha,
        EegBand::Beta,
        EegBand::Gamma,
    ];
}

impl std::fmt::Display for EegBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EegBand::Delta => write!(f, "Delta"),
            EegBand::Theta => write!(f, "Theta"),
            EegBand::Alpha => write!(f, "Alpha"),
            EegBand::Beta => write!(f, "Beta"),
            EegBand::Gamma => write!(f, "Gamma"),
        }
    }
}

/// Frequency range of one band, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBand {
    pub band: EegBand,
    pub low_hz: f64,
    pub high_hz: f64,
}

impl FrequencyBand {
    pub fn new(band: EegBand, low_hz: f64, high_hz: f64) -> Self {
        Self { band, low_hz, high_hz }
    }

    /// Whether `freq_hz` falls inside `[low_hz, high_hz]`
    pub fn contains(&self, freq_hz: f64) -> bool {
        freq_hz >= self.low_hz && freq_hz <= self.high_hz
    }
}

/// Table of bands used for band power aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandTable {
    bands: Vec<FrequencyBand>,
}

impl BandTable {
    /// Build a table; ranges must be finite, non-negative and ordered, bands unique
    pub fn new(bands: Vec<FrequencyBand>) -> EegResult<Self> {
        for (i, band) in bands.iter().enumerate() {
            if !band.low_hz.is_finite() || !band.high_hz.is_finite() {
                return Err(config_error!("{} band has a non-finite range", band.band));
            }
            if band.low_hz < 0.0 || band.high_hz < band.low_hz {
                return Err(config_error!(
                    "{} band range {}-{}Hz is invalid",
                    band.band, band.low_hz, band.high_hz
                ));
            }
            if bands[..i].iter().any(|b| b.band == band.band) {
                return Err(config_error!("{} band listed twice", band.band));
            }
        }
        Ok(BandTable { bands })
    }

    /// Delta 0.5-4, Theta 4-8, Alpha 8-12, Beta 12-30, Gamma 30-50 Hz
    pub fn standard() -> Self {
        BandTable {
            bands: vec![
                FrequencyBand::new(EegBand::Delta, 0.5, 4.0),
                FrequencyBand::new(EegBand::Theta, 4.0, 8.0),
                FrequencyBand::new(EegBand::Alpha, 8.0, 12.0),
                FrequencyBand::new(EegBand::Beta, 12.0, 30.0),
                FrequencyBand::new(EegBand::Gamma, 30.0, 50.0),
            ],
        }
    }

    pub fn bands(&self) -> &[FrequencyBand] {
        &self.bands
    }

    pub fn get(&self, band: EegBand) -> Option<&FrequencyBand> {
        self.bands.iter().find(|b| b.band == band)
    }
}

impl Default for BandTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schizophrenia_montage() {
        let montage = Montage::schizophrenia();
        assert_eq!(montage.len(), 8);
        assert!(montage.contains("Cz"));
        assert!(!montage.contains("O1"));
        assert_eq!(montage.channels()[0], "F3");
    }

    #[test]
    fn test_montage_deduplicates() {
        let montage = Montage::new(["F3", "F4", "F3"]);
        assert_eq!(montage.channels(), &["F3".to_string(), "F4".to_string()]);
    }

    #[test]
    fn test_band_contains_is_inclusive() {
        let delta = FrequencyBand::new(EegBand::Delta, 0.5, 4.0);
        assert!(delta.contains(0.5));
        assert!(delta.contains(4.0));
        assert!(!delta.contains(4.01));
    }

    #[test]
    fn test_band_table_validation() {
        assert!(BandTable::new(vec![FrequencyBand::new(EegBand::Alpha, 12.0, 8.0)]).is_err());
        assert!(BandTable::new(vec![
            FrequencyBand::new(EegBand::Alpha, 8.0, 12.0),
            FrequencyBand::new(EegBand::Alpha, 9.0, 11.0),
        ])
        .is_err());

        let table = BandTable::new(vec![
            FrequencyBand::new(EegBand::Delta, 0.5, 4.0),
            FrequencyBand::new(EegBand::Gamma, 30.0, 50.0),
        ])
        .unwrap();
        assert_eq!(table.bands().len(), 2);
        assert!(table.get(EegBand::Theta).is_none());
    }

    #[test]
    fn test_band_display() {
        let names: Vec<String> = EegBand::ALL.iter().map(|b| b.to_string()).collect();
        assert_eq!(names, vec!["Delta", "Theta", "Alpha", "Beta", "Gamma"]);
    }
}
