//! Pre-defined EEG rhythm mixtures for realistic simulation

use eeg_core::EegBand;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// One oscillatory component of the simulated EEG
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rhythm {
    pub band: EegBand,
    pub frequency_hz: f64,
    /// Peak amplitude (µV)
    pub amplitude: f64,
}

impl Rhythm {
    pub fn new(band: EegBand, frequency_hz: f64, amplitude: f64) -> Self {
        Self { band, frequency_hz, amplitude }
    }

    /// Value at `time` seconds for a given phase offset (radians)
    pub fn value_at(&self, time: f64, phase: f64) -> f64 {
        self.amplitude * (2.0 * PI * self.frequency_hz * time + phase).sin()
    }
}

/// Predefined rhythm mixtures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RhythmProfile {
    /// Eyes-closed rest, alpha dominant
    Resting,
    /// Slowed EEG with strong delta/theta and little fast activity
    ReducedComplexity,
    /// Task engagement, beta and gamma dominant
    Active,
}

impl RhythmProfile {
    pub const ALL: [RhythmProfile; 3] = [
        RhythmProfile::Resting,
        RhythmProfile::ReducedComplexity,
        RhythmProfile::Active,
    ];

    pub fn rhythms(&self) -> Vec<Rhythm> {
        match self {
            RhythmProfile::Resting => vec![
                Rhythm::new(EegBand::Delta, 2.0, 10.0),
                Rhythm::new(EegBand::Theta, 6.0, 8.0),
                Rhythm::new(EegBand::Alpha, 10.0, 20.0),
                Rhythm::new(EegBand::Beta, 20.0, 5.0),
                Rhythm::new(EegBand::Gamma, 40.0, 2.0),
            ],
            RhythmProfile::ReducedComplexity => vec![
                Rhythm::new(EegBand::Delta, 2.0, 25.0),
                Rhythm::new(EegBand::Theta, 5.0, 15.0),
                Rhythm::new(EegBand::Alpha, 10.0, 8.0),
            ],
            RhythmProfile::Active => vec![
                Rhythm::new(EegBand::Theta, 6.0, 5.0),
                Rhythm::new(EegBand::Alpha, 10.0, 6.0),
                Rhythm::new(EegBand::Beta, 18.0, 10.0),
                Rhythm::new(EegBand::Gamma, 38.0, 4.0),
            ],
        }
    }

    /// Strongest component of the mixture
    pub fn dominant_band(&self) -> EegBand {
        self.rhythms()
            .iter()
            .max_by(|a, b| a.amplitude.total_cmp(&b.amplitude))
            .map(|r| r.band)
            .unwrap_or(EegBand::Alpha)
    }

    pub fn description(&self) -> &'static str {
        match self {
            RhythmProfile::Resting => "Resting state, alpha dominant",
            RhythmProfile::ReducedComplexity => "Slowed EEG with reduced complexity",
            RhythmProfile::Active => "Task engagement, beta dominant",
        }
    }
}

impl std::str::FromStr for RhythmProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "resting" | "rest" => Ok(RhythmProfile::Resting),
            "reduced" | "reduced-complexity" => Ok(RhythmProfile::ReducedComplexity),
            "active" | "task" => Ok(RhythmProfile::Active),
            other => Err(format!("unknown rhythm profile '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dominant_bands() {
        assert_eq!(RhythmProfile::Resting.dominant_band(), EegBand::Alpha);
        assert_eq!(RhythmProfile::ReducedComplexity.dominant_band(), EegBand::Delta);
        assert_eq!(RhythmProfile::Active.dominant_band(), EegBand::Beta);
    }

    #[test]
    fn test_rhythm_value() {
        let rhythm = Rhythm::new(EegBand::Alpha, 10.0, 20.0);
        assert!(rhythm.value_at(0.0, 0.0).abs() < 1e-12);
        assert!((rhythm.value_at(0.025, 0.0) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_profile_parsing() {
        assert_eq!("Rest".parse::<RhythmProfile>(), Ok(RhythmProfile::Resting));
        assert_eq!("reduced".parse::<RhythmProfile>(), Ok(RhythmProfile::ReducedComplexity));
        assert!("sleep".parse::<RhythmProfile>().is_err());
    }

    #[test]
    fn test_rhythm_frequencies_sit_in_their_band() {
        let table = eeg_core::BandTable::standard();
        for profile in RhythmProfile::ALL {
            for rhythm in profile.rhythms() {
                let band = table.get(rhythm.band).unwrap();
                assert!(band.contains(rhythm.frequency_hz), "{:?}", rhythm);
            }
        }
    }
}
