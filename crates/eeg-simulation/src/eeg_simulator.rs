//! EEG recording simulator with seeded rhythms and noise

use crate::rhythms::RhythmProfile;
use eeg_core::{EegError, EegResult, Recording, DEFAULT_SAMPLING_RATE, SCHIZOPHRENIA_CHANNELS};
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Configuration for EEG simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EegSimConfig {
    /// Sampling rate in Hz
    pub sampling_rate: f64,
    /// Electrode names, one column each
    pub channels: Vec<String>,
    /// Rhythm mixture to generate
    pub profile: RhythmProfile,
    pub noise: NoiseConfig,
    /// Power line interference (50/60Hz)
    pub powerline_freq: Option<f64>,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
}

/// Noise configuration for realistic EEG simulation
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Gaussian noise standard deviation (µV, 0.0 = no noise)
    pub gaussian_std: f64,
    /// Baseline wander amplitude (µV)
    pub baseline_wander: f64,
    /// Relative spread of rhythm amplitudes between channels
    pub amplitude_jitter: f64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            gaussian_std: 5.0,
            baseline_wander: 3.0,
            amplitude_jitter: 0.2,
        }
    }
}

impl Default for EegSimConfig {
    fn default() -> Self {
        Self {
            sampling_rate: DEFAULT_SAMPLING_RATE,
            channels: SCHIZOPHRENIA_CHANNELS.iter().map(|c| c.to_string()).collect(),
            profile: RhythmProfile::Resting,
            noise: NoiseConfig::default(),
            powerline_freq: None,
            seed: None,
        }
    }
}

impl EegSimConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_profile(mut self, profile: RhythmProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn validate(&self) -> EegResult<()> {
        if !(self.sampling_rate.is_finite() && self.sampling_rate > 0.0) {
            return Err(EegError::InvalidSamplingRate { rate: self.sampling_rate });
        }
        if self.channels.is_empty() {
            return Err(EegError::InvalidConfig {
                reason: "Simulation needs at least one channel".to_string(),
            });
        }
        if !(0.0..1.0).contains(&self.noise.amplitude_jitter) {
            return Err(EegError::InvalidConfig {
                reason: format!("Amplitude jitter {} must lie in [0, 1)", self.noise.amplitude_jitter),
            });
        }
        Ok(())
    }
}

/// EEG recording simulator
pub struct EegSimulator {
    config: EegSimConfig,
    rng: rand::rngs::StdRng,
    normal_dist: Normal<f64>,
}

impl EegSimulator {
    /// Create new EEG simulator with configuration
    pub fn new(config: EegSimConfig) -> EegResult<Self> {
        config.validate()?;

        let seed = config.seed.unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0)
        });

        let rng = rand::rngs::StdRng::seed_from_u64(seed);
        let normal_dist = Normal::new(0.0, config.noise.gaussian_std).map_err(|e| {
            EegError::InvalidConfig {
                reason: format!("Failed to create normal distribution: {}", e),
            }
        })?;

        Ok(EegSimulator { config, rng, normal_dist })
    }

    /// Generate a recording of `duration_sec` seconds, one column per configured channel
    pub fn generate(&mut self, duration_sec: f64) -> EegResult<Recording> {
        if !(duration_sec.is_finite() && duration_sec > 0.0) {
            return Err(EegError::InvalidConfig {
                reason: format!("Simulation duration must be positive, got {}s", duration_sec),
            });
        }

        let samples = (duration_sec * self.config.sampling_rate) as usize;
        let dt = 1.0 / self.config.sampling_rate;
        let rhythms = self.config.profile.rhythms();
        let jitter = self.config.noise.amplitude_jitter;

        let channels = self.config.channels.clone();
        let mut columns = Vec::with_capacity(channels.len());
        for name in channels {
            // every channel gets its own phases and gains
            let components: Vec<(f64, f64)> = rhythms
                .iter()
                .map(|_| {
                    let phase = self.rng.gen_range(0.0..2.0 * PI);
                    let gain = if jitter > 0.0 {
                        self.rng.gen_range(1.0 - jitter..1.0 + jitter)
                    } else {
                        1.0
                    };
                    (phase, gain)
                })
                .collect();

            let data: Vec<f64> = (0..samples)
                .map(|i| {
                    let time = i as f64 * dt;
                    let mut value: f64 = rhythms
                        .iter()
                        .zip(&components)
                        .map(|(rhythm, &(phase, gain))| gain * rhythm.value_at(time, phase))
                        .sum();

                    value += self.add_noise(time);

                    if let Some(powerline_freq) = self.config.powerline_freq {
                        value += add_powerline_interference(time, powerline_freq);
                    }

                    value
                })
                .collect();

            columns.push((name, data));
        }

        Recording::new(self.config.sampling_rate, columns)
    }

    /// Gaussian noise plus slow baseline drift
    fn add_noise(&mut self, time: f64) -> f64 {
        let gaussian = self.normal_dist.sample(&mut self.rng);
        let wander = self.config.noise.baseline_wander * (2.0 * PI * 0.1 * time).sin();
        gaussian + wander
    }

    /// Get current configuration
    pub fn config(&self) -> &EegSimConfig {
        &self.config
    }
}

fn add_powerline_interference(time: f64, frequency: f64) -> f64 {
    let amplitude = 2.0;
    amplitude * (2.0 * PI * frequency * time).sin()
}
