//! Continuous wavelet transform with a complex Morlet mother wavelet

use eeg_core::{BandTable, EegBand, EegError, EegResult, SignalSlice};
use num_complex::Complex64;
use realfft::RealFftPlanner;
use rustfft::FftPlanner;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::PI;
use tracing::debug;

/// Average power per band
pub type BandPowerMap = BTreeMap<EegBand, f64>;

/// Complex Morlet wavelet `cmor{B}-{C}`:
/// ψ(t) = (πB)^-½ · exp(-t²/B) · exp(2πiCt)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComplexMorlet {
    /// Bandwidth parameter B
    pub bandwidth: f64,
    /// Center frequency C, in cycles per unit scale
    pub center_frequency: f64,
}

impl ComplexMorlet {
    pub fn new(bandwidth: f64, center_frequency: f64) -> EegResult<Self> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(bandwidth) || !positive(center_frequency) {
            return Err(EegError::InvalidConfig {
                reason: format!(
                    "Morlet parameters must be positive (B={}, C={})",
                    bandwidth, center_frequency
                ),
            });
        }
        Ok(ComplexMorlet { bandwidth, center_frequency })
    }

    pub fn name(&self) -> String {
        format!("cmor{:?}-{:?}", self.bandwidth, self.center_frequency)
    }

    /// Frequency in Hz analyzed at `scale`
    pub fn scale_to_frequency(&self, scale: f64, sampling_rate: f64) -> f64 {
        self.center_frequency * sampling_rate / scale
    }

    /// Spectrum of the scaled, energy-normalized wavelet at `freq` cycles per sample
    fn scaled_spectrum(&self, scale: f64, freq: f64) -> f64 {
        let offset = scale * freq - self.center_frequency;
        scale.sqrt() * (-PI * PI * self.bandwidth * offset * offset).exp()
    }
}

impl Default for ComplexMorlet {
    fn default() -> Self {
        ComplexMorlet { bandwidth: 1.5, center_frequency: 1.0 }
    }
}

/// Wavelet analysis parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveletConfig {
    pub wavelet: ComplexMorlet,
    /// Analysis scales, in samples
    pub scales: Vec<f64>,
    /// Lowest frequency kept (Hz, inclusive)
    pub min_freq: f64,
    /// Highest frequency kept (Hz, inclusive)
    pub max_freq: f64,
}

impl WaveletConfig {
    pub fn validate(&self) -> EegResult<()> {
        ComplexMorlet::new(self.wavelet.bandwidth, self.wavelet.center_frequency)?;

        if self.scales.is_empty() {
            return Err(EegError::InvalidConfig { reason: "No wavelet scales given".to_string() });
        }
        if let Some(bad) = self.scales.iter().find(|s| !(s.is_finite() && **s > 0.0)) {
            return Err(EegError::InvalidConfig {
                reason: format!("Wavelet scale {} must be positive", bad),
            });
        }
        if !self.min_freq.is_finite() || !self.max_freq.is_finite()
            || self.min_freq < 0.0 || self.min_freq > self.max_freq
        {
            return Err(EegError::InvalidConfig {
                reason: format!(
                    "Invalid frequency bounds [{}, {}]Hz",
                    self.min_freq, self.max_freq
                ),
            });
        }
        Ok(())
    }
}

impl Default for WaveletConfig {
    fn default() -> Self {
        WaveletConfig {
            wavelet: ComplexMorlet::default(),
            scales: (1..128).map(f64::from).collect(),
            min_freq: 0.5,
            max_freq: 50.0,
        }
    }
}

/// Coefficients of one transform restricted to the frequencies of interest.
///
/// `coefficients[i]` belongs to `frequencies[i]` and `scales[i]`; every row
/// has one column per entry of `times`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeFrequencyMap {
    pub coefficients: Vec<Vec<Complex64>>,
    pub frequencies: Vec<f64>,
    pub scales: Vec<f64>,
    pub times: Vec<f64>,
}

impl TimeFrequencyMap {
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when there is nothing to display
    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty() || self.times.is_empty()
    }

    /// `|c|` per coefficient, for heatmaps
    pub fn magnitude(&self) -> Vec<Vec<f64>> {
        self.coefficients
            .iter()
            .map(|row| row.iter().map(|c| c.norm()).collect())
            .collect()
    }

    pub fn max_magnitude(&self) -> f64 {
        self.coefficients
            .iter()
            .flatten()
            .map(|c| c.norm())
            .fold(0.0, f64::max)
    }

    pub fn band_power(&self, bands: &BandTable) -> BandPowerMap {
        extract_band_power(&self.coefficients, &self.frequencies, bands)
    }
}

/// Mean `|c|²` over every coefficient of the rows whose frequency lies in each band.
///
/// A band without any matching row gets 0.
pub fn extract_band_power(
    coefficients: &[Vec<Complex64>],
    frequencies: &[f64],
    bands: &BandTable,
) -> BandPowerMap {
    bands
        .bands()
        .iter()
        .map(|band| {
            let mut total = 0.0;
            let mut count = 0usize;
            for (row, &freq) in coefficients.iter().zip(frequencies) {
                if band.contains(freq) {
                    total += row.iter().map(|c| c.norm_sqr()).sum::<f64>();
                    count += row.len();
                }
            }
            let power = if count > 0 { total / count as f64 } else { 0.0 };
            (band.band, power)
        })
        .collect()
}

/// CWT engine for a fixed wavelet, scale set and frequency band of interest
#[derive(Debug, Clone)]
pub struct Cwt {
    wavelet: ComplexMorlet,
    scales: Vec<f64>,
    min_freq: f64,
    max_freq: f64,
}

impl Cwt {
    /// Build from validated configuration; scales are sorted ascending
    pub fn new(config: &WaveletConfig) -> EegResult<Self> {
        config.validate()?;

        let mut scales = config.scales.clone();
        scales.sort_by(|a, b| a.total_cmp(b));
        scales.dedup();

        Ok(Cwt {
            wavelet: config.wavelet,
            scales,
            min_freq: config.min_freq,
            max_freq: config.max_freq,
        })
    }

    pub fn wavelet(&self) -> &ComplexMorlet {
        &self.wavelet
    }

    /// Scale/frequency pairs inside the frequency band of interest
    pub fn retained(&self, sampling_rate: f64) -> Vec<(f64, f64)> {
        self.scales
            .iter()
            .map(|&s| (s, self.wavelet.scale_to_frequency(s, sampling_rate)))
            .filter(|&(_, f)| f >= self.min_freq && f <= self.max_freq)
            .collect()
    }

    /// Transform `slice`, keeping only rows inside `[min_freq, max_freq]`.
    ///
    /// Convolution is done in the frequency domain on a zero-padded copy of the
    /// slice; each output row has exactly `slice.len()` columns.
    pub fn transform(&self, slice: &SignalSlice<'_>) -> EegResult<TimeFrequencyMap> {
        let retained = self.retained(slice.sampling_rate);
        if slice.is_empty() || retained.is_empty() {
            debug!(
                samples = slice.len(),
                rows = retained.len(),
                "nothing to transform"
            );
            return Ok(TimeFrequencyMap::empty());
        }

        let n = slice.len();
        let fft_len = (2 * n).next_power_of_two();

        let mut real_planner = RealFftPlanner::<f64>::new();
        let forward = real_planner.plan_fft_forward(fft_len);
        let mut input = forward.make_input_vec();
        input[..n].copy_from_slice(slice.samples);
        let mut spectrum = forward.make_output_vec();
        forward
            .process(&mut input, &mut spectrum)
            .map_err(|e| EegError::InvalidConfig { reason: format!("Forward FFT failed: {}", e) })?;

        let inverse = FftPlanner::<f64>::new().plan_fft_inverse(fft_len);
        let norm = 1.0 / fft_len as f64;

        let mut coefficients = Vec::with_capacity(retained.len());
        let mut buffer = vec![Complex64::new(0.0, 0.0); fft_len];
        for &(scale, _) in &retained {
            buffer.fill(Complex64::new(0.0, 0.0));
            // analytic wavelet: negative frequencies stay zero
            for (k, bin) in spectrum.iter().enumerate() {
                let freq = k as f64 / fft_len as f64;
                buffer[k] = *bin * self.wavelet.scaled_spectrum(scale, freq);
            }
            inverse.process(&mut buffer);
            coefficients.push(buffer[..n].iter().map(|c| *c * norm).collect());
        }

        let (scales, frequencies): (Vec<f64>, Vec<f64>) = retained.into_iter().unzip();
        debug!(
            samples = n,
            fft_len,
            rows = coefficients.len(),
            wavelet = %self.wavelet.name(),
            "computed CWT"
        );

        Ok(TimeFrequencyMap {
            coefficients,
            frequencies,
            scales,
            times: slice.time_axis(),
        })
    }
}

impl Default for Cwt {
    fn default() -> Self {
        let config = WaveletConfig::default();
        Cwt {
            wavelet: config.wavelet,
            scales: config.scales,
            min_freq: config.min_freq,
            max_freq: config.max_freq,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eeg_core::FrequencyBand;

    const FS: f64 = 256.0;

    fn sine(freq: f64, seconds: f64) -> Vec<f64> {
        (0..(seconds * FS) as usize)
            .map(|i| (2.0 * PI * freq * i as f64 / FS).sin())
            .collect()
    }

    fn slice(samples: &[f64]) -> SignalSlice<'_> {
        SignalSlice { samples, sampling_rate: FS, start_index: 0 }
    }

    #[test]
    fn test_scale_to_frequency() {
        let wavelet = ComplexMorlet::default();
        assert_eq!(wavelet.name(), "cmor1.5-1.0");
        assert!((wavelet.scale_to_frequency(1.0, FS) - 256.0).abs() < 1e-12);
        assert!((wavelet.scale_to_frequency(64.0, FS) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_default_mask() {
        let cwt = Cwt::default();
        let retained = cwt.retained(FS);
        // 256/s <= 50 holds from scale 6 up to 127
        assert_eq!(retained.len(), 122);
        assert_eq!(retained[0].0, 6.0);
        assert!((retained[0].1 - 256.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_rows_match_frequencies() {
        let data = sine(10.0, 2.0);
        let map = Cwt::default().transform(&slice(&data)).unwrap();

        assert_eq!(map.coefficients.len(), map.frequencies.len());
        assert_eq!(map.scales.len(), map.frequencies.len());
        assert!(map.coefficients.iter().all(|row| row.len() == data.len()));
        assert_eq!(map.times.len(), data.len());
        assert!(map.frequencies.iter().all(|&f| (0.5..=50.0).contains(&f)));
    }

    #[test]
    fn test_peak_row_tracks_signal_frequency() {
        let data = sine(10.0, 4.0);
        let map = Cwt::default().transform(&slice(&data)).unwrap();

        let row_power: Vec<f64> = map
            .coefficients
            .iter()
            .map(|row| row.iter().map(|c| c.norm_sqr()).sum::<f64>())
            .collect();
        let peak = row_power
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        let peak_freq = map.frequencies[peak];
        assert!(peak_freq > 9.0 && peak_freq < 11.0, "{peak_freq}");
    }

    #[test]
    fn test_alpha_dominates_for_alpha_rhythm() {
        let data = sine(10.0, 4.0);
        let map = Cwt::default().transform(&slice(&data)).unwrap();
        let powers = map.band_power(&BandTable::standard());

        assert_eq!(powers.len(), 5);
        assert!(powers.values().all(|&p| p >= 0.0));
        let alpha = powers[&EegBand::Alpha];
        for band in [EegBand::Delta, EegBand::Theta, EegBand::Gamma] {
            assert!(alpha > powers[&band], "{band} >= Alpha");
        }
    }

    #[test]
    fn test_band_power_uses_inclusive_rows() {
        let row = |v: f64| vec![Complex64::new(v, 0.0); 4];
        let coefficients = vec![row(1.0), row(2.0), row(3.0), row(10.0)];
        let frequencies = [1.0, 2.0, 3.0, 40.0];
        let bands = BandTable::new(vec![
            FrequencyBand::new(EegBand::Delta, 0.5, 4.0),
            FrequencyBand::new(EegBand::Gamma, 30.0, 50.0),
        ])
        .unwrap();

        let powers = extract_band_power(&coefficients, &frequencies, &bands);
        assert!((powers[&EegBand::Delta] - 14.0 / 3.0).abs() < 1e-12);
        assert!((powers[&EegBand::Gamma] - 100.0).abs() < 1e-12);
        assert!(!powers.contains_key(&EegBand::Alpha));
    }

    #[test]
    fn test_band_without_rows_is_zero() {
        let coefficients = vec![vec![Complex64::new(2.0, 0.0); 3]];
        let powers = extract_band_power(&coefficients, &[10.0], &BandTable::standard());
        assert_eq!(powers[&EegBand::Gamma], 0.0);
        assert!((powers[&EegBand::Alpha] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_inputs_give_empty_map() {
        let map = Cwt::default().transform(&slice(&[])).unwrap();
        assert!(map.is_empty());
        assert!(map.band_power(&BandTable::standard()).values().all(|&p| p == 0.0));

        let config = WaveletConfig { min_freq: 100.0, max_freq: 120.0, ..Default::default() };
        let data = sine(10.0, 1.0);
        let map = Cwt::new(&config).unwrap().transform(&slice(&data)).unwrap();
        assert!(map.is_empty());
        assert!(map.frequencies.is_empty());
    }

    #[test]
    fn test_time_axis_is_absolute() {
        let data = sine(10.0, 2.0);
        let offset = SignalSlice { samples: &data[256..], sampling_rate: FS, start_index: 256 };
        let map = Cwt::default().transform(&offset).unwrap();
        assert!((map.times[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_config_validation() {
        let mut config = WaveletConfig::default();
        config.scales = vec![];
        assert!(Cwt::new(&config).is_err());

        let config = WaveletConfig { scales: vec![1.0, 0.0], ..Default::default() };
        assert!(Cwt::new(&config).is_err());

        let config = WaveletConfig { min_freq: 40.0, max_freq: 4.0, ..Default::default() };
        assert!(Cwt::new(&config).is_err());

        assert!(ComplexMorlet::new(0.0, 1.0).is_err());
    }
}
