//! Zero-phase Butterworth bandpass filtering

use eeg_core::{EegError, EegResult, Montage, Recording};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::debug;

/// Bandpass filter configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Low cutoff (Hz)
    pub low_cutoff: f64,
    /// High cutoff (Hz)
    pub high_cutoff: f64,
    /// Butterworth prototype order; the bandpass has twice as many poles
    pub order: usize,
}

impl FilterConfig {
    /// Create bandpass filter configuration
    pub fn bandpass(low_cutoff: f64, high_cutoff: f64, order: usize) -> Self {
        Self { low_cutoff, high_cutoff, order }
    }

    /// Check cutoffs against the Nyquist frequency of `sampling_rate`
    pub fn validate(&self, sampling_rate: f64) -> EegResult<()> {
        if !(sampling_rate.is_finite() && sampling_rate > 0.0) {
            return Err(EegError::InvalidSamplingRate { rate: sampling_rate });
        }
        if self.order == 0 {
            return Err(EegError::InvalidConfig {
                reason: "Filter order must be at least 1".to_string(),
            });
        }

        let nyquist = sampling_rate / 2.0;
        let in_range = |f: f64| f.is_finite() && f > 0.0 && f < nyquist;
        if !in_range(self.low_cutoff) || !in_range(self.high_cutoff)
            || self.low_cutoff >= self.high_cutoff
        {
            return Err(EegError::InvalidFilterBand {
                low_hz: self.low_cutoff,
                high_hz: self.high_cutoff,
                nyquist_hz: nyquist,
            });
        }

        Ok(())
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self::bandpass(1.0, 50.0, 5)
    }
}

/// Single biquad section (2nd order)
#[derive(Debug, Clone, Copy, PartialEq)]
struct BiquadSection {
    // y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2] - a1*y[n-1] - a2*y[n-2]
    b0: f64, b1: f64, b2: f64,
    a1: f64, a2: f64,
}

impl BiquadSection {
    /// Run the section over `data` in place (transposed direct form II)
    fn process(&self, data: &mut [f64], mut state: [f64; 2]) {
        for sample in data.iter_mut() {
            let input = *sample;
            let output = self.b0 * input + state[0];
            state[0] = self.b1 * input - self.a1 * output + state[1];
            state[1] = self.b2 * input - self.a2 * output;
            *sample = output;
        }
    }

    /// Internal state after a unit step has settled
    fn step_state(&self) -> [f64; 2] {
        let r0 = self.b1 - self.a1 * self.b0;
        let r1 = self.b2 - self.a2 * self.b0;
        let z0 = (r0 + r1) / (1.0 + self.a1 + self.a2);
        [z0, r1 - self.a2 * z0]
    }

    fn dc_gain(&self) -> f64 {
        (self.b0 + self.b1 + self.b2) / (1.0 + self.a1 + self.a2)
    }

    fn response(&self, z_inv: Complex64) -> Complex64 {
        let z_inv2 = z_inv * z_inv;
        (self.b0 + z_inv * self.b1 + z_inv2 * self.b2)
            / (1.0 + z_inv * self.a1 + z_inv2 * self.a2)
    }
}

/// Butterworth bandpass realized as cascaded biquads
#[derive(Debug, Clone)]
pub struct ButterworthBandpass {
    config: FilterConfig,
    sampling_rate: f64,
    biquads: Vec<BiquadSection>,
}

impl ButterworthBandpass {
    /// Design the filter for `sampling_rate`.
    ///
    /// Analog Butterworth prototype, lowpass-to-bandpass transform on
    /// pre-warped edges, then bilinear transform. Each section carries one zero
    /// at z = 1 and one at z = -1; the overall gain sits on the first section.
    pub fn design(config: FilterConfig, sampling_rate: f64) -> EegResult<Self> {
        config.validate(sampling_rate)?;

        let order = config.order;
        let nyquist = sampling_rate / 2.0;

        // Pre-warp normalized edges for the bilinear transform (fs = 2)
        let warp = |f: f64| 4.0 * (PI * (f / nyquist) / 2.0).tan();
        let w_low = warp(config.low_cutoff);
        let w_high = warp(config.high_cutoff);
        let bandwidth = w_high - w_low;
        let center_sq = w_low * w_high;

        let mut analog_poles = Vec::with_capacity(2 * order);
        for m in (0..order).map(|i| -(order as i64) + 1 + 2 * i as i64) {
            let prototype = -Complex64::from_polar(1.0, PI * m as f64 / (2.0 * order as f64));
            let shifted = prototype * (bandwidth / 2.0);
            let root = (shifted * shifted - center_sq).sqrt();
            analog_poles.push(shifted + root);
            analog_poles.push(shifted - root);
        }

        let digital_poles: Vec<Complex64> = analog_poles
            .iter()
            .map(|&p| (4.0 + p) / (4.0 - p))
            .collect();

        // Zeros sit at s = 0 (mapping to z = 1) and at infinity (z = -1)
        let denominator: Complex64 = analog_poles.iter().map(|&p| 4.0 - p).product();
        let gain = bandwidth.powi(order as i32) * (4.0f64.powi(order as i32) / denominator).re;

        let mut biquads: Vec<BiquadSection> = pair_poles(&digital_poles)
            .into_iter()
            .map(|(a1, a2)| BiquadSection { b0: 1.0, b1: 0.0, b2: -1.0, a1, a2 })
            .collect();
        if let Some(first) = biquads.first_mut() {
            first.b0 *= gain;
            first.b2 *= gain;
        }

        debug!(
            low_hz = config.low_cutoff,
            high_hz = config.high_cutoff,
            order,
            sections = biquads.len(),
            "designed Butterworth bandpass"
        );

        Ok(ButterworthBandpass { config, sampling_rate, biquads })
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    pub fn section_count(&self) -> usize {
        self.biquads.len()
    }

    /// Samples of odd extension added on each side before filtering
    pub fn pad_len(&self) -> usize {
        3 * (2 * self.biquads.len() + 1)
    }

    /// Magnitude response at `freq_hz`
    pub fn gain_at(&self, freq_hz: f64) -> f64 {
        let omega = 2.0 * PI * freq_hz / self.sampling_rate;
        let z_inv = Complex64::from_polar(1.0, -omega);
        self.biquads
            .iter()
            .map(|s| s.response(z_inv))
            .product::<Complex64>()
            .norm()
    }

    /// Single forward pass, starting from the steady state of `initial`
    fn forward(&self, data: &mut [f64], initial: f64) {
        let mut scale = initial;
        for biquad in &self.biquads {
            let zi = biquad.step_state();
            biquad.process(data, [zi[0] * scale, zi[1] * scale]);
            scale *= biquad.dc_gain();
        }
    }

    /// Zero-phase filtering: forward pass, then a pass over the reversed output.
    ///
    /// The input is extended by odd reflection at both ends to tame edge
    /// transients; the extension is removed from the result.
    pub fn filtfilt(&self, signal: &[f64]) -> EegResult<Vec<f64>> {
        let n = signal.len();
        let edge = self.pad_len();
        if n <= edge {
            return Err(EegError::SignalTooShort { len: n, required: edge });
        }

        let first = signal[0];
        let last = signal[n - 1];
        let mut extended = Vec::with_capacity(n + 2 * edge);
        extended.extend((1..=edge).rev().map(|i| 2.0 * first - signal[i]));
        extended.extend_from_slice(signal);
        extended.extend((n - 1 - edge..n - 1).rev().map(|i| 2.0 * last - signal[i]));

        let initial = extended[0];
        self.forward(&mut extended, initial);

        extended.reverse();
        let initial = extended[0];
        self.forward(&mut extended, initial);
        extended.reverse();

        Ok(extended[edge..edge + n].to_vec())
    }
}

/// Group poles into (a1, a2) denominators: conjugate pairs first, then real poles two by two
fn pair_poles(poles: &[Complex64]) -> Vec<(f64, f64)> {
    const IMAG_TOL: f64 = 1e-10;

    let mut sections = Vec::with_capacity(poles.len() / 2);
    let mut reals: Vec<f64> = Vec::new();

    for p in poles {
        if p.im > IMAG_TOL {
            sections.push((-2.0 * p.re, p.norm_sqr()));
        } else if p.im.abs() <= IMAG_TOL {
            reals.push(p.re);
        }
    }

    reals.sort_by(|a, b| a.total_cmp(b));
    for pair in reals.chunks(2) {
        match pair {
            [r1, r2] => sections.push((-(r1 + r2), r1 * r2)),
            [r] => sections.push((-r, 0.0)),
            _ => {}
        }
    }

    sections
}

/// Applies a bandpass to every montage channel of a recording
#[derive(Debug, Clone)]
pub struct BandpassFilter {
    config: FilterConfig,
    montage: Montage,
}

impl BandpassFilter {
    pub fn new(config: FilterConfig, montage: Montage) -> Self {
        Self { config, montage }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Filtered copy of `recording`.
    ///
    /// Montage channels are filtered; every other column is copied unchanged.
    pub fn apply(&self, recording: &Recording) -> EegResult<Recording> {
        let design = ButterworthBandpass::design(self.config, recording.sampling_rate())?;
        let mut filtered = recording.clone();

        let channels = recording.relevant_channels(&self.montage);
        for &name in &channels {
            let samples = design.filtfilt(recording.channel_data(name)?)?;
            filtered.replace_channel(name, samples)?;
        }

        debug!(
            recording = %recording.id,
            filtered = channels.len(),
            untouched = recording.channel_count() - channels.len(),
            "applied zero-phase bandpass"
        );

        Ok(filtered)
    }
}
