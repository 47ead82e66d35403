//! Recording: multi-channel EEG frame and single-channel signal views

use crate::error::{EegError, EegResult};
use crate::montage::Montage;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Time range in seconds, as picked by the caller
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start_sec: f64,
    pub end_sec: f64,
}

impl TimeRange {
    /// Create a range; requires `0 <= start_sec <= end_sec`, both finite
    pub fn new(start_sec: f64, end_sec: f64) -> EegResult<Self> {
        if !start_sec.is_finite() || !end_sec.is_finite() {
            return Err(EegError::InvalidConfig {
                reason: format!("Time range [{}, {}]s is not finite", start_sec, end_sec),
            });
        }
        if start_sec < 0.0 || end_sec < start_sec {
            return Err(EegError::InvalidConfig {
                reason: format!(
                    "Invalid time range [{:.3}, {:.3}]s: need 0 <= start <= end",
                    start_sec, end_sec
                ),
            });
        }
        Ok(TimeRange { start_sec, end_sec })
    }

    /// Sample bounds for a signal of `len` samples.
    ///
    /// Both ends are truncated after scaling by the sampling rate. The end is
    /// clamped to `len`; a start past the end collapses to an empty range.
    pub fn sample_bounds(&self, sampling_rate: f64, len: usize) -> (usize, usize) {
        let end = sample_index(self.end_sec, sampling_rate).min(len);
        let start = sample_index(self.start_sec, sampling_rate).min(end);
        (start, end)
    }

    /// Whether the requested end lies beyond a signal of `len` samples
    pub fn exceeds(&self, sampling_rate: f64, len: usize) -> bool {
        sample_index(self.end_sec, sampling_rate) > len
    }

    pub fn duration_sec(&self) -> f64 {
        self.end_sec - self.start_sec
    }
}

/// Truncated sample index of `seconds`, tolerant of `len / fs * fs` rounding below `len`
pub fn sample_index(seconds: f64, sampling_rate: f64) -> usize {
    let position = seconds * sampling_rate;
    (position + 1e-9 * position.abs().max(1.0)).floor() as usize
}

/// Borrowed, possibly empty, contiguous part of a channel
#[derive(Debug, Clone, Copy)]
pub struct SignalSlice<'a> {
    pub samples: &'a [f64],
    pub sampling_rate: f64,
    /// Index of `samples[0]` in the full channel
    pub start_index: usize,
}

impl<'a> SignalSlice<'a> {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Time in seconds of every sample, measured from the start of the channel
    pub fn time_axis(&self) -> Vec<f64> {
        let dt = 1.0 / self.sampling_rate;
        (0..self.samples.len())
            .map(|i| (self.start_index + i) as f64 * dt)
            .collect()
    }
}

/// One EEG channel with its sampling rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSignal {
    name: String,
    samples: Vec<f64>,
    sampling_rate: f64,
}

impl ChannelSignal {
    /// Create a channel; samples must be non-empty and the rate positive
    pub fn new(name: impl Into<String>, samples: Vec<f64>, sampling_rate: f64) -> EegResult<Self> {
        validate_sampling_rate(sampling_rate)?;
        if samples.is_empty() {
            return Err(EegError::EmptySignal { context: "channel signal has no samples" });
        }

        Ok(ChannelSignal {
            name: name.into(),
            samples,
            sampling_rate,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_sec(&self) -> f64 {
        self.samples.len() as f64 / self.sampling_rate
    }

    /// The whole channel as a slice
    pub fn full(&self) -> SignalSlice<'_> {
        SignalSlice {
            samples: &self.samples,
            sampling_rate: self.sampling_rate,
            start_index: 0,
        }
    }

    /// Samples covered by `range`, clamped per [`TimeRange::sample_bounds`]
    pub fn slice(&self, range: TimeRange) -> SignalSlice<'_> {
        let (start, end) = range.sample_bounds(self.sampling_rate, self.samples.len());
        SignalSlice {
            samples: &self.samples[start..end],
            sampling_rate: self.sampling_rate,
            start_index: start,
        }
    }
}

/// A loaded multi-channel recording. Read-only once built.
#[derive(Debug, Clone)]
pub struct Recording {
    /// Identifier used to correlate log lines of one recording
    pub id: Uuid,
    sampling_rate: f64,
    columns: Vec<(String, Vec<f64>)>,
}

impl Recording {
    /// Create a recording from named columns of equal length
    pub fn new(sampling_rate: f64, columns: Vec<(String, Vec<f64>)>) -> EegResult<Self> {
        validate_sampling_rate(sampling_rate)?;

        if let Some((_, first)) = columns.first() {
            let expected = first.len();
            for (name, data) in &columns {
                if data.len() != expected {
                    return Err(EegError::ChannelLengthMismatch {
                        channel: name.clone(),
                        expected,
                        actual: data.len(),
                    });
                }
            }
        }

        for (i, (name, _)) in columns.iter().enumerate() {
            if columns[..i].iter().any(|(other, _)| other == name) {
                return Err(EegError::InvalidConfig {
                    reason: format!("Channel '{}' appears more than once", name),
                });
            }
        }

        Ok(Recording {
            id: Uuid::new_v4(),
            sampling_rate,
            columns,
        })
    }

    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    /// Number of samples in every channel
    pub fn samples_per_channel(&self) -> usize {
        self.columns.first().map(|(_, data)| data.len()).unwrap_or(0)
    }

    pub fn channel_count(&self) -> usize {
        self.columns.len()
    }

    pub fn duration_sec(&self) -> f64 {
        self.samples_per_channel() as f64 / self.sampling_rate
    }

    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn has_channel(&self, name: &str) -> bool {
        self.columns.iter().any(|(n, _)| n == name)
    }

    /// Montage channels present in this recording, in montage order
    pub fn relevant_channels<'m>(&self, montage: &'m Montage) -> Vec<&'m str> {
        montage
            .channels()
            .iter()
            .map(String::as_str)
            .filter(|name| self.has_channel(name))
            .collect()
    }

    /// Raw samples of a channel
    pub fn channel_data(&self, name: &str) -> EegResult<&[f64]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_slice())
            .ok_or_else(|| EegError::ChannelNotFound { channel: name.to_string() })
    }

    /// Copy a channel out as a standalone signal
    pub fn channel(&self, name: &str) -> EegResult<ChannelSignal> {
        let data = self.channel_data(name)?;
        ChannelSignal::new(name, data.to_vec(), self.sampling_rate)
    }

    /// Replace the samples of an existing channel, keeping its length
    pub fn replace_channel(&mut self, name: &str, samples: Vec<f64>) -> EegResult<()> {
        let expected = self.samples_per_channel();
        let column = self
            .columns
            .iter_mut()
            .find(|(n, _)| n == name)
            .ok_or_else(|| EegError::ChannelNotFound { channel: name.to_string() })?;

        if samples.len() != expected {
            return Err(EegError::ChannelLengthMismatch {
                channel: name.to_string(),
                expected,
                actual: samples.len(),
            });
        }

        column.1 = samples;
        Ok(())
    }

    /// Sample times in seconds covered by `range`, clamped like [`ChannelSignal::slice`]
    pub fn time_axis(&self, range: TimeRange) -> Vec<f64> {
        let (start, end) = range.sample_bounds(self.sampling_rate, self.samples_per_channel());
        (start..end).map(|i| i as f64 / self.sampling_rate).collect()
    }

    /// Time-domain view of several channels over a range.
    ///
    /// Display clamping is more forgiving than analysis slicing: when the range
    /// runs past the data, the end snaps to the last sample and the start is
    /// clamped into the recording. Channels missing from the frame are listed in
    /// `missing` instead of failing the whole view.
    pub fn trace(&self, channels: &[&str], range: TimeRange) -> TraceView {
        let len = self.samples_per_channel();
        let mut start = sample_index(range.start_sec, self.sampling_rate);
        let mut end = sample_index(range.end_sec, self.sampling_rate);
        let clamped = start >= len || end > len;
        if clamped {
            start = start.min(len);
            end = len;
        }
        let start = start.min(end);

        let dt = 1.0 / self.sampling_rate;
        let times: Vec<f64> = (start..end).map(|i| i as f64 * dt).collect();

        let mut traces = Vec::new();
        let mut missing = Vec::new();
        for &name in channels {
            match self.channel_data(name) {
                Ok(data) => {
                    let samples = data[start..end].to_vec();
                    traces.push(ChannelTrace {
                        channel: name.to_string(),
                        stats: ChannelStats::calculate(&samples),
                        times: times.clone(),
                        samples,
                    });
                }
                Err(_) => missing.push(name.to_string()),
            }
        }

        TraceView { traces, missing, clamped }
    }
}

fn validate_sampling_rate(rate: f64) -> EegResult<()> {
    if rate.is_finite() && rate > 0.0 {
        Ok(())
    } else {
        Err(EegError::InvalidSamplingRate { rate })
    }
}

/// Samples of one channel prepared for a time-domain plot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelTrace {
    pub channel: String,
    pub times: Vec<f64>,
    pub samples: Vec<f64>,
    pub stats: ChannelStats,
}

/// Result of [`Recording::trace`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceView {
    pub traces: Vec<ChannelTrace>,
    pub missing: Vec<String>,
    /// The requested range ran past the data and was adjusted
    pub clamped: bool,
}

/// Basic statistics for a signal channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelStats {
    pub mean: f64,
    pub rms: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub peak_to_peak: f64,
}

impl ChannelStats {
    pub fn calculate(data: &[f64]) -> Self {
        if data.is_empty() {
            return Self {
                mean: 0.0,
                rms: 0.0,
                std_dev: 0.0,
                min: 0.0,
                max: 0.0,
                peak_to_peak: 0.0,
            };
        }

        let n = data.len() as f64;
        let mean = data.iter().sum::<f64>() / n;

        let sum_sq: f64 = data.iter().map(|x| x * x).sum();
        let rms = (sum_sq / n).sqrt();

        let variance = data.iter()
            .map(|x| (x - mean).powi(2))
            .sum::<f64>() / n;
        let std_dev = variance.sqrt();

        let min = data.iter().fold(f64::INFINITY, |a, &b| a.min(b));
        let max = data.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));

        Self {
            mean,
            rms,
            std_dev,
            min,
            max,
            peak_to_peak: max - min,
        }
    }
}
