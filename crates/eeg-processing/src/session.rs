//! Request-scoped analyses over one loaded recording
//!
//! A session only borrows the recording and the configuration, so any number
//! of sessions can read the same frame; every request owns its buffers.

use crate::aggregate::{ChannelEntropy, EntropyComparison};
use crate::config::AnalysisConfig;
use crate::entropy::{ComplexitySummary, WindowedEntropy};
use crate::filters::BandpassFilter;
use crate::wavelet::{BandPowerMap, Cwt, TimeFrequencyMap};
use eeg_core::{EegResult, Recording, TimeRange, TraceView};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info_span, warn};

/// Why a request produced nothing to show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoDataReason {
    /// The time range selects no samples
    EmptyRange,
    /// The range is shorter than one entropy window
    NoWindows { available: usize, window_samples: usize },
    /// No analysis scale maps into the frequency band of interest
    NoFrequencies,
}

impl std::fmt::Display for NoDataReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoDataReason::EmptyRange => write!(f, "Selected time range contains no samples"),
            NoDataReason::NoWindows { available, window_samples } => write!(
                f,
                "No windows available: {} samples, window needs {}",
                available, window_samples
            ),
            NoDataReason::NoFrequencies => write!(f, "No scales fall inside the frequency band"),
        }
    }
}

/// Result of a request that may legitimately have nothing to display
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome<T> {
    Ready(T),
    NoData(NoDataReason),
}

impl<T> AnalysisOutcome<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, AnalysisOutcome::Ready(_))
    }

    pub fn ready(self) -> Option<T> {
        match self {
            AnalysisOutcome::Ready(value) => Some(value),
            AnalysisOutcome::NoData(_) => None,
        }
    }

    pub fn as_ready(&self) -> Option<&T> {
        match self {
            AnalysisOutcome::Ready(value) => Some(value),
            AnalysisOutcome::NoData(_) => None,
        }
    }

    pub fn no_data_reason(&self) -> Option<NoDataReason> {
        match self {
            AnalysisOutcome::Ready(_) => None,
            AnalysisOutcome::NoData(reason) => Some(*reason),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> AnalysisOutcome<U> {
        match self {
            AnalysisOutcome::Ready(value) => AnalysisOutcome::Ready(f(value)),
            AnalysisOutcome::NoData(reason) => AnalysisOutcome::NoData(reason),
        }
    }
}

/// Wavelet view of one channel
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyAnalysis {
    pub channel: String,
    /// Whether the channel went through the bandpass before the transform
    pub filtered: bool,
    pub map: TimeFrequencyMap,
    pub band_power: BandPowerMap,
}

/// Whole-range complexity of one channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexityReport {
    pub channel: String,
    pub samples: usize,
    pub summary: ComplexitySummary,
}

/// Range length above which a complexity summary is logged as slow (2 min at 256 Hz)
pub const COMPLEXITY_WARN_SAMPLES: usize = 30_720;

/// Borrowed recording plus configuration; one method per analysis page
#[derive(Debug, Clone, Copy)]
pub struct AnalysisSession<'a> {
    recording: &'a Recording,
    config: &'a AnalysisConfig,
}

impl<'a> AnalysisSession<'a> {
    /// Validate `config` at the recording's sampling rate and bind the two
    pub fn new(recording: &'a Recording, config: &'a AnalysisConfig) -> EegResult<Self> {
        config.validate_for(recording.sampling_rate())?;
        Ok(AnalysisSession { recording, config })
    }

    pub fn recording(&self) -> &Recording {
        self.recording
    }

    pub fn config(&self) -> &AnalysisConfig {
        self.config
    }

    /// Montage channels present in the recording
    pub fn relevant_channels(&self) -> Vec<&'a str> {
        self.recording.relevant_channels(&self.config.montage)
    }

    /// Raw traces and statistics of several channels
    pub fn time_domain(&self, channels: &[&str], range: TimeRange) -> TraceView {
        let _span = info_span!("time_domain", recording = %self.recording.id).entered();

        let view = self.recording.trace(channels, range);
        if view.clamped {
            warn!(
                start_sec = range.start_sec,
                end_sec = range.end_sec,
                duration_sec = self.recording.duration_sec(),
                "time range exceeds signal length, adjusting"
            );
        }
        for channel in &view.missing {
            warn!(channel = %channel, "channel not in recording, skipped");
        }

        view
    }

    /// Windowed entropy of one channel
    pub fn entropy(&self, channel: &str, range: TimeRange) -> EegResult<AnalysisOutcome<ChannelEntropy>> {
        let _span = info_span!("entropy", recording = %self.recording.id, channel).entered();
        let started = Instant::now();

        let engine = WindowedEntropy::new(self.config.window_sec, self.config.metrics.clone())?;
        let signal = self.recording.channel(channel)?;
        let slice = signal.slice(range);
        self.note_clamping(range);

        let window_samples = engine.window_samples(slice.sampling_rate)?;
        let records = engine.compute(&slice)?;
        debug!(elapsed_ms = started.elapsed().as_millis() as u64, "entropy request done");

        if records.is_empty() {
            return Ok(AnalysisOutcome::NoData(no_window_reason(slice.len(), window_samples)));
        }

        Ok(AnalysisOutcome::Ready(ChannelEntropy::summarize(
            channel,
            records,
            engine.metrics(),
            engine.window_sec(),
        )))
    }

    /// Windowed entropy of two channels over the same range
    pub fn compare_entropy(
        &self,
        first: &str,
        second: &str,
        range: TimeRange,
    ) -> EegResult<AnalysisOutcome<EntropyComparison>> {
        let _span = info_span!(
            "compare_entropy",
            recording = %self.recording.id,
            channel = first,
            other = second
        )
        .entered();
        let started = Instant::now();

        let engine = WindowedEntropy::new(self.config.window_sec, self.config.metrics.clone())?;
        let first_signal = self.recording.channel(first)?;
        let second_signal = self.recording.channel(second)?;
        self.note_clamping(range);

        let first_slice = first_signal.slice(range);
        let first_records = engine.compute(&first_slice)?;
        let second_records = engine.compute(&second_signal.slice(range))?;

        let comparison = EntropyComparison::build(
            (first, first_records),
            (second, second_records),
            engine.metrics(),
            engine.window_sec(),
        );
        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            plottable = comparison.plottable,
            "comparison request done"
        );

        if !comparison.plottable {
            let window_samples = engine.window_samples(first_slice.sampling_rate)?;
            return Ok(AnalysisOutcome::NoData(no_window_reason(first_slice.len(), window_samples)));
        }

        Ok(AnalysisOutcome::Ready(comparison))
    }

    /// Bandpass, wavelet transform and band power of one channel
    pub fn frequency(&self, channel: &str, range: TimeRange) -> EegResult<AnalysisOutcome<FrequencyAnalysis>> {
        let _span = info_span!("frequency", recording = %self.recording.id, channel).entered();
        let started = Instant::now();

        let cwt = Cwt::new(&self.config.wavelet)?;
        // lookup first so a missing channel fails before any filtering
        self.recording.channel_data(channel)?;

        let filtered_recording;
        let (source, filtered) = if self.config.filter_enabled {
            let bandpass = BandpassFilter::new(self.config.filter, self.config.montage.clone());
            filtered_recording = bandpass.apply(self.recording)?;
            let filtered = self.config.montage.contains(channel);
            if !filtered {
                warn!("channel outside montage, analyzing unfiltered signal");
            }
            (&filtered_recording, filtered)
        } else {
            (self.recording, false)
        };

        let signal = source.channel(channel)?;
        let slice = signal.slice(range);
        self.note_clamping(range);
        if slice.is_empty() {
            return Ok(AnalysisOutcome::NoData(NoDataReason::EmptyRange));
        }

        let map = cwt.transform(&slice)?;
        if map.is_empty() {
            return Ok(AnalysisOutcome::NoData(NoDataReason::NoFrequencies));
        }

        let band_power = map.band_power(&self.config.bands);
        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            rows = map.frequencies.len(),
            "frequency request done"
        );

        Ok(AnalysisOutcome::Ready(FrequencyAnalysis {
            channel: channel.to_string(),
            filtered,
            map,
            band_power,
        }))
    }

    /// Complexity summary of the whole selected range.
    ///
    /// Sample entropy compares every template pair, so cost grows with the
    /// square of the range length; long ranges are logged with `warn!`.
    pub fn complexity(&self, channel: &str, range: TimeRange) -> EegResult<AnalysisOutcome<ComplexityReport>> {
        let _span = info_span!("complexity", recording = %self.recording.id, channel).entered();
        let started = Instant::now();

        let signal = self.recording.channel(channel)?;
        let slice = signal.slice(range);
        self.note_clamping(range);
        if slice.is_empty() {
            return Ok(AnalysisOutcome::NoData(NoDataReason::EmptyRange));
        }

        if slice.len() > COMPLEXITY_WARN_SAMPLES {
            warn!(
                samples = slice.len(),
                limit = COMPLEXITY_WARN_SAMPLES,
                "complexity over a long range is quadratic in its length; narrow the range to speed it up"
            );
        }

        let summary = ComplexitySummary::compute(slice.samples)?;
        debug!(elapsed_ms = started.elapsed().as_millis() as u64, "complexity request done");

        Ok(AnalysisOutcome::Ready(ComplexityReport {
            channel: channel.to_string(),
            samples: slice.len(),
            summary,
        }))
    }

    fn note_clamping(&self, range: TimeRange) {
        let len = self.recording.samples_per_channel();
        if range.exceeds(self.recording.sampling_rate(), len) {
            warn!(
                end_sec = range.end_sec,
                duration_sec = self.recording.duration_sec(),
                "time range exceeds signal length, adjusting end index"
            );
        }
    }
}

fn no_window_reason(available: usize, window_samples: usize) -> NoDataReason {
    if available == 0 {
        NoDataReason::EmptyRange
    } else {
        NoDataReason::NoWindows { available, window_samples }
    }
}
