//! Windowed entropy and complexity metrics

use eeg_core::{sample_index, EegError, EegResult, SignalSlice};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Histogram bins used by the Shannon metric
pub const HISTOGRAM_BINS: usize = 50;

/// Offset keeping the log proxies finite for flat windows
const LOG_FLOOR: f64 = 1e-6;

/// Embedding dimension for sample and approximate entropy
const EMBEDDING_DIMENSION: usize = 2;

/// Tolerance as a fraction of the window's standard deviation
const TOLERANCE_FACTOR: f64 = 0.2;

const PERMUTATION_ORDER: usize = 3;
const PERMUTATION_DELAY: usize = 1;

const HIGUCHI_K_MAX: usize = 10;

/// Complexity metrics available per window
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ComplexityMetric {
    /// Histogram (Shannon) entropy over 50 bins
    Shannon,
    /// `ln(std(diff(x)) + 1e-6)`
    ApproximateProxy,
    /// `ln(std(x) + 1e-6)`
    SampleProxy,
    SampleEntropy,
    ApproximateEntropy,
    /// Normalized permutation entropy, order 3
    PermutationEntropy,
    HiguchiFd,
}

impl ComplexityMetric {
    /// Display label, as used in tables and plot legends
    pub fn label(&self) -> &'static str {
        match self {
            ComplexityMetric::Shannon => "Shannon",
            ComplexityMetric::ApproximateProxy => "Approximate",
            ComplexityMetric::SampleProxy => "Sample",
            ComplexityMetric::SampleEntropy => "Sample Entropy",
            ComplexityMetric::ApproximateEntropy => "Approximate Entropy",
            ComplexityMetric::PermutationEntropy => "Permutation Entropy",
            ComplexityMetric::HiguchiFd => "Higuchi FD",
        }
    }

    /// Evaluate the metric on one window.
    ///
    /// Returns NaN for an empty window, or when the canonical estimators have
    /// too few samples to form any template.
    pub fn compute(&self, window: &[f64]) -> f64 {
        if window.is_empty() {
            return f64::NAN;
        }

        match self {
            ComplexityMetric::Shannon => histogram_entropy(window, HISTOGRAM_BINS),
            ComplexityMetric::ApproximateProxy => {
                let diff: Vec<f64> = window.windows(2).map(|w| w[1] - w[0]).collect();
                (population_std(&diff) + LOG_FLOOR).ln()
            }
            ComplexityMetric::SampleProxy => (population_std(window) + LOG_FLOOR).ln(),
            ComplexityMetric::SampleEntropy => {
                let r = TOLERANCE_FACTOR * sample_std(window);
                sample_entropy(window, EMBEDDING_DIMENSION, r)
            }
            ComplexityMetric::ApproximateEntropy => {
                let r = TOLERANCE_FACTOR * sample_std(window);
                approximate_entropy(window, EMBEDDING_DIMENSION, r)
            }
            ComplexityMetric::PermutationEntropy => {
                permutation_entropy(window, PERMUTATION_ORDER, PERMUTATION_DELAY)
            }
            ComplexityMetric::HiguchiFd => higuchi_fd(window, HIGUCHI_K_MAX),
        }
    }
}

impl std::fmt::Display for ComplexityMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Ordered, duplicate-free list of metrics evaluated per window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSet {
    metrics: Vec<ComplexityMetric>,
}

impl MetricSet {
    pub fn new(metrics: impl IntoIterator<Item = ComplexityMetric>) -> Self {
        let mut unique = Vec::new();
        for metric in metrics {
            if !unique.contains(&metric) {
                unique.push(metric);
            }
        }
        MetricSet { metrics: unique }
    }

    /// Cheap dashboard metrics: Shannon, Approximate and Sample proxies
    pub fn proxies() -> Self {
        Self::new([
            ComplexityMetric::Shannon,
            ComplexityMetric::ApproximateProxy,
            ComplexityMetric::SampleProxy,
        ])
    }

    /// Sample, approximate and permutation entropy
    pub fn canonical() -> Self {
        Self::new([
            ComplexityMetric::SampleEntropy,
            ComplexityMetric::ApproximateEntropy,
            ComplexityMetric::PermutationEntropy,
        ])
    }

    pub fn metrics(&self) -> &[ComplexityMetric] {
        &self.metrics
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.metrics.iter().map(|m| m.label()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

impl Default for MetricSet {
    fn default() -> Self {
        Self::proxies()
    }
}

/// Metric values of one full window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntropyRecord {
    /// Zero-based position of the window in the analyzed slice
    pub window_index: usize,
    /// Start of the window, seconds from the beginning of the channel
    pub start_sec: f64,
    pub values: BTreeMap<ComplexityMetric, f64>,
}

impl EntropyRecord {
    pub fn get(&self, metric: ComplexityMetric) -> Option<f64> {
        self.values.get(&metric).copied()
    }
}

/// Splits a slice into non-overlapping windows and scores each one
#[derive(Debug, Clone)]
pub struct WindowedEntropy {
    window_sec: f64,
    metrics: MetricSet,
}

impl WindowedEntropy {
    pub fn new(window_sec: f64, metrics: MetricSet) -> EegResult<Self> {
        if !(window_sec.is_finite() && window_sec > 0.0) {
            return Err(EegError::InvalidConfig {
                reason: format!("Window size must be positive, got {}s", window_sec),
            });
        }
        if metrics.is_empty() {
            return Err(EegError::InvalidConfig {
                reason: "No entropy metrics selected".to_string(),
            });
        }

        Ok(WindowedEntropy { window_sec, metrics })
    }

    pub fn window_sec(&self) -> f64 {
        self.window_sec
    }

    pub fn metrics(&self) -> &MetricSet {
        &self.metrics
    }

    /// Samples per window at `sampling_rate`; a window shorter than one sample is an error
    pub fn window_samples(&self, sampling_rate: f64) -> EegResult<usize> {
        let samples = sample_index(self.window_sec, sampling_rate);
        if samples == 0 {
            return Err(EegError::InvalidConfig {
                reason: format!(
                    "Window of {}s holds no samples at {}Hz",
                    self.window_sec, sampling_rate
                ),
            });
        }
        Ok(samples)
    }

    /// One record per full window, in window order.
    ///
    /// The trailing partial window is dropped; a slice shorter than one window
    /// yields no records.
    pub fn compute(&self, slice: &SignalSlice<'_>) -> EegResult<Vec<EntropyRecord>> {
        let window_samples = self.window_samples(slice.sampling_rate)?;

        let records: Vec<EntropyRecord> = slice
            .samples
            .chunks_exact(window_samples)
            .enumerate()
            .map(|(window_index, window)| EntropyRecord {
                window_index,
                start_sec: (slice.start_index + window_index * window_samples) as f64
                    / slice.sampling_rate,
                values: self
                    .metrics
                    .metrics()
                    .iter()
                    .map(|&metric| (metric, metric.compute(window)))
                    .collect(),
            })
            .collect();

        debug!(
            samples = slice.len(),
            window_samples,
            windows = records.len(),
            dropped = slice.len() % window_samples,
            "computed windowed entropy"
        );

        Ok(records)
    }
}

/// Whole-slice complexity figures
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComplexitySummary {
    pub sample_entropy: f64,
    pub higuchi_fd: f64,
    pub permutation_entropy: f64,
}

impl ComplexitySummary {
    pub fn compute(signal: &[f64]) -> EegResult<Self> {
        if signal.is_empty() {
            return Err(EegError::EmptySignal { context: "complexity summary" });
        }

        Ok(ComplexitySummary {
            sample_entropy: ComplexityMetric::SampleEntropy.compute(signal),
            higuchi_fd: ComplexityMetric::HiguchiFd.compute(signal),
            permutation_entropy: ComplexityMetric::PermutationEntropy.compute(signal),
        })
    }

    /// `(label, value)` pairs in display order
    pub fn entries(&self) -> [(&'static str, f64); 3] {
        [
            (ComplexityMetric::SampleEntropy.label(), self.sample_entropy),
            (ComplexityMetric::HiguchiFd.label(), self.higuchi_fd),
            (ComplexityMetric::PermutationEntropy.label(), self.permutation_entropy),
        ]
    }
}

fn mean(data: &[f64]) -> f64 {
    data.iter().sum::<f64>() / data.len() as f64
}

fn population_std(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let mean = mean(data);
    (data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / data.len() as f64).sqrt()
}

fn sample_std(data: &[f64]) -> f64 {
    if data.len() < 2 {
        return 0.0;
    }
    let mean = mean(data);
    (data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (data.len() - 1) as f64).sqrt()
}

/// Entropy of the histogram density, in bits
fn histogram_entropy(data: &[f64], bins: usize) -> f64 {
    let min = data.iter().fold(f64::INFINITY, |a, &b| a.min(b));
    let max = data.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    let (low, high) = if max > min { (min, max) } else { (min - 0.5, max + 0.5) };
    let width = (high - low) / bins as f64;

    let mut hist = vec![0usize; bins];
    for &x in data {
        // last edge belongs to the last bin
        let bin = (((x - low) / width) as usize).min(bins - 1);
        hist[bin] += 1;
    }

    let norm = data.len() as f64 * width;
    hist.iter()
        .filter(|&&count| count > 0)
        .map(|&count| {
            let density = count as f64 / norm;
            -density * density.log2()
        })
        .sum()
}

fn chebyshev_within(data: &[f64], i: usize, j: usize, len: usize, r: f64) -> bool {
    (0..len).all(|k| (data[i + k] - data[j + k]).abs() <= r)
}

/// Richman-Moorman sample entropy, `-ln(A/B)` without self-matches
fn sample_entropy(data: &[f64], m: usize, r: f64) -> f64 {
    let n = data.len();
    if n <= m + 1 {
        return f64::NAN;
    }

    let templates = n - m;
    let mut matches_m = 0u64;
    let mut matches_m1 = 0u64;
    for i in 0..templates {
        for j in (i + 1)..templates {
            if chebyshev_within(data, i, j, m, r) {
                matches_m += 1;
                if (data[i + m] - data[j + m]).abs() <= r {
                    matches_m1 += 1;
                }
            }
        }
    }

    match (matches_m, matches_m1) {
        (0, _) => f64::NAN,
        (_, 0) => f64::INFINITY,
        (b, a) => -(a as f64 / b as f64).ln(),
    }
}

/// Pincus approximate entropy, self-matches included
fn approximate_entropy(data: &[f64], m: usize, r: f64) -> f64 {
    if data.len() <= m + 1 {
        return f64::NAN;
    }

    let phi = |len: usize| -> f64 {
        let count = data.len() - len + 1;
        let total: f64 = (0..count)
            .map(|i| {
                let similar = (0..count)
                    .filter(|&j| chebyshev_within(data, i, j, len, r))
                    .count();
                (similar as f64 / count as f64).ln()
            })
            .sum();
        total / count as f64
    };

    phi(m) - phi(m + 1)
}

/// Shannon entropy of ordinal patterns, normalized to [0, 1]
fn permutation_entropy(data: &[f64], order: usize, delay: usize) -> f64 {
    let span = (order - 1) * delay;
    if data.len() <= span {
        return f64::NAN;
    }

    let mut counts: BTreeMap<Vec<usize>, usize> = BTreeMap::new();
    let patterns = data.len() - span;
    for start in 0..patterns {
        let mut pattern: Vec<usize> = (0..order).collect();
        // stable sort ranks ties by position
        pattern.sort_by(|&a, &b| data[start + a * delay].total_cmp(&data[start + b * delay]));
        *counts.entry(pattern).or_insert(0) += 1;
    }

    let entropy: f64 = counts
        .values()
        .map(|&c| {
            let p = c as f64 / patterns as f64;
            -p * p.log2()
        })
        .sum();
    let permutations: usize = (1..=order).product();

    entropy / (permutations as f64).log2()
}

/// Higuchi fractal dimension: slope of `ln L(k)` against `ln(1/k)`
fn higuchi_fd(data: &[f64], k_max: usize) -> f64 {
    let n = data.len();
    let mut points: Vec<(f64, f64)> = Vec::with_capacity(k_max);

    for k in 1..=k_max {
        let mut lengths = Vec::with_capacity(k);
        for m in 0..k {
            let steps = (n.saturating_sub(1 + m)) / k;
            if steps == 0 {
                continue;
            }
            let curve: f64 = (1..=steps)
                .map(|i| (data[m + i * k] - data[m + (i - 1) * k]).abs())
                .sum();
            let normalization = (n - 1) as f64 / (steps * k) as f64;
            lengths.push(curve * normalization / k as f64);
        }

        if lengths.is_empty() {
            continue;
        }
        let length = mean(&lengths);
        if length > 0.0 {
            points.push(((1.0 / k as f64).ln(), length.ln()));
        }
    }

    if points.len() < 2 {
        return f64::NAN;
    }

    let count = points.len() as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / count;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / count;
    let covariance: f64 = points.iter().map(|p| (p.0 - mean_x) * (p.1 - mean_y)).sum();
    let variance: f64 = points.iter().map(|p| (p.0 - mean_x).powi(2)).sum();

    covariance / variance
}
