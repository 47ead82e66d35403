//! Combines per-window entropy records into plot series and averages

use crate::entropy::{ComplexityMetric, EntropyRecord, MetricSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;

/// Entropy results of one channel, ready for plotting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelEntropy {
    pub channel: String,
    pub window_sec: f64,
    pub metrics: Vec<ComplexityMetric>,
    pub records: Vec<EntropyRecord>,
    /// `window_index * window_sec`, relative to the start of the analyzed range
    pub times: Vec<f64>,
    pub series: BTreeMap<ComplexityMetric, Vec<f64>>,
    pub averages: BTreeMap<ComplexityMetric, f64>,
}

impl ChannelEntropy {
    /// Build series and averages for every metric of `metrics`.
    ///
    /// A metric missing from a record shows up as NaN in its series.
    pub fn summarize(
        channel: impl Into<String>,
        records: Vec<EntropyRecord>,
        metrics: &MetricSet,
        window_sec: f64,
    ) -> Self {
        let times = records
            .iter()
            .map(|r| r.window_index as f64 * window_sec)
            .collect();

        let mut series = BTreeMap::new();
        let mut averages = BTreeMap::new();
        for &metric in metrics.metrics() {
            let values: Vec<f64> = records
                .iter()
                .map(|r| r.get(metric).unwrap_or(f64::NAN))
                .collect();
            if !values.is_empty() {
                averages.insert(metric, values.iter().sum::<f64>() / values.len() as f64);
            }
            series.insert(metric, values);
        }

        ChannelEntropy {
            channel: channel.into(),
            window_sec,
            metrics: metrics.metrics().to_vec(),
            records,
            times,
            series,
            averages,
        }
    }

    pub fn is_plottable(&self) -> bool {
        !self.records.is_empty()
    }

    pub fn average(&self, metric: ComplexityMetric) -> Option<f64> {
        self.averages.get(&metric).copied()
    }

    /// Tab-separated table, one numbered row per window
    pub fn table(&self) -> String {
        entropy_table(&self.records, &self.metrics)
    }
}

/// Two channels analyzed over the same range and window size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntropyComparison {
    pub metrics: Vec<ComplexityMetric>,
    pub window_sec: f64,
    /// Empty when the comparison is not plottable
    pub channels: Vec<ChannelEntropy>,
    pub plottable: bool,
}

impl EntropyComparison {
    /// Pair two record sequences; either one empty gives an empty, non-plottable result
    pub fn build(
        first: (&str, Vec<EntropyRecord>),
        second: (&str, Vec<EntropyRecord>),
        metrics: &MetricSet,
        window_sec: f64,
    ) -> Self {
        let plottable = !first.1.is_empty() && !second.1.is_empty();
        let channels = if plottable {
            vec![
                ChannelEntropy::summarize(first.0, first.1, metrics, window_sec),
                ChannelEntropy::summarize(second.0, second.1, metrics, window_sec),
            ]
        } else {
            Vec::new()
        };

        EntropyComparison {
            metrics: metrics.metrics().to_vec(),
            window_sec,
            channels,
            plottable,
        }
    }

    /// Per-metric averages of both channels, for grouped bar charts
    pub fn average_bars(&self) -> Vec<(&'static str, [f64; 2])> {
        match self.channels.as_slice() {
            [first, second] => self
                .metrics
                .iter()
                .map(|&m| {
                    let avg = |c: &ChannelEntropy| c.average(m).unwrap_or(f64::NAN);
                    (m.label(), [avg(first), avg(second)])
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Render records as `Window\t<label>...` with values to 4 decimals
pub fn entropy_table(records: &[EntropyRecord], metrics: &[ComplexityMetric]) -> String {
    let mut table = String::from("Window");
    for metric in metrics {
        table.push('\t');
        table.push_str(metric.label());
    }
    table.push('\n');

    for record in records {
        let _ = write!(table, "{}", record.window_index + 1);
        for &metric in metrics {
            let _ = write!(table, "\t{:.4}", record.get(metric).unwrap_or(f64::NAN));
        }
        table.push('\n');
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(window_index: usize, shannon: f64, approximate: f64, sample: f64) -> EntropyRecord {
        EntropyRecord {
            window_index,
            start_sec: window_index as f64 * 5.0,
            values: [
                (ComplexityMetric::Shannon, shannon),
                (ComplexityMetric::ApproximateProxy, approximate),
                (ComplexityMetric::SampleProxy, sample),
            ]
            .into_iter()
            .collect(),
        }
    }

    #[test]
    fn test_channel_summary() {
        let records = vec![record(0, 1.0, 2.0, 3.0), record(1, 3.0, 4.0, 5.0)];
        let summary = ChannelEntropy::summarize("F3", records, &MetricSet::proxies(), 5.0);

        assert!(summary.is_plottable());
        assert_eq!(summary.times, vec![0.0, 5.0]);
        assert_eq!(summary.series[&ComplexityMetric::Shannon], vec![1.0, 3.0]);
        assert_eq!(summary.average(ComplexityMetric::SampleProxy), Some(4.0));
        assert_eq!(summary.average(ComplexityMetric::SampleEntropy), None);
    }

    #[test]
    fn test_missing_metric_is_nan() {
        let records = vec![record(0, 1.0, 2.0, 3.0)];
        let summary = ChannelEntropy::summarize("F3", records, &MetricSet::canonical(), 5.0);
        assert!(summary.series[&ComplexityMetric::SampleEntropy][0].is_nan());
    }

    #[test]
    fn test_comparison() {
        let comparison = EntropyComparison::build(
            ("F3", vec![record(0, 1.0, 1.0, 1.0), record(1, 2.0, 2.0, 2.0)]),
            ("F4", vec![record(0, 4.0, 4.0, 4.0), record(1, 6.0, 6.0, 6.0)]),
            &MetricSet::proxies(),
            10.0,
        );

        assert!(comparison.plottable);
        assert_eq!(comparison.channels.len(), 2);
        assert_eq!(comparison.channels[1].times, vec![0.0, 10.0]);

        let bars = comparison.average_bars();
        assert_eq!(bars[0], ("Shannon", [1.5, 5.0]));
    }

    #[test]
    fn test_comparison_with_empty_side_is_not_plottable() {
        let comparison = EntropyComparison::build(
            ("F3", vec![record(0, 1.0, 1.0, 1.0)]),
            ("F4", Vec::new()),
            &MetricSet::proxies(),
            5.0,
        );

        assert!(!comparison.plottable);
        assert!(comparison.channels.is_empty());
        assert!(comparison.average_bars().is_empty());
    }

    #[test]
    fn test_table_rendering() {
        let records = vec![record(0, 1.0, 2.5, -3.0), record(1, 0.123456, 0.0, 1.0)];
        let table = entropy_table(&records, MetricSet::proxies().metrics());

        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "Window\tShannon\tApproximate\tSample");
        assert_eq!(lines[1], "1\t1.0000\t2.5000\t-3.0000");
        assert_eq!(lines[2], "2\t0.1235\t0.0000\t1.0000");
    }
}
