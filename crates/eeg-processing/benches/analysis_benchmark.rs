//! Performance benchmarks for the EEG analysis core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use eeg_core::SignalSlice;
use eeg_processing::{ButterworthBandpass, Cwt, FilterConfig, MetricSet, WindowedEntropy};
use eeg_simulation::{EegSimConfig, EegSimulator};

const FS: f64 = 256.0;

fn simulated_channel(seconds: f64) -> Vec<f64> {
    let config = EegSimConfig { channels: vec!["Cz".to_string()], ..EegSimConfig::default() }.with_seed(11);
    EegSimulator::new(config)
        .and_then(|mut sim| sim.generate(seconds))
        .and_then(|rec| rec.channel_data("Cz").map(<[f64]>::to_vec))
        .expect("simulation")
}

/// Benchmark zero-phase bandpass over increasing lengths
fn bench_filtfilt(c: &mut Criterion) {
    let mut group = c.benchmark_group("filtfilt");
    let filter = ButterworthBandpass::design(FilterConfig::default(), FS).expect("design");

    for &seconds in &[10.0, 60.0, 300.0] {
        let data = simulated_channel(seconds);
        group.bench_with_input(BenchmarkId::from_parameter(format!("{}s", seconds)), &data, |b, data| {
            b.iter(|| black_box(filter.filtfilt(black_box(data))))
        });
    }

    group.finish();
}

/// Benchmark windowed entropy with both metric sets
fn bench_entropy(c: &mut Criterion) {
    let mut group = c.benchmark_group("windowed_entropy");
    let data = simulated_channel(30.0);
    let slice = SignalSlice { samples: &data, sampling_rate: FS, start_index: 0 };

    for (name, metrics) in [("proxies", MetricSet::proxies()), ("canonical", MetricSet::canonical())] {
        let engine = WindowedEntropy::new(5.0, metrics).expect("engine");
        group.bench_function(name, |b| b.iter(|| black_box(engine.compute(black_box(&slice)))));
    }

    group.finish();
}

/// Benchmark the CWT with the default 127 scales
fn bench_cwt(c: &mut Criterion) {
    let mut group = c.benchmark_group("cwt");
    let cwt = Cwt::default();

    for &seconds in &[2.0, 5.0, 10.0] {
        let data = simulated_channel(seconds);
        let slice = SignalSlice { samples: &data, sampling_rate: FS, start_index: 0 };
        group.bench_with_input(BenchmarkId::from_parameter(format!("{}s", seconds)), &slice, |b, slice| {
            b.iter(|| black_box(cwt.transform(black_box(slice))))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_filtfilt, bench_entropy, bench_cwt);
criterion_main!(benches);
