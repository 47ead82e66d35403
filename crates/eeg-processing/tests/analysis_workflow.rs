//! End-to-end analysis over recordings built in memory or simulated

use eeg_core::{BandTable, EegBand, EegError, FrequencyBand, Recording, TimeRange};
use eeg_processing::{
    extract_band_power, AnalysisConfig, AnalysisSession, ComplexityMetric, NoDataReason,
};
use eeg_simulation::{EegSimConfig, EegSimulator, RhythmProfile};
use num_complex::Complex64;

fn simulated(profile: RhythmProfile, seconds: f64) -> Recording {
    let config = EegSimConfig::default().with_profile(profile).with_seed(2024);
    EegSimulator::new(config).unwrap().generate(seconds).unwrap()
}

fn range(start: f64, end: f64) -> TimeRange {
    TimeRange::new(start, end).unwrap()
}

#[test]
fn ten_seconds_at_256_hz_gives_two_five_second_records() {
    let samples: Vec<f64> = (0..2560).map(|i| (i as f64 * 0.37).sin()).collect();
    let recording = Recording::new(256.0, vec![("Cz".to_string(), samples)]).unwrap();
    let config = AnalysisConfig::default();
    let session = AnalysisSession::new(&recording, &config).unwrap();

    let entropy = session.entropy("Cz", range(0.0, 10.0)).unwrap().ready().unwrap();
    assert_eq!(entropy.records.len(), 2);
    for record in &entropy.records {
        assert!(record.get(ComplexityMetric::Shannon).unwrap().is_finite());
    }
}

#[test]
fn range_past_the_end_is_clamped_not_rejected() {
    let recording = Recording::new(256.0, vec![("F3".to_string(), vec![0.5; 1000])]).unwrap();
    let config = AnalysisConfig::default();
    let session = AnalysisSession::new(&recording, &config).unwrap();

    let signal = recording.channel("F3").unwrap();
    assert_eq!(signal.slice(range(0.0, 5.0)).len(), 1000);

    // 1000 samples cannot hold one 1280-sample window
    let outcome = session.entropy("F3", range(0.0, 5.0)).unwrap();
    assert_eq!(
        outcome.no_data_reason(),
        Some(NoDataReason::NoWindows { available: 1000, window_samples: 1280 })
    );

    // constant windows still give finite histogram entropy
    let short = AnalysisConfig::default().with_window_sec(1.0);
    let session = AnalysisSession::new(&recording, &short).unwrap();
    let entropy = session.entropy("F3", range(0.0, 5.0)).unwrap().ready().unwrap();
    assert_eq!(entropy.records.len(), 3);
    assert!(entropy.average(ComplexityMetric::Shannon).unwrap().is_finite());
}

#[test]
fn band_power_groups_rows_by_frequency() {
    let row = |v: f64| vec![Complex64::new(0.0, v); 8];
    let coefficients = vec![row(1.0), row(2.0), row(3.0), row(4.0)];
    let bands = BandTable::new(vec![
        FrequencyBand::new(EegBand::Delta, 0.5, 4.0),
        FrequencyBand::new(EegBand::Gamma, 30.0, 50.0),
    ])
    .unwrap();

    let powers = extract_band_power(&coefficients, &[1.0, 2.0, 3.0, 40.0], &bands);
    assert!((powers[&EegBand::Delta] - (1.0 + 4.0 + 9.0) / 3.0).abs() < 1e-12);
    assert!((powers[&EegBand::Gamma] - 16.0).abs() < 1e-12);
}

#[test]
fn resting_profile_is_alpha_dominant() {
    let recording = simulated(RhythmProfile::Resting, 8.0);
    let config = AnalysisConfig::default();
    let session = AnalysisSession::new(&recording, &config).unwrap();

    let analysis = session.frequency("Pz", range(2.0, 6.0)).unwrap().ready().unwrap();
    assert_eq!(analysis.map.coefficients.len(), analysis.map.frequencies.len());

    let alpha = analysis.band_power[&EegBand::Alpha];
    for band in [EegBand::Theta, EegBand::Beta, EegBand::Gamma] {
        assert!(alpha > analysis.band_power[&band], "{band} beats Alpha");
    }
}

#[test]
fn slowed_profile_is_delta_dominant() {
    let recording = simulated(RhythmProfile::ReducedComplexity, 8.0);
    let config = AnalysisConfig::default();
    let session = AnalysisSession::new(&recording, &config).unwrap();

    let analysis = session.frequency("T3", range(2.0, 6.0)).unwrap().ready().unwrap();
    let delta = analysis.band_power[&EegBand::Delta];
    assert!(delta > analysis.band_power[&EegBand::Alpha]);
    assert!(delta > analysis.band_power[&EegBand::Gamma]);
}

#[test]
fn canonical_comparison_over_simulated_channels() {
    let recording = simulated(RhythmProfile::Active, 10.0);
    let config = AnalysisConfig::canonical_entropy();
    let session = AnalysisSession::new(&recording, &config).unwrap();

    let comparison = session
        .compare_entropy("F7", "F8", range(0.0, 10.0))
        .unwrap()
        .ready()
        .unwrap();
    assert!(comparison.plottable);

    let bars = comparison.average_bars();
    assert_eq!(bars.len(), 3);
    assert_eq!(bars[2].0, "Permutation Entropy");
    for (_, [first, second]) in bars {
        assert!(first.is_finite() && second.is_finite());
    }
}

#[test]
fn filter_cutoff_above_nyquist_is_reported_before_analysis() {
    let recording = simulated(RhythmProfile::Resting, 2.0);
    let mut config = AnalysisConfig::default();
    config.filter.high_cutoff = 130.0;

    assert!(matches!(
        AnalysisSession::new(&recording, &config),
        Err(EegError::InvalidFilterBand { .. })
    ));
}

#[test]
fn complexity_summary_over_selected_range() {
    let recording = simulated(RhythmProfile::Resting, 4.0);
    let config = AnalysisConfig::default();
    let session = AnalysisSession::new(&recording, &config).unwrap();

    let report = session.complexity("Cz", range(0.0, 4.0)).unwrap().ready().unwrap();
    assert_eq!(report.samples, 1024);
    assert!(report.summary.higuchi_fd > 1.0 && report.summary.higuchi_fd < 2.5);
}
