//! EEG Report - command-line front end for the EEG analysis core

mod loader;
mod report;

use anyhow::{bail, Context, Result};
use clap::Parser;
use eeg_core::TimeRange;
use eeg_processing::{AnalysisConfig, AnalysisSession, MetricSet};
use eeg_simulation::RhythmProfile;
use report::{Mode, Request};
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "eeg-report", version, about = "EEG time-domain, entropy and wavelet analysis")]
struct Cli {
    /// CSV recording: header row of channel names, one row per sample
    #[arg(long, conflicts_with = "simulate", required_unless_present = "simulate")]
    csv: Option<PathBuf>,

    /// Simulate a recording of this many seconds instead of loading one
    #[arg(long, value_name = "SECONDS")]
    simulate: Option<f64>,

    /// Rhythm mixture for --simulate (resting, reduced, active)
    #[arg(long, default_value = "resting")]
    profile: RhythmProfile,

    /// Seed for --simulate
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Channel to analyze
    #[arg(long)]
    channel: String,

    /// Second channel, for entropy comparison or an extra trace
    #[arg(long)]
    compare: Option<String>,

    /// Range start (s)
    #[arg(long, default_value = "0")]
    start: f64,

    /// Range end (s), defaults to the end of the recording
    #[arg(long)]
    end: Option<f64>,

    /// Entropy window length (s)
    #[arg(long)]
    window: Option<f64>,

    #[arg(long, value_enum, default_value = "entropy")]
    mode: Mode,

    /// JSON analysis configuration
    #[arg(long, value_name = "FILE.json")]
    config: Option<PathBuf>,

    /// Sample, approximate and permutation entropy instead of the fast proxies
    #[arg(long)]
    canonical: bool,

    /// Sampling rate of the CSV file, overrides the configuration
    #[arg(long)]
    sampling_rate: Option<f64>,

    /// Include the |c| matrix in frequency output
    #[arg(long)]
    heatmap: bool,

    /// Print the entropy table as text instead of JSON
    #[arg(long)]
    table: bool,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            AnalysisConfig::from_json(&json).context("Invalid configuration file")?
        }
        None => AnalysisConfig::default(),
    };
    if let Some(window) = cli.window {
        config.window_sec = window;
    }
    if cli.canonical {
        config.metrics = MetricSet::canonical();
    }
    if let Some(rate) = cli.sampling_rate {
        config.sampling_rate = rate;
    }

    let recording = match (&cli.csv, cli.simulate) {
        (Some(path), _) => loader::load_csv(path, config.sampling_rate)?,
        (None, Some(seconds)) => loader::simulate(seconds, config.sampling_rate, cli.profile, cli.seed)?,
        (None, None) => bail!("Pass --csv FILE or --simulate SECONDS"),
    };

    let relevant = recording.relevant_channels(&config.montage);
    if relevant.is_empty() {
        warn!("no montage channels found in the recording");
    }

    let end = cli.end.unwrap_or_else(|| recording.duration_sec());
    let range = TimeRange::new(cli.start, end).context("Invalid time range")?;
    let session = AnalysisSession::new(&recording, &config).context("Invalid analysis configuration")?;

    if cli.table && cli.mode == Mode::Entropy {
        match session.entropy(&cli.channel, range)?.ready() {
            Some(entropy) => print!("{}", entropy.table()),
            None => println!("No entropy calculated. Adjust window size or signal length."),
        }
        return Ok(());
    }

    let request = Request {
        mode: cli.mode,
        channel: cli.channel,
        compare: cli.compare,
        range,
        heatmap: cli.heatmap,
    };
    let output = report::run(&session, &request)?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
