//! Recording sources: CSV files and the simulator

use anyhow::{bail, Context, Result};
use eeg_core::Recording;
use eeg_simulation::{EegSimConfig, EegSimulator, RhythmProfile};
use std::path::Path;
use tracing::info;

/// Load a CSV recording: header row of channel names, one row per sample
pub fn load_csv(path: &Path, sampling_rate: f64) -> Result<Recording> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let recording = parse_csv(&text, sampling_rate)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    info!(
        path = %path.display(),
        recording = %recording.id,
        channels = recording.channel_count(),
        samples = recording.samples_per_channel(),
        "loaded recording"
    );
    Ok(recording)
}

/// Parse comma-delimited text into a recording
pub fn parse_csv(text: &str, sampling_rate: f64) -> Result<Recording> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());

    let (_, header) = match lines.next() {
        Some(line) => line,
        None => bail!("file is empty"),
    };
    let names: Vec<String> = split_fields(header)
        .into_iter()
        .map(|name| name.trim().trim_matches('"').to_string())
        .collect();

    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); names.len()];
    for (index, line) in lines {
        let cells = split_fields(line);
        if cells.len() != names.len() {
            bail!(
                "line {}: expected {} values, found {}",
                index + 1,
                names.len(),
                cells.len()
            );
        }
        for (column, cell) in columns.iter_mut().zip(cells) {
            let value: f64 = cell
                .trim()
                .parse()
                .with_context(|| format!("line {}: '{}' is not a number", index + 1, cell.trim()))?;
            column.push(value);
        }
    }

    if columns.first().map_or(true, |c| c.is_empty()) {
        bail!("no samples below the header row");
    }

    Ok(Recording::new(sampling_rate, names.into_iter().zip(columns).collect())?)
}

/// Split one CSV row on commas outside double quotes
fn split_fields(line: &str) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => quoted = !quoted,
            ',' if !quoted => {
                fields.push(&line[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    fields.push(&line[start..]);
    fields
}

/// Seeded synthetic recording over the default montage
pub fn simulate(duration_sec: f64, sampling_rate: f64, profile: RhythmProfile, seed: u64) -> Result<Recording> {
    let config = EegSimConfig { sampling_rate, ..EegSimConfig::default() }
        .with_profile(profile)
        .with_seed(seed);
    let mut simulator = EegSimulator::new(config).context("Invalid simulation settings")?;
    let recording = simulator.generate(duration_sec)?;

    info!(
        recording = %recording.id,
        profile = profile.description(),
        duration_sec,
        "simulated recording"
    );
    Ok(recording)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv() {
        let text = "F3,F4,\"Cz\"\n1.0,2.0,3.0\n-1.5, 0.25 ,4\n";
        let recording = parse_csv(text, 256.0).unwrap();

        assert_eq!(recording.channel_count(), 3);
        assert_eq!(recording.samples_per_channel(), 2);
        assert_eq!(recording.channel_data("F4").unwrap(), &[2.0, 0.25]);
        assert_eq!(recording.channel_data("Cz").unwrap(), &[3.0, 4.0]);
    }

    #[test]
    fn test_parse_csv_header_with_bom_and_quoted_comma() {
        let text = "\u{feff}F3,\"Ref, left\",Cz\n1.0,2.0,3.0\n";
        let recording = parse_csv(text, 256.0).unwrap();

        assert!(recording.has_channel("F3"));
        assert_eq!(recording.channel_data("Ref, left").unwrap(), &[2.0]);
        assert_eq!(
            recording.relevant_channels(&eeg_core::Montage::schizophrenia()),
            vec!["F3", "Cz"]
        );
    }

    #[test]
    fn test_parse_csv_errors() {
        assert!(parse_csv("", 256.0).is_err());
        assert!(parse_csv("F3,F4\n", 256.0).is_err());
        assert!(parse_csv("F3,F4\n1.0\n", 256.0).is_err());
        assert!(parse_csv("F3,F4\n1.0,abc\n", 256.0).is_err());
        assert!(parse_csv("F3,F3\n1.0,2.0\n", 256.0).is_err());
        assert!(parse_csv("F3\n1.0\n", 0.0).is_err());
    }

    #[test]
    fn test_simulate() {
        let recording = simulate(2.0, 256.0, RhythmProfile::Resting, 9).unwrap();
        assert_eq!(recording.samples_per_channel(), 512);
        assert!(recording.has_channel("T4"));
    }
}
