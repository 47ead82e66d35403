//! Runs one analysis request and shapes the result as JSON

use anyhow::Result;
use eeg_core::TimeRange;
use eeg_processing::{AnalysisOutcome, AnalysisSession, FrequencyAnalysis};
use serde::Serialize;
use serde_json::{json, Value};

/// Analysis pages reachable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Mode {
    Trace,
    Entropy,
    Frequency,
    Complexity,
}

impl Mode {
    fn name(&self) -> &'static str {
        match self {
            Mode::Trace => "trace",
            Mode::Entropy => "entropy",
            Mode::Frequency => "frequency",
            Mode::Complexity => "complexity",
        }
    }
}

/// What to analyze
#[derive(Debug, Clone)]
pub struct Request {
    pub mode: Mode,
    pub channel: String,
    pub compare: Option<String>,
    pub range: TimeRange,
    /// Include the full |c| matrix in frequency output
    pub heatmap: bool,
}

/// Run `request` against the session
pub fn run(session: &AnalysisSession<'_>, request: &Request) -> Result<Value> {
    let result = match request.mode {
        Mode::Trace => {
            let mut channels = vec![request.channel.as_str()];
            if let Some(other) = &request.compare {
                channels.push(other.as_str());
            }
            ready(session.time_domain(&channels, request.range))?
        }
        Mode::Entropy => match &request.compare {
            Some(other) => outcome(session.compare_entropy(&request.channel, other, request.range)?)?,
            None => outcome(session.entropy(&request.channel, request.range)?)?,
        },
        Mode::Frequency => {
            let analysis = session.frequency(&request.channel, request.range)?;
            outcome(analysis.map(|a| frequency_view(&a, request.heatmap)))?
        }
        Mode::Complexity => outcome(session.complexity(&request.channel, request.range)?)?,
    };

    let mut envelope = json!({
        "mode": request.mode.name(),
        "recording": session.recording().id.to_string(),
        "range": request.range,
    });
    if let (Value::Object(target), Value::Object(source)) = (&mut envelope, result) {
        target.extend(source);
    }
    Ok(envelope)
}

fn ready<T: Serialize>(value: T) -> Result<Value> {
    Ok(json!({ "status": "ready", "result": serde_json::to_value(value)? }))
}

fn outcome<T: Serialize>(outcome: AnalysisOutcome<T>) -> Result<Value> {
    match outcome {
        AnalysisOutcome::Ready(value) => ready(value),
        AnalysisOutcome::NoData(reason) => Ok(json!({
            "status": "no_data",
            "reason": reason,
            "message": reason.to_string(),
        })),
    }
}

/// Serializable form of a wavelet analysis
#[derive(Debug, Serialize)]
struct FrequencyView {
    channel: String,
    filtered: bool,
    frequencies: Vec<f64>,
    scales: Vec<f64>,
    time_start: f64,
    time_end: f64,
    max_magnitude: f64,
    band_power: Vec<(String, f64)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    magnitude: Option<Vec<Vec<f64>>>,
}

fn frequency_view(analysis: &FrequencyAnalysis, heatmap: bool) -> FrequencyView {
    let map = &analysis.map;
    FrequencyView {
        channel: analysis.channel.clone(),
        filtered: analysis.filtered,
        frequencies: map.frequencies.clone(),
        scales: map.scales.clone(),
        time_start: map.times.first().copied().unwrap_or(0.0),
        time_end: map.times.last().copied().unwrap_or(0.0),
        max_magnitude: map.max_magnitude(),
        band_power: analysis
            .band_power
            .iter()
            .map(|(band, power)| (band.to_string(), *power))
            .collect(),
        magnitude: heatmap.then(|| map.magnitude()),
    }
}
