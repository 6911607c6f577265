//! Track command - emits a conversion or custom event

use std::path::PathBuf;

use clap::Args;
use serde_json::Value;

use crate::domain::telemetry::EventProperties;

/// Arguments for the track command
#[derive(Args, Clone, Debug)]
pub struct TrackArgs {
    /// Event name
    pub event: String,

    /// Experiment the conversion is attributed to
    #[arg(long)]
    pub experiment: Option<String>,

    /// Event property as key=value; values are parsed as JSON when possible
    #[arg(long = "property", value_parser = parse_property)]
    pub properties: Vec<(String, Value)>,
}

/// Run the track command
pub fn run(config: Option<&PathBuf>, args: TrackArgs) -> anyhow::Result<()> {
    let context = super::bootstrap(config)?;

    let properties: EventProperties = args.properties.into_iter().collect();

    match &args.experiment {
        Some(experiment) => context
            .handle(experiment)
            .track_conversion(&args.event, properties),
        None => context.track_event(&args.event, properties),
    }

    Ok(())
}

fn parse_property(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;

    if key.is_empty() {
        return Err(format!("property key cannot be empty in '{}'", raw));
    }

    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}
