//! Sink factory for runtime sink selection

use std::path::PathBuf;
use std::sync::Arc;

use crate::domain::telemetry::EventSink;
use crate::domain::DomainError;

use super::jsonl::JsonLinesEventSink;
use super::log_sink::LogEventSink;
use super::recording::NoopEventSink;

/// Supported sink types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkType {
    /// Structured log lines through `tracing`
    Log,
    /// One JSON document per line in a file
    JsonLines,
    /// Events are discarded
    None,
}

impl SinkType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "log" | "console" | "tracing" => Some(Self::Log),
            "jsonl" | "json-lines" | "json_lines" | "file" => Some(Self::JsonLines),
            "none" | "noop" | "off" | "disabled" => Some(Self::None),
            _ => None,
        }
    }
}

/// Sink configuration
#[derive(Debug, Clone)]
pub enum SinkConfig {
    Log,
    JsonLines(PathBuf),
    None,
}

impl SinkConfig {
    /// Returns the sink type
    pub fn sink_type(&self) -> SinkType {
        match self {
            Self::Log => SinkType::Log,
            Self::JsonLines(_) => SinkType::JsonLines,
            Self::None => SinkType::None,
        }
    }
}

/// Factory for creating event sinks
#[derive(Debug)]
pub struct SinkFactory;

impl SinkFactory {
    /// Creates a sink based on the configuration
    pub fn create(config: &SinkConfig) -> Result<Arc<dyn EventSink>, DomainError> {
        match config {
            SinkConfig::Log => Ok(Arc::new(LogEventSink::new())),
            SinkConfig::JsonLines(path) => Ok(Arc::new(JsonLinesEventSink::open(path.clone())?)),
            SinkConfig::None => Ok(Arc::new(NoopEventSink)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::telemetry::{Event, EventProperties};
    use tempfile::TempDir;

    #[test]
    fn test_sink_type_from_str() {
        assert_eq!(SinkType::from_str("log"), Some(SinkType::Log));
        assert_eq!(SinkType::from_str("Console"), Some(SinkType::Log));
        assert_eq!(SinkType::from_str("jsonl"), Some(SinkType::JsonLines));
        assert_eq!(SinkType::from_str("none"), Some(SinkType::None));
        assert_eq!(SinkType::from_str("kafka"), None);
    }

    #[test]
    fn test_create_jsonl() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("events.jsonl");
        let config = SinkConfig::JsonLines(path.clone());

        assert_eq!(config.sink_type(), SinkType::JsonLines);

        let sink = SinkFactory::create(&config).unwrap();
        sink.emit(&Event::new("a", EventProperties::new(), "u")).unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_create_log_and_none() {
        assert!(SinkFactory::create(&SinkConfig::Log).is_ok());
        assert!(SinkFactory::create(&SinkConfig::None).is_ok());
    }
}
