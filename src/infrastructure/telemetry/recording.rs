//! In-memory sinks

use std::sync::RwLock;

use crate::domain::telemetry::{Event, EventSink};
use crate::domain::DomainError;

/// Keeps every emitted event in memory
///
/// Useful for testing and for inspecting what a session reported.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: RwLock<Vec<Event>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded events in emission order
    pub fn events(&self) -> Vec<Event> {
        self.events.read().map(|e| e.clone()).unwrap_or_default()
    }

    /// Recorded events with the given name
    pub fn events_named(&self, name: &str) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| e.name() == name)
            .collect()
    }

    /// Number of recorded events with the given name
    pub fn count(&self, name: &str) -> usize {
        self.events
            .read()
            .map(|e| e.iter().filter(|e| e.name() == name).count())
            .unwrap_or(0)
    }

    /// Drop all recorded events
    pub fn clear(&self) {
        if let Ok(mut events) = self.events.write() {
            events.clear();
        }
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: &Event) -> Result<(), DomainError> {
        let mut events = self.events.write().map_err(|e| {
            DomainError::telemetry(format!("Failed to acquire write lock: {}", e))
        })?;

        events.push(event.clone());
        Ok(())
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn emit(&self, _event: &Event) -> Result<(), DomainError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::telemetry::EventProperties;

    #[test]
    fn test_records_in_order() {
        let sink = RecordingEventSink::new();

        sink.emit(&Event::new("a", EventProperties::new(), "u")).unwrap();
        sink.emit(&Event::new("b", EventProperties::new(), "u")).unwrap();
        sink.emit(&Event::new("a", EventProperties::new(), "u")).unwrap();

        let names: Vec<String> = sink.events().iter().map(|e| e.name().to_string()).collect();
        assert_eq!(names, vec!["a", "b", "a"]);
        assert_eq!(sink.count("a"), 2);
        assert_eq!(sink.events_named("b").len(), 1);
    }

    #[test]
    fn test_clear() {
        let sink = RecordingEventSink::new();
        sink.emit(&Event::new("a", EventProperties::new(), "u")).unwrap();

        sink.clear();

        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_noop_accepts_everything() {
        assert!(NoopEventSink
            .emit(&Event::new("a", EventProperties::new(), "u"))
            .is_ok());
    }
}
