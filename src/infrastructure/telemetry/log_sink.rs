//! Console telemetry sink writing events through `tracing`

use tracing::info;

use crate::domain::telemetry::{Event, EventSink};
use crate::domain::DomainError;

/// Writes every event as one structured log line
///
/// This is the default sink; swap it for a real analytics backend by
/// implementing [`EventSink`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&self, event: &Event) -> Result<(), DomainError> {
        let properties = serde_json::to_string(event.properties())?;

        info!(
            target: "variant_engine::telemetry",
            event = %event.name(),
            user_id = %event.user_id(),
            timestamp = %event.timestamp().to_rfc3339(),
            properties = %properties,
            "Telemetry event"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::telemetry::EventProperties;

    #[test]
    fn test_emit_never_fails_for_plain_events() {
        let sink = LogEventSink::new();
        let mut properties = EventProperties::new();
        properties.insert("experiment".to_string(), "x".into());

        let event = Event::new("experiment_exposure", properties, "user-1");
        assert!(sink.emit(&event).is_ok());
    }
}
