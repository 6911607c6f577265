//! Telemetry sink trait

use super::Event;
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Destination for telemetry events
///
/// Delivery is fire-and-forget: callers log a returned error and move on, so
/// a sink may drop events without affecting assignment.
#[cfg_attr(test, automock)]
pub trait EventSink: Send + Sync {
    /// Hands one event to the sink
    fn emit(&self, event: &Event) -> Result<(), DomainError>;
}
