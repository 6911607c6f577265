//! Event tracking
//!
//! Stamps events with the visitor id, timestamp and page context before
//! handing them to the configured sink.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::assignment::VisitorId;
use crate::domain::telemetry::{Event, EventProperties, EventSink, PageContext};

/// Property carrying the page URL
const PROP_URL: &str = "url";

/// Property carrying the page path
const PROP_PATH: &str = "path";

/// Builds events for one visitor and delivers them fire-and-forget
pub struct Tracker {
    sink: Arc<dyn EventSink>,
    visitor_id: VisitorId,
    page: PageContext,
}

impl Tracker {
    /// Create a tracker for a visitor
    pub fn new(sink: Arc<dyn EventSink>, visitor_id: VisitorId) -> Self {
        Self {
            sink,
            visitor_id,
            page: PageContext::default(),
        }
    }

    /// Attach the page context added to every event
    pub fn with_page_context(mut self, page: PageContext) -> Self {
        self.page = page;
        self
    }

    /// Visitor the events are attributed to
    pub fn visitor_id(&self) -> &VisitorId {
        &self.visitor_id
    }

    /// Page context added to every event
    pub fn page_context(&self) -> &PageContext {
        &self.page
    }

    /// Build the event that [`Tracker::track_event`] would emit
    pub fn build_event(&self, name: &str, mut properties: EventProperties) -> Event {
        if let Some(url) = &self.page.url {
            properties
                .entry(PROP_URL)
                .or_insert_with(|| Value::String(url.clone()));
        }

        if let Some(path) = &self.page.path {
            properties
                .entry(PROP_PATH)
                .or_insert_with(|| Value::String(path.clone()));
        }

        Event::new(name, properties, self.visitor_id.as_str())
    }

    /// Emit an event
    ///
    /// Sink failures are logged and dropped; tracking never fails the caller.
    pub fn track_event(&self, name: &str, properties: EventProperties) {
        let event = self.build_event(name, properties);

        match self.sink.emit(&event) {
            Ok(()) => debug!(event = %name, "Tracked event"),
            Err(e) => warn!(event = %name, error = %e, "Failed to deliver event, dropping it"),
        }
    }
}
