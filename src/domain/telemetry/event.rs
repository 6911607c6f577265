//! Telemetry event types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Emitted once per visitor and experiment, when a new variant is decided
pub const EXPERIMENT_ASSIGNED: &str = "experiment_assigned";

/// Emitted every time an experiment is rendered to the visitor
pub const EXPERIMENT_EXPOSURE: &str = "experiment_exposure";

/// Property carrying the experiment name
pub const PROP_EXPERIMENT: &str = "experiment";

/// Property carrying the variant tag
pub const PROP_VARIANT: &str = "variant";

/// Property carrying the visitor id
pub const PROP_USER_ID: &str = "userId";

/// Free-form property bag attached to an event
pub type EventProperties = Map<String, Value>;

/// Page the events are emitted from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl PageContext {
    /// Create an empty page context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the full page URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the page path
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Check if any context is set
    pub fn is_empty(&self) -> bool {
        self.url.is_none() && self.path.is_none()
    }
}

/// A single telemetry event as handed to a sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    name: String,
    properties: EventProperties,
    user_id: String,
    timestamp: DateTime<Utc>,
}

impl Event {
    /// Create an event stamped with the current time
    pub fn new(name: impl Into<String>, properties: EventProperties, user_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties,
            user_id: user_id.into(),
            timestamp: Utc::now(),
        }
    }

    /// Override the timestamp
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties(&self) -> &EventProperties {
        &self.properties
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Get a property by key
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Get a string property by key
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }

    /// Experiment this event is tagged with, if any
    pub fn experiment(&self) -> Option<&str> {
        self.property_str(PROP_EXPERIMENT)
    }

    /// Variant this event is tagged with, if any
    pub fn variant(&self) -> Option<&str> {
        self.property_str(PROP_VARIANT)
    }
}
