//! Persisted visitor state: the visitor id plus the assignment table

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::experiment::VariantTag;
use crate::domain::DomainError;

/// Experiment name to the variant chosen for it
pub type AssignmentTable = BTreeMap<String, VariantTag>;

// ============================================================================
// VisitorId
// ============================================================================

/// Opaque identifier of one browser profile or installation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VisitorId(String);

impl VisitorId {
    /// Wrap an existing identifier
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();

        if id.trim().is_empty() {
            return Err(DomainError::validation("Visitor ID cannot be empty"));
        }

        Ok(Self(id))
    }

    /// Wrap a generated UUID
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id.to_string())
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for VisitorId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<VisitorId> for String {
    fn from(id: VisitorId) -> Self {
        id.0
    }
}

impl fmt::Display for VisitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for VisitorId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// PersistedState
// ============================================================================

/// Everything persisted for a visitor, written as one JSON document
///
/// Serialized as `{ "userId": "...", "assignments": { "<experiment>": "<variant>" } }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    user_id: VisitorId,
    assignments: AssignmentTable,
}

impl PersistedState {
    /// Fresh state with no assignments
    pub fn new(user_id: VisitorId) -> Self {
        Self {
            user_id,
            assignments: AssignmentTable::new(),
        }
    }

    /// Set the assignment table
    pub fn with_assignments(mut self, assignments: AssignmentTable) -> Self {
        self.assignments = assignments;
        self
    }

    /// Get the visitor id
    pub fn visitor_id(&self) -> &VisitorId {
        &self.user_id
    }

    /// Get the assignment table
    pub fn assignments(&self) -> &AssignmentTable {
        &self.assignments
    }

    /// Variant already assigned for an experiment
    pub fn assignment(&self, experiment: &str) -> Option<&VariantTag> {
        self.assignments.get(experiment)
    }

    /// Check if an experiment has been assigned
    pub fn has_assignment(&self, experiment: &str) -> bool {
        self.assignments.contains_key(experiment)
    }

    /// Record an assignment without overwriting an existing one
    ///
    /// Returns the updated state and the variant in effect for the experiment,
    /// which is the existing one if the experiment was already assigned.
    pub fn with_assignment(mut self, experiment: &str, variant: VariantTag) -> (Self, VariantTag) {
        let effective = self
            .assignments
            .entry(experiment.to_string())
            .or_insert(variant)
            .clone();

        (self, effective)
    }

    /// Encode the state as its JSON document
    pub fn encode(&self) -> Result<String, DomainError> {
        Ok(serde_json::to_string(self)?)
    }
}

// ============================================================================
// StoredState
// ============================================================================

/// What could be recovered from a stored payload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredState {
    /// Visitor id, if the payload carried a usable one
    pub user_id: Option<VisitorId>,
    /// Assignments, empty if absent or unreadable
    pub assignments: AssignmentTable,
    /// Whether an assignment table or some of its entries had to be dropped
    pub discarded_assignments: bool,
}

impl StoredState {
    /// Decode a stored payload
    ///
    /// Unknown top-level fields are ignored and missing fields read as empty.
    /// A payload that is not a JSON object is an error. Assignment entries are
    /// read one by one: an unreadable entry is dropped and the others are
    /// kept, as is a readable visitor id.
    pub fn decode(raw: &str) -> Result<Self, DomainError> {
        let value: Value = serde_json::from_str(raw)?;

        let Value::Object(mut object) = value else {
            return Err(DomainError::serialization(
                "Persisted state is not a JSON object",
            ));
        };

        let user_id = object
            .remove("userId")
            .and_then(|v| v.as_str().map(str::to_string))
            .and_then(|id| VisitorId::new(id).ok());

        let (assignments, discarded_assignments) = match object.remove("assignments") {
            None | Some(Value::Null) => (AssignmentTable::new(), false),
            Some(Value::Object(entries)) => decode_entries(entries),
            Some(_) => (AssignmentTable::new(), true),
        };

        Ok(Self {
            user_id,
            assignments,
            discarded_assignments,
        })
    }
}

/// Keep every readable `experiment -> variant` entry, skipping the rest
fn decode_entries(entries: Map<String, Value>) -> (AssignmentTable, bool) {
    let mut assignments = AssignmentTable::new();
    let mut discarded = false;

    for (experiment, value) in entries {
        let variant = match value {
            Value::String(tag) => VariantTag::new(tag).ok(),
            _ => None,
        };

        match variant {
            Some(variant) => {
                assignments.insert(experiment, variant);
            }
            None => discarded = true,
        }
    }

    (assignments, discarded)
}
