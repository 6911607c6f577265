//! Assignment store
//!
//! Owns the persisted `experiment -> variant` table together with the
//! visitor id. Reads never fail: anything unreadable yields a fresh state.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::assignment::{PersistedState, VisitorId};
use crate::domain::experiment::VariantTag;
use crate::domain::storage::KeyValueStore;
use crate::domain::traits::VisitorIdGenerator;
use crate::domain::DomainError;

use super::identity_service::{IdentityProvider, StoredRead};

/// Loads and persists the assignment table
pub struct AssignmentStore {
    identity: IdentityProvider,
}

impl AssignmentStore {
    /// Create a store on top of an identity provider
    ///
    /// The provider's store and key are the ones the table is written to.
    pub fn new(identity: IdentityProvider) -> Self {
        Self { identity }
    }

    /// Create a store and its identity provider in one go
    pub fn with_generator(
        store: Arc<dyn KeyValueStore>,
        key: impl Into<String>,
        generator: Arc<dyn VisitorIdGenerator>,
    ) -> Self {
        Self::new(IdentityProvider::new(store, key, generator))
    }

    /// Identity provider the store depends on
    pub fn identity(&self) -> &IdentityProvider {
        &self.identity
    }

    /// Storage key the state is written under
    pub fn key(&self) -> &str {
        self.identity.key()
    }

    /// Load the persisted state
    ///
    /// Returns a fresh state with a new visitor id if nothing is stored or the
    /// payload cannot be parsed.
    pub fn load(&self) -> PersistedState {
        if let StoredRead::Found(stored) = self.identity.read_stored() {
            if stored.discarded_assignments {
                warn!(
                    key = %self.key(),
                    "Dropped unreadable entries from the persisted assignment table"
                );
            }

            if let Some(user_id) = stored.user_id {
                debug!(
                    visitor_id = %user_id,
                    assignments = stored.assignments.len(),
                    "Loaded persisted state"
                );
                return PersistedState::new(user_id).with_assignments(stored.assignments);
            }
        }

        let visitor_id = self.identity.get_or_create_visitor_id();
        let assignments = match self.identity.read_stored() {
            StoredRead::Found(stored) if stored.user_id.as_ref() == Some(&visitor_id) => {
                stored.assignments
            }
            _ => Default::default(),
        };

        PersistedState::new(visitor_id).with_assignments(assignments)
    }

    /// Variant recorded for an experiment, if any
    pub fn get_assignment(state: &PersistedState, experiment: &str) -> Option<VariantTag> {
        state.assignment(experiment).cloned()
    }

    /// Check if an experiment has a recorded variant
    pub fn has_assignment(state: &PersistedState, experiment: &str) -> bool {
        state.has_assignment(experiment)
    }

    /// Record an assignment, returning the new state and the variant in effect
    ///
    /// Never overwrites: if the experiment is already assigned the state comes
    /// back unchanged together with the existing variant. The caller persists.
    pub fn record_assignment(
        state: PersistedState,
        experiment: &str,
        variant: VariantTag,
    ) -> (PersistedState, VariantTag) {
        state.with_assignment(experiment, variant)
    }

    /// Write the whole state under the storage key
    ///
    /// Failures are logged and reported as `false`; the caller keeps using
    /// its in-memory state.
    pub fn persist(&self, state: &PersistedState) -> bool {
        self.identity.write(state)
    }

    /// Remove all persisted state
    pub fn clear(&self) -> Result<bool, DomainError> {
        self.identity.store().remove(self.key())
    }

    /// Visitor id currently persisted, without creating one
    pub fn persisted_visitor_id(&self) -> Option<VisitorId> {
        match self.identity.read_stored() {
            StoredRead::Found(stored) => stored.user_id,
            _ => None,
        }
    }
}
