//! Identity provider
//!
//! Produces the anonymous visitor id on first use and recovers it from the
//! persisted state afterwards.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::assignment::{PersistedState, StoredState, VisitorId};
use crate::domain::storage::KeyValueStore;
use crate::domain::traits::VisitorIdGenerator;

/// Default storage key holding the persisted state
pub const DEFAULT_STORAGE_KEY: &str = "ab_test_assignments";

/// Outcome of reading the persisted payload
#[derive(Debug, Clone, PartialEq)]
pub enum StoredRead {
    /// Nothing stored under the key
    Missing,
    /// Payload decoded, possibly partially
    Found(StoredState),
    /// Payload present but not decodable
    Corrupted,
    /// The store itself failed
    Unavailable,
}

/// Creates or recovers the visitor id
pub struct IdentityProvider {
    store: Arc<dyn KeyValueStore>,
    key: String,
    generator: Arc<dyn VisitorIdGenerator>,
}

impl IdentityProvider {
    /// Create a new identity provider reading the given storage key
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        key: impl Into<String>,
        generator: Arc<dyn VisitorIdGenerator>,
    ) -> Self {
        Self {
            store,
            key: key.into(),
            generator,
        }
    }

    /// Storage key holding the persisted state
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Store the state is read from
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Read and decode the persisted payload
    pub fn read_stored(&self) -> StoredRead {
        match self.store.get(&self.key) {
            Ok(None) => StoredRead::Missing,
            Ok(Some(raw)) => match StoredState::decode(&raw) {
                Ok(stored) => StoredRead::Found(stored),
                Err(e) => {
                    warn!(key = %self.key, error = %e, "Persisted state is corrupted, discarding it");
                    StoredRead::Corrupted
                }
            },
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to read persisted state");
                StoredRead::Unavailable
            }
        }
    }

    /// Return the persisted visitor id, creating one if there is none
    ///
    /// A new id is written back together with any assignments that could
    /// still be read. When the store cannot be read at all the new id is kept
    /// in memory only, so an unreadable record is never clobbered.
    pub fn get_or_create_visitor_id(&self) -> VisitorId {
        let (assignments, writable) = match self.read_stored() {
            StoredRead::Found(stored) => match stored.user_id {
                Some(user_id) => return user_id,
                None => (stored.assignments, true),
            },
            StoredRead::Missing | StoredRead::Corrupted => (Default::default(), true),
            StoredRead::Unavailable => (Default::default(), false),
        };

        let visitor_id = self.generator.generate();
        info!(visitor_id = %visitor_id, "Created visitor id");

        if writable {
            let state = PersistedState::new(visitor_id.clone()).with_assignments(assignments);
            self.write(&state);
        }

        visitor_id
    }

    /// Generate a new visitor id without touching storage
    pub fn generate(&self) -> VisitorId {
        self.generator.generate()
    }

    pub(crate) fn write(&self, state: &PersistedState) -> bool {
        let encoded = match state.encode() {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to encode persisted state");
                return false;
            }
        };

        match self.store.set(&self.key, &encoded) {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    key = %self.key,
                    error = %e,
                    "Failed to persist state, continuing with in-memory state"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::storage::MockKeyValueStore;
    use crate::domain::traits::MockVisitorIdGenerator;
    use crate::domain::DomainError;
    use crate::infrastructure::experiment::UuidVisitorIdGenerator;
    use crate::infrastructure::storage::InMemoryKeyValueStore;

    fn fixed_generator(id: &'static str) -> Arc<dyn VisitorIdGenerator> {
        let mut generator = MockVisitorIdGenerator::new();
        generator
            .expect_generate()
            .returning(move || VisitorId::new(id).unwrap());
        Arc::new(generator)
    }

    fn provider(store: Arc<dyn KeyValueStore>) -> IdentityProvider {
        IdentityProvider::new(store, DEFAULT_STORAGE_KEY, Arc::new(UuidVisitorIdGenerator))
    }

    #[test]
    fn test_fresh_storage_creates_and_persists() {
        let store = Arc::new(InMemoryKeyValueStore::new());
        let identity = IdentityProvider::new(
            store.clone(),
            DEFAULT_STORAGE_KEY,
            fixed_generator("visitor-1"),
        );

        let id = identity.get_or_create_visitor_id();

        assert_eq!(id.as_str(), "visitor-1");
        let raw = store.get(DEFAULT_STORAGE_KEY).unwrap().unwrap();
        let stored = StoredState::decode(&raw).unwrap();
        assert_eq!(stored.user_id, Some(id));
        assert!(stored.assignments.is_empty());
    }

    #[test]
    fn test_existing_id_returned_unchanged() {
        let store: Arc<dyn KeyValueStore> = Arc::new(InMemoryKeyValueStore::new());
        let identity = provider(store.clone());

        let first = identity.get_or_create_visitor_id();
        let second = identity.get_or_create_visitor_id();
        let third = provider(store).get_or_create_visitor_id();

        assert_eq!(first, second);
        assert_eq!(first, third);
    }

    #[test]
    fn test_corrupted_payload_recovers() {
        let store =
            Arc::new(InMemoryKeyValueStore::new().with_entry(DEFAULT_STORAGE_KEY, "not-json"));
        let identity = provider(store.clone());

        let id = identity.get_or_create_visitor_id();

        assert!(!id.as_str().is_empty());

        let StoredRead::Found(stored) = identity.read_stored() else {
            panic!("expected corrupted payload to be replaced");
        };
        assert_eq!(stored.user_id, Some(id));
        assert!(stored.assignments.is_empty());
    }

    #[test]
    fn test_missing_user_id_keeps_assignments() {
        let store = Arc::new(
            InMemoryKeyValueStore::new()
                .with_entry(DEFAULT_STORAGE_KEY, r#"{"assignments":{"x":"B"}}"#),
        );
        let identity = IdentityProvider::new(
            store.clone(),
            DEFAULT_STORAGE_KEY,
            fixed_generator("visitor-2"),
        );

        identity.get_or_create_visitor_id();

        let StoredRead::Found(stored) = identity.read_stored() else {
            panic!("expected stored state");
        };
        assert_eq!(stored.user_id.unwrap().as_str(), "visitor-2");
        assert_eq!(stored.assignments.get("x").unwrap(), "B");
    }

    #[test]
    fn test_unreadable_store_does_not_write() {
        let mut store = MockKeyValueStore::new();
        store
            .expect_get()
            .returning(|_| Err(DomainError::storage("storage disabled")));
        store.expect_set().never();

        let identity = provider(Arc::new(store));
        let id = identity.get_or_create_visitor_id();

        assert!(!id.as_str().is_empty());
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        let mut store = MockKeyValueStore::new();
        store.expect_get().returning(|_| Ok(None));
        store
            .expect_set()
            .times(1)
            .returning(|_, _| Err(DomainError::storage("quota exceeded")));

        let identity = IdentityProvider::new(
            Arc::new(store),
            DEFAULT_STORAGE_KEY,
            fixed_generator("visitor-3"),
        );

        assert_eq!(identity.get_or_create_visitor_id().as_str(), "visitor-3");
    }
}
