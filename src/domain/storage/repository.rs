//! Key-value store trait definition

use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Persistent key-value store holding raw string payloads
///
/// Mirrors browser-local storage: values survive restarts, are scoped to one
/// profile and are read and written synchronously.
#[cfg_attr(test, automock)]
pub trait KeyValueStore: Send + Sync {
    /// Retrieves the value stored under a key
    fn get(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Stores a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<(), DomainError>;

    /// Removes a key, returns true if it existed
    fn remove(&self, key: &str) -> Result<bool, DomainError>;

    /// Checks if a key holds a value
    fn contains(&self, key: &str) -> Result<bool, DomainError> {
        Ok(self.get(key)?.is_some())
    }
}
