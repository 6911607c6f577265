//! Storage domain - Key-value persistence abstraction

mod repository;

pub use repository::KeyValueStore;

#[cfg(test)]
pub use repository::MockKeyValueStore;
