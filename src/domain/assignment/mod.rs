//! Assignment domain module
//!
//! The persisted half of the engine: who the visitor is and which variant
//! each experiment resolved to for them.

mod state;

pub use state::{AssignmentTable, PersistedState, StoredState, VisitorId};
