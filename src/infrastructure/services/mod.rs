//! Service layer - Business logic on top of storage and telemetry

mod assignment_store;
mod experiment_service;
mod identity_service;
mod tracking_service;

pub use assignment_store::AssignmentStore;
pub use experiment_service::ExperimentService;
pub use identity_service::{IdentityProvider, StoredRead, DEFAULT_STORAGE_KEY};
pub use tracking_service::Tracker;
