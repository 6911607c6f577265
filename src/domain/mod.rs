//! Domain layer - Core experiment types and the seams to the outside world

pub mod assignment;
pub mod error;
pub mod experiment;
pub mod storage;
pub mod telemetry;
pub mod traits;

pub use assignment::{AssignmentTable, PersistedState, StoredState, VisitorId};
pub use error::DomainError;
pub use experiment::{
    AssignmentStrategy, ExperimentConfig, ExperimentValidationError, VariantTag, DEFAULT_VARIANT,
    SECONDARY_VARIANT,
};
pub use storage::KeyValueStore;
pub use telemetry::{
    Event, EventProperties, EventSink, PageContext, EXPERIMENT_ASSIGNED, EXPERIMENT_EXPOSURE,
};
pub use traits::{RandomSource, VisitorIdGenerator};
