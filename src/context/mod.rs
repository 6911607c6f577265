//! Experiment context - the object consumers hold
//!
//! Wraps the registry and assigner together with the tracker and exposes the
//! consumer-facing operations. Nothing here returns an error: every degraded
//! path is logged and resolved to a usable variant.

mod builder;
mod handle;

pub use builder::ExperimentContextBuilder;
pub use handle::{ExperimentHandle, ExperimentOptions, ExposureCallback};

use handle::Resolution;

use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::assignment::{AssignmentTable, VisitorId};
use crate::domain::experiment::{
    ExperimentConfig, ExperimentValidationError, VariantTag, DEFAULT_VARIANT, SECONDARY_VARIANT,
};
use crate::domain::telemetry::{EventProperties, EXPERIMENT_EXPOSURE, PROP_EXPERIMENT, PROP_VARIANT};
use crate::domain::DomainError;
use crate::infrastructure::services::ExperimentService;

/// Per-visitor experiment state and the operations on it
pub struct ExperimentContext {
    service: ExperimentService,
}

impl ExperimentContext {
    /// Start building a context
    pub fn builder() -> ExperimentContextBuilder {
        ExperimentContextBuilder::new()
    }

    pub(crate) fn from_service(service: ExperimentService) -> Self {
        Self { service }
    }

    /// Registry and assigner backing the context
    pub fn service(&self) -> &ExperimentService {
        &self.service
    }

    /// Register an experiment; the first registration of a name wins
    pub fn register_experiment(&self, config: ExperimentConfig) -> bool {
        self.service.register_experiment(config)
    }

    /// Resolve the variant for an experiment, assigning one if needed
    pub fn assign_variant(&self, name: &str) -> VariantTag {
        self.service.assign_variant(name)
    }

    /// Variant currently assigned, without assigning one
    pub fn get_variant(&self, name: &str) -> Option<VariantTag> {
        self.service.get_variant(name)
    }

    pub fn is_variant(&self, name: &str, candidate: &str) -> bool {
        self.service.is_variant(name, candidate)
    }

    /// Emit a custom event for the current visitor
    pub fn track_event(&self, name: &str, properties: EventProperties) {
        self.service.tracker().track_event(name, properties);
    }

    pub fn visitor_id(&self) -> VisitorId {
        self.service.visitor_id()
    }

    pub fn assignments(&self) -> AssignmentTable {
        self.service.assignments()
    }

    pub fn experiment(&self, name: &str) -> Option<ExperimentConfig> {
        self.service.experiment(name)
    }

    pub fn experiments(&self) -> Vec<ExperimentConfig> {
        self.service.experiments()
    }

    /// Remove all persisted state
    ///
    /// The in-memory state of this context is left as is; a context built
    /// afterwards starts with a new visitor.
    pub fn clear(&self) -> Result<bool, DomainError> {
        self.service.store().clear()
    }

    /// Declare an experiment, resolve its variant and report the exposure
    ///
    /// Registration is idempotent, so calling this on every mount is safe.
    /// Each call emits exactly one `experiment_exposure` event and invokes the
    /// exposure callback once.
    pub fn use_experiment(&self, name: &str, options: ExperimentOptions) -> ExperimentHandle<'_> {
        let resolution = match self.declare(name, &options) {
            Ok(()) => Resolution::Assign,
            Err(e) => {
                let fallback = options.fallback_variant();
                warn!(
                    experiment = %name,
                    error = %e,
                    fallback = %fallback,
                    "Rejected experiment declaration, using fallback variant"
                );
                Resolution::Fallback(fallback)
            }
        };

        let handle = ExperimentHandle::new(self, name, resolution);
        let variant = handle.variant();

        let mut properties = EventProperties::new();
        properties.insert(PROP_EXPERIMENT.to_string(), Value::from(name));
        properties.insert(PROP_VARIANT.to_string(), Value::from(variant.as_str()));
        self.track_event(EXPERIMENT_EXPOSURE, properties);

        if let Some(callback) = &options.on_exposure {
            callback(name, &variant);
        }

        handle
    }

    /// Handle for an experiment without declaring it or reporting an exposure
    ///
    /// The handle only reads the existing assignment and never creates one;
    /// an unassigned experiment reads as `A`.
    pub fn handle(&self, name: &str) -> ExperimentHandle<'_> {
        ExperimentHandle::new(self, name, Resolution::Lookup)
    }

    fn declare(&self, name: &str, options: &ExperimentOptions) -> Result<(), ExperimentValidationError> {
        if self.service.is_registered(name) {
            debug!(experiment = %name, "Experiment already registered, skipping declaration");
            return Ok(());
        }

        let config = match Self::config_from(name, options) {
            Ok(config) => config,
            Err(e) if self.service.get_variant(name).is_some() => {
                debug!(
                    experiment = %name,
                    error = %e,
                    "Rejected declaration for an assigned experiment, keeping assignment"
                );
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        self.service.register_experiment(config);
        Ok(())
    }

    fn config_from(
        name: &str,
        options: &ExperimentOptions,
    ) -> Result<ExperimentConfig, ExperimentValidationError> {
        let variants = options
            .variants
            .clone()
            .unwrap_or_else(|| vec![DEFAULT_VARIANT.to_string(), SECONDARY_VARIANT.to_string()]);

        let config = ExperimentConfig::new(name, variants)?;
        match &options.weights {
            Some(weights) => config.with_weights(weights.clone()),
            None => Ok(config),
        }
    }
}

impl Default for ExperimentContext {
    fn default() -> Self {
        Self::builder().build()
    }
}
