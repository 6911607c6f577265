//! Builder for [`ExperimentContext`]

use std::sync::Arc;

use crate::domain::experiment::ExperimentConfig;
use crate::domain::storage::KeyValueStore;
use crate::domain::telemetry::{EventSink, PageContext};
use crate::domain::traits::{RandomSource, VisitorIdGenerator};
use crate::infrastructure::experiment::{ThreadRandomSource, UuidVisitorIdGenerator};
use crate::infrastructure::services::{
    AssignmentStore, ExperimentService, Tracker, DEFAULT_STORAGE_KEY,
};
use crate::infrastructure::storage::InMemoryKeyValueStore;
use crate::infrastructure::telemetry::LogEventSink;

use super::ExperimentContext;

/// Builder for ExperimentContext
///
/// Unset collaborators default to an in-memory store, the log sink, the
/// thread RNG and UUID v4 visitor ids.
pub struct ExperimentContextBuilder {
    store: Option<Arc<dyn KeyValueStore>>,
    sink: Option<Arc<dyn EventSink>>,
    random: Option<Arc<dyn RandomSource>>,
    id_generator: Option<Arc<dyn VisitorIdGenerator>>,
    storage_key: String,
    page_context: PageContext,
    experiments: Vec<ExperimentConfig>,
}

impl ExperimentContextBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            sink: None,
            random: None,
            id_generator: None,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            page_context: PageContext::default(),
            experiments: Vec::new(),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_random_source(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = Some(random);
        self
    }

    pub fn with_id_generator(mut self, generator: Arc<dyn VisitorIdGenerator>) -> Self {
        self.id_generator = Some(generator);
        self
    }

    /// Storage key the state is persisted under
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Page context stamped on every event
    pub fn with_page_context(mut self, page: PageContext) -> Self {
        self.page_context = page;
        self
    }

    /// Experiment registered when the context is built
    pub fn with_experiment(mut self, config: ExperimentConfig) -> Self {
        self.experiments.push(config);
        self
    }

    /// Load persisted state and assemble the context
    pub fn build(self) -> ExperimentContext {
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(InMemoryKeyValueStore::new()));
        let sink = self.sink.unwrap_or_else(|| Arc::new(LogEventSink::new()));
        let random = self
            .random
            .unwrap_or_else(|| Arc::new(ThreadRandomSource));
        let generator = self
            .id_generator
            .unwrap_or_else(|| Arc::new(UuidVisitorIdGenerator));

        let assignments = AssignmentStore::with_generator(store, self.storage_key, generator);
        let state = assignments.load();

        let tracker = Arc::new(
            Tracker::new(sink, state.visitor_id().clone()).with_page_context(self.page_context),
        );

        let service = ExperimentService::new(assignments, state, random, tracker);
        for config in self.experiments {
            service.register_experiment(config);
        }

        ExperimentContext::from_service(service)
    }
}

impl Default for ExperimentContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
