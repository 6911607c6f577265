//! Experiment service for A/B testing
//!
//! Holds the registry of known experiments and assigns variants to the
//! current visitor, recording each decision in the assignment store.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::assignment::{AssignmentTable, PersistedState, VisitorId};
use crate::domain::experiment::{AssignmentStrategy, ExperimentConfig, VariantTag};
use crate::domain::telemetry::{
    EventProperties, EXPERIMENT_ASSIGNED, PROP_EXPERIMENT, PROP_USER_ID, PROP_VARIANT,
};
use crate::domain::traits::RandomSource;
use crate::infrastructure::experiment::{ConsistentHasher, WeightedSelector};

use super::assignment_store::AssignmentStore;
use super::tracking_service::Tracker;

// ============================================================================
// Experiment Service
// ============================================================================

/// Registry of experiment configs and assigner of variants
pub struct ExperimentService {
    registry: RwLock<HashMap<String, ExperimentConfig>>,
    state: RwLock<PersistedState>,
    store: AssignmentStore,
    random: Arc<dyn RandomSource>,
    tracker: Arc<Tracker>,
}

impl ExperimentService {
    /// Create a new experiment service over already loaded state
    ///
    /// `state` must be what `store` loaded; the tracker must be attributed to
    /// the same visitor.
    pub fn new(
        store: AssignmentStore,
        state: PersistedState,
        random: Arc<dyn RandomSource>,
        tracker: Arc<Tracker>,
    ) -> Self {
        Self {
            registry: RwLock::new(HashMap::new()),
            state: RwLock::new(state),
            store,
            random,
            tracker,
        }
    }

    // ========================================================================
    // Registry
    // ========================================================================

    /// Register an experiment unless one with the same name exists
    ///
    /// Returns `true` if the config was added. Later registrations of a known
    /// name are ignored so the first declared shape stays in effect.
    pub fn register_experiment(&self, config: ExperimentConfig) -> bool {
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);

        if registry.contains_key(config.name()) {
            debug!(experiment = %config.name(), "Experiment already registered, ignoring");
            return false;
        }

        info!(
            experiment = %config.name(),
            variants = config.variants().len(),
            weighted = matches!(config.strategy(), AssignmentStrategy::Weighted(_)),
            "Experiment registered"
        );

        registry.insert(config.name().to_string(), config);
        true
    }

    /// Get a registered experiment by name
    pub fn experiment(&self, name: &str) -> Option<ExperimentConfig> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Check if an experiment is registered
    pub fn is_registered(&self, name: &str) -> bool {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// All registered experiments, sorted by name
    pub fn experiments(&self) -> Vec<ExperimentConfig> {
        let mut experiments: Vec<ExperimentConfig> = self
            .registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();

        experiments.sort_by(|a, b| a.name().cmp(b.name()));
        experiments
    }

    // ========================================================================
    // Assignment
    // ========================================================================

    /// Resolve the variant for an experiment, assigning one if needed
    ///
    /// Never fails: an experiment that is neither assigned nor registered
    /// resolves to the default variant `"A"`, which is not persisted.
    pub fn assign_variant(&self, name: &str) -> VariantTag {
        self.try_assign_variant(name).unwrap_or_else(|| {
            warn!(
                experiment = %name,
                "Experiment requested before registration, using default variant"
            );
            VariantTag::default_variant()
        })
    }

    /// Resolve the variant for an experiment if it is assigned or registered
    ///
    /// Returns `None` for an unknown experiment without assigning anything.
    pub fn try_assign_variant(&self, name: &str) -> Option<VariantTag> {
        if let Some(existing) = self.get_variant(name) {
            debug!(experiment = %name, variant = %existing, "Using existing assignment");
            return Some(existing);
        }

        let config = self.experiment(name)?;

        let (variant, visitor_id) = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);

            if let Some(existing) = state.assignment(name) {
                return Some(existing.clone());
            }

            let candidate = self.select_variant(&config, state.visitor_id());
            let (next, variant) =
                AssignmentStore::record_assignment(state.clone(), name, candidate);

            *state = next;
            self.store.persist(&state);

            (variant, state.visitor_id().clone())
        };

        info!(
            experiment = %name,
            variant = %variant,
            visitor_id = %visitor_id,
            "Assigned variant"
        );

        let mut properties = EventProperties::new();
        properties.insert(PROP_EXPERIMENT.to_string(), Value::from(name));
        properties.insert(PROP_VARIANT.to_string(), Value::from(variant.as_str()));
        properties.insert(PROP_USER_ID.to_string(), Value::from(visitor_id.as_str()));
        self.tracker.track_event(EXPERIMENT_ASSIGNED, properties);

        Some(variant)
    }

    /// Variant currently assigned, without assigning one
    pub fn get_variant(&self, name: &str) -> Option<VariantTag> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        AssignmentStore::get_assignment(&state, name)
    }

    /// Check whether the experiment is currently assigned to `candidate`
    pub fn is_variant(&self, name: &str, candidate: &str) -> bool {
        self.get_variant(name)
            .map(|variant| variant.as_str() == candidate)
            .unwrap_or(false)
    }

    fn select_variant(&self, config: &ExperimentConfig, visitor_id: &VisitorId) -> VariantTag {
        let selected = match config.strategy() {
            AssignmentStrategy::Weighted(weights) => {
                let draw = self.random.next_f64();
                WeightedSelector::select(config.variants(), weights, draw)
            }
            AssignmentStrategy::Hashed => {
                ConsistentHasher::select(visitor_id.as_str(), config.name(), config.variants())
            }
        };

        selected
            .cloned()
            .unwrap_or_else(|| config.first_variant().clone())
    }

    // ========================================================================
    // State
    // ========================================================================

    /// Visitor the assignments belong to
    pub fn visitor_id(&self) -> VisitorId {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .visitor_id()
            .clone()
    }

    /// Snapshot of the assignment table
    pub fn assignments(&self) -> AssignmentTable {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .assignments()
            .clone()
    }

    /// Snapshot of the whole in-memory state
    pub fn state(&self) -> PersistedState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Tracker events are emitted through
    pub fn tracker(&self) -> &Arc<Tracker> {
        &self.tracker
    }

    /// Store the state is persisted to
    pub fn store(&self) -> &AssignmentStore {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::storage::{KeyValueStore, MockKeyValueStore};
    use crate::domain::telemetry::EventSink;
    use crate::domain::DomainError;
    use crate::infrastructure::experiment::{SequenceRandomSource, UuidVisitorIdGenerator};
    use crate::infrastructure::services::DEFAULT_STORAGE_KEY;
    use crate::infrastructure::storage::InMemoryKeyValueStore;
    use crate::infrastructure::telemetry::RecordingEventSink;

    struct Fixture {
        service: ExperimentService,
        sink: Arc<RecordingEventSink>,
    }

    fn fixture_with(kv: Arc<dyn KeyValueStore>, random: Arc<dyn RandomSource>) -> Fixture {
        let store =
            AssignmentStore::with_generator(kv, DEFAULT_STORAGE_KEY, Arc::new(UuidVisitorIdGenerator));
        let state = store.load();
        let sink = Arc::new(RecordingEventSink::new());
        let events: Arc<dyn EventSink> = sink.clone();
        let tracker = Arc::new(Tracker::new(events, state.visitor_id().clone()));

        Fixture {
            service: ExperimentService::new(store, state, random, tracker),
            sink,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(
            Arc::new(InMemoryKeyValueStore::new()),
            Arc::new(SequenceRandomSource::new(vec![0.5])),
        )
    }

    fn config(name: &str, variants: &[&str]) -> ExperimentConfig {
        ExperimentConfig::new(name, variants.iter().copied()).unwrap()
    }

    fn weighted(name: &str, variants: &[&str], weights: Vec<f64>) -> ExperimentConfig {
        config(name, variants).with_weights(weights).unwrap()
    }

    mod registry_tests {
        use super::*;

        #[test]
        fn test_register_experiment() {
            let f = fixture();

            assert!(f.service.register_experiment(config("x", &["A", "B"])));
            assert!(f.service.is_registered("x"));
            assert_eq!(f.service.experiment("x").unwrap().variants().len(), 2);
        }

        #[test]
        fn test_first_registration_wins() {
            let f = fixture();

            assert!(f.service.register_experiment(config("x", &["A", "B"])));
            assert!(!f.service.register_experiment(config("x", &["A", "B", "C"])));

            let registered = f.service.experiment("x").unwrap();
            assert_eq!(registered.variants().len(), 2);
            assert!(!registered.has_variant("C"));
        }

        #[test]
        fn test_second_registration_never_yields_new_variant() {
            for _ in 0..50 {
                let f = fixture();
                f.service.register_experiment(config("x", &["A", "B"]));
                f.service.register_experiment(config("x", &["A", "B", "C"]));

                assert_ne!(f.service.assign_variant("x"), "C");
            }
        }

        #[test]
        fn test_experiments_sorted() {
            let f = fixture();
            f.service.register_experiment(config("zeta", &["A"]));
            f.service.register_experiment(config("alpha", &["A"]));

            let names: Vec<String> = f
                .service
                .experiments()
                .iter()
                .map(|e| e.name().to_string())
                .collect();
            assert_eq!(names, vec!["alpha", "zeta"]);
        }
    }

    mod assignment_tests {
        use super::*;

        #[test]
        fn test_assignment_is_stable() {
            let f = fixture();
            f.service.register_experiment(config("x", &["A", "B", "C"]));

            let first = f.service.assign_variant("x");
            for _ in 0..10 {
                assert_eq!(f.service.assign_variant("x"), first);
            }
            assert_eq!(f.sink.count(EXPERIMENT_ASSIGNED), 1);
        }

        #[test]
        fn test_unregistered_defaults_to_a_without_persisting() {
            let f = fixture();

            assert_eq!(f.service.assign_variant("unknown"), "A");
            assert!(f.service.get_variant("unknown").is_none());
            assert!(f.service.assignments().is_empty());
            assert_eq!(f.sink.count(EXPERIMENT_ASSIGNED), 0);
        }

        #[test]
        fn test_try_assign_unregistered() {
            let f = fixture();
            assert!(f.service.try_assign_variant("unknown").is_none());
        }

        #[test]
        fn test_late_registration_then_assign() {
            let f = fixture();

            assert_eq!(f.service.assign_variant("late"), "A");

            f.service.register_experiment(config("late", &["X", "Y"]));
            let variant = f.service.assign_variant("late");

            assert!(variant == "X" || variant == "Y");
            assert_eq!(f.service.get_variant("late"), Some(variant));
        }

        #[test]
        fn test_hashed_assignment_matches_hash() {
            let f = fixture();
            let experiment = config("signup-cta", &["A", "B", "C"]);
            f.service.register_experiment(experiment.clone());

            let visitor = f.service.visitor_id();
            let index = ConsistentHasher::bucket(visitor.as_str(), "signup-cta", 3);

            assert_eq!(f.service.assign_variant("signup-cta"), experiment.variants()[index]);
        }

        #[test]
        fn test_weighted_assignment_uses_draw() {
            let low = fixture_with(
                Arc::new(InMemoryKeyValueStore::new()),
                Arc::new(SequenceRandomSource::new(vec![0.1])),
            );
            low.service
                .register_experiment(weighted("x", &["A", "B"], vec![0.2, 0.8]));
            assert_eq!(low.service.assign_variant("x"), "A");

            let high = fixture_with(
                Arc::new(InMemoryKeyValueStore::new()),
                Arc::new(SequenceRandomSource::new(vec![0.3])),
            );
            high.service
                .register_experiment(weighted("x", &["A", "B"], vec![0.2, 0.8]));
            assert_eq!(high.service.assign_variant("x"), "B");
        }

        #[test]
        fn test_weights_short_of_one_select_last() {
            let f = fixture_with(
                Arc::new(InMemoryKeyValueStore::new()),
                Arc::new(SequenceRandomSource::new(vec![0.95])),
            );
            f.service
                .register_experiment(weighted("x", &["A", "B", "C"], vec![0.3, 0.3, 0.3]));

            assert_eq!(f.service.assign_variant("x"), "C");
        }

        #[test]
        fn test_mismatched_weights_use_hashing() {
            let f = fixture_with(
                Arc::new(InMemoryKeyValueStore::new()),
                Arc::new(SequenceRandomSource::new(vec![0.99])),
            );
            let experiment = weighted("x", &["A", "B", "C"], vec![1.0, 0.0]);
            f.service.register_experiment(experiment.clone());

            let visitor = f.service.visitor_id();
            let index = ConsistentHasher::bucket(visitor.as_str(), "x", 3);

            assert_eq!(f.service.assign_variant("x"), experiment.variants()[index]);
        }

        #[test]
        fn test_assigned_event_payload() {
            let f = fixture();
            f.service
                .register_experiment(weighted("post-layout", &["A", "B"], vec![0.5, 0.5]));

            let variant = f.service.assign_variant("post-layout");

            let events = f.sink.events_named(EXPERIMENT_ASSIGNED);
            assert_eq!(events.len(), 1);
            assert_eq!(events[0].experiment(), Some("post-layout"));
            assert_eq!(events[0].variant(), Some(variant.as_str()));
            assert_eq!(
                events[0].property_str(PROP_USER_ID),
                Some(f.service.visitor_id().as_str())
            );
            assert_eq!(events[0].user_id(), f.service.visitor_id().as_str());
        }

        #[test]
        fn test_is_variant() {
            let f = fixture_with(
                Arc::new(InMemoryKeyValueStore::new()),
                Arc::new(SequenceRandomSource::new(vec![0.0])),
            );
            f.service
                .register_experiment(weighted("x", &["A", "B"], vec![0.5, 0.5]));

            assert!(!f.service.is_variant("x", "A"));

            f.service.assign_variant("x");

            assert!(f.service.is_variant("x", "A"));
            assert!(!f.service.is_variant("x", "B"));
        }

        #[test]
        fn test_existing_assignment_survives_reload() {
            let kv: Arc<dyn KeyValueStore> = Arc::new(InMemoryKeyValueStore::new());

            let first = fixture_with(kv.clone(), Arc::new(SequenceRandomSource::new(vec![0.9])));
            first
                .service
                .register_experiment(weighted("x", &["A", "B"], vec![0.5, 0.5]));
            assert_eq!(first.service.assign_variant("x"), "B");

            let second = fixture_with(kv, Arc::new(SequenceRandomSource::new(vec![0.1])));
            second
                .service
                .register_experiment(weighted("x", &["A", "B"], vec![0.5, 0.5]));

            assert_eq!(second.service.assign_variant("x"), "B");
            assert_eq!(second.service.visitor_id(), first.service.visitor_id());
            assert_eq!(second.sink.count(EXPERIMENT_ASSIGNED), 0);
        }

        #[test]
        fn test_persisted_assignment_without_config() {
            let kv: Arc<dyn KeyValueStore> = Arc::new(InMemoryKeyValueStore::new().with_entry(
                DEFAULT_STORAGE_KEY,
                r#"{"userId":"visitor-1","assignments":{"legacy":"C"}}"#,
            ));
            let f = fixture_with(kv, Arc::new(SequenceRandomSource::new(vec![0.5])));

            assert_eq!(f.service.assign_variant("legacy"), "C");
        }

        #[test]
        fn test_storage_failure_keeps_in_memory_assignment() {
            let mut kv = MockKeyValueStore::new();
            kv.expect_get().returning(|_| {
                Ok(Some(r#"{"userId":"visitor-1","assignments":{}}"#.to_string()))
            });
            kv.expect_set()
                .returning(|_, _| Err(DomainError::storage("quota exceeded")));

            let f = fixture_with(
                Arc::new(kv),
                Arc::new(SequenceRandomSource::new(vec![0.9])),
            );
            f.service
                .register_experiment(weighted("x", &["A", "B"], vec![0.5, 0.5]));

            assert_eq!(f.service.assign_variant("x"), "B");
            assert_eq!(f.service.get_variant("x").unwrap(), "B");
            assert_eq!(f.service.assign_variant("x"), "B");
            assert_eq!(f.sink.count(EXPERIMENT_ASSIGNED), 1);
        }
    }

    mod convergence_tests {
        use super::*;
        use crate::infrastructure::experiment::SeededRandomSource;

        #[test]
        fn test_weighted_distribution_converges() {
            const VISITORS: usize = 100_000;

            let random: Arc<dyn RandomSource> = Arc::new(SeededRandomSource::new(7));
            let mut b_count = 0usize;

            for _ in 0..VISITORS {
                let f = fixture_with(Arc::new(InMemoryKeyValueStore::new()), random.clone());
                f.service
                    .register_experiment(weighted("x", &["A", "B"], vec![0.2, 0.8]));

                if f.service.assign_variant("x") == "B" {
                    b_count += 1;
                }
            }

            let proportion = b_count as f64 / VISITORS as f64;
            assert!(
                (proportion - 0.8).abs() < 0.02,
                "B proportion {} not within tolerance of 0.8",
                proportion
            );
        }

        #[test]
        fn test_hashed_distribution_roughly_even() {
            let random: Arc<dyn RandomSource> = Arc::new(SeededRandomSource::new(7));
            let mut a_count = 0usize;
            let visitors = 2_000;

            for _ in 0..visitors {
                let f = fixture_with(Arc::new(InMemoryKeyValueStore::new()), random.clone());
                f.service.register_experiment(config("x", &["A", "B"]));

                if f.service.assign_variant("x") == "A" {
                    a_count += 1;
                }
            }

            let proportion = a_count as f64 / visitors as f64;
            assert!(
                (proportion - 0.5).abs() < 0.06,
                "A proportion {} too far from 0.5",
                proportion
            );
        }
    }
}
