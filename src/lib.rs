//! Variant Engine
//!
//! Client-side A/B experiment assignment with:
//! - A stable anonymous visitor id persisted in a key-value store
//! - Weighted random or consistent-hash variant selection, assigned once
//! - Exposure and conversion events attributed to the assigned variant
//! - Pluggable storage, event sinks and random sources

pub mod cli;
pub mod config;
pub mod context;
pub mod domain;
pub mod infrastructure;

pub use crate::config::AppConfig;
pub use context::{ExperimentContext, ExperimentContextBuilder, ExperimentHandle, ExperimentOptions};
pub use domain::{DomainError, EventProperties, ExperimentConfig, VariantTag, VisitorId};

use infrastructure::storage::StorageFactory;
use infrastructure::telemetry::SinkFactory;
use tracing::info;

/// Create a context with the default configuration
pub fn create_context() -> anyhow::Result<ExperimentContext> {
    create_context_with_config(&AppConfig::default())
}

/// Create a context from configuration
///
/// Builds the configured store and sink and registers every configured
/// experiment before any assignment happens.
pub fn create_context_with_config(config: &AppConfig) -> anyhow::Result<ExperimentContext> {
    let storage_config = config.storage.to_storage_config()?;
    let sink_config = config.telemetry.to_sink_config()?;

    info!(
        storage = ?storage_config.storage_type(),
        sink = ?sink_config.sink_type(),
        "Creating experiment context"
    );

    let store = StorageFactory::create(&storage_config)?;
    let sink = SinkFactory::create(&sink_config)?;

    let mut builder = ExperimentContext::builder()
        .with_store(store)
        .with_sink(sink)
        .with_storage_key(config.storage.key.clone())
        .with_page_context(config.telemetry.page_context());

    for experiment in config.experiment_configs()? {
        builder = builder.with_experiment(experiment);
    }

    Ok(builder.build())
}
