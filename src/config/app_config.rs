use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::experiment::{ExperimentConfig, ExperimentValidationError};
use crate::domain::telemetry::PageContext;
use crate::domain::DomainError;
use crate::infrastructure::services::DEFAULT_STORAGE_KEY;
use crate::infrastructure::storage::{StorageConfig, StorageType};
use crate::infrastructure::telemetry::{SinkConfig, SinkType};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub storage: StorageSettings,
    pub telemetry: TelemetrySettings,
    /// Experiments registered when a context is created
    pub experiments: Vec<ExperimentDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// `memory` or `file`
    pub backend: String,
    /// Data directory for the file backend
    pub path: PathBuf,
    /// Key the persisted state lives under
    pub key: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetrySettings {
    /// `log`, `jsonl` or `none`
    pub sink: String,
    /// Output file for the `jsonl` sink
    pub path: PathBuf,
    /// Page URL added to every event
    pub url: Option<String>,
    /// Page path added to every event
    pub page_path: Option<String>,
}

/// Experiment as written in the configuration file
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ExperimentDefinition {
    pub name: String,
    pub variants: Vec<String>,
    #[serde(default)]
    pub weights: Option<Vec<f64>>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            path: PathBuf::from(".variant-engine"),
            key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            sink: "log".to_string(),
            path: PathBuf::from("events.jsonl"),
            url: None,
            page_path: None,
        }
    }
}

impl StorageSettings {
    /// Resolve the backend name into a storage configuration
    pub fn to_storage_config(&self) -> Result<StorageConfig, DomainError> {
        match StorageType::from_str(&self.backend) {
            Some(StorageType::InMemory) => Ok(StorageConfig::in_memory()),
            Some(StorageType::File) => Ok(StorageConfig::file(self.path.clone())),
            None => Err(DomainError::configuration(format!(
                "Unknown storage backend: {}",
                self.backend
            ))),
        }
    }
}

impl TelemetrySettings {
    /// Resolve the sink name into a sink configuration
    pub fn to_sink_config(&self) -> Result<SinkConfig, DomainError> {
        match SinkType::from_str(&self.sink) {
            Some(SinkType::Log) => Ok(SinkConfig::Log),
            Some(SinkType::JsonLines) => Ok(SinkConfig::JsonLines(self.path.clone())),
            Some(SinkType::None) => Ok(SinkConfig::None),
            None => Err(DomainError::configuration(format!(
                "Unknown telemetry sink: {}",
                self.sink
            ))),
        }
    }

    /// Page context stamped on every event
    pub fn page_context(&self) -> PageContext {
        let mut page = PageContext::new();
        if let Some(url) = &self.url {
            page = page.with_url(url.clone());
        }
        if let Some(path) = &self.page_path {
            page = page.with_path(path.clone());
        }
        page
    }
}

impl TryFrom<&ExperimentDefinition> for ExperimentConfig {
    type Error = DomainError;

    fn try_from(definition: &ExperimentDefinition) -> Result<Self, Self::Error> {
        let invalid = |e: ExperimentValidationError| {
            DomainError::configuration(format!(
                "Invalid experiment '{}': {}",
                definition.name, e
            ))
        };

        let config = ExperimentConfig::new(&definition.name, definition.variants.iter().cloned())
            .map_err(invalid)?;

        match &definition.weights {
            Some(weights) => config.with_weights(weights.clone()).map_err(invalid),
            None => Ok(config),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ::config::ConfigError> {
        Self::load_from("config/default")
    }

    /// Load configuration from `base` plus an optional `config/local` override
    pub fn load_from(base: impl AsRef<Path>) -> Result<Self, ::config::ConfigError> {
        let base = base.as_ref().to_string_lossy().into_owned();

        let config = ::config::Config::builder()
            .add_source(::config::File::with_name(&base).required(false))
            .add_source(::config::File::with_name("config/local").required(false))
            .add_source(
                ::config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Experiment configs declared in the configuration
    pub fn experiment_configs(&self) -> Result<Vec<ExperimentConfig>, DomainError> {
        self.experiments.iter().map(ExperimentConfig::try_from).collect()
    }
}
