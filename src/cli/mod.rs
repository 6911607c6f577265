//! CLI module for the variant engine
//!
//! Provides subcommands that operate on the persisted visitor state:
//! - `assign`: resolve (and report) the variant for an experiment
//! - `show`: print the visitor id and assignment table
//! - `track`: emit a conversion event
//! - `reset`: clear the persisted state

pub mod assign;
pub mod reset;
pub mod show;
pub mod track;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::context::ExperimentContext;
use crate::infrastructure::logging;

/// Variant Engine - Stable A/B experiment assignment
#[derive(Parser)]
#[command(name = "variant-engine")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to config/default)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Resolve the variant for an experiment
    Assign(assign::AssignArgs),

    /// Print the visitor id and current assignments as JSON
    Show,

    /// Emit a conversion event
    Track(track::TrackArgs),

    /// Clear the persisted visitor state
    Reset,
}

/// Load configuration and install logging
pub(crate) fn load_config(config_path: Option<&PathBuf>) -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = match config_path {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load().unwrap_or_default(),
    };

    // A subscriber may already be installed when embedded
    let _ = logging::init_logging(&logging::LoggingConfig::from(&config.logging));

    Ok(config)
}

/// Load configuration, install logging and build the context
pub(crate) fn bootstrap(config_path: Option<&PathBuf>) -> anyhow::Result<ExperimentContext> {
    let config = load_config(config_path)?;
    crate::create_context_with_config(&config)
}
