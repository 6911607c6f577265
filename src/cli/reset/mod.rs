//! Reset command - clears the persisted visitor state

use std::path::PathBuf;

use tracing::info;

use crate::infrastructure::storage::StorageFactory;

/// Run the reset command
///
/// Talks to the store directly so a reset never creates a visitor first.
pub fn run(config: Option<&PathBuf>) -> anyhow::Result<()> {
    let config = super::load_config(config)?;

    let store = StorageFactory::create(&config.storage.to_storage_config()?)?;

    if store.remove(&config.storage.key)? {
        info!(key = %config.storage.key, "Cleared persisted state");
        println!("cleared");
    } else {
        println!("nothing to clear");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::cli::{Cli, Command};
    use clap::Parser;

    #[test]
    fn test_parse_reset() {
        let cli = Cli::parse_from(["variant-engine", "--config", "custom.toml", "reset"]);

        assert!(matches!(cli.command, Command::Reset));
        assert_eq!(
            cli.config.as_deref(),
            Some(std::path::Path::new("custom.toml"))
        );
    }
}
