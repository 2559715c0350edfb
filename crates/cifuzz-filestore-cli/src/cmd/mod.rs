//! Subcommand implementations

pub mod download;
pub mod upload;

use anyhow::{Context, Result};
use cifuzz_filestore::{FilestoreConfig, GithubActionsFilestore};

/// Build the store from the environment, applying CLI overrides.
pub fn open_store(sanitizer: Option<&str>) -> Result<GithubActionsFilestore> {
    let mut config = FilestoreConfig::from_env().context("Failed to load configuration")?;
    if let Some(sanitizer) = sanitizer {
        config = config.with_sanitizer(sanitizer);
    }
    GithubActionsFilestore::from_config(config).context("Failed to initialize filestore")
}
