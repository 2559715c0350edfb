//! Download commands

use std::path::Path;

use anyhow::{Context, Result, bail};
use cifuzz_filestore::{DownloadOutcome, Filestore};

/// Download a named corpus
pub async fn download_corpus(store: &impl Filestore, name: &str, dst: &Path) -> Result<()> {
    tracing::info!("Downloading corpus '{name}' into {}", dst.display());
    let outcome = store
        .download_corpus(name, dst)
        .await
        .with_context(|| format!("Failed to download corpus '{name}'"))?;
    report(&outcome)
}

/// Download the latest build
pub async fn download_build(store: &impl Filestore, dst: &Path) -> Result<()> {
    tracing::info!("Downloading build into {}", dst.display());
    let outcome = store
        .download_build(dst)
        .await
        .context("Failed to download build")?;
    report(&outcome)
}

/// An empty store is not a failure: the first run of a project has nothing
/// to download yet.
fn report(outcome: &DownloadOutcome) -> Result<()> {
    match outcome {
        DownloadOutcome::Downloaded { artifact, dir } => {
            println!("Downloaded '{}' into {}", artifact.name, dir.display());
            Ok(())
        }
        DownloadOutcome::NoArtifacts { dir } => {
            println!("No artifacts found; {} left unchanged", dir.display());
            Ok(())
        }
        DownloadOutcome::NotFound { name, .. } => bail!("Artifact '{name}' not found"),
    }
}
