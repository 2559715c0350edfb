//! Upload commands

use std::path::Path;

use anyhow::{Context, Result};
use cifuzz_filestore::{Filestore, UploadReceipt};

/// Upload a build directory
pub async fn upload_build(store: &impl Filestore, dir: &Path) -> Result<()> {
    tracing::info!("Uploading build from {}", dir.display());
    let receipt = store
        .upload_build(dir)
        .await
        .with_context(|| format!("Failed to upload build from {}", dir.display()))?;
    report(&receipt);
    Ok(())
}

/// Upload a corpus directory
pub async fn upload_corpus(store: &impl Filestore, name: &str, dir: &Path) -> Result<()> {
    tracing::info!("Uploading corpus '{name}' from {}", dir.display());
    let receipt = store
        .upload_corpus(name, dir)
        .await
        .with_context(|| format!("Failed to upload corpus '{name}' from {}", dir.display()))?;
    report(&receipt);
    Ok(())
}

fn report(receipt: &UploadReceipt) {
    println!(
        "Uploaded '{}': {} files, {} bytes",
        receipt.artifact_name,
        receipt.items.len(),
        receipt.size
    );
}
