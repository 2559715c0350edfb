//! Seams between the filestore and the services it talks to.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::header::HeaderMap;

use crate::error::FilestoreError;
use crate::github::artifact_client::TransferError;
use crate::io::download::DownloadError;
use crate::types::{ArtifactMetadata, DownloadOutcome, UploadReceipt};

/// Uploads a set of files as a named artifact.
#[async_trait]
pub trait ArtifactTransfer: Send + Sync {
    /// Upload `files` under `name`, storing each one at its path relative
    /// to `root`.
    async fn upload(
        &self,
        name: &str,
        files: &[PathBuf],
        root: &Path,
    ) -> Result<UploadReceipt, TransferError>;
}

/// Lists the artifacts stored for a repository.
#[async_trait]
pub trait ArtifactListing: Send + Sync {
    /// List every artifact visible for `owner/repo`.
    ///
    /// Failures are not reported: an unreachable or failing backend yields
    /// an empty list.
    async fn list_artifacts(
        &self,
        owner: &str,
        repo: &str,
        headers: &HeaderMap,
    ) -> Vec<ArtifactMetadata>;
}

/// Fetches an archive over HTTP and extracts it.
#[async_trait]
pub trait ArchiveUnpacker: Send + Sync {
    /// Download the archive at `url` and unpack it into `dst`.
    ///
    /// Returns `dst`.
    async fn download_and_unpack(
        &self,
        url: &str,
        dst: &Path,
        headers: &HeaderMap,
    ) -> Result<PathBuf, DownloadError>;
}

/// Persistent storage for fuzzing builds and corpora.
#[async_trait]
pub trait Filestore: Send + Sync {
    /// Upload the build in `build_dir` under the configured build name.
    async fn upload_build(&self, build_dir: &Path) -> Result<UploadReceipt, FilestoreError>;

    /// Upload the corpus in `directory` under `name`.
    async fn upload_corpus(
        &self,
        name: &str,
        directory: &Path,
    ) -> Result<UploadReceipt, FilestoreError>;

    /// Download the corpus called `name` into `dst_directory`.
    async fn download_corpus(
        &self,
        name: &str,
        dst_directory: &Path,
    ) -> Result<DownloadOutcome, FilestoreError>;

    /// Download the latest build for the configured sanitizer into
    /// `dst_directory`.
    async fn download_build(&self, dst_directory: &Path)
    -> Result<DownloadOutcome, FilestoreError>;
}
