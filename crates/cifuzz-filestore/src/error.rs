//! Top-level errors for filestore operations

use thiserror::Error;

use crate::config::ConfigError;
use crate::github::artifact_client::TransferError;
use crate::io::download::DownloadError;

/// Errors returned by [`crate::Filestore`] operations.
#[derive(Error, Debug)]
pub enum FilestoreError {
    /// Filesystem error, e.g. a missing or unreadable directory.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The token cannot be carried in an HTTP header.
    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The upload primitive failed.
    #[error("Upload failed: {0}")]
    Transfer(#[from] TransferError),

    /// Downloading or unpacking an archive failed.
    #[error("Download failed: {0}")]
    Download(#[from] DownloadError),

    /// The repository has no artifacts at all.
    #[error("No artifacts found")]
    NoArtifacts,

    /// Artifacts exist, but none carries the requested name.
    #[error("Artifact not found: {0}")]
    ArtifactNotFound(String),
}
