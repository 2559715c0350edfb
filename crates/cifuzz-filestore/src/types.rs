//! Artifact metadata and operation results.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::FilestoreError;

/// An artifact as reported by the REST listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    /// Numeric artifact id
    pub id: u64,
    /// Artifact name (build or corpus name)
    pub name: String,
    /// Size of the zipped artifact
    #[serde(default)]
    pub size_in_bytes: u64,
    /// URL of the zip archive; requires the API token
    pub archive_download_url: String,
    /// Whether retention has already removed the contents
    #[serde(default)]
    pub expired: bool,
    /// Creation timestamp (ISO 8601)
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Reference to an uploaded artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    /// Name the files were uploaded under
    pub artifact_name: String,
    /// Item paths relative to the upload root, `/`-separated
    pub items: Vec<String>,
    /// Total bytes uploaded
    pub size: u64,
}

/// Result of a download operation.
///
/// Every variant carries the destination directory so callers that only
/// care about the path can use [`DownloadOutcome::dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The artifact archive was unpacked into `dir`.
    Downloaded {
        /// The artifact that was fetched
        artifact: ArtifactMetadata,
        /// Destination directory
        dir: PathBuf,
    },
    /// The listing returned nothing; `dir` is untouched.
    NoArtifacts {
        /// Destination directory
        dir: PathBuf,
    },
    /// Artifacts exist but none is named `name`; `dir` is untouched.
    NotFound {
        /// Requested artifact name
        name: String,
        /// Destination directory
        dir: PathBuf,
    },
}

impl DownloadOutcome {
    /// Destination directory of the operation.
    pub fn dir(&self) -> &Path {
        match self {
            Self::Downloaded { dir, .. } | Self::NoArtifacts { dir } | Self::NotFound { dir, .. } => {
                dir
            }
        }
    }

    /// Whether an archive was actually unpacked.
    pub fn is_downloaded(&self) -> bool {
        matches!(self, Self::Downloaded { .. })
    }

    /// Convert into the destination directory, treating anything other than
    /// a successful download as an error.
    ///
    /// # Errors
    ///
    /// Returns [`FilestoreError::NoArtifacts`] or
    /// [`FilestoreError::ArtifactNotFound`].
    pub fn into_found(self) -> Result<PathBuf, FilestoreError> {
        match self {
            Self::Downloaded { dir, .. } => Ok(dir),
            Self::NoArtifacts { .. } => Err(FilestoreError::NoArtifacts),
            Self::NotFound { name, .. } => Err(FilestoreError::ArtifactNotFound(name)),
        }
    }
}
