//! Uploads through the GitHub Actions runtime artifact service.
//!
//! An upload is three steps against the run's artifact endpoint:
//!
//! 1. `POST` creates a file container for the artifact name.
//! 2. `PUT` each file into the container at `{name}/{relative path}`.
//! 3. `PATCH` finalizes the artifact with the total size.
//!
//! Files are sent uncompressed, in a single request each.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderValue};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::config::{ActionsRuntime, ConfigError};
use crate::traits::ArtifactTransfer;
use crate::types::UploadReceipt;
use crate::walk::item_path;

/// Artifact service API version
const API_VERSION: &str = "6.0-preview";

/// Errors raised by the upload primitive.
#[derive(Error, Debug)]
pub enum TransferError {
    /// A request failed or returned a non-success status.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Not running inside an Actions job.
    #[error("Actions runtime unavailable: {0}")]
    Runtime(#[from] ConfigError),

    /// A file is not located under the upload root.
    #[error("{} is not under the upload root", .0.display())]
    OutsideRoot(PathBuf),

    /// The service answered with something unexpected.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContainerResponse {
    file_container_resource_url: Option<String>,
}

/// [`ArtifactTransfer`] speaking the Actions runtime artifact protocol.
///
/// The runtime is resolved when the client is built but only required when
/// uploading, so the same client can back a download-only store outside a
/// workflow job.
#[derive(Debug, Clone)]
pub struct ActionsArtifactClient {
    client: Client,
    runtime: Result<ActionsRuntime, ConfigError>,
}

impl ActionsArtifactClient {
    /// Create a client for an explicit runtime.
    pub fn new(client: Client, runtime: ActionsRuntime) -> Self {
        Self {
            client,
            runtime: Ok(runtime),
        }
    }

    /// Create a client from the job's environment.
    pub fn from_env(client: Client) -> Self {
        Self {
            client,
            runtime: ActionsRuntime::from_env(),
        }
    }

    fn artifacts_url(runtime: &ActionsRuntime) -> String {
        format!(
            "{}_apis/pipelines/workflows/{}/artifacts",
            runtime.runtime_url, runtime.run_id
        )
    }

    fn authorized(builder: RequestBuilder, runtime: &ActionsRuntime) -> RequestBuilder {
        builder
            .bearer_auth(&runtime.runtime_token)
            .header(ACCEPT, format!("application/json;api-version={API_VERSION}"))
            .header(reqwest::header::USER_AGENT, crate::USER_AGENT)
    }

    async fn create_container(
        &self,
        runtime: &ActionsRuntime,
        name: &str,
    ) -> Result<String, TransferError> {
        let response: ContainerResponse =
            Self::authorized(self.client.post(Self::artifacts_url(runtime)), runtime)
                .query(&[("api-version", API_VERSION)])
                .json(&json!({ "Type": "actions_storage", "Name": name }))
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;

        response.file_container_resource_url.ok_or_else(|| {
            TransferError::Protocol(format!("no container URL returned for artifact '{name}'"))
        })
    }

    async fn upload_file(
        &self,
        runtime: &ActionsRuntime,
        container_url: &str,
        item: &str,
        path: &Path,
    ) -> Result<u64, TransferError> {
        let data = tokio::fs::read(path).await?;
        let len = data.len() as u64;
        let content_range = if len == 0 {
            "bytes */0".to_string()
        } else {
            format!("bytes 0-{}/{len}", len - 1)
        };

        Self::authorized(self.client.put(container_url), runtime)
            .query(&[("itemPath", item)])
            .header(CONTENT_TYPE, HeaderValue::from_static("application/octet-stream"))
            .header(reqwest::header::CONTENT_RANGE, content_range)
            .body(data)
            .send()
            .await?
            .error_for_status()?;

        Ok(len)
    }

    async fn finalize(
        &self,
        runtime: &ActionsRuntime,
        name: &str,
        size: u64,
    ) -> Result<(), TransferError> {
        Self::authorized(self.client.patch(Self::artifacts_url(runtime)), runtime)
            .query(&[("api-version", API_VERSION), ("artifactName", name)])
            .json(&json!({ "Size": size }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl ArtifactTransfer for ActionsArtifactClient {
    async fn upload(
        &self,
        name: &str,
        files: &[PathBuf],
        root: &Path,
    ) -> Result<UploadReceipt, TransferError> {
        let runtime = self.runtime.as_ref().map_err(Clone::clone)?;

        // Resolve every item path before touching the service.
        let items = files
            .iter()
            .map(|f| item_path(f, root).ok_or_else(|| TransferError::OutsideRoot(f.clone())))
            .collect::<Result<Vec<_>, _>>()?;

        let container_url = self.create_container(runtime, name).await?;
        tracing::debug!("Created container for artifact '{name}'");

        let mut size = 0;
        for (file, item) in files.iter().zip(&items) {
            size += self
                .upload_file(runtime, &container_url, &format!("{name}/{item}"), file)
                .await?;
        }

        self.finalize(runtime, name, size).await?;
        tracing::info!("Uploaded artifact '{name}': {} files, {size} bytes", items.len());

        Ok(UploadReceipt {
            artifact_name: name.to_string(),
            items,
            size,
        })
    }
}
