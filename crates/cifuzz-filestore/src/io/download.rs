//! Download-and-unpack for artifact archives.
//!
//! The archive is streamed to an anonymous temporary file first, then
//! extracted on a blocking thread.

use std::io::{Seek, SeekFrom};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use reqwest::header::HeaderMap;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use crate::io::extract::{ExtractError, extract_zip};
use crate::traits::ArchiveUnpacker;

/// Errors raised while downloading or unpacking an archive.
#[derive(Error, Debug)]
pub enum DownloadError {
    /// The request failed or returned a non-success status.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Staging the archive on disk failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The archive could not be extracted.
    #[error("Extraction failed: {0}")]
    Extract(#[from] ExtractError),
}

/// [`ArchiveUnpacker`] that fetches zip archives over HTTP.
#[derive(Debug, Clone)]
pub struct HttpUnpacker {
    client: Client,
}

impl HttpUnpacker {
    /// Create an unpacker sharing `client`.
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ArchiveUnpacker for HttpUnpacker {
    async fn download_and_unpack(
        &self,
        url: &str,
        dst: &Path,
        headers: &HeaderMap,
    ) -> Result<PathBuf, DownloadError> {
        download_and_unpack_zip(&self.client, url, dst, headers).await
    }
}

/// Download the zip archive at `url` and extract it into `dst`.
///
/// Redirects are followed; `reqwest` drops the `Authorization` header when
/// the redirect leaves the original host.
///
/// # Errors
///
/// Returns an error on any HTTP failure, non-success status, or if the
/// archive cannot be extracted.
pub async fn download_and_unpack_zip(
    client: &Client,
    url: &str,
    dst: &Path,
    headers: &HeaderMap,
) -> Result<PathBuf, DownloadError> {
    tracing::debug!("Downloading {url}");

    let response = client
        .get(url)
        .headers(headers.clone())
        .header(reqwest::header::USER_AGENT, crate::USER_AGENT)
        .send()
        .await?
        .error_for_status()?;

    let mut file = tokio::fs::File::from_std(tempfile::tempfile()?);
    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;
    }
    file.flush().await?;

    tracing::debug!("Downloaded {downloaded} bytes, unpacking into {}", dst.display());

    let mut archive = file.into_std().await;
    let dst_owned = dst.to_path_buf();
    let files = tokio::task::spawn_blocking(move || {
        archive.seek(SeekFrom::Start(0))?;
        extract_zip(archive, &dst_owned)
    })
    .await
    .map_err(std::io::Error::other)??;

    tracing::debug!("Unpacked {} files", files.len());
    Ok(dst.to_path_buf())
}
