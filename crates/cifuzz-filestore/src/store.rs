//! Filestore backed by GitHub Actions artifacts.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};

use crate::config::FilestoreConfig;
use crate::error::FilestoreError;
use crate::github::api::{GithubApi, find_artifact};
use crate::github::artifact_client::ActionsArtifactClient;
use crate::io::download::HttpUnpacker;
use crate::traits::{ArchiveUnpacker, ArtifactListing, ArtifactTransfer, Filestore};
use crate::types::{DownloadOutcome, UploadReceipt};
use crate::walk;

/// Prefix of build artifact names; the sanitizer is appended.
pub const BASE_BUILD_NAME: &str = "cifuzz-build-";

/// Media type requested from the REST API
const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

/// [`Filestore`] storing builds and corpora as workflow artifacts.
pub struct GithubActionsFilestore {
    config: FilestoreConfig,
    http_headers: HeaderMap,
    transfer: Arc<dyn ArtifactTransfer>,
    listing: Arc<dyn ArtifactListing>,
    unpacker: Arc<dyn ArchiveUnpacker>,
}

impl GithubActionsFilestore {
    /// Create a store around explicit collaborators.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be used as a header value.
    pub fn new(
        config: FilestoreConfig,
        transfer: Arc<dyn ArtifactTransfer>,
        listing: Arc<dyn ArtifactListing>,
        unpacker: Arc<dyn ArchiveUnpacker>,
    ) -> Result<Self, FilestoreError> {
        let mut authorization = HeaderValue::try_from(format!("token {}", config.github_token))?;
        authorization.set_sensitive(true);

        let mut http_headers = HeaderMap::new();
        http_headers.insert(AUTHORIZATION, authorization);
        http_headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));

        Ok(Self {
            config,
            http_headers,
            transfer,
            listing,
            unpacker,
        })
    }

    /// Create a store talking to GitHub, with the Actions runtime taken from
    /// the environment.
    ///
    /// # Errors
    ///
    /// See [`GithubActionsFilestore::new`].
    pub fn from_config(config: FilestoreConfig) -> Result<Self, FilestoreError> {
        let client = Client::new();
        let listing = GithubApi::new(client.clone(), &config.api_url);
        Self::new(
            config,
            Arc::new(ActionsArtifactClient::from_env(client.clone())),
            Arc::new(listing),
            Arc::new(HttpUnpacker::new(client)),
        )
    }

    /// Configuration this store was built with.
    pub fn config(&self) -> &FilestoreConfig {
        &self.config
    }

    /// Headers sent to the REST API and archive downloads.
    pub fn http_headers(&self) -> &HeaderMap {
        &self.http_headers
    }

    /// Artifact name used for builds: `cifuzz-build-<sanitizer>`.
    pub fn build_name(&self) -> String {
        format!("{BASE_BUILD_NAME}{}", self.config.sanitizer)
    }

    /// Upload every regular file under `directory` as the artifact `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if `directory` cannot be walked or the upload fails.
    pub async fn upload_directory(
        &self,
        name: &str,
        directory: &Path,
    ) -> Result<UploadReceipt, FilestoreError> {
        let root = walk::absolute_dir(directory)?;
        let files = walk::collect_files(&root)?;

        tracing::info!(
            "Uploading {} files from {} as '{name}'",
            files.len(),
            root.display()
        );

        Ok(self.transfer.upload(name, &files, &root).await?)
    }

    async fn download_artifact(
        &self,
        name: &str,
        dst_directory: &Path,
    ) -> Result<DownloadOutcome, FilestoreError> {
        let owner = &self.config.project_repo_owner;
        let repo = &self.config.project_repo_name;

        tracing::debug!("Listing artifacts for {owner}/{repo}");
        let artifacts = self
            .listing
            .list_artifacts(owner, repo, &self.http_headers)
            .await;

        if artifacts.is_empty() {
            tracing::error!("Failed to get artifacts.");
            return Ok(DownloadOutcome::NoArtifacts {
                dir: dst_directory.to_path_buf(),
            });
        }

        let Some(artifact) = find_artifact(name, &artifacts) else {
            tracing::warn!("No artifact named '{name}' among {} artifacts", artifacts.len());
            return Ok(DownloadOutcome::NotFound {
                name: name.to_string(),
                dir: dst_directory.to_path_buf(),
            });
        };

        tracing::debug!(
            "Artifact '{name}' (id {}): {}",
            artifact.id,
            artifact.archive_download_url
        );

        let dir = self
            .unpacker
            .download_and_unpack(&artifact.archive_download_url, dst_directory, &self.http_headers)
            .await?;

        Ok(DownloadOutcome::Downloaded {
            artifact: artifact.clone(),
            dir,
        })
    }
}

impl fmt::Debug for GithubActionsFilestore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubActionsFilestore")
            .field("sanitizer", &self.config.sanitizer)
            .field("project_repo_owner", &self.config.project_repo_owner)
            .field("project_repo_name", &self.config.project_repo_name)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Filestore for GithubActionsFilestore {
    async fn upload_build(&self, build_dir: &Path) -> Result<UploadReceipt, FilestoreError> {
        self.upload_directory(&self.build_name(), build_dir).await
    }

    async fn upload_corpus(
        &self,
        name: &str,
        directory: &Path,
    ) -> Result<UploadReceipt, FilestoreError> {
        self.upload_directory(name, directory).await
    }

    async fn download_corpus(
        &self,
        name: &str,
        dst_directory: &Path,
    ) -> Result<DownloadOutcome, FilestoreError> {
        self.download_artifact(name, dst_directory).await
    }

    async fn download_build(
        &self,
        dst_directory: &Path,
    ) -> Result<DownloadOutcome, FilestoreError> {
        self.download_artifact(&self.build_name(), dst_directory).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::artifact_client::TransferError;
    use crate::io::download::DownloadError;
    use crate::io::extract::tests::zip_bytes;
    use crate::types::ArtifactMetadata;
    use crate::walk::item_path;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Mutex;

    fn config(sanitizer: &str) -> FilestoreConfig {
        FilestoreConfig {
            sanitizer: sanitizer.to_string(),
            project_repo_owner: "google".to_string(),
            project_repo_name: "oss-fuzz".to_string(),
            github_token: "ghs_secret".to_string(),
            api_url: "https://api.github.com".to_string(),
        }
    }

    fn artifact(name: &str, url: &str) -> ArtifactMetadata {
        ArtifactMetadata {
            id: 1,
            name: name.to_string(),
            size_in_bytes: 0,
            archive_download_url: url.to_string(),
            expired: false,
            created_at: None,
        }
    }

    /// Records uploads and keeps each artifact as an in-memory zip.
    #[derive(Default)]
    struct RecordingTransfer {
        calls: Mutex<Vec<(String, Vec<PathBuf>, PathBuf)>>,
        archives: Mutex<Vec<(String, Vec<u8>)>>,
    }

    #[async_trait]
    impl ArtifactTransfer for RecordingTransfer {
        async fn upload(
            &self,
            name: &str,
            files: &[PathBuf],
            root: &Path,
        ) -> Result<UploadReceipt, TransferError> {
            let mut items = Vec::new();
            let mut contents = Vec::new();
            for file in files {
                let item = item_path(file, root)
                    .ok_or_else(|| TransferError::OutsideRoot(file.clone()))?;
                contents.push((item.clone(), fs::read(file)?));
                items.push(item);
            }

            let entries: Vec<(&str, &[u8])> = contents
                .iter()
                .map(|(item, data)| (item.as_str(), data.as_slice()))
                .collect();
            let size = contents.iter().map(|(_, d)| d.len() as u64).sum();

            self.archives
                .lock()
                .unwrap()
                .push((name.to_string(), zip_bytes(&entries)));
            self.calls
                .lock()
                .unwrap()
                .push((name.to_string(), files.to_vec(), root.to_path_buf()));

            Ok(UploadReceipt {
                artifact_name: name.to_string(),
                items,
                size,
            })
        }
    }

    /// Returns a fixed listing and records the headers it was called with.
    struct FixedListing {
        artifacts: Vec<ArtifactMetadata>,
        seen_headers: Mutex<Vec<HeaderMap>>,
    }

    impl FixedListing {
        fn new(artifacts: Vec<ArtifactMetadata>) -> Self {
            Self {
                artifacts,
                seen_headers: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ArtifactListing for FixedListing {
        async fn list_artifacts(
            &self,
            _owner: &str,
            _repo: &str,
            headers: &HeaderMap,
        ) -> Vec<ArtifactMetadata> {
            self.seen_headers.lock().unwrap().push(headers.clone());
            self.artifacts.clone()
        }
    }

    /// Records calls without touching the network.
    #[derive(Default)]
    struct RecordingUnpacker {
        calls: Mutex<Vec<(String, PathBuf)>>,
    }

    #[async_trait]
    impl ArchiveUnpacker for RecordingUnpacker {
        async fn download_and_unpack(
            &self,
            url: &str,
            dst: &Path,
            _headers: &HeaderMap,
        ) -> Result<PathBuf, DownloadError> {
            self.calls
                .lock()
                .unwrap()
                .push((url.to_string(), dst.to_path_buf()));
            Ok(dst.to_path_buf())
        }
    }

    struct Fixture {
        transfer: Arc<RecordingTransfer>,
        listing: Arc<FixedListing>,
        unpacker: Arc<RecordingUnpacker>,
        store: GithubActionsFilestore,
    }

    fn fixture(sanitizer: &str, artifacts: Vec<ArtifactMetadata>) -> Fixture {
        let transfer = Arc::new(RecordingTransfer::default());
        let listing = Arc::new(FixedListing::new(artifacts));
        let unpacker = Arc::new(RecordingUnpacker::default());
        let store = GithubActionsFilestore::new(
            config(sanitizer),
            transfer.clone(),
            listing.clone(),
            unpacker.clone(),
        )
        .unwrap();

        Fixture {
            transfer,
            listing,
            unpacker,
            store,
        }
    }

    fn populate(dir: &Path) {
        fs::create_dir_all(dir.join("sub")).unwrap();
        fs::write(dir.join("a.txt"), "alpha").unwrap();
        fs::write(dir.join("sub/b.txt"), "beta").unwrap();
    }

    #[test]
    fn test_headers() {
        let fx = fixture("address", Vec::new());
        let headers = fx.store.http_headers();

        assert_eq!(headers[AUTHORIZATION], "token ghs_secret");
        assert!(headers[AUTHORIZATION].is_sensitive());
        assert_eq!(headers[ACCEPT], "application/vnd.github.v3+json");
    }

    #[test]
    fn test_invalid_token_rejected() {
        let mut cfg = config("address");
        cfg.github_token = "bad\ntoken".to_string();

        let err = GithubActionsFilestore::new(
            cfg,
            Arc::new(RecordingTransfer::default()),
            Arc::new(FixedListing::new(Vec::new())),
            Arc::new(RecordingUnpacker::default()),
        )
        .unwrap_err();

        assert!(matches!(err, FilestoreError::InvalidHeader(_)));
    }

    #[test]
    fn test_debug_hides_token() {
        let fx = fixture("address", Vec::new());
        let debug = format!("{:?}", fx.store);
        assert!(debug.contains("oss-fuzz"));
        assert!(!debug.contains("ghs_secret"));
    }

    #[tokio::test]
    async fn test_upload_build_name_and_files() {
        for sanitizer in ["address", "memory", "undefined", ""] {
            let fx = fixture(sanitizer, Vec::new());
            let tmp = tempfile::tempdir().unwrap();
            populate(tmp.path());

            let receipt = fx.store.upload_build(tmp.path()).await.unwrap();

            let expected_name = format!("cifuzz-build-{sanitizer}");
            assert_eq!(receipt.artifact_name, expected_name);

            let calls = fx.transfer.calls.lock().unwrap();
            let (name, files, root) = &calls[0];
            assert_eq!(name, &expected_name);
            assert_eq!(root, &std::path::absolute(tmp.path()).unwrap());
            assert_eq!(files, &vec![root.join("a.txt"), root.join("sub/b.txt")]);
        }
    }

    #[tokio::test]
    async fn test_upload_corpus_items() {
        let fx = fixture("address", Vec::new());
        let tmp = tempfile::tempdir().unwrap();
        populate(tmp.path());

        let receipt = fx
            .store
            .upload_corpus("corpus-fuzz_target", tmp.path())
            .await
            .unwrap();

        assert_eq!(receipt.artifact_name, "corpus-fuzz_target");
        assert_eq!(receipt.items, vec!["a.txt", "sub/b.txt"]);
        assert_eq!(receipt.size, 9);
        assert_eq!(fx.transfer.calls.lock().unwrap()[0].1.len(), 2);
    }

    #[tokio::test]
    async fn test_upload_missing_directory() {
        let fx = fixture("address", Vec::new());
        let tmp = tempfile::tempdir().unwrap();

        let err = fx
            .store
            .upload_corpus("corpus", &tmp.path().join("missing"))
            .await
            .unwrap_err();

        assert!(matches!(err, FilestoreError::Io(_)));
        assert!(fx.transfer.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_download_corpus_empty_listing() {
        let fx = fixture("address", Vec::new());
        let dst = PathBuf::from("/tmp/dst");

        let outcome = fx.store.download_corpus("corpus", &dst).await.unwrap();

        assert_eq!(outcome, DownloadOutcome::NoArtifacts { dir: dst.clone() });
        assert_eq!(outcome.dir(), dst.as_path());
        assert!(fx.unpacker.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_download_corpus_found() {
        let url = "https://api.github.com/repos/google/oss-fuzz/actions/artifacts/5/zip";
        let fx = fixture(
            "address",
            vec![artifact("other", "https://wrong"), artifact("corpus", url)],
        );
        let dst = PathBuf::from("/tmp/dst");

        let outcome = fx.store.download_corpus("corpus", &dst).await.unwrap();

        assert!(outcome.is_downloaded());
        assert_eq!(outcome.dir(), dst.as_path());
        let calls = fx.unpacker.calls.lock().unwrap();
        assert_eq!(calls.as_slice(), &[(url.to_string(), dst.clone())]);

        let seen = fx.listing.seen_headers.lock().unwrap();
        assert_eq!(seen[0][AUTHORIZATION], "token ghs_secret");
    }

    #[tokio::test]
    async fn test_download_corpus_not_found() {
        let fx = fixture("address", vec![artifact("other", "https://x")]);
        let dst = PathBuf::from("/tmp/dst");

        let outcome = fx.store.download_corpus("corpus", &dst).await.unwrap();

        assert_eq!(
            outcome,
            DownloadOutcome::NotFound {
                name: "corpus".to_string(),
                dir: dst,
            }
        );
        assert!(fx.unpacker.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_download_build_uses_build_name() {
        let fx = fixture(
            "memory",
            vec![
                artifact("cifuzz-build-address", "https://asan"),
                artifact("cifuzz-build-memory", "https://msan"),
            ],
        );

        let outcome = fx.store.download_build(Path::new("/out")).await.unwrap();

        assert!(outcome.is_downloaded());
        let calls = fx.unpacker.calls.lock().unwrap();
        assert_eq!(calls[0].0, "https://msan");
    }

    #[tokio::test]
    async fn test_corpus_round_trip() {
        let mut server = mockito::Server::new_async().await;
        let transfer = Arc::new(RecordingTransfer::default());

        let src = tempfile::tempdir().unwrap();
        populate(src.path());

        // Upload through a store whose listing is still empty.
        let uploader = GithubActionsFilestore::new(
            config("address"),
            transfer.clone(),
            Arc::new(FixedListing::new(Vec::new())),
            Arc::new(RecordingUnpacker::default()),
        )
        .unwrap();
        uploader.upload_corpus("corpus", src.path()).await.unwrap();

        let (name, archive) = transfer.archives.lock().unwrap()[0].clone();
        let _m = server
            .mock("GET", "/artifacts/1/zip")
            .match_header("authorization", "token ghs_secret")
            .with_status(200)
            .with_body(archive)
            .create_async()
            .await;

        // Download through the real HTTP unpacker.
        let url = format!("{}/artifacts/1/zip", server.url());
        let downloader = GithubActionsFilestore::new(
            config("address"),
            transfer,
            Arc::new(FixedListing::new(vec![artifact(&name, &url)])),
            Arc::new(HttpUnpacker::new(Client::new())),
        )
        .unwrap();

        let dst = tempfile::tempdir().unwrap();
        let outcome = downloader
            .download_corpus("corpus", dst.path())
            .await
            .unwrap();

        assert_eq!(outcome.into_found().unwrap(), dst.path());
        assert_eq!(fs::read_to_string(dst.path().join("a.txt")).unwrap(), "alpha");
        assert_eq!(fs::read_to_string(dst.path().join("sub/b.txt")).unwrap(), "beta");
    }
}
