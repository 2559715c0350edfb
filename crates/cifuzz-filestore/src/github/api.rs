//! Artifact listing through the GitHub REST API.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::HeaderMap;
use serde::Deserialize;

use crate::traits::ArtifactListing;
use crate::types::ArtifactMetadata;

/// Largest page size the endpoint accepts
const PER_PAGE: usize = 100;

/// Stop paginating after this many pages
const MAX_PAGES: usize = 100;

#[derive(Debug, Deserialize)]
struct ArtifactPage {
    total_count: usize,
    #[serde(default)]
    artifacts: Vec<ArtifactMetadata>,
}

/// [`ArtifactListing`] backed by `GET /repos/{owner}/{repo}/actions/artifacts`.
#[derive(Debug, Clone)]
pub struct GithubApi {
    client: Client,
    api_url: String,
}

impl GithubApi {
    /// Create a listing client rooted at `api_url` (e.g. `https://api.github.com`).
    pub fn new(client: Client, api_url: &str) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_page(
        &self,
        owner: &str,
        repo: &str,
        headers: &HeaderMap,
        page: usize,
    ) -> Result<ArtifactPage, reqwest::Error> {
        let url = format!("{}/repos/{owner}/{repo}/actions/artifacts", self.api_url);
        self.client
            .get(&url)
            .headers(headers.clone())
            .header(reqwest::header::USER_AGENT, crate::USER_AGENT)
            .query(&[("per_page", PER_PAGE), ("page", page)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

#[async_trait]
impl ArtifactListing for GithubApi {
    async fn list_artifacts(
        &self,
        owner: &str,
        repo: &str,
        headers: &HeaderMap,
    ) -> Vec<ArtifactMetadata> {
        let mut artifacts = Vec::new();

        for page in 1..=MAX_PAGES {
            let result = match self.fetch_page(owner, repo, headers, page).await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!("Failed to list artifacts for {owner}/{repo}: {e}");
                    break;
                }
            };

            let fetched = result.artifacts.len();
            artifacts.extend(result.artifacts);

            if fetched == 0 || artifacts.len() >= result.total_count {
                break;
            }
        }

        tracing::debug!("Listed {} artifacts for {owner}/{repo}", artifacts.len());
        artifacts
    }
}

/// Find the artifact called `name`.
///
/// Expired artifacts are ignored. The API lists newest first, so the first
/// match is the most recent upload.
pub fn find_artifact<'a>(
    name: &str,
    artifacts: &'a [ArtifactMetadata],
) -> Option<&'a ArtifactMetadata> {
    artifacts.iter().find(|a| a.name == name && !a.expired)
}
