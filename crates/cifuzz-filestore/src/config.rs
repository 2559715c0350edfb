//! Configuration loaded from the CI environment.

use std::fmt;

use thiserror::Error;

/// Default REST endpoint when `GITHUB_API_URL` is not set.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Sanitizer used when `SANITIZER` is not set.
pub const DEFAULT_SANITIZER: &str = "address";

/// Errors raised while reading configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required environment variable is unset or empty.
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    /// `GITHUB_REPOSITORY` is not of the form `owner/name`.
    #[error("Invalid repository '{0}', expected owner/name")]
    InvalidRepository(String),
}

/// Configuration for the filestore.
///
/// `Debug` output redacts the token.
#[derive(Clone)]
pub struct FilestoreConfig {
    /// Sanitizer the build was compiled with (e.g. `address`, `memory`)
    pub sanitizer: String,
    /// Owner of the repository whose artifacts are listed
    pub project_repo_owner: String,
    /// Name of the repository whose artifacts are listed
    pub project_repo_name: String,
    /// Token used to authenticate against the REST API
    pub github_token: String,
    /// REST API base URL (e.g. `https://api.github.com`)
    pub api_url: String,
}

impl FilestoreConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `GITHUB_TOKEN` or `GITHUB_REPOSITORY` is missing,
    /// or if the repository is not `owner/name`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// See [`FilestoreConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let github_token = get("GITHUB_TOKEN").ok_or(ConfigError::Missing("GITHUB_TOKEN"))?;
        let repository =
            get("GITHUB_REPOSITORY").ok_or(ConfigError::Missing("GITHUB_REPOSITORY"))?;
        let (owner, name) = split_repository(&repository)?;

        Ok(Self {
            sanitizer: get("SANITIZER").unwrap_or_else(|| DEFAULT_SANITIZER.to_string()),
            project_repo_owner: owner.to_string(),
            project_repo_name: name.to_string(),
            github_token,
            api_url: get("GITHUB_API_URL").map_or_else(
                || DEFAULT_API_URL.to_string(),
                |url| url.trim_end_matches('/').to_string(),
            ),
        })
    }

    /// Override the sanitizer.
    pub fn with_sanitizer(mut self, sanitizer: impl Into<String>) -> Self {
        self.sanitizer = sanitizer.into();
        self
    }
}

impl fmt::Debug for FilestoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilestoreConfig")
            .field("sanitizer", &self.sanitizer)
            .field("project_repo_owner", &self.project_repo_owner)
            .field("project_repo_name", &self.project_repo_name)
            .field("github_token", &REDACTED)
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// Placeholder printed in place of secrets
const REDACTED: &str = "<redacted>";

fn split_repository(repository: &str) -> Result<(&str, &str), ConfigError> {
    match repository.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok((owner, name))
        }
        _ => Err(ConfigError::InvalidRepository(repository.to_string())),
    }
}

/// Connection details for the Actions runtime artifact service.
///
/// Only present inside a running workflow job.
#[derive(Clone)]
pub struct ActionsRuntime {
    /// Base URL of the runtime service, always ending in `/`
    pub runtime_url: String,
    /// Bearer token scoped to the current job
    pub runtime_token: String,
    /// Workflow run the artifacts belong to
    pub run_id: String,
}

impl ActionsRuntime {
    /// Load runtime details from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `ACTIONS_RUNTIME_URL`, `ACTIONS_RUNTIME_TOKEN` or
    /// `GITHUB_RUN_ID` is missing.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load runtime details through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`ActionsRuntime::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let mut runtime_url = get("ACTIONS_RUNTIME_URL")?;
        if !runtime_url.ends_with('/') {
            runtime_url.push('/');
        }

        Ok(Self {
            runtime_url,
            runtime_token: get("ACTIONS_RUNTIME_TOKEN")?,
            run_id: get("GITHUB_RUN_ID")?,
        })
    }
}

impl fmt::Debug for ActionsRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionsRuntime")
            .field("runtime_url", &self.runtime_url)
            .field("runtime_token", &REDACTED)
            .field("run_id", &self.run_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = FilestoreConfig::from_lookup(lookup(&[
            ("GITHUB_TOKEN", "ghs_abc"),
            ("GITHUB_REPOSITORY", "google/oss-fuzz"),
        ]))
        .unwrap();

        assert_eq!(config.sanitizer, "address");
        assert_eq!(config.project_repo_owner, "google");
        assert_eq!(config.project_repo_name, "oss-fuzz");
        assert_eq!(config.github_token, "ghs_abc");
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = FilestoreConfig::from_lookup(lookup(&[
            ("GITHUB_TOKEN", "t"),
            ("GITHUB_REPOSITORY", "o/r"),
            ("SANITIZER", "memory"),
            ("GITHUB_API_URL", "https://ghe.example.com/api/v3/"),
        ]))
        .unwrap();

        assert_eq!(config.sanitizer, "memory");
        assert_eq!(config.api_url, "https://ghe.example.com/api/v3");
        assert_eq!(config.with_sanitizer("undefined").sanitizer, "undefined");
    }

    #[test]
    fn test_from_lookup_missing_token() {
        let err = FilestoreConfig::from_lookup(lookup(&[("GITHUB_REPOSITORY", "o/r")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::Missing("GITHUB_TOKEN"));

        let err = FilestoreConfig::from_lookup(lookup(&[
            ("GITHUB_TOKEN", ""),
            ("GITHUB_REPOSITORY", "o/r"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing("GITHUB_TOKEN"));
    }

    #[test]
    fn test_from_lookup_bad_repository() {
        for repo in ["oss-fuzz", "/r", "o/", "a/b/c"] {
            let err = FilestoreConfig::from_lookup(lookup(&[
                ("GITHUB_TOKEN", "t"),
                ("GITHUB_REPOSITORY", repo),
            ]))
            .unwrap_err();
            assert_eq!(err, ConfigError::InvalidRepository(repo.to_string()));
        }
    }

    #[test]
    fn test_runtime_from_lookup() {
        let runtime = ActionsRuntime::from_lookup(lookup(&[
            ("ACTIONS_RUNTIME_URL", "https://pipelines.actions.example.com/abc"),
            ("ACTIONS_RUNTIME_TOKEN", "rt"),
            ("GITHUB_RUN_ID", "1234"),
        ]))
        .unwrap();
        assert_eq!(runtime.runtime_url, "https://pipelines.actions.example.com/abc/");
        assert_eq!(runtime.run_id, "1234");

        let err = ActionsRuntime::from_lookup(lookup(&[("ACTIONS_RUNTIME_URL", "x")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::Missing("ACTIONS_RUNTIME_TOKEN"));
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let config = FilestoreConfig::from_lookup(lookup(&[
            ("GITHUB_TOKEN", "ghs_topsecret"),
            ("GITHUB_REPOSITORY", "google/oss-fuzz"),
        ]))
        .unwrap();
        let shown = format!("{config:?}");
        assert!(!shown.contains("ghs_topsecret"));
        assert!(shown.contains("<redacted>"));
        assert!(shown.contains("oss-fuzz"));

        let runtime = ActionsRuntime::from_lookup(lookup(&[
            ("ACTIONS_RUNTIME_URL", "https://pipelines.example.com/"),
            ("ACTIONS_RUNTIME_TOKEN", "rt-topsecret"),
            ("GITHUB_RUN_ID", "7"),
        ]))
        .unwrap();
        let shown = format!("{runtime:?}");
        assert!(!shown.contains("rt-topsecret"));
        assert!(shown.contains("pipelines.example.com"));
    }
}
