//! CIFuzz filestore backed by GitHub Actions artifacts.
//!
//! Fuzzing builds and corpora are persisted between CI runs as workflow
//! artifacts. This crate provides the [`Filestore`] interface and its
//! GitHub Actions implementation, [`GithubActionsFilestore`].
//!
//! # Architecture
//!
//! The store itself is glue: it walks directories, derives artifact names
//! and request headers, and delegates the actual I/O to three collaborators
//! injected at construction:
//!
//! - [`ArtifactTransfer`] uploads a set of files under an artifact name
//!   ([`github::artifact_client::ActionsArtifactClient`]).
//! - [`ArtifactListing`] lists the artifacts of a repository
//!   ([`github::api::GithubApi`]).
//! - [`ArchiveUnpacker`] downloads an archive and extracts it
//!   ([`io::download::HttpUnpacker`]).
//!
//! Tests substitute any of them with in-memory fakes.

pub mod config;
pub mod error;
pub mod github;
pub mod io;
pub mod store;
pub mod traits;
pub mod types;
pub mod walk;

pub use config::{ActionsRuntime, ConfigError, FilestoreConfig};
pub use error::FilestoreError;
pub use store::GithubActionsFilestore;
pub use traits::{ArchiveUnpacker, ArtifactListing, ArtifactTransfer, Filestore};
pub use types::{ArtifactMetadata, DownloadOutcome, UploadReceipt};

/// User Agent string sent with every request
pub const USER_AGENT: &str = concat!("cifuzz-filestore/", env!("CARGO_PKG_VERSION"));
