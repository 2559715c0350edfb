//! cifuzz-filestore - persist fuzzing builds and corpora between CI runs
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
//!
//! Builds and corpora are stored as GitHub Actions workflow artifacts.
//! Configuration comes from the job environment:
//!
//! | Variable | Purpose |
//! |---|---|
//! | `GITHUB_TOKEN` | REST API token (required) |
//! | `GITHUB_REPOSITORY` | `owner/name` whose artifacts are listed (required) |
//! | `SANITIZER` | Build sanitizer, default `address` |
//! | `GITHUB_API_URL` | REST API base, default `https://api.github.com` |
//! | `ACTIONS_RUNTIME_URL`, `ACTIONS_RUNTIME_TOKEN`, `GITHUB_RUN_ID` | Needed for uploads |

pub mod cmd;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "cifuzz-filestore")]
#[command(author, version, about = "Upload and download CIFuzz builds and corpora")]
pub struct Cli {
    /// Sanitizer the build was compiled with
    #[arg(long, global = true, env = "SANITIZER")]
    pub sanitizer: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Upload a build directory as cifuzz-build-<sanitizer>
    UploadBuild {
        /// Directory containing the build
        dir: PathBuf,
    },
    /// Upload a corpus directory under a name
    UploadCorpus {
        /// Artifact name
        name: String,
        /// Directory containing the corpus
        dir: PathBuf,
    },
    /// Download a named corpus into a directory
    DownloadCorpus {
        /// Artifact name
        name: String,
        /// Destination directory
        dst: PathBuf,
    },
    /// Download the latest build for the sanitizer into a directory
    DownloadBuild {
        /// Destination directory
        dst: PathBuf,
    },
}
