//! cifuzz-filestore CLI

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cifuzz_filestore_cli::cmd;
use cifuzz_filestore_cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let store = cmd::open_store(cli.sanitizer.as_deref())?;

    match cli.command {
        Commands::UploadBuild { dir } => cmd::upload::upload_build(&store, &dir).await,
        Commands::UploadCorpus { name, dir } => {
            cmd::upload::upload_corpus(&store, &name, &dir).await
        }
        Commands::DownloadCorpus { name, dst } => {
            cmd::download::download_corpus(&store, &name, &dst).await
        }
        Commands::DownloadBuild { dst } => cmd::download::download_build(&store, &dst).await,
    }
}
