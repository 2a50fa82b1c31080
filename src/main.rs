//! ue-analyzer CLI entry point

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use ue_analyzer::cli::{self, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so JSON output stays clean
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_env("UE_ANALYZER_LOG"))
        .init();

    let args = Cli::parse();
    cli::run(args).await.context("ue-analyzer failed")
}
