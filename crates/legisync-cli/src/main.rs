//! Legisync CLI
//!
//! Incremental synchronization of congressional hearing records into a
//! local SQLite store, with committee relationship inference.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;

use commands::Cli;

/// Initialize tracing from RUST_LOG, defaulting per verbosity.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "legisync=debug"
    } else {
        "legisync=info"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    cli.execute().await
}
