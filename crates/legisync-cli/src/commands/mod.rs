//! CLI command definitions and handlers.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod checkpoint;
pub mod status;
pub mod sync;

/// Legisync - Congressional Hearing Synchronization
#[derive(Parser)]
#[command(name = "legisync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the SQLite database file
    #[arg(long, global = true, default_value = ".legisync/legisync.db")]
    pub db: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run an incremental sync against the upstream API
    Sync(sync::SyncArgs),

    /// Show checkpoints, recent runs, and relationship counts
    Status(status::StatusArgs),

    /// Checkpoint maintenance
    #[command(subcommand)]
    Checkpoint(checkpoint::CheckpointCommands),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Sync(args) => sync::execute(args, &self.db).await,
            Commands::Status(args) => status::execute(args, &self.db).await,
            Commands::Checkpoint(cmd) => checkpoint::execute(cmd, &self.db).await,
        }
    }
}
