//! Checkpoint maintenance commands.
//!
//! A corrupt checkpoint fails its phase until an operator resets it here;
//! the engine never discards one on its own.

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;

use legisync_core::model::{Chamber, CheckpointKey, Phase};
use legisync_db::queries;

use crate::output;

#[derive(Subcommand)]
pub enum CheckpointCommands {
    /// List stored checkpoints
    List,

    /// Delete a checkpoint so its phase restarts from the beginning
    Reset(ResetArgs),
}

#[derive(Args)]
pub struct ResetArgs {
    /// Phase: committees, members, hearings, or inference
    #[arg(long)]
    pub phase: String,

    /// Congress number
    #[arg(long)]
    pub congress: i64,

    /// Chamber the checkpoint was scoped to, if any
    #[arg(long)]
    pub chamber: Option<String>,
}

pub async fn execute(cmd: CheckpointCommands, db_path: &Path) -> Result<()> {
    let pool = legisync_db::open(db_path)
        .with_context(|| format!("opening database at {}", db_path.display()))?;

    match cmd {
        CheckpointCommands::List => {
            let checkpoints = queries::checkpoints::list_checkpoints(&pool)?;
            output::print_checkpoints(&checkpoints);
        }
        CheckpointCommands::Reset(args) => {
            let phase = Phase::from_str(&args.phase)
                .with_context(|| format!("unknown phase '{}'", args.phase))?;
            let chamber = match &args.chamber {
                None => None,
                Some(raw) => Some(
                    Chamber::from_str(raw)
                        .with_context(|| format!("unknown chamber '{}'", raw))?,
                ),
            };
            let key = CheckpointKey::new(phase, args.congress, chamber);
            queries::checkpoints::delete_checkpoint(&pool, &key)?;
            println!("{} checkpoint {}", "Reset".green().bold(), key);
        }
    }
    Ok(())
}
