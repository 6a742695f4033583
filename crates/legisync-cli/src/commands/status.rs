//! The `status` command: show checkpoints, runs, and relationship counts.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use legisync_db::queries;

use crate::output;

#[derive(Args)]
pub struct StatusArgs {
    /// Number of recent runs to show
    #[arg(long, default_value_t = 5)]
    pub runs: u32,
}

pub async fn execute(args: StatusArgs, db_path: &Path) -> Result<()> {
    let pool = legisync_db::open(db_path)
        .with_context(|| format!("opening database at {}", db_path.display()))?;

    let checkpoints = queries::checkpoints::list_checkpoints(&pool)?;
    output::print_checkpoints(&checkpoints);

    let counts = queries::relationships::count_by_source(&pool)?;
    output::print_relationship_counts(&counts);

    let members = queries::members::count_members(&pool)?;
    println!("{} {}", "Members stored:".bold(), members);
    println!();

    let runs = queries::sync_runs::list_recent_runs(&pool, args.runs)?;
    for run in &runs {
        output::print_summary(run);
    }
    Ok(())
}
