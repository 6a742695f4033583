//! Terminal output formatting.

use colored::Colorize;

use legisync_core::model::{Checkpoint, PhaseStatus, RunSummary};
use legisync_db::PlannedWrite;

/// Print a run summary with per-phase counters.
pub fn print_summary(summary: &RunSummary) {
    println!(
        "{} {} {}",
        "Run".cyan().bold(),
        summary.run_id.dimmed(),
        format!("(congress {})", summary.congress).dimmed()
    );
    println!(
        "  started {}  ended {}",
        summary.started_at,
        summary.ended_at.as_deref().unwrap_or("-")
    );
    println!();
    println!(
        "  {:<12} {:<10} {:>8} {:>8} {:>8} {:>10} {:>12}",
        "Phase", "Status", "Applied", "Skipped", "Failed", "Inferred", "Unassigned"
    );
    println!("  {}", "-".repeat(74));
    for phase in &summary.phases {
        let status = match phase.status {
            PhaseStatus::Completed => phase.status.as_str().green(),
            PhaseStatus::Partial => phase.status.as_str().yellow(),
            PhaseStatus::Failed => phase.status.as_str().red(),
            PhaseStatus::Skipped => phase.status.as_str().dimmed(),
        };
        println!(
            "  {:<12} {:<10} {:>8} {:>8} {:>8} {:>10} {:>12}",
            phase.phase.as_str(),
            status,
            phase.applied,
            phase.skipped,
            phase.failed,
            phase.inferred_accepted,
            phase.inferred_unassigned
        );
        if let Some(error) = &phase.error {
            println!("    {}", error.red());
        }
    }
    println!();
}

/// Print stored checkpoints.
pub fn print_checkpoints(checkpoints: &[Checkpoint]) {
    if checkpoints.is_empty() {
        println!("{}", "No checkpoints stored.".dimmed());
        return;
    }
    println!(
        "{:<32} {:<40} {:<24}",
        "Checkpoint".bold(),
        "Cursor".bold(),
        "Updated".bold()
    );
    for cp in checkpoints {
        println!("{:<32} {:<40} {:<24}", cp.key.to_string(), cp.cursor, cp.updated_at);
    }
    println!();
}

/// Print relationship counts per source tag.
pub fn print_relationship_counts(counts: &[(String, i64)]) {
    if counts.is_empty() {
        println!("{}", "No hearing-committee relationships stored.".dimmed());
        return;
    }
    println!("{}", "Relationships by source".bold());
    for (source, count) in counts {
        println!("  {:<12} {}", source, count);
    }
    println!();
}

/// Print the writes a dry run would have performed.
pub fn print_planned_writes(writes: &[PlannedWrite]) {
    println!(
        "{} {} planned writes (dry run, nothing persisted)",
        "Dry run:".yellow().bold(),
        writes.len()
    );
    for write in writes {
        match write {
            PlannedWrite::Hearing(id) => println!("  hearing      {}", id),
            PlannedWrite::Committee(code) => println!("  committee    {}", code),
            PlannedWrite::Member(id) => println!("  member       {}", id),
            PlannedWrite::Relationship(rel) => println!(
                "  relationship {} -> {} ({:.2}, {})",
                rel.hearing_id,
                rel.committee_code,
                rel.confidence,
                rel.source.as_str()
            ),
            PlannedWrite::Checkpoint(key) => println!("  checkpoint   {}", key),
            PlannedWrite::CheckpointDelete(key) => println!("  checkpoint   {} (delete)", key),
        }
    }
}
