//! Per-entity query modules.

pub mod checkpoints;
pub mod committees;
pub mod hearings;
pub mod members;
pub mod relationships;
pub mod sync_runs;
