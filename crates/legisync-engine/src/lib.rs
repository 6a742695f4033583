//! Legisync Sync Engine
//!
//! The incremental synchronization and relationship-inference engine:
//! changeset construction over the rate-limited client, confidence-scored
//! committee inference, and the checkpointed phase orchestrator.

pub mod changeset;
pub mod inference;
pub mod orchestrator;

pub use changeset::{ChangeSetBuilder, ChangeUnit};
pub use inference::{InferenceDecision, RelationshipInferencer};
pub use orchestrator::{CancelToken, SyncOrchestrator};
