//! Checkpoint model for resumable sync runs.

use serde::{Deserialize, Serialize};

use super::{Chamber, Phase};

/// Identity of a checkpoint: one active checkpoint exists per
/// (phase, congress, chamber) tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CheckpointKey {
    pub phase: Phase,
    pub congress: i64,
    pub chamber: Option<Chamber>,
}

impl CheckpointKey {
    pub fn new(phase: Phase, congress: i64, chamber: Option<Chamber>) -> Self {
        Self { phase, congress, chamber }
    }
}

impl std::fmt::Display for CheckpointKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.phase,
            self.congress,
            self.chamber.map(|c| c.as_str()).unwrap_or("all")
        )
    }
}

/// Persisted cursor marking the last fully-applied unit of work.
///
/// The cursor is an opaque token minted by the upstream source; the engine
/// never interprets it beyond equality and presence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub key: CheckpointKey,
    pub cursor: String,
    /// Write timestamp, RFC 3339.
    pub updated_at: String,
}

impl Checkpoint {
    pub fn new(key: CheckpointKey, cursor: impl Into<String>) -> Self {
        Self {
            key,
            cursor: cursor.into(),
            updated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
