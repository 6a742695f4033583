//! Domain models for legislative records.

pub mod checkpoint;
pub mod committee;
pub mod hearing;
pub mod member;
pub mod relationship;
pub mod run;

pub use checkpoint::{Checkpoint, CheckpointKey};
pub use committee::Committee;
pub use hearing::{Hearing, HearingStatus};
pub use member::Member;
pub use relationship::{Relationship, RelationshipSource};
pub use run::{PhaseOutcome, PhaseStatus, RunSummary};

use serde::{Deserialize, Serialize};

/// Chamber affiliation of a committee or hearing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chamber {
    House,
    Senate,
    Joint,
}

impl Chamber {
    /// Parse from string, as the upstream API spells it.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "house" => Some(Self::House),
            "senate" => Some(Self::Senate),
            "joint" | "nochamber" => Some(Self::Joint),
            _ => None,
        }
    }

    /// Convert to string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::House => "house",
            Self::Senate => "senate",
            Self::Joint => "joint",
        }
    }
}

impl std::fmt::Display for Chamber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sync phase. Order is fixed: hearings reference committees, and
/// inference needs committee data to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Committees,
    Members,
    Hearings,
    Inference,
}

impl Phase {
    /// All phases in execution order.
    pub const ORDER: [Phase; 4] = [
        Phase::Committees,
        Phase::Members,
        Phase::Hearings,
        Phase::Inference,
    ];

    /// Convert to string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Committees => "committees",
            Self::Members => "members",
            Self::Hearings => "hearings",
            Self::Inference => "inference",
        }
    }

    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "committees" => Some(Self::Committees),
            "members" => Some(Self::Members),
            "hearings" => Some(Self::Hearings),
            "inference" => Some(Self::Inference),
            _ => None,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chamber_roundtrip() {
        for c in [Chamber::House, Chamber::Senate, Chamber::Joint] {
            assert_eq!(Chamber::from_str(c.as_str()), Some(c));
        }
        assert_eq!(Chamber::from_str("HOUSE"), Some(Chamber::House));
        assert_eq!(Chamber::from_str("unknown"), None);
    }

    #[test]
    fn test_phase_order() {
        assert_eq!(Phase::ORDER[0], Phase::Committees);
        assert_eq!(Phase::ORDER[3], Phase::Inference);
        for p in Phase::ORDER {
            assert_eq!(Phase::from_str(p.as_str()), Some(p));
        }
    }
}
