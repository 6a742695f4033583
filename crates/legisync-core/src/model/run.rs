//! Sync run summary models.
//!
//! Purely observational: a run summary is recorded for reporting but its
//! absence never affects resumability.

use serde::{Deserialize, Serialize};

use super::Phase;

/// Terminal status of one phase within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    Completed,
    /// Some records failed but the phase ran to the end of its input.
    Partial,
    Failed,
    Skipped,
}

impl PhaseStatus {
    /// Convert to string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Partial => "partial",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// Counters for one phase of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseOutcome {
    pub phase: Phase,
    pub status: PhaseStatus,
    pub applied: u64,
    pub skipped: u64,
    pub failed: u64,
    /// Inference phase only: accepted relationships.
    pub inferred_accepted: u64,
    /// Inference phase only: hearings left unassigned below threshold.
    pub inferred_unassigned: u64,
    /// Human-readable reason when status is Failed.
    pub error: Option<String>,
}

impl PhaseOutcome {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            status: PhaseStatus::Completed,
            applied: 0,
            skipped: 0,
            failed: 0,
            inferred_accepted: 0,
            inferred_unassigned: 0,
            error: None,
        }
    }

    /// Settle the final status from the counters, unless already failed.
    pub fn finalize(&mut self) {
        if self.status == PhaseStatus::Failed {
            return;
        }
        self.status = if self.failed > 0 {
            PhaseStatus::Partial
        } else {
            PhaseStatus::Completed
        };
    }
}

/// Summary of one sync run across all phases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub congress: i64,
    /// Start timestamp, RFC 3339.
    pub started_at: String,
    /// End timestamp, RFC 3339. None while the run is in flight.
    pub ended_at: Option<String>,
    pub phases: Vec<PhaseOutcome>,
}

impl RunSummary {
    pub fn new(congress: i64) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            congress,
            started_at: chrono::Utc::now().to_rfc3339(),
            ended_at: None,
            phases: Vec::new(),
        }
    }

    /// Whether any phase failed outright.
    pub fn has_failures(&self) -> bool {
        self.phases.iter().any(|p| p.status == PhaseStatus::Failed)
    }

    /// Mark the run finished.
    pub fn finish(&mut self) {
        self.ended_at = Some(chrono::Utc::now().to_rfc3339());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_finalize() {
        let mut ok = PhaseOutcome::new(Phase::Committees);
        ok.applied = 10;
        ok.finalize();
        assert_eq!(ok.status, PhaseStatus::Completed);

        let mut partial = PhaseOutcome::new(Phase::Hearings);
        partial.applied = 9;
        partial.failed = 1;
        partial.finalize();
        assert_eq!(partial.status, PhaseStatus::Partial);

        let mut failed = PhaseOutcome::new(Phase::Hearings);
        failed.status = PhaseStatus::Failed;
        failed.finalize();
        assert_eq!(failed.status, PhaseStatus::Failed);
    }
}
