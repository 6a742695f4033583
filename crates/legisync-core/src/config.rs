//! Configuration passed explicitly into engine components.
//!
//! There is no process-wide state: the CLI layer constructs these values and
//! injects them into the client, gateway, and orchestrator constructors.

use serde::{Deserialize, Serialize};

use crate::model::Chamber;

/// Configuration for the rate-limited upstream client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: String,
    /// Global request budget per hour. The token bucket refills at
    /// `requests_per_hour / 3600` tokens per second.
    pub requests_per_hour: u32,
    /// Burst capacity of the token bucket.
    pub burst: u32,
    /// Maximum retry attempts for transient failures.
    pub max_retries: u32,
    /// Base backoff delay in milliseconds; doubles per attempt.
    pub base_backoff_ms: u64,
    /// Records requested per page.
    pub page_size: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.congress.gov/v3".to_string(),
            api_key: String::new(),
            requests_per_hour: 5000,
            burst: 10,
            max_retries: 4,
            base_backoff_ms: 500,
            page_size: 250,
        }
    }
}

/// Which resource families a run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Committees,
    Members,
    Hearings,
}

impl Component {
    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "committees" => Some(Self::Committees),
            "members" => Some(Self::Members),
            "hearings" => Some(Self::Hearings),
            _ => None,
        }
    }
}

/// Parameters for one sync run, handed in by the invocation surface.
#[derive(Debug, Clone)]
pub struct SyncParams {
    pub congress: i64,
    pub chamber: Option<Chamber>,
    /// Days prior to now within which remote changes are considered.
    pub lookback_days: u32,
    pub components: Vec<Component>,
    /// Compute changeset and inference decisions without mutating storage.
    pub dry_run: bool,
    /// Cap on concurrently applied records within one unit of work.
    pub concurrency: usize,
    /// Hearings processed between inference checkpoints.
    pub inference_batch: usize,
}

impl SyncParams {
    pub fn new(congress: i64) -> Self {
        Self {
            congress,
            chamber: None,
            lookback_days: 7,
            components: vec![Component::Committees, Component::Members, Component::Hearings],
            dry_run: false,
            concurrency: 4,
            inference_batch: 25,
        }
    }

    /// Whether a component was selected for this run.
    pub fn includes(&self, component: Component) -> bool {
        self.components.contains(&component)
    }
}

/// Tunable parameters for relationship inference.
///
/// The threshold and weights default to calibrated values but stay
/// adjustable; they are estimates, not source-of-truth constants.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// Event-id distance within which neighboring hearings are considered.
    pub proximity_radius: i64,
    pub proximity_weight: f64,
    pub keyword_weight: f64,
    /// Minimum combined score for a candidate to be accepted.
    pub threshold: f64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            proximity_radius: 100,
            proximity_weight: 0.6,
            keyword_weight: 0.4,
            threshold: 0.5,
        }
    }
}
