//! Hearing domain model.

use serde::{Deserialize, Serialize};

use super::Chamber;

/// A committee hearing or meeting.
///
/// Created on first sight from the remote source; never deleted, only
/// updated. The event id is externally assigned and unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hearing {
    pub event_id: i64,
    pub congress: i64,
    pub chamber: Chamber,
    pub title: Option<String>,
    /// RFC 3339 timestamp of the scheduled date, when known.
    pub hearing_date: Option<String>,
    pub status: HearingStatus,
    pub video_url: Option<String>,
    /// Committee system codes carried directly in the remote payload.
    /// Authoritative when present; inference never runs for such hearings.
    pub api_committee_codes: Vec<String>,
    /// Remote modification timestamp, RFC 3339.
    pub updated_at: String,
}

/// Hearing status as reported upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HearingStatus {
    Scheduled,
    Postponed,
    Canceled,
    Rescheduled,
    Unknown,
}

impl HearingStatus {
    /// Parse from string; anything unrecognized maps to Unknown.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "scheduled" => Self::Scheduled,
            "postponed" => Self::Postponed,
            "canceled" | "cancelled" => Self::Canceled,
            "rescheduled" => Self::Rescheduled,
            _ => Self::Unknown,
        }
    }

    /// Convert to string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Postponed => "postponed",
            Self::Canceled => "canceled",
            Self::Rescheduled => "rescheduled",
            Self::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!(HearingStatus::from_str("Scheduled"), HearingStatus::Scheduled);
        assert_eq!(HearingStatus::from_str("cancelled"), HearingStatus::Canceled);
        assert_eq!(HearingStatus::from_str("???"), HearingStatus::Unknown);
    }
}
