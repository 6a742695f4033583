//! Hearing-committee relationship model.

use serde::{Deserialize, Serialize};

/// Origin of a hearing-committee relationship.
///
/// `Api` relationships come straight from the remote payload and are
/// authoritative: they are never overwritten by inferred ones. `Proximity`
/// and `Keyword` relationships are best-effort inferences and a hearing
/// holds at most one of them at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipSource {
    Api,
    Proximity,
    Keyword,
}

impl RelationshipSource {
    /// Convert to string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Proximity => "proximity",
            Self::Keyword => "keyword",
        }
    }

    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "api" => Some(Self::Api),
            "proximity" => Some(Self::Proximity),
            "keyword" => Some(Self::Keyword),
            _ => None,
        }
    }

    /// Whether this source was produced by inference rather than the API.
    pub fn is_inferred(&self) -> bool {
        !matches!(self, Self::Api)
    }
}

/// A link between a hearing and a committee, with a confidence score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub hearing_id: i64,
    pub committee_code: String,
    /// Normalized confidence in [0, 1]. Always 1.0 for `api` rows.
    pub confidence: f64,
    pub source: RelationshipSource,
}

impl Relationship {
    /// An authoritative relationship taken directly from the remote payload.
    pub fn from_api(hearing_id: i64, committee_code: impl Into<String>) -> Self {
        Self {
            hearing_id,
            committee_code: committee_code.into(),
            confidence: 1.0,
            source: RelationshipSource::Api,
        }
    }
}
