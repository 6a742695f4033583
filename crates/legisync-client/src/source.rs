//! Page-source abstraction between the engine and the upstream API.

use async_trait::async_trait;
use tokio::time::Instant;

use legisync_core::model::Chamber;
use legisync_core::SyncResult;

/// Remote resource families the engine synchronizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    Committees,
    Members,
    Hearings,
}

impl ResourceType {
    /// URL path segment for this resource.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Committees => "committee",
            Self::Members => "member",
            Self::Hearings => "committee-meeting",
        }
    }

    /// JSON key holding the record array in a list response.
    pub fn records_key(&self) -> &'static str {
        match self {
            Self::Committees => "committees",
            Self::Members => "members",
            Self::Hearings => "committeeMeetings",
        }
    }
}

/// What to fetch: resource family, partition, and lookback filter.
#[derive(Debug, Clone)]
pub struct ResourceDescriptor {
    pub resource: ResourceType,
    pub congress: i64,
    pub chamber: Option<Chamber>,
    /// Lower bound on remote modification time, RFC 3339. Records are
    /// returned in ascending modification order from this point.
    pub from_datetime: Option<String>,
    pub page_size: u32,
}

/// One page of raw remote records.
///
/// `next_cursor` is an opaque token minted by the source; `None` means the
/// sequence is exhausted.
#[derive(Debug, Clone)]
pub struct ApiPage {
    pub records: Vec<serde_json::Value>,
    pub next_cursor: Option<String>,
}

/// Source of paginated remote records. Implemented by [`CongressClient`] for
/// real runs and by scripted sources in tests.
///
/// [`CongressClient`]: crate::CongressClient
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch one page. A `cursor` of `None` starts from the beginning of
    /// the sequence described by `descriptor`.
    async fn fetch_page(
        &self,
        descriptor: &ResourceDescriptor,
        cursor: Option<&str>,
        deadline: Option<Instant>,
    ) -> SyncResult<ApiPage>;
}
