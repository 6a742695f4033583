//! Changeset construction: the lazy, restartable sequence of remote records
//! that are new or changed within the lookback window.

use std::collections::HashSet;

use tokio::time::Instant;
use tracing::{debug, warn};

use legisync_client::{ApiPage, PageSource, ResourceDescriptor};
use legisync_core::{SyncError, SyncResult};

/// One unit of work: a fully-parsed page of records plus the cursor that
/// becomes the checkpoint once every record in it has been applied.
#[derive(Debug)]
pub struct ChangeUnit<T> {
    pub records: Vec<T>,
    /// Opaque resume position after this unit. `None` on the final unit.
    pub next_cursor: Option<String>,
    /// Malformed records dropped from this page.
    pub invalid: u64,
    /// Records dropped because their id already appeared earlier in the run.
    pub duplicates: u64,
}

/// Builds the ordered changeset for one resource type, page by page.
///
/// Pages arrive in ascending modification order from the source. Records are
/// deduplicated by identifier across the whole run, so pagination overlap
/// never applies the same remote id twice.
pub struct ChangeSetBuilder<'a, T> {
    source: &'a dyn PageSource,
    descriptor: ResourceDescriptor,
    cursor: Option<String>,
    seen: HashSet<String>,
    exhausted: bool,
    parse: fn(&serde_json::Value) -> SyncResult<T>,
    id_of: fn(&T) -> String,
}

impl<'a, T> ChangeSetBuilder<'a, T> {
    /// Start a changeset, optionally resuming from a checkpointed cursor.
    pub fn new(
        source: &'a dyn PageSource,
        descriptor: ResourceDescriptor,
        resume_cursor: Option<String>,
        parse: fn(&serde_json::Value) -> SyncResult<T>,
        id_of: fn(&T) -> String,
    ) -> Self {
        Self {
            source,
            descriptor,
            cursor: resume_cursor,
            seen: HashSet::new(),
            exhausted: false,
            parse,
            id_of,
        }
    }

    /// Fetch and decode the next unit of work. Returns `None` once the
    /// remote sequence is exhausted.
    pub async fn next_unit(
        &mut self,
        deadline: Option<Instant>,
    ) -> SyncResult<Option<ChangeUnit<T>>> {
        if self.exhausted {
            return Ok(None);
        }

        let page: ApiPage = self
            .source
            .fetch_page(&self.descriptor, self.cursor.as_deref(), deadline)
            .await?;

        let mut records = Vec::with_capacity(page.records.len());
        let mut invalid = 0u64;
        let mut duplicates = 0u64;

        for raw in &page.records {
            match (self.parse)(raw) {
                Ok(record) => {
                    let id = (self.id_of)(&record);
                    if self.seen.insert(id) {
                        records.push(record);
                    } else {
                        duplicates += 1;
                    }
                }
                Err(SyncError::DataValidation(msg)) => {
                    warn!(%msg, "skipping malformed record");
                    invalid += 1;
                }
                Err(other) => return Err(other),
            }
        }

        self.cursor = page.next_cursor.clone();
        if self.cursor.is_none() {
            self.exhausted = true;
        }

        debug!(
            resource = ?self.descriptor.resource,
            records = records.len(),
            invalid,
            duplicates,
            "built change unit"
        );

        Ok(Some(ChangeUnit {
            records,
            next_cursor: page.next_cursor,
            invalid,
            duplicates,
        }))
    }
}
