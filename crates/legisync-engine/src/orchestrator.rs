//! Phase orchestration: sequences committees, members, hearings, and
//! relationship inference, checkpointing after each unit of work so a crash
//! or cancellation loses at most one in-flight unit.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::StreamExt;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use legisync_client::{records, PageSource, ResourceDescriptor, ResourceType};
use legisync_core::config::{Component, InferenceConfig, SyncParams};
use legisync_core::keywords::KeywordTable;
use legisync_core::model::{
    Checkpoint, CheckpointKey, Phase, PhaseOutcome, PhaseStatus, Relationship, RunSummary,
};
use legisync_core::{SyncError, SyncResult};
use legisync_db::{PersistenceGateway, RelationshipOutcome};

use crate::changeset::ChangeSetBuilder;
use crate::inference::{InferenceDecision, RelationshipInferencer};

/// Cooperative cancellation handle.
///
/// Cancelling lets in-flight units finish and checkpoint normally; no new
/// units start afterwards.
#[derive(Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Drives a sync run phase by phase.
///
/// Owns the Checkpoint and SyncRun lifecycles exclusively; all durable
/// record state goes through the injected gateway.
pub struct SyncOrchestrator {
    source: Arc<dyn PageSource>,
    gateway: Arc<dyn PersistenceGateway>,
    params: SyncParams,
    inference: InferenceConfig,
    keywords: Arc<KeywordTable>,
    deadline: Option<Instant>,
    cancel: CancelToken,
}

impl SyncOrchestrator {
    pub fn new(
        source: Arc<dyn PageSource>,
        gateway: Arc<dyn PersistenceGateway>,
        params: SyncParams,
    ) -> Self {
        Self {
            source,
            gateway,
            params,
            inference: InferenceConfig::default(),
            keywords: Arc::new(KeywordTable::builtin()),
            deadline: None,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_inference(mut self, config: InferenceConfig, keywords: Arc<KeywordTable>) -> Self {
        self.inference = config;
        self.keywords = keywords;
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Handle callers can use to request cancellation of a running sync.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    fn interrupted(&self) -> bool {
        self.cancel.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    fn interruption_error(&self) -> SyncError {
        if self.cancel.is_cancelled() {
            SyncError::Cancelled
        } else {
            SyncError::DeadlineExceeded("run deadline".to_string())
        }
    }

    /// Run every selected phase in order and return the summary.
    ///
    /// Per-record failures stay inside phase counters; a failed phase keeps
    /// its checkpoint for a future resume and never blocks later phases.
    pub async fn run(&self) -> RunSummary {
        let mut summary = RunSummary::new(self.params.congress);
        info!(
            run_id = %summary.run_id,
            congress = self.params.congress,
            dry_run = self.params.dry_run,
            "starting sync run"
        );
        if let Err(e) = self.gateway.record_run(&summary) {
            warn!(error = %e, "could not record run start");
        }

        let mut interrupted_run = false;
        for phase in Phase::ORDER {
            let selected = match phase {
                Phase::Committees => self.params.includes(Component::Committees),
                Phase::Members => self.params.includes(Component::Members),
                Phase::Hearings | Phase::Inference => self.params.includes(Component::Hearings),
            };
            if !selected || interrupted_run {
                let mut outcome = PhaseOutcome::new(phase);
                outcome.status = PhaseStatus::Skipped;
                summary.phases.push(outcome);
                continue;
            }

            let result = match phase {
                Phase::Committees => self.run_committees_phase().await,
                Phase::Members => self.run_members_phase().await,
                Phase::Hearings => self.run_hearings_phase().await,
                Phase::Inference => self.run_inference_phase().await,
            };

            let outcome = match result {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(phase = %phase, error = %e, "phase failed");
                    let mut outcome = PhaseOutcome::new(phase);
                    outcome.status = PhaseStatus::Failed;
                    outcome.error = Some(e.to_string());
                    outcome
                }
            };
            info!(
                phase = %phase,
                status = outcome.status.as_str(),
                applied = outcome.applied,
                skipped = outcome.skipped,
                failed = outcome.failed,
                "phase finished"
            );
            summary.phases.push(outcome);

            if self.interrupted() {
                interrupted_run = true;
            }
        }

        summary.finish();
        if let Err(e) = self.gateway.record_run(&summary) {
            warn!(error = %e, "could not record run summary");
        }
        summary
    }

    fn from_datetime(&self) -> String {
        (chrono::Utc::now() - chrono::Duration::days(self.params.lookback_days as i64))
            .to_rfc3339()
    }

    async fn run_committees_phase(&self) -> SyncResult<PhaseOutcome> {
        let gateway = Arc::clone(&self.gateway);
        self.run_resource_phase(
            Phase::Committees,
            ResourceType::Committees,
            self.params.chamber,
            records::parse_committee,
            |c| c.system_code.clone(),
            move |c| gateway.upsert_committee(c).map(|_| ()),
        )
        .await
    }

    async fn run_members_phase(&self) -> SyncResult<PhaseOutcome> {
        let gateway = Arc::clone(&self.gateway);
        // Member listings are not chamber-partitioned upstream.
        self.run_resource_phase(
            Phase::Members,
            ResourceType::Members,
            None,
            records::parse_member,
            |m| m.bioguide_id.clone(),
            move |m| gateway.upsert_member(m).map(|_| ()),
        )
        .await
    }

    async fn run_hearings_phase(&self) -> SyncResult<PhaseOutcome> {
        let gateway = Arc::clone(&self.gateway);
        self.run_resource_phase(
            Phase::Hearings,
            ResourceType::Hearings,
            self.params.chamber,
            records::parse_hearing,
            |h| h.event_id.to_string(),
            move |h| {
                gateway.upsert_hearing(h)?;
                for code in &h.api_committee_codes {
                    gateway.upsert_relationship(&Relationship::from_api(h.event_id, code))?;
                }
                Ok(())
            },
        )
        .await
    }

    /// Fetch-and-apply loop shared by the three resource phases.
    ///
    /// A checkpoint is written after each fully-applied unit and before the
    /// next one is requested; a crash between apply and checkpoint write is
    /// safe because every upsert is idempotent.
    async fn run_resource_phase<T>(
        &self,
        phase: Phase,
        resource: ResourceType,
        chamber: Option<legisync_core::model::Chamber>,
        parse: fn(&serde_json::Value) -> SyncResult<T>,
        id_of: fn(&T) -> String,
        apply: impl Fn(&T) -> SyncResult<()>,
    ) -> SyncResult<PhaseOutcome> {
        let key = CheckpointKey::new(phase, self.params.congress, chamber);
        let resume = self.gateway.load_checkpoint(&key)?;
        if let Some(cp) = &resume {
            info!(checkpoint = %key, cursor = %cp.cursor, "resuming from checkpoint");
        }

        let descriptor = ResourceDescriptor {
            resource,
            congress: self.params.congress,
            chamber,
            from_datetime: Some(self.from_datetime()),
            page_size: 250,
        };
        let mut builder = ChangeSetBuilder::new(
            self.source.as_ref(),
            descriptor,
            resume.map(|cp| cp.cursor),
            parse,
            id_of,
        );

        let mut outcome = PhaseOutcome::new(phase);
        loop {
            // A fetch failure ends the phase but keeps the counters for
            // units that were already applied.
            let unit = match builder.next_unit(self.deadline).await {
                Ok(Some(unit)) => unit,
                Ok(None) => break,
                Err(e) => {
                    warn!(phase = %phase, error = %e, "phase aborted mid-fetch");
                    outcome.status = PhaseStatus::Failed;
                    outcome.error = Some(e.to_string());
                    return Ok(outcome);
                }
            };
            outcome.skipped += unit.invalid + unit.duplicates;

            let concurrency = self.params.concurrency.max(1);
            let apply = &apply;
            let results: Vec<SyncResult<()>> = futures::stream::iter(unit.records.iter())
                .map(|record| async move { apply(record) })
                .buffer_unordered(concurrency)
                .collect()
                .await;

            for result in results {
                match result {
                    Ok(()) => outcome.applied += 1,
                    Err(e) => {
                        warn!(phase = %phase, error = %e, "record failed to persist");
                        outcome.failed += 1;
                    }
                }
            }

            let Some(cursor) = &unit.next_cursor else {
                break;
            };
            self.gateway
                .save_checkpoint(&Checkpoint::new(key.clone(), cursor))?;
            debug!(checkpoint = %key, cursor = %cursor, "checkpointed unit");

            // An exhausted input completes the phase above; interruption
            // only fails phases with units left to fetch.
            if self.interrupted() {
                outcome.status = PhaseStatus::Failed;
                outcome.error = Some(self.interruption_error().to_string());
                return Ok(outcome);
            }
        }

        self.gateway.delete_checkpoint(&key)?;
        outcome.finalize();
        Ok(outcome)
    }

    /// Infer committees for hearings left unassigned after the hearings
    /// phase. CPU-bound; the only suspension points are checkpoint writes.
    async fn run_inference_phase(&self) -> SyncResult<PhaseOutcome> {
        let key = CheckpointKey::new(Phase::Inference, self.params.congress, self.params.chamber);
        let resume_after: Option<i64> = match self.gateway.load_checkpoint(&key)? {
            None => None,
            Some(cp) => Some(cp.cursor.parse().map_err(|_| {
                SyncError::CheckpointCorruption {
                    phase: Phase::Inference.as_str().to_string(),
                    reason: format!("non-numeric cursor '{}'", cp.cursor),
                }
            })?),
        };

        let committees = self.gateway.committees()?;
        let inferencer = RelationshipInferencer::new(&self.inference, &self.keywords, &committees);
        let hearings = self
            .gateway
            .unassigned_hearings(self.params.congress, self.params.chamber)?;

        let mut outcome = PhaseOutcome::new(Phase::Inference);
        let mut in_batch = 0usize;
        let mut last_processed: Option<i64> = None;

        for hearing in hearings
            .iter()
            .filter(|h| resume_after.map_or(true, |cursor| h.event_id > cursor))
        {
            if self.interrupted() {
                if let Some(last) = last_processed {
                    self.gateway
                        .save_checkpoint(&Checkpoint::new(key.clone(), last.to_string()))?;
                }
                outcome.status = PhaseStatus::Failed;
                outcome.error = Some(self.interruption_error().to_string());
                return Ok(outcome);
            }

            let neighbors = match self.gateway.assigned_neighbors(
                self.params.congress,
                hearing.event_id,
                self.inference.proximity_radius,
            ) {
                Ok(neighbors) => neighbors,
                Err(e) => {
                    warn!(hearing_id = hearing.event_id, error = %e, "neighbor lookup failed");
                    if let Some(last) = last_processed {
                        if let Err(e) = self
                            .gateway
                            .save_checkpoint(&Checkpoint::new(key.clone(), last.to_string()))
                        {
                            warn!(error = %e, "could not save inference checkpoint");
                        }
                    }
                    outcome.status = PhaseStatus::Failed;
                    outcome.error = Some(e.to_string());
                    return Ok(outcome);
                }
            };

            match inferencer.infer(hearing, &neighbors) {
                InferenceDecision::Accepted(rel) => {
                    match self.gateway.upsert_relationship(&rel) {
                        Ok(
                            RelationshipOutcome::Applied
                            | RelationshipOutcome::Upgraded
                            | RelationshipOutcome::Unchanged,
                        ) => {
                            debug!(
                                hearing_id = rel.hearing_id,
                                committee = %rel.committee_code,
                                confidence = rel.confidence,
                                source = rel.source.as_str(),
                                "accepted inferred relationship"
                            );
                            outcome.applied += 1;
                            outcome.inferred_accepted += 1;
                        }
                        Ok(_) => outcome.skipped += 1,
                        Err(e) => {
                            warn!(hearing_id = hearing.event_id, error = %e, "relationship persist failed");
                            outcome.failed += 1;
                        }
                    }
                }
                InferenceDecision::Unassigned { best_score } => {
                    debug!(
                        hearing_id = hearing.event_id,
                        best_score, "hearing remains unassigned"
                    );
                    outcome.inferred_unassigned += 1;
                }
            }

            last_processed = Some(hearing.event_id);
            in_batch += 1;
            if in_batch >= self.params.inference_batch.max(1) {
                self.gateway.save_checkpoint(&Checkpoint::new(
                    key.clone(),
                    hearing.event_id.to_string(),
                ))?;
                in_batch = 0;
            }
        }

        self.gateway.delete_checkpoint(&key)?;
        outcome.finalize();
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use legisync_client::ApiPage;
    use legisync_db::{queries, DbPool, DryRunGateway, PlannedWrite, SqliteGateway};
    use serde_json::{json, Value};
    use std::sync::Mutex;

    /// Scripted source with per-resource page scripts. Cursors are
    /// stringified page indices, treated as opaque by the engine.
    struct ScriptedSource {
        committees: Vec<Vec<Value>>,
        members: Vec<Vec<Value>>,
        hearings: Vec<Vec<Value>>,
        /// Fail permanently when this hearings page index is requested.
        fail_hearings_at: Option<usize>,
        /// Cancel this token whenever a hearings page is served.
        cancel_in_hearings: Option<CancelToken>,
        requested_hearing_cursors: Mutex<Vec<Option<String>>>,
    }

    impl ScriptedSource {
        fn new(
            committees: Vec<Vec<Value>>,
            members: Vec<Vec<Value>>,
            hearings: Vec<Vec<Value>>,
        ) -> Self {
            Self {
                committees,
                members,
                hearings,
                fail_hearings_at: None,
                cancel_in_hearings: None,
                requested_hearing_cursors: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PageSource for ScriptedSource {
        async fn fetch_page(
            &self,
            descriptor: &ResourceDescriptor,
            cursor: Option<&str>,
            _deadline: Option<Instant>,
        ) -> SyncResult<ApiPage> {
            let index: usize = cursor.map(|c| c.parse().unwrap()).unwrap_or(0);
            let pages = match descriptor.resource {
                ResourceType::Committees => &self.committees,
                ResourceType::Members => &self.members,
                ResourceType::Hearings => {
                    self.requested_hearing_cursors
                        .lock()
                        .unwrap()
                        .push(cursor.map(str::to_string));
                    if self.fail_hearings_at == Some(index) {
                        return Err(SyncError::permanent("scripted failure"));
                    }
                    if let Some(token) = &self.cancel_in_hearings {
                        token.cancel();
                    }
                    &self.hearings
                }
            };
            let records = pages.get(index).cloned().unwrap_or_default();
            let next_cursor = if index + 1 < pages.len() {
                Some((index + 1).to_string())
            } else {
                None
            };
            Ok(ApiPage {
                records,
                next_cursor,
            })
        }
    }

    fn committee_record(code: &str, chamber: &str) -> Value {
        json!({
            "systemCode": code,
            "name": format!("Committee {}", code),
            "chamber": chamber,
            "updateDate": "2025-03-01T00:00:00Z"
        })
    }

    fn hearing_record(event_id: i64, title: &str, api_codes: &[&str]) -> Value {
        json!({
            "eventId": event_id.to_string(),
            "congress": 118,
            "chamber": "House",
            "title": title,
            "meetingStatus": "Scheduled",
            "committees": api_codes.iter().map(|c| json!({"systemCode": c})).collect::<Vec<_>>(),
            "updateDate": "2025-03-01T00:00:00Z"
        })
    }

    fn test_gateway() -> SqliteGateway {
        let pool = DbPool::in_memory().unwrap();
        legisync_db::migrations::run_migrations(&pool).unwrap();
        SqliteGateway::new(pool)
    }

    fn crop_keywords() -> Arc<KeywordTable> {
        Arc::new(KeywordTable::from_toml_str("[committees]\nhsag00 = [\"crop\"]\n").unwrap())
    }

    fn scripted_pages() -> ScriptedSource {
        ScriptedSource::new(
            vec![vec![committee_record("hsag00", "House")]],
            vec![vec![json!({
                "bioguideId": "A000370",
                "name": "Adams, Alma S.",
                "partyName": "Democratic",
                "updateDate": "2025-03-01T00:00:00Z"
            })]],
            vec![
                vec![
                    hearing_record(950, "Farm Bill Review", &["hsag00"]),
                    hearing_record(1005, "Examination of Crop Insurance", &[]),
                ],
                vec![hearing_record(1080, "Commodity Markets", &["hsag00"])],
            ],
        )
    }

    fn orchestrator(source: ScriptedSource, gateway: SqliteGateway) -> SyncOrchestrator {
        SyncOrchestrator::new(Arc::new(source), Arc::new(gateway), SyncParams::new(118))
            .with_inference(InferenceConfig::default(), crop_keywords())
    }

    #[tokio::test]
    async fn test_full_run_applies_and_infers() {
        let gateway = test_gateway();
        let pool = gateway.pool().clone();
        let summary = orchestrator(scripted_pages(), gateway).run().await;

        assert!(!summary.has_failures());
        let hearings_phase = &summary.phases[2];
        assert_eq!(hearings_phase.phase, Phase::Hearings);
        assert_eq!(hearings_phase.applied, 3);

        let inference_phase = &summary.phases[3];
        assert_eq!(inference_phase.inferred_accepted, 1);
        assert_eq!(inference_phase.inferred_unassigned, 0);

        // Hearing 1005 picked up hsag00: proximity from 950/1080 plus the
        // full keyword match pushes it over threshold.
        let rels = queries::relationships::get_for_hearing(&pool, 1005).unwrap();
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].committee_code, "hsag00");
        assert!(rels[0].source.is_inferred());
        assert!(rels[0].confidence > 0.5);

        // All checkpoints cleared on completion.
        assert!(queries::checkpoints::list_checkpoints(&pool).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_running_twice_is_idempotent() {
        let gateway = test_gateway();
        let pool = gateway.pool().clone();

        orchestrator(scripted_pages(), gateway.clone()).run().await;
        let first_rels = queries::relationships::get_for_hearing(&pool, 1005).unwrap();
        let first_counts = queries::relationships::count_by_source(&pool).unwrap();

        orchestrator(scripted_pages(), gateway).run().await;
        let second_rels = queries::relationships::get_for_hearing(&pool, 1005).unwrap();
        let second_counts = queries::relationships::count_by_source(&pool).unwrap();

        assert_eq!(first_rels, second_rels);
        assert_eq!(first_counts, second_counts);
        let hearing_count: i64 = pool
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM hearings", [], |row| row.get(0))?)
            })
            .unwrap();
        assert_eq!(hearing_count, 3);
    }

    #[tokio::test]
    async fn test_failed_phase_keeps_checkpoint_and_resumes() {
        let gateway = test_gateway();
        let pool = gateway.pool().clone();

        // First run: hearings page 2 fails permanently after page 1 applied.
        let mut source = scripted_pages();
        source.fail_hearings_at = Some(1);
        let summary = orchestrator(source, gateway.clone()).run().await;

        // Page 1's two hearings were applied and stay in the summary even
        // though the phase ended on the page 2 fetch failure.
        let hearings_phase = &summary.phases[2];
        assert_eq!(hearings_phase.status, PhaseStatus::Failed);
        assert_eq!(hearings_phase.applied, 2);
        assert!(hearings_phase.error.as_deref().unwrap().contains("scripted failure"));
        assert!(summary.has_failures());

        // Page 1 was applied and checkpointed before the failure surfaced.
        let key = CheckpointKey::new(Phase::Hearings, 118, None);
        let cp = queries::checkpoints::load_checkpoint(&pool, &key).unwrap().unwrap();
        assert_eq!(cp.cursor, "1");
        assert!(queries::hearings::get_hearing(&pool, 950).is_ok());

        // Second run resumes at the retained cursor and completes.
        let source = scripted_pages();
        let summary = orchestrator(source, gateway).run().await;
        assert!(!summary.has_failures());
        assert!(queries::hearings::get_hearing(&pool, 1080).is_ok());
        assert!(queries::checkpoints::load_checkpoint(&pool, &key).unwrap().is_none());

        // Same final relationship state as an uninterrupted run.
        let uninterrupted = test_gateway();
        let upool = uninterrupted.pool().clone();
        orchestrator(scripted_pages(), uninterrupted).run().await;
        assert_eq!(
            queries::relationships::count_by_source(&pool).unwrap(),
            queries::relationships::count_by_source(&upool).unwrap()
        );
    }

    #[tokio::test]
    async fn test_resume_requests_checkpointed_cursor() {
        let gateway = test_gateway();
        queries::checkpoints::save_checkpoint(
            gateway.pool(),
            &Checkpoint::new(CheckpointKey::new(Phase::Hearings, 118, None), "1"),
        )
        .unwrap();

        let source = Arc::new(scripted_pages());
        let orch = SyncOrchestrator::new(
            source.clone(),
            Arc::new(gateway),
            SyncParams {
                components: vec![Component::Hearings],
                ..SyncParams::new(118)
            },
        )
        .with_inference(InferenceConfig::default(), crop_keywords());
        orch.run().await;

        let cursors = source.requested_hearing_cursors.lock().unwrap().clone();
        assert_eq!(cursors.first().unwrap().as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_cancellation_finishes_unit_then_stops() {
        let gateway = test_gateway();
        let pool = gateway.pool().clone();

        let cancel = CancelToken::new();
        let mut source = scripted_pages();
        source.cancel_in_hearings = Some(cancel.clone());

        let orch = orchestrator(source, gateway).with_cancel(cancel);
        let summary = orch.run().await;

        // Phases before the cancellation ran to completion.
        assert_eq!(summary.phases[0].status, PhaseStatus::Completed);
        assert_eq!(summary.phases[1].status, PhaseStatus::Completed);

        // The hearings unit in flight finished, applied, and checkpointed;
        // no second page was fetched.
        let hearings = &summary.phases[2];
        assert_eq!(hearings.status, PhaseStatus::Failed);
        assert_eq!(hearings.applied, 2);
        assert!(hearings.error.as_deref().unwrap().contains("cancelled"));
        assert!(queries::hearings::get_hearing(&pool, 950).is_ok());
        assert!(queries::hearings::get_hearing(&pool, 1080).is_err());
        let key = CheckpointKey::new(Phase::Hearings, 118, None);
        let cp = queries::checkpoints::load_checkpoint(&pool, &key).unwrap().unwrap();
        assert_eq!(cp.cursor, "1");

        // Inference never started.
        assert_eq!(summary.phases[3].status, PhaseStatus::Skipped);
    }

    #[tokio::test]
    async fn test_cancellation_after_final_unit_completes_phase() {
        let gateway = test_gateway();
        let pool = gateway.pool().clone();

        let cancel = CancelToken::new();
        let mut source = scripted_pages();
        source.hearings = vec![vec![hearing_record(950, "Farm Bill Review", &["hsag00"])]];
        source.cancel_in_hearings = Some(cancel.clone());

        let orch = orchestrator(source, gateway).with_cancel(cancel);
        let summary = orch.run().await;

        // The cancellation landed while the final unit was in flight: the
        // phase's input is exhausted, so it completes rather than fails.
        assert_eq!(summary.phases[2].status, PhaseStatus::Completed);
        assert_eq!(summary.phases[2].applied, 1);
        assert!(queries::checkpoints::list_checkpoints(&pool).unwrap().is_empty());
        assert_eq!(summary.phases[3].status, PhaseStatus::Skipped);
    }

    #[tokio::test]
    async fn test_dry_run_records_plan_without_writing() {
        let gateway = test_gateway();
        let pool = gateway.pool().clone();
        let dry = Arc::new(DryRunGateway::new(gateway));

        let params = SyncParams {
            dry_run: true,
            ..SyncParams::new(118)
        };
        let orch = SyncOrchestrator::new(Arc::new(scripted_pages()), dry.clone(), params)
            .with_inference(InferenceConfig::default(), crop_keywords());
        let summary = orch.run().await;
        assert!(!summary.has_failures());

        assert!(!dry.planned_writes().is_empty());
        let hearing_count: i64 = pool
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM hearings", [], |row| row.get(0))?)
            })
            .unwrap();
        assert_eq!(hearing_count, 0);
        assert!(queries::checkpoints::list_checkpoints(&pool).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dry_run_reports_inference_decisions() {
        let gateway = test_gateway();
        let pool = gateway.pool().clone();
        let dry = Arc::new(DryRunGateway::new(gateway));

        let params = SyncParams {
            dry_run: true,
            ..SyncParams::new(118)
        };
        let orch = SyncOrchestrator::new(Arc::new(scripted_pages()), dry.clone(), params)
            .with_inference(InferenceConfig::default(), crop_keywords());
        let summary = orch.run().await;
        assert!(!summary.has_failures());

        // The inference phase sees the hearings the dry run just planned and
        // reaches the same decisions a real run would.
        let inference = &summary.phases[3];
        assert_eq!(inference.inferred_accepted, 1);
        assert_eq!(inference.inferred_unassigned, 0);

        // The would-be relationship shows up in the plan...
        let planned = dry.planned_writes();
        assert!(planned.iter().any(|w| matches!(
            w,
            PlannedWrite::Relationship(rel)
                if rel.hearing_id == 1005
                    && rel.committee_code == "hsag00"
                    && rel.source.is_inferred()
        )));

        // ...and nothing reached the store.
        let rel_count: i64 = pool
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM hearing_committees", [], |row| {
                    row.get(0)
                })?)
            })
            .unwrap();
        assert_eq!(rel_count, 0);
    }

    #[tokio::test]
    async fn test_unselected_components_skipped() {
        let gateway = test_gateway();
        let params = SyncParams {
            components: vec![Component::Committees],
            ..SyncParams::new(118)
        };
        let orch = SyncOrchestrator::new(Arc::new(scripted_pages()), Arc::new(gateway), params);
        let summary = orch.run().await;

        assert_eq!(summary.phases[0].status, PhaseStatus::Completed);
        assert_eq!(summary.phases[1].status, PhaseStatus::Skipped);
        assert_eq!(summary.phases[2].status, PhaseStatus::Skipped);
        assert_eq!(summary.phases[3].status, PhaseStatus::Skipped);
    }

    #[tokio::test]
    async fn test_run_summary_recorded() {
        let gateway = test_gateway();
        let pool = gateway.pool().clone();
        orchestrator(scripted_pages(), gateway).run().await;

        let runs = queries::sync_runs::list_recent_runs(&pool, 5).unwrap();
        assert_eq!(runs.len(), 1);
        assert!(runs[0].ended_at.is_some());
        assert_eq!(runs[0].phases.len(), 4);
    }
}
