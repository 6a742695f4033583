//! Persistence gateway: the sync engine's only contact with durable storage.
//!
//! The engine is handed a `dyn PersistenceGateway` at construction; the
//! concrete backing implementation is selected by the invocation layer.
//! `DryRunGateway` satisfies the same trait while recording planned writes
//! instead of performing them.

use std::collections::BTreeMap;
use std::sync::Mutex;

use tracing::debug;

use legisync_core::model::{
    Chamber, Checkpoint, CheckpointKey, Committee, Hearing, Member, Relationship, RunSummary,
};
use legisync_core::{SyncError, SyncResult};

use crate::pool::{DbError, DbPool};
use crate::queries;

/// Result of an idempotent entity upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    /// Input matched stored state exactly; nothing was written.
    Unchanged,
}

/// Result of a relationship upsert under the precedence rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipOutcome {
    Applied,
    /// Replaced a lower-confidence inferred relationship.
    Upgraded,
    Unchanged,
    /// An api-sourced relationship already holds; inferred input ignored.
    SkippedPrecedence,
    /// An inferred relationship with an equal or higher score already holds.
    SkippedLowerScore,
}

/// Idempotent upsert interface plus the checkpoint read/write pair and the
/// narrow reads the orchestrator needs to assemble inference inputs.
pub trait PersistenceGateway: Send + Sync {
    fn upsert_hearing(&self, hearing: &Hearing) -> SyncResult<UpsertOutcome>;
    fn upsert_committee(&self, committee: &Committee) -> SyncResult<UpsertOutcome>;
    fn upsert_member(&self, member: &Member) -> SyncResult<UpsertOutcome>;
    fn upsert_relationship(&self, relationship: &Relationship) -> SyncResult<RelationshipOutcome>;

    fn load_checkpoint(&self, key: &CheckpointKey) -> SyncResult<Option<Checkpoint>>;
    fn save_checkpoint(&self, checkpoint: &Checkpoint) -> SyncResult<()>;
    fn delete_checkpoint(&self, key: &CheckpointKey) -> SyncResult<()>;

    fn committees(&self) -> SyncResult<Vec<Committee>>;
    fn unassigned_hearings(
        &self,
        congress: i64,
        chamber: Option<Chamber>,
    ) -> SyncResult<Vec<Hearing>>;
    fn assigned_neighbors(
        &self,
        congress: i64,
        center: i64,
        radius: i64,
    ) -> SyncResult<Vec<(i64, String)>>;

    fn record_run(&self, summary: &RunSummary) -> SyncResult<()>;
}

fn persistence_err(e: DbError) -> SyncError {
    SyncError::Persistence(e.to_string())
}

fn checkpoint_err(key: &CheckpointKey, e: DbError) -> SyncError {
    match e {
        DbError::Corrupt(reason) => SyncError::CheckpointCorruption {
            phase: key.phase.as_str().to_string(),
            reason,
        },
        other => SyncError::Persistence(other.to_string()),
    }
}

/// SQLite-backed gateway.
#[derive(Clone)]
pub struct SqliteGateway {
    pool: DbPool,
}

impl SqliteGateway {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

impl PersistenceGateway for SqliteGateway {
    fn upsert_hearing(&self, hearing: &Hearing) -> SyncResult<UpsertOutcome> {
        queries::hearings::upsert_hearing(&self.pool, hearing).map_err(persistence_err)
    }

    fn upsert_committee(&self, committee: &Committee) -> SyncResult<UpsertOutcome> {
        queries::committees::upsert_committee(&self.pool, committee).map_err(persistence_err)
    }

    fn upsert_member(&self, member: &Member) -> SyncResult<UpsertOutcome> {
        queries::members::upsert_member(&self.pool, member).map_err(persistence_err)
    }

    fn upsert_relationship(&self, relationship: &Relationship) -> SyncResult<RelationshipOutcome> {
        queries::relationships::upsert_relationship(&self.pool, relationship)
            .map_err(persistence_err)
    }

    fn load_checkpoint(&self, key: &CheckpointKey) -> SyncResult<Option<Checkpoint>> {
        queries::checkpoints::load_checkpoint(&self.pool, key).map_err(|e| checkpoint_err(key, e))
    }

    fn save_checkpoint(&self, checkpoint: &Checkpoint) -> SyncResult<()> {
        queries::checkpoints::save_checkpoint(&self.pool, checkpoint).map_err(persistence_err)
    }

    fn delete_checkpoint(&self, key: &CheckpointKey) -> SyncResult<()> {
        queries::checkpoints::delete_checkpoint(&self.pool, key).map_err(persistence_err)
    }

    fn committees(&self) -> SyncResult<Vec<Committee>> {
        queries::committees::list_committees(&self.pool).map_err(persistence_err)
    }

    fn unassigned_hearings(
        &self,
        congress: i64,
        chamber: Option<Chamber>,
    ) -> SyncResult<Vec<Hearing>> {
        queries::hearings::list_unassigned_hearings(&self.pool, congress, chamber)
            .map_err(persistence_err)
    }

    fn assigned_neighbors(
        &self,
        congress: i64,
        center: i64,
        radius: i64,
    ) -> SyncResult<Vec<(i64, String)>> {
        queries::hearings::assigned_neighbors(&self.pool, congress, center, radius)
            .map_err(persistence_err)
    }

    fn record_run(&self, summary: &RunSummary) -> SyncResult<()> {
        queries::sync_runs::record_run(&self.pool, summary).map_err(persistence_err)
    }
}

/// A mutation the dry-run gateway would have performed.
#[derive(Debug, Clone)]
pub enum PlannedWrite {
    Hearing(i64),
    Committee(String),
    Member(String),
    Relationship(Relationship),
    Checkpoint(CheckpointKey),
    CheckpointDelete(CheckpointKey),
}

/// Planned-but-unwritten state accumulated during a dry run.
#[derive(Default)]
struct Overlay {
    planned: Vec<PlannedWrite>,
    committees: BTreeMap<String, Committee>,
    hearings: BTreeMap<i64, Hearing>,
    relationships: BTreeMap<i64, Vec<Relationship>>,
}

impl Overlay {
    fn has_relationship(&self, hearing_id: i64) -> bool {
        self.relationships
            .get(&hearing_id)
            .is_some_and(|rels| !rels.is_empty())
    }
}

/// Gateway that reads from real storage but records mutations instead of
/// applying them. Planned writes sit in an in-memory overlay consulted by
/// the read methods, so later stages of the same run (inference inputs in
/// particular) see the state a real run would have produced, and the
/// relationship precedence rules apply to stored and planned rows alike.
pub struct DryRunGateway {
    inner: SqliteGateway,
    overlay: Mutex<Overlay>,
}

impl DryRunGateway {
    pub fn new(inner: SqliteGateway) -> Self {
        Self {
            inner,
            overlay: Mutex::new(Overlay::default()),
        }
    }

    /// The writes this run would have performed.
    pub fn planned_writes(&self) -> Vec<PlannedWrite> {
        self.overlay().planned.clone()
    }

    fn overlay(&self) -> std::sync::MutexGuard<'_, Overlay> {
        self.overlay.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(overlay: &mut Overlay, write: PlannedWrite) {
        debug!(?write, "dry-run: skipping write");
        overlay.planned.push(write);
    }
}

impl PersistenceGateway for DryRunGateway {
    fn upsert_hearing(&self, hearing: &Hearing) -> SyncResult<UpsertOutcome> {
        let mut overlay = self.overlay();
        overlay.hearings.insert(hearing.event_id, hearing.clone());
        Self::record(&mut overlay, PlannedWrite::Hearing(hearing.event_id));
        Ok(UpsertOutcome::Inserted)
    }

    fn upsert_committee(&self, committee: &Committee) -> SyncResult<UpsertOutcome> {
        let mut overlay = self.overlay();
        overlay
            .committees
            .insert(committee.system_code.clone(), committee.clone());
        Self::record(&mut overlay, PlannedWrite::Committee(committee.system_code.clone()));
        Ok(UpsertOutcome::Inserted)
    }

    fn upsert_member(&self, member: &Member) -> SyncResult<UpsertOutcome> {
        let mut overlay = self.overlay();
        Self::record(&mut overlay, PlannedWrite::Member(member.bioguide_id.clone()));
        Ok(UpsertOutcome::Inserted)
    }

    fn upsert_relationship(&self, relationship: &Relationship) -> SyncResult<RelationshipOutcome> {
        let stored =
            queries::relationships::get_for_hearing(self.inner.pool(), relationship.hearing_id)
                .map_err(persistence_err)?;
        let mut overlay = self.overlay();
        let existing: Vec<Relationship> = stored
            .into_iter()
            .chain(
                overlay
                    .relationships
                    .get(&relationship.hearing_id)
                    .cloned()
                    .unwrap_or_default(),
            )
            .collect();

        use legisync_core::model::RelationshipSource;
        let outcome = if relationship.source == RelationshipSource::Api {
            if existing.iter().any(|e| {
                e.source == RelationshipSource::Api
                    && e.committee_code == relationship.committee_code
            }) {
                return Ok(RelationshipOutcome::Unchanged);
            }
            RelationshipOutcome::Applied
        } else {
            if existing.iter().any(|e| e.source == RelationshipSource::Api) {
                return Ok(RelationshipOutcome::SkippedPrecedence);
            }
            match existing.iter().find(|e| e.source.is_inferred()) {
                Some(prev)
                    if prev.committee_code == relationship.committee_code
                        && prev.source == relationship.source
                        && (prev.confidence - relationship.confidence).abs() < f64::EPSILON =>
                {
                    return Ok(RelationshipOutcome::Unchanged);
                }
                Some(prev) if relationship.confidence <= prev.confidence => {
                    return Ok(RelationshipOutcome::SkippedLowerScore);
                }
                Some(_) => RelationshipOutcome::Upgraded,
                None => RelationshipOutcome::Applied,
            }
        };

        let rels = overlay
            .relationships
            .entry(relationship.hearing_id)
            .or_default();
        // Either way the planned inferred row, if any, is superseded.
        rels.retain(|e| !e.source.is_inferred());
        rels.push(relationship.clone());
        Self::record(&mut overlay, PlannedWrite::Relationship(relationship.clone()));
        Ok(outcome)
    }

    fn load_checkpoint(&self, key: &CheckpointKey) -> SyncResult<Option<Checkpoint>> {
        self.inner.load_checkpoint(key)
    }

    fn save_checkpoint(&self, checkpoint: &Checkpoint) -> SyncResult<()> {
        let mut overlay = self.overlay();
        Self::record(&mut overlay, PlannedWrite::Checkpoint(checkpoint.key.clone()));
        Ok(())
    }

    fn delete_checkpoint(&self, key: &CheckpointKey) -> SyncResult<()> {
        let mut overlay = self.overlay();
        Self::record(&mut overlay, PlannedWrite::CheckpointDelete(key.clone()));
        Ok(())
    }

    fn committees(&self) -> SyncResult<Vec<Committee>> {
        let mut by_code: BTreeMap<String, Committee> = self
            .inner
            .committees()?
            .into_iter()
            .map(|c| (c.system_code.clone(), c))
            .collect();
        let overlay = self.overlay();
        for (code, committee) in &overlay.committees {
            by_code.insert(code.clone(), committee.clone());
        }
        Ok(by_code.into_values().collect())
    }

    fn unassigned_hearings(
        &self,
        congress: i64,
        chamber: Option<Chamber>,
    ) -> SyncResult<Vec<Hearing>> {
        let mut hearings = self.inner.unassigned_hearings(congress, chamber)?;
        let overlay = self.overlay();
        hearings.retain(|h| !overlay.has_relationship(h.event_id));
        for h in overlay.hearings.values() {
            if h.congress != congress
                || chamber.is_some_and(|c| h.chamber != c)
                || overlay.has_relationship(h.event_id)
                || hearings.iter().any(|e| e.event_id == h.event_id)
            {
                continue;
            }
            match queries::hearings::get_hearing(self.inner.pool(), h.event_id) {
                // Stored hearings were already considered above.
                Ok(_) => continue,
                Err(DbError::NotFound(_)) => hearings.push(h.clone()),
                Err(e) => return Err(persistence_err(e)),
            }
        }
        hearings.sort_by_key(|h| h.event_id);
        Ok(hearings)
    }

    fn assigned_neighbors(
        &self,
        congress: i64,
        center: i64,
        radius: i64,
    ) -> SyncResult<Vec<(i64, String)>> {
        let mut best: BTreeMap<i64, String> = self
            .inner
            .assigned_neighbors(congress, center, radius)?
            .into_iter()
            .collect();
        let overlay = self.overlay();
        for (&id, rels) in overlay.relationships.range(center - radius..=center + radius) {
            if id == center || rels.is_empty() {
                continue;
            }
            let in_congress = match overlay.hearings.get(&id) {
                Some(h) => h.congress == congress,
                None => match queries::hearings::get_hearing(self.inner.pool(), id) {
                    Ok(h) => h.congress == congress,
                    Err(DbError::NotFound(_)) => false,
                    Err(e) => return Err(persistence_err(e)),
                },
            };
            if !in_congress {
                continue;
            }
            use legisync_core::model::RelationshipSource;
            let top = rels.iter().max_by(|a, b| {
                (a.source == RelationshipSource::Api)
                    .cmp(&(b.source == RelationshipSource::Api))
                    .then_with(|| {
                        a.confidence
                            .partial_cmp(&b.confidence)
                            .unwrap_or(std::cmp::Ordering::Equal)
                    })
            });
            if let Some(rel) = top {
                best.insert(id, rel.committee_code.clone());
            }
        }
        Ok(best.into_iter().collect())
    }

    fn record_run(&self, _summary: &RunSummary) -> SyncResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use legisync_core::model::{HearingStatus, Phase, RelationshipSource};

    fn test_gateway() -> SqliteGateway {
        let pool = DbPool::in_memory().unwrap();
        crate::migrations::run_migrations(&pool).unwrap();
        SqliteGateway::new(pool)
    }

    fn hearing(event_id: i64) -> Hearing {
        Hearing {
            event_id,
            congress: 118,
            chamber: Chamber::House,
            title: Some("Oversight of the Department".to_string()),
            hearing_date: Some("2025-03-10T10:00:00Z".to_string()),
            status: HearingStatus::Scheduled,
            video_url: None,
            api_committee_codes: Vec::new(),
            updated_at: "2025-03-01T00:00:00Z".to_string(),
        }
    }

    fn committee(code: &str, chamber: Chamber) -> Committee {
        Committee {
            system_code: code.to_string(),
            name: format!("Committee {}", code),
            chamber,
            parent_code: None,
            is_current: true,
            updated_at: "2025-03-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_upsert_hearing_idempotent() {
        let gw = test_gateway();
        let h = hearing(1001);
        assert_eq!(gw.upsert_hearing(&h).unwrap(), UpsertOutcome::Inserted);
        assert_eq!(gw.upsert_hearing(&h).unwrap(), UpsertOutcome::Unchanged);

        let mut changed = h.clone();
        changed.title = Some("Amended title".to_string());
        changed.updated_at = "2025-03-02T00:00:00Z".to_string();
        assert_eq!(gw.upsert_hearing(&changed).unwrap(), UpsertOutcome::Updated);
        assert_eq!(gw.upsert_hearing(&changed).unwrap(), UpsertOutcome::Unchanged);
    }

    #[test]
    fn test_relationship_precedence_api_wins() {
        let gw = test_gateway();
        gw.upsert_hearing(&hearing(1001)).unwrap();
        gw.upsert_committee(&committee("hsag00", Chamber::House)).unwrap();
        gw.upsert_committee(&committee("hsju00", Chamber::House)).unwrap();

        let api = Relationship::from_api(1001, "hsag00");
        assert_eq!(gw.upsert_relationship(&api).unwrap(), RelationshipOutcome::Applied);

        // An inferred relationship never displaces an api one, regardless
        // of score.
        let inferred = Relationship {
            hearing_id: 1001,
            committee_code: "hsju00".to_string(),
            confidence: 0.99,
            source: RelationshipSource::Proximity,
        };
        assert_eq!(
            gw.upsert_relationship(&inferred).unwrap(),
            RelationshipOutcome::SkippedPrecedence
        );

        let rels = queries::relationships::get_for_hearing(gw.pool(), 1001).unwrap();
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].source, RelationshipSource::Api);
    }

    #[test]
    fn test_relationship_upgrade_requires_strictly_higher_score() {
        let gw = test_gateway();
        gw.upsert_hearing(&hearing(1001)).unwrap();
        gw.upsert_committee(&committee("hsag00", Chamber::House)).unwrap();
        gw.upsert_committee(&committee("hsju00", Chamber::House)).unwrap();

        let first = Relationship {
            hearing_id: 1001,
            committee_code: "hsag00".to_string(),
            confidence: 0.6,
            source: RelationshipSource::Proximity,
        };
        assert_eq!(gw.upsert_relationship(&first).unwrap(), RelationshipOutcome::Applied);
        assert_eq!(gw.upsert_relationship(&first).unwrap(), RelationshipOutcome::Unchanged);

        let equal = Relationship {
            committee_code: "hsju00".to_string(),
            ..first.clone()
        };
        assert_eq!(
            gw.upsert_relationship(&equal).unwrap(),
            RelationshipOutcome::SkippedLowerScore
        );

        let higher = Relationship {
            committee_code: "hsju00".to_string(),
            confidence: 0.8,
            ..first.clone()
        };
        assert_eq!(gw.upsert_relationship(&higher).unwrap(), RelationshipOutcome::Upgraded);

        // Still exactly one inferred relationship.
        let rels = queries::relationships::get_for_hearing(gw.pool(), 1001).unwrap();
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].committee_code, "hsju00");
    }

    #[test]
    fn test_api_relationship_supersedes_inferred() {
        let gw = test_gateway();
        gw.upsert_hearing(&hearing(1001)).unwrap();
        gw.upsert_committee(&committee("hsag00", Chamber::House)).unwrap();
        gw.upsert_committee(&committee("hsju00", Chamber::House)).unwrap();

        let inferred = Relationship {
            hearing_id: 1001,
            committee_code: "hsag00".to_string(),
            confidence: 0.7,
            source: RelationshipSource::Keyword,
        };
        gw.upsert_relationship(&inferred).unwrap();
        gw.upsert_relationship(&Relationship::from_api(1001, "hsju00")).unwrap();

        let rels = queries::relationships::get_for_hearing(gw.pool(), 1001).unwrap();
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].source, RelationshipSource::Api);
        assert_eq!(rels[0].committee_code, "hsju00");
    }

    #[test]
    fn test_checkpoint_roundtrip_and_delete() {
        let gw = test_gateway();
        let key = CheckpointKey::new(Phase::Hearings, 118, Some(Chamber::House));
        assert!(gw.load_checkpoint(&key).unwrap().is_none());

        let cp = Checkpoint::new(key.clone(), "offset=500");
        gw.save_checkpoint(&cp).unwrap();
        let loaded = gw.load_checkpoint(&key).unwrap().unwrap();
        assert_eq!(loaded.cursor, "offset=500");

        // Superseded on each save.
        gw.save_checkpoint(&Checkpoint::new(key.clone(), "offset=750")).unwrap();
        assert_eq!(gw.load_checkpoint(&key).unwrap().unwrap().cursor, "offset=750");

        gw.delete_checkpoint(&key).unwrap();
        assert!(gw.load_checkpoint(&key).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_checkpoint_surfaced() {
        let gw = test_gateway();
        gw.pool()
            .with_conn(|conn| {
                conn.execute(
                    "INSERT INTO checkpoints (phase, congress, chamber, cursor, updated_at)
                     VALUES ('hearings', 118, 'all', '', '2025-03-01T00:00:00Z')",
                    [],
                )?;
                Ok(())
            })
            .unwrap();

        let key = CheckpointKey::new(Phase::Hearings, 118, None);
        match gw.load_checkpoint(&key) {
            Err(SyncError::CheckpointCorruption { phase, .. }) => assert_eq!(phase, "hearings"),
            other => panic!("expected corruption error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_dry_run_records_without_writing() {
        let gw = test_gateway();
        let dry = DryRunGateway::new(gw.clone());

        dry.upsert_hearing(&hearing(1001)).unwrap();
        dry.upsert_committee(&committee("hsag00", Chamber::House)).unwrap();
        dry.save_checkpoint(&Checkpoint::new(
            CheckpointKey::new(Phase::Hearings, 118, None),
            "offset=250",
        ))
        .unwrap();

        assert_eq!(dry.planned_writes().len(), 3);
        // Nothing reached the store.
        assert!(gw.committees().unwrap().is_empty());
        assert!(matches!(
            queries::hearings::get_hearing(gw.pool(), 1001),
            Err(DbError::NotFound(_))
        ));
        assert!(gw
            .load_checkpoint(&CheckpointKey::new(Phase::Hearings, 118, None))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_dry_run_reads_see_planned_state() {
        let gw = test_gateway();
        let dry = DryRunGateway::new(gw.clone());

        dry.upsert_committee(&committee("hsag00", Chamber::House)).unwrap();
        dry.upsert_hearing(&hearing(950)).unwrap();
        dry.upsert_hearing(&hearing(1005)).unwrap();
        dry.upsert_relationship(&Relationship::from_api(950, "hsag00")).unwrap();

        // Reads merge the planned writes with (empty) stored state.
        assert_eq!(dry.committees().unwrap().len(), 1);
        let unassigned = dry.unassigned_hearings(118, None).unwrap();
        let ids: Vec<i64> = unassigned.iter().map(|h| h.event_id).collect();
        assert_eq!(ids, vec![1005]);
        assert_eq!(
            dry.assigned_neighbors(118, 1005, 100).unwrap(),
            vec![(950, "hsag00".to_string())]
        );

        // Precedence applies against planned rows too.
        let inferred = Relationship {
            hearing_id: 950,
            committee_code: "hsag00".to_string(),
            confidence: 0.9,
            source: RelationshipSource::Proximity,
        };
        assert_eq!(
            dry.upsert_relationship(&inferred).unwrap(),
            RelationshipOutcome::SkippedPrecedence
        );

        // The store itself stays untouched.
        assert!(gw.committees().unwrap().is_empty());
        assert!(gw.unassigned_hearings(118, None).unwrap().is_empty());
    }

    #[test]
    fn test_unassigned_and_neighbors() {
        let gw = test_gateway();
        gw.upsert_committee(&committee("hsag00", Chamber::House)).unwrap();
        for id in [950, 1005, 1080, 2000] {
            gw.upsert_hearing(&hearing(id)).unwrap();
        }
        gw.upsert_relationship(&Relationship::from_api(950, "hsag00")).unwrap();
        gw.upsert_relationship(&Relationship::from_api(1080, "hsag00")).unwrap();

        let unassigned = gw.unassigned_hearings(118, None).unwrap();
        let ids: Vec<i64> = unassigned.iter().map(|h| h.event_id).collect();
        assert_eq!(ids, vec![1005, 2000]);

        let neighbors = gw.assigned_neighbors(118, 1005, 100).unwrap();
        assert_eq!(
            neighbors,
            vec![(950, "hsag00".to_string()), (1080, "hsag00".to_string())]
        );
    }
}
