//! Hearing-committee relationship queries.
//!
//! `upsert_relationship` is where the precedence invariant lives: an
//! `api`-sourced row is never overwritten by an inferred one, and a hearing
//! holds at most one inferred row at a time.

use rusqlite::params;

use legisync_core::model::{Relationship, RelationshipSource};

use crate::gateway::RelationshipOutcome;
use crate::pool::{DbPool, DbResult};

fn row_to_relationship(row: &rusqlite::Row<'_>) -> rusqlite::Result<Relationship> {
    let source: String = row.get(3)?;
    Ok(Relationship {
        hearing_id: row.get(0)?,
        committee_code: row.get(1)?,
        confidence: row.get(2)?,
        source: RelationshipSource::from_str(&source).unwrap_or(RelationshipSource::Api),
    })
}

/// All relationships for a hearing, api rows first, then by committee code.
pub fn get_for_hearing(pool: &DbPool, hearing_id: i64) -> DbResult<Vec<Relationship>> {
    pool.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT hearing_id, committee_code, confidence, source
             FROM hearing_committees
             WHERE hearing_id = ?1
             ORDER BY source = 'api' DESC, committee_code",
        )?;
        let rows = stmt.query_map(params![hearing_id], row_to_relationship)?;
        let mut rels = Vec::new();
        for row in rows {
            rels.push(row?);
        }
        Ok(rels)
    })
}

/// Insert or resolve a relationship under the precedence rules.
pub fn upsert_relationship(pool: &DbPool, r: &Relationship) -> DbResult<RelationshipOutcome> {
    let existing = get_for_hearing(pool, r.hearing_id)?;

    if r.source == RelationshipSource::Api {
        if existing
            .iter()
            .any(|e| e.source == RelationshipSource::Api && e.committee_code == r.committee_code)
        {
            return Ok(RelationshipOutcome::Unchanged);
        }
        pool.with_conn(|conn| {
            let now = chrono::Utc::now().to_rfc3339();
            // An authoritative assignment supersedes any inferred one.
            conn.execute(
                "DELETE FROM hearing_committees WHERE hearing_id = ?1 AND source != 'api'",
                params![r.hearing_id],
            )?;
            conn.execute(
                "INSERT INTO hearing_committees
                   (hearing_id, committee_code, confidence, source, created_at, updated_at)
                 VALUES (?1, ?2, 1.0, 'api', ?3, ?3)
                 ON CONFLICT (hearing_id, committee_code)
                 DO UPDATE SET confidence = 1.0, source = 'api', updated_at = ?3",
                params![r.hearing_id, r.committee_code, now],
            )?;
            Ok(RelationshipOutcome::Applied)
        })
    } else {
        if existing.iter().any(|e| e.source == RelationshipSource::Api) {
            return Ok(RelationshipOutcome::SkippedPrecedence);
        }
        let inferred = existing.iter().find(|e| e.source.is_inferred());
        if let Some(prev) = inferred {
            let same = prev.committee_code == r.committee_code
                && prev.source == r.source
                && (prev.confidence - r.confidence).abs() < f64::EPSILON;
            if same {
                return Ok(RelationshipOutcome::Unchanged);
            }
            // Upgrade only on a strictly higher combined score.
            if r.confidence <= prev.confidence {
                return Ok(RelationshipOutcome::SkippedLowerScore);
            }
            pool.with_conn(|conn| {
                let now = chrono::Utc::now().to_rfc3339();
                conn.execute(
                    "DELETE FROM hearing_committees WHERE hearing_id = ?1 AND source != 'api'",
                    params![r.hearing_id],
                )?;
                conn.execute(
                    "INSERT INTO hearing_committees
                       (hearing_id, committee_code, confidence, source, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                    params![r.hearing_id, r.committee_code, r.confidence, r.source.as_str(), now],
                )?;
                Ok(RelationshipOutcome::Upgraded)
            })
        } else {
            pool.with_conn(|conn| {
                let now = chrono::Utc::now().to_rfc3339();
                conn.execute(
                    "INSERT INTO hearing_committees
                       (hearing_id, committee_code, confidence, source, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                    params![r.hearing_id, r.committee_code, r.confidence, r.source.as_str(), now],
                )?;
                Ok(RelationshipOutcome::Applied)
            })
        }
    }
}

/// Count relationships per source tag.
pub fn count_by_source(pool: &DbPool) -> DbResult<Vec<(String, i64)>> {
    pool.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT source, COUNT(*) FROM hearing_committees GROUP BY source ORDER BY source",
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        let mut counts = Vec::new();
        for row in rows {
            counts.push(row?);
        }
        Ok(counts)
    })
}
