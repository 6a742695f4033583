//! Hearing queries.

use rusqlite::{params, OptionalExtension};

use legisync_core::model::{Chamber, Hearing, HearingStatus};

use crate::gateway::UpsertOutcome;
use crate::pool::{DbError, DbPool, DbResult};

fn row_to_hearing(row: &rusqlite::Row<'_>) -> rusqlite::Result<Hearing> {
    let chamber: String = row.get(2)?;
    let status: String = row.get(5)?;
    Ok(Hearing {
        event_id: row.get(0)?,
        congress: row.get(1)?,
        chamber: Chamber::from_str(&chamber).unwrap_or(Chamber::Joint),
        title: row.get(3)?,
        hearing_date: row.get(4)?,
        status: HearingStatus::from_str(&status),
        video_url: row.get(6)?,
        api_committee_codes: Vec::new(),
        updated_at: row.get(7)?,
    })
}

/// Field-level equality ignoring the payload-only committee codes, which are
/// persisted as relationships rather than hearing columns.
fn same_stored_fields(a: &Hearing, b: &Hearing) -> bool {
    a.event_id == b.event_id
        && a.congress == b.congress
        && a.chamber == b.chamber
        && a.title == b.title
        && a.hearing_date == b.hearing_date
        && a.status == b.status
        && a.video_url == b.video_url
        && a.updated_at == b.updated_at
}

/// Insert or update a hearing. Re-applying identical input is a no-op;
/// hearings are never deleted.
pub fn upsert_hearing(pool: &DbPool, h: &Hearing) -> DbResult<UpsertOutcome> {
    pool.with_conn(|conn| {
        let existing = conn
            .query_row(
                "SELECT event_id, congress, chamber, title, hearing_date, status, video_url, updated_at
                 FROM hearings WHERE event_id = ?1",
                params![h.event_id],
                row_to_hearing,
            )
            .optional()?;

        match existing {
            None => {
                let now = chrono::Utc::now().to_rfc3339();
                conn.execute(
                    "INSERT INTO hearings
                       (event_id, congress, chamber, title, hearing_date, status, video_url,
                        created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    params![
                        h.event_id,
                        h.congress,
                        h.chamber.as_str(),
                        h.title,
                        h.hearing_date,
                        h.status.as_str(),
                        h.video_url,
                        now,
                        h.updated_at,
                    ],
                )?;
                Ok(UpsertOutcome::Inserted)
            }
            Some(old) if same_stored_fields(&old, h) => Ok(UpsertOutcome::Unchanged),
            Some(_) => {
                conn.execute(
                    "UPDATE hearings
                     SET title = ?2, hearing_date = ?3, status = ?4, video_url = ?5, updated_at = ?6
                     WHERE event_id = ?1",
                    params![
                        h.event_id,
                        h.title,
                        h.hearing_date,
                        h.status.as_str(),
                        h.video_url,
                        h.updated_at,
                    ],
                )?;
                Ok(UpsertOutcome::Updated)
            }
        }
    })
}

/// Get a hearing by event id.
pub fn get_hearing(pool: &DbPool, event_id: i64) -> DbResult<Hearing> {
    pool.with_conn(|conn| {
        conn.query_row(
            "SELECT event_id, congress, chamber, title, hearing_date, status, video_url, updated_at
             FROM hearings WHERE event_id = ?1",
            params![event_id],
            row_to_hearing,
        )
        .optional()?
        .ok_or_else(|| DbError::NotFound(format!("Hearing not found: {}", event_id)))
    })
}

/// Hearings in a congress with no accepted relationship of any source.
pub fn list_unassigned_hearings(
    pool: &DbPool,
    congress: i64,
    chamber: Option<Chamber>,
) -> DbResult<Vec<Hearing>> {
    pool.with_conn(|conn| {
        let chamber_filter = chamber.map(|c| c.as_str().to_string());
        let mut stmt = conn.prepare(
            "SELECT event_id, congress, chamber, title, hearing_date, status, video_url, updated_at
             FROM hearings h
             WHERE h.congress = ?1
               AND (?2 IS NULL OR h.chamber = ?2)
               AND NOT EXISTS
                 (SELECT 1 FROM hearing_committees hc WHERE hc.hearing_id = h.event_id)
             ORDER BY h.event_id",
        )?;
        let rows = stmt.query_map(params![congress, chamber_filter], row_to_hearing)?;
        let mut hearings = Vec::new();
        for row in rows {
            hearings.push(row?);
        }
        Ok(hearings)
    })
}

/// Assigned hearings whose event id lies within `radius` of `center`,
/// paired with their highest-confidence committee. Excludes the center
/// hearing itself.
pub fn assigned_neighbors(
    pool: &DbPool,
    congress: i64,
    center: i64,
    radius: i64,
) -> DbResult<Vec<(i64, String)>> {
    pool.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT h.event_id, hc.committee_code
             FROM hearings h
             JOIN hearing_committees hc ON hc.hearing_id = h.event_id
             WHERE h.congress = ?1
               AND h.event_id != ?2
               AND h.event_id BETWEEN ?3 AND ?4
             ORDER BY h.event_id, hc.confidence DESC",
        )?;
        let rows = stmt.query_map(
            params![congress, center, center - radius, center + radius],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
        )?;
        let mut neighbors: Vec<(i64, String)> = Vec::new();
        for row in rows {
            let (id, code) = row?;
            // Keep only the top-confidence committee per neighbor.
            if neighbors.last().map(|(last, _)| *last) != Some(id) {
                neighbors.push((id, code));
            }
        }
        Ok(neighbors)
    })
}
