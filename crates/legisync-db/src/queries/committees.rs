//! Committee queries.

use rusqlite::{params, OptionalExtension};

use legisync_core::model::{Chamber, Committee};

use crate::gateway::UpsertOutcome;
use crate::pool::{DbError, DbPool, DbResult};

fn row_to_committee(row: &rusqlite::Row<'_>) -> rusqlite::Result<(Committee, String)> {
    let chamber_raw: String = row.get(2)?;
    let chamber = Chamber::from_str(&chamber_raw).unwrap_or(Chamber::Joint);
    Ok((
        Committee {
            system_code: row.get(0)?,
            name: row.get(1)?,
            chamber,
            parent_code: row.get(3)?,
            is_current: row.get::<_, i64>(4)? != 0,
            updated_at: row.get(5)?,
        },
        chamber_raw,
    ))
}

/// Insert or refresh a committee. Re-applying identical input is a no-op.
pub fn upsert_committee(pool: &DbPool, c: &Committee) -> DbResult<UpsertOutcome> {
    pool.with_conn(|conn| {
        let existing = conn
            .query_row(
                "SELECT system_code, name, chamber, parent_code, is_current, updated_at
                 FROM committees WHERE system_code = ?1",
                params![c.system_code],
                row_to_committee,
            )
            .optional()?;

        match existing {
            None => {
                let now = chrono::Utc::now().to_rfc3339();
                conn.execute(
                    "INSERT INTO committees
                       (system_code, name, chamber, parent_code, is_current, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        c.system_code,
                        c.name,
                        c.chamber.as_str(),
                        c.parent_code,
                        c.is_current as i64,
                        now,
                        c.updated_at,
                    ],
                )?;
                Ok(UpsertOutcome::Inserted)
            }
            Some((old, _)) if old == *c => Ok(UpsertOutcome::Unchanged),
            Some(_) => {
                // Only name and status refresh; code, chamber, and parent are
                // immutable once created.
                conn.execute(
                    "UPDATE committees
                     SET name = ?2, is_current = ?3, updated_at = ?4
                     WHERE system_code = ?1",
                    params![c.system_code, c.name, c.is_current as i64, c.updated_at],
                )?;
                Ok(UpsertOutcome::Updated)
            }
        }
    })
}

/// Get a committee by system code.
pub fn get_committee(pool: &DbPool, system_code: &str) -> DbResult<Committee> {
    pool.with_conn(|conn| {
        conn.query_row(
            "SELECT system_code, name, chamber, parent_code, is_current, updated_at
             FROM committees WHERE system_code = ?1",
            params![system_code],
            row_to_committee,
        )
        .optional()?
        .map(|(c, _)| c)
        .ok_or_else(|| DbError::NotFound(format!("Committee not found: {}", system_code)))
    })
}

/// List all committees, in system-code order.
pub fn list_committees(pool: &DbPool) -> DbResult<Vec<Committee>> {
    pool.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT system_code, name, chamber, parent_code, is_current, updated_at
             FROM committees ORDER BY system_code",
        )?;
        let rows = stmt.query_map([], row_to_committee)?;
        let mut committees = Vec::new();
        for row in rows {
            committees.push(row?.0);
        }
        Ok(committees)
    })
}
