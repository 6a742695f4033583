//! Checkpoint queries.
//!
//! One row per (phase, congress, chamber); a missing chamber filter is
//! stored as the literal 'all' so the primary key stays total.

use rusqlite::{params, OptionalExtension};

use legisync_core::model::{Chamber, Checkpoint, CheckpointKey, Phase};

use crate::pool::{DbError, DbPool, DbResult};

fn chamber_column(chamber: Option<Chamber>) -> &'static str {
    chamber.map(|c| c.as_str()).unwrap_or("all")
}

/// Load the checkpoint for a key, if one exists.
///
/// A row that cannot be decoded (unknown phase, empty cursor) is surfaced as
/// [`DbError::Corrupt`], never silently discarded.
pub fn load_checkpoint(pool: &DbPool, key: &CheckpointKey) -> DbResult<Option<Checkpoint>> {
    pool.with_conn(|conn| {
        let row = conn
            .query_row(
                "SELECT phase, congress, chamber, cursor, updated_at
                 FROM checkpoints WHERE phase = ?1 AND congress = ?2 AND chamber = ?3",
                params![key.phase.as_str(), key.congress, chamber_column(key.chamber)],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((phase_raw, congress, chamber_raw, cursor, updated_at)) = row else {
            return Ok(None);
        };

        let phase = Phase::from_str(&phase_raw)
            .ok_or_else(|| DbError::Corrupt(format!("unknown checkpoint phase '{}'", phase_raw)))?;
        if cursor.is_empty() {
            return Err(DbError::Corrupt(format!(
                "empty cursor for checkpoint {}",
                key
            )));
        }
        let chamber = match chamber_raw.as_str() {
            "all" => None,
            other => Some(Chamber::from_str(other).ok_or_else(|| {
                DbError::Corrupt(format!("unknown checkpoint chamber '{}'", other))
            })?),
        };

        Ok(Some(Checkpoint {
            key: CheckpointKey::new(phase, congress, chamber),
            cursor,
            updated_at,
        }))
    })
}

/// Write a checkpoint, superseding any prior row for the same key.
pub fn save_checkpoint(pool: &DbPool, checkpoint: &Checkpoint) -> DbResult<()> {
    pool.with_conn(|conn| {
        conn.execute(
            "INSERT INTO checkpoints (phase, congress, chamber, cursor, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (phase, congress, chamber)
             DO UPDATE SET cursor = ?4, updated_at = ?5",
            params![
                checkpoint.key.phase.as_str(),
                checkpoint.key.congress,
                chamber_column(checkpoint.key.chamber),
                checkpoint.cursor,
                checkpoint.updated_at,
            ],
        )?;
        Ok(())
    })
}

/// Delete the checkpoint for a key. Deleting a missing row is not an error.
pub fn delete_checkpoint(pool: &DbPool, key: &CheckpointKey) -> DbResult<()> {
    pool.with_conn(|conn| {
        conn.execute(
            "DELETE FROM checkpoints WHERE phase = ?1 AND congress = ?2 AND chamber = ?3",
            params![key.phase.as_str(), key.congress, chamber_column(key.chamber)],
        )?;
        Ok(())
    })
}

/// List all stored checkpoints.
pub fn list_checkpoints(pool: &DbPool) -> DbResult<Vec<Checkpoint>> {
    pool.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT phase, congress, chamber, cursor, updated_at
             FROM checkpoints ORDER BY congress, phase, chamber",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;
        let mut checkpoints = Vec::new();
        for row in rows {
            let (phase_raw, congress, chamber_raw, cursor, updated_at) = row?;
            let Some(phase) = Phase::from_str(&phase_raw) else {
                continue;
            };
            let chamber = match chamber_raw.as_str() {
                "all" => None,
                other => Chamber::from_str(other),
            };
            checkpoints.push(Checkpoint {
                key: CheckpointKey::new(phase, congress, chamber),
                cursor,
                updated_at,
            });
        }
        Ok(checkpoints)
    })
}
