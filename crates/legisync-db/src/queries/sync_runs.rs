//! Sync run summary queries.

use rusqlite::params;

use legisync_core::model::RunSummary;

use crate::pool::{DbPool, DbResult};

/// Record (or refresh) a run summary.
pub fn record_run(pool: &DbPool, summary: &RunSummary) -> DbResult<()> {
    let json = serde_json::to_string(summary)?;
    pool.with_conn(|conn| {
        conn.execute(
            "INSERT INTO sync_runs (run_id, congress, started_at, ended_at, summary)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (run_id)
             DO UPDATE SET ended_at = ?4, summary = ?5",
            params![
                summary.run_id,
                summary.congress,
                summary.started_at,
                summary.ended_at,
                json,
            ],
        )?;
        Ok(())
    })
}

/// Most recent run summaries, newest first.
pub fn list_recent_runs(pool: &DbPool, limit: u32) -> DbResult<Vec<RunSummary>> {
    pool.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT summary FROM sync_runs ORDER BY started_at DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| row.get::<_, String>(0))?;
        let mut runs = Vec::new();
        for row in rows {
            let json = row?;
            if let Ok(summary) = serde_json::from_str(&json) {
                runs.push(summary);
            }
        }
        Ok(runs)
    })
}
