//! Member queries.

use rusqlite::{params, OptionalExtension};

use legisync_core::model::{Chamber, Member};

use crate::gateway::UpsertOutcome;
use crate::pool::{DbPool, DbResult};

fn row_to_member(row: &rusqlite::Row<'_>) -> rusqlite::Result<Member> {
    let chamber: Option<String> = row.get(4)?;
    Ok(Member {
        bioguide_id: row.get(0)?,
        name: row.get(1)?,
        party: row.get(2)?,
        state: row.get(3)?,
        chamber: chamber.as_deref().and_then(Chamber::from_str),
        updated_at: row.get(5)?,
    })
}

/// Insert or refresh a member. Re-applying identical input is a no-op.
pub fn upsert_member(pool: &DbPool, m: &Member) -> DbResult<UpsertOutcome> {
    pool.with_conn(|conn| {
        let existing = conn
            .query_row(
                "SELECT bioguide_id, name, party, state, chamber, updated_at
                 FROM members WHERE bioguide_id = ?1",
                params![m.bioguide_id],
                row_to_member,
            )
            .optional()?;

        match existing {
            None => {
                let now = chrono::Utc::now().to_rfc3339();
                conn.execute(
                    "INSERT INTO members
                       (bioguide_id, name, party, state, chamber, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        m.bioguide_id,
                        m.name,
                        m.party,
                        m.state,
                        m.chamber.map(|c| c.as_str()),
                        now,
                        m.updated_at,
                    ],
                )?;
                Ok(UpsertOutcome::Inserted)
            }
            Some(old) if old == *m => Ok(UpsertOutcome::Unchanged),
            Some(_) => {
                conn.execute(
                    "UPDATE members
                     SET name = ?2, party = ?3, state = ?4, chamber = ?5, updated_at = ?6
                     WHERE bioguide_id = ?1",
                    params![
                        m.bioguide_id,
                        m.name,
                        m.party,
                        m.state,
                        m.chamber.map(|c| c.as_str()),
                        m.updated_at,
                    ],
                )?;
                Ok(UpsertOutcome::Updated)
            }
        }
    })
}

/// Count stored members.
pub fn count_members(pool: &DbPool) -> DbResult<i64> {
    pool.with_conn(|conn| {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM members", [], |row| row.get(0))?;
        Ok(count)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_pool() -> DbPool {
        let pool = DbPool::in_memory().unwrap();
        crate::migrations::run_migrations(&pool).unwrap();
        pool
    }

    fn member(bioguide_id: &str) -> Member {
        Member {
            bioguide_id: bioguide_id.to_string(),
            name: "Jane Doe".to_string(),
            party: Some("D".to_string()),
            state: Some("CA".to_string()),
            chamber: Some(Chamber::House),
            updated_at: "2025-03-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_upsert_and_count() {
        let pool = test_pool();
        assert_eq!(count_members(&pool).unwrap(), 0);

        let m = member("D000001");
        assert_eq!(upsert_member(&pool, &m).unwrap(), UpsertOutcome::Inserted);
        assert_eq!(upsert_member(&pool, &m).unwrap(), UpsertOutcome::Unchanged);

        let mut moved = m.clone();
        moved.state = Some("OR".to_string());
        assert_eq!(upsert_member(&pool, &moved).unwrap(), UpsertOutcome::Updated);

        assert_eq!(upsert_member(&pool, &member("D000002")).unwrap(), UpsertOutcome::Inserted);
        assert_eq!(count_members(&pool).unwrap(), 2);
    }
}
