//! Legisync Database Layer
//!
//! SQLite-backed persistence for hearings, committees, members,
//! relationships, checkpoints, and run summaries. The sync engine touches
//! storage only through the [`PersistenceGateway`] trait defined here.

pub mod gateway;
pub mod migrations;
pub mod pool;
pub mod queries;

pub use gateway::{
    DryRunGateway, PersistenceGateway, PlannedWrite, RelationshipOutcome, SqliteGateway,
    UpsertOutcome,
};
pub use pool::{DbError, DbPool, DbResult};

/// Open a database at the given path and bring the schema up to date.
pub fn open(path: &std::path::Path) -> DbResult<DbPool> {
    let pool = DbPool::open(path)?;
    migrations::run_migrations(&pool)?;
    Ok(pool)
}
