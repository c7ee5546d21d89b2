pub mod bans;
pub mod comments;
pub mod follows;
pub mod likes;
pub mod models;
pub mod posts;
pub mod users;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, ErrorCode, Transaction, TransactionBehavior};
use std::path::Path;
use thiserror::Error;

use crate::state::DbPool;

pub const MIGRATIONS: &[(&str, &str)] = &[(
    "001_initial",
    include_str!("../../migrations/001_initial.sql"),
)];

/// Attempts for a write transaction that keeps hitting SQLITE_BUSY.
const BUSY_RETRIES: usize = 3;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("Not found: {0}")]
    NotFound(&'static str),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid: {0}")]
    Invalid(String),
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// Pragmas applied to every pooled connection. `foreign_keys` and
/// `busy_timeout` are per-connection settings in SQLite.
fn init_connection(conn: &mut Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 5000;
        ",
    )
}

pub fn create_pool(db_path: &Path) -> anyhow::Result<DbPool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let manager = SqliteConnectionManager::file(db_path).with_init(init_connection);
    let pool = Pool::builder().max_size(8).build(manager)?;

    let conn = pool.get()?;
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        ",
    )?;

    Ok(pool)
}

pub fn run_migrations(pool: &DbPool) -> anyhow::Result<()> {
    let conn = pool.get()?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    for (name, sql) in MIGRATIONS {
        let already_applied: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM schema_version WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;

        if !already_applied {
            tracing::info!("Applying migration: {}", name);
            conn.execute_batch(sql)?;
            conn.execute(
                "INSERT INTO schema_version (name) VALUES (?1)",
                params![name],
            )?;
        }
    }

    tracing::info!("Database migrations complete");
    Ok(())
}

/// Run `f` inside a `BEGIN IMMEDIATE` transaction, committing on success.
///
/// The write lock is taken up front; a counter update and the row it
/// mirrors commit together. A transaction that fails with SQLITE_BUSY
/// (after the connection's busy timeout) is rolled back and retried up to
/// `BUSY_RETRIES` times.
pub fn write_tx<T, F>(conn: &mut Connection, mut f: F) -> RepoResult<T>
where
    F: FnMut(&Transaction<'_>) -> RepoResult<T>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        let result = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(RepositoryError::from)
            .and_then(|tx| {
                let value = f(&tx)?;
                tx.commit()?;
                Ok(value)
            });

        match result {
            Err(RepositoryError::Sql(ref e)) if is_busy(e) && attempt < BUSY_RETRIES => {
                tracing::warn!("Database busy, retrying transaction (attempt {})", attempt);
            }
            other => return other,
        }
    }
}

fn is_busy(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked)
    )
}

/// Fresh UUIDv4 string used for every entity id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Current time as a sortable RFC 3339 timestamp with millisecond precision.
pub fn now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// `SELECT EXISTS(...)` helper shared by the repositories.
pub(crate) fn exists(conn: &Connection, sql: &str, id: &str) -> RepoResult<bool> {
    Ok(conn.query_row(sql, params![id], |row| row.get(0))?)
}

#[cfg(test)]
pub(crate) fn test_pool() -> DbPool {
    let manager = SqliteConnectionManager::memory().with_init(init_connection);
    let pool = Pool::builder().max_size(1).build(manager).unwrap();
    run_migrations(&pool).unwrap();
    pool
}
