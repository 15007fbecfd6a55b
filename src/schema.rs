//! Database schema definitions and idempotent initialization.
//!
//! The two dialects differ only in how the auto-assigned primary key is
//! declared. Timestamps are stored as application-supplied RFC 3339 TEXT so
//! both engines return byte-identical values, and identifiers are snake_case
//! on both engines so result records carry the same keys.

use crate::db::{Db, DbError, EngineKind};

/// Schema DDL for the embedded SQLite engine.
pub const SQLITE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT UNIQUE NOT NULL,
    password_hash TEXT NOT NULL,
    role          TEXT NOT NULL DEFAULT 'user'
);

CREATE TABLE IF NOT EXISTS jobs (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    company    TEXT NOT NULL,
    role       TEXT NOT NULL,
    location   TEXT,
    job_link   TEXT,
    created_at TEXT NOT NULL,
    created_by INTEGER REFERENCES users(id)
);

CREATE TABLE IF NOT EXISTS user_applications (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id      INTEGER NOT NULL REFERENCES users(id),
    job_id       INTEGER NOT NULL REFERENCES jobs(id) ON DELETE CASCADE,
    status       TEXT NOT NULL DEFAULT 'Not Applied',
    date_applied TEXT,
    notes        TEXT NOT NULL DEFAULT '',
    UNIQUE(user_id, job_id)
);

CREATE TABLE IF NOT EXISTS applications (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id      INTEGER REFERENCES users(id),
    company      TEXT NOT NULL,
    role         TEXT NOT NULL,
    location     TEXT,
    job_link     TEXT,
    status       TEXT NOT NULL DEFAULT 'Not Applied',
    date_applied TEXT,
    notes        TEXT NOT NULL DEFAULT ''
);
"#;

/// Schema DDL for the networked PostgreSQL engine.
pub const POSTGRES_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id            BIGSERIAL PRIMARY KEY,
    username      TEXT UNIQUE NOT NULL,
    password_hash TEXT NOT NULL,
    role          TEXT NOT NULL DEFAULT 'user'
);

CREATE TABLE IF NOT EXISTS jobs (
    id         BIGSERIAL PRIMARY KEY,
    company    TEXT NOT NULL,
    role       TEXT NOT NULL,
    location   TEXT,
    job_link   TEXT,
    created_at TEXT NOT NULL,
    created_by BIGINT REFERENCES users(id)
);

CREATE TABLE IF NOT EXISTS user_applications (
    id           BIGSERIAL PRIMARY KEY,
    user_id      BIGINT NOT NULL REFERENCES users(id),
    job_id       BIGINT NOT NULL REFERENCES jobs(id) ON DELETE CASCADE,
    status       TEXT NOT NULL DEFAULT 'Not Applied',
    date_applied TEXT,
    notes        TEXT NOT NULL DEFAULT '',
    UNIQUE(user_id, job_id)
);

CREATE TABLE IF NOT EXISTS applications (
    id           BIGSERIAL PRIMARY KEY,
    user_id      BIGINT REFERENCES users(id),
    company      TEXT NOT NULL,
    role         TEXT NOT NULL,
    location     TEXT,
    job_link     TEXT,
    status       TEXT NOT NULL DEFAULT 'Not Applied',
    date_applied TEXT,
    notes        TEXT NOT NULL DEFAULT ''
);
"#;

/// Initialize the database schema for the active engine.
///
/// All statements are `IF NOT EXISTS`, so calling this on every startup is
/// safe.
pub async fn init_schema(db: &Db) -> Result<(), DbError> {
    let ddl = match db.kind() {
        EngineKind::Sqlite => SQLITE_SCHEMA,
        EngineKind::Postgres => POSTGRES_SCHEMA,
    };
    db.execute_batch(ddl).await?;

    tracing::info!(engine = %db.kind(), "database schema initialized");
    Ok(())
}
