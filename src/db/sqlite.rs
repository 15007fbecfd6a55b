//! Embedded SQLite engine using sqlx.
//!
//! Accepts the neutral `?` placeholder syntax natively and reports inserted
//! row ids and affected counts inline, so no statement rewriting is needed.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
    SqliteSynchronous,
};
use sqlx::{Column, Row};

use crate::db::engine::{Engine, EngineKind};
use crate::db::rewrite::is_insert;
use crate::db::value::{MutationResult, SqlRow, SqlValue};
use crate::db::DbError;

/// Default connection acquire timeout.
const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// File-backed SQLite engine, run in-process with no network hop.
pub struct SqliteEngine {
    pool: SqlitePool,
}

impl std::fmt::Debug for SqliteEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteEngine").finish_non_exhaustive()
    }
}

impl SqliteEngine {
    /// Connect to a SQLite database.
    ///
    /// Uses WAL journal mode with normal synchronous writes and creates the
    /// database file if missing (`sqlite:data/jobtrack.db?mode=rwc`).
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, DbError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| DbError::Configuration(format!("invalid SQLite url '{url}': {e}")))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(DEFAULT_ACQUIRE_TIMEOUT)
            .connect_with(options)
            .await
            .map_err(|e| DbError::Configuration(format!("SQLite connect failed: {e}")))?;

        Ok(Self { pool })
    }

    fn bind_all<'q>(
        sql: &'q str,
        params: &[SqlValue],
    ) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = match param {
                SqlValue::Null => query.bind(Option::<String>::None),
                SqlValue::Bool(b) => query.bind(*b),
                SqlValue::Int(i) => query.bind(*i),
                SqlValue::Float(f) => query.bind(*f),
                SqlValue::Text(s) => query.bind(s.clone()),
            };
        }
        query
    }

    fn row_to_record(row: &SqliteRow) -> SqlRow {
        row.columns()
            .iter()
            .map(|col| (col.name().to_string(), Self::extract_value(row, col.ordinal())))
            .collect()
    }

    /// Decode a column into a neutral JSON value.
    ///
    /// Integers are probed before bool so INTEGER columns come out numeric.
    fn extract_value(row: &SqliteRow, idx: usize) -> Value {
        if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
            return v.map(Value::from).unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
            return v
                .and_then(|f| serde_json::Number::from_f64(f).map(Value::Number))
                .unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<bool>, _>(idx) {
            return v.map(Value::Bool).unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
            return v.map(Value::String).unwrap_or(Value::Null);
        }
        Value::Null
    }
}

#[async_trait]
impl Engine for SqliteEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Sqlite
    }

    async fn query_many(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<SqlRow>, DbError> {
        let rows = Self::bind_all(sql, params)
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::Query)?;
        Ok(rows.iter().map(Self::row_to_record).collect())
    }

    async fn query_one(
        &self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<Option<SqlRow>, DbError> {
        let row = Self::bind_all(sql, params)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::Query)?;
        Ok(row.as_ref().map(Self::row_to_record))
    }

    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<MutationResult, DbError> {
        let insert = is_insert(sql);
        let result = Self::bind_all(sql, params)
            .execute(&self.pool)
            .await
            .map_err(DbError::Mutation)?;

        Ok(MutationResult {
            inserted_id: insert.then(|| result.last_insert_rowid()),
            affected: result.rows_affected(),
        })
    }

    async fn execute_batch(&self, sql: &str) -> Result<(), DbError> {
        sqlx::raw_sql(sql)
            .execute(&self.pool)
            .await
            .map_err(DbError::Mutation)?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
