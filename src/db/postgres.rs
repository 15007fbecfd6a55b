//! Networked PostgreSQL engine using sqlx.
//!
//! Rewrites the neutral `?` placeholder syntax to `$1..$n` before execution
//! and appends a `RETURNING id` clause to INSERT statements so the inserted
//! identifier can be read back uniformly with the embedded engine.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Row};

use crate::db::engine::{Engine, EngineKind};
use crate::db::rewrite::{append_returning, is_insert, rewrite_placeholders};
use crate::db::value::{MutationResult, SqlRow, SqlValue};
use crate::db::DbError;

/// Default connection acquire timeout.
const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// PostgreSQL engine, accessed over a pooled network connection.
pub struct PostgresEngine {
    pool: PgPool,
}

impl std::fmt::Debug for PostgresEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresEngine").finish_non_exhaustive()
    }
}

impl PostgresEngine {
    /// Connect to a PostgreSQL server from a connection URL.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, DbError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(DEFAULT_ACQUIRE_TIMEOUT)
            .connect(url)
            .await
            .map_err(|e| DbError::Configuration(format!("PostgreSQL connect failed: {e}")))?;

        Ok(Self { pool })
    }

    fn bind_all<'q>(
        sql: &'q str,
        params: &[SqlValue],
    ) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
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

    fn row_to_record(row: &PgRow) -> SqlRow {
        row.columns()
            .iter()
            .map(|col| (col.name().to_string(), Self::extract_value(row, col.ordinal())))
            .collect()
    }

    /// Decode a column into a neutral JSON value.
    ///
    /// Integers are probed before bool to avoid misreading numeric columns;
    /// timestamp types are normalized to RFC 3339 strings.
    fn extract_value(row: &PgRow, idx: usize) -> Value {
        if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
            return v.map(Value::from).unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<i32>, _>(idx) {
            return v.map(|i| Value::from(i64::from(i))).unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<i16>, _>(idx) {
            return v.map(|i| Value::from(i64::from(i))).unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<bool>, _>(idx) {
            return v.map(Value::Bool).unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
            return v
                .and_then(|f| serde_json::Number::from_f64(f).map(Value::Number))
                .unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
            return v.map(Value::String).unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(idx) {
            return v
                .map(|dt| Value::String(dt.to_rfc3339()))
                .unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<chrono::NaiveDate>, _>(idx) {
            return v
                .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
                .unwrap_or(Value::Null);
        }
        Value::Null
    }
}

#[async_trait]
impl Engine for PostgresEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Postgres
    }

    async fn query_many(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<SqlRow>, DbError> {
        let rewritten = rewrite_placeholders(sql);
        let rows = Self::bind_all(&rewritten, params)
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
        let rewritten = rewrite_placeholders(sql);
        let row = Self::bind_all(&rewritten, params)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::Query)?;
        Ok(row.as_ref().map(Self::row_to_record))
    }

    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<MutationResult, DbError> {
        let rewritten = rewrite_placeholders(sql);

        if is_insert(sql) {
            // The identifier is read back through RETURNING; the affected
            // count is derived from the returned row count since the engine
            // does not report it for a fetched statement.
            let statement = append_returning(&rewritten);
            let rows = Self::bind_all(&statement, params)
                .fetch_all(&self.pool)
                .await
                .map_err(DbError::Mutation)?;

            let inserted_id = rows.first().and_then(|row| row.try_get::<i64, _>("id").ok());
            Ok(MutationResult {
                inserted_id,
                affected: rows.len() as u64,
            })
        } else {
            let result = Self::bind_all(&rewritten, params)
                .execute(&self.pool)
                .await
                .map_err(DbError::Mutation)?;
            Ok(MutationResult {
                inserted_id: None,
                affected: result.rows_affected(),
            })
        }
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
