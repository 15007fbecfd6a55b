//! Backend-neutral parameter and result value types.
//!
//! Statements are written once with `?` placeholders and an ordered
//! [`SqlValue`] parameter list; result rows come back as [`SqlRow`] maps with
//! the same shape regardless of which engine executed the statement.

use std::collections::HashMap;

use serde_json::Value;

use crate::db::DbError;

/// A positional statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl<T> From<Option<T>> for SqlValue
where
    T: Into<SqlValue>,
{
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Construct a `&[SqlValue]` parameter list from mixed Rust values.
#[macro_export]
macro_rules! params {
    () => {
        &[] as &[$crate::db::SqlValue]
    };
    ($($value:expr),+ $(,)?) => {
        &[$($crate::db::SqlValue::from($value)),+][..]
    };
}

/// One result record: column name to value, shape identical across engines.
pub type SqlRow = HashMap<String, Value>;

/// Normalized outcome of an INSERT/UPDATE/DELETE statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MutationResult {
    /// Auto-assigned identifier; populated only for INSERT statements.
    pub inserted_id: Option<i64>,
    /// Number of rows the engine reported as changed.
    pub affected: u64,
}

/// Typed accessors for [`SqlRow`] columns.
pub trait SqlRowExt {
    fn get_i64(&self, column: &str) -> Result<i64, DbError>;
    fn get_str(&self, column: &str) -> Result<String, DbError>;
    fn get_opt_i64(&self, column: &str) -> Result<Option<i64>, DbError>;
    fn get_opt_str(&self, column: &str) -> Result<Option<String>, DbError>;
}

impl SqlRowExt for SqlRow {
    fn get_i64(&self, column: &str) -> Result<i64, DbError> {
        self.get_opt_i64(column)?
            .ok_or_else(|| DbError::InvalidData(format!("column '{column}' is null or missing")))
    }

    fn get_str(&self, column: &str) -> Result<String, DbError> {
        self.get_opt_str(column)?
            .ok_or_else(|| DbError::InvalidData(format!("column '{column}' is null or missing")))
    }

    fn get_opt_i64(&self, column: &str) -> Result<Option<i64>, DbError> {
        match self.get(column) {
            Some(Value::Number(n)) => n.as_i64().map(Some).ok_or_else(|| {
                DbError::InvalidData(format!("column '{column}' is not an integer"))
            }),
            Some(Value::Null) | None => Ok(None),
            Some(other) => Err(DbError::InvalidData(format!(
                "column '{column}' has unexpected type: {other}"
            ))),
        }
    }

    fn get_opt_str(&self, column: &str) -> Result<Option<String>, DbError> {
        match self.get(column) {
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Null) | None => Ok(None),
            Some(other) => Err(DbError::InvalidData(format!(
                "column '{column}' has unexpected type: {other}"
            ))),
        }
    }
}
