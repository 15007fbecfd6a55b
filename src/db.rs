//! Storage access layer.
//!
//! One backend-neutral statement adapter runs the same parameterized SQL
//! against either engine, selected once at process start:
//! - **SQLite**: embedded, file-backed, no network hop
//! - **PostgreSQL**: networked, pooled, bound when a connection string is set
//!
//! Statements use `?` positional placeholders; the adapter rewrites them for
//! the active engine and normalizes result shapes ([`SqlRow`] records and
//! [`MutationResult`]) so callers cannot tell the engines apart.

mod engine;
mod error;
mod postgres;
mod rewrite;
mod sqlite;
mod value;

pub use engine::{connect, Db, Engine, EngineKind, PreparedStatement};
pub use error::DbError;
pub use postgres::PostgresEngine;
pub use sqlite::SqliteEngine;
pub use value::{MutationResult, SqlRow, SqlRowExt, SqlValue};
