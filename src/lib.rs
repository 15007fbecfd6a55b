//! Jobtrack - Job Application Tracker
//!
//! This crate provides the core functionality for the jobtrack service: a
//! small web application where an admin posts job listings and authenticated
//! users track their per-job application status. It can be used as a library
//! or run as a standalone binary with the `jobtrack` executable.
//!
//! # Architecture
//!
//! - **db**: backend-neutral statement adapter over embedded SQLite or
//!   networked PostgreSQL, selected once at startup
//! - **schema**: per-engine DDL and idempotent initialization
//! - **store**: domain facades (users, jobs, applications) over the adapter
//! - **server**: Axum REST API
//! - **config**: YAML configuration with CLI/env overrides
//!
//! # Example
//!
//! ```rust,ignore
//! use jobtrack::{config::DatabaseConfig, db, schema};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = db::connect(&DatabaseConfig::default()).await?;
//!     schema::init_schema(&db).await?;
//!
//!     let row = db
//!         .query_one("SELECT * FROM jobs WHERE id = ?", jobtrack::params![1i64])
//!         .await?;
//!     println!("{row:?}");
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod config;
pub mod db;
pub mod schema;
pub mod server;
pub mod store;

pub use config::AppConfig;
pub use db::{Db, DbError};
