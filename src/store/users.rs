//! User account store.

use std::str::FromStr;

use serde::Serialize;

use crate::db::{Db, DbError, SqlRow, SqlRowExt};
use crate::params;
use crate::store::Role;

/// A `users` row. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
}

impl User {
    fn from_row(row: &SqlRow) -> Result<Self, DbError> {
        let role = row.get_str("role")?;
        Ok(Self {
            id: row.get_i64("id")?,
            username: row.get_str("username")?,
            password_hash: row.get_str("password_hash")?,
            role: Role::from_str(&role)
                .map_err(|_| DbError::InvalidData(format!("unknown role '{role}'")))?,
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone)]
pub struct UserStore {
    db: Db,
}

impl UserStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Insert a new account. A taken username surfaces as a uniqueness
    /// violation for the caller to translate.
    pub async fn create(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<i64, DbError> {
        let result = self
            .db
            .execute(
                "INSERT INTO users (username, password_hash, role) VALUES (?, ?, ?)",
                params![username, password_hash, role.as_ref()],
            )
            .await?;
        result
            .inserted_id
            .ok_or_else(|| DbError::InvalidData("user insert returned no id".to_string()))
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, DbError> {
        self.db
            .query_one("SELECT * FROM users WHERE username = ?", params![username])
            .await?
            .as_ref()
            .map(User::from_row)
            .transpose()
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, DbError> {
        self.db
            .query_one("SELECT * FROM users WHERE id = ?", params![id])
            .await?
            .as_ref()
            .map(User::from_row)
            .transpose()
    }

    /// Create the configured admin account if it does not exist yet.
    /// Returns `true` when a new account was created.
    pub async fn ensure_admin(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<bool, DbError> {
        if self.find_by_username(username).await?.is_some() {
            return Ok(false);
        }
        self.create(username, password_hash, Role::Admin).await?;
        Ok(true)
    }
}
