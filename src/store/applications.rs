//! Per-user application store, plus the legacy free-form applications table.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::db::{Db, DbError, PreparedStatement, SqlRow, SqlRowExt, SqlValue};
use crate::params;
use crate::store::ApplicationStatus;

/// A `user_applications` row linking a user to a job listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserApplication {
    pub id: i64,
    pub user_id: i64,
    pub job_id: i64,
    pub status: ApplicationStatus,
    pub date_applied: Option<String>,
    pub notes: String,
}

impl UserApplication {
    fn from_row(row: &SqlRow) -> Result<Self, DbError> {
        Ok(Self {
            id: row.get_i64("id")?,
            user_id: row.get_i64("user_id")?,
            job_id: row.get_i64("job_id")?,
            status: parse_status(&row.get_str("status")?)?,
            date_applied: row.get_opt_str("date_applied")?,
            notes: row.get_opt_str("notes")?.unwrap_or_default(),
        })
    }
}

/// An `applications` row, kept for older clients that track free-form
/// entries instead of listed jobs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyApplication {
    pub id: i64,
    pub user_id: Option<i64>,
    pub company: String,
    pub role: String,
    pub location: Option<String>,
    pub job_link: Option<String>,
    pub status: ApplicationStatus,
    pub date_applied: Option<String>,
    pub notes: String,
}

impl LegacyApplication {
    fn from_row(row: &SqlRow) -> Result<Self, DbError> {
        Ok(Self {
            id: row.get_i64("id")?,
            user_id: row.get_opt_i64("user_id")?,
            company: row.get_str("company")?,
            role: row.get_str("role")?,
            location: row.get_opt_str("location")?,
            job_link: row.get_opt_str("job_link")?,
            status: parse_status(&row.get_str("status")?)?,
            date_applied: row.get_opt_str("date_applied")?,
            notes: row.get_opt_str("notes")?.unwrap_or_default(),
        })
    }
}

/// Client-supplied fields for a legacy entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLegacyApplication {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub role: String,
    pub location: Option<String>,
    pub job_link: Option<String>,
    pub date_applied: Option<String>,
    pub notes: Option<String>,
}

/// Result of a per-user application upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub id: i64,
    /// `true` when a new row was inserted, `false` on update.
    pub created: bool,
}

fn parse_status(raw: &str) -> Result<ApplicationStatus, DbError> {
    ApplicationStatus::from_str(raw)
        .map_err(|_| DbError::InvalidData(format!("unknown application status '{raw}'")))
}

#[derive(Debug, Clone)]
pub struct ApplicationStore {
    db: Db,
    legacy_insert_stmt: PreparedStatement,
}

impl ApplicationStore {
    pub fn new(db: Db) -> Self {
        let legacy_insert_stmt = db.prepare(
            "INSERT INTO applications \
             (user_id, company, role, location, job_link, date_applied, notes) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        );
        Self {
            db,
            legacy_insert_stmt,
        }
    }

    /// The user's application for one job listing, if any.
    pub async fn find(
        &self,
        user_id: i64,
        job_id: i64,
    ) -> Result<Option<UserApplication>, DbError> {
        self.db
            .query_one(
                "SELECT * FROM user_applications WHERE user_id = ? AND job_id = ?",
                params![user_id, job_id],
            )
            .await?
            .as_ref()
            .map(UserApplication::from_row)
            .transpose()
    }

    /// Create or update the user's application for a job.
    pub async fn upsert(
        &self,
        user_id: i64,
        job_id: i64,
        status: ApplicationStatus,
        date_applied: Option<&str>,
        notes: &str,
    ) -> Result<UpsertOutcome, DbError> {
        match self.find(user_id, job_id).await? {
            Some(existing) => {
                self.db
                    .execute(
                        "UPDATE user_applications \
                         SET status = ?, date_applied = ?, notes = ? WHERE id = ?",
                        params![status.as_ref(), date_applied, notes, existing.id],
                    )
                    .await?;
                Ok(UpsertOutcome {
                    id: existing.id,
                    created: false,
                })
            }
            None => {
                let result = self
                    .db
                    .execute(
                        "INSERT INTO user_applications \
                         (user_id, job_id, status, date_applied, notes) VALUES (?, ?, ?, ?, ?)",
                        params![user_id, job_id, status.as_ref(), date_applied, notes],
                    )
                    .await?;
                let id = result.inserted_id.ok_or_else(|| {
                    DbError::InvalidData("application insert returned no id".to_string())
                })?;
                Ok(UpsertOutcome { id, created: true })
            }
        }
    }

    /// The user's applications across a set of job listings, queried with a
    /// dynamically sized placeholder list.
    pub async fn for_user_in_jobs(
        &self,
        user_id: i64,
        job_ids: &[i64],
    ) -> Result<Vec<UserApplication>, DbError> {
        if job_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; job_ids.len()].join(",");
        let sql = format!(
            "SELECT * FROM user_applications WHERE user_id = ? AND job_id IN ({placeholders})"
        );
        let mut args: Vec<SqlValue> = Vec::with_capacity(job_ids.len() + 1);
        args.push(SqlValue::Int(user_id));
        args.extend(job_ids.iter().map(|id| SqlValue::Int(*id)));

        self.db
            .query_many(&sql, &args)
            .await?
            .iter()
            .map(UserApplication::from_row)
            .collect()
    }

    // ---- legacy `applications` table ----

    /// Entries visible to an older client: the user's own when authenticated,
    /// everyone's otherwise.
    pub async fn legacy_list(
        &self,
        user_id: Option<i64>,
    ) -> Result<Vec<LegacyApplication>, DbError> {
        let rows = match user_id {
            Some(user_id) => {
                self.db
                    .query_many(
                        "SELECT * FROM applications WHERE user_id = ? \
                         ORDER BY date_applied DESC",
                        params![user_id],
                    )
                    .await?
            }
            None => {
                self.db
                    .query_many(
                        "SELECT * FROM applications ORDER BY date_applied DESC",
                        params![],
                    )
                    .await?
            }
        };
        rows.iter().map(LegacyApplication::from_row).collect()
    }

    pub async fn legacy_get(&self, id: i64) -> Result<Option<LegacyApplication>, DbError> {
        self.db
            .query_one("SELECT * FROM applications WHERE id = ?", params![id])
            .await?
            .as_ref()
            .map(LegacyApplication::from_row)
            .transpose()
    }

    /// An existing entry id for the same user + company + role, used to
    /// deduplicate legacy submissions.
    pub async fn legacy_find_duplicate(
        &self,
        user_id: i64,
        company: &str,
        role: &str,
    ) -> Result<Option<i64>, DbError> {
        let row = self
            .db
            .query_one(
                "SELECT id FROM applications WHERE user_id = ? AND company = ? AND role = ?",
                params![user_id, company, role],
            )
            .await?;
        row.as_ref().map(|r| r.get_i64("id")).transpose()
    }

    pub async fn legacy_insert(
        &self,
        user_id: i64,
        entry: &NewLegacyApplication,
    ) -> Result<i64, DbError> {
        let result = self
            .legacy_insert_stmt
            .run(params![
                user_id,
                entry.company.as_str(),
                entry.role.as_str(),
                entry.location.clone(),
                entry.job_link.clone(),
                entry.date_applied.clone(),
                entry.notes.clone().unwrap_or_default(),
            ])
            .await?;
        result
            .inserted_id
            .ok_or_else(|| DbError::InvalidData("application insert returned no id".to_string()))
    }

    /// Refresh a duplicate entry's mutable fields in place.
    pub async fn legacy_update_details(
        &self,
        id: i64,
        entry: &NewLegacyApplication,
    ) -> Result<(), DbError> {
        self.db
            .execute(
                "UPDATE applications SET location = ?, job_link = ?, date_applied = ?, notes = ? \
                 WHERE id = ?",
                params![
                    entry.location.clone(),
                    entry.job_link.clone(),
                    entry.date_applied.clone(),
                    entry.notes.clone().unwrap_or_default(),
                    id,
                ],
            )
            .await?;
        Ok(())
    }

    /// Returns `false` when no such entry exists.
    pub async fn legacy_set_status(
        &self,
        id: i64,
        status: ApplicationStatus,
    ) -> Result<bool, DbError> {
        let result = self
            .db
            .execute(
                "UPDATE applications SET status = ? WHERE id = ?",
                params![status.as_ref(), id],
            )
            .await?;
        Ok(result.affected > 0)
    }

    /// Returns `false` when no such entry exists.
    pub async fn legacy_delete(&self, id: i64) -> Result<bool, DbError> {
        let result = self
            .db
            .execute("DELETE FROM applications WHERE id = ?", params![id])
            .await?;
        Ok(result.affected > 0)
    }
}
