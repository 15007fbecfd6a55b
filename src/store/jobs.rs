//! Job listing store.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::db::{Db, DbError, SqlRow, SqlRowExt};
use crate::params;

/// A `jobs` row.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i64,
    pub company: String,
    pub role: String,
    pub location: Option<String>,
    pub job_link: Option<String>,
    pub created_at: String,
    pub created_by: Option<i64>,
}

impl Job {
    fn from_row(row: &SqlRow) -> Result<Self, DbError> {
        Ok(Self {
            id: row.get_i64("id")?,
            company: row.get_str("company")?,
            role: row.get_str("role")?,
            location: row.get_opt_str("location")?,
            job_link: row.get_opt_str("job_link")?,
            created_at: row.get_str("created_at")?,
            created_by: row.get_opt_i64("created_by")?,
        })
    }
}

/// Listing fields supplied by the client.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJob {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub role: String,
    pub location: Option<String>,
    pub job_link: Option<String>,
}

#[derive(Debug, Clone)]
pub struct JobStore {
    db: Db,
}

impl JobStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// All listings, newest first.
    pub async fn list(&self) -> Result<Vec<Job>, DbError> {
        self.db
            .query_many(
                "SELECT * FROM jobs ORDER BY created_at DESC, id DESC",
                params![],
            )
            .await?
            .iter()
            .map(Job::from_row)
            .collect()
    }

    pub async fn get(&self, id: i64) -> Result<Option<Job>, DbError> {
        self.db
            .query_one("SELECT * FROM jobs WHERE id = ?", params![id])
            .await?
            .as_ref()
            .map(Job::from_row)
            .transpose()
    }

    pub async fn create(&self, job: &NewJob, created_by: i64) -> Result<i64, DbError> {
        let result = self
            .db
            .execute(
                "INSERT INTO jobs (company, role, location, job_link, created_at, created_by) \
                 VALUES (?, ?, ?, ?, ?, ?)",
                params![
                    job.company.as_str(),
                    job.role.as_str(),
                    job.location.clone(),
                    job.job_link.clone(),
                    Utc::now().to_rfc3339(),
                    created_by,
                ],
            )
            .await?;
        result
            .inserted_id
            .ok_or_else(|| DbError::InvalidData("job insert returned no id".to_string()))
    }

    /// Returns `false` when no such listing exists.
    pub async fn update(&self, id: i64, job: &NewJob) -> Result<bool, DbError> {
        let result = self
            .db
            .execute(
                "UPDATE jobs SET company = ?, role = ?, location = ?, job_link = ? WHERE id = ?",
                params![
                    job.company.as_str(),
                    job.role.as_str(),
                    job.location.clone(),
                    job.job_link.clone(),
                    id,
                ],
            )
            .await?;
        Ok(result.affected > 0)
    }

    /// Returns `false` when no such listing exists. Per-user applications for
    /// the listing are removed by the schema's cascade rule.
    pub async fn delete(&self, id: i64) -> Result<bool, DbError> {
        let result = self
            .db
            .execute("DELETE FROM jobs WHERE id = ?", params![id])
            .await?;
        Ok(result.affected > 0)
    }
}
