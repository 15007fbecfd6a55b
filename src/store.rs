//! Domain stores over the statement adapter.
//!
//! Each store is a thin facade holding a [`Db`] handle; every operation is a
//! single backend-neutral statement, so the stores behave identically under
//! either engine. Stores are cheap to clone and injected into request
//! handlers as shared state.

mod applications;
mod jobs;
mod users;

pub use applications::{ApplicationStore, LegacyApplication, NewLegacyApplication, UpsertOutcome, UserApplication};
pub use jobs::{Job, JobStore, NewJob};
pub use users::{User, UserStore};

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::db::Db;

/// Account role stored on the `users` row.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, AsRefStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

/// Per-job application status.
///
/// Stored as its display string; unknown strings are rejected at the API
/// boundary rather than persisted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display, AsRefStr, Serialize,
    Deserialize,
)]
pub enum ApplicationStatus {
    #[default]
    #[strum(serialize = "Not Applied")]
    #[serde(rename = "Not Applied")]
    NotApplied,
    Wishlist,
    Applied,
    Interview,
    Offer,
    Rejected,
}

/// All domain stores bundled for handler injection.
#[derive(Debug, Clone)]
pub struct Stores {
    pub users: UserStore,
    pub jobs: JobStore,
    pub applications: ApplicationStore,
}

impl Stores {
    pub fn new(db: &Db) -> Self {
        Self {
            users: UserStore::new(db.clone()),
            jobs: JobStore::new(db.clone()),
            applications: ApplicationStore::new(db.clone()),
        }
    }
}
