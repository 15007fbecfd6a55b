//! HTTP API for the job tracker.
//!
//! Routes map REST endpoints onto the domain stores and translate store
//! results into JSON responses and store errors into status codes. Requests
//! authenticate with a `user-id` header; the role on the account row decides
//! admin access.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

use crate::auth;
use crate::db::{Db, DbError};
use crate::store::{
    ApplicationStatus, Job, NewJob, NewLegacyApplication, Role, Stores, User,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub stores: Stores,
}

/// API-level error, mapped onto a status code and a JSON `{"error": ...}`
/// body.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(&'static str),
    Forbidden(&'static str),
    NotFound(&'static str),
    Db(DbError),
    Internal(String),
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        Self::Db(err)
    }
}

impl From<auth::AuthError> for ApiError {
    fn from(err: auth::AuthError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.to_string()),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.to_string()),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.to_string()),
            Self::Db(err) if err.is_unique_violation() => {
                (StatusCode::CONFLICT, "already exists".to_string())
            }
            Self::Db(err) => {
                tracing::error!(error = %err, "storage operation failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    db: Option<String>,
}

// =============================================================================
// Request bodies
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApplyBody {
    status: Option<String>,
    date_applied: Option<String>,
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CredentialsBody {
    username: Option<String>,
    password: Option<String>,
}

/// A listing merged with the requesting user's application state.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JobWithStatus {
    #[serde(flatten)]
    job: Job,
    status: ApplicationStatus,
    date_applied: Option<String>,
    notes: String,
    application_id: Option<i64>,
}

// =============================================================================
// Identity helpers
// =============================================================================

/// Requester id from the `user-id` header, if present and numeric.
fn header_user_id(headers: &HeaderMap) -> Option<i64> {
    headers
        .get("user-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<i64>().ok())
}

/// Resolve the requesting account or fail with 401.
async fn require_user(state: &AppState, headers: &HeaderMap) -> Result<User, ApiError> {
    let user_id =
        header_user_id(headers).ok_or(ApiError::Unauthorized("Authentication required"))?;
    state
        .stores
        .users
        .find_by_id(user_id)
        .await?
        .ok_or(ApiError::Unauthorized("Authentication required"))
}

/// Resolve the requesting account and fail with 403 unless it is an admin.
async fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<User, ApiError> {
    let user = require_user(state, headers).await?;
    if !user.is_admin() {
        return Err(ApiError::Forbidden("Admin access required"));
    }
    Ok(user)
}

/// Validate a client-supplied status string, defaulting when absent.
fn parse_status(raw: Option<&str>) -> Result<ApplicationStatus, ApiError> {
    match raw {
        None => Ok(ApplicationStatus::default()),
        Some(s) => ApplicationStatus::from_str(s)
            .map_err(|_| ApiError::BadRequest(format!("unknown application status '{s}'"))),
    }
}

// =============================================================================
// Router
// =============================================================================

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    let app_state = Arc::new(state);

    Router::new()
        .route("/healthz", get(healthz_handler))
        .route("/readyz", get(readyz_handler))
        .route("/api/jobs", get(list_jobs_handler).post(create_job_handler))
        .route(
            "/api/jobs/{id}",
            put(update_job_handler).delete(delete_job_handler),
        )
        .route("/api/jobs/{job_id}/apply", post(apply_handler))
        .route(
            "/api/applications/{job_id}/status",
            put(application_status_handler),
        )
        .route(
            "/api/applications",
            get(legacy_list_handler).post(legacy_create_handler),
        )
        .route(
            "/api/applications/{id}",
            put(legacy_update_handler).delete(legacy_delete_handler),
        )
        .route("/api/signup", post(signup_handler))
        .route("/api/login", post(login_handler))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

// =============================================================================
// Probes
// =============================================================================

/// Liveness probe.
async fn healthz_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        db: None,
    })
}

/// Readiness probe that checks the active engine.
async fn readyz_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.db.ping().await {
        Ok(()) => Json(HealthResponse {
            status: "ok".to_string(),
            db: Some(state.db.kind().to_string()),
        })
        .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "not_ready".to_string(),
                    db: Some(err.to_string()),
                }),
            )
                .into_response()
        }
    }
}

// =============================================================================
// Job listings
// =============================================================================

/// Public listing feed. When a requester is identified, each listing carries
/// that user's application state; otherwise defaults.
async fn list_jobs_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<JobWithStatus>>, ApiError> {
    let jobs = state.stores.jobs.list().await?;

    let merged = match header_user_id(&headers) {
        Some(user_id) => {
            let job_ids: Vec<i64> = jobs.iter().map(|j| j.id).collect();
            let applications = state
                .stores
                .applications
                .for_user_in_jobs(user_id, &job_ids)
                .await?;

            jobs.into_iter()
                .map(|job| {
                    let found = applications.iter().find(|a| a.job_id == job.id);
                    JobWithStatus {
                        status: found.map(|a| a.status).unwrap_or_default(),
                        date_applied: found.and_then(|a| a.date_applied.clone()),
                        notes: found.map(|a| a.notes.clone()).unwrap_or_default(),
                        application_id: found.map(|a| a.id),
                        job,
                    }
                })
                .collect()
        }
        None => jobs
            .into_iter()
            .map(|job| JobWithStatus {
                status: ApplicationStatus::default(),
                date_applied: None,
                notes: String::new(),
                application_id: None,
                job,
            })
            .collect(),
    };

    Ok(Json(merged))
}

async fn create_job_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<NewJob>,
) -> Result<Response, ApiError> {
    let admin = require_admin(&state, &headers).await?;

    if body.company.trim().is_empty() || body.role.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Company and role are required".to_string(),
        ));
    }

    let id = state.stores.jobs.create(&body, admin.id).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))).into_response())
}

async fn update_job_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<NewJob>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_admin(&state, &headers).await?;

    if !state.stores.jobs.update(id, &body).await? {
        return Err(ApiError::NotFound("Job not found"));
    }
    Ok(Json(json!({ "updated": true })))
}

async fn delete_job_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_admin(&state, &headers).await?;

    if !state.stores.jobs.delete(id).await? {
        return Err(ApiError::NotFound("Job not found"));
    }
    Ok(Json(json!({ "deleted": true })))
}

// =============================================================================
// Per-user applications
// =============================================================================

async fn apply_handler(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<ApplyBody>,
) -> Result<Response, ApiError> {
    let user = require_user(&state, &headers).await?;

    if state.stores.jobs.get(job_id).await?.is_none() {
        return Err(ApiError::NotFound("Job not found"));
    }

    let status = parse_status(body.status.as_deref())?;
    let outcome = state
        .stores
        .applications
        .upsert(
            user.id,
            job_id,
            status,
            body.date_applied.as_deref(),
            body.notes.as_deref().unwrap_or(""),
        )
        .await?;

    if outcome.created {
        Ok((StatusCode::CREATED, Json(json!({ "id": outcome.id }))).into_response())
    } else {
        Ok(Json(json!({ "id": outcome.id, "updated": true })).into_response())
    }
}

async fn application_status_handler(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<ApplyBody>,
) -> Result<Response, ApiError> {
    let user = require_user(&state, &headers).await?;

    let status = parse_status(body.status.as_deref())?;
    let outcome = state
        .stores
        .applications
        .upsert(
            user.id,
            job_id,
            status,
            body.date_applied.as_deref(),
            body.notes.as_deref().unwrap_or(""),
        )
        .await?;

    if outcome.created {
        Ok((StatusCode::CREATED, Json(json!({ "id": outcome.id }))).into_response())
    } else {
        Ok(Json(json!({ "updated": true })).into_response())
    }
}

// =============================================================================
// Legacy applications
// =============================================================================

async fn legacy_list_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<crate::store::LegacyApplication>>, ApiError> {
    let entries = state
        .stores
        .applications
        .legacy_list(header_user_id(&headers))
        .await?;
    Ok(Json(entries))
}

async fn legacy_create_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<NewLegacyApplication>,
) -> Result<Response, ApiError> {
    let user = require_user(&state, &headers).await?;

    // One entry per user + company + role; resubmission refreshes it.
    let existing = state
        .stores
        .applications
        .legacy_find_duplicate(user.id, &body.company, &body.role)
        .await?;

    match existing {
        Some(id) => {
            state
                .stores
                .applications
                .legacy_update_details(id, &body)
                .await?;
            Ok(Json(json!({ "id": id, "updated": true })).into_response())
        }
        None => {
            let id = state.stores.applications.legacy_insert(user.id, &body).await?;
            Ok((StatusCode::CREATED, Json(json!({ "id": id }))).into_response())
        }
    }
}

/// Owner-or-admin guard for a legacy entry.
fn check_entry_access(owner: Option<i64>, user: &User) -> Result<(), ApiError> {
    if owner != Some(user.id) && !user.is_admin() {
        return Err(ApiError::Forbidden("Access denied"));
    }
    Ok(())
}

async fn legacy_update_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<StatusBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = require_user(&state, &headers).await?;

    let entry = state
        .stores
        .applications
        .legacy_get(id)
        .await?
        .ok_or(ApiError::NotFound("Not found"))?;
    check_entry_access(entry.user_id, &user)?;

    let status = parse_status(body.status.as_deref())?;
    if !state.stores.applications.legacy_set_status(id, status).await? {
        return Err(ApiError::NotFound("Not found"));
    }
    Ok(Json(json!({ "updated": true })))
}

async fn legacy_delete_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = require_user(&state, &headers).await?;

    let entry = state
        .stores
        .applications
        .legacy_get(id)
        .await?
        .ok_or(ApiError::NotFound("Not found"))?;
    check_entry_access(entry.user_id, &user)?;

    if !state.stores.applications.legacy_delete(id).await? {
        return Err(ApiError::NotFound("Not found"));
    }
    Ok(Json(json!({ "deleted": true })))
}

// =============================================================================
// Accounts
// =============================================================================

async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CredentialsBody>,
) -> Result<Response, ApiError> {
    let (username, password) = match (body.username.as_deref(), body.password.as_deref()) {
        (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => (u, p),
        _ => {
            return Ok((
                StatusCode::BAD_REQUEST,
                Json(json!({ "success": false, "message": "Username and password required" })),
            )
                .into_response());
        }
    };

    let hash = auth::hash_password(password)?;
    // The unique constraint decides; no read-then-write race.
    match state.stores.users.create(username, &hash, Role::User).await {
        Ok(_) => Ok((
            StatusCode::CREATED,
            Json(json!({ "success": true, "message": "Account created!" })),
        )
            .into_response()),
        Err(err) if err.is_unique_violation() => Ok((
            StatusCode::CONFLICT,
            Json(json!({ "success": false, "message": "Username already taken" })),
        )
            .into_response()),
        Err(err) => Err(err.into()),
    }
}

async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CredentialsBody>,
) -> Result<Response, ApiError> {
    let invalid = || {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "message": "Invalid credentials" })),
        )
            .into_response()
    };

    let (Some(username), Some(password)) = (body.username.as_deref(), body.password.as_deref())
    else {
        return Ok(invalid());
    };

    let Some(user) = state.stores.users.find_by_username(username).await? else {
        return Ok(invalid());
    };

    if !auth::verify_password(password, &user.password_hash)? {
        return Ok(invalid());
    }

    Ok(Json(json!({
        "success": true,
        "token": format!("tok-{}", user.id),
        "user": { "id": user.id, "username": user.username, "role": user.role },
    }))
    .into_response())
}
