//! API integration tests.
//!
//! Each test boots the full service against a temporary SQLite database and
//! talks to it over HTTP, the same path a real client takes.

use jobtrack::auth;
use jobtrack::config::DatabaseConfig;
use jobtrack::db;
use jobtrack::schema::init_schema;
use jobtrack::server::{create_router, AppState};
use jobtrack::store::{Role, Stores};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::net::TcpListener;

// =============================================================================
// Test Helpers
// =============================================================================

struct TestServer {
    base_url: String,
    stores: Stores,
    _dir: TempDir,
}

/// Start the service on a random port over a fresh temporary database.
async fn start_test_server() -> TestServer {
    let dir = tempfile::tempdir().expect("Failed to create tempdir");
    let config = DatabaseConfig {
        url: None,
        sqlite_path: dir
            .path()
            .join("api_test.db")
            .to_string_lossy()
            .into_owned(),
        max_connections: 2,
    };

    let db = db::connect(&config).await.expect("Failed to connect");
    init_schema(&db).await.expect("Failed to init schema");

    let stores = Stores::new(&db);
    let router = create_router(AppState {
        db,
        stores: stores.clone(),
    });

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().expect("Failed to get local addr");

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    // Give server time to start
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    TestServer {
        base_url: format!("http://{}", addr),
        stores,
        _dir: dir,
    }
}

/// Create an account directly in storage and return its id.
async fn seed_user(server: &TestServer, username: &str, password: &str, role: Role) -> i64 {
    let hash = auth::hash_password(password).expect("Failed to hash password");
    server
        .stores
        .users
        .create(username, &hash, role)
        .await
        .expect("Failed to seed user")
}

/// Create a listing through the API as the given admin and return its id.
async fn seed_job(server: &TestServer, admin_id: i64, company: &str, role: &str) -> i64 {
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{}/api/jobs", server.base_url))
        .header("user-id", admin_id.to_string())
        .json(&json!({ "company": company, "role": role, "location": "Remote" }))
        .send()
        .await
        .expect("Failed to create job");
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    body["id"].as_i64().expect("job id")
}

// =============================================================================
// Health Probe Tests
// =============================================================================

#[tokio::test]
async fn test_health_probes() {
    let server = start_test_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/healthz", server.base_url))
        .send()
        .await
        .expect("Failed to send healthz request");
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    let resp = client
        .get(format!("{}/readyz", server.base_url))
        .send()
        .await
        .expect("Failed to send readyz request");
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["db"], "sqlite");
}

// =============================================================================
// Account Tests
// =============================================================================

#[tokio::test]
async fn test_signup_and_login_flow() {
    let server = start_test_server().await;
    let client = reqwest::Client::new();

    // Missing fields
    let resp = client
        .post(format!("{}/api/signup", server.base_url))
        .json(&json!({ "username": "ada" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Fresh signup
    let resp = client
        .post(format!("{}/api/signup", server.base_url))
        .json(&json!({ "username": "ada", "password": "hunter2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);

    // Duplicate username
    let resp = client
        .post(format!("{}/api/signup", server.base_url))
        .json(&json!({ "username": "ada", "password": "other" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Username already taken");

    // Login with correct password
    let resp = client
        .post(format!("{}/api/login", server.base_url))
        .json(&json!({ "username": "ada", "password": "hunter2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["username"], "ada");
    assert_eq!(body["user"]["role"], "user");
    let id = body["user"]["id"].as_i64().unwrap();
    assert_eq!(body["token"], format!("tok-{id}"));

    // Wrong password
    let resp = client
        .post(format!("{}/api/login", server.base_url))
        .json(&json!({ "username": "ada", "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

// =============================================================================
// Job Listing Tests
// =============================================================================

#[tokio::test]
async fn test_job_crud_requires_admin() {
    let server = start_test_server().await;
    let client = reqwest::Client::new();
    let admin = seed_user(&server, "boss", "pw", Role::Admin).await;
    let user = seed_user(&server, "ada", "pw", Role::User).await;

    // No identity
    let resp = client
        .post(format!("{}/api/jobs", server.base_url))
        .json(&json!({ "company": "Acme", "role": "Engineer" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    // Non-admin identity
    let resp = client
        .post(format!("{}/api/jobs", server.base_url))
        .header("user-id", user.to_string())
        .json(&json!({ "company": "Acme", "role": "Engineer" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    // Admin create / update / delete
    let job_id = seed_job(&server, admin, "Acme", "Engineer").await;

    let resp = client
        .put(format!("{}/api/jobs/{}", server.base_url, job_id))
        .header("user-id", admin.to_string())
        .json(&json!({ "company": "Acme Corp", "role": "Senior Engineer" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["updated"], true);

    let resp = client
        .put(format!("{}/api/jobs/999", server.base_url))
        .header("user-id", admin.to_string())
        .json(&json!({ "company": "X", "role": "Y" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = client
        .delete(format!("{}/api/jobs/{}", server.base_url, job_id))
        .header("user-id", admin.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["deleted"], true);

    let resp = client
        .delete(format!("{}/api/jobs/{}", server.base_url, job_id))
        .header("user-id", admin.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_feed_merges_requester_status() {
    let server = start_test_server().await;
    let client = reqwest::Client::new();
    let admin = seed_user(&server, "boss", "pw", Role::Admin).await;
    let user = seed_user(&server, "ada", "pw", Role::User).await;
    let job_id = seed_job(&server, admin, "Acme", "Engineer").await;

    // User records an application
    let resp = client
        .post(format!("{}/api/jobs/{}/apply", server.base_url, job_id))
        .header("user-id", user.to_string())
        .json(&json!({ "status": "Applied", "dateApplied": "2026-02-01", "notes": "sent CV" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    // Anonymous feed shows defaults
    let resp = client
        .get(format!("{}/api/jobs", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body[0]["company"], "Acme");
    assert_eq!(body[0]["status"], "Not Applied");
    assert_eq!(body[0]["applicationId"], Value::Null);

    // Authenticated feed carries the user's state
    let resp = client
        .get(format!("{}/api/jobs", server.base_url))
        .header("user-id", user.to_string())
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body[0]["status"], "Applied");
    assert_eq!(body[0]["dateApplied"], "2026-02-01");
    assert_eq!(body[0]["notes"], "sent CV");
    assert!(body[0]["applicationId"].is_i64());

    // Another user still sees defaults
    let other = seed_user(&server, "bob", "pw", Role::User).await;
    let resp = client
        .get(format!("{}/api/jobs", server.base_url))
        .header("user-id", other.to_string())
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body[0]["status"], "Not Applied");
}

// =============================================================================
// Application Tests
// =============================================================================

#[tokio::test]
async fn test_apply_upserts_per_user_per_job() {
    let server = start_test_server().await;
    let client = reqwest::Client::new();
    let admin = seed_user(&server, "boss", "pw", Role::Admin).await;
    let user = seed_user(&server, "ada", "pw", Role::User).await;
    let job_id = seed_job(&server, admin, "Acme", "Engineer").await;

    // Requires identity
    let resp = client
        .post(format!("{}/api/jobs/{}/apply", server.base_url, job_id))
        .json(&json!({ "status": "Applied" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    // Unknown job
    let resp = client
        .post(format!("{}/api/jobs/999/apply", server.base_url))
        .header("user-id", user.to_string())
        .json(&json!({ "status": "Applied" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    // Unknown status string
    let resp = client
        .post(format!("{}/api/jobs/{}/apply", server.base_url, job_id))
        .header("user-id", user.to_string())
        .json(&json!({ "status": "Ghosted" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // First apply creates
    let resp = client
        .post(format!("{}/api/jobs/{}/apply", server.base_url, job_id))
        .header("user-id", user.to_string())
        .json(&json!({ "status": "Wishlist" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let created: Value = resp.json().await.unwrap();
    let app_id = created["id"].as_i64().unwrap();

    // Second apply updates the same row
    let resp = client
        .post(format!("{}/api/jobs/{}/apply", server.base_url, job_id))
        .header("user-id", user.to_string())
        .json(&json!({ "status": "Interview", "notes": "on-site" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let updated: Value = resp.json().await.unwrap();
    assert_eq!(updated["id"], app_id);
    assert_eq!(updated["updated"], true);

    // Status endpoint also upserts
    let resp = client
        .put(format!(
            "{}/api/applications/{}/status",
            server.base_url, job_id
        ))
        .header("user-id", user.to_string())
        .json(&json!({ "status": "Offer" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let stored = server
        .stores
        .applications
        .find(user, job_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status.to_string(), "Offer");
}

// =============================================================================
// Legacy Application Tests
// =============================================================================

#[tokio::test]
async fn test_legacy_application_lifecycle() {
    let server = start_test_server().await;
    let client = reqwest::Client::new();
    let user = seed_user(&server, "ada", "pw", Role::User).await;
    let other = seed_user(&server, "bob", "pw", Role::User).await;
    let admin = seed_user(&server, "boss", "pw", Role::Admin).await;

    // Requires identity
    let resp = client
        .post(format!("{}/api/applications", server.base_url))
        .json(&json!({ "company": "Initech", "role": "Dev" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    // Create
    let resp = client
        .post(format!("{}/api/applications", server.base_url))
        .header("user-id", user.to_string())
        .json(&json!({
            "company": "Initech",
            "role": "Dev",
            "dateApplied": "2026-01-15",
            "notes": "referral"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    let entry_id = body["id"].as_i64().unwrap();

    // Same company + role again refreshes the entry instead of duplicating
    let resp = client
        .post(format!("{}/api/applications", server.base_url))
        .header("user-id", user.to_string())
        .json(&json!({ "company": "Initech", "role": "Dev", "location": "Remote" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["id"], entry_id);
    assert_eq!(body["updated"], true);

    // Scoped listing
    let resp = client
        .get(format!("{}/api/applications", server.base_url))
        .header("user-id", user.to_string())
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["company"], "Initech");
    assert_eq!(body[0]["location"], "Remote");

    let resp = client
        .get(format!("{}/api/applications", server.base_url))
        .header("user-id", other.to_string())
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body.as_array().unwrap().len(), 0);

    // Another user cannot touch the entry
    let resp = client
        .put(format!("{}/api/applications/{}", server.base_url, entry_id))
        .header("user-id", other.to_string())
        .json(&json!({ "status": "Rejected" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    // The owner can update its status
    let resp = client
        .put(format!("{}/api/applications/{}", server.base_url, entry_id))
        .header("user-id", user.to_string())
        .json(&json!({ "status": "Interview" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // An admin can delete it
    let resp = client
        .delete(format!("{}/api/applications/{}", server.base_url, entry_id))
        .header("user-id", admin.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = client
        .delete(format!("{}/api/applications/{}", server.base_url, entry_id))
        .header("user-id", user.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

// =============================================================================
// Cascade Tests
// =============================================================================

#[tokio::test]
async fn test_deleting_job_removes_applications() {
    let server = start_test_server().await;
    let client = reqwest::Client::new();
    let admin = seed_user(&server, "boss", "pw", Role::Admin).await;
    let user = seed_user(&server, "ada", "pw", Role::User).await;
    let job_id = seed_job(&server, admin, "Acme", "Engineer").await;

    let resp = client
        .post(format!("{}/api/jobs/{}/apply", server.base_url, job_id))
        .header("user-id", user.to_string())
        .json(&json!({ "status": "Applied" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let resp = client
        .delete(format!("{}/api/jobs/{}", server.base_url, job_id))
        .header("user-id", admin.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    assert!(server
        .stores
        .applications
        .find(user, job_id)
        .await
        .unwrap()
        .is_none());
}
