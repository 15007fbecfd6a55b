//! Jobtrack binary entry point.
//!
//! Core functionality is provided by the `jobtrack` library crate.

use clap::Parser;
use jobtrack::{
    auth,
    config::AppConfig,
    db,
    schema::init_schema,
    server::{create_router, AppState},
    store::Stores,
};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Jobtrack - Job Application Tracker
#[derive(Parser, Debug)]
#[command(name = "jobtrack", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        default_value = "configs/config.yaml",
        env = "JOBTRACK_CONFIG"
    )]
    config: String,

    /// Server bind address (overrides config file)
    #[arg(long, env = "JOBTRACK_SERVER_BIND")]
    server_bind: Option<String>,

    /// Server port (overrides config file)
    #[arg(long, env = "JOBTRACK_SERVER_PORT")]
    server_port: Option<u16>,

    /// PostgreSQL connection URL; when set, the networked engine is used
    /// instead of embedded SQLite (overrides config file)
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// SQLite database file path (overrides config file)
    #[arg(long, env = "JOBTRACK_SQLITE_PATH")]
    sqlite_path: Option<String>,

    /// Admin account username to create at startup (overrides config file)
    #[arg(long, env = "ADMIN_USERNAME")]
    admin_username: Option<String>,

    /// Admin account password to create at startup (overrides config file)
    #[arg(long, env = "ADMIN_PASSWORD")]
    admin_password: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,jobtrack=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Jobtrack - Job Application Tracker");

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration from file (missing file means defaults)
    tracing::info!("Loading configuration from: {}", cli.config);
    let mut config = AppConfig::load_or_default(&cli.config)?;

    // Apply CLI/env overrides (CLI > ENV > config file)
    if let Some(bind) = cli.server_bind {
        config.server.bind = bind;
    }
    if let Some(port) = cli.server_port {
        config.server.port = port;
    }
    if let Some(url) = cli.database_url {
        config.database.url = Some(url);
    }
    if let Some(path) = cli.sqlite_path {
        config.database.sqlite_path = path;
    }
    if let Some(username) = cli.admin_username {
        config.admin.username = Some(username);
    }
    if let Some(password) = cli.admin_password {
        config.admin.password = Some(password);
    }
    config.validate()?;

    // Select and connect the storage engine; unreachable storage is fatal
    let db = db::connect(&config.database).await?;
    init_schema(&db).await?;

    let stores = Stores::new(&db);

    // Admin bootstrap: explicit configuration only, no default credential
    match (&config.admin.username, &config.admin.password) {
        (Some(username), Some(password)) => {
            let hash = auth::hash_password(password)?;
            if stores.users.ensure_admin(username, &hash).await? {
                tracing::info!(username = %username, "admin account created");
            } else {
                tracing::info!(username = %username, "admin account already exists");
            }
        }
        _ => {
            tracing::warn!(
                "no admin credentials configured; job management endpoints are unusable \
                 until an admin account exists"
            );
        }
    }

    // Create web server state
    let app_state = AppState {
        db: db.clone(),
        stores,
    };

    // Build Axum router
    let app = create_router(app_state);

    // Parse bind address
    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;

    tracing::info!("Web server listening on: http://{}", addr);
    tracing::info!("Press Ctrl+C to shutdown");

    // Start server with graceful shutdown
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Closing storage...");
    db.close().await;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Setup graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal");
        }
    }
}
