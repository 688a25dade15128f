//! Artacore CMS - admin panel backend

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use artacore_api::{AppState, create_router};
use artacore_auth::{
    Authenticator, CredentialStore, GateConfig, JwtManager, RequestGate, hash_password,
    policy_from_name,
};
use artacore_db::{Database, NewUser, UserRole};
use artacore_storage::LocalStorage;
use config::{Config, LoggingConfig};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Artacore CMS - admin panel backend
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "ARTACORE_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "ARTACORE_PORT")]
    port: Option<u16>,

    /// JWT signing secret (overrides auth.jwt_secret)
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(&args.config)?;
    if let Some(secret) = args.jwt_secret {
        config.auth.jwt_secret = secret;
    }
    if config.auth.jwt_secret.is_empty() {
        bail!("JWT secret must not be empty");
    }

    init_logging(&config.logging);

    info!("Starting Artacore CMS v{}", env!("CARGO_PKG_VERSION"));

    if config.auth.has_insecure_secret() {
        warn!(
            "JWT secret is the default or shorter than {} bytes; set JWT_SECRET in production",
            config::MIN_SECRET_LENGTH
        );
    }

    // Create data directories
    if let Some(parent) = Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::create_dir_all(&config.storage.path).await?;

    // Initialize database
    let db_url = format!("sqlite:{}?mode=rwc", config.database.path);
    let db = Database::new(&db_url, config.database.max_connections)
        .await
        .with_context(|| format!("Failed to open database at {}", config.database.path))?;

    bootstrap_admin(&db, &config).await?;

    // Initialize storage backend
    let storage = Arc::new(
        LocalStorage::new(&config.storage.path, &config.storage.public_url_prefix).await?,
    );

    // Authentication
    let jwt = Arc::new(JwtManager::new(&config.auth.jwt_secret));
    let store: Arc<dyn CredentialStore> = Arc::new(db.clone());
    let authenticator = Arc::new(Authenticator::new(store, jwt.clone())?);
    let gate = Arc::new(RequestGate::new(
        jwt,
        GateConfig {
            api_prefix: config.auth.api_prefix.clone(),
            public_prefixes: config.auth.public_prefixes.clone(),
        },
    ));
    let policy = policy_from_name(&config.auth.policy)
        .ok_or_else(|| anyhow!("Unknown auth policy: {}", config.auth.policy))?;

    info!(
        "Gate guards {} (public: {:?}), policy: {}",
        config.auth.api_prefix, config.auth.public_prefixes, config.auth.policy
    );

    // Metrics
    let metrics_handle = if config.metrics.enabled {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        Some(Arc::new(handle))
    } else {
        None
    };

    let state = AppState::new(
        db,
        authenticator,
        gate,
        policy,
        storage,
        config.storage.public_url_prefix.clone(),
        config.server.max_upload_bytes,
        config.auth.allow_registration,
    );

    let app = create_router(state, metrics_handle).layer(TraceLayer::new_for_http());

    // Determine bind address
    let bind_addr = args.bind.unwrap_or(config.server.bind_address);
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", bind_addr, port).parse()?;

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Create the configured admin account if the users table is empty
async fn bootstrap_admin(db: &Database, config: &Config) -> Result<()> {
    if db.has_users().await? {
        return Ok(());
    }

    info!("Creating default admin user");
    let password_hash = hash_password(&config.auth.bootstrap_admin_password)?;
    db.insert_user(NewUser {
        email: config.auth.bootstrap_admin_email.clone(),
        password_hash,
        role: UserRole::Admin,
    })
    .await?;

    if config.auth.uses_default_admin_password() {
        warn!(
            "Default admin user created ({}) with the default password; change it",
            config.auth.bootstrap_admin_email
        );
    } else {
        info!("Admin user created ({})", config.auth.bootstrap_admin_email);
    }
    Ok(())
}

/// Initialize logging
fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bootstrap_admin_runs_once() {
        let db = Database::in_memory().await.unwrap();
        let mut config = Config::default();
        config.auth.bootstrap_admin_email = "root@example.com".to_string();
        config.auth.bootstrap_admin_password = "bootstrap-pass".to_string();

        bootstrap_admin(&db, &config).await.unwrap();
        let admin = db.get_user_by_email("root@example.com").await.unwrap().unwrap();
        assert_eq!(admin.role, UserRole::Admin);

        // Second run leaves the table alone
        config.auth.bootstrap_admin_email = "other@example.com".to_string();
        bootstrap_admin(&db, &config).await.unwrap();
        assert!(db.get_user_by_email("other@example.com").await.unwrap().is_none());
    }

    #[test]
    fn test_args_parse_overrides() {
        let args = Args::parse_from([
            "artacore-cms",
            "--config",
            "cms.toml",
            "--port",
            "8081",
            "--jwt-secret",
            "cli-secret",
        ]);
        assert_eq!(args.config, "cms.toml");
        assert_eq!(args.port, Some(8081));
        assert_eq!(args.jwt_secret.as_deref(), Some("cli-secret"));
    }
}
