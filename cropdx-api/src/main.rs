//! cropdx-api - HTTP service for the crop disease detection demo
//!
//! Configuration is resolved from CLI flags, environment variables, an
//! optional TOML file and compiled defaults, in that order.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::Request;
use axum::ServiceExt;
use clap::{Parser, Subcommand};
use cropdx_common::auth::{hash_password, prune_periodically, validate_password};
use cropdx_common::config::{
    config_file_path, load_toml_config, ConfigOverrides, ServerConfig, TomlConfig,
};
use cropdx_common::db::catalog::seed_catalog_if_empty;
use cropdx_common::db::tokens::revoke_user_tokens;
use cropdx_common::db::{init_database, users, validate_username};
use cropdx_api::{build_app, AppState};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often expired tokens are deleted
const TOKEN_PRUNE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Command-line arguments for cropdx-api
#[derive(Parser, Debug)]
#[command(name = "cropdx-api")]
#[command(about = "Crop disease detection demo service")]
#[command(version)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "CROPDX_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "CROPDX_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "CROPDX_PORT")]
    port: Option<u16>,

    /// Folder for the database and uploads
    #[arg(long, env = "CROPDX_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, env = "CROPDX_DATABASE")]
    database: Option<PathBuf>,

    /// Folder uploaded images are stored under
    #[arg(long, env = "CROPDX_MEDIA_ROOT")]
    media_root: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "CROPDX_LOG_LEVEL")]
    log_level: Option<String>,

    /// Insert the default disease catalog at startup if it is empty
    #[arg(long)]
    seed_catalog: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Create a staff user, or promote and reset an existing one
    CreateStaff {
        #[arg(long)]
        username: String,
        #[arg(long, env = "CROPDX_STAFF_PASSWORD")]
        password: String,
    },
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            host: self.host.clone(),
            port: self.port,
            data_dir: self.data_dir.clone(),
            database_path: self.database.clone(),
            media_root: self.media_root.clone(),
            log_level: self.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Resolve configuration before tracing so the configured level applies
    let config_path = config_file_path(args.config.as_deref())?;
    let toml = match &config_path {
        Some(path) => load_toml_config(path)?,
        None => TomlConfig::default(),
    };
    let config = ServerConfig::resolve(&args.overrides(), toml);

    init_tracing(&config.logging.level);

    info!(
        "Starting CropDx API (cropdx-api) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match &config_path {
        Some(path) => info!("Configuration file: {}", path.display()),
        None => warn!("No configuration file found, using defaults"),
    }
    config.validate().context("Invalid configuration")?;

    match args.command {
        Some(Command::CreateStaff { username, password }) => {
            create_staff(&config, &username, &password).await
        }
        Some(Command::Serve) | None => serve(config, args.seed_catalog).await,
    }
}

fn init_tracing(level: &str) {
    let default_filter = format!(
        "cropdx_api={level},cropdx_common={level},tower_http={level}",
        level = level
    );

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn serve(config: ServerConfig, seed_catalog: bool) -> Result<()> {
    config
        .ensure_directories()
        .context("Failed to create data directories")?;

    info!("Database path: {}", config.database_path.display());
    info!("Media root: {}", config.media_root.display());

    let pool = init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;
    info!("✓ Database ready");

    // First pass runs at startup, then hourly
    let pruner = tokio::spawn(prune_periodically(pool.clone(), TOKEN_PRUNE_INTERVAL));

    if seed_catalog {
        let inserted = seed_catalog_if_empty(&pool).await?;
        info!("Catalog seeding inserted {} diseases", inserted);
    }

    let bind_address = config.bind_address();
    let state = AppState::new(pool, config).context("Failed to build application state")?;
    info!("Translation backend: {}", state.translator.name());
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_address))?;
    info!("cropdx-api listening on http://{}", bind_address);
    info!("Health check: http://{}/health", bind_address);

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    pruner.abort();
    info!("Server shutdown complete");
    Ok(())
}

async fn create_staff(config: &ServerConfig, username: &str, password: &str) -> Result<()> {
    validate_username(username)?;
    validate_password(password, username)?;

    config
        .ensure_directories()
        .context("Failed to create data directories")?;
    let pool = init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    let password_hash = hash_password(password)?;
    let user = match users::find_by_username(&pool, username).await? {
        Some(existing) => {
            users::set_password_hash(&pool, existing.id, &password_hash).await?;
            let revoked = revoke_user_tokens(&pool, existing.id).await?;
            info!(
                "Updated password for existing user {} ({} sessions revoked)",
                username, revoked
            );
            existing
        }
        None => users::create_user(&pool, username, &password_hash, false).await?,
    };
    users::set_staff(&pool, user.id, true).await?;

    info!("✓ {} (id {}) is now staff", username, user.id);
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
