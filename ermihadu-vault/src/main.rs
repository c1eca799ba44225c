//! ermihadu-vault: the family items vault service
//!
//! Serves the item list and upload form, keeping items in a Google
//! spreadsheet and images/audio in Google Drive.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};

use ermihadu_common::config::{ensure_root_folder, resolve_root_folder, LoggingConfig, TomlConfig};
use ermihadu_common::events::EventBus;
use ermihadu_common::People;
use ermihadu_vault::{build_router, db, services, storage, AppState};

#[derive(Parser, Debug)]
#[command(name = "ermihadu-vault")]
#[command(about = "Family memory vault backed by Google Sheets and Drive")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "ERMIHADU_CONFIG")]
    config: Option<PathBuf>,

    /// Folder holding the local settings database
    #[arg(short, long, env = "ERMIHADU_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "ERMIHADU_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(short, long, env = "ERMIHADU_BIND")]
    bind: Option<String>,
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

    match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Opening log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (mut config, config_notice) = TomlConfig::load(args.config.as_deref());
    config.apply_env_overrides();

    init_tracing(&config.logging)?;

    // Build identification first, before any network or database delay
    info!(
        "Starting ERMIHADU vault (ermihadu-vault) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    config_notice.log();

    config.validate()?;

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), &config);
    let db_path = ensure_root_folder(&root_folder)?;
    info!("Database path: {}", db_path.display());

    let pool = db::init_database_pool(&db_path).await?;
    info!("✓ Connected to database");

    let backends = storage::connect_or_degrade(&config, &pool).await;

    let people = match &config.vault.people {
        Some(names) => People::new(names.iter().cloned()),
        None => People::default(),
    };

    let state = AppState::new(backends, people, EventBus::new(100));

    if let Err(e) = services::refresh_items(&state).await {
        warn!("Starting with an empty item list: {}", e);
    }

    let app = build_router(state);

    let bind = args.bind.unwrap_or(config.server.bind);
    let port = args.port.unwrap_or(config.server.port);
    let addr = format!("{}:{}", bind, port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Binding {}", addr))?;
    info!("ermihadu-vault listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
