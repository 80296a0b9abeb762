//! ecosort-web - waste classification web service
//!
//! Accepts image uploads, asks the vision service to describe them, classifies
//! the result as organic/inorganic waste and keeps a browsable history.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;

use ecosort_common::config::{load_toml_config, CompiledDefaults};
use ecosort_common::logging::init_tracing;
use ecosort_web::classifier::Classifier;
use ecosort_web::config::{CliOverrides, ServiceConfig};
use ecosort_web::db::{init_database_pool, HistoryStore};
use ecosort_web::vision::AzureVisionClient;
use ecosort_web::{build_router, AppState};

/// Command-line arguments for ecosort-web
#[derive(Parser, Debug)]
#[command(name = "ecosort-web")]
#[command(about = "Waste classification web service")]
#[command(version)]
struct Args {
    /// Path to config.toml
    #[arg(short, long, env = "ECOSORT_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "ECOSORT_PORT")]
    port: Option<u16>,

    /// Address to bind to
    #[arg(short, long, env = "ECOSORT_BIND_ADDRESS")]
    bind: Option<String>,

    /// Path to the SQLite database
    #[arg(short, long, env = "ECOSORT_DATABASE")]
    database: Option<PathBuf>,

    /// Directory for staging uploads
    #[arg(long, env = "ECOSORT_UPLOAD_DIR")]
    upload_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // The logging section lives in the TOML file, so it is read first
    let (toml_config, config_source) = load_toml_config(args.config.as_deref())?;
    init_tracing(&toml_config.logging)?;

    info!(
        "Starting EcoSort (ecosort-web) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    config_source.log();

    let cli = CliOverrides {
        port: args.port,
        bind_address: args.bind,
        database_path: args.database,
        upload_dir: args.upload_dir,
    };
    let config = ServiceConfig::resolve(cli, &toml_config, &CompiledDefaults::for_current_platform())
        .context("Invalid configuration")?;

    info!("Database path: {}", config.database_path.display());
    info!("Upload directory: {}", config.uploads.upload_dir.display());
    std::fs::create_dir_all(&config.uploads.upload_dir).with_context(|| {
        format!(
            "Failed to create upload directory {}",
            config.uploads.upload_dir.display()
        )
    })?;

    let pool = init_database_pool(&config.database_path)
        .await
        .context("Failed to open database")?;
    let history = HistoryStore::new(pool);
    info!("✓ Database ready ({} records)", history.count().await?);

    let classifier = Classifier::from_config(&config.keywords)?;
    info!(
        "Classifier ready: {} organic / {} inorganic keywords",
        classifier.organic_keywords().len(),
        classifier.inorganic_keywords().len()
    );

    let vision = AzureVisionClient::new(config.vision.clone())
        .context("Failed to create vision client")?;

    let addr = config.socket_addr()?;
    let state = AppState::new(history, classifier, Arc::new(vision), config.uploads.clone());
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("ecosort-web listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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
