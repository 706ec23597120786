//! `parcours`: HTTP backend for guided multi-day programs.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use services::{AppServices, Clock};
use tracing::info;
use web::{AppState, build_router};

mod config;
mod db;
mod seed;

use config::{AppConfig, FileConfig, Overrides};

#[derive(Debug, Parser)]
#[command(name = "parcours", version, about)]
struct Cli {
    /// TOML configuration file (defaults to ./parcours.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database URL.
    #[arg(long = "db", env = "PARCOURS_DB_URL", global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API (default).
    Serve {
        /// Listen address, e.g. 127.0.0.1:8080.
        #[arg(long, env = "PARCOURS_BIND")]
        bind: Option<String>,
    },
    /// Create and publish the sample 7-day program.
    Seed,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

async fn open_services(config: &AppConfig) -> Result<AppServices> {
    let db_url = db::normalize_sqlite_url(&config.database_url);
    db::prepare_sqlite_file(&db_url)?;
    info!(database_url = %db_url, "opening database");
    AppServices::new_sqlite(&db_url, Clock::system(), config.service_options())
        .await
        .context("failed to open storage")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

async fn serve(config: AppConfig) -> Result<()> {
    let services = open_services(&config).await?;
    let app = build_router(AppState::new(services.clone()));

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("cannot bind {}", config.bind))?;
    info!("listening on http://{}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let flushed = services.autosaver().flush().await;
    info!(flushed, "pending drafts written");
    Ok(())
}

async fn run_seed(config: AppConfig) -> Result<()> {
    let services = open_services(&config).await?;
    match seed::seed_sample_program(&services.catalog()).await? {
        Some(slug) => info!(program = %slug, "seed complete"),
        None => info!("nothing to seed"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    info!("starting parcours v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let file = FileConfig::load(cli.config.as_deref())?;
    let command = cli.command.unwrap_or(Command::Serve { bind: None });
    let bind = match &command {
        Command::Serve { bind } => bind.clone(),
        Command::Seed => None,
    };
    let config = AppConfig::resolve(
        Overrides {
            bind,
            database_url: cli.database_url,
        },
        file,
    );

    match command {
        Command::Serve { .. } => serve(config).await,
        Command::Seed => run_seed(config).await,
    }
}
