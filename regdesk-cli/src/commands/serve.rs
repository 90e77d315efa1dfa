//! HTTP server command
//!
//! Boots the analytics aggregator and database pool, then serves the API
//! until Ctrl+C or SIGTERM.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;

use regdesk_core::{AnalyticsConfig, AnalyticsHandle};
use regdesk_server::db::{Database, DbConfig};
use regdesk_server::http::{run_server, AppState, ServerConfig};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (default: 127.0.0.1:3030)
    #[arg(long, short = 'b', env = "REGDESK_BIND")]
    pub bind: Option<SocketAddr>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Database URL (overrides DB_HOST/DB_USER/... variables)
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Keep at most this many registration history records in memory
    #[arg(long, env = "REGDESK_HISTORY_CAPACITY")]
    pub history_capacity: Option<usize>,
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let mut db_config = DbConfig::from_env().context("Invalid database configuration")?;
    if let Some(url) = args.database_url {
        db_config.url = Some(url);
    }

    let mut server_config = ServerConfig::from_env().context("Invalid server configuration")?;
    if let Some(bind) = args.bind {
        server_config.bind_addr = bind;
    }
    server_config.cors_permissive |= args.cors_permissive;

    let mut analytics_config =
        AnalyticsConfig::from_env().context("Invalid analytics configuration")?;
    if args.history_capacity.is_some() {
        analytics_config.history_capacity = args.history_capacity;
    }

    tracing::info!(
        bind = %server_config.bind_addr,
        history_capacity = ?analytics_config.history_capacity,
        "Starting regdesk server"
    );

    let db = Database::connect(&db_config).context("Failed to create database pool")?;
    let state = AppState::new(db, AnalyticsHandle::new(&analytics_config));

    // Run server (blocks until shutdown)
    run_server(state, server_config)
        .await
        .context("Server error")?;

    Ok(())
}
