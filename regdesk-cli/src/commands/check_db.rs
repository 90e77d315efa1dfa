//! Database connectivity check
//!
//! Exits non-zero when the pool cannot hand out a connection or the check
//! query fails after its retries.

use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde_json::json;

use regdesk_server::db::{Database, DbConfig};

/// Arguments for the check-db command
#[derive(Parser, Debug)]
pub struct CheckDbArgs {
    /// Database URL (overrides DB_HOST/DB_USER/... variables)
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Attempts for the check query when the connection drops
    #[arg(long, default_value_t = 3)]
    pub retries: u32,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run_check_db(args: CheckDbArgs) -> Result<()> {
    let mut config = DbConfig::from_env().context("Invalid database configuration")?;
    if let Some(url) = args.database_url {
        config.url = Some(url);
    }
    tracing::debug!(?config, "checking database");

    let db = Database::connect(&config).context("Failed to create database pool")?;
    let started = Instant::now();

    let reachable = db.test_connection().await;
    let rows = if reachable {
        Some(
            db.query_with_retries("SELECT 1", &[], args.retries)
                .await
                .context("Check query failed")?
                .len(),
        )
    } else {
        None
    };
    let elapsed_ms = started.elapsed().as_millis();
    let status = db.status();
    db.close().await;

    if args.json {
        let report = json!({
            "reachable": reachable,
            "target": target_label(&config),
            "rows": rows,
            "elapsed_ms": elapsed_ms,
            "pool": status,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if reachable {
        println!(
            "database {} reachable ({} ms, pool max {})",
            target_label(&config),
            elapsed_ms,
            status.max_connections
        );
    }

    if !reachable {
        bail!("database {} unreachable", target_label(&config));
    }
    Ok(())
}

/// Names the database being checked. A URL may carry credentials, so only
/// its source is named.
fn target_label(config: &DbConfig) -> String {
    if config.url.is_some() {
        "at DATABASE_URL".to_string()
    } else {
        format!(
            "{}@{}:{}/{}",
            config.user, config.host, config.port, config.database
        )
    }
}
