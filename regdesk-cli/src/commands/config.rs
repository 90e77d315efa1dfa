//! Show the effective configuration after .env loading

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;

use regdesk_core::AnalyticsConfig;
use regdesk_server::db::DbConfig;
use regdesk_server::http::ServerConfig;

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Print as JSON instead of debug output
    #[arg(long)]
    pub json: bool,
}

pub fn run_config(args: ConfigArgs) -> Result<()> {
    let db = DbConfig::from_env().context("Invalid database configuration")?;
    let server = ServerConfig::from_env().context("Invalid server configuration")?;
    let analytics = AnalyticsConfig::from_env().context("Invalid analytics configuration")?;

    if args.json {
        let report = json!({
            "database": {
                "url": db.url.as_ref().map(|_| "<redacted>"),
                "host": db.host,
                "port": db.port,
                "user": db.user,
                "database": db.database,
                "pool_size": db.pool_size,
                "ssl": db.ssl,
                "acquire_timeout_secs": db.acquire_timeout.as_secs(),
            },
            "server": {
                "bind": server.bind_addr.to_string(),
                "cors_permissive": server.cors_permissive,
            },
            "analytics": {
                "history_capacity": analytics.history_capacity,
                "poll_interval_ms": analytics.poll_interval_ms,
            },
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        // DbConfig's Debug impl redacts the password and URL
        println!("{db:#?}");
        println!("{server:#?}");
        println!("{analytics:#?}");
    }
    Ok(())
}
