//! regdesk CLI - course registration backend
//!
//! This is the main entry point for the regdesk command-line tool, which provides:
//! - The HTTP API server (`serve`)
//! - A database connectivity check (`check-db`)
//! - A dump of the effective configuration (`config`)

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;
mod tracing_setup;

use tracing_setup::{init_tracing, TracingConfig};

#[derive(Parser, Debug)]
#[command(
    name = "regdesk",
    author,
    version,
    about = "Course registration backend with live registration analytics",
    long_about = "Serve the course registration API over a pooled MySQL connection. \
                  Registration attempts, queue times and session load are aggregated \
                  in memory for dashboards."
)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Check that the database is reachable
    CheckDb(commands::check_db::CheckDbArgs),
    /// Show the effective configuration (secrets redacted)
    Config(commands::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&TracingConfig { debug: cli.debug }).ok();
    config::load_dotenv();

    match cli.command {
        Commands::Serve(args) => commands::run_serve(args).await?,
        Commands::CheckDb(args) => commands::run_check_db(args).await?,
        Commands::Config(args) => commands::run_config(args)?,
    }
    Ok(())
}
