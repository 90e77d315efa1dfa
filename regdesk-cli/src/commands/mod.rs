//! Command implementations for the regdesk CLI

pub mod check_db;
pub mod config;
pub mod serve;

pub use check_db::run_check_db;
pub use config::run_config;
pub use serve::run_serve;
