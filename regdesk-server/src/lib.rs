//! regdesk-server: HTTP API and resilient MySQL data access
//!
//! Exposes the registration analytics aggregator and the course, lecturer
//! and account tables over HTTP. Database access goes through [`db::Database`],
//! which retries dropped connections and scopes transactions.

pub mod db;
pub mod http;
pub mod models;

pub use db::{Database, DbConfig, DbError, RetryPolicy};
pub use http::{build_router, run_server, ApiError, AppState, ServerConfig, ServerError};
