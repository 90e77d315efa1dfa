//! Database layer - connection pool and repositories
//!
//! # Design Principles
//!
//! - One shared pool, sized by `DB_POOL_SIZE` - no Arc<Mutex<Connection>>
//! - Dropped connections retried with a fixed delay, everything else surfaces
//! - Multi-statement writes run inside `Database::transaction`
//! - Rely on DB constraints, handle conflicts - no check-then-insert

pub mod config;
pub mod error;
pub mod params;
pub mod pool;
pub mod repos;
pub mod retry;
pub mod tx;

pub use config::DbConfig;
pub use error::DbError;
pub use params::SqlParam;
pub use pool::{create_pool, Database, ExecOutcome, PoolStatus};
pub use retry::RetryPolicy;
pub use repos::*;
