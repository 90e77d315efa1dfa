//! Data-access error type and transient-failure classification

use std::io;

use sqlx::mysql::MySqlDatabaseError;

/// MySQL error numbers that mean the connection dropped under us:
/// 2006 server has gone away, 2013 lost connection during query,
/// 1927 connection killed.
const CONNECTION_LOST_CODES: &[u16] = &[2006, 2013, 1927];

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid database configuration: {0}")]
    Config(String),
}

impl DbError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Whether this failure is a dropped connection that is safe to retry.
    ///
    /// Pool timeouts, constraint violations and syntax errors are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Sqlx(err) => is_connection_lost(err),
            _ => false,
        }
    }

    /// Whether the database could not be reached at all: a dropped
    /// connection or an exhausted pool.
    pub fn is_unavailable(&self) -> bool {
        self.is_transient() || matches!(self, Self::Sqlx(sqlx::Error::PoolTimedOut))
    }

    /// Whether the server rejected the statement for a duplicate key.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::Sqlx(sqlx::Error::Database(db)) => db.is_unique_violation(),
            _ => false,
        }
    }

    /// Map a duplicate-key rejection to `Conflict`, leaving other errors alone.
    pub fn or_conflict(self, message: impl Into<String>) -> Self {
        if self.is_unique_violation() {
            Self::Conflict(message.into())
        } else {
            self
        }
    }
}

fn is_connection_lost(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(io_err) => matches!(
            io_err.kind(),
            io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::BrokenPipe
                | io::ErrorKind::UnexpectedEof
                | io::ErrorKind::NotConnected
        ),
        sqlx::Error::Database(db) => db
            .try_downcast_ref::<MySqlDatabaseError>()
            .map(|e| CONNECTION_LOST_CODES.contains(&e.number()))
            .unwrap_or(false),
        _ => false,
    }
}
