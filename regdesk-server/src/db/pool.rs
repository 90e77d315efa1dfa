//! Database connection pool management
//!
//! `Database` owns the sqlx `MySqlPool`. Callers reach it through
//! `query`/`execute` (retried on dropped connections) or `transaction`
//! (scoped commit/rollback). No raw connection escapes a single call.

use futures::future::BoxFuture;
use sqlx::mysql::{MySqlPoolOptions, MySqlRow};
use sqlx::{MySqlConnection, MySqlPool};

use super::config::DbConfig;
use super::error::DbError;
use super::params::{bind_all, SqlParam};
use super::retry::{self, RetryPolicy};
use super::tx;

/// Result of a write statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecOutcome {
    pub rows_affected: u64,
    pub last_insert_id: u64,
}

/// Pool occupancy for health reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct PoolStatus {
    pub size: u32,
    pub idle: usize,
    pub max_connections: u32,
}

/// Create a MySQL connection pool.
///
/// The pool connects lazily; use [`Database::test_connection`] at startup
/// to find out whether the server is reachable.
///
/// # Errors
///
/// Returns an error if the connection parameters are invalid.
pub fn create_pool(config: &DbConfig) -> Result<MySqlPool, DbError> {
    let options = config.connect_options()?;
    Ok(MySqlPoolOptions::new()
        .max_connections(config.pool_size)
        .acquire_timeout(config.acquire_timeout)
        .connect_lazy_with(options))
}

/// Pooled, retrying MySQL executor.
#[derive(Debug, Clone)]
pub struct Database {
    pool: MySqlPool,
    retry: RetryPolicy,
}

impl Database {
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            pool,
            retry: RetryPolicy::default(),
        }
    }

    /// Build the pool from configuration.
    pub fn connect(config: &DbConfig) -> Result<Self, DbError> {
        tracing::info!(
            host = %config.host,
            database = %config.database,
            pool_size = config.pool_size,
            ssl = config.ssl,
            "creating database pool"
        );
        Ok(Self::new(create_pool(config)?))
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Run a parameterized statement and return its rows.
    pub async fn query(&self, sql: &str, params: &[SqlParam]) -> Result<Vec<MySqlRow>, DbError> {
        self.query_with_retries(sql, params, self.retry.max_attempts)
            .await
    }

    /// `query` with an explicit attempt budget.
    pub async fn query_with_retries(
        &self,
        sql: &str,
        params: &[SqlParam],
        max_retries: u32,
    ) -> Result<Vec<MySqlRow>, DbError> {
        let policy = RetryPolicy {
            max_attempts: max_retries,
            ..self.retry
        };
        retry::run(policy, |_| async move {
            let rows = bind_all(sqlx::query(sql), params)
                .fetch_all(&self.pool)
                .await?;
            Ok(rows)
        })
        .await
    }

    /// Run a statement expected to return at most one row.
    pub async fn query_optional(
        &self,
        sql: &str,
        params: &[SqlParam],
    ) -> Result<Option<MySqlRow>, DbError> {
        Ok(self.query(sql, params).await?.into_iter().next())
    }

    /// Run a write statement.
    pub async fn execute(&self, sql: &str, params: &[SqlParam]) -> Result<ExecOutcome, DbError> {
        self.execute_with_retries(sql, params, self.retry.max_attempts)
            .await
    }

    pub async fn execute_with_retries(
        &self,
        sql: &str,
        params: &[SqlParam],
        max_retries: u32,
    ) -> Result<ExecOutcome, DbError> {
        let policy = RetryPolicy {
            max_attempts: max_retries,
            ..self.retry
        };
        retry::run(policy, |_| async move {
            let done = bind_all(sqlx::query(sql), params)
                .execute(&self.pool)
                .await?;
            Ok(ExecOutcome {
                rows_affected: done.rows_affected(),
                last_insert_id: done.last_insert_id(),
            })
        })
        .await
    }

    /// Run `work` in a transaction on one pooled connection.
    ///
    /// Commits when `work` returns `Ok`, rolls back when it returns `Err`
    /// and surfaces that error. The connection is released on every path.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let id = db.transaction(|conn| Box::pin(async move {
    ///     sqlx::query("UPDATE courses SET enrolled = enrolled + 1 WHERE id = ?")
    ///         .bind(course_id)
    ///         .execute(&mut *conn)
    ///         .await?;
    ///     Ok(course_id)
    /// })).await?;
    /// ```
    pub async fn transaction<T, F>(&self, work: F) -> Result<T, DbError>
    where
        F: for<'c> FnOnce(&'c mut MySqlConnection) -> BoxFuture<'c, Result<T, DbError>>,
    {
        let tx = self.pool.begin().await?;
        tx::scoped(tx, work).await
    }

    /// Acquire and immediately release one connection.
    pub async fn test_connection(&self) -> bool {
        match self.pool.acquire().await {
            Ok(conn) => {
                drop(conn);
                tracing::info!("database connection verified");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "database connection failed");
                false
            }
        }
    }

    pub fn status(&self) -> PoolStatus {
        PoolStatus {
            size: self.pool.size(),
            idle: self.pool.num_idle(),
            max_connections: self.pool.options().get_max_connections(),
        }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Integration tests require a real database
    // Run with: DB_HOST=... DB_USER=... cargo test -p regdesk-server -- --ignored

    async fn live_db() -> Database {
        let config = DbConfig::from_env().expect("database env");
        Database::connect(&config).expect("pool creation failed")
    }

    #[tokio::test]
    async fn lazy_pool_does_not_connect() {
        let db = Database::connect(&DbConfig::default()).unwrap();
        let status = db.status();
        assert_eq!(status.size, 0);
        assert_eq!(status.max_connections, 10);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn pool_acquires_connection() {
        let db = live_db().await;
        assert!(db.test_connection().await);

        let rows = db.query("SELECT ? + 1 AS n", &[SqlParam::Int(1)]).await.unwrap();
        let n: i64 = sqlx::Row::get(&rows[0], "n");
        assert_eq!(n, 2);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn failed_transaction_leaves_no_writes_and_frees_connection() {
        let db = live_db().await.with_retry_policy(RetryPolicy::new(1));
        db.execute("CREATE TABLE IF NOT EXISTS tx_scratch (v INT)", &[])
            .await
            .unwrap();
        db.execute("DELETE FROM tx_scratch", &[]).await.unwrap();

        let result: Result<(), _> = db
            .transaction(|conn| {
                Box::pin(async move {
                    sqlx::query("INSERT INTO tx_scratch (v) VALUES (1)")
                        .execute(&mut *conn)
                        .await?;
                    Err(DbError::Conflict("abort".into()))
                })
            })
            .await;
        assert!(matches!(result, Err(DbError::Conflict(_))));

        let rows = db.query("SELECT COUNT(*) AS n FROM tx_scratch", &[]).await.unwrap();
        let n: i64 = sqlx::Row::get(&rows[0], "n");
        assert_eq!(n, 0);
        assert!(db.test_connection().await);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn concurrent_pool_access() {
        let db = live_db().await;

        let handles: Vec<_> = (0..20_i64)
            .map(|i| {
                let db = db.clone();
                tokio::spawn(async move {
                    let rows = db.query("SELECT ? AS n", &[SqlParam::Int(i)]).await.expect("query failed");
                    sqlx::Row::get::<i64, _>(&rows[0], "n")
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.await.expect("task panicked"), i as i64);
        }
        assert!(db.status().size <= 10);
    }
}
