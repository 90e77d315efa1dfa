//! Scoped transactions
//!
//! `scoped` runs a unit of work against an open transaction, commits on
//! `Ok`, rolls back on `Err`, and always drops the transaction before
//! returning so the connection goes back to the pool on every path.

use async_trait::async_trait;
use futures::future::BoxFuture;
use sqlx::{MySql, MySqlConnection, Transaction};

use super::error::DbError;

/// Commit/rollback control over an open transaction.
#[async_trait]
pub trait TxControl: Send + Sized {
    /// Connection type handed to the unit of work
    type Conn: Send;

    fn conn(&mut self) -> &mut Self::Conn;

    async fn commit(self) -> Result<(), DbError>;

    async fn rollback(self) -> Result<(), DbError>;
}

#[async_trait]
impl TxControl for Transaction<'static, MySql> {
    type Conn = MySqlConnection;

    fn conn(&mut self) -> &mut MySqlConnection {
        &mut **self
    }

    async fn commit(self) -> Result<(), DbError> {
        Transaction::commit(self).await.map_err(DbError::from)
    }

    async fn rollback(self) -> Result<(), DbError> {
        Transaction::rollback(self).await.map_err(DbError::from)
    }
}

/// Run `work` inside `tx`.
///
/// A failing unit of work is rolled back and its own error is returned; a
/// rollback failure is only logged.
pub async fn scoped<C, T, F>(mut tx: C, work: F) -> Result<T, DbError>
where
    C: TxControl,
    F: for<'c> FnOnce(&'c mut C::Conn) -> BoxFuture<'c, Result<T, DbError>>,
{
    match work(tx.conn()).await {
        Ok(value) => {
            tx.commit().await?;
            tracing::debug!("transaction committed");
            Ok(value)
        }
        Err(err) => {
            tracing::warn!(error = %err, "unit of work failed, rolling back");
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!(error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    }
}
