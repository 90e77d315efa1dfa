//! Account repository
//!
//! `password_hash` is stored as given; hashing happens upstream.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, Row};

use crate::db::{Database, DbError, SqlParam};
use crate::models::{Email, Paginated, Pagination, Role, Username};
use crate::sql_params;

/// Account record. The hash never leaves the server.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: Username,
    pub email: Email,
    pub role: Role,
    pub password_hash: String,
}

#[derive(Debug, Clone, Default)]
pub struct AccountChanges {
    pub email: Option<Email>,
    pub role: Option<Role>,
    pub password_hash: Option<String>,
}

/// Account repository
pub struct AccountRepo<'a> {
    db: &'a Database,
}

impl<'a> AccountRepo<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub async fn list(
        &self,
        role: Option<Role>,
        page: Pagination,
    ) -> Result<Paginated<Account>, DbError> {
        let rows = self
            .db
            .query(
                r#"
                SELECT id, username, email, role, password_hash, created_at,
                       COUNT(*) OVER() AS total
                FROM accounts
                WHERE (? IS NULL OR role = ?)
                ORDER BY username
                LIMIT ? OFFSET ?
                "#,
                &sql_params![
                    role.map(|r| r.as_str()),
                    role.map(|r| r.as_str()),
                    page.limit(),
                    page.offset()
                ],
            )
            .await?;

        let total = match rows.first() {
            Some(row) => row.try_get::<i64, _>("total")?,
            None => 0,
        };
        let items = rows
            .iter()
            .map(Account::from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(page.wrap(items, total))
    }

    pub async fn get(&self, id: i64) -> Result<Account, DbError> {
        let row = self
            .db
            .query_optional(
                "SELECT id, username, email, role, password_hash, created_at \
                 FROM accounts WHERE id = ?",
                &[SqlParam::Int(id)],
            )
            .await?
            .ok_or_else(|| DbError::not_found("account", id))?;
        Ok(Account::from_row(&row)?)
    }

    pub async fn create(&self, account: NewAccount) -> Result<Account, DbError> {
        let outcome = self
            .db
            .execute(
                "INSERT INTO accounts (username, email, role, password_hash) VALUES (?, ?, ?, ?)",
                &sql_params![
                    account.username.as_str(),
                    account.email.as_str(),
                    account.role.as_str(),
                    account.password_hash
                ],
            )
            .await
            .map_err(|e| {
                e.or_conflict(format!(
                    "account '{}' already exists",
                    account.username.as_str()
                ))
            })?;

        tracing::info!(
            id = outcome.last_insert_id,
            username = %account.username.as_str(),
            role = %account.role,
            "account created"
        );
        self.get(outcome.last_insert_id as i64).await
    }

    pub async fn update(&self, id: i64, changes: AccountChanges) -> Result<Account, DbError> {
        let email = changes.email.as_ref().map(|e| e.as_str().to_owned());
        self.db
            .execute(
                "UPDATE accounts SET \
                 email = COALESCE(?, email), \
                 role = COALESCE(?, role), \
                 password_hash = COALESCE(?, password_hash) \
                 WHERE id = ?",
                &sql_params![
                    email,
                    changes.role.map(|r| r.as_str()),
                    changes.password_hash,
                    id
                ],
            )
            .await
            .map_err(|e| e.or_conflict("email already in use"))?;
        self.get(id).await
    }

    /// Delete an account and its enrollments, releasing the seats.
    pub async fn delete(&self, id: i64) -> Result<(), DbError> {
        self.db
            .transaction(move |conn| {
                Box::pin(async move {
                    sqlx::query(
                        "UPDATE courses c JOIN enrollments e ON e.course_id = c.id \
                         SET c.enrolled = GREATEST(c.enrolled - 1, 0) \
                         WHERE e.account_id = ?",
                    )
                    .bind(id)
                    .execute(&mut *conn)
                    .await?;
                    sqlx::query("DELETE FROM enrollments WHERE account_id = ?")
                        .bind(id)
                        .execute(&mut *conn)
                        .await?;
                    let done = sqlx::query("DELETE FROM accounts WHERE id = ?")
                        .bind(id)
                        .execute(&mut *conn)
                        .await?;
                    if done.rows_affected() == 0 {
                        return Err(DbError::not_found("account", id));
                    }
                    Ok(())
                })
            })
            .await?;
        tracing::info!(id, "account deleted");
        Ok(())
    }
}
