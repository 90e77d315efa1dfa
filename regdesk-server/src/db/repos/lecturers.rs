//! Lecturer repository

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, Row};

use crate::db::{Database, DbError, SqlParam};
use crate::models::{Email, Paginated, Pagination};
use crate::sql_params;

/// Lecturer record with the number of courses they teach
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Lecturer {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub department: Option<String>,
    pub created_at: DateTime<Utc>,
    pub course_count: i64,
}

#[derive(Debug, Clone)]
pub struct NewLecturer {
    pub name: String,
    pub email: Email,
    pub department: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LecturerChanges {
    pub name: Option<String>,
    pub email: Option<Email>,
    pub department: Option<String>,
}

/// Lecturer repository
pub struct LecturerRepo<'a> {
    db: &'a Database,
}

impl<'a> LecturerRepo<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// List lecturers with course counts (LEFT JOIN, no N+1).
    pub async fn list(&self, page: Pagination) -> Result<Paginated<Lecturer>, DbError> {
        let rows = self
            .db
            .query(
                r#"
                SELECT l.id, l.name, l.email, l.department, l.created_at,
                       COUNT(c.id) AS course_count,
                       COUNT(*) OVER() AS total
                FROM lecturers l
                LEFT JOIN courses c ON c.lecturer_id = l.id
                GROUP BY l.id, l.name, l.email, l.department, l.created_at
                ORDER BY l.name
                LIMIT ? OFFSET ?
                "#,
                &sql_params![page.limit(), page.offset()],
            )
            .await?;

        let total = match rows.first() {
            Some(row) => row.try_get::<i64, _>("total")?,
            None => 0,
        };
        let items = rows
            .iter()
            .map(Lecturer::from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(page.wrap(items, total))
    }

    pub async fn get(&self, id: i64) -> Result<Lecturer, DbError> {
        let row = self
            .db
            .query_optional(
                r#"
                SELECT l.id, l.name, l.email, l.department, l.created_at,
                       COUNT(c.id) AS course_count
                FROM lecturers l
                LEFT JOIN courses c ON c.lecturer_id = l.id
                WHERE l.id = ?
                GROUP BY l.id, l.name, l.email, l.department, l.created_at
                "#,
                &[SqlParam::Int(id)],
            )
            .await?
            .ok_or_else(|| DbError::not_found("lecturer", id))?;
        Ok(Lecturer::from_row(&row)?)
    }

    pub async fn create(&self, lecturer: NewLecturer) -> Result<Lecturer, DbError> {
        let outcome = self
            .db
            .execute(
                "INSERT INTO lecturers (name, email, department) VALUES (?, ?, ?)",
                &sql_params![
                    lecturer.name,
                    lecturer.email.as_str(),
                    lecturer.department
                ],
            )
            .await
            .map_err(|e| {
                e.or_conflict(format!(
                    "lecturer with email '{}' already exists",
                    lecturer.email.as_str()
                ))
            })?;

        self.get(outcome.last_insert_id as i64).await
    }

    pub async fn update(&self, id: i64, changes: LecturerChanges) -> Result<Lecturer, DbError> {
        let email = changes.email.as_ref().map(|e| e.as_str().to_owned());
        self.db
            .execute(
                "UPDATE lecturers SET \
                 name = COALESCE(?, name), \
                 email = COALESCE(?, email), \
                 department = COALESCE(?, department) \
                 WHERE id = ?",
                &sql_params![changes.name, email, changes.department, id],
            )
            .await
            .map_err(|e| e.or_conflict("email already in use"))?;
        self.get(id).await
    }

    /// Delete a lecturer. Their courses keep running without one.
    pub async fn delete(&self, id: i64) -> Result<(), DbError> {
        self.db
            .transaction(move |conn| {
                Box::pin(async move {
                    sqlx::query("UPDATE courses SET lecturer_id = NULL WHERE lecturer_id = ?")
                        .bind(id)
                        .execute(&mut *conn)
                        .await?;
                    let done = sqlx::query("DELETE FROM lecturers WHERE id = ?")
                        .bind(id)
                        .execute(&mut *conn)
                        .await?;
                    if done.rows_affected() == 0 {
                        return Err(DbError::not_found("lecturer", id));
                    }
                    Ok(())
                })
            })
            .await?;
        tracing::info!(id, "lecturer deleted");
        Ok(())
    }
}
