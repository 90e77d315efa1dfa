//! Enrollment repository
//!
//! Seat accounting is transactional: the course row is locked with
//! `FOR UPDATE`, so `enrolled` never exceeds `capacity` under concurrency.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, Row};

use crate::db::{Database, DbError, SqlParam};

/// Enrollment record
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Enrollment {
    pub id: i64,
    pub account_id: i64,
    pub course_id: i64,
    pub created_at: DateTime<Utc>,
}

/// What a successful enrollment reports back
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrollmentReceipt {
    pub enrollment: Enrollment,
    pub course_code: String,
    pub time_slot: Option<String>,
    pub seats_left: i32,
}

/// Enrollment repository
pub struct EnrollmentRepo<'a> {
    db: &'a Database,
}

impl<'a> EnrollmentRepo<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Enroll an account in a course.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the account or course does not exist
    /// - `Conflict` if the course is full or the account is already enrolled
    pub async fn enroll(&self, account_id: i64, course_id: i64) -> Result<EnrollmentReceipt, DbError> {
        let receipt = self
            .db
            .transaction(move |conn| {
                Box::pin(async move {
                    let account = sqlx::query("SELECT id FROM accounts WHERE id = ?")
                        .bind(account_id)
                        .fetch_optional(&mut *conn)
                        .await?;
                    if account.is_none() {
                        return Err(DbError::not_found("account", account_id));
                    }

                    let course = sqlx::query(
                        "SELECT code, capacity, enrolled, time_slot FROM courses WHERE id = ? FOR UPDATE",
                    )
                    .bind(course_id)
                    .fetch_optional(&mut *conn)
                    .await?
                    .ok_or_else(|| DbError::not_found("course", course_id))?;

                    let code: String = course.try_get("code")?;
                    let capacity: i32 = course.try_get("capacity")?;
                    let enrolled: i32 = course.try_get("enrolled")?;
                    let time_slot: Option<String> = course.try_get("time_slot")?;

                    if enrolled >= capacity {
                        return Err(DbError::Conflict(format!("course '{code}' is full")));
                    }

                    let inserted = sqlx::query(
                        "INSERT INTO enrollments (account_id, course_id) VALUES (?, ?)",
                    )
                    .bind(account_id)
                    .bind(course_id)
                    .execute(&mut *conn)
                    .await
                    .map_err(|e| {
                        DbError::from(e).or_conflict(format!("already enrolled in '{code}'"))
                    })?;

                    sqlx::query("UPDATE courses SET enrolled = enrolled + 1 WHERE id = ?")
                        .bind(course_id)
                        .execute(&mut *conn)
                        .await?;

                    let row = sqlx::query(
                        "SELECT id, account_id, course_id, created_at FROM enrollments WHERE id = ?",
                    )
                    .bind(inserted.last_insert_id())
                    .fetch_one(&mut *conn)
                    .await?;

                    Ok(EnrollmentReceipt {
                        enrollment: Enrollment::from_row(&row)?,
                        course_code: code,
                        time_slot,
                        seats_left: capacity - enrolled - 1,
                    })
                })
            })
            .await?;

        tracing::info!(
            account_id,
            course_id,
            course = %receipt.course_code,
            seats_left = receipt.seats_left,
            "enrollment committed"
        );
        Ok(receipt)
    }

    /// Drop an enrollment and release its seat.
    pub async fn unenroll(&self, account_id: i64, course_id: i64) -> Result<(), DbError> {
        self.db
            .transaction(move |conn| {
                Box::pin(async move {
                    let done = sqlx::query(
                        "DELETE FROM enrollments WHERE account_id = ? AND course_id = ?",
                    )
                    .bind(account_id)
                    .bind(course_id)
                    .execute(&mut *conn)
                    .await?;
                    if done.rows_affected() == 0 {
                        return Err(DbError::not_found(
                            "enrollment",
                            format!("{account_id}/{course_id}"),
                        ));
                    }
                    sqlx::query(
                        "UPDATE courses SET enrolled = GREATEST(enrolled - 1, 0) WHERE id = ?",
                    )
                    .bind(course_id)
                    .execute(&mut *conn)
                    .await?;
                    Ok(())
                })
            })
            .await?;
        tracing::info!(account_id, course_id, "enrollment dropped");
        Ok(())
    }

    /// Enrollments for a course, oldest first.
    pub async fn list_for_course(&self, course_id: i64) -> Result<Vec<Enrollment>, DbError> {
        let rows = self
            .db
            .query(
                "SELECT id, account_id, course_id, created_at FROM enrollments \
                 WHERE course_id = ? ORDER BY created_at, id",
                &[SqlParam::Int(course_id)],
            )
            .await?;
        rows.iter()
            .map(|row| Enrollment::from_row(row).map_err(DbError::from))
            .collect()
    }
}
