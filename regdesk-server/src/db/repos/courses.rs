//! Course repository
//!
//! - list: window COUNT for the total, single round trip
//! - create: relies on the unique index on `code` (no check-then-insert)
//! - update: partial, COALESCE keeps omitted columns

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, Row};

use crate::db::{Database, DbError, SqlParam};
use crate::models::{CourseCode, Paginated, Pagination};
use crate::sql_params;

const COURSE_COLUMNS: &str =
    "id, code, title, lecturer_id, capacity, enrolled, time_slot, created_at";

/// Course record
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Course {
    pub id: i64,
    pub code: String,
    pub title: String,
    pub lecturer_id: Option<i64>,
    pub capacity: i32,
    pub enrolled: i32,
    pub time_slot: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Course {
    pub fn seats_left(&self) -> i32 {
        (self.capacity - self.enrolled).max(0)
    }
}

/// Validated insert payload
#[derive(Debug, Clone)]
pub struct NewCourse {
    pub code: CourseCode,
    pub title: String,
    pub lecturer_id: Option<i64>,
    pub capacity: i32,
    pub time_slot: Option<String>,
}

/// Validated partial update; `None` leaves the column alone
#[derive(Debug, Clone, Default)]
pub struct CourseChanges {
    pub title: Option<String>,
    pub lecturer_id: Option<i64>,
    pub capacity: Option<i32>,
    pub time_slot: Option<String>,
}

/// Course repository
pub struct CourseRepo<'a> {
    db: &'a Database,
}

impl<'a> CourseRepo<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub async fn list(&self, page: Pagination) -> Result<Paginated<Course>, DbError> {
        let sql = format!(
            "SELECT {COURSE_COLUMNS}, COUNT(*) OVER() AS total \
             FROM courses ORDER BY code LIMIT ? OFFSET ?"
        );
        let rows = self
            .db
            .query(&sql, &sql_params![page.limit(), page.offset()])
            .await?;

        let total = match rows.first() {
            Some(row) => row.try_get::<i64, _>("total")?,
            None => 0,
        };
        let items = rows
            .iter()
            .map(Course::from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(page.wrap(items, total))
    }

    pub async fn get(&self, id: i64) -> Result<Course, DbError> {
        let sql = format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = ?");
        let row = self
            .db
            .query_optional(&sql, &[SqlParam::Int(id)])
            .await?
            .ok_or_else(|| DbError::not_found("course", id))?;
        Ok(Course::from_row(&row)?)
    }

    pub async fn create(&self, course: NewCourse) -> Result<Course, DbError> {
        let outcome = self
            .db
            .execute(
                "INSERT INTO courses (code, title, lecturer_id, capacity, enrolled, time_slot) \
                 VALUES (?, ?, ?, ?, 0, ?)",
                &sql_params![
                    course.code.as_str(),
                    course.title,
                    course.lecturer_id,
                    course.capacity,
                    course.time_slot
                ],
            )
            .await
            .map_err(|e| e.or_conflict(format!("course '{}' already exists", course.code.as_str())))?;

        tracing::info!(id = outcome.last_insert_id, code = %course.code.as_str(), "course created");
        self.get(outcome.last_insert_id as i64).await
    }

    pub async fn update(&self, id: i64, changes: CourseChanges) -> Result<Course, DbError> {
        self.db
            .execute(
                "UPDATE courses SET \
                 title = COALESCE(?, title), \
                 lecturer_id = COALESCE(?, lecturer_id), \
                 capacity = COALESCE(?, capacity), \
                 time_slot = COALESCE(?, time_slot) \
                 WHERE id = ?",
                &sql_params![
                    changes.title,
                    changes.lecturer_id,
                    changes.capacity,
                    changes.time_slot,
                    id
                ],
            )
            .await?;
        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), DbError> {
        let outcome = self
            .db
            .execute("DELETE FROM courses WHERE id = ?", &[SqlParam::Int(id)])
            .await?;
        if outcome.rows_affected == 0 {
            return Err(DbError::not_found("course", id));
        }
        tracing::info!(id, "course deleted");
        Ok(())
    }
}
