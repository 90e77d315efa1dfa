//! Course endpoints, including enrollment

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use regdesk_core::AnalyticsHandle;
use serde::Deserialize;

use crate::db::repos::{
    Course, CourseChanges, CourseRepo, Enrollment, EnrollmentReceipt, EnrollmentRepo, NewCourse,
};
use crate::db::DbError;
use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::models::{
    required_text, validate_capacity, validate_time_slot, CourseCode, Paginated, Pagination,
    PaginationParams, ValidationError,
};

const MAX_TITLE_LEN: usize = 200;

/// Create course request
#[derive(Debug, Deserialize)]
pub struct CreateCourseRequest {
    pub code: String,
    pub title: String,
    #[serde(default)]
    pub lecturer_id: Option<i64>,
    pub capacity: i32,
    #[serde(default)]
    pub time_slot: Option<String>,
}

impl TryFrom<CreateCourseRequest> for NewCourse {
    type Error = ValidationError;

    fn try_from(req: CreateCourseRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            code: CourseCode::new(&req.code)?,
            title: required_text("title", &req.title, MAX_TITLE_LEN)?,
            lecturer_id: req.lecturer_id,
            capacity: validate_capacity(req.capacity)?,
            time_slot: req.time_slot.as_deref().map(validate_time_slot).transpose()?,
        })
    }
}

/// Partial update; omitted fields are left unchanged
#[derive(Debug, Default, Deserialize)]
pub struct UpdateCourseRequest {
    pub title: Option<String>,
    pub lecturer_id: Option<i64>,
    pub capacity: Option<i32>,
    pub time_slot: Option<String>,
}

impl TryFrom<UpdateCourseRequest> for CourseChanges {
    type Error = ValidationError;

    fn try_from(req: UpdateCourseRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            title: req
                .title
                .as_deref()
                .map(|t| required_text("title", t, MAX_TITLE_LEN))
                .transpose()?,
            lecturer_id: req.lecturer_id,
            capacity: req.capacity.map(validate_capacity).transpose()?,
            time_slot: req.time_slot.as_deref().map(validate_time_slot).transpose()?,
        })
    }
}

/// Enroll request
#[derive(Debug, Deserialize)]
pub struct EnrollRequest {
    pub account_id: i64,
}

/// GET /api/courses
async fn list_courses(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Paginated<Course>>, ApiError> {
    let page = Pagination::from(params);
    Ok(Json(CourseRepo::new(&state.db).list(page).await?))
}

/// POST /api/courses
async fn create_course(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCourseRequest>,
) -> Result<(StatusCode, Json<Course>), ApiError> {
    let course = CourseRepo::new(&state.db)
        .create(NewCourse::try_from(req)?)
        .await?;
    Ok((StatusCode::CREATED, Json(course)))
}

/// GET /api/courses/{id}
async fn get_course(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Course>, ApiError> {
    Ok(Json(CourseRepo::new(&state.db).get(id).await?))
}

/// PUT /api/courses/{id}
async fn update_course(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateCourseRequest>,
) -> Result<Json<Course>, ApiError> {
    let changes = CourseChanges::try_from(req)?;
    Ok(Json(CourseRepo::new(&state.db).update(id, changes).await?))
}

/// DELETE /api/courses/{id}
async fn delete_course(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    CourseRepo::new(&state.db).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/courses/{id}/enroll
///
/// Queue time is the wall time spent waiting on the enrollment transaction,
/// in seconds.
async fn enroll(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<i64>,
    Json(req): Json<EnrollRequest>,
) -> Result<(StatusCode, Json<EnrollmentReceipt>), ApiError> {
    let started = Instant::now();
    let result = EnrollmentRepo::new(&state.db)
        .enroll(req.account_id, course_id)
        .await;
    let queue_time = started.elapsed().as_secs_f64();

    if let Err(e) = &result {
        tracing::debug!(course_id, account_id = req.account_id, error = %e, "enrollment rejected");
    }
    record_enrollment(
        &state.analytics,
        &course_id.to_string(),
        result.as_ref(),
        queue_time,
    )
    .await;

    let receipt = result?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// Feed one enrollment outcome to the aggregator.
///
/// Outages (lost connection, pool timeout) are not registration attempts
/// and are left out of the counters.
async fn record_enrollment(
    analytics: &AnalyticsHandle,
    course_key: &str,
    outcome: Result<&EnrollmentReceipt, &DbError>,
    queue_time: f64,
) {
    match outcome {
        Ok(receipt) => {
            analytics
                .track_registration_attempt(course_key, true, Some(queue_time), None)
                .await;
            if let Some(slot) = &receipt.time_slot {
                analytics.update_time_slot_popularity(slot).await;
            }
        }
        Err(e) if e.is_unavailable() => {
            tracing::warn!(course_id = course_key, error = %e, "enrollment not tracked: database unavailable");
        }
        Err(e) => {
            analytics
                .track_registration_attempt(course_key, false, None, Some(&e.to_string()))
                .await;
        }
    }
}

/// DELETE /api/courses/{id}/enrollments/{account_id}
async fn unenroll(
    State(state): State<Arc<AppState>>,
    Path((course_id, account_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    EnrollmentRepo::new(&state.db)
        .unenroll(account_id, course_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/courses/{id}/enrollments
async fn list_enrollments(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<i64>,
) -> Result<Json<Vec<Enrollment>>, ApiError> {
    // 404 for an unknown course rather than an empty list
    CourseRepo::new(&state.db).get(course_id).await?;
    Ok(Json(
        EnrollmentRepo::new(&state.db)
            .list_for_course(course_id)
            .await?,
    ))
}

/// Course routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/courses", get(list_courses).post(create_course))
        .route(
            "/api/courses/{id}",
            get(get_course).put(update_course).delete(delete_course),
        )
        .route("/api/courses/{id}/enroll", post(enroll))
        .route("/api/courses/{id}/enrollments", get(list_enrollments))
        .route(
            "/api/courses/{id}/enrollments/{account_id}",
            delete(unenroll),
        )
}
