//! Lecturer endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::db::repos::{Lecturer, LecturerChanges, LecturerRepo, NewLecturer};
use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::models::{required_text, Email, Paginated, Pagination, PaginationParams, ValidationError};

const MAX_NAME_LEN: usize = 120;
const MAX_DEPARTMENT_LEN: usize = 120;

/// Create lecturer request
#[derive(Debug, Deserialize)]
pub struct CreateLecturerRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub department: Option<String>,
}

impl TryFrom<CreateLecturerRequest> for NewLecturer {
    type Error = ValidationError;

    fn try_from(req: CreateLecturerRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            name: required_text("name", &req.name, MAX_NAME_LEN)?,
            email: Email::new(&req.email)?,
            department: req
                .department
                .as_deref()
                .map(|d| required_text("department", d, MAX_DEPARTMENT_LEN))
                .transpose()?,
        })
    }
}

/// Partial update
#[derive(Debug, Default, Deserialize)]
pub struct UpdateLecturerRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub department: Option<String>,
}

impl TryFrom<UpdateLecturerRequest> for LecturerChanges {
    type Error = ValidationError;

    fn try_from(req: UpdateLecturerRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            name: req
                .name
                .as_deref()
                .map(|n| required_text("name", n, MAX_NAME_LEN))
                .transpose()?,
            email: req.email.as_deref().map(Email::new).transpose()?,
            department: req
                .department
                .as_deref()
                .map(|d| required_text("department", d, MAX_DEPARTMENT_LEN))
                .transpose()?,
        })
    }
}

/// GET /api/lecturers
async fn list_lecturers(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Paginated<Lecturer>>, ApiError> {
    let page = Pagination::from(params);
    Ok(Json(LecturerRepo::new(&state.db).list(page).await?))
}

/// POST /api/lecturers
async fn create_lecturer(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateLecturerRequest>,
) -> Result<(StatusCode, Json<Lecturer>), ApiError> {
    let lecturer = LecturerRepo::new(&state.db)
        .create(NewLecturer::try_from(req)?)
        .await?;
    Ok((StatusCode::CREATED, Json(lecturer)))
}

/// GET /api/lecturers/{id}
async fn get_lecturer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Lecturer>, ApiError> {
    Ok(Json(LecturerRepo::new(&state.db).get(id).await?))
}

/// PUT /api/lecturers/{id}
async fn update_lecturer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateLecturerRequest>,
) -> Result<Json<Lecturer>, ApiError> {
    let changes = LecturerChanges::try_from(req)?;
    Ok(Json(LecturerRepo::new(&state.db).update(id, changes).await?))
}

/// DELETE /api/lecturers/{id}
async fn delete_lecturer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    LecturerRepo::new(&state.db).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Lecturer routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/lecturers", get(list_lecturers).post(create_lecturer))
        .route(
            "/api/lecturers/{id}",
            get(get_lecturer).put(update_lecturer).delete(delete_lecturer),
        )
}
