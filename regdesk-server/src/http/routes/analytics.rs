//! Registration analytics endpoints
//!
//! Thin wrappers over the shared `AnalyticsHandle`. Timestamps on the wire
//! are epoch milliseconds.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use regdesk_core::{
    CourseCount, DashboardView, LoadSnapshot, RegistrationEvent, RegistrationMetrics,
    TimeSlotCount, DEFAULT_POPULAR_LIMIT,
};
use serde::{Deserialize, Serialize};

use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::models::{required_text, ValidationError};

const MAX_LABEL_LEN: usize = 64;

/// POST /analytics/attempts body
#[derive(Debug, Deserialize)]
pub struct AttemptRequest {
    pub course_id: String,
    pub success: bool,
    #[serde(default)]
    pub queue_time: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}

/// POST /analytics/sessions body
#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub active: bool,
}

/// POST /analytics/time-slots body
#[derive(Debug, Deserialize)]
pub struct TimeSlotRequest {
    pub time_slot: String,
}

/// `?start=&end=` in epoch milliseconds, both optional
#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

/// `?limit=`
#[derive(Debug, Default, Deserialize)]
pub struct LimitParams {
    pub limit: Option<usize>,
}

impl LimitParams {
    fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_POPULAR_LIMIT)
    }
}

#[derive(Debug, Serialize)]
pub struct SuccessRateResponse {
    pub success_rate: f64,
}

fn epoch_ms(field: &'static str, value: Option<i64>) -> Result<Option<DateTime<Utc>>, ApiError> {
    value
        .map(|ms| {
            DateTime::from_timestamp_millis(ms).ok_or(ValidationError::InvalidFormat {
                field,
                reason: "not a representable epoch-millisecond timestamp",
            })
        })
        .transpose()
        .map_err(ApiError::from)
}

/// POST /analytics/attempts
async fn track_attempt(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AttemptRequest>,
) -> Result<StatusCode, ApiError> {
    let course_id = required_text("course_id", &req.course_id, MAX_LABEL_LEN)?;
    state
        .analytics
        .track_registration_attempt(&course_id, req.success, req.queue_time, req.error.as_deref())
        .await;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /analytics/sessions
async fn track_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionRequest>,
) -> StatusCode {
    state.analytics.track_user_session(req.active).await;
    StatusCode::NO_CONTENT
}

/// POST /analytics/time-slots
async fn track_time_slot(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TimeSlotRequest>,
) -> Result<StatusCode, ApiError> {
    let slot = required_text("time_slot", &req.time_slot, MAX_LABEL_LEN)?;
    state.analytics.update_time_slot_popularity(&slot).await;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /analytics/metrics
async fn metrics(State(state): State<Arc<AppState>>) -> Json<RegistrationMetrics> {
    Json(state.analytics.registration_metrics().await)
}

/// GET /analytics/history
async fn history(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<RegistrationEvent>>, ApiError> {
    let start = epoch_ms("start", params.start)?;
    let end = epoch_ms("end", params.end)?;
    Ok(Json(state.analytics.registration_history(start, end).await))
}

/// GET /analytics/time-slots
async fn popular_time_slots(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LimitParams>,
) -> Json<Vec<TimeSlotCount>> {
    Json(state.analytics.popular_time_slots(params.limit()).await)
}

/// GET /analytics/courses
async fn popular_courses(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LimitParams>,
) -> Json<Vec<CourseCount>> {
    Json(state.analytics.popular_courses(params.limit()).await)
}

/// GET /analytics/load
async fn load(State(state): State<Arc<AppState>>) -> Json<LoadSnapshot> {
    Json(state.analytics.current_load().await)
}

/// GET /analytics/success-rate
async fn success_rate(State(state): State<Arc<AppState>>) -> Json<SuccessRateResponse> {
    Json(SuccessRateResponse {
        success_rate: state.analytics.success_rate().await,
    })
}

/// GET /analytics/dashboard
async fn dashboard(State(state): State<Arc<AppState>>) -> Json<DashboardView> {
    Json(state.analytics.dashboard().await)
}

/// DELETE /analytics
async fn clear(State(state): State<Arc<AppState>>) -> StatusCode {
    state.analytics.clear_metrics().await;
    StatusCode::NO_CONTENT
}

/// Analytics routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/analytics", delete(clear))
        .route("/analytics/attempts", post(track_attempt))
        .route("/analytics/sessions", post(track_session))
        .route(
            "/analytics/time-slots",
            get(popular_time_slots).post(track_time_slot),
        )
        .route("/analytics/metrics", get(metrics))
        .route("/analytics/history", get(history))
        .route("/analytics/courses", get(popular_courses))
        .route("/analytics/load", get(load))
        .route("/analytics/success-rate", get(success_rate))
        .route("/analytics/dashboard", get(dashboard))
}
