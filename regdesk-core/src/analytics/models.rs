//! Value types produced by the registration analytics aggregator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of event recorded in the registration history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryAction {
    Registration,
}

/// One recorded registration attempt.
///
/// Timestamps travel as epoch milliseconds on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationEvent {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub action: HistoryAction,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Popularity counter for a scheduling bucket label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlotCount {
    pub time_slot: String,
    pub count: u64,
}

/// Successful-registration counter for one course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseCount {
    pub course_id: String,
    pub count: u64,
}

/// Owned snapshot of the aggregate counters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RegistrationMetrics {
    pub total_attempts: u64,
    pub successful_registrations: u64,
    pub failed_registrations: u64,
    pub average_queue_time: f64,
    pub peak_concurrent_users: u64,
    pub current_concurrent_users: u64,
    pub most_popular_time_slots: Vec<TimeSlotCount>,
    pub course_popularity: Vec<CourseCount>,
}

/// Concurrent-session load.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadSnapshot {
    pub current_users: u64,
    pub peak_users: u64,
    /// `current / peak * 100`; 0 until the first session has been seen.
    pub load_percentage: f64,
}

/// Everything a dashboard polls for, read under one lock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    pub metrics: RegistrationMetrics,
    pub load: LoadSnapshot,
    pub success_rate: f64,
    pub popular_time_slots: Vec<TimeSlotCount>,
    pub popular_courses: Vec<CourseCount>,
    pub poll_interval_ms: u64,
}
