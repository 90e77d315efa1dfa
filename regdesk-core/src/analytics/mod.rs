//! Registration analytics aggregator
//!
//! Running aggregates over registration outcomes:
//! - attempt / success / failure counters
//! - incremental mean of reported queue times
//! - concurrent-session load with a high-water mark
//! - time-slot and course popularity
//! - an append-only history of attempts
//!
//! `RegistrationAnalytics` is a plain single-writer value. Construct one at
//! startup and share it through [`AnalyticsHandle`] when several tasks need it.

pub mod models;

#[cfg(feature = "rt")]
mod handle;

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};

use crate::config::AnalyticsConfig;

pub use models::{
    CourseCount, DashboardView, HistoryAction, LoadSnapshot, RegistrationEvent,
    RegistrationMetrics, TimeSlotCount,
};

#[cfg(feature = "rt")]
pub use handle::AnalyticsHandle;

/// Default `limit` for the popularity queries.
pub const DEFAULT_POPULAR_LIMIT: usize = 5;

/// In-memory registration analytics.
#[derive(Debug, Clone, Default)]
pub struct RegistrationAnalytics {
    total_attempts: u64,
    successful_registrations: u64,
    failed_registrations: u64,
    average_queue_time: f64,
    /// Number of samples folded into `average_queue_time`.
    queue_time_samples: u64,
    peak_concurrent_users: u64,
    current_concurrent_users: u64,
    most_popular_time_slots: Vec<TimeSlotCount>,
    /// Courses in first-seen order; `course_index` maps id to position.
    course_popularity: Vec<CourseCount>,
    course_index: HashMap<String, usize>,
    history: VecDeque<RegistrationEvent>,
    /// `None` keeps every record.
    history_capacity: Option<usize>,
}

impl RegistrationAnalytics {
    /// Empty aggregator with unbounded history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty aggregator honouring the configured history capacity.
    pub fn with_config(config: &AnalyticsConfig) -> Self {
        Self {
            history_capacity: config.history_capacity,
            ..Self::default()
        }
    }

    /// Record one registration attempt.
    ///
    /// A queue time of zero counts as "not provided". Only successful
    /// attempts that carry a queue time move the running mean.
    pub fn track_registration_attempt(
        &mut self,
        course_id: &str,
        success: bool,
        queue_time: Option<f64>,
        error: Option<&str>,
    ) {
        self.track_attempt_at(Utc::now(), course_id, success, queue_time, error);
    }

    fn track_attempt_at(
        &mut self,
        timestamp: DateTime<Utc>,
        course_id: &str,
        success: bool,
        queue_time: Option<f64>,
        error: Option<&str>,
    ) {
        let queue_time = queue_time.filter(|t| *t != 0.0 && !t.is_nan());

        self.total_attempts += 1;
        if success {
            self.successful_registrations += 1;
            self.bump_course(course_id);

            if let Some(sample) = queue_time {
                let n = self.queue_time_samples as f64;
                self.average_queue_time = (self.average_queue_time * n + sample) / (n + 1.0);
                self.queue_time_samples += 1;
            }
        } else {
            self.failed_registrations += 1;
        }

        tracing::debug!(
            course_id,
            success,
            queue_time = ?queue_time,
            total = self.total_attempts,
            "registration attempt tracked"
        );

        self.push_history(RegistrationEvent {
            timestamp,
            action: HistoryAction::Registration,
            success,
            queue_time,
            course_id: Some(course_id.to_owned()),
            error: error.map(str::to_owned),
        });
    }

    fn push_history(&mut self, event: RegistrationEvent) {
        if let Some(cap) = self.history_capacity {
            if cap == 0 {
                return;
            }
            while self.history.len() >= cap {
                self.history.pop_front();
            }
        }
        self.history.push_back(event);
    }

    /// Session mount (`true`) or unmount (`false`).
    pub fn track_user_session(&mut self, active: bool) {
        if active {
            self.current_concurrent_users += 1;
            self.peak_concurrent_users = self.peak_concurrent_users.max(self.current_concurrent_users);
        } else {
            self.current_concurrent_users = self.current_concurrent_users.saturating_sub(1);
        }
    }

    /// Count one selection of `time_slot`.
    pub fn update_time_slot_popularity(&mut self, time_slot: &str) {
        match self
            .most_popular_time_slots
            .iter_mut()
            .find(|slot| slot.time_slot == time_slot)
        {
            Some(slot) => slot.count += 1,
            None => self.most_popular_time_slots.push(TimeSlotCount {
                time_slot: time_slot.to_owned(),
                count: 1,
            }),
        }

        // Stable: equal counts keep insertion order
        self.most_popular_time_slots
            .sort_by(|a, b| b.count.cmp(&a.count));
    }

    /// Owned snapshot of the counters.
    pub fn registration_metrics(&self) -> RegistrationMetrics {
        RegistrationMetrics {
            total_attempts: self.total_attempts,
            successful_registrations: self.successful_registrations,
            failed_registrations: self.failed_registrations,
            average_queue_time: self.average_queue_time,
            peak_concurrent_users: self.peak_concurrent_users,
            current_concurrent_users: self.current_concurrent_users,
            most_popular_time_slots: self.most_popular_time_slots.clone(),
            course_popularity: self.course_popularity.clone(),
        }
    }

    /// History records with `start <= timestamp <= end`.
    ///
    /// Both bounds are optional. The iterator is lazy and each call starts a
    /// fresh pass over the log.
    pub fn registration_history(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> impl Iterator<Item = &RegistrationEvent> + '_ {
        self.history.iter().filter(move |event| {
            start.map_or(true, |s| event.timestamp >= s) && end.map_or(true, |e| event.timestamp <= e)
        })
    }

    /// Number of records currently retained.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn popular_time_slots(&self, limit: usize) -> Vec<TimeSlotCount> {
        self.most_popular_time_slots
            .iter()
            .take(limit)
            .cloned()
            .collect()
    }

    /// Top courses by successful registrations; ties keep first-seen order.
    pub fn popular_courses(&self, limit: usize) -> Vec<CourseCount> {
        let mut courses = self.course_popularity.clone();
        // Stable: equal counts keep first-seen order
        courses.sort_by(|a, b| b.count.cmp(&a.count));
        courses.truncate(limit);
        courses
    }

    fn bump_course(&mut self, course_id: &str) {
        match self.course_index.get(course_id) {
            Some(&i) => self.course_popularity[i].count += 1,
            None => {
                self.course_index
                    .insert(course_id.to_owned(), self.course_popularity.len());
                self.course_popularity.push(CourseCount {
                    course_id: course_id.to_owned(),
                    count: 1,
                });
            }
        }
    }

    pub fn current_load(&self) -> LoadSnapshot {
        let load_percentage = if self.peak_concurrent_users == 0 {
            0.0
        } else {
            self.current_concurrent_users as f64 / self.peak_concurrent_users as f64 * 100.0
        };

        LoadSnapshot {
            current_users: self.current_concurrent_users,
            peak_users: self.peak_concurrent_users,
            load_percentage,
        }
    }

    /// Percentage of attempts that succeeded, 0 before any attempt.
    pub fn success_rate(&self) -> f64 {
        if self.total_attempts == 0 {
            return 0.0;
        }
        self.successful_registrations as f64 / self.total_attempts as f64 * 100.0
    }

    /// Reset to the freshly constructed state. History capacity is kept.
    pub fn clear_metrics(&mut self) {
        *self = Self {
            history_capacity: self.history_capacity,
            ..Self::default()
        };
        tracing::info!("registration metrics cleared");
    }

    /// Combined read for dashboards.
    pub fn dashboard(&self, poll_interval_ms: u64) -> DashboardView {
        DashboardView {
            metrics: self.registration_metrics(),
            load: self.current_load(),
            success_rate: self.success_rate(),
            popular_time_slots: self.popular_time_slots(DEFAULT_POPULAR_LIMIT),
            popular_courses: self.popular_courses(DEFAULT_POPULAR_LIMIT),
            poll_interval_ms,
        }
    }
}
