//! Shared handle to the process-wide aggregator.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{
    CourseCount, DashboardView, LoadSnapshot, RegistrationAnalytics, RegistrationEvent,
    RegistrationMetrics, TimeSlotCount,
};
use crate::config::AnalyticsConfig;

/// Cloneable handle; every clone points at the same aggregator.
///
/// Mutations take the write lock, so the counter invariants hold under the
/// multi-threaded runtime.
#[derive(Clone, Debug)]
pub struct AnalyticsHandle {
    inner: Arc<RwLock<RegistrationAnalytics>>,
    poll_interval_ms: u64,
}

impl AnalyticsHandle {
    pub fn new(config: &AnalyticsConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(RegistrationAnalytics::with_config(config))),
            poll_interval_ms: config.poll_interval_ms,
        }
    }

    /// Poll interval advertised to dashboards.
    pub fn poll_interval_ms(&self) -> u64 {
        self.poll_interval_ms
    }

    pub async fn track_registration_attempt(
        &self,
        course_id: &str,
        success: bool,
        queue_time: Option<f64>,
        error: Option<&str>,
    ) {
        self.inner
            .write()
            .await
            .track_registration_attempt(course_id, success, queue_time, error);
    }

    pub async fn track_user_session(&self, active: bool) {
        self.inner.write().await.track_user_session(active);
    }

    pub async fn update_time_slot_popularity(&self, time_slot: &str) {
        self.inner.write().await.update_time_slot_popularity(time_slot);
    }

    pub async fn registration_metrics(&self) -> RegistrationMetrics {
        self.inner.read().await.registration_metrics()
    }

    /// Materialized history window. The lock is not held after return.
    pub async fn registration_history(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Vec<RegistrationEvent> {
        self.inner
            .read()
            .await
            .registration_history(start, end)
            .cloned()
            .collect()
    }

    pub async fn popular_time_slots(&self, limit: usize) -> Vec<TimeSlotCount> {
        self.inner.read().await.popular_time_slots(limit)
    }

    pub async fn popular_courses(&self, limit: usize) -> Vec<CourseCount> {
        self.inner.read().await.popular_courses(limit)
    }

    pub async fn current_load(&self) -> LoadSnapshot {
        self.inner.read().await.current_load()
    }

    pub async fn success_rate(&self) -> f64 {
        self.inner.read().await.success_rate()
    }

    pub async fn clear_metrics(&self) {
        self.inner.write().await.clear_metrics();
    }

    pub async fn dashboard(&self) -> DashboardView {
        self.inner.read().await.dashboard(self.poll_interval_ms)
    }
}

impl Default for AnalyticsHandle {
    fn default() -> Self {
        Self::new(&AnalyticsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clones_share_state() {
        let handle = AnalyticsHandle::default();
        let other = handle.clone();

        handle.track_registration_attempt("CS101", true, None, None).await;
        other.track_user_session(true).await;

        let metrics = other.registration_metrics().await;
        assert_eq!(metrics.total_attempts, 1);
        assert_eq!(handle.current_load().await.current_users, 1);
    }

    #[tokio::test]
    async fn concurrent_writers_keep_invariant() {
        let handle = AnalyticsHandle::default();

        let tasks: Vec<_> = (0..50)
            .map(|i| {
                let handle = handle.clone();
                tokio::spawn(async move {
                    handle
                        .track_registration_attempt("CS101", i % 3 != 0, Some(5.0), None)
                        .await;
                })
            })
            .collect();
        for task in tasks {
            task.await.expect("task panicked");
        }

        let m = handle.registration_metrics().await;
        assert_eq!(m.total_attempts, 50);
        assert_eq!(m.successful_registrations + m.failed_registrations, 50);
        assert_eq!(handle.registration_history(None, None).await.len(), 50);
    }

    #[tokio::test]
    async fn dashboard_reports_poll_interval() {
        let config = AnalyticsConfig {
            poll_interval_ms: 2_500,
            ..AnalyticsConfig::default()
        };
        let handle = AnalyticsHandle::new(&config);
        handle.update_time_slot_popularity("09:00").await;

        let view = handle.dashboard().await;
        assert_eq!(view.poll_interval_ms, 2_500);
        assert_eq!(view.popular_time_slots.len(), 1);
        assert_eq!(view.success_rate, 0.0);
    }

    #[tokio::test]
    async fn clear_through_handle() {
        let handle = AnalyticsHandle::default();
        handle.track_registration_attempt("CS101", true, None, None).await;
        handle.clear_metrics().await;
        assert_eq!(handle.registration_metrics().await, RegistrationMetrics::default());
    }
}
