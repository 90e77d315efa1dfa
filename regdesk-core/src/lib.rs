//! regdesk-core: registration analytics and shared configuration helpers

pub mod analytics;
pub mod config;
pub mod error;

#[cfg(feature = "rt")]
pub use analytics::AnalyticsHandle;
pub use analytics::{
    CourseCount, DashboardView, LoadSnapshot, RegistrationAnalytics, RegistrationEvent,
    RegistrationMetrics, TimeSlotCount, DEFAULT_POPULAR_LIMIT,
};
pub use config::AnalyticsConfig;
pub use error::{CoreError, Result};
