//! Environment-driven configuration helpers
//!
//! Every `from_env` constructor in the workspace is a thin wrapper over a
//! `from_lookup` variant taking a key -> value closure, so tests never touch
//! the process environment.

use std::str::FromStr;

use crate::error::{CoreError, Result};

/// Environment variable for the history cap (unset = unbounded)
pub const HISTORY_CAPACITY_VAR: &str = "REGDESK_HISTORY_CAPACITY";

/// Environment variable for the dashboard poll interval
pub const POLL_INTERVAL_VAR: &str = "REGDESK_POLL_INTERVAL_MS";

/// Default dashboard poll interval
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5_000;

/// Aggregator configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsConfig {
    /// Maximum retained history records; `None` keeps everything
    pub history_capacity: Option<usize>,
    /// How often dashboards are told to poll
    pub poll_interval_ms: u64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            history_capacity: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl AnalyticsConfig {
    /// Load from `REGDESK_HISTORY_CAPACITY` / `REGDESK_POLL_INTERVAL_MS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            history_capacity: parse_optional(&lookup, HISTORY_CAPACITY_VAR)?,
            poll_interval_ms: parse_or(&lookup, POLL_INTERVAL_VAR, DEFAULT_POLL_INTERVAL_MS)?,
        })
    }
}

/// Parse `key` if present and non-blank.
pub fn parse_optional<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| CoreError::invalid_env(key, raw.clone(), e.to_string())),
        _ => Ok(None),
    }
}

/// Parse `key`, falling back to `default` when absent.
pub fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    Ok(parse_optional(lookup, key)?.unwrap_or(default))
}

/// Lenient boolean flag: `1`, `true`, `yes`, `on` (any case) are true.
pub fn parse_flag<F>(lookup: &F, key: &str) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            matches!(
                raw.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
        .unwrap_or(false)
}
