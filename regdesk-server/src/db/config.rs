//! Connection parameters for the MySQL pool
//!
//! Loaded from environment variables:
//! - `DATABASE_URL`: full `mysql://` URL; wins over the discrete fields
//! - `DB_HOST` (default `localhost`), `DB_PORT` (default 3306)
//! - `DB_USER` (default `root`), `DB_PASSWORD`, `DB_NAME` (default `regdesk`)
//! - `DB_POOL_SIZE` (default 10), `DB_SSL` (flag)
//! - `DB_ACQUIRE_TIMEOUT_SECS` (default 10)

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use regdesk_core::config::{parse_flag, parse_optional, parse_or};
use regdesk_core::CoreError;
use sqlx::mysql::{MySqlConnectOptions, MySqlSslMode};

use super::error::DbError;

/// Default maximum connections for the pool.
pub const DEFAULT_POOL_SIZE: u32 = 10;

/// Default wait for a free connection before giving up.
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Database configuration
#[derive(Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub database: String,
    pub pool_size: u32,
    pub ssl: bool,
    pub acquire_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: None,
            database: "regdesk".to_string(),
            pool_size: DEFAULT_POOL_SIZE,
            ssl: false,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
        }
    }
}

// Keeps the password out of logs
impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("url", &self.url.as_ref().map(|_| "<redacted>"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("database", &self.database)
            .field("pool_size", &self.pool_size)
            .field("ssl", &self.ssl)
            .field("acquire_timeout", &self.acquire_timeout)
            .finish()
    }
}

impl DbConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let pool_size = parse_or(&lookup, "DB_POOL_SIZE", defaults.pool_size)?;
        if pool_size == 0 {
            return Err(CoreError::config("DB_POOL_SIZE must be at least 1"));
        }

        let acquire_timeout = parse_optional::<u64, _>(&lookup, "DB_ACQUIRE_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.acquire_timeout);

        Ok(Self {
            url: lookup("DATABASE_URL").filter(|u| !u.trim().is_empty()),
            host: lookup("DB_HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "DB_PORT", defaults.port)?,
            user: lookup("DB_USER").unwrap_or(defaults.user),
            password: lookup("DB_PASSWORD"),
            database: lookup("DB_NAME").unwrap_or(defaults.database),
            pool_size,
            ssl: parse_flag(&lookup, "DB_SSL"),
            acquire_timeout,
        })
    }

    /// Build sqlx connect options.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Config` if `url` is set but unparseable.
    pub fn connect_options(&self) -> Result<MySqlConnectOptions, DbError> {
        let options = match &self.url {
            Some(url) => MySqlConnectOptions::from_str(url)
                .map_err(|e| DbError::Config(e.to_string()))?,
            None => {
                let options = MySqlConnectOptions::new()
                    .host(&self.host)
                    .port(self.port)
                    .username(&self.user)
                    .database(&self.database);
                match &self.password {
                    Some(password) => options.password(password),
                    None => options,
                }
            }
        };

        let ssl_mode = if self.ssl {
            MySqlSslMode::Required
        } else {
            MySqlSslMode::Preferred
        };
        Ok(options.ssl_mode(ssl_mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = DbConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, DbConfig::default());
        assert_eq!(config.pool_size, 10);
        assert_eq!(config.acquire_timeout, Duration::from_secs(10));
        assert!(!config.ssl);
    }

    #[test]
    fn reads_environment() {
        let config = DbConfig::from_lookup(lookup_from(&[
            ("DB_HOST", "db.campus.internal"),
            ("DB_PORT", "3307"),
            ("DB_USER", "registrar"),
            ("DB_PASSWORD", "hunter2"),
            ("DB_NAME", "courses"),
            ("DB_POOL_SIZE", "25"),
            ("DB_SSL", "true"),
            ("DB_ACQUIRE_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();

        assert_eq!(config.host, "db.campus.internal");
        assert_eq!(config.port, 3307);
        assert_eq!(config.user, "registrar");
        assert_eq!(config.password.as_deref(), Some("hunter2"));
        assert_eq!(config.database, "courses");
        assert_eq!(config.pool_size, 25);
        assert!(config.ssl);
        assert_eq!(config.acquire_timeout, Duration::from_secs(3));
    }

    #[test]
    fn rejects_zero_pool() {
        let err = DbConfig::from_lookup(lookup_from(&[("DB_POOL_SIZE", "0")])).unwrap_err();
        assert!(matches!(err, CoreError::Config { .. }));
    }

    #[test]
    fn rejects_bad_port() {
        let err = DbConfig::from_lookup(lookup_from(&[("DB_PORT", "99999")])).unwrap_err();
        assert!(matches!(err, CoreError::InvalidEnv { .. }));
    }

    #[test]
    fn debug_redacts_password() {
        let config = DbConfig {
            password: Some("hunter2".into()),
            ..DbConfig::default()
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn bad_url_is_config_error() {
        let config = DbConfig {
            url: Some("not a url".into()),
            ..DbConfig::default()
        };
        assert!(matches!(config.connect_options(), Err(DbError::Config(_))));
    }

    #[test]
    fn url_options_parse() {
        let config = DbConfig {
            url: Some("mysql://app:secret@db:3306/regdesk".into()),
            ..DbConfig::default()
        };
        assert!(config.connect_options().is_ok());
    }
}
