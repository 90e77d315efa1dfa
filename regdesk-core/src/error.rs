/// Structured error types for regdesk-core.
///
/// Uses `thiserror` so the server crate can compose these into its own
/// errors, while the binary folds them into `anyhow`.
use thiserror::Error;

/// Main error type for regdesk-core operations
#[derive(Error, Debug)]
pub enum CoreError {
    /// Environment variable present but unparseable
    #[error("Invalid value '{value}' for {var}: {reason}")]
    InvalidEnv {
        var: String,
        value: String,
        reason: String,
    },

    /// Configuration error
    #[error("Configuration error: {reason}")]
    Config { reason: String },
}

/// Result type alias for regdesk-core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Create an invalid environment value error
    pub fn invalid_env(
        var: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidEnv {
            var: var.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a config error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }
}
