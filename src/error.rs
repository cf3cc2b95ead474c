//! Crate-level error type.
//!
//! Probe and launch faults never show up here: they are folded into
//! "not running yet" at the point where they happen. The only failure a
//! caller of `Packager::start` can observe is a readiness timeout.

use crate::config::ConfigError;
use crate::retry::RetryError;

/// Errors surfaced by the packager coordinator and its entry points.
#[derive(thiserror::Error, Debug)]
pub enum PackagerError {
    /// The status endpoint never reported running within the retry budget.
    #[error("{0}")]
    ReadinessTimeout(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client setup failed: {0}")]
    Http(String),
}

impl PackagerError {
    /// Machine readable error code, printed by the CLI when `start` fails.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ReadinessTimeout(_) => "READINESS_TIMEOUT",
            Self::Config(_) => "INVALID_CONFIG",
            Self::Http(_) => "HTTP_CLIENT",
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::ReadinessTimeout(_))
    }
}

impl From<RetryError> for PackagerError {
    fn from(err: RetryError) -> Self {
        match err {
            RetryError::Timeout { message, .. } => Self::ReadinessTimeout(message),
        }
    }
}
