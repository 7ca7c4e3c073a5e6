//! Shared error type across dubbo-metrics crates.

use thiserror::Error;

/// Stable error codes (used by config tooling and logs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Invalid or unreadable configuration.
    BadConfig,
    /// Unsupported config schema version.
    UnsupportedVersion,
    /// The backend refused to create an instrument.
    Instrument,
    /// Anything else.
    Internal,
}

impl ErrorCode {
    /// String representation used in logs and tests.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::BadConfig => "BAD_CONFIG",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::Instrument => "INSTRUMENT",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, MetricsError>;

/// Unified error type used by core and registry.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("instrument {name}: {reason}")]
    Instrument { name: String, reason: String },
    #[error("internal: {0}")]
    Internal(String),
}

impl MetricsError {
    /// Map the error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            MetricsError::BadConfig(_) => ErrorCode::BadConfig,
            MetricsError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            MetricsError::Instrument { .. } => ErrorCode::Instrument,
            MetricsError::Internal(_) => ErrorCode::Internal,
        }
    }
}
