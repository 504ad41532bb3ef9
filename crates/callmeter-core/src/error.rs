//! Shared error type across callmeter crates.

use thiserror::Error;

/// Stable error codes (used in logs and HTTP responses).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Invalid configuration or selector.
    BadConfig,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Metrics transport failure.
    Transport,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// String representation used in logs and JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::BadConfig => "BAD_CONFIG",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::Transport => "TRANSPORT",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, CallMeterError>;

/// Unified error type used by core and the interception layer.
#[derive(Debug, Error)]
pub enum CallMeterError {
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("metrics transport: {0}")]
    Transport(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl CallMeterError {
    /// Map to a stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            CallMeterError::BadConfig(_) => ErrorCode::BadConfig,
            CallMeterError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            CallMeterError::Transport(_) => ErrorCode::Transport,
            CallMeterError::Internal(_) => ErrorCode::Internal,
        }
    }
}

impl From<std::io::Error> for CallMeterError {
    fn from(e: std::io::Error) -> Self {
        CallMeterError::Transport(e.to_string())
    }
}
