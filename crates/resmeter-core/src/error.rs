//! Shared error type across resmeter crates.
//!
//! Errors only surface while wiring things together (config parsing, series
//! registration). Sink methods never return them.

use thiserror::Error;

/// Stable error codes (used by tests and diagnostics).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Malformed or semantically invalid configuration.
    BadConfig,
    /// Unsupported config version.
    UnsupportedVersion,
    /// A series name was registered twice with different shapes.
    SchemaConflict,
    /// Lookup of a series that was never registered.
    UnknownSeries,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// String representation used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::BadConfig => "BAD_CONFIG",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::SchemaConflict => "SCHEMA_CONFLICT",
            ErrorCode::UnknownSeries => "UNKNOWN_SERIES",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, ResmeterError>;

/// Unified error type used by core and sinks.
#[derive(Debug, Error)]
pub enum ResmeterError {
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("series {name} already registered with a different shape")]
    SchemaConflict { name: String },
    #[error("unknown series: {0}")]
    UnknownSeries(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl ResmeterError {
    /// Map the error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            ResmeterError::BadConfig(_) => ErrorCode::BadConfig,
            ResmeterError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            ResmeterError::SchemaConflict { .. } => ErrorCode::SchemaConflict,
            ResmeterError::UnknownSeries(_) => ErrorCode::UnknownSeries,
            ResmeterError::Internal(_) => ErrorCode::Internal,
        }
    }
}
