//! Shared error type across reqmeter crates.

use std::time::Duration;

use thiserror::Error;

/// Stable error codes used in structured log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A request record lacked an attribute the metric needs.
    MissingAttribute,
    /// Configuration could not be parsed or failed validation.
    InvalidConfig,
    /// The ingestion endpoint did not acknowledge a payload.
    DeliveryFailed,
    /// Internal fault.
    Internal,
}

impl ErrorKind {
    /// String representation used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::MissingAttribute => "MISSING_ATTRIBUTE",
            ErrorKind::InvalidConfig => "INVALID_CONFIG",
            ErrorKind::DeliveryFailed => "DELIVERY_FAILED",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, ReqMeterError>;

/// Unified error type used by core and agent.
#[derive(Debug, Error)]
pub enum ReqMeterError {
    #[error("request record is missing `{0}`")]
    MissingAttribute(&'static str),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("payload serialization failed: {0}")]
    Serialization(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("ingestion endpoint rejected payload with status {status}")]
    Rejected { status: u16 },
    #[error("delivery timed out after {0:?}")]
    Timeout(Duration),
    #[error("internal: {0}")]
    Internal(String),
}

impl ReqMeterError {
    /// Map to a stable code.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReqMeterError::MissingAttribute(_) => ErrorKind::MissingAttribute,
            ReqMeterError::InvalidConfig(_) => ErrorKind::InvalidConfig,
            ReqMeterError::Serialization(_)
            | ReqMeterError::Transport(_)
            | ReqMeterError::Rejected { .. }
            | ReqMeterError::Timeout(_) => ErrorKind::DeliveryFailed,
            ReqMeterError::Internal(_) => ErrorKind::Internal,
        }
    }
}
