// Error kinds shared by the matrix compiler, the workflow and the scheduler
//
// Workflow steps never let a raw driver error escape: they convert it into
// an `ErrorKind` and the pipeline reports the furthest step reached.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Classification of everything that can stop a reservation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Reservation matrix could not be read or has no data rows
    FormatError,
    /// Page navigation failed or the session could not be opened
    NavigationError,
    /// A configured selector matched nothing
    ElementNotFound,
    /// A bounded wait expired
    Timeout,
    /// The post-login landmark never appeared
    AuthenticationFailed,
    /// No column had every desired row available
    SlotUnavailable,
    /// A column was selected but not every desired row could be claimed
    PartialClaim,
    /// Schedule or row mapping configuration is inconsistent
    ConfigError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::FormatError => "format_error",
            ErrorKind::NavigationError => "navigation_error",
            ErrorKind::ElementNotFound => "element_not_found",
            ErrorKind::Timeout => "timeout",
            ErrorKind::AuthenticationFailed => "authentication_failed",
            ErrorKind::SlotUnavailable => "slot_unavailable",
            ErrorKind::PartialClaim => "partial_claim",
            ErrorKind::ConfigError => "config_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised before any session is opened (matrix and configuration)
#[derive(Debug, Error)]
pub enum ReservationError {
    #[error("malformed reservation matrix: {0}")]
    Format(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ReservationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReservationError::Format(_) => ErrorKind::FormatError,
            ReservationError::Config(_) => ErrorKind::ConfigError,
        }
    }
}
