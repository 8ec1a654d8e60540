//! Completion status values
//!
//! A [`Status`] describes how an operation finished: a kind, an optional
//! region error code, and a human-readable message. The SDK retry driver
//! classifies statuses with [`Status::is_retryable`]: only `Incomplete`
//! statuses carrying one of the transient region codes are retried, every
//! other non-OK status is final.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Broad outcome category of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Ok,
    /// The operation did not finish and may be re-driven by the caller.
    Incomplete,
    Aborted,
    ServiceUnavailable,
    InvalidArgument,
    Internal,
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusKind::Ok => write!(f, "OK"),
            StatusKind::Incomplete => write!(f, "Incomplete"),
            StatusKind::Aborted => write!(f, "Aborted"),
            StatusKind::ServiceUnavailable => write!(f, "ServiceUnavailable"),
            StatusKind::InvalidArgument => write!(f, "InvalidArgument"),
            StatusKind::Internal => write!(f, "Internal"),
        }
    }
}

/// Error codes reported by region-level operations.
///
/// The first three indicate that the target data shard moved, split, or was
/// addressed with a stale route; a refreshed route is expected to succeed, so
/// they form the transient class. `RegionDestroyed` is permanent.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error,
)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    #[error("region version mismatch")]
    RegionVersionMismatch,
    #[error("region not found")]
    RegionNotFound,
    #[error("key out of range")]
    KeyOutOfRange,
    #[error("region destroyed")]
    RegionDestroyed,
}

impl ErrorCode {
    /// Whether a refreshed route makes a retry worthwhile.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            ErrorCode::RegionVersionMismatch | ErrorCode::RegionNotFound | ErrorCode::KeyOutOfRange
        )
    }
}

/// How an operation completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    kind: StatusKind,
    code: Option<ErrorCode>,
    message: String,
}

impl Status {
    pub fn ok() -> Self {
        Self {
            kind: StatusKind::Ok,
            code: None,
            message: String::new(),
        }
    }

    pub fn incomplete(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Incomplete,
            code: Some(code),
            message: message.into(),
        }
    }

    pub fn aborted(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Aborted,
            code: None,
            message: message.into(),
        }
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::ServiceUnavailable,
            code: None,
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::InvalidArgument,
            code: None,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Internal,
            code: None,
            message: message.into(),
        }
    }

    /// Attach or clear the region error code, keeping kind and message.
    pub fn with_code(mut self, code: Option<ErrorCode>) -> Self {
        self.code = code;
        self
    }

    pub fn kind(&self) -> StatusKind {
        self.kind
    }

    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_ok(&self) -> bool {
        self.kind == StatusKind::Ok
    }

    pub fn is_incomplete(&self) -> bool {
        self.kind == StatusKind::Incomplete
    }

    /// Transient-failure classification: `Incomplete` with a transient region
    /// code. Every other non-OK status is final.
    pub fn is_retryable(&self) -> bool {
        self.is_incomplete() && self.code.is_some_and(|code| code.is_transient())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(code) = self.code {
            write!(f, "[{}]", code)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        Ok(())
    }
}
