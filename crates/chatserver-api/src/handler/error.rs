//! Caller-facing error taxonomy and envelope format.

use serde_json::json;
use thiserror::Error;

use chatserver_types::error::ChatError;

/// Coarse status reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiStatus {
    InvalidArgument,
    NotFound,
    Cancelled,
    DeadlineExceeded,
    Internal,
}

impl ApiStatus {
    /// Stable machine-readable code used in the JSON envelope.
    pub fn code(self) -> &'static str {
        match self {
            ApiStatus::InvalidArgument => "INVALID_ARGUMENT",
            ApiStatus::NotFound => "NOT_FOUND",
            ApiStatus::Cancelled => "CANCELLED",
            ApiStatus::DeadlineExceeded => "DEADLINE_EXCEEDED",
            ApiStatus::Internal => "INTERNAL",
        }
    }

    /// Process exit code for the `chatd` binary.
    pub fn exit_code(self) -> u8 {
        match self {
            ApiStatus::InvalidArgument => 2,
            ApiStatus::NotFound => 3,
            ApiStatus::Cancelled | ApiStatus::DeadlineExceeded => 4,
            ApiStatus::Internal => 1,
        }
    }
}

/// Error returned by request handlers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    pub status: ApiStatus,
    pub message: String,
}

impl ApiError {
    pub fn new(status: ApiStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ApiStatus::InvalidArgument, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ApiStatus::Internal, message)
    }

    /// Render as the `{ data, errors }` envelope.
    pub fn to_envelope(&self) -> serde_json::Value {
        json!({
            "data": null,
            "errors": [{
                "code": self.status.code(),
                "message": self.message,
            }]
        })
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        let status = match &err {
            ChatError::NotFound { .. } | ChatError::UserNotInChat { .. } => ApiStatus::NotFound,
            ChatError::Validation(_) => ApiStatus::InvalidArgument,
            ChatError::Cancelled => ApiStatus::Cancelled,
            ChatError::DeadlineExceeded => ApiStatus::DeadlineExceeded,
            ChatError::Storage(_) => ApiStatus::Internal,
        };
        ApiError::new(status, err.to_string())
    }
}
