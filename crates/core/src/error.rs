//! Domain error taxonomy shared by the services and the transport layer.

use thiserror::Error;

use crate::calendar::{CalendarError, EventError};
use crate::storage::RepositoryError;

/// Classification of a [`ServiceError`], independent of its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    NotFound,
    PermissionDenied,
    Conflict,
    Storage,
    Unavailable,
    Cancelled,
    DeadlineExceeded,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Storage => "storage",
            ErrorKind::Unavailable => "unavailable",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::DeadlineExceeded => "deadline_exceeded",
        }
    }
}

/// Errors returned by the calendar and event services.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error(transparent)]
    Calendar(#[from] CalendarError),
    #[error(transparent)]
    Event(#[from] EventError),
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Storage error: {0}")]
    Storage(RepositoryError),
    #[error("Operation cancelled")]
    Cancelled,
    #[error("Operation deadline exceeded")]
    DeadlineExceeded,
}

impl ServiceError {
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        ServiceError::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    pub fn permission_denied(reason: impl Into<String>) -> Self {
        ServiceError::PermissionDenied(reason.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Calendar(_) | ServiceError::Event(_) => ErrorKind::Validation,
            ServiceError::NotFound { .. } => ErrorKind::NotFound,
            ServiceError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            ServiceError::Storage(RepositoryError::AlreadyExists { .. }) => ErrorKind::Conflict,
            ServiceError::Storage(RepositoryError::ConnectionFailed(_)) => ErrorKind::Unavailable,
            ServiceError::Storage(_) => ErrorKind::Storage,
            ServiceError::Cancelled => ErrorKind::Cancelled,
            ServiceError::DeadlineExceeded => ErrorKind::DeadlineExceeded,
        }
    }
}

/// Store errors pass through verbatim, except that not-found, cancellation and
/// deadline keep their own domain kinds.
impl From<RepositoryError> for ServiceError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound { entity_type, id } => {
                ServiceError::NotFound { entity_type, id }
            }
            RepositoryError::Cancelled => ServiceError::Cancelled,
            RepositoryError::DeadlineExceeded => ServiceError::DeadlineExceeded,
            other => ServiceError::Storage(other),
        }
    }
}

/// Maps an [`ErrorKind`] to an HTTP status code.
///
/// ```
/// use calhive_core::{error_kind_to_status_code, ErrorKind};
///
/// assert_eq!(error_kind_to_status_code(ErrorKind::PermissionDenied), 403);
/// ```
pub fn error_kind_to_status_code(kind: ErrorKind) -> u16 {
    match kind {
        ErrorKind::Validation => 400,
        ErrorKind::PermissionDenied => 403,
        ErrorKind::NotFound => 404,
        ErrorKind::Conflict => 409,
        ErrorKind::Storage => 500,
        ErrorKind::Unavailable => 503,
        ErrorKind::Cancelled => 499,
        ErrorKind::DeadlineExceeded => 504,
    }
}
