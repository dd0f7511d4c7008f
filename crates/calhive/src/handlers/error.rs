use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use calhive_core::storage::{repository_error_to_status_code, RepositoryError};
use calhive_core::{error_kind_to_status_code, ErrorKind, ServiceError};

use crate::identity::IdentityError;

/// Error response for every handler: `{"error": <message>, "kind": <kind>}`.
pub struct AppError(pub anyhow::Error);

impl AppError {
    fn classify(&self) -> (StatusCode, &'static str) {
        if let Some(err) = self.0.downcast_ref::<ServiceError>() {
            let kind = err.kind();
            return (status(error_kind_to_status_code(kind)), kind.as_str());
        }

        if let Some(err) = self.0.downcast_ref::<IdentityError>() {
            if err.is_unauthorized() {
                return (StatusCode::UNAUTHORIZED, "unauthorized");
            }
            if let IdentityError::Directory(repo) = err {
                return repository_status(repo);
            }
        }

        if let Some(err) = self.0.downcast_ref::<RepositoryError>() {
            return repository_status(err);
        }

        if let Some(rejection) = self.0.downcast_ref::<JsonRejection>() {
            return rejection_status(rejection.status());
        }
        if let Some(rejection) = self.0.downcast_ref::<PathRejection>() {
            return rejection_status(rejection.status());
        }

        (StatusCode::INTERNAL_SERVER_ERROR, "internal")
    }
}

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

fn repository_status(err: &RepositoryError) -> (StatusCode, &'static str) {
    let kind = ServiceError::from(err.clone()).kind();
    (status(repository_error_to_status_code(err)), kind.as_str())
}

fn rejection_status(code: StatusCode) -> (StatusCode, &'static str) {
    if code.is_client_error() {
        (code, ErrorKind::Validation.as_str())
    } else {
        (code, "internal")
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status_code, kind) = self.classify();

        if status_code.is_server_error() {
            tracing::error!(error = %self.0, kind, "Request failed");
        } else {
            tracing::warn!(error = %self.0, kind, status = status_code.as_u16(), "Request rejected");
        }

        let body = json!({ "error": self.0.to_string(), "kind": kind });
        (status_code, Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
