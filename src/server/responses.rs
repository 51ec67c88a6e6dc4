//! Mapping of `AppError` onto HTTP responses.

use crate::error::AppError;
use axum::{
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use tracing::error;

const INTERNAL_ERROR_BODY: &str = "Internal Server Error";

pub fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::DuplicateEntity { .. } | AppError::StillReferenced { .. } => {
            StatusCode::CONFLICT
        }
        AppError::MissingReference { .. } | AppError::InvalidField { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        AppError::NotFound { .. } => StatusCode::NOT_FOUND,
        AppError::AuthenticationFailure => StatusCode::UNAUTHORIZED,
        AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// A `text/plain` response.
pub fn plain_text(status: StatusCode, body: impl Into<String>) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body.into(),
    )
        .into_response()
}

/// Re-renders a submitted form with the error message, or falls back to the
/// plain error response for server faults.
pub fn form_failure(err: AppError, render: impl FnOnce(&str) -> String) -> Response {
    if !err.is_recoverable() {
        return err.into_response();
    }
    let status = status_for(&err);
    (status, Html(render(&err.to_string()))).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Internal(err) = &self {
            error!("Internal error: {:#}", err);
            return plain_text(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_BODY);
        }
        plain_text(status_for(&self), self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EntityKind;

    #[test]
    fn maps_error_kinds_to_status_codes() {
        let duplicate = AppError::DuplicateEntity {
            entity: EntityKind::Artist,
            key: "Queen".to_string(),
        };
        assert_eq!(status_for(&duplicate), StatusCode::CONFLICT);
        assert_eq!(
            status_for(&AppError::StillReferenced {
                entity: EntityKind::Album,
                id: 1,
                dependents: 2
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&AppError::invalid_field("title", "must not be blank")),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&AppError::NotFound {
                entity: EntityKind::Song,
                id: 3
            }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&AppError::AuthenticationFailure),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn internal_errors_hide_details() {
        let response = AppError::Internal(anyhow::anyhow!("disk on fire")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
