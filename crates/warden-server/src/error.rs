//! HTTP mapping for [`WardenError`].

use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;
use warden_core::error::WardenError;

/// JSON error body: `{"error": <kind>, "message": <text>}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

/// Error returned by every handler.
#[derive(Debug)]
pub struct ApiError(pub WardenError);

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            WardenError::Validation { .. } => StatusCode::BAD_REQUEST,
            WardenError::AuthenticationFailed { .. } => StatusCode::UNAUTHORIZED,
            WardenError::Conflict { .. } => StatusCode::CONFLICT,
            WardenError::NotFound { .. } => StatusCode::NOT_FOUND,
            WardenError::Database(_)
            | WardenError::Io(_)
            | WardenError::Crypto(_)
            | WardenError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<WardenError> for ApiError {
    fn from(err: WardenError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(WardenError::validation(rejection.body_text()))
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self(WardenError::validation(err.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            // Details stay in the log.
            error!(error = %self.0, "Request failed");
            "Internal server error".to_string()
        } else {
            self.0.to_string()
        };

        let body = ErrorBody {
            error: self.0.kind(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_per_kind() {
        let cases = [
            (WardenError::validation("bad"), StatusCode::BAD_REQUEST),
            (
                WardenError::AuthenticationFailed { reason: "no".into() },
                StatusCode::UNAUTHORIZED,
            ),
            (WardenError::conflict("Email in use"), StatusCode::CONFLICT),
            (WardenError::not_found("User", "x"), StatusCode::NOT_FOUND),
            (WardenError::Io("disk".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).status(), status);
        }
    }

    #[test]
    fn internal_details_are_not_exposed() {
        let response = ApiError(WardenError::Database("socket closed".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
