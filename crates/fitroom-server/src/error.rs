//! HTTP error mapping.

use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use fitroom_core::FitroomError;
use serde::Serialize;
use serde_json::json;

/// Wraps the domain error for axum responses.
#[derive(Debug)]
pub struct ApiError(pub FitroomError);

impl From<FitroomError> for ApiError {
    fn from(err: FitroomError) -> Self {
        Self(err)
    }
}

/// Malformed request bodies (bad JSON, unknown enum values) surface as the
/// same validation error shape as domain validation failures.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(FitroomError::validation(rejection.body_text()))
    }
}

/// `axum::Json` with rejections mapped onto [`ApiError`], so handlers get a
/// 400 `validation_error` body instead of axum's default 422.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            FitroomError::NotFound { .. } => StatusCode::NOT_FOUND,
            FitroomError::Forbidden(_) => StatusCode::FORBIDDEN,
            FitroomError::Conflict(_) => StatusCode::CONFLICT,
            FitroomError::Validation(_) => StatusCode::BAD_REQUEST,
            FitroomError::DataAccess(_) | FitroomError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn kind(&self) -> &'static str {
        match &self.0 {
            FitroomError::NotFound { .. } => "not_found",
            FitroomError::Forbidden(_) => "forbidden",
            FitroomError::Conflict(_) => "conflict",
            FitroomError::Validation(_) => "validation_error",
            FitroomError::DataAccess(_) | FitroomError::Internal(_) => "server_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("[API] internal error: {}", self.0);
        }
        let body = Json(json!({
            "error": self.kind(),
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}
