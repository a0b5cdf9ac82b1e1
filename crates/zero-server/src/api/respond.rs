//! Shared error-writing helper.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use zero_core::ZeroError;

/// Error envelope `{"httpStatus": <int>, "error": <string>}`.
///
/// Returning one ends the handler; the failure is logged when the response is
/// built.
#[derive(Debug)]
pub struct ErrorResponse {
    status: StatusCode,
    message: String,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<ZeroError> for ErrorResponse {
    fn from(e: ZeroError) -> Self {
        let status = StatusCode::from_u16(e.client_code().http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, e.to_string())
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        tracing::error!(status = self.status.as_u16(), error = %self.message, "request failed");
        let body = json!({
            "httpStatus": self.status.as_u16(),
            "error": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}
