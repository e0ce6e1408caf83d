//! API error type and HTTP status mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

/// Errors surfaced to HTTP clients as `{ "detail": … }` bodies.
#[derive(Debug)]
pub enum ApiError {
    /// 400: rejected input, unfetchable URL, or an undecodable document.
    BadRequest(String),
    /// 500: internal pipeline failure; no internal detail is leaked.
    Internal,
}

impl From<qrx_core::Error> for ApiError {
    fn from(e: qrx_core::Error) -> Self {
        match e {
            qrx_core::Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            qrx_core::Error::DocumentDecode(msg) => {
                ApiError::BadRequest(format!("Could not decode document: {}", msg))
            }
            other => {
                error!(error = %other, "extraction pipeline failure");
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error".to_string(),
            ),
        };
        (status, Json(serde_json::json!({ "detail": detail }))).into_response()
    }
}
