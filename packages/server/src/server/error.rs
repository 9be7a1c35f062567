//! HTTP error taxonomy.
//!
//! Every externally visible failure is a JSON object with `error` and
//! `message` keys and a fixed status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::kernel::search::ServiceError;

/// Wire format for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

/// API-level errors with their HTTP mapping.
#[derive(Debug)]
pub enum ApiError {
    /// Required credential absent; no LLM call was attempted
    MissingApiKey,
    /// Caller input insufficient
    BadRequest(String),
    /// LLM call failed, after the fallback retry when one applied
    Upstream(String),
    /// Unexpected failure outside the classified paths
    Internal(String),
}

impl ApiError {
    fn parts(self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::MissingApiKey => (
                StatusCode::BAD_REQUEST,
                "missing_api_key",
                "OPENAI_API_KEY is not set on the server.".to_string(),
            ),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, "bad_request", message),
            ApiError::Upstream(message) => (StatusCode::BAD_GATEWAY, "openai_api_error", message),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "server_error", message)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = self.parts();
        if status.is_server_error() {
            tracing::error!(error = error, message = %message, "request failed");
        } else {
            tracing::warn!(error = error, message = %message, "request rejected");
        }
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::MissingApiKey => ApiError::MissingApiKey,
            ServiceError::BadRequest(message) => ApiError::BadRequest(message),
            ServiceError::Upstream(message) => ApiError::Upstream(message),
            ServiceError::Internal(message) => ApiError::Internal(message),
        }
    }
}
