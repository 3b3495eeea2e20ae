// Error to HTTP status mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::errors::{LlmError, TransportError};

/// A handler failure rendered as `{"error": "<message>"}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<LlmError> for ApiError {
    fn from(err: LlmError) -> Self {
        let status = match &err {
            LlmError::NotConfigured { .. } | LlmError::NoProviderConfigured => {
                StatusCode::PRECONDITION_FAILED
            }
            LlmError::UnknownProvider(_) => StatusCode::NOT_FOUND,
            LlmError::ProviderApi { .. } => StatusCode::BAD_GATEWAY,
            LlmError::Transport(TransportError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            LlmError::Transport(_) => StatusCode::BAD_GATEWAY,
            LlmError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::warn!("Request failed ({}): {}", self.status, self.message);
        }
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
