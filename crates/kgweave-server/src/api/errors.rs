//! Error handling for the kgweave API
//!
//! Every failure is returned as `{"ok": false, "error": {"code", "message"}}`.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use tracing::{error, warn};

use crate::error::ServerError;

/// API Error type for returning standard error responses
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),
    /// Wrapped server error
    ServerError(ServerError),
}

impl From<ServerError> for ApiError {
    fn from(err: ServerError) -> Self {
        ApiError::ServerError(err)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            ApiError::ServerError(err) => write!(f, "Server Error: {}", err),
        }
    }
}

/// Status code and error code for a server error.
fn classify(err: &ServerError) -> (StatusCode, &'static str) {
    match err {
        ServerError::NotFound(_) => (StatusCode::NOT_FOUND, "ERR_NOT_FOUND"),
        ServerError::NoRevisionFound { .. } => (StatusCode::NOT_FOUND, "ERR_NO_REVISION_FOUND"),
        ServerError::PermissionDenied(_) => (StatusCode::FORBIDDEN, "ERR_PERMISSION_DENIED"),
        ServerError::ValidationError(_) => (StatusCode::BAD_REQUEST, "ERR_VALIDATION_ERROR"),
        ServerError::MalformedImport(_) => (StatusCode::BAD_REQUEST, "ERR_MALFORMED_IMPORT"),
        ServerError::CompletionError(_) => (StatusCode::BAD_GATEWAY, "ERR_COMPLETION_ERROR"),
        ServerError::NetworkError(_) => (StatusCode::BAD_GATEWAY, "ERR_NETWORK_ERROR"),
        ServerError::DocumentStoreError(_) => (StatusCode::BAD_GATEWAY, "ERR_DOCUMENT_STORE_ERROR"),
        ServerError::ConfigError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "ERR_CONFIG_ERROR"),
        ServerError::InternalError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "ERR_INTERNAL_SERVER_ERROR"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_code, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "ERR_BAD_REQUEST", msg.clone()),
            ApiError::ServerError(err) => {
                let (status, code) = classify(err);
                (status, code, err.to_string())
            }
        };

        if status.is_server_error() {
            error!(%status, error_code, "{}", message);
        } else {
            warn!(%status, error_code, "{}", message);
        }

        let body = Json(json!({
            "ok": false,
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
