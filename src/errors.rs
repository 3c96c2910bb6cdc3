//! Application-level errors surfaced by the control server and the CLI.

use agent_core::{ExplorerError, OracleError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WebprobeError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Explorer(#[from] ExplorerError),

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl WebprobeError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            WebprobeError::InvalidRequest(_) => "INVALID_REQUEST",
            WebprobeError::NotFound(_) => "NOT_FOUND",
            WebprobeError::Conflict(_) => "CONFLICT",
            WebprobeError::Explorer(_) => "DOCUMENT_OPEN_FAILED",
            WebprobeError::Oracle(_) => "ORACLE_FAILED",
            WebprobeError::Config(_) => "INVALID_CONFIG",
            WebprobeError::Io(_) => "IO",
            WebprobeError::Internal(_) => "INTERNAL",
        }
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            WebprobeError::InvalidRequest(_) | WebprobeError::Config(_) => StatusCode::BAD_REQUEST,
            WebprobeError::NotFound(_) => StatusCode::NOT_FOUND,
            WebprobeError::Conflict(_) => StatusCode::CONFLICT,
            WebprobeError::Explorer(_) | WebprobeError::Oracle(_) => StatusCode::BAD_GATEWAY,
            WebprobeError::Io(_) | WebprobeError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Whether repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            WebprobeError::Explorer(ExplorerError::DocumentOpen(err)) => err.is_retryable(),
            WebprobeError::Oracle(err) => matches!(
                err,
                OracleError::Transport(_) | OracleError::Status { .. }
            ),
            WebprobeError::Io(_) => true,
            _ => false,
        }
    }
}

impl IntoResponse for WebprobeError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        let body = json!({
            "success": false,
            "error": self.to_string(),
            "code": self.code(),
            "retryable": self.is_retryable(),
        });
        (status, Json(body)).into_response()
    }
}

pub type WebprobeResult<T> = Result<T, WebprobeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use action_primitives::ActionError;

    #[test]
    fn document_open_failures_map_to_bad_gateway() {
        let err: WebprobeError =
            ExplorerError::DocumentOpen(ActionError::CdpIo("socket closed".into())).into();
        assert_eq!(err.http_status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.code(), "DOCUMENT_OPEN_FAILED");
        assert!(err.is_retryable());

        let invalid: WebprobeError =
            ExplorerError::DocumentOpen(ActionError::InvalidUrl("ftp://x".into())).into();
        assert!(!invalid.is_retryable());
    }

    #[test]
    fn request_errors_are_client_errors() {
        let err = WebprobeError::invalid_request("url is required");
        assert_eq!(err.http_status(), StatusCode::BAD_REQUEST);
        assert!(!err.is_retryable());
        assert_eq!(
            WebprobeError::Conflict("run active".into()).http_status(),
            StatusCode::CONFLICT
        );
    }
}
