//! Error types and response handling for the screen service.
//!
//! Every failure leaves the service as a flat JSON body
//! `{"error": "<type>", "message": "<text>"}` with a matching status code.

use std::net::SocketAddr;

use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::resolve::ResolveError;

/// Errors that can occur while serving screen requests.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Screen resolution failed
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Invalid query parameters or request body
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Listener could not be opened
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Server loop failed
    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn invalid_bind_addr(addr: &str, reason: impl std::fmt::Display) -> Self {
        ServerError::Bind {
            addr: addr.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, reason.to_string()),
        }
    }

    pub(crate) fn bind_failed(addr: SocketAddr, source: std::io::Error) -> Self {
        ServerError::Bind {
            addr: addr.to_string(),
            source,
        }
    }

    /// Map error variant to appropriate HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Resolve(ResolveError::InvalidScreenId) => StatusCode::BAD_REQUEST,
            ServerError::Resolve(ResolveError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ServerError::Resolve(ResolveError::StoreUnavailable(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ServerError::Resolve(ResolveError::InvalidTemplate { .. }) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Bind { .. } | ServerError::Io(_) | ServerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get error type string for JSON responses
    pub fn error_type(&self) -> &'static str {
        match self {
            ServerError::Resolve(ResolveError::InvalidScreenId) => "invalid_screen_id",
            ServerError::Resolve(ResolveError::NotFound { .. }) => "not_found",
            ServerError::Resolve(ResolveError::StoreUnavailable(_)) => "store_unavailable",
            ServerError::Resolve(ResolveError::InvalidTemplate { .. }) => "invalid_template",
            ServerError::InvalidRequest(_) => "invalid_request",
            ServerError::Bind { .. } | ServerError::Io(_) | ServerError::Internal(_) => {
                "internal_error"
            }
        }
    }
}

impl From<QueryRejection> for ServerError {
    fn from(rejection: QueryRejection) -> Self {
        ServerError::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ServerError {
    fn from(rejection: PathRejection) -> Self {
        ServerError::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, error_type = self.error_type(), "Request failed");
        } else {
            tracing::debug!(error = %self, error_type = self.error_type(), "Request rejected");
        }

        let body = serde_json::json!({
            "error": self.error_type(),
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;
    use http_body_util::BodyExt;

    #[test]
    fn test_not_found_status_code() {
        let err = ServerError::from(ResolveError::NotFound {
            screen_id: "missing".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.error_type(), "not_found");
    }

    #[test]
    fn test_store_unavailable_status_code() {
        let err = ServerError::from(ResolveError::StoreUnavailable(StoreError::Unavailable {
            store: "directory",
            reason: "gone".to_string(),
        }));
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.error_type(), "store_unavailable");
    }

    #[test]
    fn test_invalid_request_status_code() {
        let err = ServerError::InvalidRequest("bad serviceDate".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_type(), "invalid_request");
    }

    #[tokio::test]
    async fn test_error_response_format() {
        let err = ServerError::from(ResolveError::NotFound {
            screen_id: "home".to_string(),
        });
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "not_found");
        assert_eq!(body["message"], "Screen 'home' not found");
    }
}
