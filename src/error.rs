// Error handling module
// Defines error types and HTTP response conversion

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors surfaced by a probe endpoint while handling a request
#[derive(Error, Debug)]
pub enum ApiError {
    /// No probe is registered under the requested backend/scope pair
    #[error("Unknown probe: {0}")]
    UnknownProbe(String),

    /// The backend driver failed to connect or to read
    #[error("Backend error ({backend}): {source}")]
    Backend {
        backend: String,
        #[source]
        source: DriverError,
    },

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::UnknownProbe(probe) => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("No probe registered for '{}'", probe),
            ),
            ApiError::Backend { backend, source } => {
                tracing::warn!(backend = %backend, error = %source, "Backend read failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "backend_error",
                    format!("{} backend failed: {}", backend, source),
                )
            }
            ApiError::Internal(err) => {
                // Log internal errors
                tracing::error!("Internal error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "message": message,
                "type": error_type,
            }
        }));

        (status, body).into_response()
    }
}

/// Failures raised by a database driver
#[derive(Error, Debug)]
pub enum DriverError {
    /// Could not establish a client/connection
    #[error("connect failed: {0}")]
    Connect(String),

    /// The read itself failed (transport, SQL or upstream status)
    #[error("query failed: {0}")]
    Query(String),

    /// The upstream answered with something we could not decode
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for DriverError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            DriverError::Decode(err.to_string())
        } else if err.is_connect() || err.is_builder() {
            DriverError::Connect(err.to_string())
        } else {
            DriverError::Query(err.to_string())
        }
    }
}

impl From<rusqlite::Error> for DriverError {
    fn from(err: rusqlite::Error) -> Self {
        DriverError::Query(err.to_string())
    }
}

/// Errors from the trial harness
#[derive(Error, Debug, PartialEq, Eq)]
pub enum HarnessError {
    /// A run is already in progress; runs are never queued
    #[error("a run is already in progress")]
    AlreadyRunning,
}

/// Result type alias for API operations
pub type Result<T> = std::result::Result<T, ApiError>;
