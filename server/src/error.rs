use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tokio::task::JoinError;

use dentflow::{ConfigError, DatabaseError, DentflowError};

/// Failure of a request, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    Service(DentflowError),
    /// The blocking task running the service call panicked or was cancelled.
    Worker(JoinError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        let ApiError::Service(err) = self else {
            return StatusCode::INTERNAL_SERVER_ERROR;
        };
        match err {
            DentflowError::DuplicateIdentifier { .. } => StatusCode::CONFLICT,
            DentflowError::NotFound { .. } => StatusCode::NOT_FOUND,
            DentflowError::DependencyMissing(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DentflowError::Invalid(_) => StatusCode::BAD_REQUEST,
            DentflowError::Config(_) | DentflowError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Service(err) => err.to_string(),
            ApiError::Worker(_) => "internal error".to_string(),
        }
    }
}

impl From<DentflowError> for ApiError {
    fn from(err: DentflowError) -> Self {
        ApiError::Service(err)
    }
}

impl From<JoinError> for ApiError {
    fn from(err: JoinError) -> Self {
        ApiError::Worker(err)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Service(err) => err.fmt(f),
            ApiError::Worker(err) => write!(f, "service task failed: {}", err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }
        (status, Json(json!({ "error": self.message() }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("No database path configured and no home directory to default to")]
    NoDatabasePath,

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Failed to initialise logging: {0}")]
    Logging(String),

    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}
