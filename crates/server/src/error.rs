//! API error types.

use crate::convert::ConversionError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use sqldepot_storage::StorageError;

/// API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error detail.
    pub detail: String,
}

/// Failure of an upload operation.
///
/// Rollback failures never appear here: the caller always sees the step
/// that failed first.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("invalid file name: {0}")]
    InvalidIdentifier(String),

    /// The identifier is already taken on disk or by an upload in progress.
    #[error("{0}")]
    Collision(String),

    #[error("there was an error copying the uploaded file into server storage")]
    Write(#[source] StorageError),

    #[error("directory creation failed")]
    Directory(#[source] StorageError),

    #[error(
        "couldn't create a database file from the uploaded file, ensure an SQL file is being uploaded"
    )]
    Conversion(#[source] ConversionError),
}

impl UploadError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidIdentifier(_) => "invalid_identifier",
            Self::Collision(_) => "name_collision",
            Self::Write(_) => "write_error",
            Self::Directory(_) => "directory_error",
            Self::Conversion(_) => "conversion_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidIdentifier(_) | Self::Collision(_) => StatusCode::BAD_REQUEST,
            Self::Write(_) | Self::Directory(_) | Self::Conversion(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ApiError {
    /// Get the error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::Upload(e) => e.code(),
            Self::Storage(_) => "storage_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upload(e) => e.status_code(),
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            code: self.code().to_string(),
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
