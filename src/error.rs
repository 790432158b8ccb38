//! Error types for image-zip-dl
//!
//! This module provides error handling for the library, including:
//! - The crate-wide [`Error`] and its [`Result`] alias
//! - [`FetchError`], the per-item failure recorded on an item instead of propagated
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use utoipa::ToSchema;

use crate::types::TaskId;

/// Result type alias for image-zip-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for image-zip-dl
///
/// Failures of a single URL never surface here; they are captured as
/// [`FetchError`] on the item. This type covers task plumbing and the
/// service surface.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "CHUNK_SIZE")
        key: Option<String>,
    },

    /// Submission contained no usable URL
    #[error("no urls provided")]
    EmptySubmission,

    /// Malformed request body or parameter
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No task registered under the identifier
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// Path parameter is not a well-formed task identifier, so no task can match
    #[error("task not found: '{0}' is not a task identifier")]
    MalformedTaskId(String),

    /// Archive file for the task does not exist (not finished yet, or swept)
    #[error("archive not found for task {id}")]
    ArchiveNotFound {
        /// The task whose archive was requested
        id: TaskId,
        /// The path where the archive was expected
        path: PathBuf,
    },

    /// Missing or invalid credentials
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Building or finishing the ZIP archive failed
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error outside of a task item (client construction)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Shutdown in progress - not accepting new tasks
    #[error("shutdown in progress: not accepting new tasks")]
    ShuttingDown,
}

/// Failure of a single URL fetch
///
/// The `Display` output is the human-readable reason shown on the failed item.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The URL could not be parsed
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// Connecting, or waiting for the next read, exceeded the configured timeout
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The connection to the host could not be established
    #[error("connection failed: {0}")]
    Connect(String),

    /// The server answered with a non-2xx status
    #[error("HTTP status {status}")]
    Status {
        /// The status code returned by the server
        status: u16,
    },

    /// Reading the response body failed midway
    #[error("transfer failed: {0}")]
    Body(String),

    /// Any other request failure
    #[error("request failed: {0}")]
    Request(String),
}

/// API error response format
///
/// This structure is returned by API endpoints when an error occurs.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "task_not_found",
///     "message": "task not found: 7b0c...",
///     "details": {
///       "task_id": "7b0c..."
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "task_not_found", "empty_submission")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an "unauthorized" error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("unauthorized", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,
            Error::EmptySubmission => 400,
            Error::InvalidRequest(_) => 400,

            // 401 Unauthorized
            Error::Unauthorized(_) => 401,

            // 404 Not Found
            Error::TaskNotFound(_) => 404,
            Error::MalformedTaskId(_) => 404,
            Error::ArchiveNotFound { .. } => 404,

            // 500 Internal Server Error - Server-side issues
            Error::Archive(_) => 500,
            Error::Io(_) => 500,
            Error::ApiServerError(_) => 500,

            // 502 Bad Gateway - External service errors
            Error::Network(_) => 502,

            // 503 Service Unavailable
            Error::ShuttingDown => 503,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::EmptySubmission => "empty_submission",
            Error::InvalidRequest(_) => "invalid_request",
            Error::TaskNotFound(_) | Error::MalformedTaskId(_) => "task_not_found",
            Error::ArchiveNotFound { .. } => "archive_not_found",
            Error::Unauthorized(_) => "unauthorized",
            Error::Archive(_) => "archive_error",
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::ShuttingDown => "shutting_down",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::TaskNotFound(id) => Some(serde_json::json!({
                "task_id": id,
            })),
            Error::ArchiveNotFound { id, .. } => Some(serde_json::json!({
                "task_id": id,
            })),
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn all_error_variants() -> Vec<(Error, u16, &'static str)> {
        let id = TaskId::new();
        vec![
            (
                Error::Config {
                    message: "bad value".into(),
                    key: Some("CHUNK_SIZE".into()),
                },
                400,
                "config_error",
            ),
            (Error::EmptySubmission, 400, "empty_submission"),
            (
                Error::InvalidRequest("missing urls".into()),
                400,
                "invalid_request",
            ),
            (Error::Unauthorized("no session".into()), 401, "unauthorized"),
            (Error::TaskNotFound(id), 404, "task_not_found"),
            (
                Error::MalformedTaskId("../etc".into()),
                404,
                "task_not_found",
            ),
            (
                Error::ArchiveNotFound {
                    id,
                    path: PathBuf::from("/tmp/x.zip"),
                },
                404,
                "archive_not_found",
            ),
            (
                Error::Io(std::io::Error::other("disk full")),
                500,
                "io_error",
            ),
            (
                Error::ApiServerError("bind failed".into()),
                500,
                "api_server_error",
            ),
            (Error::ShuttingDown, 503, "shutting_down"),
        ]
    }

    #[test]
    fn every_variant_maps_to_expected_status_and_code() {
        for (error, status, code) in all_error_variants() {
            assert_eq!(error.status_code(), status, "status for {error:?}");
            assert_eq!(error.error_code(), code, "code for {error:?}");
        }
    }

    #[test]
    fn task_not_found_carries_task_id_detail() {
        let id = TaskId::new();
        let api_error: ApiError = Error::TaskNotFound(id).into();

        assert_eq!(api_error.error.code, "task_not_found");
        assert!(api_error.error.message.contains(&id.to_string()));
        let details = api_error.error.details.unwrap();
        assert_eq!(details["task_id"], id.to_string());
    }

    #[test]
    fn empty_submission_has_no_details() {
        let api_error: ApiError = Error::EmptySubmission.into();
        assert_eq!(api_error.error.code, "empty_submission");
        assert_eq!(api_error.error.message, "no urls provided");
        assert!(api_error.error.details.is_none());

        let json = serde_json::to_value(&api_error).unwrap();
        assert!(json["error"].get("details").is_none());
    }

    #[test]
    fn fetch_error_reasons_are_human_readable() {
        assert_eq!(
            FetchError::Status { status: 404 }.to_string(),
            "HTTP status 404"
        );
        assert_eq!(
            FetchError::Timeout(Duration::from_secs(20)).to_string(),
            "request timed out after 20s"
        );
        assert_eq!(
            FetchError::Timeout(Duration::from_millis(500)).to_string(),
            "request timed out after 500ms"
        );
        assert!(
            FetchError::Connect("refused".into())
                .to_string()
                .starts_with("connection failed")
        );
    }
}
