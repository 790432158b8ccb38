//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`tasks`] — Task submission, progress stream, archive download
//! - [`session`] — Login and logout
//! - [`system`] — Health and OpenAPI

use crate::error::{Error, Result};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

mod session;
mod system;
mod tasks;

// Re-export all handlers so `routes::function_name` works
pub use session::*;
pub use system::*;
pub use tasks::*;

/// Unwrap a JSON body, reporting a malformed one as [`Error::InvalidRequest`]
fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| Error::InvalidRequest(rejection.body_text()))
}

// ============================================================================
// Request/Response Types (shared across handlers)
// ============================================================================

/// Request body for POST /start
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct StartRequest {
    /// Newline-separated image URLs; blank lines are ignored
    #[schema(example = "https://example.com/a.png\nhttps://example.com/b.jpg")]
    pub urls: String,
}

/// Response body for POST /start
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct StartResponse {
    /// Identifier for progress and download routes
    pub task_id: crate::types::TaskId,
}

/// Request body for POST /login
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LoginRequest {
    /// User name
    pub username: String,
    /// Password
    pub password: String,
}

/// Response body for GET /health
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Always "ok" when the server answers
    pub status: String,
    /// Number of tasks registered since startup
    pub tasks: usize,
}
