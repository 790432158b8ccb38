//! Task route handlers: submission, progress stream, archive download

use super::{StartRequest, StartResponse, json_body};
use crate::api::AppState;
use crate::error::{Error, Result};
use crate::types::TaskId;
use axum::{
    Json,
    body::Body,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{
        IntoResponse, Response,
        sse::{Event as SseEvent, KeepAlive, Sse},
    },
};
use futures::stream::{self, BoxStream, StreamExt};
use std::convert::Infallible;
use tokio_util::io::ReaderStream;

/// File name offered to the browser for every archive
const DOWNLOAD_FILE_NAME: &str = "images.zip";

/// Parse a task identifier from a path segment
///
/// A malformed identifier cannot name any task, so it is reported as not found.
fn parse_task_id(raw: &str) -> Result<TaskId> {
    raw.parse()
        .map_err(|_| Error::MalformedTaskId(raw.to_string()))
}

/// POST /start - Submit a batch of image URLs
#[utoipa::path(
    post,
    path = "/start",
    tag = "tasks",
    request_body = StartRequest,
    responses(
        (status = 200, description = "Task created", body = StartResponse),
        (status = 400, description = "No URL in the submission, or malformed body", body = crate::error::ApiError),
        (status = 401, description = "Login required", body = crate::error::ApiError),
        (status = 503, description = "Server is shutting down", body = crate::error::ApiError)
    ),
    security(("session" = []), ("api_key" = []))
)]
pub async fn start_task(
    State(state): State<AppState>,
    payload: std::result::Result<Json<StartRequest>, JsonRejection>,
) -> Result<Json<StartResponse>> {
    let request = json_body(payload)?;
    let task_id = state.downloader.submit_raw(&request.urls).await?;
    Ok(Json(StartResponse { task_id }))
}

/// GET /progress/:task_id - Server-sent progress snapshots
///
/// Each event carries one snapshot as JSON. The stream ends after the
/// snapshot with `done: true`. An unknown task yields a single
/// `{"error":"task not found"}` event.
#[utoipa::path(
    get,
    path = "/progress/{task_id}",
    tag = "tasks",
    params(
        ("task_id" = String, Path, description = "Task identifier")
    ),
    responses(
        (status = 200, description = "Progress snapshot stream (text/event-stream)", content_type = "text/event-stream", body = crate::types::ProgressSnapshot),
        (status = 401, description = "Login required", body = crate::error::ApiError)
    ),
    security(("session" = []), ("api_key" = []))
)]
pub async fn progress_stream(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Sse<BoxStream<'static, std::result::Result<SseEvent, Infallible>>> {
    let channel = match parse_task_id(&task_id) {
        Ok(id) => state.downloader.subscribe(id).await.ok(),
        Err(_) => None,
    };

    let events: BoxStream<'static, std::result::Result<SseEvent, Infallible>> = match channel {
        Some(channel) => channel
            .snapshots(state.config.api.poll_interval)
            .map(|snapshot| {
                let event = match serde_json::to_string(&snapshot) {
                    Ok(json_data) => SseEvent::default().data(json_data),
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to serialize progress snapshot");
                        SseEvent::default().data(r#"{"error":"serialization failed"}"#)
                    }
                };
                Ok(event)
            })
            .boxed(),
        None => {
            tracing::debug!(%task_id, "Progress requested for unknown task");
            stream::once(async {
                Ok(SseEvent::default().data(r#"{"error":"task not found"}"#))
            })
            .boxed()
        }
    };

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// GET /download_final/:task_id - Download the finished archive
#[utoipa::path(
    get,
    path = "/download_final/{task_id}",
    tag = "tasks",
    params(
        ("task_id" = String, Path, description = "Task identifier")
    ),
    responses(
        (status = 200, description = "ZIP archive", content_type = "application/zip"),
        (status = 401, description = "Login required", body = crate::error::ApiError),
        (status = 404, description = "Archive missing, expired, or task unknown", body = crate::error::ApiError)
    ),
    security(("session" = []), ("api_key" = []))
)]
pub async fn download_final(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Response> {
    let id = parse_task_id(&task_id)?;
    let (file, len) = state.downloader.open_archive(id).await?;

    tracing::debug!(task_id = %id, bytes = len, "Serving archive");

    let body = Body::from_stream(ReaderStream::new(file));
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{DOWNLOAD_FILE_NAME}\""),
            ),
            (header::CONTENT_LENGTH, len.to_string()),
        ],
        body,
    )
        .into_response())
}
