//! Login and logout handlers

use super::{LoginRequest, json_body};
use crate::api::AppState;
use crate::api::auth::{constant_time_eq, expired_session_cookie, session_cookie, session_token};
use crate::error::{Error, Result};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

/// POST /login - Exchange credentials for a session cookie
#[utoipa::path(
    post,
    path = "/login",
    tag = "session",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; session cookie set"),
        (status = 400, description = "Malformed body", body = crate::error::ApiError),
        (status = 401, description = "Invalid credentials", body = crate::error::ApiError)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response> {
    let request = json_body(payload)?;
    let auth = &state.config.auth;
    // Evaluate both comparisons so timing does not reveal which one failed
    let user_ok = constant_time_eq(request.username.as_bytes(), auth.username.as_bytes());
    let pass_ok = constant_time_eq(request.password.as_bytes(), auth.password.as_bytes());
    if !(user_ok & pass_ok) {
        tracing::warn!(username = %request.username, "Rejected login attempt");
        return Err(Error::Unauthorized("invalid username or password".to_string()));
    }

    let token = state.sessions.create().await;
    tracing::info!(username = %request.username, "User logged in");

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, session_cookie(&token))],
        Json(json!({ "status": "ok" })),
    )
        .into_response())
}

/// POST /logout - Drop the current session
#[utoipa::path(
    post,
    path = "/logout",
    tag = "session",
    responses(
        (status = 200, description = "Logged out; session cookie expired")
    )
)]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(token) = session_token(&headers) {
        state.sessions.remove(&token).await;
    }

    (
        StatusCode::OK,
        [(header::SET_COOKIE, expired_session_cookie())],
        Json(json!({ "status": "ok" })),
    )
}
