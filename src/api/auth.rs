//! Session gate for the REST API
//!
//! Task routes require either a session cookie obtained from `POST /login`
//! or, when `AuthConfig::api_key` is set, a matching X-Api-Key header.
//! Anything else receives a 401 Unauthorized response.

use crate::api::AppState;
use crate::error::ApiError;
use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use rand::Rng;
use rand::distributions::Alphanumeric;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "img_session";

const TOKEN_LEN: usize = 32;

/// In-memory set of issued session tokens
///
/// Sessions live until logout or process exit.
#[derive(Clone, Default)]
pub struct SessionStore {
    tokens: Arc<RwLock<HashSet<String>>>,
}

impl SessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue and remember a fresh random token
    pub async fn create(&self) -> String {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LEN)
            .map(char::from)
            .collect();
        self.tokens.write().await.insert(token.clone());
        token
    }

    /// Whether `token` was issued and not revoked
    pub async fn contains(&self, token: &str) -> bool {
        self.tokens.read().await.contains(token)
    }

    /// Revoke `token`; unknown tokens are ignored
    pub async fn remove(&self, token: &str) {
        self.tokens.write().await.remove(token);
    }
}

/// Extract the session token from the request's Cookie header(s)
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token.to_string())
}

/// `Set-Cookie` value establishing a session
pub fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax")
}

/// `Set-Cookie` value expiring the session cookie
pub fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0")
}

/// Middleware admitting requests with a valid session or API key
///
/// # Returns
///
/// Returns either:
/// - 401 Unauthorized if neither credential is present and valid
/// - The response from the next handler otherwise
pub async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let auth = &state.config.auth;
    if !auth.enabled {
        return next.run(request).await;
    }

    if let Some(expected_key) = auth.api_key.as_deref() {
        let provided = request
            .headers()
            .get("x-api-key")
            .and_then(|value| value.to_str().ok());
        match provided {
            Some(provided) if constant_time_eq(provided.as_bytes(), expected_key.as_bytes()) => {
                return next.run(request).await;
            }
            Some(_) => return unauthorized_response("Invalid API key"),
            None => {}
        }
    }

    match session_token(request.headers()) {
        Some(token) if state.sessions.contains(&token).await => next.run(request).await,
        Some(_) => unauthorized_response("Invalid or expired session"),
        None => unauthorized_response("Login required"),
    }
}

/// Constant-time byte comparison to prevent timing side-channel attacks.
/// Always compares all bytes regardless of where the first mismatch occurs.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// Helper function to create a 401 Unauthorized response with a JSON error message
fn unauthorized_response(message: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(ApiError::unauthorized(message))).into_response()
}
