//! REST API server module
//!
//! Serves task submission, the server-sent progress stream, and archive
//! downloads behind a session gate, plus login, health and OpenAPI routes.

use crate::{Config, ImageDownloader, Result};
use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod auth;
pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Tasks (behind the session gate when `auth.enabled`)
/// - `POST /start` - Submit newline-separated URLs, returns the task id
/// - `GET /progress/:task_id` - Server-sent progress snapshots
/// - `GET /download_final/:task_id` - Download the finished ZIP archive
///
/// ## Session
/// - `POST /login` - Exchange credentials for a session cookie
/// - `POST /logout` - Drop the session
///
/// ## System
/// - `GET /health` - Health check
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled)
pub fn create_router(downloader: Arc<ImageDownloader>, config: Arc<Config>) -> Router {
    let state = AppState::new(downloader, config.clone());

    let tasks = Router::new()
        .route("/start", post(routes::start_task))
        .route("/progress/:task_id", get(routes::progress_stream))
        .route("/download_final/:task_id", get(routes::download_final));

    // route_layer only runs the gate for matched routes, so unknown paths
    // still answer 404 rather than 401
    let tasks = if config.auth.enabled {
        tasks.route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ))
    } else {
        tracing::warn!("Authentication disabled, task routes are open");
        tasks
    };

    let router = Router::new()
        .route("/login", post(routes::login))
        .route("/logout", post(routes::logout))
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec))
        .merge(tasks);

    // Swagger UI serves its own copy of the document under a separate path
    let router = if config.api.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
    } else {
        router
    };

    let router = router.with_state(state).layer(TraceLayer::new_for_http());

    // Apply CORS middleware if enabled in config
    if config.api.cors_enabled {
        let cors = build_cors_layer(&config.api.cors_origins);
        router.layer(cors)
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// # Arguments
///
/// * `origins` - List of allowed origins (supports "*" for any origin)
///
/// # Returns
///
/// A configured CorsLayer that allows the specified origins, all methods,
/// and all headers for cross-origin requests.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    // Check if "*" (all origins) is in the list
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address.
///
/// Runs until the downloader's shutdown token is cancelled (see
/// [`ImageDownloader::shutdown`]) or the listener fails.
///
/// # Example
///
/// ```no_run
/// use image_zip_dl::{ImageDownloader, Config};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::default());
/// let downloader = Arc::new(ImageDownloader::new((*config).clone()).await?);
///
/// // Start API server (blocks until shutdown)
/// image_zip_dl::api::start_api_server(downloader, config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(downloader: Arc<ImageDownloader>, config: Arc<Config>) -> Result<()> {
    let bind_address = config.api.bind_address;

    tracing::info!(
        address = %bind_address,
        "Starting API server"
    );

    let shutdown = downloader.shutdown_token();
    let app = create_router(downloader, config);

    // Bind TCP listener to the configured address
    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(
        address = %bind_address,
        "API server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
