//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the image-zip-dl REST API
//! using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the image-zip-dl REST API
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "image-zip-dl REST API",
        version = "0.1.0",
        description = "Submit image URLs, follow per-item download progress over server-sent events, and fetch the resulting ZIP archive",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:5000", description = "Local development server")
    ),
    paths(
        // Tasks
        crate::api::routes::start_task,
        crate::api::routes::progress_stream,
        crate::api::routes::download_final,

        // Session
        crate::api::routes::login,
        crate::api::routes::logout,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::TaskId,
        crate::types::Item,
        crate::types::ProgressSnapshot,

        // API request/response types from routes
        crate::api::routes::StartRequest,
        crate::api::routes::StartResponse,
        crate::api::routes::LoginRequest,
        crate::api::routes::HealthResponse,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "tasks", description = "Task submission, progress stream, and archive download"),
        (name = "session", description = "Login and logout"),
        (name = "system", description = "System endpoints - Health checks, OpenAPI spec"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Security addon to add session cookie and API key schemes to OpenAPI spec
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};

        if let Some(components) = &mut openapi.components {
            components.add_security_scheme(
                "session",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(
                    crate::api::auth::SESSION_COOKIE,
                ))),
            );
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-Api-Key"))),
            );
        }
    }
}
