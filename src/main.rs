//! image-zip-dl server
//!
//! Loads `.env`, reads configuration from the environment, then serves the
//! REST API until SIGINT/SIGTERM.
//!
//! After starting, you can:
//! - View Swagger UI at http://localhost:5000/swagger-ui
//! - Log in via POST http://localhost:5000/login
//! - Submit URLs via POST http://localhost:5000/start
//! - Stream progress via GET http://localhost:5000/progress/<task_id>

use image_zip_dl::{Config, ImageDownloader, run_with_shutdown};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine; real environment variables still apply
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let downloader = ImageDownloader::new(config).await?;
    downloader.start_cleanup();

    let api_handle = Arc::new(downloader.clone()).spawn_api_server();

    run_with_shutdown(downloader).await?;

    match api_handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!(error = %e, "API server exited with error"),
        Err(e) => tracing::error!(error = %e, "API server task panicked"),
    }

    Ok(())
}
