//! # image-zip-dl
//!
//! Batch image downloader: submit a list of URLs, follow per-item progress as
//! a stream of snapshots, and collect every successful download in one ZIP
//! archive.
//!
//! Each submission becomes a task identified by a [`TaskId`]. The task fetches
//! its URLs one after another, pushing a [`ProgressSnapshot`] after every
//! state change, and writes `<task_id>.zip` once all URLs have been attempted.
//! A URL that fails only marks its own item failed.
//!
//! ## Quick Start
//!
//! ```no_run
//! use image_zip_dl::{Config, ImageDownloader};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let downloader = ImageDownloader::new(Config::default()).await?;
//!
//!     let id = downloader
//!         .submit(vec!["https://example.com/cat.png".to_string()])
//!         .await?;
//!
//!     let channel = downloader.subscribe(id).await?;
//!     loop {
//!         if let Some(snapshot) = channel.poll(Duration::from_millis(100)).await {
//!             println!("{:?}", snapshot.items);
//!             if snapshot.done {
//!                 break;
//!             }
//!         }
//!     }
//!
//!     let archive = downloader.read_archive(id).await?;
//!     println!("archive is {} bytes", archive.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// In-memory ZIP assembly and persistence
pub mod archive;
/// Configuration types
pub mod config;
/// Service facade, task orchestration and background services
pub mod downloader;
/// Error types
pub mod error;
/// Streaming HTTP fetcher
pub mod fetcher;
/// Per-task progress channel
pub mod progress;
/// Task registry
pub mod registry;
/// Core types
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use downloader::ImageDownloader;
pub use error::{ApiError, Error, ErrorDetail, FetchError, Result, ToHttpStatus};
pub use fetcher::{Fetcher, HttpFetcher, ProgressSink};
pub use progress::ProgressChannel;
pub use registry::TaskRegistry;
pub use types::{Item, ItemStatus, ProgressSnapshot, TaskId};

/// Helper function to run the downloader with graceful signal handling.
///
/// Waits for a termination signal and then calls the downloader's `shutdown()` method.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use image_zip_dl::{ImageDownloader, Config, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Config::default();
///     let downloader = ImageDownloader::new(config).await?;
///
///     // Run with automatic signal handling
///     run_with_shutdown(downloader).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(downloader: ImageDownloader) -> Result<()> {
    wait_for_signal().await;
    downloader.shutdown().await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
