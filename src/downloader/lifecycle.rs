//! Shutdown coordination.

use crate::error::Result;

use super::ImageDownloader;

/// Upper bound on waiting for in-flight tasks during shutdown
const SHUTDOWN_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

impl ImageDownloader {
    /// Gracefully shut down the downloader
    ///
    /// This method performs a graceful shutdown sequence:
    /// 1. Stops accepting new submissions
    /// 2. Cancels background services (cleanup sweep, API server)
    /// 3. Waits for in-flight tasks to finish with a timeout (30 seconds)
    ///
    /// In-flight tasks are never aborted; a task still running when the
    /// timeout expires keeps going until the runtime itself stops.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        // 1. Stop accepting new tasks
        self.accepting_new
            .store(false, std::sync::atomic::Ordering::SeqCst);
        tracing::info!("Stopped accepting new tasks");

        // 2. Stop background services
        self.shutdown_token.cancel();
        tracing::info!("Signaled background services to stop");

        // 3. Wait for running tasks
        self.tasks.close();
        tracing::debug!(running = self.tasks.len(), "Waiting for running tasks");
        match tokio::time::timeout(SHUTDOWN_TIMEOUT, self.tasks.wait()).await {
            Ok(()) => tracing::info!("All running tasks completed"),
            Err(_) => tracing::warn!(
                running = self.tasks.len(),
                "Timeout waiting for tasks to complete, proceeding with shutdown"
            ),
        }

        tracing::info!("Graceful shutdown complete");
        Ok(())
    }

    /// Whether new submissions are still accepted
    pub fn is_accepting(&self) -> bool {
        self.accepting_new.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Token cancelled when shutdown begins
    pub fn shutdown_token(&self) -> tokio_util::sync::CancellationToken {
        self.shutdown_token.clone()
    }
}
