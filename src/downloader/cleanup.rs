//! Periodic removal of expired archives.

use crate::error::Result;
use std::path::Path;
use std::time::{Duration, SystemTime};

use super::ImageDownloader;

impl ImageDownloader {
    /// Start the archive cleanup background task
    ///
    /// The archive directory is swept for files older than `cleanup.ttl` once
    /// at startup, so archives left by a previous run do not outlive the TTL,
    /// and then every `cleanup.interval`. The loop exits when [`ImageDownloader::shutdown`]
    /// cancels the service token.
    pub fn start_cleanup(&self) -> tokio::task::JoinHandle<()> {
        let cleanup = self.config.cleanup.clone();

        if !cleanup.enabled {
            tracing::info!("Archive cleanup disabled, skipping cleanup task");
            return tokio::spawn(async {});
        }

        let dir = self.config.download.temp_dir.clone();
        let token = self.shutdown_token.clone();

        let handle = tokio::spawn(async move {
            sweep_and_log(&dir, cleanup.ttl).await;

            let mut ticker = tokio::time::interval(cleanup.interval);
            // The first tick completes immediately and the startup sweep already ran
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        tracing::info!("Archive cleanup task stopped");
                        break;
                    }
                    _ = ticker.tick() => sweep_and_log(&dir, cleanup.ttl).await,
                }
            }
        });

        tracing::info!(
            ttl_secs = cleanup.ttl.as_secs(),
            interval_secs = cleanup.interval.as_secs(),
            "Archive cleanup background task started"
        );

        handle
    }
}

async fn sweep_and_log(dir: &Path, ttl: Duration) {
    match sweep_expired_archives(dir, ttl).await {
        Ok(0) => tracing::debug!("Cleanup sweep found no expired archives"),
        Ok(removed) => tracing::info!(removed, "Removed expired archives"),
        Err(e) => tracing::warn!(error = %e, dir = %dir.display(), "Cleanup sweep failed"),
    }
}

/// Delete regular files in `dir` last modified more than `ttl` ago
///
/// Returns how many files were removed. Failing to read the directory itself
/// is an error; a file that cannot be inspected or removed is logged and
/// skipped.
pub async fn sweep_expired_archives(dir: &Path, ttl: Duration) -> Result<usize> {
    let now = SystemTime::now();
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut removed = 0;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let metadata = match entry.metadata().await {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to stat file during cleanup");
                continue;
            }
        };
        if !metadata.is_file() {
            continue;
        }

        let age = metadata
            .modified()
            .ok()
            .and_then(|modified| now.duration_since(modified).ok())
            .unwrap_or_default();
        if age <= ttl {
            continue;
        }

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), age_secs = age.as_secs(), "Removed expired archive");
                removed += 1;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove expired archive");
            }
        }
    }

    Ok(removed)
}
