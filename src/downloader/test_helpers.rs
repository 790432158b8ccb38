//! Shared test helpers for creating ImageDownloader instances in tests.

use crate::config::Config;
use crate::downloader::ImageDownloader;
use crate::fetcher::Fetcher;
use crate::types::{ProgressSnapshot, TaskId};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

/// Test configuration with the archive directory inside `dir`
pub(crate) fn test_config(dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.download.temp_dir = dir.join("archives");
    config.download.timeout = Duration::from_secs(2);
    config.cleanup.enabled = false;
    config.api.poll_interval = Duration::from_millis(10);
    config
}

/// Helper to create a test ImageDownloader backed by the real HTTP fetcher.
/// Returns the downloader and the tempdir (which must be kept alive).
pub(crate) async fn create_test_downloader() -> (ImageDownloader, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();
    let downloader = ImageDownloader::new(test_config(temp_dir.path()))
        .await
        .unwrap();
    (downloader, temp_dir)
}

/// Same as [`create_test_downloader`] with a caller-supplied fetcher
pub(crate) async fn create_test_downloader_with(
    fetcher: Arc<dyn Fetcher>,
) -> (ImageDownloader, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();
    let downloader = ImageDownloader::with_fetcher(test_config(temp_dir.path()), fetcher)
        .await
        .unwrap();
    (downloader, temp_dir)
}

/// Read every snapshot of a task up to and including the terminal one
pub(crate) async fn collect_snapshots(
    downloader: &ImageDownloader,
    id: TaskId,
) -> Vec<ProgressSnapshot> {
    let channel = downloader.subscribe(id).await.unwrap();
    let mut snapshots = Vec::new();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while tokio::time::Instant::now() < deadline {
        if let Some(snapshot) = channel.poll(Duration::from_millis(50)).await {
            let done = snapshot.done;
            snapshots.push(snapshot);
            if done {
                return snapshots;
            }
        }
    }
    panic!("task {id} did not finish: {snapshots:?}");
}
