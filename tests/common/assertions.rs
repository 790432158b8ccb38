//! Custom test assertions for integration tests

use image_zip_dl::{ImageDownloader, ProgressSnapshot, TaskId};
use std::io::Read;
use std::time::Duration;

/// Result of waiting for task completion
#[derive(Debug)]
pub enum WaitResult {
    /// Terminal snapshot received; carries every snapshot read
    Completed(Vec<ProgressSnapshot>),
    /// Timeout waiting for the terminal snapshot
    Timeout(Vec<ProgressSnapshot>),
}

impl WaitResult {
    /// Snapshots of a completed task, panicking on timeout
    pub fn unwrap_completed(self) -> Vec<ProgressSnapshot> {
        match self {
            WaitResult::Completed(snapshots) => snapshots,
            WaitResult::Timeout(snapshots) => panic!("task timed out after {snapshots:?}"),
        }
    }
}

/// Read a task's snapshots until the terminal one or `timeout`
pub async fn wait_for_completion(
    downloader: &ImageDownloader,
    id: TaskId,
    timeout: Duration,
) -> WaitResult {
    let channel = downloader.subscribe(id).await.unwrap();
    let mut snapshots = Vec::new();
    let deadline = tokio::time::Instant::now() + timeout;

    while tokio::time::Instant::now() < deadline {
        if let Some(snapshot) = channel.poll(Duration::from_millis(50)).await {
            let done = snapshot.done;
            snapshots.push(snapshot);
            if done {
                return WaitResult::Completed(snapshots);
            }
        }
    }
    WaitResult::Timeout(snapshots)
}

/// Entry names and contents of a ZIP archive held in memory
pub fn zip_entries(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut entry = archive.by_index(i).unwrap();
            let mut data = Vec::new();
            entry.read_to_end(&mut data).unwrap();
            (entry.name().to_string(), data)
        })
        .collect()
}

/// Parse the JSON payload of every `data:` line in an SSE body
pub fn sse_payloads(body: &str) -> Vec<serde_json::Value> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| serde_json::from_str(data.trim()).unwrap())
        .collect()
}
