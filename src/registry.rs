//! Process-wide task registry
//!
//! Maps task identifiers to their progress channel and archive location.
//! Entries are created at submission and live as long as the registry; only
//! archive files are swept, never the mapping itself.

use crate::error::{Error, Result};
use crate::progress::ProgressChannel;
use crate::types::TaskId;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Registry record for one task
#[derive(Clone)]
pub struct TaskEntry {
    /// Snapshot queue fed by the task's execution
    pub channel: Arc<ProgressChannel>,
    /// Where the finished archive is written
    pub archive_path: PathBuf,
}

impl TaskEntry {
    /// Create a record with a fresh, empty channel
    pub fn new(archive_path: PathBuf) -> Self {
        Self {
            channel: Arc::new(ProgressChannel::new()),
            archive_path,
        }
    }
}

/// Concurrent map of task identifier to [`TaskEntry`]
///
/// Cloning is cheap and shares the underlying map.
#[derive(Clone, Default)]
pub struct TaskRegistry {
    tasks: Arc<RwLock<HashMap<TaskId, TaskEntry>>>,
}

impl TaskRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task; replaces nothing since identifiers are fresh
    pub async fn register(&self, id: TaskId, entry: TaskEntry) {
        self.tasks.write().await.insert(id, entry);
    }

    /// Look up a task's record
    pub async fn get(&self, id: TaskId) -> Result<TaskEntry> {
        self.tasks
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(Error::TaskNotFound(id))
    }

    /// Look up a task's progress channel
    pub async fn channel(&self, id: TaskId) -> Result<Arc<ProgressChannel>> {
        self.get(id).await.map(|entry| entry.channel)
    }

    /// Look up a task's archive path
    pub async fn archive_path(&self, id: TaskId) -> Result<PathBuf> {
        self.get(id).await.map(|entry| entry.archive_path)
    }

    /// Number of registered tasks
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    /// Whether no task is registered
    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }
}
