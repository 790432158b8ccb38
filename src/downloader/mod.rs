//! Core downloader implementation split into focused submodules.
//!
//! The `ImageDownloader` struct and its methods are organized by domain:
//! - [`task`] - Per-task fetch, archive and progress orchestration
//! - [`cleanup`] - Periodic removal of expired archives
//! - [`lifecycle`] - Shutdown coordination

mod cleanup;
mod lifecycle;
mod task;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use cleanup::sweep_expired_archives;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::fetcher::{Fetcher, HttpFetcher};
use crate::progress::ProgressChannel;
use crate::registry::{TaskEntry, TaskRegistry};
use crate::types::TaskId;
use crate::utils::parse_url_list;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::Instrument;

/// Main downloader instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct ImageDownloader {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Task identifier to channel/archive mapping
    pub(crate) registry: TaskRegistry,
    /// Fetch implementation shared by all tasks
    pub(crate) fetcher: Arc<dyn Fetcher>,
    /// Flag to indicate whether new tasks are accepted (set to false during shutdown)
    pub(crate) accepting_new: Arc<AtomicBool>,
    /// Cancelled on shutdown to stop background services
    pub(crate) shutdown_token: CancellationToken,
    /// Tracks running task executions so shutdown can wait for them
    pub(crate) tasks: TaskTracker,
}

impl ImageDownloader {
    /// Create a new ImageDownloader instance
    ///
    /// Validates the configuration, creates the archive directory and builds
    /// the HTTP fetcher.
    pub async fn new(config: Config) -> Result<Self> {
        let fetcher = HttpFetcher::new(config.download.timeout, config.download.chunk_size)?;
        Self::with_fetcher(config, Arc::new(fetcher)).await
    }

    /// Create an instance that fetches through a caller-supplied [`Fetcher`]
    pub async fn with_fetcher(config: Config, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        config.validate()?;

        tokio::fs::create_dir_all(&config.download.temp_dir)
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create archive directory '{}': {}",
                        config.download.temp_dir.display(),
                        e
                    ),
                ))
            })?;

        tracing::info!(
            temp_dir = %config.download.temp_dir.display(),
            timeout_secs = config.download.timeout.as_secs(),
            chunk_size = config.download.chunk_size,
            "Downloader initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            registry: TaskRegistry::new(),
            fetcher,
            accepting_new: Arc::new(AtomicBool::new(true)),
            shutdown_token: CancellationToken::new(),
            tasks: TaskTracker::new(),
        })
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Task registry shared with the API layer
    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Submit a batch of URLs and start processing it in the background
    ///
    /// Returns immediately with the new task's identifier. The URLs are
    /// fetched one after another; progress is observable through
    /// [`ImageDownloader::subscribe`] and the archive through
    /// [`ImageDownloader::open_archive`] once the terminal snapshot arrives.
    ///
    /// # Errors
    ///
    /// [`Error::EmptySubmission`] when `urls` is empty and
    /// [`Error::ShuttingDown`] once [`ImageDownloader::shutdown`] has begun.
    pub async fn submit(&self, urls: Vec<String>) -> Result<TaskId> {
        if !self.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }
        if urls.is_empty() {
            return Err(Error::EmptySubmission);
        }

        let id = TaskId::new();
        let archive_path = self.archive_path(id);
        let entry = TaskEntry::new(archive_path.clone());
        let channel = entry.channel.clone();
        self.registry.register(id, entry).await;

        tracing::info!(task_id = %id, url_count = urls.len(), "Task submitted");

        let run = task::TaskRun {
            id,
            urls,
            archive_path,
            channel,
            fetcher: self.fetcher.clone(),
        };
        self.tasks.spawn(
            task::run_task(run).instrument(tracing::info_span!("task", task_id = %id)),
        );

        Ok(id)
    }

    /// Submit a raw newline-separated URL list (blank lines ignored)
    pub async fn submit_raw(&self, raw: &str) -> Result<TaskId> {
        self.submit(parse_url_list(raw)).await
    }

    /// Progress channel of a task
    ///
    /// Reading from the channel consumes snapshots; concurrent observers of
    /// the same task share one stream rather than each seeing every snapshot.
    pub async fn subscribe(&self, id: TaskId) -> Result<Arc<ProgressChannel>> {
        self.registry.channel(id).await
    }

    /// Location of a task's archive, whether or not it exists yet
    ///
    /// Derived from the identifier alone, so it also resolves archives of
    /// tasks this process never registered (e.g. after a restart).
    pub fn archive_path(&self, id: TaskId) -> PathBuf {
        self.config.download.temp_dir.join(id.archive_file_name())
    }

    /// Registered archive path of a task, or the derived one for unknown ids
    async fn resolve_archive_path(&self, id: TaskId) -> PathBuf {
        match self.registry.archive_path(id).await {
            Ok(path) => path,
            Err(_) => self.archive_path(id),
        }
    }

    /// Open a finished archive for reading
    ///
    /// # Errors
    ///
    /// [`Error::ArchiveNotFound`] while the task is still running, after the
    /// archive expired, or for identifiers that never existed.
    pub async fn open_archive(&self, id: TaskId) -> Result<(tokio::fs::File, u64)> {
        let path = self.resolve_archive_path(id).await;
        match tokio::fs::File::open(&path).await {
            Ok(file) => {
                let len = file.metadata().await?.len();
                Ok((file, len))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::ArchiveNotFound { id, path })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Read a finished archive fully into memory
    pub async fn read_archive(&self, id: TaskId) -> Result<Vec<u8>> {
        let path = self.resolve_archive_path(id).await;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::ArchiveNotFound { id, path })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Number of tasks registered since startup
    pub async fn task_count(&self) -> usize {
        self.registry.len().await
    }

    /// Spawn the API server in a background task
    ///
    /// Returns a JoinHandle that resolves when the server stops, either
    /// through an error or after [`ImageDownloader::shutdown`] cancels it.
    pub fn spawn_api_server(self: &Arc<Self>) -> tokio::task::JoinHandle<Result<()>> {
        let downloader = self.clone();
        let config = self.config.clone();

        tokio::spawn(async move { crate::api::start_api_server(downloader, config).await })
    }
}
