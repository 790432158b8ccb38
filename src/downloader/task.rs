//! Task orchestration: fetch every URL in order, archive the successes,
//! report progress as immutable snapshots.

use crate::archive::{ArchiveBuilder, persist_archive};
use crate::fetcher::{Fetcher, ProgressSink};
use crate::progress::ProgressChannel;
use crate::types::{Item, ProgressSnapshot, TaskId};
use crate::utils::{extract_filename_from_url, unique_name};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Everything one task execution needs
pub(crate) struct TaskRun {
    /// Task identifier (for logging)
    pub id: TaskId,
    /// Source URLs in submission order
    pub urls: Vec<String>,
    /// Final archive location
    pub archive_path: PathBuf,
    /// Snapshot queue observed by clients
    pub channel: Arc<ProgressChannel>,
    /// Fetch implementation
    pub fetcher: Arc<dyn Fetcher>,
}

/// Forwards fetch progress to the item being fetched and emits a snapshot per tick
struct ItemProgress<'a> {
    items: &'a mut Vec<Item>,
    index: usize,
    channel: &'a ProgressChannel,
}

impl ProgressSink for ItemProgress<'_> {
    fn report(&mut self, percent: u8) {
        self.items[self.index].advance(percent);
        self.channel.push(ProgressSnapshot::running(&self.items[..]));
    }
}

/// Run a task to completion
///
/// URLs are processed strictly one after another. A failed URL only marks its
/// item failed. Once every URL has been attempted the archive is persisted and
/// exactly one terminal snapshot is emitted; if persisting fails the terminal
/// snapshot carries the error instead of the task vanishing silently.
pub(crate) async fn run_task(run: TaskRun) {
    let TaskRun {
        id,
        urls,
        archive_path,
        channel,
        fetcher,
    } = run;

    info!(task_id = %id, urls = urls.len(), "task started");

    let mut items: Vec<Item> = Vec::with_capacity(urls.len());
    let mut archive = ArchiveBuilder::new();

    for url in &urls {
        let candidate = extract_filename_from_url(url);
        let name = unique_name(&candidate, |n| items.iter().any(|item| item.name == n));
        debug!(task_id = %id, %url, %name, "fetching");

        items.push(Item::fetching(name.clone()));
        let index = items.len() - 1;
        channel.push(ProgressSnapshot::running(&items));

        let result = {
            let mut sink = ItemProgress {
                items: &mut items,
                index,
                channel: &channel,
            };
            fetcher.fetch(url, &mut sink).await
        };

        match result {
            Ok(payload) => match archive.add(&name, &payload) {
                Ok(()) => {
                    debug!(task_id = %id, %name, bytes = payload.len(), "item succeeded");
                    items[index].succeed();
                }
                Err(e) => {
                    warn!(task_id = %id, %name, error = %e, "could not add item to archive");
                    items[index].fail(e.to_string());
                }
            },
            Err(e) => {
                warn!(task_id = %id, %url, error = %e, "item failed");
                items[index].fail(e.to_string());
            }
        }
        channel.push(ProgressSnapshot::running(&items));
    }

    let succeeded = archive.len();
    let outcome = match archive.finish() {
        Ok(bytes) => persist_archive(&archive_path, &bytes).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(()) => {
            info!(
                task_id = %id,
                succeeded,
                failed = items.len() - succeeded,
                path = %archive_path.display(),
                "task complete"
            );
            channel.push(ProgressSnapshot::finished(&items, None));
        }
        Err(e) => {
            error!(task_id = %id, error = %e, "failed to write archive");
            channel.push(ProgressSnapshot::finished(
                &items,
                Some(format!("failed to write archive: {e}")),
            ));
        }
    }
}
