//! Per-task progress channel
//!
//! Bridges a task's execution (single producer) and its observers. Snapshots
//! are buffered without bound until read, delivered in emission order, and
//! consumed destructively: concurrent observers compete for snapshots rather
//! than each receiving a copy.
//!
//! Observers wait with a deadline ([`ProgressChannel::poll`]) instead of
//! blocking indefinitely, so the transport above can notice a disconnected
//! client between polls.

use crate::types::ProgressSnapshot;
use futures::Stream;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tracing::warn;

/// Ordered, unbounded snapshot queue for one task
pub struct ProgressChannel {
    tx: mpsc::UnboundedSender<ProgressSnapshot>,
    rx: Mutex<mpsc::UnboundedReceiver<ProgressSnapshot>>,
    /// Set once the terminal snapshot has been pushed
    finished: AtomicBool,
}

impl ProgressChannel {
    /// Create an empty channel
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(rx),
            finished: AtomicBool::new(false),
        }
    }

    /// Append a snapshot; never blocks
    ///
    /// Anything pushed after the terminal (`done`) snapshot is dropped, so the
    /// terminal snapshot is always the last one delivered.
    pub fn push(&self, snapshot: ProgressSnapshot) {
        if self.finished.load(Ordering::Acquire) {
            warn!("dropping snapshot pushed after terminal snapshot");
            return;
        }
        if snapshot.done {
            self.finished.store(true, Ordering::Release);
        }
        // The receiver lives as long as `self`, so this cannot fail
        self.tx.send(snapshot).ok();
    }

    /// Whether the terminal snapshot has been pushed (it may still be unread)
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Take the next unread snapshot, waiting at most `timeout`
    ///
    /// Returns `None` when nothing arrived within the deadline.
    pub async fn poll(&self, timeout: Duration) -> Option<ProgressSnapshot> {
        tokio::time::timeout(timeout, async {
            let mut rx = self.rx.lock().await;
            rx.recv().await
        })
        .await
        .ok()
        .flatten()
    }

    /// Stream snapshots until (and including) the terminal one
    ///
    /// Each underlying wait is bounded by `poll_interval`; an empty poll simply
    /// polls again. Dropping the stream stops reading and leaves any unread
    /// snapshots in the channel.
    pub fn snapshots(
        self: Arc<Self>,
        poll_interval: Duration,
    ) -> impl Stream<Item = ProgressSnapshot> + Send + 'static {
        futures::stream::unfold((self, false), move |(channel, ended)| async move {
            if ended {
                return None;
            }
            loop {
                if let Some(snapshot) = channel.poll(poll_interval).await {
                    let done = snapshot.done;
                    return Some((snapshot, (channel, done)));
                }
            }
        })
    }
}

impl Default for ProgressChannel {
    fn default() -> Self {
        Self::new()
    }
}
