//! Core types for image-zip-dl

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Unique identifier for a submitted task
///
/// Opaque to clients. Also names the task's archive file (`<id>.zip`), so a
/// parsed `TaskId` can never smuggle path separators into a file name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct TaskId(pub Uuid);

impl TaskId {
    /// Generate a fresh random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// File name of the task's archive
    pub fn archive_file_name(&self) -> String {
        format!("{}.zip", self.0)
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Processing state of one item
///
/// Serialized as a plain string: `"fetching"`, `"succeeded"` or
/// `"failed: <reason>"`. A URL that has not been reached yet has no item at
/// all, so there is no separate pending state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ItemStatus {
    /// Bytes are being transferred
    Fetching,
    /// Payload fetched and added to the archive
    Succeeded,
    /// Fetch failed; carries the human-readable reason
    Failed(String),
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemStatus::Fetching => f.write_str("fetching"),
            ItemStatus::Succeeded => f.write_str("succeeded"),
            ItemStatus::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

impl From<ItemStatus> for String {
    fn from(status: ItemStatus) -> Self {
        status.to_string()
    }
}

impl TryFrom<String> for ItemStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "fetching" => Ok(ItemStatus::Fetching),
            "succeeded" => Ok(ItemStatus::Succeeded),
            other => match other.strip_prefix("failed:") {
                Some(reason) => Ok(ItemStatus::Failed(reason.trim_start().to_string())),
                None => Err(format!("unknown item status: {other}")),
            },
        }
    }
}

/// One URL's processing record within a task
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Item {
    /// Resolved file name, unique within the task
    pub name: String,
    /// Current status
    #[schema(value_type = String, example = "succeeded")]
    pub status: ItemStatus,
    /// Progress percentage (0 to 100)
    pub progress: u8,
}

impl Item {
    /// A freshly started item
    pub fn fetching(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: ItemStatus::Fetching,
            progress: 0,
        }
    }

    /// Raise progress, never lowering it
    pub(crate) fn advance(&mut self, percent: u8) {
        self.progress = self.progress.max(percent.min(100));
    }

    /// Mark the item succeeded and pin progress to 100
    pub(crate) fn succeed(&mut self) {
        self.status = ItemStatus::Succeeded;
        self.progress = 100;
    }

    /// Mark the item failed and pin progress to 100
    pub(crate) fn fail(&mut self, reason: impl Into<String>) {
        self.status = ItemStatus::Failed(reason.into());
        self.progress = 100;
    }
}

/// Immutable point-in-time copy of a task's items
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProgressSnapshot {
    /// All items started so far, in submission order
    pub items: Vec<Item>,
    /// Whether this is the terminal snapshot of the task
    pub done: bool,
    /// Task-level failure (archive could not be written); only on the terminal snapshot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProgressSnapshot {
    /// Copy the current item list into an in-progress snapshot
    pub fn running(items: &[Item]) -> Self {
        Self {
            items: items.to_vec(),
            done: false,
            error: None,
        }
    }

    /// Copy the final item list into the terminal snapshot
    pub fn finished(items: &[Item], error: Option<String>) -> Self {
        Self {
            items: items.to_vec(),
            done: true,
            error,
        }
    }
}
