//! In-memory ZIP assembly and atomic persistence
//!
//! Payloads are appended to an in-memory archive as each item completes, so
//! entry order follows submission order. [`persist_archive`] writes the
//! finished bytes next to their final path and renames them into place.

use crate::error::Result;
use std::io::{Cursor, Write};
use std::path::Path;
use tracing::debug;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Accumulates fetched payloads into a ZIP archive held in memory
pub struct ArchiveBuilder {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    entries: usize,
}

impl ArchiveBuilder {
    /// Create an empty archive
    pub fn new() -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            entries: 0,
        }
    }

    /// Append one entry under `name`
    pub fn add(&mut self, name: &str, payload: &[u8]) -> Result<()> {
        let options = FileOptions::default().compression_method(CompressionMethod::Stored);
        self.writer.start_file(name, options)?;
        self.writer.write_all(payload)?;
        self.entries += 1;
        Ok(())
    }

    /// Number of entries written so far
    pub fn len(&self) -> usize {
        self.entries
    }

    /// Whether no entry has been written
    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Finish the central directory and return the archive bytes
    pub fn finish(mut self) -> Result<Vec<u8>> {
        let cursor = self.writer.finish()?;
        Ok(cursor.into_inner())
    }
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Write archive bytes to `path`, never exposing a partial file under that name
///
/// The bytes go to `<path>.part` first and are renamed into place, so a
/// reader either sees no archive or the complete one.
pub async fn persist_archive(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut partial = path.as_os_str().to_owned();
    partial.push(".part");
    let partial = std::path::PathBuf::from(partial);

    if let Err(e) = tokio::fs::write(&partial, bytes).await {
        tokio::fs::remove_file(&partial).await.ok();
        return Err(e.into());
    }
    tokio::fs::rename(&partial, path).await?;

    debug!(path = %path.display(), bytes = bytes.len(), "archive persisted");
    Ok(())
}
