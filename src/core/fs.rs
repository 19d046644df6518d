//! The filesystem access layer consumed by the tree builder.
//!
//! The builder only ever talks to the [`FileSystem`] trait, which keeps it
//! independent of the real disk in tests and lets callers bound the number of
//! concurrent I/O operations.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Semaphore, SemaphorePermit};

use super::error::CoreError;

/// The subset of metadata the builder needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryMetadata {
    pub is_directory: bool,
    pub size: u64,
    /// `true` when the path itself is a symbolic link. `is_directory` and
    /// `size` then describe the link target.
    pub is_symlink: bool,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_file: bool,
}

#[async_trait]
pub trait FileSystem: Send + Sync {
    async fn stat(&self, path: &Path) -> Result<EntryMetadata, CoreError>;

    /// Lists the immediate children of `path`, in the order the platform returns them.
    async fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>, CoreError>;

    fn join(&self, base: &Path, segment: &str) -> PathBuf {
        base.join(segment)
    }
}

/// [`FileSystem`] backed by `tokio::fs`.
#[derive(Debug, Clone, Default)]
pub struct TokioFileSystem {
    limiter: Option<Arc<Semaphore>>,
}

impl TokioFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allows at most `max_in_flight` stat/list calls at the same time.
    ///
    /// A permit covers one call only, so nested directory scans can never
    /// starve each other. A limit of zero is treated as one.
    pub fn with_limit(max_in_flight: usize) -> Self {
        Self {
            limiter: Some(Arc::new(Semaphore::new(max_in_flight.max(1)))),
        }
    }

    /// Waits for an I/O slot. The semaphore is never closed, so `acquire`
    /// only fails if that changes, in which case the call runs unthrottled.
    async fn acquire(&self) -> Option<SemaphorePermit<'_>> {
        match &self.limiter {
            Some(semaphore) => semaphore.acquire().await.ok(),
            None => None,
        }
    }
}

#[async_trait]
impl FileSystem for TokioFileSystem {
    async fn stat(&self, path: &Path) -> Result<EntryMetadata, CoreError> {
        let _permit = self.acquire().await;

        let link_metadata = tokio::fs::symlink_metadata(path)
            .await
            .map_err(|e| CoreError::io(e, path))?;

        if !link_metadata.file_type().is_symlink() {
            return Ok(EntryMetadata {
                is_directory: link_metadata.is_dir(),
                size: link_metadata.len(),
                is_symlink: false,
            });
        }

        let target = tokio::fs::metadata(path)
            .await
            .map_err(|e| CoreError::io(e, path))?;
        Ok(EntryMetadata {
            is_directory: target.is_dir(),
            size: target.len(),
            is_symlink: true,
        })
    }

    async fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>, CoreError> {
        let _permit = self.acquire().await;

        let mut reader = tokio::fs::read_dir(path)
            .await
            .map_err(|e| CoreError::io(e, path))?;

        let mut entries = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| CoreError::io(e, path))?
        {
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| CoreError::io(e, entry.path()))?;
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().to_string(),
                is_file: file_type.is_file(),
            });
        }
        Ok(entries)
    }
}
