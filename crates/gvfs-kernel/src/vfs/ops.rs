//! Storage backend operations trait.
//!
//! This is the minimal POSIX-like surface the facade delegates to once a
//! virtual path has been rewritten into an actual one.

use async_trait::async_trait;
use std::time::SystemTime;

use super::types::FileStatus;
use super::{VfsError, VfsResult};

/// Operations on one storage backend.
///
/// All paths are *actual* paths in the backend's URI form (for example
/// `file:/data/fs1/a.txt`). Paths returned inside [`FileStatus`] use the same
/// form, so the translator can map them back onto virtual paths.
///
/// Implementations are shared by every cache entry that resolved to them
/// and are called concurrently; they must be `Send + Sync`.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// URI scheme this backend serves (`file`, `memory`, ...).
    fn scheme(&self) -> &str;

    // ========================================================================
    // Reading
    // ========================================================================

    /// Get metadata for a path.
    async fn getattr(&self, path: &str) -> VfsResult<FileStatus>;

    /// List a directory.
    ///
    /// Returns full actual paths for every child, sorted by path.
    async fn readdir(&self, path: &str) -> VfsResult<Vec<FileStatus>>;

    /// Read up to `size` bytes starting at `offset`.
    ///
    /// Returns fewer bytes at EOF, and an empty vector past it.
    async fn read(&self, path: &str, offset: u64, size: u32) -> VfsResult<Vec<u8>>;

    // ========================================================================
    // Writing
    // ========================================================================

    /// Write `data` at `offset`, returning the number of bytes written.
    async fn write(&self, path: &str, offset: u64, data: &[u8]) -> VfsResult<u32>;

    /// Create an empty file, creating missing parent directories.
    ///
    /// With `overwrite`, an existing file is truncated; without it, an
    /// existing path is an `AlreadyExists` error.
    async fn create(&self, path: &str, overwrite: bool) -> VfsResult<FileStatus>;

    /// Create a directory.
    ///
    /// Fails with `AlreadyExists` if the path exists. Without `parents`, a
    /// missing parent is a `NotFound` error.
    async fn mkdir(&self, path: &str, parents: bool) -> VfsResult<FileStatus>;

    /// Remove a file. Directories are rejected with `IsADirectory`.
    async fn unlink(&self, path: &str) -> VfsResult<()>;

    /// Remove an empty directory.
    async fn rmdir(&self, path: &str) -> VfsResult<()>;

    /// Remove a directory and everything below it.
    async fn remove_tree(&self, path: &str) -> VfsResult<()>;

    /// Rename a file or directory, replacing a file at `to`.
    async fn rename(&self, from: &str, to: &str) -> VfsResult<()>;

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Release connections or other resources held by this backend.
    ///
    /// Called when a cache entry holding this backend is evicted.
    async fn close(&self) -> VfsResult<()> {
        Ok(())
    }

    // ========================================================================
    // Convenience methods (default implementations)
    // ========================================================================

    /// Check if a path exists. Errors other than not-found propagate.
    async fn exists(&self, path: &str) -> VfsResult<bool> {
        match self.getattr(path).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Modification time of a path.
    async fn modified(&self, path: &str) -> VfsResult<SystemTime> {
        Ok(self.getattr(path).await?.mtime)
    }

    /// Read an entire file.
    async fn read_all(&self, path: &str) -> VfsResult<Vec<u8>> {
        let status = self.getattr(path).await?;
        if status.is_dir() {
            return Err(VfsError::is_a_directory(path));
        }
        let size = u32::try_from(status.size)
            .map_err(|_| VfsError::other(format!("file too large to read at once: {path}")))?;
        self.read(path, 0, size).await
    }
}
