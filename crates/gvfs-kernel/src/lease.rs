//! Backend ownership for cache entries.
//!
//! Leaving the cache does not make a backend idle: a call that already
//! resolved its entry, or an open [`FilesetFile`](crate::FilesetFile), may
//! still be using it. Entries therefore hold their backend through a
//! [`BackendLease`], and every user clones the lease rather than the backend.
//! The wrapped backend is closed when the last clone goes away, and never
//! while a factory still shares it with other entries.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use crate::vfs::{FileStatus, StorageBackend, VfsResult};

pub(crate) struct BackendLease {
    inner: Arc<dyn StorageBackend>,
    closed: AtomicBool,
}

impl BackendLease {
    pub(crate) fn new(inner: Arc<dyn StorageBackend>) -> Self {
        Self {
            inner,
            closed: AtomicBool::new(false),
        }
    }

    /// Close the wrapped backend now. A no-op if a factory still holds it
    /// or it was already closed.
    pub(crate) async fn release(&self) -> VfsResult<()> {
        if !self.owns_backend() || self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.inner.close().await
    }

    fn owns_backend(&self) -> bool {
        Arc::strong_count(&self.inner) == 1
    }
}

impl Drop for BackendLease {
    fn drop(&mut self) {
        if *self.closed.get_mut() || !self.owns_backend() {
            return;
        }
        let inner = self.inner.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = inner.close().await {
                        tracing::warn!(scheme = inner.scheme(), error = %e, "failed to close backend");
                    }
                });
            }
            Err(_) => {
                tracing::debug!(scheme = inner.scheme(), "no runtime, backend dropped unclosed");
            }
        }
    }
}

#[async_trait]
impl StorageBackend for BackendLease {
    fn scheme(&self) -> &str {
        self.inner.scheme()
    }

    async fn getattr(&self, path: &str) -> VfsResult<FileStatus> {
        self.inner.getattr(path).await
    }

    async fn readdir(&self, path: &str) -> VfsResult<Vec<FileStatus>> {
        self.inner.readdir(path).await
    }

    async fn read(&self, path: &str, offset: u64, size: u32) -> VfsResult<Vec<u8>> {
        self.inner.read(path, offset, size).await
    }

    async fn write(&self, path: &str, offset: u64, data: &[u8]) -> VfsResult<u32> {
        self.inner.write(path, offset, data).await
    }

    async fn create(&self, path: &str, overwrite: bool) -> VfsResult<FileStatus> {
        self.inner.create(path, overwrite).await
    }

    async fn mkdir(&self, path: &str, parents: bool) -> VfsResult<FileStatus> {
        self.inner.mkdir(path, parents).await
    }

    async fn unlink(&self, path: &str) -> VfsResult<()> {
        self.inner.unlink(path).await
    }

    async fn rmdir(&self, path: &str) -> VfsResult<()> {
        self.inner.rmdir(path).await
    }

    async fn remove_tree(&self, path: &str) -> VfsResult<()> {
        self.inner.remove_tree(path).await
    }

    async fn rename(&self, from: &str, to: &str) -> VfsResult<()> {
        self.inner.rename(from, to).await
    }

    async fn close(&self) -> VfsResult<()> {
        self.release().await
    }

    async fn exists(&self, path: &str) -> VfsResult<bool> {
        self.inner.exists(path).await
    }

    async fn modified(&self, path: &str) -> VfsResult<SystemTime> {
        self.inner.modified(path).await
    }

    async fn read_all(&self, path: &str) -> VfsResult<Vec<u8>> {
        self.inner.read_all(path).await
    }
}
