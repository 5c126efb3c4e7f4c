//! Open file handles.
//!
//! A [`FilesetFile`] is an actual path plus a cursor over the backend's
//! offset-addressed read/write calls. It keeps its backend alive, so a handle
//! stays usable if its cache entry is evicted while it is open.

use std::io::{self, SeekFrom};
use std::sync::Arc;

use crate::error::{GvfsError, GvfsResult};
use crate::vfs::{StorageBackend, VfsError};

/// Largest single backend write issued by a handle.
const WRITE_CHUNK: usize = 4 * 1024 * 1024;

/// How a file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Existing file, cursor at 0.
    Read,
    /// Create or truncate, cursor at 0.
    Write,
    /// Create if missing, cursor at end.
    Append,
}

impl OpenMode {
    pub fn is_readable(&self) -> bool {
        matches!(self, OpenMode::Read)
    }

    pub fn is_writable(&self) -> bool {
        !self.is_readable()
    }
}

/// Handle on one file inside a fileset.
pub struct FilesetFile {
    backend: Arc<dyn StorageBackend>,
    actual: String,
    virtual_path: String,
    mode: OpenMode,
    position: u64,
}

impl FilesetFile {
    pub(crate) fn new(
        backend: Arc<dyn StorageBackend>,
        actual: String,
        virtual_path: String,
        mode: OpenMode,
        position: u64,
    ) -> Self {
        Self {
            backend,
            actual,
            virtual_path,
            mode,
            position,
        }
    }

    /// Virtual path this handle was opened with.
    pub fn path(&self) -> &str {
        &self.virtual_path
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// Current cursor offset.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Read up to `size` bytes at the cursor and advance it.
    /// An empty result means end of file.
    pub async fn read(&mut self, size: u32) -> GvfsResult<Vec<u8>> {
        self.require(self.mode.is_readable(), "not opened for reading")?;
        let data = self
            .backend
            .read(&self.actual, self.position, size)
            .await
            .map_err(|e| self.wrap(e))?;
        self.position += data.len() as u64;
        Ok(data)
    }

    /// Read from the cursor to end of file.
    pub async fn read_to_end(&mut self) -> GvfsResult<Vec<u8>> {
        let mut out = Vec::new();
        loop {
            let chunk = self.read(WRITE_CHUNK as u32).await?;
            if chunk.is_empty() {
                return Ok(out);
            }
            out.extend_from_slice(&chunk);
        }
    }

    /// Write `data` at the cursor and advance it.
    pub async fn write(&mut self, data: &[u8]) -> GvfsResult<usize> {
        self.require(self.mode.is_writable(), "not opened for writing")?;
        for chunk in data.chunks(WRITE_CHUNK) {
            let mut written = 0usize;
            while written < chunk.len() {
                let n = self
                    .backend
                    .write(&self.actual, self.position, &chunk[written..])
                    .await
                    .map_err(|e| self.wrap(e))?;
                if n == 0 {
                    return Err(self.wrap(VfsError::Io(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "backend accepted no bytes",
                    ))));
                }
                written += n as usize;
                self.position += u64::from(n);
            }
        }
        Ok(data.len())
    }

    /// Move the cursor. Seeking past the end is allowed; seeking before the
    /// start is an `InvalidInput` error.
    pub async fn seek(&mut self, pos: SeekFrom) -> GvfsResult<u64> {
        let target = match pos {
            SeekFrom::Start(n) => Some(n),
            SeekFrom::Current(delta) => self.position.checked_add_signed(delta),
            SeekFrom::End(delta) => {
                let size = self.size().await?;
                size.checked_add_signed(delta)
            }
        };
        let target = target.ok_or_else(|| {
            self.wrap(VfsError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start of file",
            )))
        })?;
        self.position = target;
        Ok(target)
    }

    /// Current size of the file in the backend.
    pub async fn size(&self) -> GvfsResult<u64> {
        let status = self
            .backend
            .getattr(&self.actual)
            .await
            .map_err(|e| self.wrap(e))?;
        Ok(status.size)
    }

    fn require(&self, allowed: bool, reason: &str) -> GvfsResult<()> {
        if allowed {
            Ok(())
        } else {
            Err(self.wrap(VfsError::permission_denied(format!(
                "{}: {reason}",
                self.virtual_path
            ))))
        }
    }

    fn wrap(&self, e: VfsError) -> GvfsError {
        GvfsError::from_backend(e, self.virtual_path.clone())
    }
}

impl std::fmt::Debug for FilesetFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilesetFile")
            .field("path", &self.virtual_path)
            .field("actual", &self.actual)
            .field("mode", &self.mode)
            .field("position", &self.position)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::{FileStatus, MemoryBackend, VfsResult};
    use async_trait::async_trait;

    /// Memory backend that accepts at most `limit` bytes per write call.
    struct ShortWriteBackend {
        inner: MemoryBackend,
        limit: usize,
    }

    #[async_trait]
    impl StorageBackend for ShortWriteBackend {
        fn scheme(&self) -> &str {
            "memory"
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
            let take = data.len().min(self.limit);
            self.inner.write(path, offset, &data[..take]).await
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
    }

    fn short_writer(limit: usize) -> (Arc<ShortWriteBackend>, FilesetFile) {
        let backend = Arc::new(ShortWriteBackend {
            inner: MemoryBackend::new(),
            limit,
        });
        let file = FilesetFile::new(
            backend.clone(),
            "memory:/f.txt".to_string(),
            "fileset/c/s/fs/f.txt".to_string(),
            OpenMode::Write,
            0,
        );
        (backend, file)
    }

    fn handle(backend: &Arc<MemoryBackend>, mode: OpenMode) -> FilesetFile {
        FilesetFile::new(
            backend.clone(),
            "memory:/f.txt".to_string(),
            "fileset/c/s/fs/f.txt".to_string(),
            mode,
            0,
        )
    }

    #[tokio::test]
    async fn test_read_advances_cursor() {
        let backend = Arc::new(MemoryBackend::new());
        backend.insert_file("memory:/f.txt", "hello world").unwrap();
        let mut file = handle(&backend, OpenMode::Read);

        assert_eq!(file.read(5).await.unwrap(), b"hello");
        assert_eq!(file.position(), 5);
        assert_eq!(file.read_to_end().await.unwrap(), b" world");
        assert!(file.read(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_seek() {
        let backend = Arc::new(MemoryBackend::new());
        backend.insert_file("memory:/f.txt", "0123456789").unwrap();
        let mut file = handle(&backend, OpenMode::Read);

        assert_eq!(file.seek(SeekFrom::End(-3)).await.unwrap(), 7);
        assert_eq!(file.read(10).await.unwrap(), b"789");
        assert_eq!(file.seek(SeekFrom::Current(-5)).await.unwrap(), 5);
        assert_eq!(file.seek(SeekFrom::Start(2)).await.unwrap(), 2);

        let err = file.seek(SeekFrom::Current(-10)).await.unwrap_err();
        let io_err: io::Error = err.into();
        assert_eq!(io_err.kind(), io::ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_mode_enforced() {
        let backend = Arc::new(MemoryBackend::new());
        backend.insert_file("memory:/f.txt", "x").unwrap();

        let mut reader = handle(&backend, OpenMode::Read);
        assert!(reader.write(b"y").await.is_err());

        let mut writer = handle(&backend, OpenMode::Write);
        assert!(writer.read(1).await.is_err());
        writer.write(b"abc").await.unwrap();
        assert_eq!(writer.position(), 3);
        assert_eq!(backend.read_all("memory:/f.txt").await.unwrap(), b"abc");
    }

    #[tokio::test]
    async fn test_missing_file_maps_to_virtual_not_found() {
        let backend = Arc::new(MemoryBackend::new());
        let mut file = handle(&backend, OpenMode::Read);

        let err = file.read(1).await.unwrap_err();
        assert!(matches!(err, GvfsError::NotFound(ref p) if p == "fileset/c/s/fs/f.txt"));
    }

    #[tokio::test]
    async fn test_short_writes_are_resumed() {
        let (backend, mut file) = short_writer(2);
        backend.inner.create("memory:/f.txt", true).await.unwrap();

        assert_eq!(file.write(b"abcdefg").await.unwrap(), 7);
        assert_eq!(file.position(), 7);
        assert_eq!(backend.inner.read_all("memory:/f.txt").await.unwrap(), b"abcdefg");
    }

    #[tokio::test]
    async fn test_zero_length_write_is_an_error() {
        let (backend, mut file) = short_writer(0);
        backend.inner.create("memory:/f.txt", true).await.unwrap();

        let err = file.write(b"abc").await.unwrap_err();
        let io_err: io::Error = err.into();
        assert_eq!(io_err.kind(), io::ErrorKind::WriteZero);
        assert_eq!(file.position(), 0);
    }
}
