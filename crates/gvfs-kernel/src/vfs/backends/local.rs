//! Local filesystem backend.
//!
//! Serves `file:` locations (`file:/data/x`, `file:///data/x`) and bare
//! absolute paths. An optional root confines every operation to one
//! directory tree.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

use crate::location;
use crate::vfs::error::{VfsError, VfsResult};
use crate::vfs::ops::StorageBackend;
use crate::vfs::types::{FileStatus, FileType};

/// Scheme served by [`LocalBackend`].
pub const FILE_SCHEME: &str = "file";

/// Local filesystem backend.
///
/// Paths are absolute `file:` URIs. Statuses come back as `file:/abs/path`
/// regardless of which spelling the caller used, so prefix checks against
/// the storage location compare scheme-stripped forms.
///
/// With a root set, paths that normalize outside it are rejected with
/// `PathEscapesRoot`.
#[derive(Debug, Clone, Default)]
pub struct LocalBackend {
    root: Option<PathBuf>,
}

impl LocalBackend {
    /// Unconfined backend over the whole local filesystem.
    pub fn new() -> Self {
        Self { root: None }
    }

    /// Backend confined to `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(Self::normalize(&root.into())),
        }
    }

    /// Resolve a `file:` URI to an absolute local path.
    ///
    /// Normalization is lexical: `..` is folded without touching the disk,
    /// so a path that does not exist yet still resolves.
    fn resolve(&self, path: &str) -> VfsResult<PathBuf> {
        if let Some(scheme) = location::scheme(path) {
            if scheme != FILE_SCHEME {
                return Err(VfsError::invalid_path(path));
            }
        }
        let raw = location::strip_scheme(path);
        if !raw.starts_with('/') {
            return Err(VfsError::invalid_path(path));
        }
        let full = Self::normalize(Path::new(raw));

        if let Some(root) = &self.root {
            if !full.starts_with(root) {
                return Err(VfsError::path_escapes_root(format!(
                    "{} is not under {}",
                    full.display(),
                    root.display()
                )));
            }
        }
        Ok(full)
    }

    fn normalize(path: &Path) -> PathBuf {
        let mut result = PathBuf::from("/");
        for component in path.components() {
            match component {
                Component::Normal(s) => result.push(s),
                Component::ParentDir => {
                    result.pop();
                }
                Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
            }
        }
        result
    }

    fn uri(path: &Path) -> String {
        format!("{FILE_SCHEME}:{}", path.display())
    }

    /// Convert std::fs::Metadata to FileStatus.
    fn metadata_to_status(path: &Path, meta: &std::fs::Metadata) -> FileStatus {
        let kind = if meta.is_dir() {
            FileType::Directory
        } else if meta.is_file() {
            FileType::File
        } else {
            FileType::Other
        };

        FileStatus {
            path: Self::uri(path),
            size: if kind.is_dir() { 0 } else { meta.len() },
            kind,
            mtime: meta.modified().unwrap_or(std::time::SystemTime::UNIX_EPOCH),
            ctime: meta.created().ok(),
        }
    }

    async fn stat(&self, full: &Path, original: &str) -> VfsResult<FileStatus> {
        let meta = fs::metadata(full)
            .await
            .map_err(|e| VfsError::from_io(e, original))?;
        Ok(Self::metadata_to_status(full, &meta))
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn scheme(&self) -> &str {
        FILE_SCHEME
    }

    async fn getattr(&self, path: &str) -> VfsResult<FileStatus> {
        let full = self.resolve(path)?;
        self.stat(&full, path).await
    }

    async fn readdir(&self, path: &str) -> VfsResult<Vec<FileStatus>> {
        let full = self.resolve(path)?;
        let mut dir = fs::read_dir(&full)
            .await
            .map_err(|e| VfsError::from_io(e, path))?;

        let mut entries = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| VfsError::from_io(e, path))?
        {
            let child = entry.path();
            // Dangling symlinks still get listed, as `other`.
            let meta = match fs::metadata(&child).await {
                Ok(meta) => meta,
                Err(_) => fs::symlink_metadata(&child)
                    .await
                    .map_err(|e| VfsError::from_io(e, Self::uri(&child)))?,
            };
            entries.push(Self::metadata_to_status(&child, &meta));
        }

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    async fn read(&self, path: &str, offset: u64, size: u32) -> VfsResult<Vec<u8>> {
        use tokio::io::{AsyncReadExt, AsyncSeekExt};

        let full = self.resolve(path)?;
        if fs::metadata(&full)
            .await
            .map_err(|e| VfsError::from_io(e, path))?
            .is_dir()
        {
            return Err(VfsError::is_a_directory(path));
        }

        let mut file = fs::File::open(&full)
            .await
            .map_err(|e| VfsError::from_io(e, path))?;
        file.seek(std::io::SeekFrom::Start(offset))
            .await
            .map_err(|e| VfsError::from_io(e, path))?;

        // A single read() may return short; keep going until EOF or full.
        let mut buffer = Vec::with_capacity(size as usize);
        (&mut file)
            .take(size as u64)
            .read_to_end(&mut buffer)
            .await
            .map_err(|e| VfsError::from_io(e, path))?;
        Ok(buffer)
    }

    async fn write(&self, path: &str, offset: u64, data: &[u8]) -> VfsResult<u32> {
        use tokio::io::{AsyncSeekExt, AsyncWriteExt};

        let full = self.resolve(path)?;
        let mut file = fs::OpenOptions::new()
            .write(true)
            .open(&full)
            .await
            .map_err(|e| VfsError::from_io(e, path))?;

        file.seek(std::io::SeekFrom::Start(offset))
            .await
            .map_err(|e| VfsError::from_io(e, path))?;
        file.write_all(data)
            .await
            .map_err(|e| VfsError::from_io(e, path))?;
        file.flush().await.map_err(|e| VfsError::from_io(e, path))?;

        Ok(data.len() as u32)
    }

    async fn create(&self, path: &str, overwrite: bool) -> VfsResult<FileStatus> {
        let full = self.resolve(path)?;

        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| VfsError::from_io(e, path))?;
        }
        if fs::metadata(&full).await.is_ok_and(|m| m.is_dir()) {
            return Err(VfsError::is_a_directory(path));
        }

        let mut options = fs::OpenOptions::new();
        options.write(true);
        if overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }
        let file = options
            .open(&full)
            .await
            .map_err(|e| VfsError::from_io(e, path))?;

        let meta = file
            .metadata()
            .await
            .map_err(|e| VfsError::from_io(e, path))?;
        Ok(Self::metadata_to_status(&full, &meta))
    }

    async fn mkdir(&self, path: &str, parents: bool) -> VfsResult<FileStatus> {
        let full = self.resolve(path)?;

        if fs::symlink_metadata(&full).await.is_ok() {
            return Err(VfsError::already_exists(path));
        }
        let created = if parents {
            fs::create_dir_all(&full).await
        } else {
            fs::create_dir(&full).await
        };
        created.map_err(|e| VfsError::from_io(e, path))?;

        self.stat(&full, path).await
    }

    async fn unlink(&self, path: &str) -> VfsResult<()> {
        let full = self.resolve(path)?;
        let meta = fs::symlink_metadata(&full)
            .await
            .map_err(|e| VfsError::from_io(e, path))?;
        if meta.is_dir() {
            return Err(VfsError::is_a_directory(path));
        }
        fs::remove_file(&full)
            .await
            .map_err(|e| VfsError::from_io(e, path))
    }

    async fn rmdir(&self, path: &str) -> VfsResult<()> {
        let full = self.resolve(path)?;
        let meta = fs::symlink_metadata(&full)
            .await
            .map_err(|e| VfsError::from_io(e, path))?;
        if !meta.is_dir() {
            return Err(VfsError::not_a_directory(path));
        }
        fs::remove_dir(&full)
            .await
            .map_err(|e| VfsError::from_io(e, path))
    }

    async fn remove_tree(&self, path: &str) -> VfsResult<()> {
        let full = self.resolve(path)?;
        let meta = fs::symlink_metadata(&full)
            .await
            .map_err(|e| VfsError::from_io(e, path))?;
        if !meta.is_dir() {
            return Err(VfsError::not_a_directory(path));
        }
        fs::remove_dir_all(&full)
            .await
            .map_err(|e| VfsError::from_io(e, path))
    }

    async fn rename(&self, from: &str, to: &str) -> VfsResult<()> {
        let from_path = self.resolve(from)?;
        let to_path = self.resolve(to)?;

        // Ensure parent of destination exists
        if let Some(parent) = to_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| VfsError::from_io(e, to))?;
        }

        fs::rename(&from_path, &to_path)
            .await
            .map_err(|e| VfsError::from_io(e, from))
    }
}
