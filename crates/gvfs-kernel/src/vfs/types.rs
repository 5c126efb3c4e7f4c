//! Core VFS types.
//!
//! [`FileStatus`] is what a backend reports, keyed by an *actual* path.
//! [`FileInfo`] is what the facade hands back, keyed by a *virtual* path.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// File type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Anything else (sockets, devices, dangling links).
    Other,
}

impl FileType {
    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, FileType::File)
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, FileType::Directory)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::File => "file",
            FileType::Directory => "directory",
            FileType::Other => "other",
        }
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Backend-side metadata for one path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileStatus {
    /// Actual path in the backend's own URI form (e.g. `file:/data/fs1/a`).
    pub path: String,
    /// Size in bytes.
    pub size: u64,
    /// File type.
    pub kind: FileType,
    /// Last modification time.
    pub mtime: SystemTime,
    /// Creation time, when the backend tracks it.
    pub ctime: Option<SystemTime>,
}

impl FileStatus {
    /// Status for a file that was just written.
    pub fn file(path: impl Into<String>, size: u64) -> Self {
        let now = SystemTime::now();
        Self {
            path: path.into(),
            size,
            kind: FileType::File,
            mtime: now,
            ctime: Some(now),
        }
    }

    /// Status for a directory that was just created.
    pub fn directory(path: impl Into<String>) -> Self {
        let now = SystemTime::now();
        Self {
            path: path.into(),
            size: 0,
            kind: FileType::Directory,
            mtime: now,
            ctime: Some(now),
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }
}

/// Caller-facing metadata, keyed by virtual path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Virtual path, in the same style the caller used.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// `file`, `directory` or `other`.
    pub kind: FileType,
    /// Modification time, seconds since the Unix epoch.
    pub mtime: i64,
}

impl FileInfo {
    /// Re-key a backend status under `virtual_name`.
    pub fn from_status(virtual_name: impl Into<String>, status: &FileStatus) -> Self {
        Self {
            name: virtual_name.into(),
            size: status.size,
            kind: status.kind,
            mtime: epoch_secs(status.mtime),
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }
}

/// Seconds since the Unix epoch; negative for times before it.
pub fn epoch_secs(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(e) => -(e.duration().as_secs() as i64),
    }
}
