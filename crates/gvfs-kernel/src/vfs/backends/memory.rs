//! In-memory storage backend.
//!
//! Serves `memory:` locations. Used by tests and for scratch filesets; all
//! data is lost when the backend is dropped.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::RwLock;
use std::time::SystemTime;

use crate::location;
use crate::vfs::error::{VfsError, VfsResult};
use crate::vfs::ops::StorageBackend;
use crate::vfs::types::{FileStatus, FileType};

/// Scheme served by [`MemoryBackend`].
pub const MEMORY_SCHEME: &str = "memory";

/// Entry in the memory filesystem.
#[derive(Debug, Clone)]
enum Entry {
    File {
        data: Vec<u8>,
        mtime: SystemTime,
        ctime: SystemTime,
    },
    Directory {
        mtime: SystemTime,
        ctime: SystemTime,
    },
}

impl Entry {
    fn directory() -> Self {
        let now = SystemTime::now();
        Entry::Directory {
            mtime: now,
            ctime: now,
        }
    }

    fn file() -> Self {
        let now = SystemTime::now();
        Entry::File {
            data: Vec::new(),
            mtime: now,
            ctime: now,
        }
    }

    fn status(&self, path: String) -> FileStatus {
        match self {
            Entry::File { data, mtime, ctime } => FileStatus {
                path,
                size: data.len() as u64,
                kind: FileType::File,
                mtime: *mtime,
                ctime: Some(*ctime),
            },
            Entry::Directory { mtime, ctime } => FileStatus {
                path,
                size: 0,
                kind: FileType::Directory,
                mtime: *mtime,
                ctime: Some(*ctime),
            },
        }
    }
}

/// In-memory storage backend.
///
/// Thread-safe via internal `RwLock`. Keys are normalized relative paths;
/// the empty key is the root directory, which always exists.
#[derive(Debug)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<PathBuf, Entry>>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Create a new empty in-memory filesystem.
    pub fn new() -> Self {
        let mut entries = HashMap::new();
        entries.insert(PathBuf::new(), Entry::directory());
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Seed a file with `data`, creating parents. Convenience for tests and
    /// fixtures that want content without going through create + write.
    pub fn insert_file(&self, path: &str, data: impl Into<Vec<u8>>) -> VfsResult<()> {
        let key = Self::key(path)?;
        let mut entries = self.write_lock()?;
        Self::ensure_parents(&mut entries, &key, path)?;
        let now = SystemTime::now();
        entries.insert(
            key,
            Entry::File {
                data: data.into(),
                mtime: now,
                ctime: now,
            },
        );
        Ok(())
    }

    /// Map an actual path to its key: drop the scheme, resolve `.`/`..`.
    fn key(path: &str) -> VfsResult<PathBuf> {
        if let Some(scheme) = location::scheme(path) {
            if scheme != MEMORY_SCHEME {
                return Err(VfsError::invalid_path(path));
            }
        }
        let mut result = PathBuf::new();
        for component in Path::new(location::strip_scheme(path)).components() {
            match component {
                Component::Normal(s) => result.push(s),
                Component::ParentDir => {
                    result.pop();
                }
                Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
            }
        }
        Ok(result)
    }

    /// Render a key back into `memory:/...` form.
    fn uri(key: &Path) -> String {
        format!("{MEMORY_SCHEME}:/{}", key.display())
    }

    fn read_lock(&self) -> VfsResult<std::sync::RwLockReadGuard<'_, HashMap<PathBuf, Entry>>> {
        self.entries
            .read()
            .map_err(|_| VfsError::other("lock poisoned"))
    }

    fn write_lock(&self) -> VfsResult<std::sync::RwLockWriteGuard<'_, HashMap<PathBuf, Entry>>> {
        self.entries
            .write()
            .map_err(|_| VfsError::other("lock poisoned"))
    }

    /// Ensure all parent directories of `key` exist.
    fn ensure_parents(
        entries: &mut HashMap<PathBuf, Entry>,
        key: &Path,
        path: &str,
    ) -> VfsResult<()> {
        let mut current = PathBuf::new();
        for component in key.parent().into_iter().flat_map(|p| p.components()) {
            if let Component::Normal(s) = component {
                current.push(s);
                match entries.get(&current) {
                    Some(Entry::Directory { .. }) => {}
                    Some(Entry::File { .. }) => return Err(VfsError::not_a_directory(path)),
                    None => {
                        entries.insert(current.clone(), Entry::directory());
                    }
                }
            }
        }
        Ok(())
    }

    fn parent_is_dir(entries: &HashMap<PathBuf, Entry>, key: &Path) -> bool {
        let parent = key.parent().unwrap_or(Path::new(""));
        matches!(entries.get(parent), Some(Entry::Directory { .. }))
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    fn scheme(&self) -> &str {
        MEMORY_SCHEME
    }

    async fn getattr(&self, path: &str) -> VfsResult<FileStatus> {
        let key = Self::key(path)?;
        let entries = self.read_lock()?;
        entries
            .get(&key)
            .map(|e| e.status(Self::uri(&key)))
            .ok_or_else(|| VfsError::not_found(path))
    }

    async fn readdir(&self, path: &str) -> VfsResult<Vec<FileStatus>> {
        let key = Self::key(path)?;
        let entries = self.read_lock()?;

        match entries.get(&key) {
            Some(Entry::Directory { .. }) => {}
            Some(_) => return Err(VfsError::not_a_directory(path)),
            None => return Err(VfsError::not_found(path)),
        }

        let mut result: Vec<FileStatus> = entries
            .iter()
            .filter(|(entry_path, _)| {
                entry_path.parent() == Some(key.as_path()) && *entry_path != &key
            })
            .map(|(entry_path, entry)| entry.status(Self::uri(entry_path)))
            .collect();

        result.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(result)
    }

    async fn read(&self, path: &str, offset: u64, size: u32) -> VfsResult<Vec<u8>> {
        let key = Self::key(path)?;
        let entries = self.read_lock()?;

        match entries.get(&key) {
            Some(Entry::File { data, .. }) => {
                let start = (offset as usize).min(data.len());
                let end = start.saturating_add(size as usize).min(data.len());
                Ok(data[start..end].to_vec())
            }
            Some(Entry::Directory { .. }) => Err(VfsError::is_a_directory(path)),
            None => Err(VfsError::not_found(path)),
        }
    }

    async fn write(&self, path: &str, offset: u64, data: &[u8]) -> VfsResult<u32> {
        let key = Self::key(path)?;
        let mut entries = self.write_lock()?;

        match entries.get_mut(&key) {
            Some(Entry::File {
                data: file_data,
                mtime,
                ..
            }) => {
                let offset = offset as usize;
                if offset + data.len() > file_data.len() {
                    file_data.resize(offset + data.len(), 0);
                }
                file_data[offset..offset + data.len()].copy_from_slice(data);
                *mtime = SystemTime::now();
                Ok(data.len() as u32)
            }
            Some(Entry::Directory { .. }) => Err(VfsError::is_a_directory(path)),
            None => Err(VfsError::not_found(path)),
        }
    }

    async fn create(&self, path: &str, overwrite: bool) -> VfsResult<FileStatus> {
        let key = Self::key(path)?;
        if key.as_os_str().is_empty() {
            return Err(VfsError::is_a_directory(path));
        }
        let mut entries = self.write_lock()?;
        Self::ensure_parents(&mut entries, &key, path)?;

        match entries.get(&key) {
            Some(Entry::Directory { .. }) => return Err(VfsError::is_a_directory(path)),
            Some(Entry::File { .. }) if !overwrite => {
                return Err(VfsError::already_exists(path));
            }
            _ => {}
        }

        let entry = Entry::file();
        let status = entry.status(Self::uri(&key));
        entries.insert(key, entry);
        Ok(status)
    }

    async fn mkdir(&self, path: &str, parents: bool) -> VfsResult<FileStatus> {
        let key = Self::key(path)?;
        let mut entries = self.write_lock()?;

        if entries.contains_key(&key) {
            return Err(VfsError::already_exists(path));
        }
        if parents {
            Self::ensure_parents(&mut entries, &key, path)?;
        } else if !Self::parent_is_dir(&entries, &key) {
            return Err(VfsError::not_found(path));
        }

        let entry = Entry::directory();
        let status = entry.status(Self::uri(&key));
        entries.insert(key, entry);
        Ok(status)
    }

    async fn unlink(&self, path: &str) -> VfsResult<()> {
        let key = Self::key(path)?;
        let mut entries = self.write_lock()?;

        match entries.get(&key) {
            Some(Entry::Directory { .. }) => Err(VfsError::is_a_directory(path)),
            Some(_) => {
                entries.remove(&key);
                Ok(())
            }
            None => Err(VfsError::not_found(path)),
        }
    }

    async fn rmdir(&self, path: &str) -> VfsResult<()> {
        let key = Self::key(path)?;
        if key.as_os_str().is_empty() {
            return Err(VfsError::permission_denied("cannot remove root"));
        }
        let mut entries = self.write_lock()?;

        match entries.get(&key) {
            Some(Entry::Directory { .. }) => {}
            Some(_) => return Err(VfsError::not_a_directory(path)),
            None => return Err(VfsError::not_found(path)),
        }

        let has_children = entries.keys().any(|k| k.parent() == Some(key.as_path()));
        if has_children {
            return Err(VfsError::directory_not_empty(path));
        }

        entries.remove(&key);
        Ok(())
    }

    async fn remove_tree(&self, path: &str) -> VfsResult<()> {
        let key = Self::key(path)?;
        if key.as_os_str().is_empty() {
            return Err(VfsError::permission_denied("cannot remove root"));
        }
        let mut entries = self.write_lock()?;

        match entries.get(&key) {
            Some(Entry::Directory { .. }) => {}
            Some(_) => return Err(VfsError::not_a_directory(path)),
            None => return Err(VfsError::not_found(path)),
        }
        entries.retain(|k, _| !k.starts_with(&key));
        Ok(())
    }

    async fn rename(&self, from: &str, to: &str) -> VfsResult<()> {
        let from_key = Self::key(from)?;
        let to_key = Self::key(to)?;
        if from_key == to_key {
            return Ok(());
        }
        if to_key.starts_with(&from_key) {
            return Err(VfsError::invalid_path(to));
        }

        let mut entries = self.write_lock()?;
        if !entries.contains_key(&from_key) {
            return Err(VfsError::not_found(from));
        }
        if matches!(entries.get(&to_key), Some(Entry::Directory { .. })) {
            return Err(VfsError::already_exists(to));
        }
        Self::ensure_parents(&mut entries, &to_key, to)?;

        // Move the entry and, for directories, everything below it.
        let moved: Vec<PathBuf> = entries
            .keys()
            .filter(|k| k.starts_with(&from_key))
            .cloned()
            .collect();
        for old in moved {
            if let Some(entry) = entries.remove(&old) {
                let new_key = match old.strip_prefix(&from_key) {
                    Ok(relative) if relative.as_os_str().is_empty() => to_key.clone(),
                    Ok(relative) => to_key.join(relative),
                    Err(_) => continue,
                };
                entries.insert(new_key, entry);
            }
        }
        Ok(())
    }
}
