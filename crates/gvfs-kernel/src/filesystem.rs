//! The virtual filesystem facade.
//!
//! Every operation parses its virtual path, resolves the fileset through the
//! cache, rewrites the path onto the storage location, and delegates to the
//! backend. Paths coming back from the backend are rewritten into the
//! caller's style before they are returned.

use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

use tokio::io::AsyncWriteExt;
use tokio::task::JoinHandle;

use gvfs_types::FilesetDataOperation;

use crate::cache::{CacheEntry, CacheStats, FilesetCache};
use crate::catalog::{CatalogClient, StaticCatalog};
use crate::config::GvfsConfig;
use crate::error::{GvfsError, GvfsResult};
use crate::file::{FilesetFile, OpenMode};
use crate::identifier::{self, VirtualPath};
use crate::resolver::BackendResolver;
use crate::translate::PathTranslator;
use crate::vfs::{FileInfo, StorageBackend, VfsError};

/// Bytes moved per backend call when copying or downloading.
const COPY_CHUNK: u32 = 1024 * 1024;

/// A virtual path bound to its fileset entry and actual path.
struct Resolved {
    vpath: VirtualPath,
    virtual_path: String,
    entry: Arc<CacheEntry>,
    actual: String,
}

impl Resolved {
    fn backend(&self) -> Arc<dyn StorageBackend> {
        self.entry.backend()
    }

    /// Map a backend path back into this path's style.
    fn to_virtual(&self, actual: &str) -> GvfsResult<String> {
        PathTranslator::for_entry(&self.entry).actual_to_virtual(actual, self.vpath.style())
    }

    fn fail(&self, e: VfsError) -> GvfsError {
        GvfsError::from_backend(e, self.virtual_path.clone())
    }

    /// Root of a single-file mount.
    fn is_single_file_root(&self) -> bool {
        self.entry.is_single_file() && self.vpath.is_root()
    }

    fn reject_root(&self, operation: FilesetDataOperation) -> GvfsResult<()> {
        Err(GvfsError::MountRootOperation {
            operation,
            path: self.virtual_path.clone(),
        })
    }
}

/// Filesystem over catalog-managed filesets.
///
/// Owned and explicitly configured; two instances never share cache state.
/// Cheap to share behind an `Arc`: all methods take `&self`.
pub struct VirtualFileSystem {
    metalake: String,
    cache: Arc<FilesetCache>,
    sweeper: Option<JoinHandle<()>>,
}

impl VirtualFileSystem {
    /// Build a filesystem from explicit parts.
    ///
    /// When `config.cache.sweep_interval_secs` is set this spawns a sweeper
    /// task and must be called from inside a tokio runtime.
    pub fn new(
        config: &GvfsConfig,
        catalog: Arc<dyn CatalogClient>,
        resolver: BackendResolver,
    ) -> GvfsResult<Self> {
        config.validate()?;
        let cache = Arc::new(FilesetCache::new(catalog, resolver, &config.cache)?);

        let sweeper = match config.cache.sweep_interval() {
            Some(interval) => {
                if tokio::runtime::Handle::try_current().is_err() {
                    return Err(GvfsError::config(
                        "cache.sweep_interval_secs requires a tokio runtime",
                    ));
                }
                Some(cache.spawn_sweeper(interval))
            }
            None => None,
        };

        tracing::info!(
            metalake = %config.metalake,
            max_entries = config.cache.max_entries,
            ttl_secs = config.cache.ttl_secs,
            "virtual filesystem ready"
        );
        Ok(Self {
            metalake: config.metalake.clone(),
            cache,
            sweeper,
        })
    }

    /// Filesystem over the config's `[[filesets]]`, with built-in backends.
    pub fn from_config(config: &GvfsConfig) -> GvfsResult<Self> {
        let catalog = Arc::new(StaticCatalog::from_config(config)?);
        Self::new(config, catalog, BackendResolver::default())
    }

    pub fn metalake(&self) -> &str {
        &self.metalake
    }

    pub fn cache(&self) -> &FilesetCache {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Parse only.
    fn parse(&self, path: &str) -> GvfsResult<VirtualPath> {
        identifier::parse(path, &self.metalake)
    }

    async fn resolve(&self, path: &str, operation: FilesetDataOperation) -> GvfsResult<Resolved> {
        let vpath = self.parse(path)?;
        self.resolve_parsed(vpath, operation).await
    }

    async fn resolve_parsed(
        &self,
        vpath: VirtualPath,
        operation: FilesetDataOperation,
    ) -> GvfsResult<Resolved> {
        let entry = self.cache.resolve(vpath.identifier()).await?;
        let actual = PathTranslator::for_entry(&entry).virtual_to_actual(&vpath)?;
        tracing::debug!(%operation, %vpath, %actual, "resolved");
        Ok(Resolved {
            virtual_path: vpath.to_string(),
            vpath,
            entry,
            actual,
        })
    }

    /// Parse both ends of a two-path operation; they must share a fileset.
    fn parse_pair(
        &self,
        src: &str,
        dst: &str,
        operation: FilesetDataOperation,
    ) -> GvfsResult<(VirtualPath, VirtualPath)> {
        let src_path = self.parse(src)?;
        let dst_path = self.parse(dst)?;
        if src_path.identifier() != dst_path.identifier() {
            return Err(GvfsError::CrossFileset {
                operation,
                src: src.to_string(),
                dst: dst.to_string(),
            });
        }
        Ok((src_path, dst_path))
    }

    // ========================================================================
    // Reading
    // ========================================================================

    /// List a directory, with metadata for each child.
    #[tracing::instrument(skip(self), name = "gvfs.ls")]
    pub async fn ls(&self, path: &str) -> GvfsResult<Vec<FileInfo>> {
        let r = self.resolve(path, FilesetDataOperation::ListStatus).await?;
        if r.entry.is_single_file() {
            return Err(r.fail(VfsError::not_a_directory(&r.actual)));
        }

        let statuses = r.backend().readdir(&r.actual).await.map_err(|e| r.fail(e))?;
        statuses
            .iter()
            .map(|status| -> GvfsResult<FileInfo> {
                Ok(FileInfo::from_status(r.to_virtual(&status.path)?, status))
            })
            .collect()
    }

    /// List a directory, names only.
    pub async fn ls_names(&self, path: &str) -> GvfsResult<Vec<String>> {
        Ok(self.ls(path).await?.into_iter().map(|info| info.name).collect())
    }

    /// Metadata for one path.
    #[tracing::instrument(skip(self), name = "gvfs.info")]
    pub async fn info(&self, path: &str) -> GvfsResult<FileInfo> {
        let r = self.resolve(path, FilesetDataOperation::GetFileStatus).await?;
        let status = r.backend().getattr(&r.actual).await.map_err(|e| r.fail(e))?;
        Ok(FileInfo::from_status(r.to_virtual(&status.path)?, &status))
    }

    /// True if something exists at `path`. Catalog failures still propagate.
    #[tracing::instrument(skip(self), name = "gvfs.exists")]
    pub async fn exists(&self, path: &str) -> GvfsResult<bool> {
        let r = self.resolve(path, FilesetDataOperation::Exists).await?;
        r.backend().exists(&r.actual).await.map_err(|e| r.fail(e))
    }

    #[tracing::instrument(skip(self), name = "gvfs.modified")]
    pub async fn modified(&self, path: &str) -> GvfsResult<SystemTime> {
        let r = self.resolve(path, FilesetDataOperation::ModifiedTime).await?;
        r.backend().modified(&r.actual).await.map_err(|e| r.fail(e))
    }

    /// Creation time, when the backend records one.
    #[tracing::instrument(skip(self), name = "gvfs.created")]
    pub async fn created(&self, path: &str) -> GvfsResult<Option<SystemTime>> {
        let r = self.resolve(path, FilesetDataOperation::CreatedTime).await?;
        let status = r.backend().getattr(&r.actual).await.map_err(|e| r.fail(e))?;
        Ok(status.ctime)
    }

    /// Open a file.
    #[tracing::instrument(skip(self), name = "gvfs.open")]
    pub async fn open(&self, path: &str, mode: OpenMode) -> GvfsResult<FilesetFile> {
        let operation = match mode {
            OpenMode::Read => FilesetDataOperation::Open,
            OpenMode::Write => FilesetDataOperation::Create,
            OpenMode::Append => FilesetDataOperation::Append,
        };
        let r = self.resolve(path, operation).await?;
        let backend = r.backend();

        let position = match mode {
            OpenMode::Read => {
                let status = backend.getattr(&r.actual).await.map_err(|e| r.fail(e))?;
                if status.is_dir() {
                    return Err(r.fail(VfsError::is_a_directory(&r.actual)));
                }
                0
            }
            OpenMode::Write => {
                backend.create(&r.actual, true).await.map_err(|e| r.fail(e))?;
                0
            }
            OpenMode::Append => match backend.getattr(&r.actual).await {
                Ok(status) if status.is_dir() => {
                    return Err(r.fail(VfsError::is_a_directory(&r.actual)));
                }
                Ok(status) => status.size,
                Err(e) if e.is_not_found() => {
                    backend.create(&r.actual, false).await.map_err(|e| r.fail(e))?;
                    0
                }
                Err(e) => return Err(r.fail(e)),
            },
        };

        Ok(FilesetFile::new(
            backend.clone(),
            r.actual.clone(),
            r.virtual_path.clone(),
            mode,
            position,
        ))
    }

    /// Read bytes `[start, end)` of a file. `None` means the file's start or
    /// end; an `end` before `start` yields nothing.
    #[tracing::instrument(skip(self), name = "gvfs.cat_file")]
    pub async fn cat_file(
        &self,
        path: &str,
        start: Option<u64>,
        end: Option<u64>,
    ) -> GvfsResult<Vec<u8>> {
        let r = self.resolve(path, FilesetDataOperation::CatFile).await?;
        let status = r.backend().getattr(&r.actual).await.map_err(|e| r.fail(e))?;
        if status.is_dir() {
            return Err(r.fail(VfsError::is_a_directory(&r.actual)));
        }

        let start = start.unwrap_or(0).min(status.size);
        let end = end.unwrap_or(status.size).min(status.size);
        let mut out = Vec::with_capacity(end.saturating_sub(start) as usize);
        let mut offset = start;
        while offset < end {
            let want = (end - offset).min(COPY_CHUNK as u64) as u32;
            let chunk = r
                .backend()
                .read(&r.actual, offset, want)
                .await
                .map_err(|e| r.fail(e))?;
            if chunk.is_empty() {
                break;
            }
            offset += chunk.len() as u64;
            out.extend_from_slice(&chunk);
        }
        Ok(out)
    }

    /// Download a file to `local`. A directory only creates `local`.
    #[tracing::instrument(skip(self, local), name = "gvfs.get_file")]
    pub async fn get_file(&self, path: &str, local: impl AsRef<Path>) -> GvfsResult<()> {
        let local = local.as_ref();
        let local_err = |e: std::io::Error| GvfsError::Backend {
            path: local.display().to_string(),
            source: VfsError::from_io(e, local.display().to_string()),
        };

        let r = self.resolve(path, FilesetDataOperation::GetFile).await?;
        let status = r.backend().getattr(&r.actual).await.map_err(|e| r.fail(e))?;
        if status.is_dir() {
            return tokio::fs::create_dir_all(local).await.map_err(local_err);
        }

        let mut out = tokio::fs::File::create(local).await.map_err(local_err)?;
        let mut offset = 0u64;
        loop {
            let chunk = r
                .backend()
                .read(&r.actual, offset, COPY_CHUNK)
                .await
                .map_err(|e| r.fail(e))?;
            if chunk.is_empty() {
                break;
            }
            out.write_all(&chunk).await.map_err(local_err)?;
            offset += chunk.len() as u64;
        }
        out.flush().await.map_err(local_err)?;
        Ok(())
    }

    // ========================================================================
    // Two-path operations
    // ========================================================================

    /// Copy a file within one fileset.
    ///
    /// Data lands in a temporary sibling of `dst` that is renamed into place
    /// once complete; on any failure the temporary is removed and `dst` is
    /// left as it was.
    #[tracing::instrument(skip(self), name = "gvfs.cp_file")]
    pub async fn cp_file(&self, src: &str, dst: &str) -> GvfsResult<()> {
        let operation = FilesetDataOperation::CopyFile;
        let (src_path, dst_path) = self.parse_pair(src, dst, operation)?;
        let src_r = self.resolve_parsed(src_path, operation).await?;
        if src_r.is_single_file_root() {
            return src_r.reject_root(operation);
        }
        let dst_r = self.resolve_parsed(dst_path, operation).await?;

        let backend = src_r.backend();
        let status = backend
            .getattr(&src_r.actual)
            .await
            .map_err(|e| src_r.fail(e))?;
        if status.is_dir() {
            return Err(src_r.fail(VfsError::is_a_directory(&src_r.actual)));
        }

        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let tmp = format!("{}.tmp.{}", dst_r.actual, &suffix[..12]);

        let result = copy_via_temp(&*backend, &src_r, &dst_r, &tmp).await;
        if result.is_err() {
            match backend.unlink(&tmp).await {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {}
                Err(e) => tracing::warn!(tmp = %tmp, error = %e, "failed to remove temporary copy"),
            }
        }
        result
    }

    /// Move a file or directory within one fileset.
    #[tracing::instrument(skip(self), name = "gvfs.mv")]
    pub async fn mv(&self, src: &str, dst: &str) -> GvfsResult<()> {
        let operation = FilesetDataOperation::Rename;
        let (src_path, dst_path) = self.parse_pair(src, dst, operation)?;
        let src_r = self.resolve_parsed(src_path, operation).await?;
        if src_r.entry.is_single_file() || src_r.vpath.is_root() {
            return src_r.reject_root(operation);
        }
        let dst_r = self.resolve_parsed(dst_path, operation).await?;

        src_r
            .backend()
            .rename(&src_r.actual, &dst_r.actual)
            .await
            .map_err(|e| src_r.fail(e))
    }

    // ========================================================================
    // Deletes
    // ========================================================================

    /// Remove a file. Directories and fileset roots are rejected.
    #[tracing::instrument(skip(self), name = "gvfs.rm_file")]
    pub async fn rm_file(&self, path: &str) -> GvfsResult<()> {
        let operation = FilesetDataOperation::Delete;
        let r = self.resolve(path, operation).await?;
        if r.vpath.is_root() {
            return r.reject_root(operation);
        }
        r.backend().unlink(&r.actual).await.map_err(|e| r.fail(e))
    }

    /// Remove a file, or a directory tree when `recursive`. A fileset root
    /// is never removed.
    #[tracing::instrument(skip(self), name = "gvfs.rm")]
    pub async fn rm(&self, path: &str, recursive: bool) -> GvfsResult<()> {
        let operation = FilesetDataOperation::Delete;
        let r = self.resolve(path, operation).await?;
        if r.vpath.is_root() {
            return r.reject_root(operation);
        }

        let backend = r.backend();
        let status = backend.getattr(&r.actual).await.map_err(|e| r.fail(e))?;
        if status.is_dir() {
            if !recursive {
                return Err(r.fail(VfsError::is_a_directory(&r.actual)));
            }
            backend.remove_tree(&r.actual).await.map_err(|e| r.fail(e))
        } else {
            backend.unlink(&r.actual).await.map_err(|e| r.fail(e))
        }
    }

    /// Remove an empty directory other than a fileset root.
    #[tracing::instrument(skip(self), name = "gvfs.rmdir")]
    pub async fn rmdir(&self, path: &str) -> GvfsResult<()> {
        let operation = FilesetDataOperation::Delete;
        let r = self.resolve(path, operation).await?;
        if r.vpath.is_root() {
            return r.reject_root(operation);
        }
        r.backend().rmdir(&r.actual).await.map_err(|e| r.fail(e))
    }

    // ========================================================================
    // Directories
    // ========================================================================

    /// Create a directory.
    ///
    /// Fails with `AlreadyExists` if the path exists. Without
    /// `create_parents`, a missing parent is `NotFound`.
    #[tracing::instrument(skip(self), name = "gvfs.mkdir")]
    pub async fn mkdir(&self, path: &str, create_parents: bool) -> GvfsResult<()> {
        let r = self.resolve(path, FilesetDataOperation::Mkdirs).await?;
        r.backend()
            .mkdir(&r.actual, create_parents)
            .await
            .map(|_| ())
            .map_err(|e| r.fail(e))
    }

    /// Create a directory and its parents. With `exist_ok`, an existing
    /// directory is not an error.
    #[tracing::instrument(skip(self), name = "gvfs.makedirs")]
    pub async fn makedirs(&self, path: &str, exist_ok: bool) -> GvfsResult<()> {
        let r = self.resolve(path, FilesetDataOperation::Mkdirs).await?;
        let backend = r.backend();
        match backend.mkdir(&r.actual, true).await {
            Ok(_) => Ok(()),
            Err(VfsError::AlreadyExists(_)) if exist_ok => {
                let status = backend.getattr(&r.actual).await.map_err(|e| r.fail(e))?;
                if status.is_dir() {
                    Ok(())
                } else {
                    Err(r.fail(VfsError::already_exists(&r.actual)))
                }
            }
            Err(e) => Err(r.fail(e)),
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Empty the cache. Backends are closed once no open file uses them.
    pub async fn close(&self) {
        self.cache.invalidate_all().await;
        tracing::info!("virtual filesystem closed");
    }
}

/// Stream `src` into `tmp`, then rename `tmp` onto `dst`.
async fn copy_via_temp(
    backend: &dyn StorageBackend,
    src: &Resolved,
    dst: &Resolved,
    tmp: &str,
) -> GvfsResult<()> {
    backend.create(tmp, false).await.map_err(|e| dst.fail(e))?;

    let mut offset = 0u64;
    loop {
        let chunk = backend
            .read(&src.actual, offset, COPY_CHUNK)
            .await
            .map_err(|e| src.fail(e))?;
        if chunk.is_empty() {
            break;
        }
        let mut written = 0usize;
        while written < chunk.len() {
            let n = backend
                .write(tmp, offset + written as u64, &chunk[written..])
                .await
                .map_err(|e| dst.fail(e))?;
            if n == 0 {
                return Err(dst.fail(VfsError::other("backend accepted no bytes")));
            }
            written += n as usize;
        }
        offset += chunk.len() as u64;
    }

    backend
        .rename(tmp, &dst.actual)
        .await
        .map_err(|e| dst.fail(e))?;
    tracing::debug!(bytes = offset, "copied");
    Ok(())
}

impl Drop for VirtualFileSystem {
    fn drop(&mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::MemoryBackend;
    use gvfs_types::{CatalogIdentifier, FilesetMetadata};

    struct Fixture {
        fs: VirtualFileSystem,
        memory: Arc<MemoryBackend>,
        catalog: Arc<StaticCatalog>,
    }

    fn fixture() -> Fixture {
        let memory = Arc::new(MemoryBackend::new());
        let catalog = Arc::new(StaticCatalog::new());
        for (name, location) in [
            ("fs1", "memory:/data/fs1"),
            ("fs2", "memory:/data/fs2"),
            ("one", "memory:/data/one.csv"),
        ] {
            catalog.insert(
                CatalogIdentifier::new("lake", "cat1", "sch1", name).unwrap(),
                FilesetMetadata::new(name, location),
            );
        }
        memory.insert_file("memory:/data/fs1/a.txt", "hello").unwrap();
        memory.insert_file("memory:/data/fs1/dir/b.txt", "bee").unwrap();
        memory.insert_file("memory:/data/one.csv", "x,y").unwrap();

        let fs = VirtualFileSystem::new(
            &GvfsConfig::new("lake"),
            catalog.clone(),
            BackendResolver::with_memory(memory.clone()),
        )
        .unwrap();
        Fixture {
            fs,
            memory,
            catalog,
        }
    }

    #[tokio::test]
    async fn test_ls_keeps_caller_style() {
        let f = fixture();

        let names = f.fs.ls_names("fileset/cat1/sch1/fs1").await.unwrap();
        assert_eq!(
            names,
            vec!["fileset/cat1/sch1/fs1/a.txt", "fileset/cat1/sch1/fs1/dir"]
        );

        let infos = f.fs.ls("gvfs://fileset/cat1/sch1/fs1/dir/").await.unwrap();
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].name, "gvfs://fileset/cat1/sch1/fs1/dir/b.txt");
        assert_eq!(infos[0].size, 3);
    }

    #[tokio::test]
    async fn test_info_and_exists() {
        let f = fixture();

        let info = f.fs.info("/cat1/sch1/fs1/a.txt").await.unwrap();
        assert_eq!(info.name, "/cat1/sch1/fs1/a.txt");
        assert!(info.is_file());
        assert_eq!(info.size, 5);

        assert!(f.fs.exists("fileset/cat1/sch1/fs1/dir").await.unwrap());
        assert!(!f.fs.exists("fileset/cat1/sch1/fs1/nope").await.unwrap());

        let err = f.fs.info("fileset/cat1/sch1/fs1/nope").await.unwrap_err();
        assert!(matches!(err, GvfsError::NotFound(ref p) if p == "fileset/cat1/sch1/fs1/nope"));
    }

    #[tokio::test]
    async fn test_missing_fileset_is_catalog_error() {
        let f = fixture();
        let err = f.fs.exists("fileset/cat1/sch1/ghost/a").await.unwrap_err();
        assert!(matches!(err, GvfsError::Catalog(_)));
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_cross_fileset_rejected_before_resolve() {
        let f = fixture();

        let err = f
            .fs
            .mv("fileset/cat1/sch1/fs1/a.txt", "fileset/cat1/sch1/fs2/a.txt")
            .await
            .unwrap_err();
        assert!(matches!(err, GvfsError::CrossFileset { .. }));

        let err = f
            .fs
            .cp_file("fileset/cat1/sch1/fs1/a.txt", "/cat1/sch1/ghost/a.txt")
            .await
            .unwrap_err();
        assert!(matches!(err, GvfsError::CrossFileset { .. }));

        assert_eq!(f.catalog.load_count(), 0);
        assert!(f.memory.exists("memory:/data/fs1/a.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_single_file_mount() {
        let f = fixture();

        let info = f.fs.info("fileset/cat1/sch1/one").await.unwrap();
        assert!(info.is_file());
        assert_eq!(info.name, "fileset/cat1/sch1/one");

        let err = f.fs.info("fileset/cat1/sch1/one/x").await.unwrap_err();
        assert!(matches!(err, GvfsError::AmbiguousPath { .. }));

        assert!(f.fs.ls("fileset/cat1/sch1/one").await.is_err());

        let err = f.fs.rm_file("fileset/cat1/sch1/one").await.unwrap_err();
        assert!(matches!(err, GvfsError::MountRootOperation { .. }));
        let err = f
            .fs
            .mv("fileset/cat1/sch1/one", "fileset/cat1/sch1/one")
            .await
            .unwrap_err();
        assert!(matches!(err, GvfsError::MountRootOperation { .. }));

        let data = f.fs.cat_file("fileset/cat1/sch1/one", None, None).await.unwrap();
        assert_eq!(data, b"x,y");
    }

    #[tokio::test]
    async fn test_mv_fileset_root_rejected() {
        let f = fixture();
        let err = f
            .fs
            .mv("fileset/cat1/sch1/fs1", "fileset/cat1/sch1/fs1/moved")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GvfsError::MountRootOperation { operation: FilesetDataOperation::Rename, .. }
        ));
    }

    #[tokio::test]
    async fn test_delete_fileset_root_rejected() {
        let f = fixture();

        for err in [
            f.fs.rm("fileset/cat1/sch1/fs1", true).await.unwrap_err(),
            f.fs.rm("gvfs://fileset/cat1/sch1/fs1/", false).await.unwrap_err(),
            f.fs.rmdir("/cat1/sch1/fs1").await.unwrap_err(),
            f.fs.rm_file("fileset/cat1/sch1/fs1").await.unwrap_err(),
        ] {
            assert!(matches!(
                err,
                GvfsError::MountRootOperation { operation: FilesetDataOperation::Delete, .. }
            ));
        }

        // Storage location untouched.
        assert!(f.memory.exists("memory:/data/fs1").await.unwrap());
        assert!(f.memory.exists("memory:/data/fs1/a.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_open_modes() {
        let f = fixture();
        let path = "fileset/cat1/sch1/fs1/new/log.txt";

        let mut w = f.fs.open(path, OpenMode::Write).await.unwrap();
        w.write(b"one").await.unwrap();

        let mut a = f.fs.open(path, OpenMode::Append).await.unwrap();
        assert_eq!(a.position(), 3);
        a.write(b"two").await.unwrap();

        let mut r = f.fs.open(path, OpenMode::Read).await.unwrap();
        assert_eq!(r.read_to_end().await.unwrap(), b"onetwo");

        let err = f
            .fs
            .open("fileset/cat1/sch1/fs1/dir", OpenMode::Read)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GvfsError::Backend { source: VfsError::IsADirectory(_), .. }
        ));
    }

    #[tokio::test]
    async fn test_cat_file_ranges() {
        let f = fixture();
        let path = "fileset/cat1/sch1/fs1/a.txt";

        assert_eq!(f.fs.cat_file(path, Some(1), Some(4)).await.unwrap(), b"ell");
        assert_eq!(f.fs.cat_file(path, Some(3), None).await.unwrap(), b"lo");
        assert_eq!(f.fs.cat_file(path, None, Some(100)).await.unwrap(), b"hello");
        assert!(f.fs.cat_file(path, Some(4), Some(2)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cp_file_within_fileset() {
        let f = fixture();

        f.fs
            .cp_file("fileset/cat1/sch1/fs1/a.txt", "fileset/cat1/sch1/fs1/copy/a2.txt")
            .await
            .unwrap();
        assert_eq!(
            f.memory.read_all("memory:/data/fs1/copy/a2.txt").await.unwrap(),
            b"hello"
        );

        // Nothing left behind next to the destination.
        let names = f.fs.ls_names("fileset/cat1/sch1/fs1/copy").await.unwrap();
        assert_eq!(names, vec!["fileset/cat1/sch1/fs1/copy/a2.txt"]);

        let err = f
            .fs
            .cp_file("fileset/cat1/sch1/fs1/dir", "fileset/cat1/sch1/fs1/dir2")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GvfsError::Backend { source: VfsError::IsADirectory(_), .. }
        ));
    }

    #[tokio::test]
    async fn test_deletes() {
        let f = fixture();

        let err = f.fs.rm_file("fileset/cat1/sch1/fs1/dir").await.unwrap_err();
        assert!(matches!(err, GvfsError::Backend { source: VfsError::IsADirectory(_), .. }));

        let err = f.fs.rm("fileset/cat1/sch1/fs1/dir", false).await.unwrap_err();
        assert!(matches!(err, GvfsError::Backend { source: VfsError::IsADirectory(_), .. }));

        let err = f.fs.rmdir("fileset/cat1/sch1/fs1/dir").await.unwrap_err();
        assert!(matches!(
            err,
            GvfsError::Backend { source: VfsError::DirectoryNotEmpty(_), .. }
        ));

        f.fs.rm("fileset/cat1/sch1/fs1/dir", true).await.unwrap();
        f.fs.rm("fileset/cat1/sch1/fs1/a.txt", false).await.unwrap();
        assert!(f.fs.ls("fileset/cat1/sch1/fs1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mkdir_and_makedirs() {
        let f = fixture();

        let err = f.fs.mkdir("fileset/cat1/sch1/fs1/dir", true).await.unwrap_err();
        assert!(matches!(err, GvfsError::Backend { source: VfsError::AlreadyExists(_), .. }));

        let err = f.fs.mkdir("fileset/cat1/sch1/fs1/x/y", false).await.unwrap_err();
        assert!(matches!(err, GvfsError::NotFound(_)));

        f.fs.mkdir("fileset/cat1/sch1/fs1/x/y", true).await.unwrap();
        f.fs.makedirs("fileset/cat1/sch1/fs1/x/y", true).await.unwrap();
        assert!(f.fs.makedirs("fileset/cat1/sch1/fs1/x/y", false).await.is_err());
        assert!(f.fs.makedirs("fileset/cat1/sch1/fs1/a.txt", true).await.is_err());
    }

    #[tokio::test]
    async fn test_close_empties_cache() {
        let f = fixture();
        f.fs.exists("fileset/cat1/sch1/fs1").await.unwrap();
        assert_eq!(f.fs.cache_stats().entries, 1);

        f.fs.close().await;
        assert!(f.fs.cache().is_empty());
    }

    #[test]
    fn test_sweeper_needs_runtime() {
        let mut config = GvfsConfig::new("lake");
        config.cache.sweep_interval_secs = Some(5);
        let result = VirtualFileSystem::new(
            &config,
            Arc::new(StaticCatalog::new()),
            BackendResolver::default(),
        );
        assert!(matches!(result, Err(GvfsError::Config(_))));
    }
}
