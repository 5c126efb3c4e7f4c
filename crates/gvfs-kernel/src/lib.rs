//! # gvfs-kernel
//!
//! Fileset virtual filesystem. Virtual paths such as
//! `gvfs://fileset/<catalog>/<schema>/<fileset>/a/b.txt` are resolved through
//! a catalog onto storage locations like `file:/data/fs1/a/b.txt`, and
//! ordinary filesystem operations are delegated to the matching backend.
//!
//! Per call:
//! - [`identifier::parse`] turns the virtual path into a catalog identifier
//! - [`FilesetCache`] returns the loaded fileset (catalog record + backend),
//!   loading it once on a miss
//! - [`PathTranslator`] rewrites the path onto the storage location
//! - the [`StorageBackend`] does the work, and result paths are rewritten
//!   back into the caller's style
//!
//! [`VirtualFileSystem`] ties these together.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod file;
pub mod filesystem;
pub mod identifier;
mod lease;
pub mod location;
pub mod resolver;
pub mod translate;
pub mod vfs;

pub use cache::{CacheEntry, CacheStats, FilesetCache, MountKind};
pub use catalog::{CatalogClient, StaticCatalog};
pub use config::{CacheConfig, FilesetConfig, GvfsConfig};
pub use error::{CatalogError, GvfsError, GvfsResult};
pub use file::{FilesetFile, OpenMode};
pub use filesystem::VirtualFileSystem;
pub use identifier::{PathStyle, VirtualPath};
pub use resolver::{BackendFactory, BackendResolver, LocalFactory, SharedBackendFactory};
pub use translate::PathTranslator;
pub use vfs::{
    FileInfo, FileStatus, FileType, LocalBackend, MemoryBackend, StorageBackend, VfsError,
    VfsResult,
};

pub use gvfs_types::{CatalogIdentifier, FilesetDataOperation, FilesetMetadata, FilesetType};
