//! Storage backend abstraction.
//!
//! This module is the layer below filesets: it knows nothing about catalogs
//! or virtual paths, only actual storage URIs. Key components:
//!
//! - [`StorageBackend`] - Core trait for storage operations
//! - [`MemoryBackend`] - In-memory storage (`memory:` scheme, testing)
//! - [`LocalBackend`] - Local filesystem (`file:` scheme)
//!
//! ## Design Decisions
//!
//! - **URI paths, not `Path`**: actual paths carry their scheme and
//!   authority so the translator can prefix-match them against a fileset's
//!   storage location.
//! - **Explicit offset/size**: read/write take offset and size, so an open
//!   file handle is just a path plus a cursor.
//! - **Full paths in listings**: `readdir` returns complete actual paths
//!   rather than bare names; every one of them is mapped back to a virtual
//!   path before it reaches a caller.

pub mod backends;
mod error;
mod ops;
mod types;

pub use backends::{LocalBackend, MemoryBackend};
pub use error::{VfsError, VfsResult};
pub use ops::StorageBackend;
pub use types::{FileInfo, FileStatus, FileType, epoch_secs};
