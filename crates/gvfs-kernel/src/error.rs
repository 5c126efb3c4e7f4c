//! Error types for the fileset layer.

use std::io;
use thiserror::Error;

use gvfs_types::{CatalogIdentifier, FilesetDataOperation};

use crate::vfs::VfsError;

/// Error returned by a [`CatalogClient`](crate::catalog::CatalogClient).
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog has no fileset under this identifier.
    #[error("fileset not found in catalog: {0}")]
    NotFound(CatalogIdentifier),

    /// The catalog did not answer in time.
    #[error("catalog request timed out: {0}")]
    Timeout(String),

    /// Connection or protocol failure talking to the catalog.
    #[error("catalog transport error: {0}")]
    Transport(String),

    /// The catalog refused the request.
    #[error("catalog denied access: {0}")]
    Unauthorized(String),

    /// The catalog answered with something unusable.
    #[error("invalid catalog response: {0}")]
    InvalidResponse(String),
}

impl CatalogError {
    fn io_kind(&self) -> io::ErrorKind {
        match self {
            CatalogError::NotFound(_) => io::ErrorKind::NotFound,
            CatalogError::Timeout(_) => io::ErrorKind::TimedOut,
            CatalogError::Transport(_) => io::ErrorKind::ConnectionAborted,
            CatalogError::Unauthorized(_) => io::ErrorKind::PermissionDenied,
            CatalogError::InvalidResponse(_) => io::ErrorKind::InvalidData,
        }
    }
}

/// Errors surfaced by [`VirtualFileSystem`](crate::VirtualFileSystem).
#[derive(Debug, Error)]
pub enum GvfsError {
    /// The virtual path does not follow the fileset grammar.
    #[error("invalid virtual path `{path}`: {reason}")]
    InvalidPath { path: String, reason: String },

    /// Nothing exists at this virtual path.
    #[error("no such file or directory: {0}")]
    NotFound(String),

    /// No backend is registered for the storage location's scheme.
    #[error("unsupported storage scheme `{scheme}` for fileset {identifier}")]
    UnsupportedBackend {
        scheme: String,
        identifier: CatalogIdentifier,
    },

    /// A two-path operation spans two filesets.
    #[error("cannot {operation} across filesets: `{src}` and `{dst}`")]
    CrossFileset {
        operation: FilesetDataOperation,
        src: String,
        dst: String,
    },

    /// A backend path does not lie under the fileset's storage location.
    #[error("path `{actual}` is not under storage location `{storage_location}`")]
    PrefixMismatch {
        actual: String,
        storage_location: String,
    },

    /// A sub-path was used on a fileset that mounts a single file.
    #[error("fileset mounts a single file; only `{expected}` is valid, got `{path}`")]
    AmbiguousPath { path: String, expected: String },

    /// The operation is not allowed on the root of a fileset.
    #[error("cannot {operation} the fileset root `{path}`")]
    MountRootOperation {
        operation: FilesetDataOperation,
        path: String,
    },

    /// Catalog failure, passed through unchanged.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Backend failure on a path.
    #[error("{path}: {source}")]
    Backend {
        path: String,
        #[source]
        source: VfsError,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl GvfsError {
    /// Create an InvalidPath error.
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Wrap a backend error raised while working on `virtual_path`.
    ///
    /// Not-found collapses into [`GvfsError::NotFound`] keyed by the virtual
    /// path; every other kind is kept as the source.
    pub fn from_backend(source: VfsError, virtual_path: impl Into<String>) -> Self {
        let path = virtual_path.into();
        if source.is_not_found() {
            Self::NotFound(path)
        } else {
            Self::Backend { path, source }
        }
    }

    /// True if this error means the target does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            GvfsError::NotFound(_) | GvfsError::Catalog(CatalogError::NotFound(_))
        )
    }
}

/// Convert GvfsError to std::io::Error for compatibility.
impl From<GvfsError> for io::Error {
    fn from(e: GvfsError) -> Self {
        let kind = match &e {
            GvfsError::InvalidPath { .. } | GvfsError::AmbiguousPath { .. } => {
                io::ErrorKind::InvalidInput
            }
            GvfsError::NotFound(_) => io::ErrorKind::NotFound,
            GvfsError::UnsupportedBackend { .. } => io::ErrorKind::Unsupported,
            GvfsError::CrossFileset { .. } => io::ErrorKind::CrossesDevices,
            GvfsError::PrefixMismatch { .. } => io::ErrorKind::InvalidData,
            GvfsError::MountRootOperation { .. } => io::ErrorKind::PermissionDenied,
            GvfsError::Catalog(c) => c.io_kind(),
            GvfsError::Backend { path, source } => {
                return io::Error::new(backend_kind(source), format!("{path}: {source}"));
            }
            GvfsError::Config(_) => io::ErrorKind::InvalidInput,
        };
        io::Error::new(kind, e)
    }
}

/// `io::ErrorKind` matching a backend error.
fn backend_kind(source: &VfsError) -> io::ErrorKind {
    match source {
        VfsError::Io(e) => e.kind(),
        VfsError::NotFound(_) => io::ErrorKind::NotFound,
        VfsError::AlreadyExists(_) => io::ErrorKind::AlreadyExists,
        VfsError::PermissionDenied(_) | VfsError::PathEscapesRoot(_) => {
            io::ErrorKind::PermissionDenied
        }
        VfsError::NotADirectory(_) => io::ErrorKind::NotADirectory,
        VfsError::IsADirectory(_) => io::ErrorKind::IsADirectory,
        VfsError::DirectoryNotEmpty(_) => io::ErrorKind::DirectoryNotEmpty,
        VfsError::InvalidPath(_) => io::ErrorKind::InvalidInput,
        VfsError::Other(_) => io::ErrorKind::Other,
    }
}

/// Result type for the fileset layer.
pub type GvfsResult<T> = Result<T, GvfsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_not_found_collapses() {
        let err = GvfsError::from_backend(
            VfsError::not_found("file:/data/fs1/x"),
            "fileset/c/s/fs1/x",
        );
        assert!(matches!(err, GvfsError::NotFound(ref p) if p == "fileset/c/s/fs1/x"));
    }

    #[test]
    fn test_backend_kind_preserved() {
        let err = GvfsError::from_backend(VfsError::is_a_directory("file:/d"), "fileset/c/s/f/d");
        let io_err: io::Error = err.into();
        assert_eq!(io_err.kind(), io::ErrorKind::IsADirectory);
    }

    #[test]
    fn test_catalog_timeout_stays_timeout() {
        let err = GvfsError::from(CatalogError::Timeout("10s".into()));
        assert!(matches!(err, GvfsError::Catalog(CatalogError::Timeout(_))));
        let io_err: io::Error = err.into();
        assert_eq!(io_err.kind(), io::ErrorKind::TimedOut);
    }

    #[test]
    fn test_cross_fileset_message() {
        let err = GvfsError::CrossFileset {
            operation: FilesetDataOperation::Rename,
            src: "fileset/c/s/a/x".into(),
            dst: "fileset/c/s/b/x".into(),
        };
        assert_eq!(
            err.to_string(),
            "cannot rename across filesets: `fileset/c/s/a/x` and `fileset/c/s/b/x`"
        );
    }
}
