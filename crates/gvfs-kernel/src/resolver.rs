//! Storage location → backend dispatch.
//!
//! The resolver is an explicit table of scheme → [`BackendFactory`]. `file`
//! and `memory` are registered by default; callers add others with
//! [`BackendResolver::register`] before handing the resolver to the
//! filesystem.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use gvfs_types::CatalogIdentifier;

use crate::error::{GvfsError, GvfsResult};
use crate::location;
use crate::vfs::backends::{FILE_SCHEME, MEMORY_SCHEME};
use crate::vfs::{LocalBackend, MemoryBackend, StorageBackend, VfsResult};

/// Builds a backend for a storage location.
#[async_trait]
pub trait BackendFactory: Send + Sync {
    /// Open a backend able to serve paths under `storage_location`.
    async fn open(&self, storage_location: &str) -> VfsResult<Arc<dyn StorageBackend>>;
}

/// Factory for unconfined [`LocalBackend`]s.
#[derive(Debug, Default)]
pub struct LocalFactory;

#[async_trait]
impl BackendFactory for LocalFactory {
    async fn open(&self, _storage_location: &str) -> VfsResult<Arc<dyn StorageBackend>> {
        Ok(Arc::new(LocalBackend::new()))
    }
}

/// Factory that hands out one pre-built backend for every location.
///
/// Used for the built-in `memory` scheme, so all memory filesets share one
/// namespace that callers can seed ahead of time.
pub struct SharedBackendFactory {
    backend: Arc<dyn StorageBackend>,
}

impl SharedBackendFactory {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl BackendFactory for SharedBackendFactory {
    async fn open(&self, _storage_location: &str) -> VfsResult<Arc<dyn StorageBackend>> {
        Ok(self.backend.clone())
    }
}

/// Scheme → factory registry.
#[derive(Clone)]
pub struct BackendResolver {
    factories: HashMap<String, Arc<dyn BackendFactory>>,
}

impl Default for BackendResolver {
    fn default() -> Self {
        Self::with_memory(Arc::new(MemoryBackend::new()))
    }
}

impl BackendResolver {
    /// A resolver with no schemes registered.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Built-in schemes, with `memory:` served by `memory`.
    pub fn with_memory(memory: Arc<MemoryBackend>) -> Self {
        let mut resolver = Self::empty();
        resolver.register(FILE_SCHEME, Arc::new(LocalFactory));
        resolver.register(MEMORY_SCHEME, Arc::new(SharedBackendFactory::new(memory)));
        resolver
    }

    /// Register (or replace) the factory for `scheme`.
    pub fn register(&mut self, scheme: impl Into<String>, factory: Arc<dyn BackendFactory>) {
        self.factories
            .insert(scheme.into().to_ascii_lowercase(), factory);
    }

    /// Registered schemes, sorted.
    pub fn schemes(&self) -> Vec<&str> {
        let mut schemes: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        schemes.sort_unstable();
        schemes
    }

    /// Build the backend for fileset `id` stored at `storage_location`.
    ///
    /// A location without a scheme, or with one nobody registered, is
    /// [`GvfsError::UnsupportedBackend`].
    pub async fn build(
        &self,
        id: &CatalogIdentifier,
        storage_location: &str,
    ) -> GvfsResult<Arc<dyn StorageBackend>> {
        let scheme = location::scheme(storage_location).unwrap_or_default();
        let factory = self
            .factories
            .get(&scheme)
            .ok_or_else(|| GvfsError::UnsupportedBackend {
                scheme: scheme.clone(),
                identifier: id.clone(),
            })?;

        tracing::debug!(%id, %scheme, storage_location, "building backend");
        factory
            .open(storage_location)
            .await
            .map_err(|source| GvfsError::Backend {
                path: storage_location.to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> CatalogIdentifier {
        CatalogIdentifier::new("lake", "c", "s", "f").unwrap()
    }

    #[tokio::test]
    async fn test_builtin_schemes() {
        let resolver = BackendResolver::default();
        assert_eq!(resolver.schemes(), vec!["file", "memory"]);

        let backend = resolver.build(&id(), "file:/data/f").await.unwrap();
        assert_eq!(backend.scheme(), "file");

        let backend = resolver.build(&id(), "MEMORY:/f").await.unwrap();
        assert_eq!(backend.scheme(), "memory");
    }

    #[tokio::test]
    async fn test_unknown_scheme() {
        let resolver = BackendResolver::default();
        let err = resolver
            .build(&id(), "s3a://bucket/f")
            .await
            .err()
            .unwrap();
        match err {
            GvfsError::UnsupportedBackend { scheme, identifier } => {
                assert_eq!(scheme, "s3a");
                assert_eq!(identifier, id());
            }
            other => panic!("expected UnsupportedBackend, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_schemeless_location() {
        let resolver = BackendResolver::default();
        let err = resolver.build(&id(), "/data/f").await.err().unwrap();
        assert!(matches!(err, GvfsError::UnsupportedBackend { ref scheme, .. } if scheme.is_empty()));
    }

    #[tokio::test]
    async fn test_memory_backend_is_shared() {
        let memory = Arc::new(MemoryBackend::new());
        memory.insert_file("memory:/seed/a.txt", "a").unwrap();
        let resolver = BackendResolver::with_memory(memory);

        let backend = resolver.build(&id(), "memory:/seed").await.unwrap();
        assert!(backend.exists("memory:/seed/a.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_register_custom() {
        let mut resolver = BackendResolver::empty();
        resolver.register(
            "hdfs",
            Arc::new(SharedBackendFactory::new(Arc::new(MemoryBackend::new()))),
        );
        assert!(resolver.build(&id(), "hdfs://nn:8020/f").await.is_ok());
        assert!(resolver.build(&id(), "file:/f").await.is_err());
    }
}
