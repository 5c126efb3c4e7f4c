//! Catalog client boundary.
//!
//! The cache consults a [`CatalogClient`] on every miss. [`StaticCatalog`]
//! is the in-process implementation used by tests and by deployments that
//! declare their filesets in configuration.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use gvfs_types::{CatalogIdentifier, FilesetMetadata};

use crate::config::GvfsConfig;
use crate::error::{CatalogError, GvfsError, GvfsResult};

/// Source of fileset metadata.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Fetch the record for one fileset.
    async fn load_fileset(&self, id: &CatalogIdentifier) -> Result<FilesetMetadata, CatalogError>;
}

/// In-memory catalog.
#[derive(Debug, Default)]
pub struct StaticCatalog {
    filesets: RwLock<HashMap<CatalogIdentifier, FilesetMetadata>>,
    loads: AtomicU64,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the `[[filesets]]` tables of `config`.
    pub fn from_config(config: &GvfsConfig) -> GvfsResult<Self> {
        let catalog = Self::new();
        for fs in &config.filesets {
            let id = CatalogIdentifier::new(&config.metalake, &fs.catalog, &fs.schema, &fs.name)
                .map_err(|e| GvfsError::config(e.to_string()))?;
            let mut metadata = FilesetMetadata::new(&fs.name, &fs.storage_location)
                .with_type(fs.fileset_type);
            metadata.comment = fs.comment.clone();
            metadata.properties = fs.properties.clone();
            catalog.insert(id, metadata);
        }
        Ok(catalog)
    }

    /// Add or replace a fileset.
    pub fn insert(&self, id: CatalogIdentifier, metadata: FilesetMetadata) {
        self.filesets.write().insert(id, metadata);
    }

    pub fn remove(&self, id: &CatalogIdentifier) -> Option<FilesetMetadata> {
        self.filesets.write().remove(id)
    }

    /// Number of `load_fileset` calls served so far, hits and misses alike.
    pub fn load_count(&self) -> u64 {
        self.loads.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl CatalogClient for StaticCatalog {
    async fn load_fileset(&self, id: &CatalogIdentifier) -> Result<FilesetMetadata, CatalogError> {
        self.loads.fetch_add(1, Ordering::Relaxed);
        self.filesets
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(id.clone()))
    }
}
