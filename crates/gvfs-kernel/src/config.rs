//! Client configuration.
//!
//! ```toml
//! metalake = "lake"
//!
//! [cache]
//! max_entries = 20
//! ttl_secs = 3600
//! sweep_interval_secs = 60
//!
//! [[filesets]]
//! catalog = "cat1"
//! schema = "sch1"
//! name = "fs1"
//! storage_location = "file:/data/fs1"
//! ```
//!
//! `[[filesets]]` tables are only read by
//! [`StaticCatalog::from_config`](crate::catalog::StaticCatalog::from_config).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use gvfs_types::FilesetType;

use crate::error::{GvfsError, GvfsResult};

/// Top-level client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GvfsConfig {
    /// Metalake every virtual path is resolved under.
    pub metalake: String,

    #[serde(default)]
    pub cache: CacheConfig,

    /// Filesets for the static catalog.
    #[serde(default)]
    pub filesets: Vec<FilesetConfig>,
}

impl GvfsConfig {
    /// Config for `metalake` with default cache settings.
    pub fn new(metalake: impl Into<String>) -> Self {
        Self {
            metalake: metalake.into(),
            cache: CacheConfig::default(),
            filesets: Vec::new(),
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> GvfsResult<Self> {
        let config: GvfsConfig =
            toml::from_str(content).map_err(|e| GvfsError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> GvfsResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| GvfsError::config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> GvfsResult<()> {
        if self.metalake.is_empty() {
            return Err(GvfsError::config("metalake must not be empty"));
        }
        self.cache.validate()
    }
}

/// Fileset metadata cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of cached filesets.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Seconds an entry stays valid after it was loaded.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Seconds between background sweeps of expired entries. `None` leaves
    /// expiry to lookups.
    #[serde(default)]
    pub sweep_interval_secs: Option<u64>,
}

fn default_max_entries() -> usize {
    20
}

fn default_ttl_secs() -> u64 {
    3600
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            ttl_secs: default_ttl_secs(),
            sweep_interval_secs: None,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        self.sweep_interval_secs.map(Duration::from_secs)
    }

    pub fn validate(&self) -> GvfsResult<()> {
        if self.max_entries == 0 {
            return Err(GvfsError::config("cache.max_entries must be greater than 0"));
        }
        if self.ttl_secs == 0 {
            return Err(GvfsError::config("cache.ttl_secs must be greater than 0"));
        }
        if self.sweep_interval_secs == Some(0) {
            return Err(GvfsError::config(
                "cache.sweep_interval_secs must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// One `[[filesets]]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesetConfig {
    pub catalog: String,
    pub schema: String,
    pub name: String,
    pub storage_location: String,
    #[serde(default)]
    pub fileset_type: FilesetType,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub properties: HashMap<String, String>,
}
