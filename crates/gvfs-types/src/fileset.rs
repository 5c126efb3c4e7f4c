//! Fileset metadata as served by the catalog.
//!
//! The kernel treats everything here as opaque except `storage_location`,
//! which is the URI the fileset's virtual location maps onto.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::EnumString;

/// Whether the catalog owns the fileset's storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum FilesetType {
    /// Storage lifecycle is managed by the catalog.
    #[default]
    Managed,
    /// Storage pre-exists and is only referenced.
    External,
}

impl FilesetType {
    /// Parse from string (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FilesetType::Managed => "managed",
            FilesetType::External => "external",
        }
    }
}

impl std::fmt::Display for FilesetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Who created and last touched the fileset, as reported by the catalog.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditInfo {
    pub creator: Option<String>,
    /// RFC 3339 timestamp, passed through untouched.
    pub create_time: Option<String>,
    pub last_modifier: Option<String>,
    pub last_modified_time: Option<String>,
}

/// Catalog record for one fileset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesetMetadata {
    /// Fileset name (matches the identifier's last level).
    pub name: String,
    /// Storage URI, e.g. `file:/data/fs1` or `hdfs://nn:8020/warehouse/fs1`.
    pub storage_location: String,
    #[serde(default)]
    pub fileset_type: FilesetType,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub audit: AuditInfo,
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

impl FilesetMetadata {
    /// Minimal metadata: a name and where it lives.
    pub fn new(name: impl Into<String>, storage_location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            storage_location: storage_location.into(),
            fileset_type: FilesetType::default(),
            comment: None,
            audit: AuditInfo::default(),
            properties: HashMap::new(),
        }
    }

    pub fn with_type(mut self, fileset_type: FilesetType) -> Self {
        self.fileset_type = fileset_type;
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
