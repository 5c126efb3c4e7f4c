//! Catalog identifiers.
//!
//! A [`CatalogIdentifier`] names exactly one fileset: the metalake it lives
//! in, then catalog, schema, and fileset name. The metalake comes from client
//! configuration; the other three levels are taken from a virtual path.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a [`CatalogIdentifier`] could not be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// One of the levels was empty.
    #[error("identifier level `{0}` must not be empty")]
    EmptyLevel(&'static str),

    /// One of the levels contained a `/`.
    #[error("identifier level `{level}` must not contain '/': {value}")]
    Separator { level: &'static str, value: String },
}

/// Fully-qualified fileset identifier.
///
/// Immutable once built. Equality and hashing cover all four levels, so two
/// clients configured for different metalakes never share cache entries.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "RawIdentifier")]
pub struct CatalogIdentifier {
    metalake: String,
    catalog: String,
    schema: String,
    fileset: String,
}

impl CatalogIdentifier {
    /// Build an identifier, rejecting empty levels and embedded separators.
    pub fn new(
        metalake: impl Into<String>,
        catalog: impl Into<String>,
        schema: impl Into<String>,
        fileset: impl Into<String>,
    ) -> Result<Self, IdentifierError> {
        let id = Self {
            metalake: metalake.into(),
            catalog: catalog.into(),
            schema: schema.into(),
            fileset: fileset.into(),
        };
        for (level, value) in [
            ("metalake", &id.metalake),
            ("catalog", &id.catalog),
            ("schema", &id.schema),
            ("fileset", &id.fileset),
        ] {
            if value.is_empty() {
                return Err(IdentifierError::EmptyLevel(level));
            }
            if value.contains('/') {
                return Err(IdentifierError::Separator {
                    level,
                    value: value.clone(),
                });
            }
        }
        Ok(id)
    }

    pub fn metalake(&self) -> &str {
        &self.metalake
    }

    pub fn catalog(&self) -> &str {
        &self.catalog
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// The fileset name (last level).
    pub fn name(&self) -> &str {
        &self.fileset
    }

    /// `/<catalog>/<schema>/<fileset>`, the path-shaped tail of every
    /// virtual location for this fileset.
    pub fn location_suffix(&self) -> String {
        format!("/{}/{}/{}", self.catalog, self.schema, self.fileset)
    }
}

/// Unvalidated wire form; deserialization goes through [`CatalogIdentifier::new`].
#[derive(Deserialize)]
struct RawIdentifier {
    metalake: String,
    catalog: String,
    schema: String,
    fileset: String,
}

impl TryFrom<RawIdentifier> for CatalogIdentifier {
    type Error = IdentifierError;

    fn try_from(raw: RawIdentifier) -> Result<Self, Self::Error> {
        Self::new(raw.metalake, raw.catalog, raw.schema, raw.fileset)
    }
}

impl fmt::Display for CatalogIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.metalake, self.catalog, self.schema, self.fileset
        )
    }
}

impl fmt::Debug for CatalogIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CatalogIdentifier({})", self)
    }
}

// ============================================================================
// Tests
// ============================================================================
