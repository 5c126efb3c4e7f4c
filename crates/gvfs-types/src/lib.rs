//! Shared types for gvfs.
//!
//! A leaf crate with no internal dependencies: the catalog identifier that
//! keys everything, the fileset record the catalog hands back, and the
//! operation tags the facade attaches to each call.
//!
//! | Type                     | Purpose                                         |
//! |--------------------------|-------------------------------------------------|
//! | [`CatalogIdentifier`]    | metalake.catalog.schema.fileset                 |
//! | [`FilesetMetadata`]      | Catalog record (storage location + extras)      |
//! | [`FilesetDataOperation`] | What a caller is doing to a fileset             |

pub mod fileset;
pub mod ids;
pub mod operation;

pub use fileset::{AuditInfo, FilesetMetadata, FilesetType};
pub use ids::{CatalogIdentifier, IdentifierError};
pub use operation::FilesetDataOperation;
