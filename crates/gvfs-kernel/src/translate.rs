//! Virtual ↔ actual path translation.
//!
//! A fileset's virtual location (`fileset/cat1/sch1/fs1`) maps onto its
//! storage location (`file:/data/fs1`) by prefix substitution. The reverse
//! direction compares scheme-stripped paths, so a backend that reports
//! `/data/fs1/a` or `file:///data/fs1/a` still maps back.

use gvfs_types::CatalogIdentifier;

use crate::cache::{CacheEntry, MountKind};
use crate::error::{GvfsError, GvfsResult};
use crate::identifier::{PathStyle, VirtualPath, virtual_location};
use crate::location;

/// Translator bound to one fileset.
#[derive(Debug, Clone, Copy)]
pub struct PathTranslator<'a> {
    identifier: &'a CatalogIdentifier,
    storage_location: &'a str,
    mount_kind: MountKind,
}

impl<'a> PathTranslator<'a> {
    pub fn new(
        identifier: &'a CatalogIdentifier,
        storage_location: &'a str,
        mount_kind: MountKind,
    ) -> Self {
        Self {
            identifier,
            storage_location,
            mount_kind,
        }
    }

    pub fn for_entry(entry: &'a CacheEntry) -> Self {
        Self::new(
            entry.identifier(),
            entry.storage_location(),
            entry.mount_kind(),
        )
    }

    /// Rewrite a virtual path into the backend path it names.
    ///
    /// On a single-file mount only the fileset root is valid; anything below
    /// it is [`GvfsError::AmbiguousPath`]. The result is checked to map back
    /// onto `vpath` before it is returned.
    pub fn virtual_to_actual(&self, vpath: &VirtualPath) -> GvfsResult<String> {
        let origin = location::origin(self.storage_location);
        let base = location::trim_trailing_slash(location::strip_scheme(self.storage_location));
        let virtual_path = vpath.to_string();

        let actual = match self.mount_kind {
            MountKind::File if !vpath.is_root() => {
                return Err(GvfsError::AmbiguousPath {
                    path: virtual_path,
                    expected: vpath.location(),
                });
            }
            _ if vpath.is_root() => format!("{origin}{base}"),
            _ if base == "/" => format!("{origin}/{}", vpath.sub_path()),
            _ => format!("{origin}{base}/{}", vpath.sub_path()),
        };

        let back = self.actual_to_virtual(&actual, vpath.style())?;
        if back != virtual_path {
            return Err(GvfsError::PrefixMismatch {
                actual,
                storage_location: self.storage_location.to_string(),
            });
        }
        Ok(actual)
    }

    /// Map a backend path back into a virtual path rendered in `style`.
    ///
    /// Fails with [`GvfsError::PrefixMismatch`] when `actual` is not the
    /// storage location or a path below it.
    pub fn actual_to_virtual(&self, actual: &str, style: PathStyle) -> GvfsResult<String> {
        let storage = location::trim_trailing_slash(location::strip_scheme(self.storage_location));
        let path = location::trim_trailing_slash(location::strip_scheme(actual));

        if !location::is_under(path, storage) {
            return Err(GvfsError::PrefixMismatch {
                actual: actual.to_string(),
                storage_location: self.storage_location.to_string(),
            });
        }

        let rest = match storage {
            "/" if path == "/" => "",
            "/" => path,
            _ => &path[storage.len()..],
        };
        Ok(format!(
            "{}{rest}",
            virtual_location(self.identifier, style)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::parse;

    fn id(name: &str) -> CatalogIdentifier {
        CatalogIdentifier::new("lake", "cat1", "sch1", name).unwrap()
    }

    #[test]
    fn test_directory_mount_example() {
        let id = id("fs1");
        let t = PathTranslator::new(&id, "file:/data/fs1", MountKind::Directory);

        let vp = parse("fileset/cat1/sch1/fs1/a/b.txt", "lake").unwrap();
        let actual = t.virtual_to_actual(&vp).unwrap();
        assert_eq!(actual, "file:/data/fs1/a/b.txt");

        let back = t.actual_to_virtual(&actual, PathStyle::Bare).unwrap();
        assert_eq!(back, "fileset/cat1/sch1/fs1/a/b.txt");
    }

    #[test]
    fn test_round_trip_all_styles() {
        let id = id("fs1");
        let t = PathTranslator::new(&id, "hdfs://nn:8020/warehouse/fs1/", MountKind::Directory);

        for path in [
            "gvfs://fileset/cat1/sch1/fs1/x/y.parquet",
            "fileset/cat1/sch1/fs1/x/y.parquet",
            "/cat1/sch1/fs1/x/y.parquet",
            "/cat1/sch1/fs1",
        ] {
            let vp = parse(path, "lake").unwrap();
            let actual = t.virtual_to_actual(&vp).unwrap();
            assert!(actual.starts_with("hdfs://nn:8020/warehouse/fs1"));
            assert_eq!(t.actual_to_virtual(&actual, vp.style()).unwrap(), path);
        }
    }

    #[test]
    fn test_reverse_ignores_scheme_spelling() {
        let id = CatalogIdentifier::new("lake", "test_catalog", "test_schema", "test_f1").unwrap();
        let t = PathTranslator::new(&id, "file:/tmp/fileset/test_f1", MountKind::Directory);

        for actual in [
            "/tmp/fileset/test_f1/actual_path",
            "file:/tmp/fileset/test_f1/actual_path",
            "file:///tmp/fileset/test_f1/actual_path",
        ] {
            assert_eq!(
                t.actual_to_virtual(actual, PathStyle::Bare).unwrap(),
                "fileset/test_catalog/test_schema/test_f1/actual_path"
            );
        }
    }

    #[test]
    fn test_prefix_mismatch() {
        let id = id("root");
        let t = PathTranslator::new(&id, "file:/fileset/root", MountKind::Directory);

        let err = t
            .actual_to_virtual("/unrelated/path", PathStyle::Bare)
            .unwrap_err();
        assert!(matches!(err, GvfsError::PrefixMismatch { .. }));

        // Sibling with a shared string prefix is not inside.
        let err = t
            .actual_to_virtual("file:/fileset/root2/a", PathStyle::Bare)
            .unwrap_err();
        assert!(matches!(err, GvfsError::PrefixMismatch { .. }));
    }

    #[test]
    fn test_single_file_mount() {
        let id = id("one");
        let t = PathTranslator::new(&id, "file:/data/one.csv", MountKind::File);

        let root = parse("fileset/cat1/sch1/one", "lake").unwrap();
        assert_eq!(t.virtual_to_actual(&root).unwrap(), "file:/data/one.csv");
        assert_eq!(
            t.actual_to_virtual("file:/data/one.csv", PathStyle::Bare).unwrap(),
            "fileset/cat1/sch1/one"
        );

        let below = parse("fileset/cat1/sch1/one/extra", "lake").unwrap();
        let err = t.virtual_to_actual(&below).unwrap_err();
        match err {
            GvfsError::AmbiguousPath { path, expected } => {
                assert_eq!(path, "fileset/cat1/sch1/one/extra");
                assert_eq!(expected, "fileset/cat1/sch1/one");
            }
            other => panic!("expected AmbiguousPath, got {other:?}"),
        }
    }

    #[test]
    fn test_root_storage_location() {
        let id = id("all");
        let t = PathTranslator::new(&id, "memory:/", MountKind::Directory);

        let vp = parse("/cat1/sch1/all/a", "lake").unwrap();
        assert_eq!(t.virtual_to_actual(&vp).unwrap(), "memory:/a");
        assert_eq!(
            t.actual_to_virtual("memory:/", PathStyle::Absolute).unwrap(),
            "/cat1/sch1/all"
        );
    }
}
