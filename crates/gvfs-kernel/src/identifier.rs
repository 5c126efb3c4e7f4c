//! Virtual path parsing.
//!
//! A virtual path names a fileset and a location inside it:
//!
//! ```text
//! gvfs://fileset/<catalog>/<schema>/<fileset>[/<sub-path>]   (Scheme)
//! fileset/<catalog>/<schema>/<fileset>[/<sub-path>]          (Bare)
//! /<catalog>/<schema>/<fileset>[/<sub-path>]                 (Absolute)
//! ```
//!
//! The style a caller used is kept on the parsed [`VirtualPath`] so paths
//! handed back (listings, info) come out in the same form.

use std::fmt;

use gvfs_types::CatalogIdentifier;

use crate::error::{GvfsError, GvfsResult};

const SCHEME_PREFIX: &str = "gvfs://fileset";
const BARE_PREFIX: &str = "fileset";

/// How a virtual path was spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathStyle {
    /// `gvfs://fileset/...`
    Scheme,
    /// `fileset/...`
    Bare,
    /// `/...`
    Absolute,
}

impl PathStyle {
    /// The text that precedes `/<catalog>` in this style.
    fn prefix(self) -> &'static str {
        match self {
            PathStyle::Scheme => SCHEME_PREFIX,
            PathStyle::Bare => BARE_PREFIX,
            PathStyle::Absolute => "",
        }
    }
}

/// A parsed virtual path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualPath {
    identifier: CatalogIdentifier,
    style: PathStyle,
    sub_path: String,
}

impl VirtualPath {
    pub fn identifier(&self) -> &CatalogIdentifier {
        &self.identifier
    }

    pub fn style(&self) -> PathStyle {
        self.style
    }

    /// Path below the fileset root, without leading or trailing `/`.
    /// Empty for the root itself.
    pub fn sub_path(&self) -> &str {
        &self.sub_path
    }

    /// True if this path is the fileset root.
    pub fn is_root(&self) -> bool {
        self.sub_path.is_empty()
    }

    /// The fileset root in this path's style.
    pub fn location(&self) -> String {
        virtual_location(&self.identifier, self.style)
    }
}

/// Canonical rendering: fileset root plus sub-path, no trailing slash.
impl fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.location())?;
        if !self.sub_path.is_empty() {
            write!(f, "/{}", self.sub_path)?;
        }
        Ok(())
    }
}

/// Render the root of fileset `id` in `style`.
///
/// `virtual_location(cat1.sch1.fs1, Bare)` is `fileset/cat1/sch1/fs1`.
pub fn virtual_location(id: &CatalogIdentifier, style: PathStyle) -> String {
    format!("{}{}", style.prefix(), id.location_suffix())
}

/// Parse `path` into a [`VirtualPath`] under `metalake`.
///
/// Fails with [`GvfsError::InvalidPath`] on empty input, on fewer than three
/// identifier segments, on a scheme other than `gvfs://fileset`, on empty
/// segments, and on `.` or `..` segments.
pub fn parse(path: &str, metalake: &str) -> GvfsResult<VirtualPath> {
    if path.is_empty() {
        return Err(GvfsError::invalid_path(path, "path is empty"));
    }

    let (style, rest) = split_style(path)?;
    let rest = rest.trim_end_matches('/');
    if rest.is_empty() {
        return Err(GvfsError::invalid_path(
            path,
            "expected <catalog>/<schema>/<fileset>",
        ));
    }

    let segments: Vec<&str> = rest.split('/').collect();
    for segment in &segments {
        match *segment {
            "" => return Err(GvfsError::invalid_path(path, "empty path segment")),
            "." | ".." => {
                return Err(GvfsError::invalid_path(
                    path,
                    "relative segments are not allowed",
                ));
            }
            _ => {}
        }
    }
    if segments.len() < 3 {
        return Err(GvfsError::invalid_path(
            path,
            "expected <catalog>/<schema>/<fileset>",
        ));
    }

    let identifier = CatalogIdentifier::new(metalake, segments[0], segments[1], segments[2])
        .map_err(|e| GvfsError::invalid_path(path, e.to_string()))?;

    Ok(VirtualPath {
        identifier,
        style,
        sub_path: segments[3..].join("/"),
    })
}

/// Classify the style and return what follows the style prefix's `/`.
fn split_style(path: &str) -> GvfsResult<(PathStyle, &str)> {
    if let Some(rest) = path.strip_prefix("gvfs://") {
        return match rest.strip_prefix(BARE_PREFIX) {
            Some(after) if after.is_empty() || after.starts_with('/') => {
                Ok((PathStyle::Scheme, after.trim_start_matches('/')))
            }
            _ => Err(GvfsError::invalid_path(
                path,
                "gvfs paths must start with gvfs://fileset/",
            )),
        };
    }
    if path.contains("://") {
        return Err(GvfsError::invalid_path(
            path,
            "only gvfs://fileset paths are supported",
        ));
    }
    if let Some(rest) = path.strip_prefix('/') {
        return Ok((PathStyle::Absolute, rest));
    }
    match path.strip_prefix(BARE_PREFIX) {
        Some(after) if after.starts_with('/') => Ok((PathStyle::Bare, &after[1..])),
        _ => Err(GvfsError::invalid_path(
            path,
            "expected gvfs://fileset/, fileset/ or / prefix",
        )),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(path: &str) -> VirtualPath {
        parse(path, "lake").unwrap()
    }

    fn rejects(path: &str) {
        let err = parse(path, "lake").unwrap_err();
        assert!(
            matches!(err, GvfsError::InvalidPath { .. }),
            "expected InvalidPath for {path:?}, got {err:?}"
        );
    }

    #[test]
    fn test_three_styles() {
        let scheme = ok("gvfs://fileset/cat1/sch1/fs1/a/b.txt");
        let bare = ok("fileset/cat1/sch1/fs1/a/b.txt");
        let absolute = ok("/cat1/sch1/fs1/a/b.txt");

        for vp in [&scheme, &bare, &absolute] {
            assert_eq!(vp.identifier().to_string(), "lake.cat1.sch1.fs1");
            assert_eq!(vp.sub_path(), "a/b.txt");
        }
        assert_eq!(scheme.style(), PathStyle::Scheme);
        assert_eq!(bare.style(), PathStyle::Bare);
        assert_eq!(absolute.style(), PathStyle::Absolute);
    }

    #[test]
    fn test_root_and_trailing_slash() {
        let vp = ok("fileset/cat1/sch1/fs1/");
        assert!(vp.is_root());
        assert_eq!(vp.to_string(), "fileset/cat1/sch1/fs1");
        assert_eq!(ok("gvfs://fileset/c/s/f").location(), "gvfs://fileset/c/s/f");
        assert_eq!(ok("/c/s/f/x/").to_string(), "/c/s/f/x");
    }

    #[test]
    fn test_rejections() {
        rejects("");
        rejects("gvfs://fileset/");
        rejects("gvfs://fileset/cat/sch");
        rejects("fileset/cat/sch");
        rejects("/cat");
        rejects("s3://bucket/cat/sch/fs");
        rejects("gvfs://other/cat/sch/fs");
        rejects("gvfs://filesetx/cat/sch/fs");
        rejects("fileset/cat//fs/a");
        rejects("fileset/cat/sch/fs//a");
        rejects("fileset/cat/sch/fs/../other");
        rejects("fileset/cat/sch/fs/./a");
        rejects("cat/sch/fs");
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(ok("fileset/a/b/c/d"), ok("fileset/a/b/c/d"));
    }

    #[test]
    fn test_metalake_from_caller() {
        let vp = parse("/c/s/f", "other_lake").unwrap();
        assert_eq!(vp.identifier().metalake(), "other_lake");
    }

    #[test]
    fn test_virtual_location() {
        let id = CatalogIdentifier::new("lake", "c", "s", "f").unwrap();
        assert_eq!(virtual_location(&id, PathStyle::Scheme), "gvfs://fileset/c/s/f");
        assert_eq!(virtual_location(&id, PathStyle::Bare), "fileset/c/s/f");
        assert_eq!(virtual_location(&id, PathStyle::Absolute), "/c/s/f");
    }
}
