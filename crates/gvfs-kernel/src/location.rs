//! Helpers for storage-location URIs.
//!
//! Actual paths are URIs (`file:/data/a`, `hdfs://nn:8020/data/a`), but the
//! prefix arithmetic in the translator works on the path component only.
//! Nothing here percent-decodes: paths are compared byte-for-byte.

use url::Url;

/// URI scheme of `location`, lowercased, or `None` for bare paths.
pub fn scheme(location: &str) -> Option<String> {
    // Bare absolute paths never carry a scheme; skip the parser for them.
    if location.starts_with('/') {
        return None;
    }
    Url::parse(location)
        .ok()
        .map(|url| url.scheme().to_ascii_lowercase())
}

/// Strip `scheme:` and any `//authority` from `location`.
///
/// `file:/a/b`, `file:///a/b` and `hdfs://nn:8020/a/b` all become `/a/b`.
/// Bare paths come back unchanged.
pub fn strip_scheme(location: &str) -> &str {
    let Some(colon) = scheme_len(location) else {
        return location;
    };
    let rest = &location[colon + 1..];
    match rest.strip_prefix("//") {
        Some(after_slashes) => match after_slashes.find('/') {
            Some(idx) => &after_slashes[idx..],
            None => "/",
        },
        None => rest,
    }
}

/// Everything before the path component: `hdfs://nn:8020`, `file:`, or ``.
pub fn origin(location: &str) -> &str {
    let path = strip_scheme(location);
    &location[..location.len() - path.len()]
}

/// Drop trailing slashes, keeping a lone `/`.
pub fn trim_trailing_slash(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() && path.starts_with('/') {
        "/"
    } else {
        trimmed
    }
}

/// True if `path` is `prefix` or lies below it, comparing whole components.
pub fn is_under(path: &str, prefix: &str) -> bool {
    if prefix == "/" {
        return path.starts_with('/');
    }
    match path.strip_prefix(prefix) {
        Some("") => true,
        Some(rest) => rest.starts_with('/'),
        None => false,
    }
}

/// Byte length of the scheme (index of its `:`), validated per RFC 3986.
fn scheme_len(location: &str) -> Option<usize> {
    let colon = location.find(':')?;
    let candidate = &location[..colon];
    let mut chars = candidate.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    if chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        Some(colon)
    } else {
        None
    }
}
