//! Slash-separated path helpers.
//!
//! Hierarchical backends delegate on the first segment of a path and hand
//! the remainder to a child filesystem, so [`split`] keeps the remainder
//! absolute (re-prefixed with `/`) so the child sees a normal rooted path.

/// A path broken into its first segment and the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathComponents<'a> {
    /// First non-empty segment, `None` for `""` or `/`.
    pub first: Option<&'a str>,
    /// Remaining segments joined with a leading `/`, `None` if there were none.
    pub rest: Option<String>,
}

impl<'a> PathComponents<'a> {
    /// Unpack into a `(first, rest)` tuple.
    pub fn into_parts(self) -> (Option<&'a str>, Option<String>) {
        (self.first, self.rest)
    }
}

/// Split a path into its first segment and remainder.
///
/// Empty segments are dropped, so `//a///b/` splits the same as `/a/b`.
///
/// ```
/// use tsugite_vfs::path::split;
///
/// let parts = split("/a/b/c");
/// assert_eq!(parts.first, Some("a"));
/// assert_eq!(parts.rest.as_deref(), Some("/b/c"));
/// ```
pub fn split(path: &str) -> PathComponents<'_> {
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    let first = segments.next();
    let remaining: Vec<&str> = segments.collect();
    let rest = if remaining.is_empty() {
        None
    } else {
        Some(format!("/{}", remaining.join("/")))
    };
    PathComponents { first, rest }
}

/// All non-empty segments of a path, in order.
pub fn scan(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Parent directory (normalized, absolute) and final segment.
///
/// The root has no name: `parent_and_name("/")` is `("/", None)`.
pub fn parent_and_name(path: &str) -> (String, Option<&str>) {
    let mut segments = scan(path);
    match segments.pop() {
        Some(name) => (format!("/{}", segments.join("/")), Some(name)),
        None => ("/".to_string(), None),
    }
}

/// Append `name` to `dir` with exactly one separator between them.
pub fn join(dir: &str, name: &str) -> String {
    let dir = dir.trim_end_matches('/');
    let name = name.trim_start_matches('/');
    format!("{dir}/{name}")
}

/// Normalize to an absolute path with no empty segments.
pub fn normalize(path: &str) -> String {
    format!("/{}", scan(path).join("/"))
}
