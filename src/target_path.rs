use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// A watch target in canonical form.
///
/// Every path that enters the crate (added targets, dependency entries, query
/// arguments, resolver output) goes through [`TargetPath::parse`], so two
/// spellings of the same location always compare equal:
///
/// - `\` separators become `/`
/// - empty and `.` segments are dropped, `..` collapses lexically
/// - trailing slashes are removed
/// - relative paths carry a `./` prefix unless they climb out with `../`
/// - absolute paths (`/x`, `C:/x`) stay absolute
///
/// The project root itself is `./`, and its parent is `../`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TargetPath(String);

impl TargetPath {
    /// Canonicalize `raw`. Returns `None` for empty input.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.is_empty() {
            return None;
        }

        let unified = raw.replace('\\', "/");
        let (prefix, rest) = split_absolute_prefix(&unified);
        let absolute = prefix.is_some();

        let mut segments: Vec<&str> = Vec::new();
        for segment in rest.split('/') {
            match segment {
                "" | "." => {}
                ".." => match segments.last() {
                    Some(&last) if last != ".." => {
                        segments.pop();
                    }
                    // `/..` is still `/`
                    _ if absolute => {}
                    _ => segments.push(".."),
                },
                other => segments.push(other),
            }
        }

        let body = segments.join("/");
        let canonical = match prefix {
            Some(root) => format!("{root}{body}"),
            None if body.is_empty() => "./".to_owned(),
            None if body == ".." => "../".to_owned(),
            None if body.starts_with("../") => body,
            None => format!("./{body}"),
        };

        Some(Self(canonical))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_absolute(&self) -> bool {
        split_absolute_prefix(&self.0).0.is_some()
    }

    /// The `<dir>/**` glob matching everything below this path.
    pub fn to_recursive_glob(&self) -> Self {
        let base = self.0.trim_end_matches('/');
        let base = if base.is_empty() { "." } else { base };
        Self(format!("{base}/**"))
    }

    /// Map the canonical path back onto the filesystem, relative to `root`.
    pub fn to_fs_path(&self, root: &Path) -> PathBuf {
        if self.is_absolute() {
            return PathBuf::from(&self.0);
        }
        match self.0.strip_prefix("./") {
            Some("") => root.to_path_buf(),
            Some(rest) => root.join(rest),
            None => root.join(&self.0),
        }
    }

    /// Canonical target for `path` relative to `root`, or `None` when `path`
    /// does not live under `root`.
    pub fn from_fs_path(root: &Path, path: &Path) -> Option<Self> {
        relative_str(root, path).and_then(|rel| Self::parse(&rel))
    }
}

impl fmt::Display for TargetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TargetPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Split a leading `/` or Windows drive (`C:/`) off `path`.
fn split_absolute_prefix(path: &str) -> (Option<&str>, &str) {
    if let Some(rest) = path.strip_prefix('/') {
        return (Some(&path[..1]), rest);
    }
    let bytes = path.as_bytes();
    if bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && bytes[2] == b'/'
    {
        return (Some(&path[..3]), &path[3..]);
    }
    (None, path)
}

/// `path` relative to `root` with forward slashes.
///
/// Falls back to comparing canonicalized paths when the plain prefix check
/// fails (symlinked temp dirs, `/private/var` on macOS).
fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(rel.to_string_lossy().replace('\\', "/"));
    }

    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize())
        && let Ok(rel) = path_canon.strip_prefix(&root_canon)
    {
        return Some(rel.to_string_lossy().replace('\\', "/"));
    }

    None
}
