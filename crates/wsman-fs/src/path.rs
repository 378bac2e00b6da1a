//! Normalized path handling for cross-platform compatibility

use std::path::{Path, PathBuf};

/// A path normalized to use forward slashes internally.
///
/// Package set URLs and checkout directories are compared as strings, so
/// every path that takes part in an identity (an overrides key, a checkout
/// name) goes through this type first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedPath {
    /// Internal representation always uses forward slashes
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    ///
    /// Converts backslashes to forward slashes for internal storage.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path_str = path.as_ref().to_string_lossy();
        Self {
            inner: path_str.replace('\\', "/"),
        }
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Join this path with a segment.
    ///
    /// An absolute segment replaces the path entirely.
    pub fn join(&self, segment: &str) -> Self {
        let segment = segment.replace('\\', "/");
        if is_absolute_str(&segment) {
            return Self { inner: segment };
        }
        if segment.is_empty() {
            return self.clone();
        }
        let joined = if self.inner.ends_with('/') || self.inner.is_empty() {
            format!("{}{}", self.inner, segment)
        } else {
            format!("{}/{}", self.inner, segment)
        };
        Self { inner: joined }
    }

    /// Whether the path is absolute (`/...` or a drive letter).
    pub fn is_absolute(&self) -> bool {
        is_absolute_str(&self.inner)
    }

    /// Lexically resolve `.` and `..` components and collapse repeated slashes.
    ///
    /// `..` never climbs above the root of an absolute path.
    pub fn clean(&self) -> Self {
        let absolute = self.inner.starts_with('/');
        let mut parts: Vec<&str> = Vec::new();
        for component in self.inner.split('/') {
            match component {
                "" | "." => {}
                ".." => match parts.last() {
                    Some(&last) if last != ".." => {
                        parts.pop();
                    }
                    _ if absolute => {}
                    _ => parts.push(".."),
                },
                other => parts.push(other),
            }
        }
        let body = parts.join("/");
        let inner = match (absolute, body.is_empty()) {
            (true, _) => format!("/{body}"),
            (false, true) => ".".to_string(),
            (false, false) => body,
        };
        Self { inner }
    }

    /// Make this path absolute relative to `base`, then clean it.
    pub fn absolutize(&self, base: &NormalizedPath) -> Self {
        if self.is_absolute() {
            self.clean()
        } else {
            base.join(&self.inner).clean()
        }
    }

    /// Get the parent directory.
    pub fn parent(&self) -> Option<Self> {
        let trimmed = self.inner.trim_end_matches('/');
        match trimmed.rfind('/') {
            Some(idx) if idx > 0 => Some(Self {
                inner: trimmed[..idx].to_string(),
            }),
            Some(0) => Some(Self {
                inner: "/".to_string(),
            }),
            _ => None,
        }
    }

    /// Get the file name component.
    pub fn file_name(&self) -> Option<&str> {
        let trimmed = self.inner.trim_end_matches('/');
        trimmed.rsplit('/').next().filter(|name| !name.is_empty())
    }

    /// Check if this path exists on the filesystem.
    pub fn exists(&self) -> bool {
        self.to_native().exists()
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.to_native().is_dir()
    }

    /// Check if this is a file.
    pub fn is_file(&self) -> bool {
        self.to_native().is_file()
    }

    /// Get the extension if present.
    pub fn extension(&self) -> Option<&str> {
        self.file_name().and_then(|name| {
            let idx = name.rfind('.')?;
            if idx == 0 { None } else { Some(&name[idx + 1..]) }
        })
    }
}

fn is_absolute_str(path: &str) -> bool {
    if path.starts_with('/') {
        return true;
    }
    let bytes = path.as_bytes();
    bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && bytes[2] == b'/'
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NormalizedPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_resolves_dot_components() {
        let path = NormalizedPath::new("/a/./b/../c//d/");
        assert_eq!(path.clean().as_str(), "/a/c/d");
    }

    #[test]
    fn clean_keeps_leading_parent_of_relative_path() {
        let path = NormalizedPath::new("../x/../../y");
        assert_eq!(path.clean().as_str(), "../../y");
    }

    #[test]
    fn clean_does_not_climb_above_root() {
        let path = NormalizedPath::new("/../../etc");
        assert_eq!(path.clean().as_str(), "/etc");
    }

    #[test]
    fn absolutize_relative_against_base() {
        let base = NormalizedPath::new("/ws/.wsman");
        let path = NormalizedPath::new("../sets/extra");
        assert_eq!(path.absolutize(&base).as_str(), "/ws/sets/extra");
    }

    #[test]
    fn join_with_absolute_segment_replaces() {
        let base = NormalizedPath::new("/ws");
        assert_eq!(base.join("/other").as_str(), "/other");
    }
}
