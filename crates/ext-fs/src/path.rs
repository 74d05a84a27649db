//! Slash-normalized paths

use std::path::{Path, PathBuf};

/// A path stored with forward slashes.
///
/// Manifest locations and state files are compared and logged in this form;
/// conversion to the platform-native representation happens only at I/O
/// boundaries via [`NormalizedPath::to_native`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedPath {
    inner: String,
}

impl NormalizedPath {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            inner: path.as_ref().to_string_lossy().replace('\\', "/"),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Append one or more slash-separated segments.
    pub fn join(&self, segment: &str) -> Self {
        let segment = segment.replace('\\', "/");
        let segment = segment.trim_start_matches('/');
        if self.inner.is_empty() {
            return Self {
                inner: segment.to_string(),
            };
        }
        Self {
            inner: format!("{}/{}", self.inner.trim_end_matches('/'), segment),
        }
    }

    pub fn parent(&self) -> Option<Self> {
        let trimmed = self.inner.trim_end_matches('/');
        match trimmed.rfind('/') {
            Some(0) => Some(Self {
                inner: "/".to_string(),
            }),
            Some(idx) => Some(Self {
                inner: trimmed[..idx].to_string(),
            }),
            None => None,
        }
    }

    /// Last path component, ignoring trailing slashes.
    pub fn file_name(&self) -> Option<&str> {
        self.inner
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
    }

    /// Extension of the last component; dotfiles have none.
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name()?;
        match name.rfind('.') {
            Some(0) | None => None,
            Some(idx) => Some(&name[idx + 1..]),
        }
    }

    pub fn exists(&self) -> bool {
        self.to_native().exists()
    }

    pub fn is_dir(&self) -> bool {
        self.to_native().is_dir()
    }

    pub fn is_file(&self) -> bool {
        self.to_native().is_file()
    }
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.inner)
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
