//! [`TestExtensionsDir`] builder for installation-directory scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use ext_fs::NormalizedPath;
use ext_manager::{DirectoryManifestSource, MANIFEST_FILENAME, RawManifest};
use tempfile::TempDir;

/// A temporary directory holding an `extensions/` installation root and a
/// `state/` directory for the enabled-set file.
///
/// # Example
///
/// ```rust,no_run
/// use ext_test_utils::{dir::TestExtensionsDir, manifest};
///
/// let dir = TestExtensionsDir::new();
/// dir.install(&manifest("core", &[]));
/// dir.install(&manifest("ui", &["core"]));
/// let source = dir.source();
/// ```
pub struct TestExtensionsDir {
    temp_dir: TempDir,
}

impl Default for TestExtensionsDir {
    fn default() -> Self {
        Self::new()
    }
}

impl TestExtensionsDir {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("extensions")).unwrap();
        Self { temp_dir }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// The installation root scanned by [`source`](Self::source).
    pub fn extensions_root(&self) -> PathBuf {
        self.root().join("extensions")
    }

    /// Path of the enabled-set state file.
    pub fn state_file(&self) -> PathBuf {
        self.root().join("state").join("enabled.toml")
    }

    pub fn source(&self) -> DirectoryManifestSource {
        DirectoryManifestSource::new(NormalizedPath::new(self.extensions_root()))
    }

    /// Write `manifest` into a directory named after its id.
    pub fn install(&self, manifest: &RawManifest) {
        let id = manifest
            .id
            .as_deref()
            .expect("TestExtensionsDir::install: manifest needs an id");
        let content = toml::to_string(manifest).unwrap();
        self.write_manifest(id, &content);
    }

    /// Write arbitrary manifest text for `dir_name`.
    pub fn write_manifest(&self, dir_name: &str, content: &str) {
        let dir = self.extensions_root().join(dir_name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(MANIFEST_FILENAME), content).unwrap();
    }

    /// Create an extension directory without a manifest.
    pub fn install_empty(&self, dir_name: &str) {
        fs::create_dir_all(self.extensions_root().join(dir_name)).unwrap();
    }

    pub fn uninstall(&self, dir_name: &str) {
        fs::remove_dir_all(self.extensions_root().join(dir_name)).unwrap();
    }

    /// Write the enabled-set state file directly.
    pub fn write_enabled(&self, ids: &[&str]) {
        let path = self.state_file();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let quoted: Vec<String> = ids.iter().map(|id| format!("\"{id}\"")).collect();
        fs::write(path, format!("enabled = [{}]\n", quoted.join(", "))).unwrap();
    }
}
