//! Discovery of installed extensions.
//!
//! A [`ManifestSource`] enumerates installed extension ids and reads their
//! raw manifests; the [`DiscoveryScanner`] validates each one and drops
//! anything malformed or too new for the running host.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use ext_fs::{ConfigStore, NormalizedPath, io};

use crate::MANIFEST_FILENAME;
use crate::error::{Error, Result};
use crate::manifest::{Manifest, RawManifest};
use crate::version::DottedVersion;

/// Validated manifests keyed by extension id.
pub type DiscoveredSet = BTreeMap<String, Manifest>;

/// Access to installed extensions and their manifests.
#[async_trait]
pub trait ManifestSource: Send + Sync {
    /// Ids of all installed extensions.
    async fn list_installed_ids(&self) -> Result<Vec<String>>;

    /// The raw manifest for `id`, or `None` if the extension has none.
    async fn read_manifest(&self, id: &str) -> Result<Option<RawManifest>>;
}

/// Manifest source backed by an installation directory.
///
/// Every sub-directory of `root` is one installed extension whose id is the
/// directory name; its manifest lives at `<root>/<id>/<manifest_filename>`.
/// The manifest format follows the file extension (TOML or JSON).
#[derive(Debug, Clone)]
pub struct DirectoryManifestSource {
    root: NormalizedPath,
    manifest_filename: String,
    store: ConfigStore,
}

impl DirectoryManifestSource {
    pub fn new(root: impl Into<NormalizedPath>) -> Self {
        Self {
            root: root.into(),
            manifest_filename: MANIFEST_FILENAME.to_string(),
            store: ConfigStore::new(),
        }
    }

    /// Use a different manifest file name, e.g. `manifest.json`.
    pub fn with_manifest_filename(mut self, filename: impl Into<String>) -> Self {
        self.manifest_filename = filename.into();
        self
    }

    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    pub fn manifest_path(&self, id: &str) -> NormalizedPath {
        self.root.join(id).join(&self.manifest_filename)
    }
}

#[async_trait]
impl ManifestSource for DirectoryManifestSource {
    async fn list_installed_ids(&self) -> Result<Vec<String>> {
        Ok(io::list_subdirectories(&self.root)?)
    }

    async fn read_manifest(&self, id: &str) -> Result<Option<RawManifest>> {
        Ok(self.store.load_optional(&self.manifest_path(id))?)
    }
}

/// Produces the [`DiscoveredSet`] for one host version.
#[derive(Clone)]
pub struct DiscoveryScanner {
    source: Arc<dyn ManifestSource>,
    host_version: DottedVersion,
}

impl DiscoveryScanner {
    pub fn new(source: Arc<dyn ManifestSource>, host_version: DottedVersion) -> Self {
        Self {
            source,
            host_version,
        }
    }

    pub fn host_version(&self) -> &DottedVersion {
        &self.host_version
    }

    /// Scan all installed extensions.
    ///
    /// Entries that cannot be read, fail validation, or require a newer host
    /// are logged and skipped. Only a failure to enumerate the installed ids
    /// is returned as an error.
    pub async fn discover(&self) -> Result<DiscoveredSet> {
        let ids = self.source.list_installed_ids().await?;
        let mut discovered = DiscoveredSet::new();

        for id in ids {
            match self.scan_one(&id).await {
                Ok(manifest) => {
                    tracing::debug!(extension = %id, version = manifest.version(), "discovered extension");
                    discovered.insert(id, manifest);
                }
                Err(err) => {
                    tracing::warn!(extension = %id, "Skipping extension: {}", err);
                }
            }
        }

        tracing::info!(count = discovered.len(), "extension discovery complete");
        Ok(discovered)
    }

    async fn scan_one(&self, id: &str) -> Result<Manifest> {
        let raw = self
            .source
            .read_manifest(id)
            .await?
            .ok_or_else(|| Error::MissingManifest { id: id.to_string() })?;

        let manifest = Manifest::from_raw(raw)?;
        if manifest.id() != id {
            return Err(Error::IdMismatch {
                expected: id.to_string(),
                found: manifest.id().to_string(),
            });
        }

        if !manifest.is_compatible_with(&self.host_version) {
            return Err(Error::IncompatibleHost {
                id: id.to_string(),
                required: manifest.min_host_version().to_string(),
                host: self.host_version.to_string(),
            });
        }

        Ok(manifest)
    }
}
