//! Extension manifest parsing for `extension.toml` files.
//!
//! Each installed extension ships a manifest describing its identity, the
//! minimum host version it runs on, the entry point handed to the module
//! loader, and the ids of the extensions it depends on.
//!
//! # Example TOML
//!
//! ```toml
//! id = "git-blame"
//! name = "Git Blame"
//! version = "0.3.1"
//! min_host_version = "1.4"
//! entry_point = "git_blame::activate"
//! dependencies = ["git-core"]
//! description = "Inline blame annotations"
//! author = "Tools Team"
//! ```
//!
//! `minHostVersion` and `entryPoint` are accepted as aliases so manifests
//! written for JSON tooling parse unchanged.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::version::DottedVersion;

/// Manifest as read from disk, before validation.
///
/// Every field is optional here; [`Manifest::from_raw`] decides whether the
/// entry is usable.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(
        default,
        alias = "minHostVersion",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_host_version: Option<String>,
    #[serde(default, alias = "entryPoint", skip_serializing_if = "Option::is_none")]
    pub entry_point: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// A validated, immutable extension manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    id: String,
    name: String,
    version: String,
    min_host_version: DottedVersion,
    entry_point: String,
    dependencies: Vec<String>,
    description: String,
    author: Option<String>,
}

impl Manifest {
    /// Validate a raw manifest.
    ///
    /// Required string fields must be present and non-blank. Dependency ids
    /// are checked like the extension id and de-duplicated keeping the first
    /// occurrence.
    pub fn from_raw(raw: RawManifest) -> Result<Self> {
        let id = required(raw.id, "id")?;
        validate_id(&id)?;

        let min_host_raw = required(raw.min_host_version, "min_host_version")?;
        let min_host_version = DottedVersion::parse(&min_host_raw)?;

        let mut dependencies: Vec<String> = Vec::new();
        for dep in raw.dependencies.unwrap_or_default() {
            let dep = dep.trim().to_string();
            validate_id(&dep)?;
            if !dependencies.contains(&dep) {
                dependencies.push(dep);
            }
        }

        Ok(Self {
            id,
            name: required(raw.name, "name")?,
            version: required(raw.version, "version")?,
            min_host_version,
            entry_point: required(raw.entry_point, "entry_point")?,
            dependencies,
            description: required(raw.description, "description")?,
            author: raw
                .author
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty()),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn min_host_version(&self) -> &DottedVersion {
        &self.min_host_version
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    /// Declared dependency ids, in manifest order.
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn depends_on(&self, id: &str) -> bool {
        self.dependencies.iter().any(|dep| dep == id)
    }

    /// Whether a host at `host` may load this extension.
    pub fn is_compatible_with(&self, host: &DottedVersion) -> bool {
        host.satisfies_minimum(&self.min_host_version)
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(Error::MissingField { field })
}

/// Ids double as installation directory names, so they are restricted to a
/// filesystem-safe character set.
pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::InvalidId {
            id: id.to_string(),
            reason: "id must not be empty".to_string(),
        });
    }
    if id.starts_with('.') {
        return Err(Error::InvalidId {
            id: id.to_string(),
            reason: "id must not start with '.'".to_string(),
        });
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(Error::InvalidId {
            id: id.to_string(),
            reason: "id must contain only alphanumeric characters, '-', '_' or '.'".to_string(),
        });
    }
    Ok(())
}
