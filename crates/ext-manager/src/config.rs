//! Manager configuration.
//!
//! ```toml
//! host_version = "1.8.0"
//! start_timeout_ms = 30000
//! stop_timeout_ms = 5000
//! strict_dependencies = false
//! cascade_on_disable = false
//! ```

use std::time::Duration;

use ext_fs::{ConfigStore, NormalizedPath};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::version::DottedVersion;

fn default_start_timeout_ms() -> u64 {
    30_000
}

fn default_stop_timeout_ms() -> u64 {
    5_000
}

/// Settings for an [`ExtensionManager`](crate::ExtensionManager).
///
/// Timeouts of `0` disable the corresponding bound.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ManagerConfig {
    /// Version of the running host, compared against `min_host_version`.
    pub host_version: String,
    /// Upper bound for a single extension's `start()`.
    #[serde(default = "default_start_timeout_ms")]
    pub start_timeout_ms: u64,
    /// Upper bound for a single extension's `stop()`.
    #[serde(default = "default_stop_timeout_ms")]
    pub stop_timeout_ms: u64,
    /// Fail an extension whose declared dependency is not enabled, instead
    /// of ignoring that dependency.
    #[serde(default)]
    pub strict_dependencies: bool,
    /// Disable enabled dependents when an extension is disabled manually.
    #[serde(default)]
    pub cascade_on_disable: bool,
}

impl ManagerConfig {
    pub fn new(host_version: impl Into<String>) -> Self {
        Self {
            host_version: host_version.into(),
            start_timeout_ms: default_start_timeout_ms(),
            stop_timeout_ms: default_stop_timeout_ms(),
            strict_dependencies: false,
            cascade_on_disable: false,
        }
    }

    /// Load and validate a TOML or JSON configuration file.
    pub fn load(path: &NormalizedPath) -> Result<Self> {
        let config: Self = ConfigStore::new().load(path)?;
        config.host()?;
        Ok(config)
    }

    pub fn with_start_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.start_timeout_ms = timeout.map_or(0, duration_ms);
        self
    }

    pub fn with_stop_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.stop_timeout_ms = timeout.map_or(0, duration_ms);
        self
    }

    pub fn with_strict_dependencies(mut self, strict: bool) -> Self {
        self.strict_dependencies = strict;
        self
    }

    pub fn with_cascade_on_disable(mut self, cascade: bool) -> Self {
        self.cascade_on_disable = cascade;
        self
    }

    /// Parsed host version.
    pub fn host(&self) -> Result<DottedVersion> {
        DottedVersion::parse(&self.host_version).map_err(|e| Error::InvalidConfig {
            reason: format!("host_version: {e}"),
        })
    }

    pub fn start_timeout(&self) -> Option<Duration> {
        (self.start_timeout_ms > 0).then(|| Duration::from_millis(self.start_timeout_ms))
    }

    pub fn stop_timeout(&self) -> Option<Duration> {
        (self.stop_timeout_ms > 0).then(|| Duration::from_millis(self.stop_timeout_ms))
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX).max(1)
}
