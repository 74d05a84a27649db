//! Shared test utilities for the extension manager workspace.
//!
//! This crate is a dev-dependency only and is never published.
//!
//! # Modules
//!
//! - [`dir`]: [`TestExtensionsDir`](dir::TestExtensionsDir), a temporary
//!   installation root with manifest writers
//! - [`fake`]: scripted extensions, a loader for them, and a shared call log
//! - [`sink`]: an event sink that records everything it receives
//! - [`store`]: an enabled-set store whose writes can be made to fail

pub mod dir;
pub mod fake;
pub mod sink;
pub mod store;

use ext_manager::RawManifest;

/// A valid raw manifest for `id` with the given dependencies.
///
/// The entry point equals the id, which is what [`fake::FakeLoader`] keys on.
pub fn manifest(id: &str, dependencies: &[&str]) -> RawManifest {
    RawManifest {
        id: Some(id.to_string()),
        name: Some(format!("{id} extension")),
        version: Some("1.0.0".to_string()),
        min_host_version: Some("1.0".to_string()),
        entry_point: Some(id.to_string()),
        dependencies: Some(dependencies.iter().map(|d| d.to_string()).collect()),
        description: Some(format!("Test extension {id}")),
        author: None,
    }
}

/// Like [`manifest`] but requiring `min_host_version`.
pub fn manifest_requiring(id: &str, min_host_version: &str) -> RawManifest {
    RawManifest {
        min_host_version: Some(min_host_version.to_string()),
        ..manifest(id, &[])
    }
}
