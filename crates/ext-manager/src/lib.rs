//! Extension lifecycle and dependency resolution.
//!
//! This crate discovers installed extensions, validates their manifests
//! against the host version, orders enabled extensions so dependencies load
//! first, and starts and stops extension instances while containing
//! failures to the extension that caused them and its dependents.
//!
//! The pieces are layered leaves-first:
//!
//! - [`manifest`]: parsing and validation of one `extension.toml`
//! - [`discovery`]: scanning installed extensions into a [`DiscoveredSet`]
//! - [`dependency`]: the dependency graph and cycle-checked load order
//! - [`lifecycle`]: loading, starting, stopping and cascading disablement
//! - [`registry`]: the in-memory state the other parts read and write
//! - [`manager`]: the serialized public API

pub mod config;
pub mod dependency;
pub mod discovery;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod loader;
pub mod manager;
pub mod manifest;
pub mod persistence;
pub mod registry;
pub mod version;

/// Default manifest filename inside each extension directory.
pub const MANIFEST_FILENAME: &str = "extension.toml";

pub use config::ManagerConfig;
pub use dependency::DependencyGraph;
pub use discovery::{DirectoryManifestSource, DiscoveredSet, DiscoveryScanner, ManifestSource};
pub use error::{Error, Result};
pub use events::{ChannelSink, EventSink, ManagerEvent, NullSink};
pub use lifecycle::{LifecycleController, LoadFailure, LoadOutcome, LoadReport};
pub use loader::{Extension, ExtensionConstructor, ExtensionError, ModuleLoader, StaticLoader};
pub use manager::ExtensionManager;
pub use manifest::{Manifest, RawManifest};
pub use persistence::{EnabledStore, FileEnabledStore, MemoryEnabledStore};
pub use registry::{ExtensionRegistry, ExtensionStatus};
pub use version::DottedVersion;
