//! Extension contract and module loading.
//!
//! Turning an entry point into running code is host-specific, so the
//! manager only sees a [`ModuleLoader`]. [`StaticLoader`] covers the common
//! case of extensions compiled into the host binary.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

/// Error type returned by extensions and loaders.
pub type ExtensionError = Box<dyn std::error::Error + Send + Sync>;

/// A running extension instance.
#[async_trait]
pub trait Extension: Send {
    /// Bring the extension up. The instance is already registered as active
    /// while this runs.
    async fn start(&mut self) -> Result<(), ExtensionError>;

    /// Tear the extension down.
    async fn stop(&mut self) -> Result<(), ExtensionError> {
        Ok(())
    }
}

/// Produces one extension instance. Called at most once per load attempt.
pub type ExtensionConstructor =
    Box<dyn FnOnce() -> Result<Box<dyn Extension>, ExtensionError> + Send>;

/// Resolves a manifest entry point to an extension constructor.
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    async fn resolve_entry(
        &self,
        id: &str,
        entry_point: &str,
    ) -> Result<ExtensionConstructor, ExtensionError>;
}

type Factory = Arc<dyn Fn() -> Result<Box<dyn Extension>, ExtensionError> + Send + Sync>;

/// Loader for extensions linked into the host, keyed by entry point.
#[derive(Default, Clone)]
pub struct StaticLoader {
    factories: HashMap<String, Factory>,
}

impl StaticLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for `entry_point`, replacing any previous one.
    pub fn register<F>(&mut self, entry_point: impl Into<String>, factory: F)
    where
        F: Fn() -> Result<Box<dyn Extension>, ExtensionError> + Send + Sync + 'static,
    {
        self.factories.insert(entry_point.into(), Arc::new(factory));
    }

    /// Builder-style [`register`](Self::register).
    pub fn with<F>(mut self, entry_point: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Result<Box<dyn Extension>, ExtensionError> + Send + Sync + 'static,
    {
        self.register(entry_point, factory);
        self
    }

    pub fn contains(&self, entry_point: &str) -> bool {
        self.factories.contains_key(entry_point)
    }
}

impl std::fmt::Debug for StaticLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut entries: Vec<&String> = self.factories.keys().collect();
        entries.sort();
        f.debug_struct("StaticLoader")
            .field("entry_points", &entries)
            .finish()
    }
}

#[async_trait]
impl ModuleLoader for StaticLoader {
    async fn resolve_entry(
        &self,
        id: &str,
        entry_point: &str,
    ) -> Result<ExtensionConstructor, ExtensionError> {
        let factory = self
            .factories
            .get(entry_point)
            .cloned()
            .ok_or_else(|| format!("no extension linked for entry point '{entry_point}' ({id})"))?;
        Ok(Box::new(move || factory()))
    }
}
