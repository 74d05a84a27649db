//! Loading, starting, stopping and disabling extensions.
//!
//! The [`LifecycleController`] is the only writer of active instances and
//! failure records. All operations take the registry by `&mut`, so the
//! caller decides how access is serialized.

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use crate::config::ManagerConfig;
use crate::error::Result;
use crate::events::{EventSink, ManagerEvent};
use crate::loader::{Extension, ModuleLoader};
use crate::manifest::Manifest;
use crate::persistence::EnabledStore;
use crate::registry::ExtensionRegistry;

/// Why a single extension failed to load.
///
/// The `Display` text is what ends up in the failure record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadFailure {
    #[error("dependency '{dependency}' is not ready")]
    DependencyNotReady { dependency: String },

    #[error("dependency '{dependency}' is not enabled")]
    DependencyNotEnabled { dependency: String },

    #[error("failed to resolve entry point '{entry_point}': {message}")]
    Resolve { entry_point: String, message: String },

    #[error("failed to construct extension: {message}")]
    Construct { message: String },

    #[error("start failed: {message}")]
    Start { message: String },

    #[error("start timed out after {0:?}")]
    StartTimeout(Duration),
}

/// Result of trying to bring a single extension up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Started and registered as active.
    Loaded,
    /// Already active; nothing to do.
    AlreadyActive,
    /// Enabled, but the initial batch load has not happened yet.
    Deferred,
    /// Enabled, but no valid compatible manifest is installed.
    NotDiscovered,
    /// Part of a dependency cycle rejected earlier this session.
    CycleRejected,
    /// The attempt failed; the failure is recorded in the registry.
    Failed(LoadFailure),
}

/// Summary of a batch load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Ids started during this batch, in order.
    pub loaded: Vec<String>,
    /// Ids whose load attempt failed.
    pub failed: Vec<String>,
    /// Ids in the order that were no longer enabled when reached.
    pub skipped: Vec<String>,
    /// Set when ordering found a cycle and the batch was rejected.
    pub cycle: Option<Vec<String>>,
}

/// Drives extension instances through their lifecycle.
#[derive(Clone)]
pub struct LifecycleController {
    loader: Arc<dyn ModuleLoader>,
    store: Arc<dyn EnabledStore>,
    events: Arc<dyn EventSink>,
    start_timeout: Option<Duration>,
    stop_timeout: Option<Duration>,
    strict_dependencies: bool,
    cascade_on_disable: bool,
}

impl LifecycleController {
    pub fn new(
        config: &ManagerConfig,
        loader: Arc<dyn ModuleLoader>,
        store: Arc<dyn EnabledStore>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            loader,
            store,
            events,
            start_timeout: config.start_timeout(),
            stop_timeout: config.stop_timeout(),
            strict_dependencies: config.strict_dependencies,
            cascade_on_disable: config.cascade_on_disable,
        }
    }

    /// Load every id in `order`, one at a time.
    ///
    /// A failure is recorded and cascaded, then the batch moves on. Ids that
    /// were disabled earlier in the same batch are skipped.
    pub async fn load_enabled(&self, registry: &mut ExtensionRegistry, order: &[String]) -> LoadReport {
        let mut report = LoadReport::default();

        for id in order {
            if !registry.is_enabled(id) {
                tracing::debug!(extension = %id, "no longer enabled; skipping");
                report.skipped.push(id.clone());
                continue;
            }
            match self.load_one(registry, id).await {
                LoadOutcome::Loaded => report.loaded.push(id.clone()),
                LoadOutcome::Failed(_) => report.failed.push(id.clone()),
                LoadOutcome::NotDiscovered => report.skipped.push(id.clone()),
                LoadOutcome::AlreadyActive | LoadOutcome::Deferred | LoadOutcome::CycleRejected => {}
            }
        }

        tracing::info!(
            loaded = report.loaded.len(),
            failed = report.failed.len(),
            skipped = report.skipped.len(),
            "batch load complete"
        );
        report
    }

    /// Attempt to load a single extension.
    pub async fn load_one(&self, registry: &mut ExtensionRegistry, id: &str) -> LoadOutcome {
        if registry.is_active(id) {
            return LoadOutcome::AlreadyActive;
        }
        let Some(manifest) = registry.manifest(id).cloned() else {
            tracing::debug!(extension = %id, "not discovered; nothing to load");
            return LoadOutcome::NotDiscovered;
        };

        match self.try_load(registry, &manifest).await {
            Ok(()) => {
                registry.clear_failure(id);
                tracing::info!(extension = %id, version = manifest.version(), "extension loaded");
                self.events.emit(ManagerEvent::Loaded(id.to_string()));
                LoadOutcome::Loaded
            }
            Err(failure) => {
                self.handle_failure(registry, id, &failure).await;
                LoadOutcome::Failed(failure)
            }
        }
    }

    async fn try_load(
        &self,
        registry: &mut ExtensionRegistry,
        manifest: &Manifest,
    ) -> std::result::Result<(), LoadFailure> {
        let id = manifest.id();
        self.check_dependencies(registry, manifest)?;

        let constructor = self
            .loader
            .resolve_entry(id, manifest.entry_point())
            .await
            .map_err(|e| LoadFailure::Resolve {
                entry_point: manifest.entry_point().to_string(),
                message: e.to_string(),
            })?;
        let extension = constructor().map_err(|e| LoadFailure::Construct {
            message: e.to_string(),
        })?;

        // Registered before start so later steps see it as present.
        registry.register_active(id, extension);
        let started = match registry.active_mut(id) {
            Some(extension) => self.run_start(extension.as_mut()).await,
            None => Ok(()),
        };

        if let Err(failure) = started {
            registry.take_active(id);
            return Err(failure);
        }
        Ok(())
    }

    fn check_dependencies(
        &self,
        registry: &ExtensionRegistry,
        manifest: &Manifest,
    ) -> std::result::Result<(), LoadFailure> {
        for dependency in manifest.dependencies() {
            if registry.is_active(dependency) {
                continue;
            }
            if registry.is_enabled(dependency) {
                return Err(LoadFailure::DependencyNotReady {
                    dependency: dependency.clone(),
                });
            }
            if self.strict_dependencies {
                return Err(LoadFailure::DependencyNotEnabled {
                    dependency: dependency.clone(),
                });
            }
        }
        Ok(())
    }

    async fn run_start(&self, extension: &mut dyn Extension) -> std::result::Result<(), LoadFailure> {
        let result = match self.start_timeout {
            Some(limit) => match tokio::time::timeout(limit, extension.start()).await {
                Ok(result) => result,
                Err(_) => return Err(LoadFailure::StartTimeout(limit)),
            },
            None => extension.start().await,
        };
        result.map_err(|e| LoadFailure::Start {
            message: e.to_string(),
        })
    }

    async fn handle_failure(&self, registry: &mut ExtensionRegistry, id: &str, failure: &LoadFailure) {
        let message = failure.to_string();
        tracing::warn!(extension = %id, "Extension failed to load: {}", message);
        registry.record_failure(id, message.clone());
        self.events.emit(ManagerEvent::LoadFailed {
            id: id.to_string(),
            error: message,
        });
        self.cascade_from(registry, id).await;
    }

    /// Disable every enabled extension that transitively depends on `root`.
    async fn cascade_from(&self, registry: &mut ExtensionRegistry, root: &str) {
        let mut seen: HashSet<String> = HashSet::from([root.to_string()]);
        let mut queue: VecDeque<String> = VecDeque::from([root.to_string()]);

        while let Some(current) = queue.pop_front() {
            for dependent in registry.enabled_dependents_of(&current) {
                if !seen.insert(dependent.clone()) {
                    continue;
                }
                tracing::warn!(
                    extension = %dependent,
                    dependency = %current,
                    "Disabling extension because its dependency is unavailable"
                );
                if let Err(err) = self.disable_one(registry, &dependent).await {
                    tracing::warn!(extension = %dependent, "Cascading disable incomplete: {}", err);
                }
                queue.push_back(dependent);
            }
        }
    }

    /// Add `id` to the enabled set and, when `load_now`, try to load it.
    ///
    /// The enabled set is persisted before the in-memory value changes.
    pub async fn enable(
        &self,
        registry: &mut ExtensionRegistry,
        id: &str,
        load_now: bool,
    ) -> Result<LoadOutcome> {
        if !registry.is_enabled(id) {
            let mut next = registry.enabled().clone();
            next.insert(id.to_string());
            self.persist(&next).await?;
            registry.set_enabled(next);
            tracing::info!(extension = %id, "extension enabled");
        }

        if !load_now {
            return Ok(LoadOutcome::Deferred);
        }
        Ok(self.load_one(registry, id).await)
    }

    /// Stop `id` if active and remove it from the enabled set.
    ///
    /// Errors from `stop()` are logged, never returned. Enabled dependents
    /// are reported, and disabled too when `cascade_on_disable` is set.
    pub async fn disable(&self, registry: &mut ExtensionRegistry, id: &str) -> Result<()> {
        self.disable_one(registry, id).await?;

        let dependents = registry.enabled_dependents_of(id);
        if dependents.is_empty() {
            return Ok(());
        }
        if self.cascade_on_disable {
            self.cascade_from(registry, id).await;
        } else {
            tracing::warn!(
                extension = %id,
                ?dependents,
                "Disabled extension still has enabled dependents"
            );
            self.events.emit(ManagerEvent::DependentsStillEnabled {
                id: id.to_string(),
                dependents,
            });
        }
        Ok(())
    }

    async fn disable_one(&self, registry: &mut ExtensionRegistry, id: &str) -> Result<()> {
        if let Some(extension) = registry.take_active(id) {
            self.stop_instance(id, extension).await;
            self.events.emit(ManagerEvent::Unloaded(id.to_string()));
        }

        if registry.is_enabled(id) {
            let mut next = registry.enabled().clone();
            next.remove(id);
            self.persist(&next).await?;
            registry.set_enabled(next);
        }

        tracing::info!(extension = %id, "extension disabled");
        self.events.emit(ManagerEvent::Disabled(id.to_string()));
        Ok(())
    }

    async fn stop_instance(&self, id: &str, mut extension: Box<dyn Extension>) {
        let result = match self.stop_timeout {
            Some(limit) => match tokio::time::timeout(limit, extension.stop()).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(extension = %id, "stop() timed out after {:?}", limit);
                    return;
                }
            },
            None => extension.stop().await,
        };

        match result {
            Ok(()) => tracing::info!(extension = %id, "extension stopped"),
            Err(err) => tracing::warn!(extension = %id, "Error while stopping extension: {}", err),
        }
    }

    /// Stop all active instances in reverse load order and clear the
    /// registry. The persisted enabled set is left as is.
    pub async fn shutdown(&self, registry: &mut ExtensionRegistry) {
        for (id, extension) in registry.drain_active_reverse() {
            self.stop_instance(&id, extension).await;
            self.events.emit(ManagerEvent::Unloaded(id));
        }
        registry.clear();
    }

    async fn persist(&self, enabled: &BTreeSet<String>) -> Result<()> {
        let ids: Vec<String> = enabled.iter().cloned().collect();
        self.store.set_enabled_ids(&ids).await
    }
}
