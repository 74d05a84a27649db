//! Public entry point tying discovery, ordering and lifecycle together.

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::ManagerConfig;
use crate::dependency::DependencyGraph;
use crate::discovery::{DiscoveryScanner, ManifestSource};
use crate::error::{Error, Result};
use crate::events::{EventSink, ManagerEvent, NullSink};
use crate::lifecycle::{LifecycleController, LoadOutcome, LoadReport};
use crate::loader::ModuleLoader;
use crate::manifest;
use crate::persistence::EnabledStore;
use crate::registry::{ExtensionRegistry, ExtensionStatus};

#[derive(Debug, Default)]
struct ManagerState {
    registry: ExtensionRegistry,
    graph: DependencyGraph,
    /// Set once the initial batch load has run.
    initialized: bool,
    /// Members of the cycle rejected by the latest batch load.
    rejected: BTreeSet<String>,
}

/// Owns the extension set of one host process.
///
/// Every operation locks the same state mutex, so enable, disable, discovery
/// and batch loads never interleave.
pub struct ExtensionManager {
    scanner: DiscoveryScanner,
    controller: LifecycleController,
    store: Arc<dyn EnabledStore>,
    events: Arc<dyn EventSink>,
    state: Mutex<ManagerState>,
}

impl ExtensionManager {
    /// Create a manager with a [`NullSink`] for events.
    ///
    /// Fails if `config.host_version` is not a dotted-numeric version.
    pub fn new(
        config: ManagerConfig,
        source: Arc<dyn ManifestSource>,
        loader: Arc<dyn ModuleLoader>,
        store: Arc<dyn EnabledStore>,
    ) -> Result<Self> {
        Self::with_events(config, source, loader, store, Arc::new(NullSink))
    }

    pub fn with_events(
        config: ManagerConfig,
        source: Arc<dyn ManifestSource>,
        loader: Arc<dyn ModuleLoader>,
        store: Arc<dyn EnabledStore>,
        events: Arc<dyn EventSink>,
    ) -> Result<Self> {
        let host = config.host()?;
        Ok(Self {
            scanner: DiscoveryScanner::new(source, host),
            controller: LifecycleController::new(&config, loader, store.clone(), events.clone()),
            store,
            events,
            state: Mutex::new(ManagerState::default()),
        })
    }

    /// Read the persisted enabled set, discover, and load everything enabled.
    pub async fn start(&self) -> Result<LoadReport> {
        let mut state = self.state.lock().await;
        if state.initialized {
            return Err(Error::AlreadyStarted);
        }

        let enabled: BTreeSet<String> = self.store.enabled_ids().await?.into_iter().collect();
        let discovered = self.scanner.discover().await?;
        tracing::info!(
            host = %self.scanner.host_version(),
            enabled = enabled.len(),
            discovered = discovered.len(),
            "starting extension manager"
        );

        state.graph = DependencyGraph::from_discovered(&discovered);
        state.registry.replace_discovered(discovered);
        state.registry.set_enabled(enabled);

        let report = self.run_batch(&mut state).await;
        state.initialized = true;
        self.publish_list(&state);
        Ok(report)
    }

    /// Rescan installed extensions and rebuild the dependency graph.
    ///
    /// Enabled ids, active instances and failure records are untouched.
    /// Returns the discovered ids.
    pub async fn discover(&self) -> Result<Vec<String>> {
        let mut state = self.state.lock().await;
        let discovered = self.scanner.discover().await?;
        let ids = discovered.keys().cloned().collect();

        state.graph = DependencyGraph::from_discovered(&discovered);
        state.registry.replace_discovered(discovered);
        self.publish_list(&state);
        Ok(ids)
    }

    /// Order and load all enabled, discovered extensions that are not yet
    /// active. A cyclic enabled set loads nothing.
    pub async fn load_enabled(&self) -> LoadReport {
        let mut state = self.state.lock().await;
        let report = self.run_batch(&mut state).await;
        state.initialized = true;
        self.publish_list(&state);
        report
    }

    /// Load order for the current enabled set, without loading anything.
    pub async fn order_for_load(&self) -> Result<Vec<String>> {
        let state = self.state.lock().await;
        state.graph.order_for_load(&state.registry.load_candidates())
    }

    async fn run_batch(&self, state: &mut ManagerState) -> LoadReport {
        let candidates = state.registry.load_candidates();
        match state.graph.order_for_load(&candidates) {
            Ok(order) => {
                state.rejected.clear();
                self.controller.load_enabled(&mut state.registry, &order).await
            }
            Err(Error::DependencyCycle { participants }) => {
                tracing::warn!(
                    ?participants,
                    "Enabled extensions form a dependency cycle; loading none of them"
                );
                state.rejected = candidates;
                LoadReport {
                    cycle: Some(participants),
                    ..LoadReport::default()
                }
            }
            Err(err) => {
                tracing::warn!("Could not order enabled extensions: {}", err);
                LoadReport::default()
            }
        }
    }

    /// Enable `id` and, once the initial load has run, load only `id`.
    ///
    /// Ids that could never name an installed extension are rejected before
    /// anything is persisted.
    pub async fn enable(&self, id: &str) -> Result<LoadOutcome> {
        manifest::validate_id(id)?;
        let mut state = self.state.lock().await;
        self.sync_enabled(&mut state).await?;
        let load_now = state.initialized && !state.rejected.contains(id);
        let state = &mut *state;

        let mut outcome = self
            .controller
            .enable(&mut state.registry, id, load_now)
            .await?;
        if state.initialized && state.rejected.contains(id) {
            tracing::warn!(extension = %id, "Not loading extension rejected for a dependency cycle");
            outcome = LoadOutcome::CycleRejected;
        }

        self.publish_list(state);
        Ok(outcome)
    }

    /// Stop and disable `id`. Stop errors are logged, not returned.
    pub async fn disable(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        self.sync_enabled(&mut state).await?;
        self.controller.disable(&mut state.registry, id).await?;
        self.publish_list(&state);
        Ok(())
    }

    /// Stop every active extension, most recently loaded first, and clear
    /// all in-memory state. The persisted enabled set is not modified.
    pub async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        self.controller.shutdown(&mut state.registry).await;
        state.graph = DependencyGraph::new();
        state.rejected.clear();
        state.initialized = false;
        self.publish_list(&state);
    }

    pub async fn is_enabled(&self, id: &str) -> bool {
        self.state.lock().await.registry.is_enabled(id)
    }

    pub async fn is_active(&self, id: &str) -> bool {
        self.state.lock().await.registry.is_active(id)
    }

    pub async fn is_initialized(&self) -> bool {
        self.state.lock().await.initialized
    }

    /// Recorded failure message for `id`, if its last load failed.
    pub async fn failure(&self, id: &str) -> Option<String> {
        self.state.lock().await.registry.failure(id).map(str::to_string)
    }

    pub async fn list(&self) -> Vec<ExtensionStatus> {
        self.state.lock().await.registry.list()
    }

    pub async fn enabled_ids(&self) -> Vec<String> {
        self.state.lock().await.registry.enabled().iter().cloned().collect()
    }

    /// Active ids in load order.
    pub async fn active_ids(&self) -> Vec<String> {
        self.state.lock().await.registry.active_ids().to_vec()
    }

    /// Direct dependents of `id` in the discovered graph.
    pub async fn dependents_of(&self, id: &str) -> Vec<String> {
        let state = self.state.lock().await;
        state
            .graph
            .dependents_of(id)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Outside a session (before `start`, after `shutdown`) the registry has
    /// no enabled set of its own; mutations start from the persisted one.
    async fn sync_enabled(&self, state: &mut ManagerState) -> Result<()> {
        if state.initialized {
            return Ok(());
        }
        let persisted = self.store.enabled_ids().await?;
        state.registry.set_enabled(persisted.into_iter().collect());
        Ok(())
    }

    fn publish_list(&self, state: &ManagerState) {
        self.events
            .emit(ManagerEvent::ListUpdated(state.registry.list()));
    }
}

impl std::fmt::Debug for ExtensionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionManager")
            .field("host_version", &self.scanner.host_version())
            .finish_non_exhaustive()
    }
}
