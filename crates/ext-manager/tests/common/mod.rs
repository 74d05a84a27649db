//! Harness shared by the manager test suites.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use ext_manager::{ExtensionManager, ManagerConfig, MemoryEnabledStore, RawManifest};
use ext_test_utils::dir::TestExtensionsDir;
use ext_test_utils::fake::{CallLog, FakeLoader};
use ext_test_utils::sink::RecordingSink;

pub struct Harness {
    pub dir: TestExtensionsDir,
    pub loader: Arc<FakeLoader>,
    pub store: Arc<MemoryEnabledStore>,
    pub events: Arc<RecordingSink>,
    pub manager: ExtensionManager,
}

impl Harness {
    pub fn log(&self) -> CallLog {
        self.loader.log()
    }
}

/// Host `1.0`, short timeouts, lenient dependencies.
pub fn config() -> ManagerConfig {
    ManagerConfig::new("1.0")
        .with_start_timeout(Some(Duration::from_millis(200)))
        .with_stop_timeout(Some(Duration::from_millis(200)))
}

pub fn harness(installed: &[RawManifest], enabled: &[&str], loader: FakeLoader) -> Harness {
    harness_with(installed, enabled, loader, config())
}

pub fn harness_with(
    installed: &[RawManifest],
    enabled: &[&str],
    loader: FakeLoader,
    config: ManagerConfig,
) -> Harness {
    let dir = TestExtensionsDir::new();
    for manifest in installed {
        dir.install(manifest);
    }

    let loader = Arc::new(loader);
    let store = Arc::new(MemoryEnabledStore::new(enabled.iter().copied()));
    let events = Arc::new(RecordingSink::new());
    let manager = ExtensionManager::with_events(
        config,
        Arc::new(dir.source()),
        loader.clone(),
        store.clone(),
        events.clone(),
    )
    .unwrap();

    Harness {
        dir,
        loader,
        store,
        events,
        manager,
    }
}

pub fn strings(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|id| id.to_string()).collect()
}
