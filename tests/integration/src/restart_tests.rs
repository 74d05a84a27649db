//! The enabled set survives host restarts; in-memory state does not.

mod logging;

use std::sync::Arc;

use ext_manager::{EnabledStore, ExtensionManager, FileEnabledStore, ManagerConfig};
use ext_test_utils::dir::TestExtensionsDir;
use ext_test_utils::fake::{Behavior, FakeLoader};
use ext_test_utils::manifest;
use pretty_assertions::assert_eq;

fn boot(dir: &TestExtensionsDir, loader: FakeLoader) -> ExtensionManager {
    ExtensionManager::new(
        ManagerConfig::new("1.0"),
        Arc::new(dir.source()),
        Arc::new(loader),
        Arc::new(FileEnabledStore::new(dir.state_file())),
    )
    .unwrap()
}

fn installation() -> TestExtensionsDir {
    let dir = TestExtensionsDir::new();
    dir.install(&manifest("core", &[]));
    dir.install(&manifest("ui", &["core"]));
    dir.install(&manifest("search", &["core"]));
    dir
}

#[tokio::test]
async fn test_enabled_set_survives_restart() {
    logging::init();
    let dir = installation();

    let first = boot(&dir, FakeLoader::new());
    first.start().await.unwrap();
    first.enable("core").await.unwrap();
    first.enable("search").await.unwrap();
    first.shutdown().await;

    let second = boot(&dir, FakeLoader::new());
    let report = second.start().await.unwrap();

    assert_eq!(report.loaded, vec!["core", "search"]);
    assert_eq!(second.enabled_ids().await, vec!["core", "search"]);
}

#[tokio::test]
async fn test_failure_records_do_not_survive_restart() {
    logging::init();
    let dir = installation();
    dir.write_enabled(&["core", "search"]);

    let first = boot(&dir, FakeLoader::new().with("search", Behavior::FailStart("index locked".into())));
    first.start().await.unwrap();
    assert!(first.failure("search").await.is_some());
    first.shutdown().await;
    assert!(first.failure("search").await.is_none());

    let second = boot(&dir, FakeLoader::new());
    second.start().await.unwrap();
    assert!(second.failure("search").await.is_none());
    assert!(second.is_active("search").await);
}

#[tokio::test]
async fn test_uninstalled_extension_stays_enabled_but_unloaded() {
    logging::init();
    let dir = installation();
    dir.write_enabled(&["core", "ui"]);
    dir.uninstall("ui");

    let manager = boot(&dir, FakeLoader::new());
    let report = manager.start().await.unwrap();

    assert_eq!(report.loaded, vec!["core"]);
    assert!(manager.is_enabled("ui").await);
    assert!(!manager.is_active("ui").await);

    dir.install(&manifest("ui", &["core"]));
    manager.discover().await.unwrap();
    let report = manager.load_enabled().await;
    assert_eq!(report.loaded, vec!["ui"]);
}

#[tokio::test]
async fn test_toggling_outside_a_session_edits_state_file() {
    logging::init();
    let dir = installation();
    dir.write_enabled(&["search"]);
    let store = FileEnabledStore::new(dir.state_file());

    let manager = boot(&dir, FakeLoader::new());
    manager.enable("core").await.unwrap();
    assert_eq!(store.enabled_ids().await.unwrap(), vec!["core", "search"]);

    let report = manager.start().await.unwrap();
    assert_eq!(report.loaded, vec!["core", "search"]);
    manager.shutdown().await;

    manager.disable("search").await.unwrap();
    manager.enable("ui").await.unwrap();
    assert_eq!(store.enabled_ids().await.unwrap(), vec!["core", "ui"]);

    let report = manager.start().await.unwrap();
    assert_eq!(report.loaded, vec!["core", "ui"]);
}
