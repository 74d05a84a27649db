//! End-to-end test of a host embedding the manager
//!
//! Exercises the complete flow: config file -> installation directory scan ->
//! persisted enabled set -> ordered load -> enable/disable -> shutdown.

mod logging;

use std::fs;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ext_fs::NormalizedPath;
use ext_manager::{
    ChannelSink, EnabledStore, Extension, ExtensionError, ExtensionManager, FileEnabledStore,
    LoadOutcome, ManagerConfig, ManagerEvent, StaticLoader,
};
use ext_test_utils::dir::TestExtensionsDir;
use ext_test_utils::fake::{Behavior, FakeLoader};
use ext_test_utils::{manifest, manifest_requiring};
use pretty_assertions::assert_eq;

/// Installation with a healthy chain plus one of every kind of broken entry.
fn setup_installation() -> TestExtensionsDir {
    let dir = TestExtensionsDir::new();
    dir.install(&manifest("core", &[]));
    dir.install(&manifest("ui", &["core"]));
    dir.install(&manifest("theme", &["ui"]));
    dir.install(&manifest("metrics", &[]));
    dir.install(&manifest_requiring("next-gen", "3.0"));

    dir.write_manifest("garbled", "id = \"garbled\"\nname = [unterminated");
    dir.write_manifest(
        "renamed",
        r#"
id = "original"
name = "Renamed"
version = "1.0.0"
minHostVersion = "1.0"
entryPoint = "original"
description = "Directory and id disagree"
"#,
    );
    dir.install_empty("no-manifest");
    dir.write_enabled(&["core", "ui", "theme", "next-gen", "garbled"]);
    dir
}

fn write_config(dir: &TestExtensionsDir, body: &str) -> ManagerConfig {
    let path = dir.root().join("manager.toml");
    fs::write(&path, body).unwrap();
    ManagerConfig::load(&NormalizedPath::new(&path)).unwrap()
}

fn manager(dir: &TestExtensionsDir, config: ManagerConfig, loader: Arc<FakeLoader>) -> ExtensionManager {
    ExtensionManager::new(
        config,
        Arc::new(dir.source()),
        loader,
        Arc::new(FileEnabledStore::new(dir.state_file())),
    )
    .unwrap()
}

#[tokio::test]
async fn test_host_start_skips_invalid_installs() {
    logging::init();
    let dir = setup_installation();
    let config = write_config(&dir, "host_version = \"2.4\"\n");
    let loader = Arc::new(FakeLoader::new());
    let manager = manager(&dir, config, loader.clone());

    let report = manager.start().await.unwrap();

    let listed: Vec<String> = manager
        .list()
        .await
        .iter()
        .map(|status| status.manifest.id().to_string())
        .collect();
    assert_eq!(listed, vec!["core", "metrics", "theme", "ui"]);

    assert_eq!(report.loaded, vec!["core", "ui", "theme"]);
    assert_eq!(loader.log().started(), vec!["core", "ui", "theme"]);
    assert!(!manager.is_active("next-gen").await);
    assert!(!manager.is_active("metrics").await);

    let statuses = manager.list().await;
    let metrics = statuses.iter().find(|s| s.manifest.id() == "metrics").unwrap();
    assert!(!metrics.is_enabled);
    assert!(!metrics.is_loaded);
    assert!(!metrics.has_failed);
}

#[tokio::test]
async fn test_failure_cascade_is_persisted() {
    logging::init();
    let dir = setup_installation();
    let config = write_config(&dir, "host_version = \"2.4\"\nstart_timeout_ms = 100\n");
    let loader = Arc::new(FakeLoader::new().with("ui", Behavior::HangStart));
    let manager = manager(&dir, config, loader);

    let report = manager.start().await.unwrap();

    assert_eq!(report.loaded, vec!["core"]);
    assert_eq!(report.failed, vec!["ui"]);
    assert_eq!(
        manager.failure("ui").await.as_deref(),
        Some("start timed out after 100ms")
    );

    let on_disk = FileEnabledStore::new(dir.state_file()).enabled_ids().await.unwrap();
    assert_eq!(on_disk, vec!["core", "garbled", "next-gen", "ui"]);
}

#[tokio::test]
async fn test_enable_disable_updates_state_file() {
    logging::init();
    let dir = setup_installation();
    let config = write_config(&dir, "host_version = \"2.4\"\n");
    let manager = manager(&dir, config, Arc::new(FakeLoader::new()));
    manager.start().await.unwrap();

    assert_eq!(manager.enable("metrics").await.unwrap(), LoadOutcome::Loaded);
    manager.disable("theme").await.unwrap();

    let store = FileEnabledStore::new(dir.state_file());
    assert_eq!(
        store.enabled_ids().await.unwrap(),
        vec!["core", "garbled", "metrics", "next-gen", "ui"]
    );
    assert_eq!(manager.active_ids().await, vec!["core", "ui", "metrics"]);
}

#[tokio::test]
async fn test_missing_state_file_starts_empty() {
    logging::init();
    let dir = TestExtensionsDir::new();
    dir.install(&manifest("solo", &[]));
    let manager = manager(&dir, ManagerConfig::new("1.0"), Arc::new(FakeLoader::new()));

    let report = manager.start().await.unwrap();
    assert!(report.loaded.is_empty());
    assert!(!dir.state_file().exists());

    manager.enable("solo").await.unwrap();
    assert!(dir.state_file().exists());
}

#[tokio::test]
async fn test_json_manifests_are_discovered() {
    logging::init();
    let dir = TestExtensionsDir::new();
    let source = dir.source().with_manifest_filename("extension.json");
    fs::create_dir_all(dir.extensions_root().join("json-ext")).unwrap();
    fs::write(
        dir.extensions_root().join("json-ext").join("extension.json"),
        r#"{
  "id": "json-ext",
  "name": "JSON extension",
  "version": "0.3.0",
  "minHostVersion": "1.0",
  "entryPoint": "json-ext",
  "description": "Manifest written as JSON"
}"#,
    )
    .unwrap();

    let manager = ExtensionManager::new(
        ManagerConfig::new("1.0"),
        Arc::new(source),
        Arc::new(FakeLoader::new()),
        Arc::new(FileEnabledStore::new(dir.state_file())),
    )
    .unwrap();

    assert_eq!(manager.discover().await.unwrap(), vec!["json-ext"]);
}

struct Recorder {
    name: &'static str,
    journal: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Extension for Recorder {
    async fn start(&mut self) -> Result<(), ExtensionError> {
        self.journal.lock().unwrap().push(format!("up {}", self.name));
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), ExtensionError> {
        self.journal.lock().unwrap().push(format!("down {}", self.name));
        Ok(())
    }
}

fn recorder(name: &'static str, journal: &Arc<Mutex<Vec<String>>>) -> impl Fn() -> Result<Box<dyn Extension>, ExtensionError> + Send + Sync + 'static {
    let journal = journal.clone();
    move || -> Result<Box<dyn Extension>, ExtensionError> {
        Ok(Box::new(Recorder {
            name,
            journal: journal.clone(),
        }))
    }
}

#[tokio::test]
async fn test_static_loader_with_channel_events() {
    logging::init();
    let dir = TestExtensionsDir::new();
    dir.install(&manifest("core", &[]));
    dir.install(&manifest("ui", &["core"]));
    dir.write_enabled(&["core", "ui"]);

    let journal = Arc::new(Mutex::new(Vec::new()));
    let loader = StaticLoader::new()
        .with("core", recorder("core", &journal))
        .with("ui", recorder("ui", &journal));
    let (sink, mut rx) = ChannelSink::new();

    let manager = ExtensionManager::with_events(
        ManagerConfig::new("1.0"),
        Arc::new(dir.source()),
        Arc::new(loader),
        Arc::new(FileEnabledStore::new(dir.state_file())),
        Arc::new(sink),
    )
    .unwrap();

    manager.start().await.unwrap();
    manager.shutdown().await;

    assert_eq!(
        *journal.lock().unwrap(),
        vec!["up core", "up ui", "down ui", "down core"]
    );

    let mut changes = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if !matches!(event, ManagerEvent::ListUpdated(_)) {
            changes.push(event);
        }
    }
    assert_eq!(
        changes,
        vec![
            ManagerEvent::Loaded("core".into()),
            ManagerEvent::Loaded("ui".into()),
            ManagerEvent::Unloaded("ui".into()),
            ManagerEvent::Unloaded("core".into()),
        ]
    );
}
