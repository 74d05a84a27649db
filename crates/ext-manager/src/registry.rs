//! In-memory state of the extension set.
//!
//! The registry is a plain state holder. Read accessors are public; the
//! mutation points are crate-private and used only by discovery (the
//! discovered set) and the lifecycle controller (enabled set, active
//! instances and failure records).

use std::collections::{BTreeSet, HashMap};

use crate::discovery::DiscoveredSet;
use crate::loader::Extension;
use crate::manifest::Manifest;

/// One row of the extension list.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionStatus {
    pub manifest: Manifest,
    pub is_enabled: bool,
    pub is_loaded: bool,
    pub has_failed: bool,
    pub error: Option<String>,
}

/// Discovered manifests, enabled ids, active instances and failure records.
#[derive(Default)]
pub struct ExtensionRegistry {
    discovered: DiscoveredSet,
    enabled: BTreeSet<String>,
    active: HashMap<String, Box<dyn Extension>>,
    /// Active ids in the order they were registered.
    load_order: Vec<String>,
    failures: HashMap<String, String>,
}

impl std::fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("discovered", &self.discovered.keys().collect::<Vec<_>>())
            .field("enabled", &self.enabled)
            .field("active", &self.load_order)
            .field("failures", &self.failures)
            .finish()
    }
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn discovered(&self) -> &DiscoveredSet {
        &self.discovered
    }

    pub fn manifest(&self, id: &str) -> Option<&Manifest> {
        self.discovered.get(id)
    }

    pub fn enabled(&self) -> &BTreeSet<String> {
        &self.enabled
    }

    pub fn is_enabled(&self, id: &str) -> bool {
        self.enabled.contains(id)
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.active.contains_key(id)
    }

    /// Active ids in load order.
    pub fn active_ids(&self) -> &[String] {
        &self.load_order
    }

    /// Message of the most recent failed load of `id`.
    pub fn failure(&self, id: &str) -> Option<&str> {
        self.failures.get(id).map(String::as_str)
    }

    /// Enabled and discovered ids; the set that batch loads order.
    pub fn load_candidates(&self) -> BTreeSet<String> {
        self.enabled
            .iter()
            .filter(|id| self.discovered.contains_key(id.as_str()))
            .cloned()
            .collect()
    }

    /// Enabled extensions whose manifest declares `id` as a dependency.
    pub fn enabled_dependents_of(&self, id: &str) -> Vec<String> {
        self.enabled
            .iter()
            .filter(|candidate| {
                self.discovered
                    .get(candidate.as_str())
                    .is_some_and(|m| m.depends_on(id))
            })
            .cloned()
            .collect()
    }

    /// Status of every discovered extension, sorted by id.
    pub fn list(&self) -> Vec<ExtensionStatus> {
        self.discovered
            .iter()
            .map(|(id, manifest)| {
                let error = self.failures.get(id).cloned();
                ExtensionStatus {
                    manifest: manifest.clone(),
                    is_enabled: self.enabled.contains(id),
                    is_loaded: self.active.contains_key(id),
                    has_failed: error.is_some(),
                    error,
                }
            })
            .collect()
    }

    pub(crate) fn replace_discovered(&mut self, discovered: DiscoveredSet) {
        self.discovered = discovered;
    }

    pub(crate) fn set_enabled(&mut self, enabled: BTreeSet<String>) {
        self.enabled = enabled;
    }

    pub(crate) fn register_active(&mut self, id: &str, extension: Box<dyn Extension>) {
        self.failures.remove(id);
        if self.active.insert(id.to_string(), extension).is_none() {
            self.load_order.push(id.to_string());
        }
    }

    pub(crate) fn active_mut(&mut self, id: &str) -> Option<&mut Box<dyn Extension>> {
        self.active.get_mut(id)
    }

    pub(crate) fn take_active(&mut self, id: &str) -> Option<Box<dyn Extension>> {
        let extension = self.active.remove(id)?;
        self.load_order.retain(|loaded| loaded != id);
        Some(extension)
    }

    /// Remove every active instance, most recently loaded first.
    pub(crate) fn drain_active_reverse(&mut self) -> Vec<(String, Box<dyn Extension>)> {
        let order = std::mem::take(&mut self.load_order);
        order
            .into_iter()
            .rev()
            .filter_map(|id| self.active.remove(&id).map(|ext| (id, ext)))
            .collect()
    }

    pub(crate) fn record_failure(&mut self, id: &str, message: String) {
        debug_assert!(!self.active.contains_key(id));
        self.failures.insert(id.to_string(), message);
    }

    pub(crate) fn clear_failure(&mut self, id: &str) {
        self.failures.remove(id);
    }

    pub(crate) fn clear(&mut self) {
        self.discovered.clear();
        self.enabled.clear();
        self.active.clear();
        self.load_order.clear();
        self.failures.clear();
    }
}
