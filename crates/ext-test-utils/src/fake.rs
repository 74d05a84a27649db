//! Scripted extensions and a loader that hands them out.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ext_manager::{Extension, ExtensionConstructor, ExtensionError, ModuleLoader};

/// How a fake extension behaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Behavior {
    Succeed,
    /// `start()` returns this error message.
    FailStart(String),
    /// `start()` never completes.
    HangStart,
    /// `stop()` returns this error message.
    FailStop(String),
    /// The constructor fails before an instance exists.
    FailConstruct(String),
}

/// Ordered record of lifecycle calls, e.g. `["start:core", "stop:core"]`.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Ids passed to `stop()`, in call order.
    pub fn stopped(&self) -> Vec<String> {
        self.with_prefix("stop:")
    }

    /// Ids passed to `start()`, in call order.
    pub fn started(&self) -> Vec<String> {
        self.with_prefix("start:")
    }

    fn with_prefix(&self, prefix: &str) -> Vec<String> {
        self.entries()
            .iter()
            .filter_map(|e| e.strip_prefix(prefix).map(str::to_string))
            .collect()
    }
}

/// Extension whose `start`/`stop` follow a [`Behavior`].
pub struct FakeExtension {
    id: String,
    behavior: Behavior,
    log: CallLog,
}

#[async_trait]
impl Extension for FakeExtension {
    async fn start(&mut self) -> Result<(), ExtensionError> {
        self.log.push(format!("start:{}", self.id));
        match &self.behavior {
            Behavior::FailStart(message) => Err(message.clone().into()),
            Behavior::HangStart => {
                std::future::pending::<()>().await;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    async fn stop(&mut self) -> Result<(), ExtensionError> {
        self.log.push(format!("stop:{}", self.id));
        match &self.behavior {
            Behavior::FailStop(message) => Err(message.clone().into()),
            _ => Ok(()),
        }
    }
}

/// Loader resolving entry points to [`FakeExtension`]s.
///
/// Entry points without a scripted behavior succeed, unless listed with
/// [`unresolvable`](Self::unresolvable).
#[derive(Debug, Default)]
pub struct FakeLoader {
    behaviors: Mutex<HashMap<String, Behavior>>,
    unresolvable: Mutex<Vec<String>>,
    log: CallLog,
}

impl FakeLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the behavior for `entry_point`.
    pub fn with(self, entry_point: &str, behavior: Behavior) -> Self {
        self.set(entry_point, behavior);
        self
    }

    pub fn set(&self, entry_point: &str, behavior: Behavior) {
        self.behaviors
            .lock()
            .unwrap()
            .insert(entry_point.to_string(), behavior);
    }

    /// Make resolution of `entry_point` fail.
    pub fn unresolvable(self, entry_point: &str) -> Self {
        self.unresolvable
            .lock()
            .unwrap()
            .push(entry_point.to_string());
        self
    }

    pub fn log(&self) -> CallLog {
        self.log.clone()
    }
}

#[async_trait]
impl ModuleLoader for FakeLoader {
    async fn resolve_entry(
        &self,
        id: &str,
        entry_point: &str,
    ) -> Result<ExtensionConstructor, ExtensionError> {
        if self
            .unresolvable
            .lock()
            .unwrap()
            .iter()
            .any(|e| e == entry_point)
        {
            return Err(format!("module not found: {entry_point}").into());
        }

        let behavior = self
            .behaviors
            .lock()
            .unwrap()
            .get(entry_point)
            .cloned()
            .unwrap_or(Behavior::Succeed);
        let log = self.log.clone();
        let id = id.to_string();

        Ok(Box::new(move || -> Result<Box<dyn Extension>, ExtensionError> {
            if let Behavior::FailConstruct(message) = &behavior {
                return Err(message.clone().into());
            }
            Ok(Box::new(FakeExtension { id, behavior, log }) as Box<dyn Extension>)
        }))
    }
}
