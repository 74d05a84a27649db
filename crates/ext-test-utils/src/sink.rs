//! Event sink that keeps every event for later assertions.

use std::sync::Mutex;

use ext_manager::{EventSink, ManagerEvent};

#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ManagerEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ManagerEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Events other than `ListUpdated`, which is emitted after every call.
    pub fn changes(&self) -> Vec<ManagerEvent> {
        self.events()
            .into_iter()
            .filter(|e| !matches!(e, ManagerEvent::ListUpdated(_)))
            .collect()
    }

    pub fn list_updates(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ManagerEvent::ListUpdated(_)))
            .count()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: ManagerEvent) {
        self.events.lock().unwrap().push(event);
    }
}
