//! Notifications emitted after registry changes.

use tokio::sync::mpsc;

use crate::registry::ExtensionStatus;

/// Something observable happened to the extension set.
#[derive(Debug, Clone, PartialEq)]
pub enum ManagerEvent {
    /// An extension started and is now active.
    Loaded(String),
    /// An active extension was stopped.
    Unloaded(String),
    /// An extension was removed from the enabled set.
    Disabled(String),
    /// A load attempt failed; `error` is the recorded failure message.
    LoadFailed { id: String, error: String },
    /// `id` was disabled while these enabled extensions still depend on it.
    DependentsStillEnabled { id: String, dependents: Vec<String> },
    /// Snapshot of the extension list after a public operation.
    ListUpdated(Vec<ExtensionStatus>),
}

/// Fire-and-forget event delivery.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ManagerEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: ManagerEvent) {}
}

/// Forwards events to an unbounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ManagerEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ManagerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: ManagerEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("event receiver dropped; discarding event");
        }
    }
}
