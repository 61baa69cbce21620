//! Event types and the application event bus
//!
//! Every store mutation publishes an `AppEvent`; the persistence coordinator
//! subscribes and decides which events re-arm the debounced save. The bus is
//! a thin wrapper over `tokio::sync::broadcast`, so slow subscribers never
//! block producers and lagged subscribers are detectable.

use crate::model::RecordId;
use tokio::sync::broadcast;

/// Application events
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// A record was added (locally created or imported)
    RecordAdded { record_id: RecordId },
    /// A record's fields changed (patch, remote attach, import overwrite)
    RecordUpdated { record_id: RecordId },
    /// A record was removed locally (the remote card is never deleted)
    RecordRemoved { record_id: RecordId },
    /// A record's transient selection flag flipped
    SelectionChanged { record_id: RecordId, selected: bool },
    /// A factor weight changed
    WeightsChanged { key: String, weight: f64 },
    /// The UI theme flag flipped
    ThemeChanged { dark: bool },
    /// A remote snapshot replaced local state on load
    SnapshotRestored { rows: usize },
    /// Non-blocking status line (save failures, sync outcomes)
    Status { message: String },
}

impl AppEvent {
    /// Whether this event changes persisted state
    ///
    /// Selection is a transient operation flag and status lines are derived
    /// output; neither triggers a snapshot write.
    pub fn is_data_change(&self) -> bool {
        !matches!(
            self,
            AppEvent::SelectionChanged { .. } | AppEvent::Status { .. }
        )
    }
}

/// Central event distribution bus
///
/// Non-blocking publish; multiple concurrent subscribers; automatic cleanup
/// when subscribers drop.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AppEvent>,
}

impl EventBus {
    /// Create a bus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Emitting without subscribers is not an error; the event is dropped.
    pub fn emit(&self, event: AppEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("event emitted with no subscribers");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
