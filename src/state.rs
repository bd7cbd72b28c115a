use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::models::event::{ChangeEvent, ChangeKind, Table};
use crate::observability::metrics::Metrics;
use crate::store::{MemoryStore, RecordStore};

pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub change_tx: broadcast::Sender<ChangeEvent>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>, event_buffer_size: usize) -> Self {
        let (change_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        Self {
            store,
            change_tx,
            metrics: Metrics::new(),
        }
    }

    pub fn in_memory(event_buffer_size: usize) -> Self {
        Self::new(Arc::new(MemoryStore::new()), event_buffer_size)
    }

    pub fn publish(&self, table: Table, kind: ChangeKind, id: Uuid) {
        // No subscribers is the normal case when no dashboard is open.
        if self.change_tx.send(ChangeEvent::new(table, kind, id)).is_err() {
            debug!(?table, ?kind, %id, "change event dropped: no subscribers");
        }
    }
}
