//! Stock lifecycle events.
//!
//! Every successful ledger transition emits one event after its transaction
//! commits. Consumers (notification senders, cache invalidation, analytics)
//! subscribe through the mpsc channel; the core only guarantees delivery to
//! the channel, not further.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Events emitted by the storefront core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    StockReceived {
        item_id: Uuid,
        warehouse_id: Uuid,
        quantity: i64,
    },
    StockReserved {
        item_id: Uuid,
        warehouse_id: Uuid,
        quantity: i64,
        order_id: Option<Uuid>,
    },
    StockReleased {
        item_id: Uuid,
        warehouse_id: Uuid,
        quantity: i64,
        order_id: Option<Uuid>,
    },
    StockCommitted {
        item_id: Uuid,
        warehouse_id: Uuid,
        quantity: i64,
        order_id: Option<Uuid>,
    },
    StockTransferred {
        item_id: Uuid,
        source_warehouse_id: Uuid,
        dest_warehouse_id: Uuid,
        quantity: i64,
    },
    /// A stock row was observed violating its counter invariants. The read
    /// path clamps and keeps serving; this event is the hook for the
    /// observability collaborator.
    StockInvariantViolated {
        item_id: Uuid,
        warehouse_id: Uuid,
        detail: String,
        observed_at: DateTime<Utc>,
    },
}

/// Sending half of the event channel, cloned into every service.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Creates a channel pair with the given buffer size.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self::new(tx), rx)
    }

    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {e}"))
    }
}

/// Drains the event channel, logging each event. Spawn as a background task;
/// returns when all senders are dropped.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::StockInvariantViolated {
                item_id,
                warehouse_id,
                detail,
                ..
            } => {
                warn!(
                    item_id = %item_id,
                    warehouse_id = %warehouse_id,
                    detail = %detail,
                    "Stock invariant violation observed"
                );
            }
            other => {
                info!(event = ?other, "Stock event");
            }
        }
    }
}
