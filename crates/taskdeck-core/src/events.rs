//! Real-time delivery signal bus.
//!
//! After a notification is persisted, the service emits a [`DeliveryEvent`]
//! on this bus once the simulated network delay elapses. Consumers (the
//! notification bell, calendar and task views) treat the event purely as a
//! cache-invalidation hint and re-query the service for authoritative
//! state — the signal itself is not the source of truth.
//!
//! Delivery order across concurrently sent notifications is NOT guaranteed;
//! only the offline-queue replay is strictly FIFO. Slow receivers that fall
//! behind receive a `Lagged` error and miss events — acceptable for a
//! real-time stream where freshness matters more than completeness.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::models::Notification;

/// Out-of-band signal that a notification reached its recipient.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryEvent {
    pub notification: Notification,
    /// When the simulated channel delivered the record (not `created_at`).
    pub timestamp: DateTime<Utc>,
}

/// Broadcast-based bus distributing delivery signals to UI subscribers.
#[derive(Clone)]
pub struct DeliveryBus {
    tx: broadcast::Sender<DeliveryEvent>,
}

impl DeliveryBus {
    /// Create a new bus with the given buffer capacity.
    ///
    /// Recommended: 256 for production, 32 for tests.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit a delivery signal for a notification.
    ///
    /// If there are no active subscribers, the event is silently dropped.
    pub fn emit(&self, notification: Notification) {
        let event = DeliveryEvent {
            notification,
            timestamp: Utc::now(),
        };
        tracing::debug!(
            notification_id = %event.notification.id,
            recipient_id = %event.notification.recipient_id,
            kind = %event.notification.kind,
            subscriber_count = self.tx.receiver_count(),
            "DeliveryBus emit"
        );
        let _ = self.tx.send(event);
    }

    /// Subscribe to delivery signals. Each subscriber gets its own
    /// independent stream.
    pub fn subscribe(&self) -> broadcast::Receiver<DeliveryEvent> {
        self.tx.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
