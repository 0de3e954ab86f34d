//! Per-user listener sets for notification-list and connection-status
//! changes.
//!
//! Listeners receive pushes over unbounded mpsc channels. The two listener
//! sets are independent: list subscribers are keyed by recipient and get
//! the refreshed per-user list on every notify touching that user;
//! connection subscribers get every status transition, plus the current
//! status once immediately at subscribe time so late subscribers never
//! miss the present state.
//!
//! The registry holds listener endpoints only; it never mutates domain
//! data. Unsubscribing is idempotent and also happens on drop.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::trace;
use uuid::Uuid;

use taskdeck_core::{ConnectionStatus, Notification};

struct ListListener {
    recipient_id: String,
    tx: mpsc::UnboundedSender<Vec<Notification>>,
}

struct RegistryInner {
    lists: HashMap<Uuid, ListListener>,
    connection: HashMap<Uuid, mpsc::UnboundedSender<ConnectionStatus>>,
    current_status: ConnectionStatus,
}

/// Listener registry shared by the service and its subscriptions.
#[derive(Clone)]
pub struct SubscriptionRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(RegistryInner {
                lists: HashMap::new(),
                connection: HashMap::new(),
                current_status: ConnectionStatus::Connected,
            })),
        }
    }

    /// Register a listener for one recipient's notification list.
    pub fn subscribe(&self, recipient_id: impl Into<String>) -> ListSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        let mut inner = self.inner.lock().expect("registry poisoned");
        inner.lists.insert(
            id,
            ListListener {
                recipient_id: recipient_id.into(),
                tx,
            },
        );
        ListSubscription {
            id,
            registry: self.clone(),
            rx,
        }
    }

    /// Register a listener for connection-status transitions. The current
    /// status is delivered immediately.
    pub fn subscribe_connection(&self) -> ConnectionSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        let mut inner = self.inner.lock().expect("registry poisoned");
        let _ = tx.send(inner.current_status);
        inner.connection.insert(id, tx);
        ConnectionSubscription {
            id,
            registry: self.clone(),
            rx,
        }
    }

    /// Push a refreshed list to every listener registered for `recipient_id`.
    /// Each live listener is invoked exactly once; closed listeners are
    /// pruned.
    pub fn notify_lists(&self, recipient_id: &str, notifications: &[Notification]) {
        let mut inner = self.inner.lock().expect("registry poisoned");
        let mut dead: Vec<Uuid> = Vec::new();
        let mut delivered = 0usize;
        for (id, listener) in inner.lists.iter() {
            if listener.recipient_id != recipient_id {
                continue;
            }
            if listener.tx.send(notifications.to_vec()).is_err() {
                dead.push(*id);
            } else {
                delivered += 1;
            }
        }
        for id in dead {
            inner.lists.remove(&id);
        }
        trace!(recipient_id, listener_count = delivered, "list listeners notified");
    }

    /// Push a status transition to every connection listener.
    pub fn notify_connection(&self, status: ConnectionStatus) {
        let mut inner = self.inner.lock().expect("registry poisoned");
        inner.current_status = status;
        let mut dead: Vec<Uuid> = Vec::new();
        for (id, tx) in inner.connection.iter() {
            if tx.send(status).is_err() {
                dead.push(*id);
            }
        }
        for id in dead {
            inner.connection.remove(&id);
        }
        trace!(status = %status, "connection listeners notified");
    }

    /// Drop every registered listener. Subsequent notifies reach nobody;
    /// existing subscriptions see their channel close.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().expect("registry poisoned");
        inner.lists.clear();
        inner.connection.clear();
    }

    pub fn list_listener_count(&self) -> usize {
        self.inner.lock().expect("registry poisoned").lists.len()
    }

    pub fn connection_listener_count(&self) -> usize {
        self.inner.lock().expect("registry poisoned").connection.len()
    }

    fn remove_list(&self, id: Uuid) {
        let mut inner = self.inner.lock().expect("registry poisoned");
        inner.lists.remove(&id);
    }

    fn remove_connection(&self, id: Uuid) {
        let mut inner = self.inner.lock().expect("registry poisoned");
        inner.connection.remove(&id);
    }
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Active subscription to one recipient's notification list.
pub struct ListSubscription {
    id: Uuid,
    registry: SubscriptionRegistry,
    rx: mpsc::UnboundedReceiver<Vec<Notification>>,
}

impl ListSubscription {
    /// Await the next refreshed list. Returns `None` once unsubscribed or
    /// after the registry is cleared.
    pub async fn recv(&mut self) -> Option<Vec<Notification>> {
        self.rx.recv().await
    }

    /// Non-blocking poll for a pending push.
    pub fn try_recv(&mut self) -> Option<Vec<Notification>> {
        self.rx.try_recv().ok()
    }

    /// Deregister this listener. Safe to call repeatedly.
    pub fn unsubscribe(&self) {
        self.registry.remove_list(self.id);
    }
}

impl Drop for ListSubscription {
    fn drop(&mut self) {
        self.registry.remove_list(self.id);
    }
}

/// Active subscription to connection-status transitions.
pub struct ConnectionSubscription {
    id: Uuid,
    registry: SubscriptionRegistry,
    rx: mpsc::UnboundedReceiver<ConnectionStatus>,
}

impl ConnectionSubscription {
    pub async fn recv(&mut self) -> Option<ConnectionStatus> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<ConnectionStatus> {
        self.rx.try_recv().ok()
    }

    /// Deregister this listener. Safe to call repeatedly.
    pub fn unsubscribe(&self) {
        self.registry.remove_connection(self.id);
    }
}

impl Drop for ConnectionSubscription {
    fn drop(&mut self) {
        self.registry.remove_connection(self.id);
    }
}
