//! Notification service orchestrator.
//!
//! Owns the store handle, offline queue, subscription registry, delivery
//! bus, and connection monitor, and exposes the public API the rest of the
//! dashboard calls. One instance per process; the service is `Clone` and
//! cheap to pass around, all clones share state.
//!
//! Delivery contract: while connected, `send` persists immediately and
//! emits a delivery signal after a simulated network delay (order across
//! concurrent sends is not guaranteed). While not connected, notifications
//! land in the offline queue; the drain on reconnect is strictly FIFO and
//! notifies each affected recipient once. Connection faults are never
//! surfaced through `send` — the only observable effect is latency.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as TimeDelta, Utc};
use rand::Rng;
use tokio::sync::{broadcast, watch};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use taskdeck_core::{
    defaults, Broadcast, BroadcastFailure, BroadcastOutcome, BulkFailure, BulkOutcome,
    ConnectionStatus, DeliveryBus, DeliveryEvent, Error, Notification, NotificationFactory,
    NotificationStore, Result, SendNotification,
};

use crate::monitor::{ConnectionConfig, ConnectionMonitor};
use crate::queue::OfflineQueue;
use crate::registry::{ConnectionSubscription, ListSubscription, SubscriptionRegistry};

/// Configuration for the notification service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Lower bound of the simulated delivery delay.
    pub delivery_delay_min: Duration,
    /// Upper bound of the simulated delivery delay.
    pub delivery_delay_max: Duration,
    /// Age threshold for the hard purge sweep.
    pub retention_days: i64,
    /// Offline queue bound. `None` means unbounded.
    pub offline_queue_capacity: Option<usize>,
    /// Delivery bus ring size for slow subscribers.
    pub delivery_bus_capacity: usize,
    /// Connection state machine settings.
    pub connection: ConnectionConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            delivery_delay_min: Duration::from_millis(defaults::DELIVERY_DELAY_MIN_MS),
            delivery_delay_max: Duration::from_millis(defaults::DELIVERY_DELAY_MAX_MS),
            retention_days: defaults::RETENTION_DAYS,
            offline_queue_capacity: None,
            delivery_bus_capacity: defaults::DELIVERY_BUS_CAPACITY,
            connection: ConnectionConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `NOTIFY_DELIVERY_MIN_MS` | `200` | Min simulated delivery delay |
    /// | `NOTIFY_DELIVERY_MAX_MS` | `1200` | Max simulated delivery delay |
    /// | `NOTIFY_RETENTION_DAYS` | `30` | Hard purge age threshold |
    /// | `NOTIFY_QUEUE_CAPACITY` | unset | Offline queue bound (unset = unbounded) |
    /// | `NOTIFY_BUS_CAPACITY` | `256` | Delivery bus ring size |
    ///
    /// Connection settings are read by [`ConnectionConfig::from_env`].
    pub fn from_env() -> Self {
        let mut config = Self {
            connection: ConnectionConfig::from_env(),
            ..Self::default()
        };

        if let Some(ms) = env_u64("NOTIFY_DELIVERY_MIN_MS") {
            config.delivery_delay_min = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64("NOTIFY_DELIVERY_MAX_MS") {
            config.delivery_delay_max = Duration::from_millis(ms);
        }
        if let Some(days) = env_u64("NOTIFY_RETENTION_DAYS") {
            config.retention_days = days as i64;
        }
        if let Some(capacity) = env_u64("NOTIFY_QUEUE_CAPACITY") {
            config.offline_queue_capacity = Some(capacity as usize);
        }
        if let Some(capacity) = env_u64("NOTIFY_BUS_CAPACITY") {
            config.delivery_bus_capacity = capacity as usize;
        }

        if config.delivery_delay_max < config.delivery_delay_min {
            config.delivery_delay_max = config.delivery_delay_min;
        }
        config
    }

    pub fn with_delivery_delay(mut self, min: Duration, max: Duration) -> Self {
        self.delivery_delay_min = min;
        self.delivery_delay_max = max.max(min);
        self
    }

    pub fn with_retention_days(mut self, days: i64) -> Self {
        self.retention_days = days;
        self
    }

    pub fn with_offline_queue_capacity(mut self, capacity: usize) -> Self {
        self.offline_queue_capacity = Some(capacity);
        self
    }

    pub fn with_connection(mut self, connection: ConnectionConfig) -> Self {
        self.connection = connection;
        self
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.parse::<u64>().ok())
}

struct ServiceInner {
    store: Arc<dyn NotificationStore>,
    queue: OfflineQueue,
    registry: SubscriptionRegistry,
    bus: DeliveryBus,
    monitor: ConnectionMonitor,
    config: ServiceConfig,
    shutdown_tx: watch::Sender<bool>,
}

/// Notification delivery engine. Clones share all state.
#[derive(Clone)]
pub struct NotificationService {
    inner: Arc<ServiceInner>,
}

impl NotificationService {
    /// Start the service: spawns the connection monitor and the watcher
    /// task that reacts to its transitions.
    pub fn new(store: Arc<dyn NotificationStore>, config: ServiceConfig) -> Self {
        let monitor = ConnectionMonitor::spawn(config.connection.clone());
        let status_rx = monitor.subscribe();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let queue = match config.offline_queue_capacity {
            Some(capacity) => OfflineQueue::bounded(capacity),
            None => OfflineQueue::new(),
        };

        let service = Self {
            inner: Arc::new(ServiceInner {
                store,
                queue,
                registry: SubscriptionRegistry::new(),
                bus: DeliveryBus::new(config.delivery_bus_capacity),
                monitor,
                config,
                shutdown_tx,
            }),
        };

        tokio::spawn(watch_connection(service.clone(), status_rx, shutdown_rx));

        info!("notification service started");
        service
    }

    /// Service with defaults, for tests and quick wiring.
    pub fn with_defaults(store: Arc<dyn NotificationStore>) -> Self {
        Self::new(store, ServiceConfig::default())
    }

    // ------------------------------------------------------------------
    // Delivery
    // ------------------------------------------------------------------

    /// Build, validate, and deliver one notification.
    ///
    /// Never fails due to connectivity: while the channel is down the
    /// record is queued and delivered on reconnect. Fails only on invalid
    /// input, storage failure, or queue overflow when a bound is set.
    pub async fn send(&self, request: SendNotification) -> Result<Notification> {
        let notification = NotificationFactory::create(request)?;

        if self.status() == ConnectionStatus::Connected {
            self.inner.store.put(notification.clone()).await?;
            debug!(
                notification_id = %notification.id,
                recipient_id = %notification.recipient_id,
                kind = notification.kind.as_str(),
                "notification persisted"
            );
            self.notify_recipient(&notification.recipient_id).await;
            self.schedule_delivery(notification.clone());
        } else {
            self.inner.queue.enqueue(notification.clone())?;
        }

        Ok(notification)
    }

    /// Fan one logical event out into one notification per recipient.
    ///
    /// Each recipient's delivery is independent; a failure for one never
    /// blocks the others, and every per-recipient failure is reported.
    pub async fn broadcast(&self, broadcast: Broadcast) -> BroadcastOutcome {
        let mut outcome = BroadcastOutcome::default();
        for recipient_id in &broadcast.recipients {
            let request = SendNotification::new(
                broadcast.kind,
                recipient_id,
                &broadcast.title,
                &broadcast.message,
            )
            .with_metadata(broadcast.payload.clone());

            match self.send(request).await {
                Ok(notification) => outcome.delivered.push(notification),
                Err(e) => {
                    warn!(recipient_id = %recipient_id, error = %e, "broadcast recipient failed");
                    outcome.failed.push(BroadcastFailure {
                        recipient_id: recipient_id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
        debug!(
            delivered = outcome.delivered.len(),
            failed = outcome.failed.len(),
            "broadcast fan-out complete"
        );
        outcome
    }

    /// Flush the offline queue into the store in FIFO order.
    ///
    /// Runs automatically when the monitor reconnects; callable directly
    /// as well. Affected recipients are notified once each, after all
    /// queued items are persisted. A storage failure on one item is
    /// logged and skipped so the rest of the queue still drains.
    ///
    /// Returns the number of notifications persisted.
    pub async fn drain_offline_queue(&self) -> Result<usize> {
        let drained = self.inner.queue.drain_all();
        if drained.is_empty() {
            return Ok(0);
        }

        let mut affected: Vec<String> = Vec::new();
        let mut persisted = 0usize;
        for notification in drained {
            let recipient_id = notification.recipient_id.clone();
            match self.inner.store.put(notification.clone()).await {
                Ok(()) => {
                    persisted += 1;
                    if !affected.contains(&recipient_id) {
                        affected.push(recipient_id);
                    }
                    self.schedule_delivery(notification);
                }
                Err(e) => {
                    error!(
                        notification_id = %notification.id,
                        recipient_id = %recipient_id,
                        error = %e,
                        "failed to persist queued notification, skipping"
                    );
                }
            }
        }

        // One refresh per recipient, not one per notification
        for recipient_id in &affected {
            self.notify_recipient(recipient_id).await;
        }

        info!(drained = persisted, recipients = affected.len(), "offline queue drained");
        Ok(persisted)
    }

    // ------------------------------------------------------------------
    // Read-state mutations
    // ------------------------------------------------------------------

    /// Mark a notification read. Idempotent: a second call leaves
    /// `read_at` untouched and pushes no refresh.
    pub async fn mark_as_read(&self, id: Uuid, user_id: &str) -> Result<()> {
        let notification = self.owned(id, user_id).await?;
        if notification.is_read {
            return Ok(());
        }
        self.inner.store.mark_read(id).await?;
        self.notify_recipient(user_id).await;
        Ok(())
    }

    /// Mark a notification unread. Idempotent like [`mark_as_read`].
    ///
    /// [`mark_as_read`]: NotificationService::mark_as_read
    pub async fn mark_as_unread(&self, id: Uuid, user_id: &str) -> Result<()> {
        let notification = self.owned(id, user_id).await?;
        if !notification.is_read {
            return Ok(());
        }
        self.inner.store.mark_unread(id).await?;
        self.notify_recipient(user_id).await;
        Ok(())
    }

    /// Mark every active notification owned by `user_id` as read.
    /// Returns how many actually changed state.
    pub async fn mark_all_as_read(&self, user_id: &str) -> Result<usize> {
        let active = self.inner.store.list_by_recipient(user_id, false).await?;
        let mut changed = 0usize;
        for notification in active.iter().filter(|n| !n.is_read) {
            self.inner.store.mark_read(notification.id).await?;
            changed += 1;
        }
        if changed > 0 {
            self.notify_recipient(user_id).await;
        }
        Ok(changed)
    }

    // ------------------------------------------------------------------
    // Removal and retention
    // ------------------------------------------------------------------

    /// Permanently delete a notification. Subsequent operations on the id
    /// fail with [`Error::NotFound`].
    pub async fn delete_notification(&self, id: Uuid, user_id: &str) -> Result<()> {
        self.owned(id, user_id).await?;
        self.inner.store.delete(id).await?;
        self.notify_recipient(user_id).await;
        Ok(())
    }

    /// Soft-archive the user's active notifications older than `days`.
    /// Archived records leave the active view but remain retrievable —
    /// this is not a delete.
    pub async fn archive_old_notifications(&self, user_id: &str, days: i64) -> Result<usize> {
        let cutoff = Utc::now() - TimeDelta::days(days);
        let active = self.inner.store.list_by_recipient(user_id, false).await?;
        let mut archived = 0usize;
        for notification in active.iter().filter(|n| n.created_at < cutoff) {
            self.inner.store.archive(notification.id).await?;
            archived += 1;
        }
        if archived > 0 {
            info!(recipient_id = %user_id, archived, days, "old notifications archived");
            self.notify_recipient(user_id).await;
        }
        Ok(archived)
    }

    /// Hard purge sweep: permanently delete every notification older than
    /// the configured retention window, across all users. Distinct from
    /// [`archive_old_notifications`] — purged records are unrecoverable.
    ///
    /// Returns the affected user ids.
    ///
    /// [`archive_old_notifications`]: NotificationService::archive_old_notifications
    pub async fn clear_old_notifications(&self) -> Result<Vec<String>> {
        let cutoff = Utc::now() - TimeDelta::days(self.inner.config.retention_days);
        let affected = self.inner.store.purge_older_than(cutoff).await?;
        for recipient_id in &affected {
            self.notify_recipient(recipient_id).await;
        }
        info!(
            recipients = affected.len(),
            retention_days = self.inner.config.retention_days,
            "retention purge complete"
        );
        Ok(affected)
    }

    // ------------------------------------------------------------------
    // Bulk operations
    // ------------------------------------------------------------------

    /// Mark each id read. A failure on one id never blocks the rest; the
    /// outcome lists exactly which ids failed.
    pub async fn bulk_mark_as_read(&self, ids: &[Uuid], user_id: &str) -> BulkOutcome {
        let mut outcome = BulkOutcome::default();
        let mut changed = false;
        for &id in ids {
            match self.owned(id, user_id).await {
                Ok(notification) => {
                    if !notification.is_read {
                        match self.inner.store.mark_read(id).await {
                            Ok(()) => changed = true,
                            Err(e) => {
                                outcome.failed.push(BulkFailure {
                                    id,
                                    error: e.to_string(),
                                });
                                continue;
                            }
                        }
                    }
                    outcome.succeeded.push(id);
                }
                Err(e) => outcome.failed.push(BulkFailure {
                    id,
                    error: e.to_string(),
                }),
            }
        }
        if changed {
            self.notify_recipient(user_id).await;
        }
        outcome
    }

    /// Delete each id. Partial-success semantics like [`bulk_mark_as_read`].
    ///
    /// [`bulk_mark_as_read`]: NotificationService::bulk_mark_as_read
    pub async fn bulk_delete_notifications(&self, ids: &[Uuid], user_id: &str) -> BulkOutcome {
        let mut outcome = BulkOutcome::default();
        for &id in ids {
            let result = match self.owned(id, user_id).await {
                Ok(_) => self.inner.store.delete(id).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(()) => outcome.succeeded.push(id),
                Err(e) => outcome.failed.push(BulkFailure {
                    id,
                    error: e.to_string(),
                }),
            }
        }
        if !outcome.succeeded.is_empty() {
            self.notify_recipient(user_id).await;
        }
        outcome
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Point read, ownership-checked.
    pub async fn get_notification(&self, id: Uuid, user_id: &str) -> Result<Notification> {
        self.owned(id, user_id).await
    }

    /// Every notification for the user, archived included, oldest first.
    pub async fn get_notifications(&self, user_id: &str) -> Result<Vec<Notification>> {
        self.inner.store.list_by_recipient(user_id, true).await
    }

    /// Non-archived notifications only, oldest first.
    pub async fn get_active_notifications(&self, user_id: &str) -> Result<Vec<Notification>> {
        self.inner.store.list_by_recipient(user_id, false).await
    }

    /// Archived notifications only, oldest first.
    pub async fn get_archived_notifications(&self, user_id: &str) -> Result<Vec<Notification>> {
        let all = self.inner.store.list_by_recipient(user_id, true).await?;
        Ok(all.into_iter().filter(|n| n.is_archived).collect())
    }

    /// Unread count across the user's non-archived notifications.
    pub async fn get_unread_count(&self, user_id: &str) -> Result<i64> {
        self.inner.store.count_unread(user_id).await
    }

    // ------------------------------------------------------------------
    // Channel state and subscriptions
    // ------------------------------------------------------------------

    /// Current connection status.
    pub fn status(&self) -> ConnectionStatus {
        self.inner.monitor.status()
    }

    /// Override the channel state, interrupting pending transition timers.
    /// Listeners observe the transition like any other; forcing
    /// `connected` triggers a drain.
    pub fn force_connection_status(&self, status: ConnectionStatus) {
        self.inner.monitor.force_status(status);
    }

    /// Number of notifications waiting in the offline queue.
    pub fn offline_queue_len(&self) -> usize {
        self.inner.queue.len()
    }

    /// Subscribe to one recipient's notification-list refreshes.
    pub fn subscribe(&self, recipient_id: impl Into<String>) -> ListSubscription {
        self.inner.registry.subscribe(recipient_id)
    }

    /// Subscribe to connection-status transitions. The current status is
    /// delivered immediately.
    pub fn subscribe_connection(&self) -> ConnectionSubscription {
        self.inner.registry.subscribe_connection()
    }

    /// Subscribe to the real-time delivery signal. A cache-invalidation
    /// hint only; consumers re-query [`get_notifications`] for truth.
    ///
    /// [`get_notifications`]: NotificationService::get_notifications
    pub fn delivery_events(&self) -> broadcast::Receiver<DeliveryEvent> {
        self.inner.bus.subscribe()
    }

    /// Stop the monitor, cancel pending delivery timers, and drop every
    /// listener. Nothing fires after this returns; safe to call twice.
    pub async fn cleanup(&self) {
        self.inner.shutdown_tx.send_replace(true);
        self.inner.monitor.shutdown().await;
        self.inner.registry.clear();
        info!("notification service stopped");
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Fetch a notification and verify ownership. A record owned by
    /// someone else is reported as [`Error::NotFound`], not as a
    /// permission error, so ids cannot be probed across users.
    async fn owned(&self, id: Uuid, user_id: &str) -> Result<Notification> {
        match self.inner.store.get(id).await? {
            Some(n) if n.recipient_id == user_id => Ok(n),
            Some(_) | None => Err(Error::NotFound(id)),
        }
    }

    /// Push the recipient's refreshed active list to their subscribers.
    /// Best-effort: the push is a hint, so a read failure here is logged
    /// rather than failing the mutation that already committed.
    async fn notify_recipient(&self, recipient_id: &str) {
        match self.inner.store.list_by_recipient(recipient_id, false).await {
            Ok(list) => self.inner.registry.notify_lists(recipient_id, &list),
            Err(e) => {
                warn!(recipient_id = %recipient_id, error = %e, "list refresh for push failed");
            }
        }
    }

    /// Emit the delivery signal for one notification after a randomized
    /// delay. No ordering across concurrent deliveries. The timer races
    /// the shutdown watch so cleanup leaves nothing pending.
    fn schedule_delivery(&self, notification: Notification) {
        let mut shutdown_rx = self.inner.shutdown_tx.subscribe();
        if *shutdown_rx.borrow() {
            return;
        }

        let min = self.inner.config.delivery_delay_min.as_millis() as u64;
        let max = self.inner.config.delivery_delay_max.as_millis() as u64;
        let delay = Duration::from_millis(rand::thread_rng().gen_range(min..=max));
        let bus = self.inner.bus.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = sleep(delay) => {
                    debug!(
                        notification_id = %notification.id,
                        delay_ms = delay.as_millis() as u64,
                        "delivery signal emitted"
                    );
                    bus.emit(notification);
                }
                _ = shutdown_signalled(&mut shutdown_rx) => {}
            }
        });
    }
}

/// Reacts to monitor transitions: forwards each one to connection
/// listeners and drains the offline queue on entry to `connected`.
///
/// The watch channel coalesces transitions faster than the watcher loop:
/// listeners then observe only the latest of the back-to-back states, and
/// a `connected` window coalesced past defers the drain to the next
/// reconnect (queued items are still delivered, later). Monitor
/// timescales are orders of magnitude slower than one loop iteration, so
/// this only matters for adapters that flap the status programmatically.
async fn watch_connection(
    service: NotificationService,
    mut status_rx: watch::Receiver<ConnectionStatus>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            changed = status_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let status = *status_rx.borrow_and_update();
                info!(status = %status, "connection status changed");
                service.inner.registry.notify_connection(status);
                if status == ConnectionStatus::Connected {
                    if let Err(e) = service.drain_offline_queue().await {
                        error!(error = %e, "offline queue drain failed");
                    }
                }
            }
            _ = shutdown_signalled(&mut shutdown_rx) => break,
        }
    }
    debug!("connection watcher stopped");
}

/// Resolves once the shutdown flag is true (or the service is gone).
async fn shutdown_signalled(rx: &mut watch::Receiver<bool>) {
    while !*rx.borrow_and_update() {
        if rx.changed().await.is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use taskdeck_core::NotificationKind;
    use taskdeck_store::MemoryStore;

    fn fast_config() -> ServiceConfig {
        // Zero fault probability keeps the channel pinned to `connected`
        // unless a test forces it elsewhere.
        ServiceConfig::default()
            .with_delivery_delay(Duration::from_millis(5), Duration::from_millis(10))
            .with_connection(
                ConnectionConfig::default()
                    .with_fault_probability(0.0)
                    .with_heartbeat_interval(Duration::from_millis(10)),
            )
    }

    fn service() -> (NotificationService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let service = NotificationService::new(store.clone(), fast_config());
        (service, store)
    }

    fn delegated(recipient: &str) -> SendNotification {
        SendNotification::new(
            NotificationKind::TaskDelegated,
            recipient,
            "Task delegated",
            "Quarterly report was delegated to you",
        )
        .with_sender("u1")
        .with_metadata(json!({"task_title": "Quarterly report"}))
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_while_connected_persists_immediately() {
        let (service, _store) = service();
        let sent = service.send(delegated("u2")).await.unwrap();

        let list = service.get_notifications("u2").await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, sent.id);
        assert!(!list[0].is_read);
        assert_eq!(service.offline_queue_len(), 0);
        service.cleanup().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_rejects_invalid_input() {
        let (service, _store) = service();
        let err = service
            .send(SendNotification::new(
                NotificationKind::TaskUpdated,
                "",
                "title",
                "body",
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidNotification(_)));
        service.cleanup().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_while_disconnected_queues_without_persisting() {
        let (service, _store) = service();
        service.force_connection_status(ConnectionStatus::Disconnected);

        service.send(delegated("u2")).await.unwrap();
        assert_eq!(service.offline_queue_len(), 1);
        assert!(service.get_notifications("u2").await.unwrap().is_empty());
        service.cleanup().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_mark_as_read_idempotent() {
        let (service, _store) = service();
        let sent = service.send(delegated("u2")).await.unwrap();

        service.mark_as_read(sent.id, "u2").await.unwrap();
        let first = service.get_notification(sent.id, "u2").await.unwrap();
        assert!(first.is_read);
        let read_at = first.read_at.unwrap();

        service.mark_as_read(sent.id, "u2").await.unwrap();
        let second = service.get_notification(sent.id, "u2").await.unwrap();
        assert_eq!(second.read_at, Some(read_at));
        service.cleanup().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_ownership_check_reports_not_found() {
        let (service, _store) = service();
        let sent = service.send(delegated("u2")).await.unwrap();

        let err = service.mark_as_read(sent.id, "u3").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(id) if id == sent.id));
        // The record is untouched
        let n = service.get_notification(sent.id, "u2").await.unwrap();
        assert!(!n.is_read);
        service.cleanup().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_mark_all_as_read_counts_changes_only() {
        let (service, _store) = service();
        let a = service.send(delegated("u2")).await.unwrap();
        service.send(delegated("u2")).await.unwrap();
        service.mark_as_read(a.id, "u2").await.unwrap();

        let changed = service.mark_all_as_read("u2").await.unwrap();
        assert_eq!(changed, 1);
        assert_eq!(service.get_unread_count("u2").await.unwrap(), 0);

        // Second sweep finds nothing to change
        assert_eq!(service.mark_all_as_read("u2").await.unwrap(), 0);
        service.cleanup().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_then_operations_fail_not_found() {
        let (service, _store) = service();
        let sent = service.send(delegated("u2")).await.unwrap();

        service.delete_notification(sent.id, "u2").await.unwrap();
        let err = service.mark_as_read(sent.id, "u2").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        service.cleanup().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_delivery_signal_emitted_after_delay() {
        let (service, _store) = service();
        let mut events = service.delivery_events();

        let sent = service.send(delegated("u2")).await.unwrap();
        // Paused clock auto-advances to the pending delivery timer
        let event = events.recv().await.unwrap();
        assert_eq!(event.notification.id, sent.id);
        service.cleanup().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_cancels_pending_delivery() {
        let (service, _store) = service();
        let mut events = service.delivery_events();

        service.send(delegated("u2")).await.unwrap();
        service.cleanup().await;

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(matches!(
            events.try_recv(),
            Err(broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed)
        ));
        service.cleanup().await; // safe to call twice
    }

    #[tokio::test(start_paused = true)]
    async fn test_config_env_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.delivery_delay_min, Duration::from_millis(200));
        assert_eq!(config.delivery_delay_max, Duration::from_millis(1200));
        assert_eq!(config.retention_days, 30);
        assert!(config.offline_queue_capacity.is_none());
    }
}
