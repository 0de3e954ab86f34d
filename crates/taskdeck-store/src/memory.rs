//! In-memory notification store.
//!
//! Reference implementation of [`NotificationStore`] backing single-process
//! deployments and tests. The durable document store a production
//! deployment uses sits behind the same trait; this adapter keeps the full
//! contract (stable listing order, idempotent read transitions, archive as
//! soft removal) without external dependencies.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use taskdeck_core::{Error, Notification, NotificationStore, Result};

/// A stored record plus its insertion sequence number.
///
/// The sequence breaks `created_at` ties so listings are stable even when
/// several records are created within one clock tick (offline-queue drains
/// do exactly that).
#[derive(Debug, Clone)]
struct StoredRecord {
    notification: Notification,
    seq: u64,
}

#[derive(Default)]
struct MemoryInner {
    records: HashMap<Uuid, StoredRecord>,
    next_seq: u64,
}

/// In-memory [`NotificationStore`] implementation.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored records, across all recipients.
    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.records.is_empty()
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn put(&self, notification: Notification) -> Result<()> {
        let mut inner = self.inner.write().await;
        let seq = inner.next_seq;
        inner.next_seq += 1;
        debug!(notification_id = %notification.id, recipient_id = %notification.recipient_id, "store put");
        inner.records.insert(
            notification.id,
            StoredRecord { notification, seq },
        );
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Notification>> {
        let inner = self.inner.read().await;
        Ok(inner.records.get(&id).map(|r| r.notification.clone()))
    }

    async fn list_by_recipient(
        &self,
        recipient_id: &str,
        include_archived: bool,
    ) -> Result<Vec<Notification>> {
        let inner = self.inner.read().await;
        let mut matches: Vec<&StoredRecord> = inner
            .records
            .values()
            .filter(|r| r.notification.recipient_id == recipient_id)
            .filter(|r| include_archived || !r.notification.is_archived)
            .collect();
        matches.sort_by_key(|r| (r.notification.created_at, r.seq));
        Ok(matches.iter().map(|r| r.notification.clone()).collect())
    }

    async fn count_unread(&self, recipient_id: &str) -> Result<i64> {
        let inner = self.inner.read().await;
        let count = inner
            .records
            .values()
            .filter(|r| {
                r.notification.recipient_id == recipient_id
                    && !r.notification.is_read
                    && !r.notification.is_archived
            })
            .count();
        Ok(count as i64)
    }

    async fn mark_read(&self, id: Uuid) -> Result<()> {
        let mut inner = self.inner.write().await;
        let record = inner.records.get_mut(&id).ok_or(Error::NotFound(id))?;
        if !record.notification.is_read {
            record.notification.is_read = true;
            record.notification.read_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn mark_unread(&self, id: Uuid) -> Result<()> {
        let mut inner = self.inner.write().await;
        let record = inner.records.get_mut(&id).ok_or(Error::NotFound(id))?;
        record.notification.is_read = false;
        record.notification.read_at = None;
        Ok(())
    }

    async fn archive(&self, id: Uuid) -> Result<()> {
        let mut inner = self.inner.write().await;
        let record = inner.records.get_mut(&id).ok_or(Error::NotFound(id))?;
        if !record.notification.is_archived {
            record.notification.is_archived = true;
            record.notification.archived_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.records.remove(&id).ok_or(Error::NotFound(id))?;
        Ok(())
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<Vec<String>> {
        let mut inner = self.inner.write().await;
        let doomed: Vec<Uuid> = inner
            .records
            .values()
            .filter(|r| r.notification.created_at < cutoff)
            .map(|r| r.notification.id)
            .collect();

        let mut affected: Vec<String> = Vec::new();
        for id in doomed {
            if let Some(record) = inner.records.remove(&id) {
                if !affected.contains(&record.notification.recipient_id) {
                    affected.push(record.notification.recipient_id);
                }
            }
        }
        debug!(purged_recipients = affected.len(), %cutoff, "store purge");
        Ok(affected)
    }
}
