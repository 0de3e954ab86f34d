//! Core traits for taskdeck abstractions.
//!
//! These traits define the interfaces that concrete implementations
//! must satisfy, enabling pluggable backends and testability.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::Notification;

/// Durable keyed storage for notification records.
///
/// The notification service is the only component permitted to mutate the
/// store. Implementations must serialize operations on a given id; no
/// ordering is required across different ids. A multi-instance deployment
/// needs the backend itself to provide those guarantees (e.g. a
/// transactional store) — the baseline assumes a single process.
///
/// Failures are surfaced as [`crate::Error::Storage`] and propagated
/// unchanged by the service; retry policy, if any, belongs to the adapter.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Insert a notification record.
    async fn put(&self, notification: Notification) -> Result<()>;

    /// Fetch a record by id.
    async fn get(&self, id: Uuid) -> Result<Option<Notification>>;

    /// List a recipient's records ordered oldest-first (stable order).
    /// Archived records are excluded unless `include_archived` is set.
    async fn list_by_recipient(
        &self,
        recipient_id: &str,
        include_archived: bool,
    ) -> Result<Vec<Notification>>;

    /// Count a recipient's unread, non-archived records.
    async fn count_unread(&self, recipient_id: &str) -> Result<i64>;

    /// Mark a record read, setting `read_at` on the first transition only.
    /// Idempotent: marking an already-read record leaves `read_at` unchanged.
    async fn mark_read(&self, id: Uuid) -> Result<()>;

    /// Mark a record unread, clearing `read_at`.
    async fn mark_unread(&self, id: Uuid) -> Result<()>;

    /// Move a record into the archived state without deleting it.
    async fn archive(&self, id: Uuid) -> Result<()>;

    /// Permanently remove a record.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Hard-delete every record created before `cutoff`, across all
    /// recipients. Returns the distinct recipient ids that lost records.
    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<Vec<String>>;
}
