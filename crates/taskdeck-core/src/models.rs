//! Domain models for the notification subsystem.
//!
//! A [`Notification`] is a persisted record describing one event relevant to
//! one recipient. A [`Broadcast`] is an ephemeral value object fanning one
//! logical event out into N per-recipient notifications; it is never stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Kind of domain event a notification describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    TaskDelegated,
    TaskCompleted,
    TaskUpdated,
    CommentMention,
    CommentReply,
    DelegationRevoked,
}

impl NotificationKind {
    /// Wire name used in serialized payloads and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::TaskDelegated => "task_delegated",
            NotificationKind::TaskCompleted => "task_completed",
            NotificationKind::TaskUpdated => "task_updated",
            NotificationKind::CommentMention => "comment_mention",
            NotificationKind::CommentReply => "comment_reply",
            NotificationKind::DelegationRevoked => "delegation_revoked",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current state of the simulated real-time channel.
///
/// Exactly one value is current at any instant; transitions are serialized
/// by the connection monitor. `Error` is reserved for non-recoverable
/// channel failures — the simulated monitor never enters it, but consumers
/// must handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Connected,
    Connecting,
    Disconnected,
    Error,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted notification record owned by one recipient.
///
/// Invariants: `read_at` is set iff `is_read`; `archived_at` is set iff
/// `is_archived`; `id` and `created_at` never change after creation.
/// Archival is orthogonal to read state — it removes the record from
/// active views without deleting it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    /// Owning user.
    pub recipient_id: String,
    /// Actor who triggered the event, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<String>,
    /// Link to the task/comment/project that caused the notification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    pub is_read: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_at: Option<DateTime<Utc>>,
    pub is_archived: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Free-form event payload (task title, actor name, etc.) — opaque to
    /// the core, passed through unchanged.
    pub metadata: JsonValue,
}

/// Request for creating a new notification.
#[derive(Debug, Clone)]
pub struct SendNotification {
    pub kind: NotificationKind,
    pub recipient_id: String,
    pub title: String,
    pub message: String,
    pub sender_id: Option<String>,
    pub resource_id: Option<String>,
    pub resource_type: Option<String>,
    pub metadata: Option<JsonValue>,
}

impl SendNotification {
    /// Minimal request with only the required fields set.
    pub fn new(
        kind: NotificationKind,
        recipient_id: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            recipient_id: recipient_id.into(),
            title: title.into(),
            message: message.into(),
            sender_id: None,
            resource_id: None,
            resource_type: None,
            metadata: None,
        }
    }

    pub fn with_sender(mut self, sender_id: impl Into<String>) -> Self {
        self.sender_id = Some(sender_id.into());
        self
    }

    pub fn with_resource(
        mut self,
        resource_id: impl Into<String>,
        resource_type: impl Into<String>,
    ) -> Self {
        self.resource_id = Some(resource_id.into());
        self.resource_type = Some(resource_type.into());
        self
    }

    pub fn with_metadata(mut self, metadata: JsonValue) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// One logical event fanned out into multiple per-recipient notifications.
///
/// Ephemeral — exists only for the duration of a `broadcast` call.
#[derive(Debug, Clone)]
pub struct Broadcast {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub payload: JsonValue,
    pub timestamp: DateTime<Utc>,
    pub recipients: Vec<String>,
}

/// Per-item failure within a bulk operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkFailure {
    pub id: Uuid,
    pub error: String,
}

/// Outcome of a bulk operation. A failure on one id never blocks the rest;
/// callers always learn which ids failed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkOutcome {
    pub succeeded: Vec<Uuid>,
    pub failed: Vec<BulkFailure>,
}

impl BulkOutcome {
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Per-recipient failure within a broadcast fan-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastFailure {
    pub recipient_id: String,
    pub error: String,
}

/// Outcome of a broadcast fan-out. Each recipient's delivery is independent;
/// one invalid record never blocks the others.
#[derive(Debug, Clone, Default)]
pub struct BroadcastOutcome {
    pub delivered: Vec<Notification>,
    pub failed: Vec<BroadcastFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_wire_names() {
        assert_eq!(NotificationKind::TaskDelegated.as_str(), "task_delegated");
        assert_eq!(NotificationKind::TaskCompleted.as_str(), "task_completed");
        assert_eq!(NotificationKind::TaskUpdated.as_str(), "task_updated");
        assert_eq!(NotificationKind::CommentMention.as_str(), "comment_mention");
        assert_eq!(NotificationKind::CommentReply.as_str(), "comment_reply");
        assert_eq!(
            NotificationKind::DelegationRevoked.as_str(),
            "delegation_revoked"
        );
    }

    #[test]
    fn test_kind_serde_round_trip() {
        let json = serde_json::to_string(&NotificationKind::CommentMention).unwrap();
        assert_eq!(json, r#""comment_mention""#);
        let kind: NotificationKind = serde_json::from_str(&json).unwrap();
        assert_eq!(kind, NotificationKind::CommentMention);
    }

    #[test]
    fn test_connection_status_display() {
        assert_eq!(ConnectionStatus::Connected.to_string(), "connected");
        assert_eq!(ConnectionStatus::Connecting.to_string(), "connecting");
        assert_eq!(ConnectionStatus::Disconnected.to_string(), "disconnected");
        assert_eq!(ConnectionStatus::Error.to_string(), "error");
    }

    #[test]
    fn test_send_notification_builder() {
        let req = SendNotification::new(
            NotificationKind::TaskDelegated,
            "u2",
            "Task delegated",
            "Alice delegated a task to you",
        )
        .with_sender("u1")
        .with_resource("task-9", "task")
        .with_metadata(json!({"task_title": "Quarterly report"}));

        assert_eq!(req.recipient_id, "u2");
        assert_eq!(req.sender_id.as_deref(), Some("u1"));
        assert_eq!(req.resource_id.as_deref(), Some("task-9"));
        assert_eq!(req.resource_type.as_deref(), Some("task"));
        assert_eq!(req.metadata.unwrap()["task_title"], "Quarterly report");
    }

    #[test]
    fn test_notification_serialization_skips_none() {
        let n = Notification {
            id: Uuid::nil(),
            kind: NotificationKind::TaskUpdated,
            title: "t".to_string(),
            message: "m".to_string(),
            recipient_id: "u1".to_string(),
            sender_id: None,
            resource_id: None,
            resource_type: None,
            is_read: false,
            read_at: None,
            is_archived: false,
            archived_at: None,
            created_at: Utc::now(),
            metadata: json!({}),
        };
        let json = serde_json::to_string(&n).unwrap();
        assert!(!json.contains("sender_id"));
        assert!(!json.contains("read_at"));
        assert!(json.contains(r#""kind":"task_updated""#));
        assert!(json.contains(r#""is_read":false"#));
    }

    #[test]
    fn test_bulk_outcome_complete_success() {
        let outcome = BulkOutcome {
            succeeded: vec![Uuid::new_v4()],
            failed: vec![],
        };
        assert!(outcome.is_complete_success());

        let outcome = BulkOutcome {
            succeeded: vec![],
            failed: vec![BulkFailure {
                id: Uuid::new_v4(),
                error: "not found".to_string(),
            }],
        };
        assert!(!outcome.is_complete_success());
    }
}
