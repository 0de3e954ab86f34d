//! Construction and validation of notification records.
//!
//! The factory is the single place notification records are built: it
//! generates the id and creation timestamp, populates defaults, and runs
//! validation. A record that fails validation is rejected — callers must
//! never persist or broadcast it.

use chrono::Utc;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Notification, SendNotification};

/// Stateless factory for notification records.
pub struct NotificationFactory;

impl NotificationFactory {
    /// Build and validate a notification from a send request.
    ///
    /// Pure aside from id and timestamp generation. Fails with
    /// [`Error::InvalidNotification`] when a required field is blank.
    pub fn create(req: SendNotification) -> Result<Notification> {
        validate(&req)?;

        Ok(Notification {
            id: Uuid::new_v4(),
            kind: req.kind,
            title: req.title,
            message: req.message,
            recipient_id: req.recipient_id,
            sender_id: req.sender_id,
            resource_id: req.resource_id,
            resource_type: req.resource_type,
            is_read: false,
            read_at: None,
            is_archived: false,
            archived_at: None,
            created_at: Utc::now(),
            metadata: req.metadata.unwrap_or_else(|| JsonValue::Object(Default::default())),
        })
    }
}

fn validate(req: &SendNotification) -> Result<()> {
    if req.recipient_id.trim().is_empty() {
        return Err(Error::InvalidNotification(
            "recipient_id is required".to_string(),
        ));
    }
    if req.title.trim().is_empty() {
        return Err(Error::InvalidNotification("title is required".to_string()));
    }
    if req.message.trim().is_empty() {
        return Err(Error::InvalidNotification(
            "message is required".to_string(),
        ));
    }
    Ok(())
}
