//! Error types for the taskdeck notification subsystem.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias using taskdeck's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for notification operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Factory validation failure (missing required field, blank recipient).
    /// Non-retryable; the caller must fix the triggering event.
    #[error("Invalid notification data: {0}")]
    InvalidNotification(String),

    /// Operation referenced a non-existent or already-deleted notification.
    #[error("Notification not found: {0}")]
    NotFound(Uuid),

    /// Offline queue is full (only when an explicit capacity is configured).
    #[error("Offline queue overflow: capacity {0} reached")]
    QueueOverflow(usize),

    /// Storage backend failure, propagated unchanged from the store adapter.
    /// The service does not retry; retry policy belongs to the adapter.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Transient channel fault. Internal to the service; never surfaced by
    /// `send` — the only observable effect is queued (delayed) delivery.
    /// Reserved for channel adapters that detect real connectivity
    /// failures; the simulated monitor recovers through queuing alone and
    /// does not construct it.
    #[error("Connection fault: {0}")]
    ConnectionFault(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Internal(format!("serialization: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_notification() {
        let err = Error::InvalidNotification("recipient_id is required".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid notification data: recipient_id is required"
        );
    }

    #[test]
    fn test_error_display_not_found() {
        let id = Uuid::nil();
        let err = Error::NotFound(id);
        assert_eq!(err.to_string(), format!("Notification not found: {}", id));
    }

    #[test]
    fn test_error_display_queue_overflow() {
        let err = Error::QueueOverflow(128);
        assert_eq!(
            err.to_string(),
            "Offline queue overflow: capacity 128 reached"
        );
    }

    #[test]
    fn test_error_display_storage() {
        let err = Error::Storage("backend unavailable".to_string());
        assert_eq!(err.to_string(), "Storage error: backend unavailable");
    }

    #[test]
    fn test_error_display_connection_fault() {
        let err = Error::ConnectionFault("heartbeat missed".to_string());
        assert_eq!(err.to_string(), "Connection fault: heartbeat missed");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Internal(msg) => assert!(msg.starts_with("serialization:")),
            _ => panic!("Expected Internal error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn test_result_type_ok() {
        fn get_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(get_result().unwrap(), 42);
    }
}
