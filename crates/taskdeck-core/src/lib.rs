//! # taskdeck-core
//!
//! Core types, traits, and abstractions for the taskdeck notification
//! subsystem.
//!
//! This crate provides the foundational data structures and trait
//! definitions that the store adapters and the notification service
//! depend on.

pub mod defaults;
pub mod error;
pub mod events;
pub mod factory;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use events::{DeliveryBus, DeliveryEvent};
pub use factory::NotificationFactory;
pub use models::{
    Broadcast, BroadcastFailure, BroadcastOutcome, BulkFailure, BulkOutcome, ConnectionStatus,
    Notification, NotificationKind, SendNotification,
};
pub use traits::NotificationStore;
