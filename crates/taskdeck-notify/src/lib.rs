//! # taskdeck-notify
//!
//! Notification delivery and connection-state engine for taskdeck.
//!
//! The [`NotificationService`] is the entry point: it builds and validates
//! notifications, persists them through a [`NotificationStore`] adapter,
//! buffers them in an [`OfflineQueue`] while the channel is down, and fans
//! list refreshes and connection transitions out to subscribers through
//! the [`SubscriptionRegistry`]. The [`ConnectionMonitor`] drives the
//! simulated channel's `connected → disconnected → connecting → connected`
//! cycle with configurable fault injection.
//!
//! [`NotificationStore`]: taskdeck_core::NotificationStore

pub mod monitor;
pub mod queue;
pub mod registry;
pub mod service;

pub use monitor::{ConnectionConfig, ConnectionMonitor};
pub use queue::OfflineQueue;
pub use registry::{ConnectionSubscription, ListSubscription, SubscriptionRegistry};
pub use service::{NotificationService, ServiceConfig};
