//! # taskdeck-store
//!
//! Notification store adapters for taskdeck.
//!
//! The durable store is an external collaborator reached through the
//! [`taskdeck_core::NotificationStore`] trait; this crate ships the
//! in-memory reference adapter used by single-process deployments and
//! tests.

pub mod memory;

pub use memory::MemoryStore;
