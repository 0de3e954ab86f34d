//! Centralized default constants for the taskdeck notification subsystem.
//!
//! **This module is the single source of truth** for all shared default
//! values. Crates reference these constants instead of defining their own
//! magic numbers. All of them are configuration knobs, not hardcoded
//! behavior — see `ConnectionConfig` and `ServiceConfig` for the
//! environment-variable overrides.

// =============================================================================
// CONNECTION MONITOR
// =============================================================================

/// Heartbeat tick interval in milliseconds. Each tick while connected rolls
/// the fault-injection dice once.
pub const HEARTBEAT_INTERVAL_MS: u64 = 10_000;

/// Probability that a heartbeat tick injects a transient disconnect.
///
/// A simulation artifact of the demo channel: production deployments
/// replace fault injection with real connectivity detection but keep the
/// same state machine shape and automatic-recovery contract.
pub const FAULT_PROBABILITY: f64 = 0.05;

/// Lower bound of the randomized disconnected window in milliseconds.
pub const RECONNECT_DELAY_MIN_MS: u64 = 2_000;

/// Upper bound of the randomized disconnected window in milliseconds.
pub const RECONNECT_DELAY_MAX_MS: u64 = 5_000;

/// Fixed duration of the connecting state in milliseconds.
pub const CONNECTING_DURATION_MS: u64 = 1_000;

// =============================================================================
// DELIVERY
// =============================================================================

/// Lower bound of the simulated per-notification delivery delay (ms).
pub const DELIVERY_DELAY_MIN_MS: u64 = 200;

/// Upper bound of the simulated per-notification delivery delay (ms).
pub const DELIVERY_DELAY_MAX_MS: u64 = 1_200;

/// Default delivery bus broadcast channel capacity.
pub const DELIVERY_BUS_CAPACITY: usize = 256;

// =============================================================================
// RETENTION
// =============================================================================

/// Age in days past which `archive_old_notifications` moves records out of
/// active views by default.
pub const ARCHIVE_AFTER_DAYS: i64 = 7;

/// Age in days past which `clear_old_notifications` hard-deletes records.
/// Distinct from archiving: purged records are gone.
pub const RETENTION_DAYS: i64 = 30;
