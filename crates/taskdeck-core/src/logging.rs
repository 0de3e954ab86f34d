//! Structured logging schema and field name constants for taskdeck.
//!
//! All crates use these constants for consistent structured logging fields
//! so log aggregation tools can query by standardized names across every
//! subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), state transitions |
//! | DEBUG | Decision points, queue depth changes, emissions |
//! | TRACE | Per-item iteration (drain items, listener fan-out) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "notify", "store", "monitor"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "service", "offline_queue", "registry", "delivery_bus"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "send", "broadcast", "drain", "mark_read"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Notification UUID being operated on.
pub const NOTIFICATION_ID: &str = "notification_id";

/// Owning recipient of the record(s) being operated on.
pub const RECIPIENT_ID: &str = "recipient_id";

/// Notification kind wire name.
pub const KIND: &str = "kind";

// ─── State fields ──────────────────────────────────────────────────────────

/// Connection status wire name ("connected", "connecting", ...).
pub const STATUS: &str = "status";

/// Number of records currently held in the offline queue.
pub const QUEUE_DEPTH: &str = "queue_depth";

/// Number of records flushed by a drain.
pub const DRAINED: &str = "drained";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of listeners notified by a fan-out.
pub const LISTENER_COUNT: &str = "listener_count";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
