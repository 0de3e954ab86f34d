//! Connection state machine for the simulated real-time channel.
//!
//! The monitor runs as a background task cycling through
//! `connected → disconnected → connecting → connected`. Faults are
//! injected on heartbeat ticks with a configurable probability; recovery
//! is automatic and time-bounded — there is no manual retry. The current
//! status is published through a watch channel so late subscribers always
//! observe the current state.
//!
//! Fault injection is a simulation artifact of the demo channel. A
//! production deployment replaces it with real connectivity detection
//! while keeping the same state machine shape and recovery contract.

use std::time::Duration;

use rand::Rng;
use tokio::sync::{mpsc, watch};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use taskdeck_core::{defaults, ConnectionStatus};

/// Configuration for the connection monitor.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Interval between heartbeat ticks while connected.
    pub heartbeat_interval: Duration,
    /// Probability (0.0–1.0) that a heartbeat tick drops the channel.
    pub fault_probability: f64,
    /// Lower bound of the randomized disconnected window.
    pub reconnect_delay_min: Duration,
    /// Upper bound of the randomized disconnected window.
    pub reconnect_delay_max: Duration,
    /// Fixed duration of the connecting state.
    pub connecting_duration: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_millis(defaults::HEARTBEAT_INTERVAL_MS),
            fault_probability: defaults::FAULT_PROBABILITY,
            reconnect_delay_min: Duration::from_millis(defaults::RECONNECT_DELAY_MIN_MS),
            reconnect_delay_max: Duration::from_millis(defaults::RECONNECT_DELAY_MAX_MS),
            connecting_duration: Duration::from_millis(defaults::CONNECTING_DURATION_MS),
        }
    }
}

impl ConnectionConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `NOTIFY_HEARTBEAT_INTERVAL_MS` | `10000` | Heartbeat tick interval |
    /// | `NOTIFY_FAULT_PROBABILITY` | `0.05` | Disconnect chance per tick |
    /// | `NOTIFY_RECONNECT_MIN_MS` | `2000` | Min disconnected duration |
    /// | `NOTIFY_RECONNECT_MAX_MS` | `5000` | Max disconnected duration |
    /// | `NOTIFY_CONNECTING_MS` | `1000` | Connecting state duration |
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(ms) = env_u64("NOTIFY_HEARTBEAT_INTERVAL_MS") {
            config.heartbeat_interval = Duration::from_millis(ms);
        }
        if let Ok(val) = std::env::var("NOTIFY_FAULT_PROBABILITY") {
            if let Ok(p) = val.parse::<f64>() {
                config.fault_probability = p.clamp(0.0, 1.0);
            } else {
                tracing::warn!(value = %val, "Invalid NOTIFY_FAULT_PROBABILITY, using default");
            }
        }
        if let Some(ms) = env_u64("NOTIFY_RECONNECT_MIN_MS") {
            config.reconnect_delay_min = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64("NOTIFY_RECONNECT_MAX_MS") {
            config.reconnect_delay_max = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64("NOTIFY_CONNECTING_MS") {
            config.connecting_duration = Duration::from_millis(ms);
        }

        if config.reconnect_delay_max < config.reconnect_delay_min {
            config.reconnect_delay_max = config.reconnect_delay_min;
        }
        config
    }

    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    pub fn with_fault_probability(mut self, probability: f64) -> Self {
        self.fault_probability = probability.clamp(0.0, 1.0);
        self
    }

    pub fn with_reconnect_window(mut self, min: Duration, max: Duration) -> Self {
        self.reconnect_delay_min = min;
        self.reconnect_delay_max = max.max(min);
        self
    }

    pub fn with_connecting_duration(mut self, duration: Duration) -> Self {
        self.connecting_duration = duration;
        self
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.parse::<u64>().ok())
}

/// Handle to the running connection state machine.
///
/// Dropping the monitor does not stop the task; call [`shutdown`] for a
/// clean stop (the service does this from `cleanup`).
///
/// [`shutdown`]: ConnectionMonitor::shutdown
pub struct ConnectionMonitor {
    status_tx: watch::Sender<ConnectionStatus>,
    shutdown_tx: mpsc::Sender<()>,
}

impl ConnectionMonitor {
    /// Start the state machine in the initial `connected` state.
    pub fn spawn(config: ConnectionConfig) -> Self {
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Connected);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let loop_tx = status_tx.clone();
        tokio::spawn(run(config, loop_tx, status_rx, shutdown_rx));

        Self {
            status_tx,
            shutdown_tx,
        }
    }

    /// Current connection status.
    pub fn status(&self) -> ConnectionStatus {
        *self.status_tx.borrow()
    }

    /// Subscribe to status transitions. The receiver's current value is the
    /// live status, so subscribers never miss the present state.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_tx.subscribe()
    }

    /// Override the current status, interrupting any pending transition
    /// timer. Used by tests and the simulation example.
    pub fn force_status(&self, status: ConnectionStatus) {
        info!(status = %status, "connection status forced");
        self.status_tx.send_replace(status);
    }

    /// Stop the state machine. No transition fires after this returns a
    /// delivered signal; pending timers are dropped with the task.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

/// The monitor loop. Re-reads the watch each iteration so forced status
/// changes take effect even mid-sleep.
async fn run(
    config: ConnectionConfig,
    status_tx: watch::Sender<ConnectionStatus>,
    mut status_rx: watch::Receiver<ConnectionStatus>,
    mut shutdown_rx: mpsc::Receiver<()>,
) {
    info!(
        heartbeat_ms = config.heartbeat_interval.as_millis() as u64,
        fault_probability = config.fault_probability,
        "connection monitor started"
    );

    loop {
        let current = *status_rx.borrow_and_update();
        match current {
            ConnectionStatus::Connected => {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    _ = status_rx.changed() => {}
                    _ = sleep(config.heartbeat_interval) => {
                        let roll: f64 = rand::thread_rng().gen();
                        if roll < config.fault_probability {
                            warn!(status = "disconnected", "heartbeat fault injected, channel dropped");
                            status_tx.send_replace(ConnectionStatus::Disconnected);
                        }
                    }
                }
            }
            ConnectionStatus::Disconnected => {
                let min = config.reconnect_delay_min.as_millis() as u64;
                let max = config.reconnect_delay_max.as_millis() as u64;
                let delay = Duration::from_millis(rand::thread_rng().gen_range(min..=max));
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    _ = status_rx.changed() => {}
                    _ = sleep(delay) => {
                        debug!(status = "connecting", "reconnect window elapsed");
                        status_tx.send_replace(ConnectionStatus::Connecting);
                    }
                }
            }
            ConnectionStatus::Connecting => {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    _ = status_rx.changed() => {}
                    _ = sleep(config.connecting_duration) => {
                        info!(status = "connected", "channel re-established");
                        status_tx.send_replace(ConnectionStatus::Connected);
                    }
                }
            }
            // No automatic recovery out of the error state; only an
            // explicit force_status or shutdown moves the machine.
            ConnectionStatus::Error => {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    _ = status_rx.changed() => {}
                }
            }
        }
    }

    debug!("connection monitor stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> ConnectionConfig {
        ConnectionConfig::default()
            .with_heartbeat_interval(Duration::from_millis(10))
            .with_reconnect_window(Duration::from_millis(20), Duration::from_millis(50))
            .with_connecting_duration(Duration::from_millis(10))
    }

    #[test]
    fn test_config_default_values() {
        let config = ConnectionConfig::default();
        assert_eq!(config.heartbeat_interval, Duration::from_secs(10));
        assert!((config.fault_probability - 0.05).abs() < f64::EPSILON);
        assert_eq!(config.reconnect_delay_min, Duration::from_secs(2));
        assert_eq!(config.reconnect_delay_max, Duration::from_secs(5));
        assert_eq!(config.connecting_duration, Duration::from_secs(1));
    }

    #[test]
    fn test_config_builder_chaining() {
        let config = ConnectionConfig::default()
            .with_heartbeat_interval(Duration::from_millis(100))
            .with_fault_probability(1.5)
            .with_reconnect_window(Duration::from_millis(30), Duration::from_millis(10))
            .with_connecting_duration(Duration::from_millis(5));

        assert_eq!(config.heartbeat_interval, Duration::from_millis(100));
        // Probability clamped into [0, 1]
        assert!((config.fault_probability - 1.0).abs() < f64::EPSILON);
        // Window max never below min
        assert_eq!(config.reconnect_delay_max, config.reconnect_delay_min);
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_state_is_connected() {
        let monitor = ConnectionMonitor::spawn(fast_config().with_fault_probability(0.0));
        assert_eq!(monitor.status(), ConnectionStatus::Connected);
        monitor.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_disconnects_with_zero_probability() {
        let monitor = ConnectionMonitor::spawn(fast_config().with_fault_probability(0.0));
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(monitor.status(), ConnectionStatus::Connected);
        monitor.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_fault_then_automatic_recovery() {
        let monitor = ConnectionMonitor::spawn(fast_config().with_fault_probability(1.0));

        let mut rx = monitor.subscribe();
        // First heartbeat must drop the channel
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), ConnectionStatus::Disconnected);

        // Recovery is automatic: disconnected → connecting → connected
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), ConnectionStatus::Connecting);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), ConnectionStatus::Connected);

        monitor.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_status_interrupts_pending_timer() {
        let monitor = ConnectionMonitor::spawn(fast_config().with_fault_probability(0.0));

        monitor.force_status(ConnectionStatus::Disconnected);
        assert_eq!(monitor.status(), ConnectionStatus::Disconnected);

        // The machine resumes its cycle from the forced state
        let mut rx = monitor.subscribe();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), ConnectionStatus::Connecting);

        monitor.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_state_has_no_automatic_recovery() {
        let monitor = ConnectionMonitor::spawn(fast_config().with_fault_probability(0.0));
        monitor.force_status(ConnectionStatus::Error);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(monitor.status(), ConnectionStatus::Error);

        monitor.force_status(ConnectionStatus::Connected);
        tokio::task::yield_now().await;
        assert_eq!(monitor.status(), ConnectionStatus::Connected);
        monitor.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_transitions_after_shutdown() {
        let monitor = ConnectionMonitor::spawn(fast_config().with_fault_probability(1.0));
        monitor.shutdown().await;
        tokio::task::yield_now().await;

        let status = monitor.status();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(monitor.status(), status);
    }
}
