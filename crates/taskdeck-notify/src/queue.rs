//! FIFO buffer for notifications created while the channel is offline.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tracing::debug;

use taskdeck_core::{Error, Notification, Result};

/// FIFO queue holding notifications until the channel reconnects.
///
/// Unbounded by default. When a capacity is configured, `enqueue` fails
/// with [`Error::QueueOverflow`] once the bound is reached — backpressure
/// is an explicit deployment choice, not the baseline.
#[derive(Clone)]
pub struct OfflineQueue {
    inner: Arc<Mutex<VecDeque<Notification>>>,
    capacity: Option<usize>,
}

impl OfflineQueue {
    /// Create an unbounded queue.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::new())),
            capacity: None,
        }
    }

    /// Create a bounded queue that rejects enqueues past `capacity`.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity: Some(capacity),
        }
    }

    /// Append a notification at the tail.
    pub fn enqueue(&self, notification: Notification) -> Result<()> {
        let mut queue = self.inner.lock().expect("offline queue poisoned");
        if let Some(capacity) = self.capacity {
            if queue.len() >= capacity {
                return Err(Error::QueueOverflow(capacity));
            }
        }
        queue.push_back(notification);
        debug!(queue_depth = queue.len(), "notification queued offline");
        Ok(())
    }

    /// Atomically take every queued item in FIFO order, leaving the queue
    /// empty. No item is ever returned twice across calls, and none is
    /// lost.
    pub fn drain_all(&self) -> Vec<Notification> {
        let mut queue = self.inner.lock().expect("offline queue poisoned");
        queue.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("offline queue poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for OfflineQueue {
    fn default() -> Self {
        Self::new()
    }
}
