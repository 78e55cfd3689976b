//! # Broadcast bus for lifecycle events.
//!
//! [`Bus`] wraps [`tokio::sync::broadcast`] so routines and channels can report lifecycle
//! transitions to any number of observers without ever blocking the data path.
//!
//! ```text
//! Publishers (many):                    Observers (many):
//!   go_with(.., bus) ──┐                  ┌──► audit log
//!   go_with(.., bus) ──┼──► Bus ──────────┼──► test assertions
//!   Channel::close ────┘ (broadcast)      └──► dashboards
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never waits and never fails.
//! - **Bounded capacity**: lagging observers get `RecvError::Lagged(n)` and skip `n` events.
//! - **No persistence**: events published with no observer are dropped.

use tokio::sync::broadcast;

use super::event::Event;

/// Default ring-buffer size used by [`Bus::default`].
const DEFAULT_CAPACITY: usize = 1024;

/// Broadcast channel for lifecycle events.
///
/// Cheap to clone; every clone publishes into the same ring buffer.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given ring-buffer capacity (clamped to at least 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all current observers.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a receiver observing events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Returns the number of live observers.
    pub fn observer_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
