//! # Queue slots and rendezvous handoff.
//!
//! Buffered channels enqueue plain slots. A zero-capacity channel attaches a [`Handoff`] to
//! every slot: the sender waits until a receiver takes the value, and if closing fires first
//! it withdraws the value instead.
//!
//! ```text
//!               take()            withdraw()
//!   PENDING ─────────► TAKEN      PENDING ─────────► WITHDRAWN
//!            (receiver wins)                (sender wins on close)
//! ```
//!
//! Exactly one side wins the transition, so a withdrawn value is never delivered and a taken
//! value is never reported as failed.

use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use tokio::sync::Notify;

use super::value::Value;

const PENDING: u8 = 0;
const TAKEN: u8 = 1;
const WITHDRAWN: u8 = 2;

pub(crate) struct Handoff {
    state: AtomicU8,
    taken: Notify,
}

impl Handoff {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: AtomicU8::new(PENDING),
            taken: Notify::new(),
        })
    }

    /// Receiver side: claims the value. Returns `false` if the sender already withdrew it.
    pub fn take(&self) -> bool {
        let won = self
            .state
            .compare_exchange(PENDING, TAKEN, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if won {
            self.taken.notify_one();
        }
        won
    }

    /// Sender side: withdraws the value. Returns `false` if a receiver already took it.
    pub fn withdraw(&self) -> bool {
        self.state
            .compare_exchange(PENDING, WITHDRAWN, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Resolves once a receiver has taken the value.
    pub async fn taken(&self) {
        self.taken.notified().await;
    }
}

/// Sender-side hold on a queued rendezvous value.
///
/// Dropping it withdraws the value unless a receiver already took it, so a `send` future
/// cancelled mid-wait never delivers.
pub(crate) struct PendingHandoff {
    handoff: Arc<Handoff>,
}

impl PendingHandoff {
    pub fn new(handoff: Arc<Handoff>) -> Self {
        Self { handoff }
    }
}

impl Deref for PendingHandoff {
    type Target = Handoff;

    fn deref(&self) -> &Handoff {
        &self.handoff
    }
}

impl Drop for PendingHandoff {
    fn drop(&mut self) {
        self.handoff.withdraw();
    }
}

pub(crate) struct Slot<T> {
    value: Value<T>,
    handoff: Option<Arc<Handoff>>,
}

impl<T> Slot<T> {
    pub fn new(value: Value<T>, handoff: Option<Arc<Handoff>>) -> Self {
        Self { value, handoff }
    }

    /// Returns the value unless its rendezvous sender withdrew it.
    pub fn claim(self) -> Option<Value<T>> {
        match &self.handoff {
            Some(handoff) if !handoff.take() => None,
            _ => Some(self.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;

    #[test]
    fn test_take_then_withdraw() {
        let h = Handoff::new();
        assert!(h.take());
        assert!(!h.withdraw());
        assert!(!h.take());
    }

    #[test]
    fn test_withdraw_then_take() {
        let h = Handoff::new();
        assert!(h.withdraw());
        assert!(!h.take());
    }

    #[test]
    fn test_withdrawn_slot_yields_nothing() {
        let h = Handoff::new();
        let slot = Slot::new(Value::new(Context::background(), 1), Some(Arc::clone(&h)));
        assert!(h.withdraw());
        assert!(slot.claim().is_none());

        let plain = Slot::new(Value::new(Context::background(), 2), None);
        assert_eq!(plain.claim().map(Value::into_data), Some(2));
    }

    #[test]
    fn test_dropped_pending_withdraws() {
        let h = Handoff::new();
        let slot = Slot::new(Value::new(Context::background(), 1), Some(Arc::clone(&h)));
        drop(PendingHandoff::new(Arc::clone(&h)));
        assert!(slot.claim().is_none());
    }

    #[test]
    fn test_pending_dropped_after_take_keeps_value() {
        let h = Handoff::new();
        let pending = PendingHandoff::new(Arc::clone(&h));
        assert!(h.take());
        drop(pending);
        assert!(!h.withdraw());
    }

    #[tokio::test]
    async fn test_take_notifies_waiting_sender() {
        let h = Handoff::new();
        let waiter = {
            let h = Arc::clone(&h);
            tokio::spawn(async move { h.taken().await })
        };
        assert!(h.take());
        waiter.await.unwrap();
    }
}
