//! # Receive side of a channel.
//!
//! [`Receiver`] is a cloneable handle onto the channel's single FIFO queue. Every clone
//! competes for the same values: each value is delivered to exactly one consumer.
//!
//! ```text
//!                  ┌──► consumer A  (recv)
//! queue (FIFO) ────┼──► consumer B  (recv)      one value → one consumer
//!                  └──► consumer C  (into_stream)
//! ```
//!
//! ## Rules
//! - `recv()` suspends while the queue is empty and the channel is open.
//! - After [`Channel::close`](crate::Channel::close), buffered values are still delivered;
//!   `recv()` returns `None` once they are drained.
//! - Dropping a pending `recv()` future loses nothing.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::Stream;
use tokio::sync::{Mutex, mpsc};

use super::slot::Slot;
use super::value::Value;

/// Competing-consumer handle returned by [`Channel::receive`](crate::Channel::receive).
pub struct Receiver<T> {
    rx: Arc<Mutex<mpsc::Receiver<Slot<T>>>>,
    depth: Arc<AtomicUsize>,
}

impl<T> Clone for Receiver<T> {
    fn clone(&self) -> Self {
        Self {
            rx: Arc::clone(&self.rx),
            depth: Arc::clone(&self.depth),
        }
    }
}

impl<T> Receiver<T> {
    pub(crate) fn new(rx: mpsc::Receiver<Slot<T>>, depth: Arc<AtomicUsize>) -> Self {
        Self {
            rx: Arc::new(Mutex::new(rx)),
            depth,
        }
    }

    /// Waits for the next value; `None` once the channel is closed and drained.
    pub async fn recv(&self) -> Option<Value<T>> {
        let mut rx = self.rx.lock().await;
        while let Some(slot) = rx.recv().await {
            self.depth.fetch_sub(1, Ordering::AcqRel);
            if let Some(value) = slot.claim() {
                return Some(value);
            }
        }
        None
    }

    /// Takes a value if one is ready right now.
    ///
    /// Returns `None` when the queue is empty, closed, or another consumer is mid-receive.
    pub fn try_recv(&self) -> Option<Value<T>> {
        let mut rx = self.rx.try_lock().ok()?;
        while let Ok(slot) = rx.try_recv() {
            self.depth.fetch_sub(1, Ordering::AcqRel);
            if let Some(value) = slot.claim() {
                return Some(value);
            }
        }
        None
    }

    /// Turns this handle into a stream that ends when the channel is closed and drained.
    pub fn into_stream(self) -> impl Stream<Item = Value<T>> {
        futures::stream::unfold(self, |rx| async move {
            let value = rx.recv().await?;
            Some((value, rx))
        })
    }
}
