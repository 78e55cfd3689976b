//! # Single-shot result of a spawned routine.
//!
//! [`RoutineHandle`] resolves exactly once, with the unit of work's own result. Dropping it
//! is fine: the routine keeps running and its result is discarded (fire-and-forget).
//!
//! ## Outcomes
//! ```text
//! f(ctx) → Ok(())     ──► handle.await == Ok(())
//! f(ctx) → Err(e)     ──► handle.await == Err(e)      (the very same value)
//! f(ctx) panics       ──► handle.await re-raises the panic in the awaiting task
//!                          handle.join() == Err(RoutineError::Panicked { .. })
//! runtime drops f     ──► handle.join() == Err(RoutineError::Dropped { .. })
//! ```

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context as TaskContext, Poll, ready};

use tokio::sync::oneshot;

use crate::error::RoutineError;

/// What a routine reports: its own result, or the payload of its panic.
pub(crate) type Outcome<E> = Result<Result<(), E>, Box<dyn Any + Send + 'static>>;

/// Awaitable, single-value result of [`go`](crate::go) / [`go_with`](crate::go_with).
///
/// ## Example
/// ```
/// use funcy::{go_with, Context, GoOptions};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let handle = go_with(
///     |ctx: Context| async move {
///         assert_eq!(ctx.routine(), "hello");
///         Ok::<(), std::io::Error>(())
///     },
///     GoOptions::new().with_name("hello"),
/// );
/// assert_eq!(handle.name(), "hello");
/// assert!(handle.await.is_ok());
/// # }
/// ```
#[must_use = "dropping the handle detaches the routine; await it to observe its result"]
pub struct RoutineHandle<E> {
    name: Arc<str>,
    rx: oneshot::Receiver<Outcome<E>>,
    finished: Arc<AtomicBool>,
}

impl<E> RoutineHandle<E> {
    pub(crate) fn new(
        name: Arc<str>,
        rx: oneshot::Receiver<Outcome<E>>,
        finished: Arc<AtomicBool>,
    ) -> Self {
        Self { name, rx, finished }
    }

    /// Name assigned to the routine (explicit or generated).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` once the result is ready; awaiting will then not suspend.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Waits for the routine, reporting abnormal endings as [`RoutineError`] instead of
    /// unwinding.
    pub async fn join(mut self) -> Result<Result<(), E>, RoutineError> {
        match (&mut self.rx).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(payload)) => Err(RoutineError::Panicked {
                name: Arc::clone(&self.name),
                message: panic_message(payload.as_ref()),
            }),
            Err(_) => Err(RoutineError::Dropped {
                name: Arc::clone(&self.name),
            }),
        }
    }
}

/// Awaiting the handle directly yields the unit of work's own result.
///
/// # Panics
/// Re-raises the routine's panic, and panics with [`RoutineError::Dropped`] if the runtime
/// dropped the routine before it reported. Use [`RoutineHandle::join`] to get both as values.
impl<E> Future for RoutineHandle<E> {
    type Output = Result<(), E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        match ready!(Pin::new(&mut self.rx).poll(cx)) {
            Ok(Ok(result)) => Poll::Ready(result),
            Ok(Err(payload)) => std::panic::resume_unwind(payload),
            Err(_) => {
                let err = RoutineError::Dropped {
                    name: Arc::clone(&self.name),
                };
                panic!("{err}")
            }
        }
    }
}

/// Extracts the message of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl<E> fmt::Debug for RoutineHandle<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutineHandle")
            .field("name", &self.name)
            .field("finished", &self.is_finished())
            .finish()
    }
}
