//! # funcy
//!
//! **Funcy** spawns supervised async routines and connects them with instrumented channels.
//!
//! Every routine gets an identity (a name and its parent's name) carried in a [`Context`].
//! Every value sent through a [`Channel`] is stamped with the name of the routine that sent
//! it. Both sides emit `tracing` logs, optional metrics and spans, and lifecycle [`Event`]s.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  caller ──► go_with(f, GoOptions) ──► RoutineHandle (await → Result<(), E>)
//!                   │
//!                   ▼ tokio::spawn
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  routine "producer"  (Context: routine=producer, parent=root)     │
//! │  - span + "starting routine" / "exiting routine" log lines        │
//! │  - total / running counters, duration histogram                   │
//! │  - panics caught, recorded, re-raised in the awaiting caller      │
//! └──────┬────────────────────────────────────────────────────────────┘
//!        │ ch.send(&ctx, values)
//!        ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Channel<T>  (FIFO, capacity N, 0 = rendezvous)                   │
//! │  - Value { ctx (sender=producer), data }                          │
//! │  - send counter / histogram, span "send" with value events        │
//! │  - close(): idempotent, releases blocked senders                  │
//! └──────┬──────────────────┬─────────────────────────────────────────┘
//!        ▼                  ▼
//!    Receiver            Receiver           (competing consumers)
//!
//!  lifecycle Events ──► Bus (broadcast) ──► any subscriber
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                          |
//! |-------------------|--------------------------------------------------------------|---------------------------------------------|
//! | **Routines**      | Spawn work with identity, lineage and a single-shot result.  | [`go`], [`go_with`], [`RoutineHandle`]      |
//! | **Channels**      | Typed FIFO with sender stamping and idempotent close.        | [`Channel`], [`Receiver`], [`Value`]        |
//! | **Identity**      | Routine, parent and sender names plus key-values.            | [`Context`]                                 |
//! | **Telemetry**     | Injected metric and tracing sinks, in-memory recorders.      | [`telemetry::Meter`], [`telemetry::Tracer`] |
//! | **Events**        | Broadcast lifecycle events.                                  | [`Bus`], [`Event`], [`EventKind`]           |
//! | **Errors**        | Typed channel, routine and telemetry errors.                 | [`ChannelError`], [`RoutineError`], [`TelemetryError`] |
//! | **Configuration** | Environment-seeded defaults, explicit overrides.             | [`Defaults`], [`GoOptions`], [`ChannelOptions`] |
//!
//! ## Example
//! ```rust
//! use funcy::{go_with, Channel, ChannelOptions, Context, GoOptions};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let ch = Channel::with_options(ChannelOptions::new().with_capacity(2));
//!
//!     let producer = {
//!         let ch = ch.clone();
//!         go_with(
//!             move |ctx: Context| async move { ch.send(&ctx, ["hello", "world"]).await },
//!             GoOptions::new().with_name("producer"),
//!         )
//!     };
//!     producer.await.unwrap();
//!     ch.close();
//!
//!     let rx = ch.receive();
//!     while let Some(value) = rx.recv().await {
//!         println!("{} from {}", value.data(), value.sender());
//!     }
//! }
//! ```
mod channel;
pub mod config;
mod context;
mod error;
mod events;
mod routine;
pub mod telemetry;

// ---- Public re-exports ----

pub use channel::{Channel, ChannelOptions, Receiver, Value, ValueEncoder};
pub use config::Defaults;
pub use context::{Context, NO_NAME_ROUTINE, ROOT_ROUTINE};
pub use error::{ChannelError, RoutineError, TelemetryError};
pub use events::{Bus, Event, EventKind};
pub use routine::{GoOptions, InstrumentOptions, RoutineHandle, go, go_with};
