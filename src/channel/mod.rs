//! # Instrumented channels.
//!
//! A [`Channel`] is a typed FIFO queue whose values arrive wrapped in a [`Value`] envelope
//! naming the routine that sent them.
//!
//! ```text
//!  producer A ─┐  send(&ctx, ..)            ┌─► Receiver::recv()  ──► Value { sender: "A", data }
//!  producer B ─┼──► [ FIFO, capacity N ] ───┼─► Receiver::recv()
//!  producer C ─┘        │                   └─► Receiver::into_stream()
//!                       └─ close(): senders fail with Closed, receivers drain then end
//! ```
//!
//! ## Contents
//! - [`Channel`] send / receive / close, plus instrumentation
//! - [`ChannelOptions`] capacity, telemetry sinks, value tracing toggles
//! - [`Receiver`] competing-consumer receive handle
//! - [`Value`] sender-stamped envelope

mod instrumented;
mod options;
mod receiver;
mod slot;
mod value;

pub use instrumented::Channel;
pub use options::{ChannelOptions, ValueEncoder};
pub use receiver::Receiver;
pub use value::Value;
