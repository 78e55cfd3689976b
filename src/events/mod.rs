//! Lifecycle events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: routines spawned with a bus in their [`GoOptions`](crate::GoOptions),
//!   channels built with a bus in their [`ChannelOptions`](crate::ChannelOptions).
//! - **Consumers**: anything holding a `Bus::subscribe()` receiver.
//!
//! Events complement, and never replace, the `tracing` lifecycle log lines.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
