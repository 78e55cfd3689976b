//! # Routine identity propagation.
//!
//! A [`Context`] travels down the call graph alongside a routine. It carries:
//! - the current routine name (`"noname"` when unset),
//! - the parent routine name (lineage of nested spawns),
//! - the sender name stamped by a [`Channel`](crate::Channel) on every value,
//! - arbitrary string key-values inherited by every derived context,
//! - a [`CancellationToken`](tokio_util::sync::CancellationToken) for cooperative shutdown.
//!
//! ## Derivation
//! ```text
//! Context::root()                      routine="root"
//!   └─ derive_child("producer")        routine="producer"  parent="root"
//!        └─ derive_sender("producer")  routine="producer"  parent="root"  sender="producer"
//! ```
//!
//! ## Rules
//! - Deriving never mutates an ancestor: every method returns a new value.
//! - Reading an absent key returns its documented default, never an error.

mod identity;

pub use identity::{Context, NO_NAME_ROUTINE, ROOT_ROUTINE};
