//! # Supervised routines.
//!
//! This module provides the task-spawn primitive:
//! - [`go`] / [`go_with`] - spawn a unit of work with identity, lineage and instrumentation
//! - [`GoOptions`] - per-routine configuration
//! - [`RoutineHandle`] - single-shot, awaitable result

mod go;
mod handle;
mod name;
mod options;
mod recorders;

pub use go::{go, go_with};
pub use handle::RoutineHandle;
pub use options::{GoOptions, InstrumentOptions};
