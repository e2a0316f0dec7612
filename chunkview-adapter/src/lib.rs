//! Host-side glue for the `chunkview` crate.
//!
//! `chunkview` is UI-agnostic and only models state. This crate provides the pieces a terminal
//! host usually needs around it:
//!
//! - [`ListController`]: owns a list, an animation scheduler and a render pipeline and runs the
//!   per-frame pipeline (commands, cache reconciliation, scheduler tick, render)
//! - [`SharedList`]: the same state behind `parking_lot` locks, for hosts that load data or drive
//!   timers from other threads
//! - [`MemorySource`]: an in-memory [`chunkview::DataSource`] with filtering, sorting, selection
//!   and an optional deferred mode
//! - cursor anchors, to keep the cursor on the same item across filtering and sorting
//!
//! No terminal or widget bindings live here.
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod anchor;
mod controller;
mod memory;
mod shared;

#[cfg(test)]
mod tests;

pub use anchor::{CursorAnchor, apply_cursor_anchor, capture_cursor_anchor};
pub use controller::{Command, ListController};
pub use memory::{Comparator, MemorySource, Predicate};
pub use shared::SharedList;
