//! A headless virtualization engine for terminal list and table widgets.
//!
//! For host-side glue (per-frame controller, thread-safe wrapper, in-memory source), see the
//! `chunkview-adapter` crate.
//!
//! The crate presents a bounded window over datasets of any size without holding them in memory:
//! - [`Navigator`]: cursor/scroll state machine with look-ahead thresholds
//! - [`ChunkCache`]: fixed-size blocks fetched lazily from a [`DataSource`], evicted outside a
//!   three-chunk retention window
//! - [`AnimationScheduler`]: one global timer driving per-row animations keyed by stable ids
//! - [`RenderPipeline`]: turns committed state into formatted rows
//!
//! It is UI-agnostic. A TUI layer is expected to provide:
//! - the viewport height
//! - a data source and row formatters
//! - a timestamp (`now_ms`) for ticks and renders
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod animation;
mod cache;
mod config;
mod error;
mod key;
mod list;
mod render;
mod source;
mod state;
mod types;
mod viewport;


pub use animation::{
    AnimationScheduler, AnimationState, Condition, OnUpdateCallback, RefreshTrigger, Registration,
    StateMap, StateValue,
};
pub use cache::{Chunk, ChunkCache, Completion, Ensure, Lookup};
pub use config::{
    AnimationConfig, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_ANIMATIONS, DEFAULT_TICK_INTERVAL_MS,
    ViewportConfig, proportional_thresholds,
};
pub use error::{ConfigError, FormatError, LoadError, SourceError};
#[cfg(feature = "std")]
pub use render::CatchUnwind;
pub use render::{
    AnimatedFormatter, AnimatedRender, Formatter, Frame, RenderPipeline, RenderedRow, RowContext,
    SharedAnimatedFormatter, SharedFormatter,
};
pub use list::{ListView, ViewEvent, VisibleItem, reconcile, retention_window};
pub use source::{DataSource, Fetch, Filter, ItemRequest, LoadTicket, Query, SortKey};
pub use state::ViewportState;
pub use types::{Data, ItemId, ItemRange, SortDirection};
pub use viewport::{Motion, Navigator, Thresholds};

pub use key::IdKey;
