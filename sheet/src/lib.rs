//! # Deskfleet Sheet Export
//!
//! Maps a growing, unordered set of hosts onto a fixed tabular layout in an
//! external spreadsheet-style sink, without ever disturbing previously
//! written columns.
//!
//! - **`SheetApi`**: seam over the external product (`read_row`,
//!   `write_range`, `append_row`, `clear` in A1 notation)
//! - **`ColumnAllocator`**: stable host → column mapping, monotonic growth
//! - **`TransposedLayout`**: one column per host, fixed metric labels down
//!   column A, cold-start reconciliation against whatever the sheet holds
//! - **`AppendRowLayout`**: one appended row per reading, fixed header order
//! - **`SnapshotSync`**: the hub-facing facade tying a layout to the
//!   snapshot metric mapping
//!
//! Every failure in here is a [`SheetError`]; callers log and skip, the sink
//! is never allowed to take the live telemetry path down with it.

#[macro_use]
extern crate tracing;

pub mod allocator;
pub mod append;
pub mod client;
pub mod mapping;
pub mod memory;
pub mod rest;
pub mod sync;
pub mod transposed;

pub use allocator::ColumnAllocator;
pub use append::AppendRowLayout;
pub use client::{
    SheetApi,
    SheetError,
    SheetResult,
};
pub use memory::MemorySheet;
pub use rest::RestSheet;
pub use sync::SnapshotSync;
pub use transposed::TransposedLayout;
