//! # Deskfleet Remote Polling Collector
//!
//! The pull half of the fleet telemetry system: instead of waiting for an
//! installed agent, the collector enumerates the monitored scope from a
//! directory service and actively queries every host over a
//! remote-execution channel.
//!
//! ## Architecture
//!
//! - **`discovery`**: resolves the monitored scope to the current set of
//!   host identifiers
//! - **`remote`**: the opaque `execute(host, command)` channel, with a
//!   shell-template implementation and per-call timeouts
//! - **`queries`**: the four read-only diagnostic queries (process list,
//!   idle time, CPU load, memory load) and their result parsing
//! - **`state`**: the in-memory fleet table, overwritten wholesale each
//!   cycle
//! - **`cycle`**: the collection loop tying it all together
//! - **`export`**: full-table spreadsheet export, transposed or rewrite
//! - **`display`**: terminal rendering of the current fleet table
//!
//! ## Failure Model
//!
//! A failed query nulls one field, a failed process-list query marks the
//! whole host unreachable, an empty discovery skips the cycle wholesale,
//! and a sink failure is logged and retried next cycle. Nothing in the
//! loop is allowed to terminate the process.

pub mod cycle;
pub mod discovery;
pub mod display;
pub mod export;
pub mod queries;
pub mod remote;
pub mod state;

pub use cycle::Collector;
pub use discovery::{
    CommandDiscovery,
    HostDiscovery,
};
pub use export::FleetExport;
pub use remote::{
    RemoteExec,
    ShellExec,
};
pub use state::FleetState;
