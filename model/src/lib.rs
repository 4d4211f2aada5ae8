//! # Deskfleet Data Model
//!
//! The normalized shapes shared by both collection strategies:
//!
//! - **`Snapshot`**: one point-in-time telemetry reading for a host, as
//!   pushed by agents over the persistent connection
//! - **`messages`**: the wire protocol between agents/observers and the hub
//! - **`SummaryView`**: the per-host projection served by the hub's summary
//!   endpoint
//! - **`ComputerState`**: the pull-model aggregate written by the remote
//!   polling collector

pub mod computer_state;
pub mod messages;
pub mod snapshot;
pub mod summary;

pub use computer_state::{
    ComputerState,
    HostStatus,
};
pub use messages::{
    AgentMessage,
    HubMessage,
};
pub use snapshot::{
    ProcessInfo,
    Snapshot,
};
pub use summary::SummaryView;
