#[macro_use]
extern crate tracing;

pub mod error;
pub mod history;
pub mod hub;
pub mod registry;
pub mod routes;
pub mod sync;

pub use history::{
    BoundedHistory,
    HistoryEntry,
};
pub use hub::{
    Hub,
    HubEvent,
};
pub use registry::{
    ConnectionId,
    Session,
    SessionRegistry,
};
