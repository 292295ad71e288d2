//! Client code for roomwatch.
//!
//! This crate provides the HTTP transport, the per-platform room adapters,
//! the platform registry/detector, and the batch update orchestrator.

pub mod batch;
pub mod fetch;
pub mod platform;

pub use batch::{BatchReport, BatchSummary, FailedRoom, RoomUpdate, update_room, update_rooms};
pub use fetch::{HttpClient, HttpConfig};
pub use platform::{Registry, RoomAdapter};
