//! Core types and shared functionality for roomwatch.
//!
//! This crate provides:
//! - The room data model (platforms, identifiers, snapshots)
//! - The degrade-safe snapshot reconciler (diff + merge)
//! - Snapshot cache with SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod reconcile;

pub use cache::CacheDb;
pub use config::AppConfig;
pub use error::Error;
pub use model::{FetchStatus, LiveStatus, Platform, RoomIdentifier, RoomSnapshot};
