//! SQLite-backed snapshot cache for tracked rooms.
//!
//! This module owns all persisted state. It provides a per-tenant,
//! content-addressed store using SQLite with async access via
//! tokio-rusqlite:
//!
//! - Keys are SHA-256 hashes of the canonical room URL
//! - Entries carry a capture timestamp; age beyond the TTL means "absent"
//! - Corrupt entries are deleted on sight, never repaired
//! - Automatic schema migrations, WAL mode for concurrent access

pub mod connection;
pub mod hash;
pub mod migrations;
pub mod rooms;

pub use crate::Error;

pub use connection::CacheDb;
pub use hash::cache_key;
