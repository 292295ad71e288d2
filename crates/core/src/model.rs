//! Room data model shared across the workspace.
//!
//! A tracked room is identified by its platform plus a platform-specific id,
//! and observed through [`RoomSnapshot`] values produced by the adapters.
//! Snapshots are JSON-serializable; they are what the cache persists and what
//! the UI layer consumes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The streaming platforms roomwatch knows how to scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Bilibili,
    Douyu,
    Huya,
    Douyin,
}

impl Platform {
    /// All supported platforms, in the order they are tried for detection.
    pub const ALL: [Platform; 4] = [Platform::Bilibili, Platform::Douyu, Platform::Huya, Platform::Douyin];

    /// Stable lowercase label used in JSON output and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Platform::Bilibili => "bilibili",
            Platform::Douyu => "douyu",
            Platform::Huya => "huya",
            Platform::Douyin => "douyin",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A resolved room identity. Immutable once extracted.
///
/// `url` is the canonical `base_url/id` form and is the stable cache key for
/// the room, independent of however the input URL was originally typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomIdentifier {
    pub platform: Platform,
    pub id: String,
    pub url: String,
}

impl RoomIdentifier {
    /// Build an identifier with the canonical `base_url/id` URL.
    pub fn new(platform: Platform, id: impl Into<String>, base_url: &str) -> Self {
        let id = id.into();
        let url = format!("{}/{}", base_url.trim_end_matches('/'), id);
        Self { platform, id, url }
    }
}

/// Whether the fetch that produced a snapshot completed normally.
///
/// `Failed` marks a degraded snapshot: the adapter hit a network or parse
/// fault and substituted empty metadata. The reconciler branches on this
/// exhaustively, so the merge policy is compiler-checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    Ok,
    Failed,
}

/// Result of a live-status probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveStatus {
    pub is_live: bool,
    /// The platform's own state word: `"streaming"`, `"offline"`, `"ON"`,
    /// a replay marker, or a raw status code.
    pub status: String,
}

/// The user-visible unit: one room's last observed state.
///
/// Empty strings stand for "this field was not available"; a degraded fetch
/// leaves every metadata field empty so the reconciler can restore cached
/// values. `popular_num` is always a string: one source platform only
/// provides non-numeric values, so numeric counts are normalized to their
/// decimal string form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub platform: Platform,
    pub room_id: String,
    pub url: String,
    pub anchor: String,
    pub title: String,
    pub avatar: String,
    pub cover: String,
    pub is_live: Option<bool>,
    pub status: Option<String>,
    pub popular_num: String,
    pub fetch_status: FetchStatus,
}

impl RoomSnapshot {
    /// The empty-metadata snapshot an adapter returns when a fetch fails.
    ///
    /// Never-throw contract: `fetch_room_info` must hand callers a well-typed
    /// value on any fault, so reconciliation always has something to merge.
    pub fn degraded(room: &RoomIdentifier) -> Self {
        Self {
            platform: room.platform,
            room_id: room.id.clone(),
            url: room.url.clone(),
            anchor: String::new(),
            title: String::new(),
            avatar: String::new(),
            cover: String::new(),
            is_live: None,
            status: None,
            popular_num: String::new(),
            fetch_status: FetchStatus::Failed,
        }
    }
}
