//! Platform adapters for live-room lookups.
//!
//! One adapter per platform, all behind the [`RoomAdapter`] trait so the
//! registry can dispatch on URL without knowing platform internals. Adapters
//! are failure-isolated: a platform changing its markup breaks one adapter,
//! not the batch.
//!
//! ### Contract
//! - `extract_identifier` validates host ownership and may fetch the page to
//!   resolve vanity URLs. Strategies are explicit ordered ladders; the first
//!   match wins.
//! - `check_live_status` issues one read-only call and reports an
//!   unrecognized schema as `LiveStatusUnavailable`, never a fault.
//! - `fetch_room_info` never fails: any network or parse error degrades to
//!   an empty-metadata snapshot so callers always have a value to reconcile.

pub mod bilibili;
pub mod douyin;
pub mod douyu;
pub mod huya;
pub mod registry;

pub use bilibili::BilibiliAdapter;
pub use douyin::DouyinAdapter;
pub use douyu::DouyuAdapter;
pub use huya::HuyaAdapter;
pub use registry::Registry;

use async_trait::async_trait;
use regex::Regex;
use roomwatch_core::{Error, LiveStatus, Platform, RoomIdentifier, RoomSnapshot};

/// Common capability set implemented by every platform.
#[async_trait]
pub trait RoomAdapter: Send + Sync + std::fmt::Debug {
    /// Which platform this adapter speaks for.
    fn platform(&self) -> Platform;

    /// Turn a pasted URL (or a bare id the platform accepts directly) into a
    /// canonical room identifier.
    async fn extract_identifier(&self, input: &str) -> Result<RoomIdentifier, Error>;

    /// Probe whether the room is currently live.
    async fn check_live_status(&self, room: &RoomIdentifier) -> Result<LiveStatus, Error>;

    /// Fetch the room's display metadata.
    ///
    /// Infallible by contract: faults come back as a degraded snapshot.
    async fn fetch_room_info(&self, room: &RoomIdentifier) -> RoomSnapshot;
}

/// Run an ordered ladder of regex strategies; the first capture wins.
pub(crate) fn first_capture(patterns: &[&Regex], text: &str) -> Option<String> {
    patterns
        .iter()
        .find_map(|re| re.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str().to_string()))
}

/// Lowercased host of an input, defaulting the scheme to https when missing.
pub(crate) fn host_of(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    let with_scheme = if trimmed.contains("://") { trimmed.to_string() } else { format!("https://{trimmed}") };
    let parsed = url::Url::parse(&with_scheme).ok()?;
    parsed.host_str().map(|h| h.to_lowercase())
}

/// Path of an input URL, with surrounding slashes trimmed.
pub(crate) fn path_of(input: &str) -> Option<String> {
    let trimmed = input.trim();
    let with_scheme = if trimmed.contains("://") { trimmed.to_string() } else { format!("https://{trimmed}") };
    let parsed = url::Url::parse(&with_scheme).ok()?;
    Some(parsed.path().trim_matches('/').to_string())
}

/// Clean a URL scraped out of inline page script.
///
/// Values arrive JSON-escaped (`\/`, `\"`) and sometimes protocol-relative.
pub(crate) fn clean_scraped_url(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let mut cleaned = raw.replace("\\/", "/").replace("\\\"", "\"").replace("\\\\", "\\");
    if cleaned.starts_with("//") {
        cleaned = format!("https:{cleaned}");
    }
    cleaned
}

/// Pull a string out of a JSON value that may be a string or a number.
pub(crate) fn json_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::LazyLock;

    static FIRST: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"first=(\d+)").unwrap());
    static SECOND: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"second=(\d+)").unwrap());

    #[test]
    fn test_first_capture_priority_order() {
        let text = "second=2 first=1";
        let hit = first_capture(&[&FIRST, &SECOND], text);
        assert_eq!(hit.as_deref(), Some("1"));

        let hit = first_capture(&[&SECOND, &FIRST], text);
        assert_eq!(hit.as_deref(), Some("2"));
    }

    #[test]
    fn test_first_capture_falls_through() {
        let hit = first_capture(&[&FIRST, &SECOND], "second=7 only");
        assert_eq!(hit.as_deref(), Some("7"));

        assert!(first_capture(&[&FIRST, &SECOND], "nothing here").is_none());
    }

    #[test]
    fn test_host_of_variants() {
        assert_eq!(host_of("https://Live.Bilibili.com/123").as_deref(), Some("live.bilibili.com"));
        assert_eq!(host_of("www.douyu.com/9999").as_deref(), Some("www.douyu.com"));
        assert!(host_of("").is_none());
    }

    #[test]
    fn test_path_of() {
        assert_eq!(path_of("https://www.huya.com/kpl/").as_deref(), Some("kpl"));
        assert_eq!(path_of("https://live.douyin.com/abc?x=1").as_deref(), Some("abc"));
    }

    #[test]
    fn test_clean_scraped_url() {
        assert_eq!(clean_scraped_url(r"https:\/\/img.example\/a.jpg"), "https://img.example/a.jpg");
        assert_eq!(clean_scraped_url("//img.example/a.jpg"), "https://img.example/a.jpg");
        assert_eq!(clean_scraped_url(""), "");
    }

    #[test]
    fn test_json_string() {
        assert_eq!(json_string(&serde_json::json!("123")).as_deref(), Some("123"));
        assert_eq!(json_string(&serde_json::json!(456)).as_deref(), Some("456"));
        assert!(json_string(&serde_json::json!("")).is_none());
        assert!(json_string(&serde_json::json!(null)).is_none());
    }
}
