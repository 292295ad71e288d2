//! douyin live adapter.
//!
//! Webcast IDs are arbitrary path segments. The platform's own API is not
//! reachable server-side, so status and metadata come from a third-party
//! mirror endpoint whose base URL is user-configurable. The mirror's payload
//! is deeply nested and loosely typed; it is traversed defensively rather
//! than deserialized into structs.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use url::Url;

use roomwatch_core::{Error, FetchStatus, LiveStatus, Platform, RoomIdentifier, RoomSnapshot};

use super::{RoomAdapter, first_capture, host_of, json_string, path_of};
use crate::fetch::HttpClient;

pub const BASE_URL: &str = "https://live.douyin.com";

/// Default mirror endpoint; override via configuration.
pub const DEFAULT_API_BASE: &str = "https://douyin.wtf";

const API_PATH: &str = "/api/douyin/web/fetch_user_live_videos";

static WEBCAST_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"live\.douyin\.com/([^?#]+)").unwrap());

/// Dig the room list out of the mirror's triple-nested envelope.
fn rooms_of(body: &Value) -> Option<&Vec<Value>> {
    body.get("data")?.get("data")?.get("data")?.as_array()
}

fn user_of(body: &Value) -> Option<&Value> {
    body.get("data")?.get("data")?.get("user")
}

/// Covers arrive as `{url_list: [...]}`, a bare list, or a plain string.
fn image_url(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.first().and_then(Value::as_str).unwrap_or_default().to_string(),
        Value::Object(_) => value
            .get("url_list")
            .and_then(Value::as_array)
            .and_then(|urls| urls.first())
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}

#[derive(Debug)]
pub struct DouyinAdapter {
    http: HttpClient,
    api_base: String,
}

impl DouyinAdapter {
    /// `api_base` overrides the mirror endpoint; `None` uses the default.
    pub fn new(http: HttpClient, api_base: Option<String>) -> Self {
        Self { http, api_base: api_base.unwrap_or_else(|| DEFAULT_API_BASE.to_string()) }
    }

    fn api_url(&self, webcast_id: &str) -> Result<String, Error> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| Error::InvalidUrl(format!("douyin api base {}: {e}", self.api_base)))?;
        url.set_path(API_PATH);
        url.query_pairs_mut().append_pair("webcast_id", webcast_id);
        Ok(url.into())
    }

    async fn call_api(&self, webcast_id: &str) -> Result<Value, Error> {
        let url = self.api_url(webcast_id)?;
        let headers = [
            ("Referer", "https://v.douyin.com/".to_string()),
            ("Accept", "application/json, text/plain, */*".to_string()),
            ("Accept-Language", "zh-CN,zh;q=0.9,en;q=0.8".to_string()),
        ];
        self.http.get_json(&url, &headers).await
    }

    async fn room_info_inner(&self, room: &RoomIdentifier) -> Result<RoomSnapshot, Error> {
        let body = self.call_api(&room.id).await?;

        let rooms = rooms_of(&body)
            .filter(|rooms| !rooms.is_empty())
            .ok_or_else(|| Error::LiveStatusUnavailable("no room data in mirror response".to_string()))?;
        let info = &rooms[0];
        let user = user_of(&body);

        let title = info.get("title").and_then(json_string).unwrap_or_default();
        let cover = info.get("cover").map(image_url).unwrap_or_default();
        let anchor = user
            .and_then(|u| u.get("nickname").and_then(json_string))
            .unwrap_or_default();
        let avatar = user
            .and_then(|u| u.get("avatar_thumb").map(image_url))
            .unwrap_or_default();
        let popular_num = info
            .get("like_count")
            .and_then(json_string)
            .unwrap_or_else(|| "0".to_string());

        Ok(RoomSnapshot {
            platform: Platform::Douyin,
            room_id: room.id.clone(),
            url: format!("{BASE_URL}/{}", room.id),
            anchor,
            title,
            avatar,
            cover,
            is_live: None,
            status: None,
            popular_num,
            fetch_status: FetchStatus::Ok,
        })
    }
}

#[async_trait]
impl RoomAdapter for DouyinAdapter {
    fn platform(&self) -> Platform {
        Platform::Douyin
    }

    async fn extract_identifier(&self, input: &str) -> Result<RoomIdentifier, Error> {
        let trimmed = input.trim();

        // A bare webcast id: no scheme, no host, no path separators.
        if !trimmed.is_empty() && !trimmed.contains('.') && !trimmed.contains('/') {
            return Ok(RoomIdentifier::new(Platform::Douyin, trimmed, BASE_URL));
        }

        let host = host_of(trimmed).ok_or_else(|| Error::InvalidUrl(trimmed.to_string()))?;
        if !host.contains("douyin.com") {
            return Err(Error::UnsupportedPlatform(format!("host is not douyin.com: {trimmed}")));
        }

        // Everything between live.douyin.com/ and the first ? or #.
        if let Some(id) = first_capture(&[&WEBCAST_ID_RE], trimmed) {
            let id = id.trim_end_matches('/');
            if !id.is_empty() {
                return Ok(RoomIdentifier::new(Platform::Douyin, id, BASE_URL));
            }
        }

        // Generic fallback: the URL path.
        if let Some(path) = path_of(trimmed)
            && !path.is_empty()
        {
            return Ok(RoomIdentifier::new(Platform::Douyin, path, BASE_URL));
        }

        Err(Error::Extraction(format!("no webcast id in url: {trimmed}")))
    }

    async fn check_live_status(&self, room: &RoomIdentifier) -> Result<LiveStatus, Error> {
        let body = self.call_api(&room.id).await?;

        // A malformed envelope means "not observable", not a fault.
        let Some(rooms) = rooms_of(&body) else {
            return Ok(LiveStatus { is_live: false, status: "unexpected mirror response".to_string() });
        };
        let Some(info) = rooms.first() else {
            return Ok(LiveStatus { is_live: false, status: "no room data".to_string() });
        };

        // Mirror status code: 2 means streaming.
        let status = info.get("status").and_then(Value::as_i64).unwrap_or(0);
        let is_live = status == 2;
        Ok(LiveStatus { is_live, status: if is_live { "streaming".to_string() } else { "offline".to_string() } })
    }

    async fn fetch_room_info(&self, room: &RoomIdentifier) -> RoomSnapshot {
        match self.room_info_inner(room).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(room = %room.id, error = %e, "douyin room info fetch degraded");
                RoomSnapshot::degraded(room)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::HttpConfig;

    fn adapter() -> DouyinAdapter {
        DouyinAdapter::new(HttpClient::new(HttpConfig::default()).unwrap(), None)
    }

    fn mirror_body() -> Value {
        serde_json::json!({
            "data": {
                "data": {
                    "data": [{
                        "status": 2,
                        "title": "morning show",
                        "cover": {"url_list": ["https://p3.douyinpic.com/cover.jpg"]},
                        "like_count": 8812
                    }],
                    "user": {
                        "nickname": "somebody",
                        "avatar_thumb": {"url_list": ["https://p3.douyinpic.com/avatar.jpg"]}
                    }
                }
            }
        })
    }

    #[tokio::test]
    async fn test_extract_from_live_url() {
        let room = adapter()
            .extract_identifier("https://live.douyin.com/745964462470?enter_from=web")
            .await
            .unwrap();
        assert_eq!(room.id, "745964462470");
        assert_eq!(room.url, "https://live.douyin.com/745964462470");
    }

    #[tokio::test]
    async fn test_extract_keeps_non_numeric_ids() {
        let room = adapter()
            .extract_identifier("https://live.douyin.com/MS4wLjABAAAA_x/")
            .await
            .unwrap();
        assert_eq!(room.id, "MS4wLjABAAAA_x");
    }

    #[tokio::test]
    async fn test_extract_bare_webcast_id() {
        let room = adapter().extract_identifier("745964462470").await.unwrap();
        assert_eq!(room.url, "https://live.douyin.com/745964462470");
    }

    #[tokio::test]
    async fn test_extract_rejects_foreign_host() {
        let err = adapter().extract_identifier("https://example.com/745").await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedPlatform(_)));
    }

    #[test]
    fn test_api_url_override() {
        let custom = DouyinAdapter::new(
            HttpClient::new(HttpConfig::default()).unwrap(),
            Some("https://mirror.example".to_string()),
        );
        let url = custom.api_url("abc").unwrap();
        assert_eq!(url, "https://mirror.example/api/douyin/web/fetch_user_live_videos?webcast_id=abc");

        let url = adapter().api_url("abc").unwrap();
        assert!(url.starts_with("https://douyin.wtf/"));
    }

    #[test]
    fn test_envelope_traversal() {
        let body = mirror_body();
        let rooms = rooms_of(&body).unwrap();
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0]["status"], 2);
        assert_eq!(user_of(&body).unwrap()["nickname"], "somebody");

        assert!(rooms_of(&serde_json::json!({"data": {}})).is_none());
    }

    #[test]
    fn test_image_url_shapes() {
        assert_eq!(image_url(&serde_json::json!("https://a/b.jpg")), "https://a/b.jpg");
        assert_eq!(image_url(&serde_json::json!(["https://a/c.jpg"])), "https://a/c.jpg");
        assert_eq!(image_url(&serde_json::json!({"url_list": ["https://a/d.jpg"]})), "https://a/d.jpg");
        assert_eq!(image_url(&serde_json::json!({"url_list": []})), "");
        assert_eq!(image_url(&serde_json::json!(null)), "");
    }
}
