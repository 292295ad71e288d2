//! bilibili live adapter.
//!
//! Rooms are plain numeric IDs. Status and metadata both come from the
//! `getInfoByRoom` web API, which answers JSON but expects browser-shaped
//! requests: Referer/Origin headers and `buvid` device cookies. The cookies
//! are randomized per request.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;

use roomwatch_core::{Error, FetchStatus, LiveStatus, Platform, RoomIdentifier, RoomSnapshot};

use super::{RoomAdapter, first_capture, host_of, path_of};
use crate::fetch::HttpClient;

pub const BASE_URL: &str = "https://live.bilibili.com";

const API_URL: &str = "https://api.live.bilibili.com/xlive/web-room/v1/index/getInfoByRoom";

static ROOM_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"live\.bilibili\.com/(\d+)").unwrap());

#[derive(Debug, Deserialize)]
struct ApiResponse {
    code: i64,
    #[serde(default)]
    message: String,
    data: Option<ApiData>,
}

#[derive(Debug, Deserialize)]
struct ApiData {
    room_info: ApiRoomInfo,
    anchor_info: ApiAnchorInfo,
}

#[derive(Debug, Deserialize)]
struct ApiRoomInfo {
    #[serde(default)]
    title: String,
    #[serde(default)]
    cover: String,
    live_status: i64,
    #[serde(default)]
    online: u64,
}

#[derive(Debug, Deserialize)]
struct ApiAnchorInfo {
    base_info: ApiAnchorBase,
}

#[derive(Debug, Deserialize)]
struct ApiAnchorBase {
    #[serde(default)]
    uname: String,
    #[serde(default)]
    face: String,
}

/// Map the platform's numeric room state to a status word.
fn status_text(live_status: i64) -> String {
    match live_status {
        0 => "offline".to_string(),
        1 => "streaming".to_string(),
        2 => "replay".to_string(),
        other => format!("unknown status ({other})"),
    }
}

#[derive(Debug)]
pub struct BilibiliAdapter {
    http: HttpClient,
}

impl BilibiliAdapter {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Randomized device cookies the API expects from browsers.
    fn device_cookie() -> String {
        let buvid3 = uuid::Uuid::new_v4().simple().to_string().to_uppercase();
        let buvid4 = uuid::Uuid::new_v4().simple().to_string().to_uppercase();
        let now = chrono::Utc::now().timestamp();
        format!("buvid3={buvid3}; buvid4={buvid4}; rpdid=|u-{now}||t-{now};")
    }

    fn api_headers(room_id: &str) -> Vec<(&'static str, String)> {
        vec![
            ("Referer", format!("{BASE_URL}/{room_id}")),
            ("Origin", BASE_URL.to_string()),
            ("Accept", "application/json, text/plain, */*".to_string()),
            ("Accept-Language", "zh-CN,zh;q=0.9,en;q=0.8".to_string()),
            ("Cookie", Self::device_cookie()),
        ]
    }

    async fn call_api(&self, room_id: &str) -> Result<ApiResponse, Error> {
        let url = format!("{API_URL}?room_id={room_id}");
        let body = self.http.get_text(&url, &Self::api_headers(room_id)).await?;
        serde_json::from_str(&body).map_err(|e| Error::LiveStatusUnavailable(format!("unexpected api schema: {e}")))
    }

    async fn room_info_inner(&self, room: &RoomIdentifier) -> Result<RoomSnapshot, Error> {
        let response = self.call_api(&room.id).await?;
        if response.code != 0 {
            return Err(Error::HttpError(format!("api error {}: {}", response.code, response.message)));
        }
        let data = response
            .data
            .ok_or_else(|| Error::LiveStatusUnavailable("api response missing data".to_string()))?;

        Ok(RoomSnapshot {
            platform: Platform::Bilibili,
            room_id: room.id.clone(),
            url: format!("{BASE_URL}/{}", room.id),
            anchor: data.anchor_info.base_info.uname,
            title: data.room_info.title,
            avatar: data.anchor_info.base_info.face,
            cover: data.room_info.cover,
            is_live: None,
            status: None,
            popular_num: data.room_info.online.to_string(),
            fetch_status: FetchStatus::Ok,
        })
    }
}

#[async_trait]
impl RoomAdapter for BilibiliAdapter {
    fn platform(&self) -> Platform {
        Platform::Bilibili
    }

    async fn extract_identifier(&self, input: &str) -> Result<RoomIdentifier, Error> {
        let trimmed = input.trim();

        // Bare numeric IDs resolve without a URL parse.
        if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Ok(RoomIdentifier::new(Platform::Bilibili, trimmed, BASE_URL));
        }

        let host = host_of(trimmed).ok_or_else(|| Error::InvalidUrl(trimmed.to_string()))?;
        if !host.contains("bilibili.com") {
            return Err(Error::UnsupportedPlatform(format!("host is not bilibili.com: {trimmed}")));
        }

        if let Some(id) = first_capture(&[&ROOM_ID_RE], trimmed) {
            return Ok(RoomIdentifier::new(Platform::Bilibili, id, BASE_URL));
        }

        // Generic fallback: an all-digits path segment.
        if let Some(path) = path_of(trimmed)
            && !path.is_empty()
            && path.chars().all(|c| c.is_ascii_digit())
        {
            return Ok(RoomIdentifier::new(Platform::Bilibili, path, BASE_URL));
        }

        Err(Error::Extraction(format!("no room id in url: {trimmed}")))
    }

    async fn check_live_status(&self, room: &RoomIdentifier) -> Result<LiveStatus, Error> {
        let response = self.call_api(&room.id).await?;
        if response.code != 0 {
            // The API answered; an error code means "not observable", not a fault.
            let message = if response.message.is_empty() { "api error".to_string() } else { response.message };
            return Ok(LiveStatus { is_live: false, status: message });
        }
        let data = response
            .data
            .ok_or_else(|| Error::LiveStatusUnavailable("api response missing data".to_string()))?;

        let live_status = data.room_info.live_status;
        Ok(LiveStatus { is_live: live_status == 1, status: status_text(live_status) })
    }

    async fn fetch_room_info(&self, room: &RoomIdentifier) -> RoomSnapshot {
        match self.room_info_inner(room).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(room = %room.id, error = %e, "bilibili room info fetch degraded");
                RoomSnapshot::degraded(room)
            }
        }
    }
}
