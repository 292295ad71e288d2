//! huya live adapter.
//!
//! Room pages embed two JSON blobs in inline script: `TT_ROOM_DATA` (state,
//! title, cover, popularity) and `TT_PROFILE_INFO` (anchor, avatar, and the
//! real `profileRoom` id behind a vanity path). Identifier extraction
//! resolves the vanity path via those blobs; metadata parsing falls back to
//! plain HTML when the blobs are missing fields.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;

use roomwatch_core::{Error, FetchStatus, LiveStatus, Platform, RoomIdentifier, RoomSnapshot};

use super::{RoomAdapter, clean_scraped_url, first_capture, host_of, json_string, path_of};
use crate::fetch::HttpClient;

pub const BASE_URL: &str = "https://www.huya.com";

static TT_ROOM_DATA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)var\s+TT_ROOM_DATA\s*=\s*(\{.*?\});").unwrap());
static TT_PROFILE_INFO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)var\s+TT_PROFILE_INFO\s*=\s*(\{.*?\});").unwrap());
static DATA_ROOMID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"data-roomid=["']([^"']+)["']"#).unwrap());
static HNF_ROOMID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)window\.HNF_GLOBAL\s*=\s*\{.*?roomId:\s*["']([^"']+)["']"#).unwrap());
static TITLE_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<title>([^<]+)</title>").unwrap());
static H1_SPAN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<h1[^>]*>\s*<span[^>]*>([^<]+)</span>").unwrap());

fn room_data_blob(html: &str) -> Option<Value> {
    first_capture(&[&TT_ROOM_DATA_RE], html).and_then(|raw| serde_json::from_str(&raw).ok())
}

fn profile_info_blob(html: &str) -> Option<Value> {
    first_capture(&[&TT_PROFILE_INFO_RE], html).and_then(|raw| serde_json::from_str(&raw).ok())
}

/// The real room id behind a vanity URL, if the profile blob carries one.
fn profile_room_id(html: &str) -> Option<String> {
    profile_info_blob(html).and_then(|info| info.get("profileRoom").and_then(json_string))
}

#[derive(Debug)]
pub struct HuyaAdapter {
    http: HttpClient,
}

impl HuyaAdapter {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    async fn fetch_page(&self, url: &str, referer: &str) -> Result<String, Error> {
        self.http.get_text(url, &[("Referer", referer.to_string())]).await
    }

    async fn room_info_inner(&self, room: &RoomIdentifier) -> Result<RoomSnapshot, Error> {
        let url = format!("{BASE_URL}/{}", room.id);
        let page = self.fetch_page(&url, &url).await?;

        let room_data = room_data_blob(&page);
        let profile_info = profile_info_blob(&page);

        let mut title = room_data
            .as_ref()
            .and_then(|d| d.get("introduction").and_then(json_string))
            .unwrap_or_default();
        let mut cover = room_data
            .as_ref()
            .and_then(|d| {
                d.get("screenshot")
                    .and_then(json_string)
                    .or_else(|| d.get("screenshotUrl").and_then(json_string))
            })
            .unwrap_or_default();
        let popular_num = room_data
            .as_ref()
            .and_then(|d| d.get("totalCount").and_then(json_string))
            .unwrap_or_else(|| "0".to_string());

        let mut anchor = profile_info
            .as_ref()
            .and_then(|p| p.get("nick").and_then(json_string))
            .unwrap_or_default();
        let avatar = profile_info
            .as_ref()
            .and_then(|p| p.get("avatar").and_then(json_string))
            .unwrap_or_default();
        // The profile blob carries the real room id behind a vanity path.
        let real_room_id = profile_info
            .as_ref()
            .and_then(|p| p.get("profileRoom").and_then(json_string))
            .unwrap_or_else(|| room.id.clone());

        if title.is_empty()
            && let Some(tag) = first_capture(&[&TITLE_TAG_RE], &page)
        {
            title = tag.replace(" - 虎牙直播", "").trim().to_string();
        }
        if anchor.is_empty()
            && let Some(h1) = first_capture(&[&H1_SPAN_RE], &page)
        {
            anchor = h1.trim().to_string();
        }

        cover = clean_scraped_url(&cover);

        Ok(RoomSnapshot {
            platform: Platform::Huya,
            room_id: real_room_id.clone(),
            url: format!("{BASE_URL}/{real_room_id}"),
            anchor,
            title,
            avatar: clean_scraped_url(&avatar),
            cover,
            is_live: None,
            status: None,
            popular_num,
            fetch_status: FetchStatus::Ok,
        })
    }
}

#[async_trait]
impl RoomAdapter for HuyaAdapter {
    fn platform(&self) -> Platform {
        Platform::Huya
    }

    async fn extract_identifier(&self, input: &str) -> Result<RoomIdentifier, Error> {
        let trimmed = input.trim();
        let host = host_of(trimmed).ok_or_else(|| Error::InvalidUrl(trimmed.to_string()))?;
        if host != "huya.com" && !host.ends_with(".huya.com") {
            return Err(Error::UnsupportedPlatform(format!("host is not huya.com: {trimmed}")));
        }

        let page = self.fetch_page(trimmed, trimmed).await?;

        // 1. The profile blob's real room id.
        if let Some(id) = profile_room_id(&page) {
            return Ok(RoomIdentifier::new(Platform::Huya, id, BASE_URL));
        }

        // 2. First path segment of the vanity URL.
        if let Some(path) = path_of(trimmed)
            && !path.is_empty()
            && let Some(segment) = path.split('/').next()
            && !segment.is_empty()
        {
            return Ok(RoomIdentifier::new(Platform::Huya, segment, BASE_URL));
        }

        // 3. A data-roomid attribute in the markup.
        if let Some(id) = first_capture(&[&DATA_ROOMID_RE], &page) {
            return Ok(RoomIdentifier::new(Platform::Huya, id, BASE_URL));
        }

        // 4. The HNF_GLOBAL bootstrap object.
        if let Some(id) = first_capture(&[&HNF_ROOMID_RE], &page) {
            return Ok(RoomIdentifier::new(Platform::Huya, id, BASE_URL));
        }

        Err(Error::Extraction(format!("no room id in page: {trimmed}")))
    }

    async fn check_live_status(&self, room: &RoomIdentifier) -> Result<LiveStatus, Error> {
        let url = format!("{BASE_URL}/{}", room.id);
        let page = self.fetch_page(&url, &url).await?;

        let data = room_data_blob(&page)
            .ok_or_else(|| Error::LiveStatusUnavailable(format!("no TT_ROOM_DATA in page: {url}")))?;
        let state = data
            .get("state")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::LiveStatusUnavailable(format!("TT_ROOM_DATA missing state: {url}")))?
            .to_uppercase();

        Ok(LiveStatus { is_live: state == "ON", status: state })
    }

    async fn fetch_room_info(&self, room: &RoomIdentifier) -> RoomSnapshot {
        match self.room_info_inner(room).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(room = %room.id, error = %e, "huya room info fetch degraded");
                RoomSnapshot::degraded(room)
            }
        }
    }
}
