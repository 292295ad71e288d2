//! douyu live adapter.
//!
//! Vanity path segments hide a numeric room id that only appears inside the
//! room page itself, so identifier extraction is a page fetch followed by a
//! regex ladder over inline `$ROOM.*` script variables. Live status comes
//! from `$ROOM.show_status` on the same page; display metadata mixes script
//! variables with plain HTML elements.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};

use roomwatch_core::{Error, FetchStatus, LiveStatus, Platform, RoomIdentifier, RoomSnapshot};

use super::{RoomAdapter, clean_scraped_url, first_capture, host_of, path_of};
use crate::fetch::HttpClient;

pub const BASE_URL: &str = "https://www.douyu.com";

static ROOM_ID_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"\$ROOM\.room_id\s*=\s*(\d+)").unwrap(),
        Regex::new(r#"room_id["']:\s*(\d+)"#).unwrap(),
        Regex::new(r#""room_id":\s*(\d+)"#).unwrap(),
    ]
});

static SHOW_STATUS_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"\$ROOM\.show_status\s*=\s*(\d+)").unwrap(),
        Regex::new(r"show_status[=:]\s*(\d+)").unwrap(),
        Regex::new(r#""show_status":\s*(\d+)"#).unwrap(),
    ]
});

static ROOM_STATUS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""room_status":\s*(\d+)"#).unwrap());

static AVATAR_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r#"\$ROOM\.owner_avatar\s*=\s*["']([^"']+)["']"#).unwrap(),
        Regex::new(r#"owner_avatar["']:\s*["']([^"']+)["']"#).unwrap(),
        Regex::new(r#""owner_avatar":"([^"]+)""#).unwrap(),
    ]
});

static COVER_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r#"\$ROOM\.coverSrc\s*=\s*["']([^"']+)["']"#).unwrap(),
        Regex::new(r#"coverSrc["']:\s*["']([^"']+)["']"#).unwrap(),
        Regex::new(r#""coverSrc":"([^"]+)""#).unwrap(),
    ]
});

static HOT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""hot":"([^"]+)""#).unwrap());

static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h3.Title-header").unwrap());
static ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h2.Title-anchorNameH2").unwrap());

/// Real room id from the page, trying the most specific pattern first.
fn room_id_from_html(html: &str) -> Option<String> {
    let [a, b, c] = &*ROOM_ID_PATTERNS;
    first_capture(&[a, b, c], html)
}

/// Live-status code from the page: `$ROOM.show_status` ladder, then the
/// `room_status` JSON field as a last resort.
fn show_status_from_html(html: &str) -> Option<i64> {
    let [a, b, c] = &*SHOW_STATUS_PATTERNS;
    first_capture(&[a, b, c], html)
        .or_else(|| first_capture(&[&ROOM_STATUS_RE], html))
        .and_then(|s| s.parse().ok())
}

fn element_text(html: &Html, selector: &Selector) -> String {
    html.select(selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

#[derive(Debug)]
pub struct DouyuAdapter {
    http: HttpClient,
}

impl DouyuAdapter {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    async fn fetch_page(&self, url: &str, referer: &str) -> Result<String, Error> {
        self.http.get_text(url, &[("Referer", referer.to_string())]).await
    }

    async fn room_info_inner(&self, room: &RoomIdentifier) -> Result<RoomSnapshot, Error> {
        let url = format!("{BASE_URL}/{}", room.id);
        let page = self.fetch_page(&url, &url).await?;

        let document = Html::parse_document(&page);
        let title = element_text(&document, &TITLE_SELECTOR);
        let anchor = element_text(&document, &ANCHOR_SELECTOR);

        let [aa, ab, ac] = &*AVATAR_PATTERNS;
        let avatar = first_capture(&[aa, ab, ac], &page).map(|s| clean_scraped_url(&s)).unwrap_or_default();

        let [ca, cb, cc] = &*COVER_PATTERNS;
        let cover = first_capture(&[ca, cb, cc], &page).map(|s| clean_scraped_url(&s)).unwrap_or_default();

        let popular_num = first_capture(&[&HOT_RE], &page).unwrap_or_else(|| "0".to_string());

        Ok(RoomSnapshot {
            platform: Platform::Douyu,
            room_id: room.id.clone(),
            url,
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
impl RoomAdapter for DouyuAdapter {
    fn platform(&self) -> Platform {
        Platform::Douyu
    }

    async fn extract_identifier(&self, input: &str) -> Result<RoomIdentifier, Error> {
        let trimmed = input.trim();
        let host = host_of(trimmed).ok_or_else(|| Error::InvalidUrl(trimmed.to_string()))?;
        if !host.contains("douyu.com") {
            return Err(Error::UnsupportedPlatform(format!("host is not douyu.com: {trimmed}")));
        }

        // The numeric id only lives in the page, so resolve via a fetch.
        let page = self.fetch_page(trimmed, trimmed).await?;
        if let Some(id) = room_id_from_html(&page) {
            return Ok(RoomIdentifier::new(Platform::Douyu, id, BASE_URL));
        }

        // Generic fallback: an all-digits path segment.
        if let Some(path) = path_of(trimmed)
            && !path.is_empty()
            && path.chars().all(|c| c.is_ascii_digit())
        {
            return Ok(RoomIdentifier::new(Platform::Douyu, path, BASE_URL));
        }

        Err(Error::Extraction(format!("no room id in page: {trimmed}")))
    }

    async fn check_live_status(&self, room: &RoomIdentifier) -> Result<LiveStatus, Error> {
        let url = format!("{BASE_URL}/{}", room.id);
        let page = self.fetch_page(&url, &url).await?;

        let code = show_status_from_html(&page)
            .ok_or_else(|| Error::LiveStatusUnavailable(format!("no live-status marker in page: {url}")))?;

        Ok(LiveStatus { is_live: code == 1, status: code.to_string() })
    }

    async fn fetch_room_info(&self, room: &RoomIdentifier) -> RoomSnapshot {
        match self.room_info_inner(room).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(room = %room.id, error = %e, "douyu room info fetch degraded");
                RoomSnapshot::degraded(room)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOM_PAGE: &str = r#"
        <html><head><title>page</title></head><body>
        <h3 class="Title-header">Ranked grind</h3>
        <h2 class="Title-anchorNameH2">somebody</h2>
        <script>
            var $ROOM = {};
            $ROOM.room_id = 288016;
            $ROOM.show_status = 1;
            $ROOM.owner_avatar = "https:\/\/apic.douyucdn.cn\/upload\/avatar.jpg";
            $ROOM.coverSrc = "https:\/\/rpic.douyucdn.cn\/cover.jpg";
        </script>
        <script>window.$DATA = {"hot":"52.3万"};</script>
        </body></html>
    "#;

    #[test]
    fn test_room_id_ladder() {
        assert_eq!(room_id_from_html(ROOM_PAGE).as_deref(), Some("288016"));
        // The JSON-shaped fallback fires when the script variable is absent.
        assert_eq!(room_id_from_html(r#"{"room_id": 777}"#).as_deref(), Some("777"));
        assert!(room_id_from_html("<html></html>").is_none());
    }

    #[test]
    fn test_room_id_ladder_priority() {
        // Both shapes present: the script variable wins.
        let html = r#"{"room_id": 2} $ROOM.room_id = 1;"#;
        assert_eq!(room_id_from_html(html).as_deref(), Some("1"));
    }

    #[test]
    fn test_show_status_ladder() {
        assert_eq!(show_status_from_html(ROOM_PAGE), Some(1));
        assert_eq!(show_status_from_html(r#""show_status": 2"#), Some(2));
        assert_eq!(show_status_from_html(r#""online": 12, "room_status": 2"#), Some(2));
        assert!(show_status_from_html("<html></html>").is_none());
    }

    #[test]
    fn test_metadata_scrape() {
        let document = Html::parse_document(ROOM_PAGE);
        assert_eq!(element_text(&document, &TITLE_SELECTOR), "Ranked grind");
        assert_eq!(element_text(&document, &ANCHOR_SELECTOR), "somebody");

        let [a, b, c] = &*AVATAR_PATTERNS;
        let avatar = first_capture(&[a, b, c], ROOM_PAGE).map(|s| clean_scraped_url(&s)).unwrap();
        assert_eq!(avatar, "https://apic.douyucdn.cn/upload/avatar.jpg");

        assert_eq!(first_capture(&[&HOT_RE], ROOM_PAGE).as_deref(), Some("52.3万"));
    }

    #[tokio::test]
    async fn test_extract_rejects_foreign_host() {
        let adapter = DouyuAdapter::new(HttpClient::new(crate::fetch::HttpConfig::default()).unwrap());
        let err = adapter.extract_identifier("https://example.com/288016").await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedPlatform(_)));
    }
}
