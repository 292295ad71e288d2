//! Platform registry and URL detector.
//!
//! Maps an input URL to the adapter that owns it. Host matching runs first
//! (exact or suffix against a static table); keyword substring search over
//! the whole URL is the fallback, in a fixed priority order so detection is
//! deterministic when both would match.

use std::sync::Arc;

use roomwatch_core::{Error, Platform};

use super::{BilibiliAdapter, DouyinAdapter, DouyuAdapter, HuyaAdapter, RoomAdapter, host_of};
use crate::fetch::HttpClient;

/// Host suffix → platform. Checked before any keyword fallback.
const HOST_RULES: &[(&str, Platform)] = &[
    ("douyu.com", Platform::Douyu),
    ("huya.com", Platform::Huya),
    ("bilibili.com", Platform::Bilibili),
    ("douyin.com", Platform::Douyin),
];

/// Keyword → platform, tried in order anywhere in the URL when no host rule
/// matched.
const KEYWORD_RULES: &[(&str, Platform)] = &[
    ("douyu", Platform::Douyu),
    ("huya", Platform::Huya),
    ("bilibili", Platform::Bilibili),
    ("douyin", Platform::Douyin),
];

fn host_matches(host: &str, suffix: &str) -> bool {
    host == suffix || host.ends_with(&format!(".{suffix}"))
}

/// Detect a platform from the host alone. Infallible by design: display code
/// must always be able to render something.
pub fn detect_platform_name(input: &str) -> &'static str {
    let Some(host) = host_of(input) else {
        return "unknown";
    };
    HOST_RULES
        .iter()
        .find(|(suffix, _)| host_matches(&host, suffix))
        .map(|(_, platform)| platform.name())
        .unwrap_or("unknown")
}

/// Holds one adapter per supported platform and dispatches by URL.
pub struct Registry {
    adapters: Vec<Arc<dyn RoomAdapter>>,
}

impl Registry {
    /// Build adapters sharing one HTTP client. `douyin_api_base` overrides
    /// the douyin mirror endpoint; `None` uses the default.
    pub fn new(http: HttpClient, douyin_api_base: Option<String>) -> Self {
        let adapters: Vec<Arc<dyn RoomAdapter>> = vec![
            Arc::new(BilibiliAdapter::new(http.clone())),
            Arc::new(DouyuAdapter::new(http.clone())),
            Arc::new(HuyaAdapter::new(http.clone())),
            Arc::new(DouyinAdapter::new(http, douyin_api_base)),
        ];
        Self { adapters }
    }

    fn adapter_for(&self, platform: Platform) -> Option<Arc<dyn RoomAdapter>> {
        self.adapters.iter().find(|a| a.platform() == platform).cloned()
    }

    /// Resolve the adapter owning a URL.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for an empty input; `UnsupportedPlatform` (listing the
    /// supported platforms) when no rule matches.
    pub fn detect(&self, input: &str) -> Result<Arc<dyn RoomAdapter>, Error> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidInput("url must not be empty".to_string()));
        }

        if let Some(host) = host_of(trimmed) {
            for (suffix, platform) in HOST_RULES {
                if host_matches(&host, suffix)
                    && let Some(adapter) = self.adapter_for(*platform)
                {
                    return Ok(adapter);
                }
            }
        }

        // Host check failed; fall back to keywords anywhere in the URL.
        let lowered = trimmed.to_lowercase();
        for (keyword, platform) in KEYWORD_RULES {
            if lowered.contains(keyword)
                && let Some(adapter) = self.adapter_for(*platform)
            {
                return Ok(adapter);
            }
        }

        Err(Error::UnsupportedPlatform(format!(
            "{trimmed} (supported platforms: {})",
            Self::supported_platforms().join(", ")
        )))
    }

    /// Labels of every supported platform, in detection order.
    pub fn supported_platforms() -> Vec<&'static str> {
        Platform::ALL.iter().map(|p| p.name()).collect()
    }

    /// Whether any adapter claims the URL.
    pub fn is_supported(&self, input: &str) -> bool {
        self.detect(input).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::HttpConfig;

    fn registry() -> Registry {
        Registry::new(HttpClient::new(HttpConfig::default()).unwrap(), None)
    }

    #[test]
    fn test_detect_by_host() {
        let registry = registry();
        let cases = [
            ("https://www.douyu.com/288016", Platform::Douyu),
            ("https://www.huya.com/kpl", Platform::Huya),
            ("https://live.bilibili.com/123456", Platform::Bilibili),
            ("https://live.douyin.com/745964462470", Platform::Douyin),
        ];
        for (url, expected) in cases {
            assert_eq!(registry.detect(url).unwrap().platform(), expected, "{url}");
        }
    }

    #[test]
    fn test_detect_agrees_with_platform_name() {
        let registry = registry();
        for url in [
            "https://www.douyu.com/288016",
            "https://www.huya.com/kpl",
            "https://live.bilibili.com/123456",
            "https://live.douyin.com/745964462470",
        ] {
            let adapter = registry.detect(url).unwrap();
            assert_eq!(adapter.platform().name(), detect_platform_name(url));
        }
    }

    #[test]
    fn test_detect_keyword_fallback() {
        let registry = registry();
        // Host is a redirector; the keyword in the path decides.
        let adapter = registry.detect("https://go.example.com/to/douyu/288016").unwrap();
        assert_eq!(adapter.platform(), Platform::Douyu);
    }

    #[test]
    fn test_detect_unsupported_lists_platforms() {
        let registry = registry();
        let err = registry.detect("https://example.com/live/1").unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, Error::UnsupportedPlatform(_)));
        for name in ["bilibili", "douyu", "huya", "douyin"] {
            assert!(message.contains(name), "missing {name} in: {message}");
        }
    }

    #[test]
    fn test_detect_empty_input() {
        let err = registry().detect("   ").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_detect_platform_name_is_infallible() {
        assert_eq!(detect_platform_name("https://live.bilibili.com/1"), "bilibili");
        assert_eq!(detect_platform_name("https://www.huya.com/kpl"), "huya");
        assert_eq!(detect_platform_name("https://example.com"), "unknown");
        assert_eq!(detect_platform_name(""), "unknown");
        assert_eq!(detect_platform_name("not a url at all \u{7}"), "unknown");
    }

    #[test]
    fn test_host_suffix_not_substring() {
        // A lookalike host must not match by suffix rules...
        assert_eq!(detect_platform_name("https://notbilibili.com/1"), "unknown");
        // ...but subdomains do.
        assert_eq!(detect_platform_name("https://live.bilibili.com/1"), "bilibili");
    }

    #[test]
    fn test_is_supported() {
        let registry = registry();
        assert!(registry.is_supported("https://www.douyu.com/1"));
        assert!(!registry.is_supported("https://example.com/1"));
    }
}
