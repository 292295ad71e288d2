//! HTTP transport shared by all platform adapters.
//!
//! One blocking-free client with a fixed short timeout. Platforms serve
//! different markup to non-browser agents, so every request goes out with a
//! browser User-Agent plus whatever extra headers the adapter supplies
//! (Referer, Origin, Cookie). There is no retry policy: a failed fetch is
//! recorded as failed for this cycle and the next poll is the retry.

use std::time::{Duration, Instant};

use reqwest::Client;
use roomwatch_core::Error;

/// Configuration for the HTTP client.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// User agent sent with every request.
    pub user_agent: String,

    /// Request timeout (default: 10s).
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5).
    pub max_redirects: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
                .to_string(),
            timeout: Duration::from_secs(10),
            max_redirects: 5,
        }
    }
}

/// HTTP client used by the platform adapters.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: Client,
    config: HttpConfig,
}

impl HttpClient {
    /// Create a new client with the given configuration.
    pub fn new(config: HttpConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::HttpError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// GET a URL and return the response body as text.
    ///
    /// `headers` are extra request headers as (name, value) pairs. Non-2xx
    /// statuses, connect errors, and body-read errors map to
    /// [`Error::HttpError`]; timeouts map to [`Error::FetchTimeout`].
    pub async fn get_text(&self, url: &str, headers: &[(&str, String)]) -> Result<String, Error> {
        let start = Instant::now();

        let mut request = self.http.get(url);
        for (name, value) in headers {
            request = request.header(*name, value.as_str());
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::FetchTimeout(format!("{url}: {e}"))
            } else {
                Error::HttpError(format!("network error: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpError(format!("status {} from {url}", status.as_u16())));
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                Error::FetchTimeout(format!("{url}: {e}"))
            } else {
                Error::HttpError(format!("failed to read response: {e}"))
            }
        })?;

        tracing::debug!("fetched {} in {}ms ({} bytes)", url, start.elapsed().as_millis(), body.len());

        Ok(body)
    }

    /// GET a URL and parse the body as JSON.
    pub async fn get_json(&self, url: &str, headers: &[(&str, String)]) -> Result<serde_json::Value, Error> {
        let body = self.get_text(url, headers).await?;
        serde_json::from_str(&body).map_err(|e| Error::HttpError(format!("invalid JSON from {url}: {e}")))
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_config_default() {
        let config = HttpConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.max_redirects, 5);
        assert!(config.user_agent.contains("Chrome"));
    }

    #[tokio::test]
    async fn test_http_client_new() {
        let client = HttpClient::new(HttpConfig::default());
        assert!(client.is_ok());
    }
}
