use std::time::Duration;

use placescout_core::error::AppError;
use placescout_core::traits::PageFetcher;
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};

/// Desktop browser identity; many small business sites reject unknown agents.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Website fetcher using reqwest.
///
/// Downloads raw HTML with a desktop User-Agent and a per-request timeout.
/// Only HTTP 200 counts as success.
#[derive(Clone)]
pub struct ReqwestPageFetcher {
    client: Client,
}

impl ReqwestPageFetcher {
    pub fn new() -> Result<Self, AppError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("es-ES,es;q=0.9,en;q=0.8"),
        );

        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| AppError::NetworkError(e.to_string()))?;

        Ok(Self { client })
    }
}

impl PageFetcher for ReqwestPageFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String, AppError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Timeout(timeout.as_secs())
                } else if e.is_connect() {
                    AppError::NetworkError(format!("Connection failed: {e}"))
                } else {
                    AppError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(AppError::from_status(status, format!("HTTP {status} for {url}")));
        }

        response
            .text()
            .await
            .map_err(|e| AppError::NetworkError(format!("Failed to read response body: {e}")))
    }
}
