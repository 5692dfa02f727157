//! Rate-limit recovery for the upstream Places endpoints.
//!
//! Wraps any [`PlacesApi`] so that an HTTP 429 (or `OVER_QUERY_LIMIT`) is
//! absorbed by a fixed backoff followed by exactly one retry of the identical
//! request. A second rate-limit answer is escalated to a transport error so
//! the caller skips the phrase or item.
//!
//! The backoff is a plain sleep: cancellation is only observed between
//! phrases and candidates, so a pending backoff always runs to completion.
//!
//! # Example
//!
//! ```rust,no_run
//! use placescout_core::ratelimit::{RateLimitConfig, RateLimitedApi};
//! # use placescout_core::traits::PlacesApi;
//! # fn wrap<A: PlacesApi>(inner: A) {
//! let api = RateLimitedApi::new(inner, RateLimitConfig::default());
//! # }
//! ```

use std::future::Future;
use std::time::Duration;

use crate::error::AppError;
use crate::models::{PlaceDetails, SearchPage};
use crate::traits::PlacesApi;

/// Configuration for rate-limit recovery.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// How long to wait after a 429 before the single retry.
    pub backoff: Duration,
}

impl RateLimitConfig {
    pub fn new(backoff: Duration) -> Self {
        Self { backoff }
    }
}

impl Default for RateLimitConfig {
    /// 60 seconds, the upstream's per-minute quota window.
    fn default() -> Self {
        Self {
            backoff: Duration::from_secs(60),
        }
    }
}

/// A [`PlacesApi`] wrapper that retries once after a rate-limit backoff.
#[derive(Clone)]
pub struct RateLimitedApi<A> {
    inner: A,
    config: RateLimitConfig,
}

impl<A: PlacesApi> RateLimitedApi<A> {
    pub fn new(inner: A, config: RateLimitConfig) -> Self {
        Self { inner, config }
    }

    async fn with_backoff<T, Fut>(
        &self,
        what: &str,
        mut call: impl FnMut() -> Fut,
    ) -> Result<T, AppError>
    where
        Fut: Future<Output = Result<T, AppError>>,
    {
        match call().await {
            Err(AppError::RateLimitExceeded) => {
                tracing::warn!(
                    request = %what,
                    backoff_secs = self.config.backoff.as_secs(),
                    "Rate limit reached, backing off before retry"
                );
                tokio::time::sleep(self.config.backoff).await;
                match call().await {
                    Err(AppError::RateLimitExceeded) => Err(AppError::NetworkError(format!(
                        "rate limit persisted after {}s backoff ({what})",
                        self.config.backoff.as_secs()
                    ))),
                    other => other,
                }
            }
            other => other,
        }
    }
}

impl<A: PlacesApi> PlacesApi for RateLimitedApi<A> {
    async fn text_search(
        &self,
        query: &str,
        page_token: Option<&str>,
    ) -> Result<SearchPage, AppError> {
        self.with_backoff("search", || self.inner.text_search(query, page_token))
            .await
    }

    async fn place_details(
        &self,
        place_id: &str,
        fields: &[&str],
    ) -> Result<PlaceDetails, AppError> {
        self.with_backoff("details", || self.inner.place_details(place_id, fields))
            .await
    }
}
