use std::time::Duration;

use crate::models::{Candidate, RunStats};
use crate::traits::PlacesApi;

/// Most results the upstream returns for one query across all pages.
pub const UPSTREAM_RESULT_LIMIT: usize = 60;

/// Drives paginated text search for one phrase at a time.
#[derive(Debug, Clone)]
pub struct SearchAggregator {
    /// Wait before a continuation token becomes usable upstream.
    page_token_delay: Duration,
}

impl Default for SearchAggregator {
    fn default() -> Self {
        Self {
            page_token_delay: Duration::from_secs(2),
        }
    }
}

impl SearchAggregator {
    pub fn new(page_token_delay: Duration) -> Self {
        Self { page_token_delay }
    }

    /// Collect candidates for `phrase` until the pages run out or `cap` is
    /// reached. A page that overshoots the cap is kept whole.
    ///
    /// Any error ends this phrase's search and returns what was gathered so
    /// far; rate-limit recovery is the job of the [`PlacesApi`] wrapper.
    pub async fn search<A: PlacesApi>(
        &self,
        api: &A,
        phrase: &str,
        cap: Option<usize>,
        stats: &RunStats,
    ) -> Vec<Candidate> {
        let cap = cap.filter(|&c| c > 0);
        let mut found = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = match api.text_search(phrase, page_token.as_deref()).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!(%phrase, error = %e, kept = found.len(), "Search aborted");
                    break;
                }
            };
            stats.record_api_call();
            found.extend(page.candidates);

            if cap.is_some_and(|c| found.len() >= c) {
                tracing::debug!(%phrase, found = found.len(), "Result cap reached");
                break;
            }
            match page.next_page_token {
                Some(token) => {
                    tokio::time::sleep(self.page_token_delay).await;
                    page_token = Some(token);
                }
                None => break,
            }
        }

        found
    }
}
