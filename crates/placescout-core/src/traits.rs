use std::future::Future;
use std::time::Duration;

use crate::error::AppError;
use crate::models::{PlaceDetails, SearchPage};

/// The two upstream listing endpoints.
///
/// Implementations map HTTP and in-body statuses onto [`AppError`]:
/// 429 to `RateLimitExceeded`, 403 to `PermissionDenied`, 404 to `NotFound`.
pub trait PlacesApi: Send + Sync + Clone {
    /// One page of free-text search results.
    fn text_search(
        &self,
        query: &str,
        page_token: Option<&str>,
    ) -> impl Future<Output = Result<SearchPage, AppError>> + Send;

    /// Details for one place, restricted to `fields`.
    fn place_details(
        &self,
        place_id: &str,
        fields: &[&str],
    ) -> impl Future<Output = Result<PlaceDetails, AppError>> + Send;
}

/// Fetches raw HTML from a business website.
pub trait PageFetcher: Send + Sync + Clone {
    /// Returns the body of an HTTP 200 response; any other status is an error.
    fn fetch(
        &self,
        url: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<String, AppError>> + Send;
}
