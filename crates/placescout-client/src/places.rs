use std::time::Duration;

use placescout_core::error::AppError;
use placescout_core::models::{Candidate, PlaceDetails, SearchPage};
use placescout_core::traits::PlacesApi;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::config::PlacesConfig;

pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/place";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const UNNAMED: &str = "(unnamed)";

/// Google Places (legacy web service) client for text search and details.
///
/// Both HTTP statuses and the `status` field of the response body are mapped
/// onto [`AppError`], so callers see one taxonomy.
#[derive(Clone)]
pub struct GooglePlacesClient {
    client: Client,
    base_url: String,
    api_key: String,
    timeout_secs: u64,
}

/// Outcome of an API key probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyCheck {
    Valid,
    /// The upstream refused the key (`REQUEST_DENIED`).
    Invalid(String),
    /// Some other status; the key could not be confirmed.
    Inconclusive(String),
}

impl GooglePlacesClient {
    pub fn new(api_key: &str) -> Result<Self, AppError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: &str, base_url: &str) -> Result<Self, AppError> {
        Self::build(api_key, base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(self, timeout: Duration) -> Result<Self, AppError> {
        Self::build(&self.api_key, &self.base_url, timeout)
    }

    pub fn from_config(config: &PlacesConfig) -> Result<Self, AppError> {
        Self::build(config.require_api_key()?, &config.base_url, config.timeout)
    }

    fn build(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::NetworkError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            timeout_secs: timeout.as_secs(),
        })
    }

    /// Issue one `"test"` search and classify the key from the body status.
    pub async fn validate_key(&self) -> Result<KeyCheck, AppError> {
        let body: SearchResponse = self
            .get_json("textsearch", &[("query", "test")])
            .await?;
        Ok(match body.status.as_str() {
            "OK" | "ZERO_RESULTS" | "INVALID_REQUEST" => KeyCheck::Valid,
            "REQUEST_DENIED" => KeyCheck::Invalid(
                body.error_message
                    .unwrap_or_else(|| "request denied".to_string()),
            ),
            other => KeyCheck::Inconclusive(match body.error_message {
                Some(msg) => format!("{other}: {msg}"),
                None => other.to_string(),
            }),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, AppError> {
        let url = format!("{}/{endpoint}/json", self.base_url);

        // Strip URLs from transport errors: they carry the key.
        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Timeout(self.timeout_secs)
                } else if e.is_connect() {
                    AppError::NetworkError(format!("Connection failed: {}", e.without_url()))
                } else {
                    AppError::NetworkError(e.without_url().to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let code = status.as_u16();
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            return Err(AppError::from_status(code, format!("{endpoint}: {snippet}")));
        }

        response.json::<T>().await.map_err(|e| {
            AppError::Generic(format!(
                "Failed to parse {endpoint} response: {}",
                e.without_url()
            ))
        })
    }
}

// ---- Places API wire types ----

#[derive(Deserialize)]
struct SearchResponse {
    status: String,
    #[serde(default)]
    results: Vec<SearchResult>,
    next_page_token: Option<String>,
    error_message: Option<String>,
}

#[derive(Deserialize)]
struct SearchResult {
    place_id: Option<String>,
    name: Option<String>,
}

#[derive(Deserialize)]
struct DetailsResponse {
    status: String,
    result: Option<PlaceDetails>,
    error_message: Option<String>,
}

/// Map an in-body status onto the error taxonomy.
///
/// `INVALID_REQUEST` on details means the identifier is unusable, which the
/// pipeline treats like a missing place.
fn check_body_status(
    status: &str,
    error_message: Option<String>,
    details: bool,
) -> Result<(), AppError> {
    let message = || error_message.clone().unwrap_or_else(|| status.to_string());
    match status {
        "OK" | "ZERO_RESULTS" => Ok(()),
        "OVER_QUERY_LIMIT" => Err(AppError::RateLimitExceeded),
        "REQUEST_DENIED" => Err(AppError::PermissionDenied(message())),
        "NOT_FOUND" => Err(AppError::NotFound(message())),
        "INVALID_REQUEST" if details => Err(AppError::NotFound(message())),
        "INVALID_REQUEST" => Err(AppError::HttpError {
            status: 400,
            message: message(),
        }),
        other => Err(AppError::Generic(format!(
            "Unexpected Places status {other}: {}",
            message()
        ))),
    }
}

impl PlacesApi for GooglePlacesClient {
    async fn text_search(
        &self,
        query: &str,
        page_token: Option<&str>,
    ) -> Result<SearchPage, AppError> {
        let mut params = vec![("query", query), ("fields", "place_id,name")];
        if let Some(token) = page_token {
            params.push(("pagetoken", token));
        }
        let body: SearchResponse = self.get_json("textsearch", &params).await?;
        check_body_status(&body.status, body.error_message, false)?;

        let returned = body.results.len();
        let candidates: Vec<Candidate> = body
            .results
            .into_iter()
            .filter_map(|r| {
                let place_id = r.place_id.filter(|id| !id.is_empty())?;
                Some(Candidate::new(
                    place_id,
                    r.name.unwrap_or_else(|| UNNAMED.to_string()),
                ))
            })
            .collect();
        if candidates.len() < returned {
            tracing::debug!(
                %query,
                dropped = returned - candidates.len(),
                "Search results without place_id dropped"
            );
        }

        Ok(SearchPage {
            candidates,
            next_page_token: body.next_page_token.filter(|t| !t.is_empty()),
        })
    }

    async fn place_details(
        &self,
        place_id: &str,
        fields: &[&str],
    ) -> Result<PlaceDetails, AppError> {
        let fields = fields.join(",");
        let body: DetailsResponse = self
            .get_json(
                "details",
                &[("place_id", place_id), ("fields", fields.as_str())],
            )
            .await?;
        check_body_status(&body.status, body.error_message, true)?;
        Ok(body.result.unwrap_or_default())
    }
}
