//! Test utilities: mock implementations of the core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::collections::{HashMap, HashSet, VecDeque};
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::AppError;
use crate::models::{Candidate, PlaceDetails, SearchPage};
use crate::pipeline::{PipelineEvent, ProgressReporter};
use crate::traits::{PageFetcher, PlacesApi};

/// Build a search page whose candidates are named after their ids.
pub fn page(ids: &[&str], next_page_token: Option<&str>) -> SearchPage {
    SearchPage {
        candidates: ids.iter().map(|id| Candidate::new(*id, *id)).collect(),
        next_page_token: next_page_token.map(str::to_string),
    }
}

// ---------------------------------------------------------------------------
// MockPlacesApi
// ---------------------------------------------------------------------------

type Queue<T> = Arc<Mutex<VecDeque<Result<T, AppError>>>>;

/// Mock Places API with scripted responses and call recording.
///
/// Search responses are looked up per query first, then taken from a shared
/// queue; an exhausted script yields an empty final page. Details come from
/// the queue first, then from a per-place map, then default to a record
/// named after the place id.
#[derive(Clone, Default)]
pub struct MockPlacesApi {
    search_queue: Queue<SearchPage>,
    search_by_query: Arc<Mutex<HashMap<String, VecDeque<Result<SearchPage, AppError>>>>>,
    details_queue: Queue<PlaceDetails>,
    details_by_id: Arc<Mutex<HashMap<String, PlaceDetails>>>,
    search_calls: Arc<Mutex<Vec<(String, Option<String>)>>>,
    details_calls: Arc<Mutex<Vec<String>>>,
}

impl MockPlacesApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search_responses(self, responses: Vec<Result<SearchPage, AppError>>) -> Self {
        self.search_queue.lock().unwrap().extend(responses);
        self
    }

    pub fn with_query(self, query: &str, responses: Vec<Result<SearchPage, AppError>>) -> Self {
        self.search_by_query
            .lock()
            .unwrap()
            .entry(query.to_string())
            .or_default()
            .extend(responses);
        self
    }

    pub fn with_details_responses(self, responses: Vec<Result<PlaceDetails, AppError>>) -> Self {
        self.details_queue.lock().unwrap().extend(responses);
        self
    }

    pub fn with_details(self, place_id: &str, details: PlaceDetails) -> Self {
        self.details_by_id
            .lock()
            .unwrap()
            .insert(place_id.to_string(), details);
        self
    }

    /// Recorded `(query, page_token)` pairs.
    pub fn search_calls(&self) -> Vec<(String, Option<String>)> {
        self.search_calls.lock().unwrap().clone()
    }

    /// Recorded place ids passed to `place_details`.
    pub fn details_calls(&self) -> Vec<String> {
        self.details_calls.lock().unwrap().clone()
    }
}

impl PlacesApi for MockPlacesApi {
    async fn text_search(
        &self,
        query: &str,
        page_token: Option<&str>,
    ) -> Result<SearchPage, AppError> {
        self.search_calls
            .lock()
            .unwrap()
            .push((query.to_string(), page_token.map(str::to_string)));

        if let Some(queue) = self.search_by_query.lock().unwrap().get_mut(query) {
            if let Some(response) = queue.pop_front() {
                return response;
            }
        }
        self.search_queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(SearchPage::default()))
    }

    async fn place_details(
        &self,
        place_id: &str,
        _fields: &[&str],
    ) -> Result<PlaceDetails, AppError> {
        self.details_calls.lock().unwrap().push(place_id.to_string());

        if let Some(response) = self.details_queue.lock().unwrap().pop_front() {
            return response;
        }
        let details = self
            .details_by_id
            .lock()
            .unwrap()
            .get(place_id)
            .cloned()
            .unwrap_or_else(|| PlaceDetails {
                name: Some(format!("Business {place_id}")),
                ..PlaceDetails::default()
            });
        Ok(details)
    }
}

// ---------------------------------------------------------------------------
// MockPageFetcher
// ---------------------------------------------------------------------------

/// Mock website fetcher serving fixed HTML per URL.
///
/// Unknown URLs answer HTTP 404; URLs marked with [`with_timeout`] time out.
///
/// [`with_timeout`]: MockPageFetcher::with_timeout
#[derive(Clone, Default)]
pub struct MockPageFetcher {
    pages: Arc<Mutex<HashMap<String, String>>>,
    timeouts: Arc<Mutex<HashSet<String>>>,
    calls: Arc<Mutex<Vec<(String, Duration)>>>,
}

impl MockPageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: &str, html: &str) -> Self {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), html.to_string());
        self
    }

    pub fn with_timeout(self, url: &str) -> Self {
        self.timeouts.lock().unwrap().insert(url.to_string());
        self
    }

    /// Recorded `(url, timeout)` pairs.
    pub fn calls(&self) -> Vec<(String, Duration)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.calls().into_iter().map(|(url, _)| url).collect()
    }
}

impl PageFetcher for MockPageFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String, AppError> {
        self.calls.lock().unwrap().push((url.to_string(), timeout));

        if self.timeouts.lock().unwrap().contains(url) {
            return Err(AppError::Timeout(timeout.as_secs()));
        }
        self.pages
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| AppError::from_status(404, format!("no page at {url}")))
    }
}

// ---------------------------------------------------------------------------
// RecordingReporter
// ---------------------------------------------------------------------------

/// Reporter that keeps a debug rendering of every event.
#[derive(Clone, Default)]
pub struct RecordingReporter {
    pub events: Arc<Mutex<Vec<String>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.events
            .lock()
            .unwrap()
            .iter()
            .any(|event| event.contains(needle))
    }
}

impl ProgressReporter for RecordingReporter {
    fn report(&self, event: PipelineEvent<'_>) {
        self.events.lock().unwrap().push(format!("{event:?}"));
    }
}

// ---------------------------------------------------------------------------
// Log capture
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` under a plain-text subscriber and return everything it logged.
pub fn capture_logs(f: impl FnOnce()) -> String {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    let bytes = buffer.0.lock().unwrap().clone();
    String::from_utf8_lossy(&bytes).into_owned()
}
