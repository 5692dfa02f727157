use std::sync::atomic::{AtomicU64, Ordering};

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::fields::{Field, FieldSelection};

/// List price of one text-search or details call, in USD.
pub const COST_PER_CALL: f64 = 0.017;

/// An (identifier, display name) pair returned by a text search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub place_id: String,
    pub name: String,
}

impl Candidate {
    pub fn new(place_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            place_id: place_id.into(),
            name: name.into(),
        }
    }
}

/// One page of text-search results.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub candidates: Vec<Candidate>,
    /// Continuation token; only valid after a short upstream delay.
    pub next_page_token: Option<String>,
}

/// The `result` object of a place details response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaceDetails {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub formatted_phone_number: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub user_ratings_total: Option<u64>,
    #[serde(default)]
    pub opening_hours: Option<OpeningHours>,
    #[serde(default)]
    pub price_level: Option<u8>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpeningHours {
    #[serde(default)]
    pub weekday_text: Vec<String>,
}

impl OpeningHours {
    /// Readable one-line summary, e.g. `"Monday: 9AM–5PM; Tuesday: ..."`.
    pub fn summary(&self) -> Option<String> {
        if self.weekday_text.is_empty() {
            None
        } else {
            Some(self.weekday_text.join("; "))
        }
    }
}

/// A resolved, field-projected business record.
///
/// Unselected fields are always `None`. The identifier is kept for
/// deduplication and only written out when `place_id` is selected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub place_id: String,
    pub title: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub rating: Option<f64>,
    pub total_ratings: Option<u64>,
    pub opening_hours: Option<String>,
    pub price_level: Option<u8>,
    pub email: Option<String>,
}

impl Record {
    /// Project upstream details onto the selected fields.
    ///
    /// `website_for_email` is the website regardless of whether it is
    /// emitted, so the email step can probe it.
    pub fn project(
        place_id: &str,
        details: PlaceDetails,
        selection: &FieldSelection,
    ) -> (Self, Option<String>) {
        let pick = |field: Field| selection.contains(field);
        let website_for_email = if pick(Field::Email) {
            details.website.clone()
        } else {
            None
        };
        let record = Record {
            place_id: place_id.to_string(),
            title: pick(Field::Title).then(|| details.name.clone().unwrap_or_default()),
            phone: details.formatted_phone_number.filter(|_| pick(Field::Phone)),
            website: details.website.filter(|_| pick(Field::Website)),
            address: details.formatted_address.filter(|_| pick(Field::Address)),
            rating: details.rating.filter(|_| pick(Field::Rating)),
            total_ratings: details
                .user_ratings_total
                .filter(|_| pick(Field::TotalRatings)),
            opening_hours: details
                .opening_hours
                .and_then(|h| h.summary())
                .filter(|_| pick(Field::OpeningHours)),
            price_level: details.price_level.filter(|_| pick(Field::PriceLevel)),
            email: None,
        };
        (record, website_for_email)
    }

    /// Display name for logs.
    pub fn label(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.place_id)
    }

    fn value_of(&self, field: Field) -> Option<Value> {
        match field {
            Field::Title => self.title.clone().map(Value::from),
            Field::Phone => self.phone.clone().map(Value::from),
            Field::Website => self.website.clone().map(Value::from),
            Field::Address => self.address.clone().map(Value::from),
            Field::PlaceId => Some(Value::from(self.place_id.clone())),
            Field::Rating => self.rating.map(Value::from),
            Field::TotalRatings => self.total_ratings.map(Value::from),
            Field::OpeningHours => self.opening_hours.clone().map(Value::from),
            Field::PriceLevel => self.price_level.map(Value::from),
            Field::Email => self.email.clone().map(Value::from),
        }
    }

    /// JSON object with only selected, present fields. Absent values are
    /// omitted, never `null`.
    pub fn to_json(&self, selection: &FieldSelection) -> Value {
        let mut obj = Map::new();
        for field in selection.iter() {
            if let Some(value) = self.value_of(field) {
                obj.insert(field.output_key().to_string(), value);
            }
        }
        Value::Object(obj)
    }

    /// CSV row aligned with [`FieldSelection::output_keys`]; absent values
    /// become empty cells.
    pub fn to_csv_row(&self, selection: &FieldSelection) -> Vec<String> {
        selection
            .iter()
            .map(|field| match self.value_of(field) {
                Some(Value::String(s)) => s,
                Some(other) => other.to_string(),
                None => String::new(),
            })
            .collect()
    }
}

/// Run-scoped counters shared with the caller.
///
/// Only the pipeline writes; outside readers perform plain atomic loads.
#[derive(Debug, Default)]
pub struct RunStats {
    api_calls: AtomicU64,
    processed: AtomicU64,
    total: AtomicU64,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_api_call(&self) {
        self.api_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn api_calls(&self) -> u64 {
        self.api_calls.load(Ordering::Relaxed)
    }

    pub fn estimated_cost(&self) -> f64 {
        self.api_calls() as f64 * COST_PER_CALL
    }

    pub fn set_total(&self, total: u64) {
        self.total.store(total, Ordering::Relaxed);
    }

    pub fn set_processed(&self, processed: u64) {
        self.processed.store(processed, Ordering::Relaxed);
    }

    /// `(processed, total)` candidates of the detail phase.
    pub fn progress(&self) -> (u64, u64) {
        (
            self.processed.load(Ordering::Relaxed),
            self.total.load(Ordering::Relaxed),
        )
    }
}
