use crate::error::AppError;
use crate::fields::FieldSelection;
use crate::models::{Record, RunStats};
use crate::traits::PlacesApi;

/// A resolved record plus the website to probe for an email, if any.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub record: Record,
    pub website_for_email: Option<String>,
}

/// Resolve one identifier into a field-projected record.
///
/// Every failure is logged and yields `None`; the caller moves on to the
/// next candidate.
pub async fn fetch_record<A: PlacesApi>(
    api: &A,
    place_id: &str,
    selection: &FieldSelection,
    stats: &RunStats,
) -> Option<Resolved> {
    let attributes = selection.request_attributes();
    match api.place_details(place_id, &attributes).await {
        Ok(details) => {
            stats.record_api_call();
            let (record, website_for_email) = Record::project(place_id, details, selection);
            Some(Resolved {
                record,
                website_for_email,
            })
        }
        Err(AppError::PermissionDenied(msg)) => {
            tracing::error!(%place_id, error = %msg, "Details denied: API key lacks permission or quota");
            None
        }
        Err(AppError::NotFound(msg)) => {
            tracing::warn!(%place_id, error = %msg, "Place not found");
            None
        }
        Err(e) => {
            tracing::warn!(%place_id, error = %e, "Details request failed");
            None
        }
    }
}
