pub mod checkpoint;
pub mod dedup;
pub mod details;
pub mod email;
pub mod error;
pub mod fields;
pub mod models;
pub mod output;
pub mod pacer;
pub mod pipeline;
pub mod query;
pub mod ratelimit;
pub mod search;
pub mod traits;
pub mod util;

#[cfg(test)]
pub mod testutil;

pub use error::AppError;
pub use fields::{Field, FieldSelection};
pub use models::{Candidate, PlaceDetails, Record, RunStats, SearchPage};
pub use output::OutputFormat;
pub use pipeline::{HarvestPipeline, RunRequest, RunStatus, RunSummary, TracingReporter};
pub use traits::{PageFetcher, PlacesApi};
