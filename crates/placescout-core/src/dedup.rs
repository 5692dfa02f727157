use std::collections::HashSet;
use std::path::Path;

use serde_json::Value;

use crate::error::AppError;
use crate::fields::Field;
use crate::models::Candidate;
use crate::output::{self, OutputFormat};

/// Identifiers already present in the destination or accepted this run.
///
/// Grows monotonically and is the only thing consulted to reject duplicates.
#[derive(Debug, Default, Clone)]
pub struct KnownIdentifiers {
    ids: HashSet<String>,
}

/// Outcome of filtering one phrase's candidates.
#[derive(Debug, Default)]
pub struct FilterOutcome {
    pub survivors: Vec<Candidate>,
    pub duplicates: usize,
}

impl KnownIdentifiers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from the destination file's own identifiers.
    ///
    /// A missing file yields an empty set. An unreadable file is reported and
    /// also yields an empty set; the file itself is not touched here.
    pub fn load(path: &Path, format: OutputFormat) -> Self {
        if !path.exists() {
            return Self::new();
        }
        match read_ids(path, format) {
            Ok(ids) => Self { ids },
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Could not read existing identifiers");
                Self::new()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Drop already-known candidates and register the survivors at once,
    /// so neither a later phrase nor a repeat within this page can bring
    /// them back.
    pub fn filter_new(&mut self, candidates: Vec<Candidate>) -> FilterOutcome {
        let mut outcome = FilterOutcome::default();
        for candidate in candidates {
            if self.ids.insert(candidate.place_id.clone()) {
                outcome.survivors.push(candidate);
            } else {
                outcome.duplicates += 1;
            }
        }
        outcome
    }
}

fn read_ids(path: &Path, format: OutputFormat) -> Result<HashSet<String>, AppError> {
    let key = Field::PlaceId.output_key();
    let mut ids = HashSet::new();
    match format {
        OutputFormat::Json => {
            for item in output::read_json_array(path)? {
                if let Some(Value::String(id)) = item.get(key) {
                    if !id.is_empty() {
                        ids.insert(id.clone());
                    }
                }
            }
        }
        OutputFormat::Csv => {
            let (header, rows) = output::read_csv(path)?;
            if let Some(col) = header.iter().position(|h| h == key) {
                for row in rows {
                    if let Some(id) = row.get(col).filter(|id| !id.is_empty()) {
                        ids.insert(id.to_string());
                    }
                }
            }
        }
    }
    Ok(ids)
}
