use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::checkpoint::CheckpointManager;
use crate::dedup::KnownIdentifiers;
use crate::details::{Resolved, fetch_record};
use crate::email::{EmailDiscovery, ProbeConfig};
use crate::error::AppError;
use crate::fields::{Field, FieldSelection};
use crate::models::{Candidate, Record, RunStats};
use crate::output::{self, OutputFormat};
use crate::pacer::{Pacer, PacingConfig};
use crate::search::{SearchAggregator, UPSTREAM_RESULT_LIMIT};
use crate::traits::{PageFetcher, PlacesApi};

/// Events emitted by the pipeline for monitoring/logging.
#[derive(Debug, Clone)]
pub enum PipelineEvent<'a> {
    Started {
        phrases: usize,
        known: usize,
        destination: &'a Path,
    },
    /// The cap is unset or above what one phrase can return upstream.
    ResultLimit {
        limit: usize,
    },
    PhraseStarted {
        index: usize,
        total: usize,
        phrase: &'a str,
    },
    PhraseSearched {
        phrase: &'a str,
        found: usize,
        new: usize,
        duplicates: usize,
    },
    /// No candidate survived deduplication. `raw_found == 0` means the
    /// searches themselves came back empty.
    NothingNew {
        raw_found: usize,
    },
    DetailsStarted {
        total: usize,
    },
    RecordResolved {
        index: usize,
        total: usize,
        record: &'a Record,
    },
    RecordSkipped {
        index: usize,
        total: usize,
        candidate: &'a Candidate,
    },
    Cancelled {
        processed: usize,
        accumulated: usize,
    },
    Flushed {
        path: &'a Path,
        written: usize,
        total_in_file: usize,
    },
    Finished {
        summary: &'a RunSummary,
    },
}

/// Trait for receiving pipeline events (decoupled logging).
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: PipelineEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn report(&self, event: PipelineEvent<'_>) {
        match event {
            PipelineEvent::Started {
                phrases,
                known,
                destination,
            } => {
                tracing::info!(%phrases, %known, destination = %destination.display(), "Run started");
            }
            PipelineEvent::ResultLimit { limit } => {
                tracing::info!(
                    "Upstream returns at most {limit} results per phrase; narrower phrases yield more"
                );
            }
            PipelineEvent::PhraseStarted {
                index,
                total,
                phrase,
            } => {
                tracing::info!("Searching [{}/{}]: {phrase}", index + 1, total);
            }
            PipelineEvent::PhraseSearched {
                phrase,
                found,
                new,
                duplicates,
            } => {
                tracing::info!(%phrase, %found, %new, %duplicates, "Phrase searched");
            }
            PipelineEvent::NothingNew { raw_found: 0 } => {
                tracing::warn!("No results found for any phrase");
            }
            PipelineEvent::NothingNew { raw_found } => {
                tracing::info!(%raw_found, "Every result is already in the destination file");
            }
            PipelineEvent::DetailsStarted { total } => {
                tracing::info!(%total, "Fetching details for new listings");
            }
            PipelineEvent::RecordResolved {
                index,
                total,
                record,
            } => {
                tracing::info!(
                    email = record.email.as_deref().unwrap_or("-"),
                    "[{}/{}] {}",
                    index + 1,
                    total,
                    record.label()
                );
            }
            PipelineEvent::RecordSkipped {
                index,
                total,
                candidate,
            } => {
                tracing::warn!(
                    place_id = %candidate.place_id,
                    "[{}/{}] Skipped {}",
                    index + 1,
                    total,
                    candidate.name
                );
            }
            PipelineEvent::Cancelled {
                processed,
                accumulated,
            } => {
                tracing::warn!(%processed, %accumulated, "Run cancelled, saving what was collected");
            }
            PipelineEvent::Flushed {
                path,
                written,
                total_in_file,
            } => {
                tracing::info!(path = %path.display(), %written, %total_in_file, "Results saved");
            }
            PipelineEvent::Finished { summary } => {
                tracing::info!(
                    status = ?summary.status,
                    api_calls = summary.api_calls,
                    estimated_cost = %format!("${:.2}", summary.estimated_cost),
                    "Run finished"
                );
            }
        }
    }
}

/// Everything one run needs to know.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub phrases: Vec<String>,
    pub destination: PathBuf,
    pub format: OutputFormat,
    pub selection: FieldSelection,
    /// Per-phrase result cap; `None` or `Some(0)` means unlimited.
    pub cap: Option<usize>,
    pub pacing: PacingConfig,
    /// Where the run checkpoint lives.
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    NothingNew,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub status: RunStatus,
    pub phrases_searched: usize,
    pub raw_found: usize,
    pub unique_new: usize,
    pub written: usize,
    /// Records in the destination after the flush; `None` if nothing was written.
    pub total_in_file: Option<usize>,
    pub api_calls: u64,
    pub estimated_cost: f64,
}

/// Drives one acquisition run from phrases to a flushed destination file.
///
/// Construct one pipeline per run: its [`RunStats`] accumulate.
pub struct HarvestPipeline<A, F>
where
    A: PlacesApi,
    F: PageFetcher,
{
    api: A,
    fetcher: F,
    search: SearchAggregator,
    probe: ProbeConfig,
    stats: Arc<RunStats>,
}

impl<A, F> HarvestPipeline<A, F>
where
    A: PlacesApi,
    F: PageFetcher,
{
    pub fn new(api: A, fetcher: F) -> Self {
        Self {
            api,
            fetcher,
            search: SearchAggregator::default(),
            probe: ProbeConfig::default(),
            stats: Arc::new(RunStats::new()),
        }
    }

    pub fn with_search(mut self, search: SearchAggregator) -> Self {
        self.search = search;
        self
    }

    pub fn with_probe_config(mut self, probe: ProbeConfig) -> Self {
        self.probe = probe;
        self
    }

    /// Live counters, readable from other tasks while the run is going.
    pub fn stats(&self) -> Arc<RunStats> {
        Arc::clone(&self.stats)
    }

    /// Run the whole pipeline.
    ///
    /// Search and detail failures are logged and skipped. Cancellation stops
    /// at the next phrase or candidate boundary and still flushes. Only a
    /// pacing misconfiguration or a failed flush returns an error.
    pub async fn run<R: ProgressReporter>(
        &self,
        request: RunRequest,
        cancel: CancellationToken,
        reporter: &R,
    ) -> Result<RunSummary, AppError> {
        let mut pacer = Pacer::new(request.pacing.clone())?;
        let RunRequest {
            phrases,
            destination,
            format,
            selection,
            cap,
            data_dir,
            ..
        } = request;
        let cap = cap.filter(|&c| c > 0);

        if !selection.contains(Field::PlaceId) {
            tracing::warn!(
                "place_id is not selected; later runs cannot recognise these records as duplicates"
            );
        }

        let mut known = KnownIdentifiers::load(&destination, format);
        reporter.report(PipelineEvent::Started {
            phrases: phrases.len(),
            known: known.len(),
            destination: &destination,
        });
        if cap.is_none_or(|c| c > UPSTREAM_RESULT_LIMIT) {
            reporter.report(PipelineEvent::ResultLimit {
                limit: UPSTREAM_RESULT_LIMIT,
            });
        }

        let mut cancelled = false;
        let mut phrases_searched = 0;
        let mut raw_found = 0;
        let mut pending: Vec<Candidate> = Vec::new();

        for (index, phrase) in phrases.iter().enumerate() {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            reporter.report(PipelineEvent::PhraseStarted {
                index,
                total: phrases.len(),
                phrase,
            });

            let found = self.search.search(&self.api, phrase, cap, &self.stats).await;
            let found_count = found.len();
            let outcome = known.filter_new(found);
            reporter.report(PipelineEvent::PhraseSearched {
                phrase,
                found: found_count,
                new: outcome.survivors.len(),
                duplicates: outcome.duplicates,
            });

            raw_found += found_count;
            phrases_searched += 1;
            pending.extend(outcome.survivors);
        }

        let unique_new = pending.len();
        if pending.is_empty() {
            if !cancelled {
                reporter.report(PipelineEvent::NothingNew { raw_found });
            }
            let summary = RunSummary {
                status: if cancelled {
                    RunStatus::Cancelled
                } else {
                    RunStatus::NothingNew
                },
                phrases_searched,
                raw_found,
                unique_new,
                written: 0,
                total_in_file: None,
                api_calls: self.stats.api_calls(),
                estimated_cost: self.stats.estimated_cost(),
            };
            reporter.report(PipelineEvent::Finished { summary: &summary });
            return Ok(summary);
        }

        let total = pending.len();
        self.stats.set_total(total as u64);
        reporter.report(PipelineEvent::DetailsStarted { total });

        let checkpoint = CheckpointManager::new(&data_dir);
        let mut discovery = EmailDiscovery::with_config(self.fetcher.clone(), self.probe.clone());
        let mut records: Vec<Record> = Vec::with_capacity(total);
        let mut processed = 0;

        for (index, candidate) in pending.iter().enumerate() {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            match fetch_record(&self.api, &candidate.place_id, &selection, &self.stats).await {
                Some(Resolved {
                    mut record,
                    website_for_email,
                }) => {
                    if let Some(site) = website_for_email {
                        record.email = discovery.discover(&site).await;
                    }
                    reporter.report(PipelineEvent::RecordResolved {
                        index,
                        total,
                        record: &record,
                    });
                    records.push(record);
                    checkpoint.maybe_save(&destination, records.len(), records.len());
                }
                None => reporter.report(PipelineEvent::RecordSkipped {
                    index,
                    total,
                    candidate,
                }),
            }

            processed = index + 1;
            self.stats.set_processed(processed as u64);

            if !pacer.after_item(index, total, &cancel).await {
                cancelled = true;
                break;
            }
        }

        if cancelled {
            reporter.report(PipelineEvent::Cancelled {
                processed,
                accumulated: records.len(),
            });
        }

        let total_in_file = if records.is_empty() {
            None
        } else {
            let in_file = output::flush(format, &destination, &records, &selection, true)?;
            reporter.report(PipelineEvent::Flushed {
                path: &destination,
                written: records.len(),
                total_in_file: in_file,
            });
            Some(in_file)
        };
        checkpoint.clear();

        let summary = RunSummary {
            status: if cancelled {
                RunStatus::Cancelled
            } else {
                RunStatus::Completed
            },
            phrases_searched,
            raw_found,
            unique_new,
            written: records.len(),
            total_in_file,
            api_calls: self.stats.api_calls(),
            estimated_cost: self.stats.estimated_cost(),
        };
        reporter.report(PipelineEvent::Finished { summary: &summary });
        Ok(summary)
    }
}
