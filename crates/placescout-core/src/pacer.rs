//! Randomized pacing between detail lookups.
//!
//! Every candidate but the last is followed by a short random delay, and
//! every completed batch by a longer one. Sleeps end early on cancellation.

use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;

use crate::error::AppError;

/// Upper spread added on top of the batch delay base.
pub const BATCH_JITTER: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct PacingConfig {
    pub min_delay: Duration,
    pub max_delay: Duration,
    /// Candidates per batch.
    pub batch_size: usize,
    /// Lower bound of the pause between batches.
    pub batch_delay: Duration,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(1500),
            max_delay: Duration::from_secs(3),
            batch_size: 5,
            batch_delay: Duration::from_secs(10),
        }
    }
}

impl PacingConfig {
    /// No pacing at all. Handy for tests and dry runs.
    pub fn none() -> Self {
        Self {
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            batch_size: usize::MAX,
            batch_delay: Duration::ZERO,
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.min_delay > self.max_delay {
            return Err(AppError::ConfigError(format!(
                "min delay ({:?}) exceeds max delay ({:?})",
                self.min_delay, self.max_delay
            )));
        }
        if self.batch_size == 0 {
            return Err(AppError::ConfigError("batch size must be at least 1".into()));
        }
        Ok(())
    }

    fn item_delay(&self) -> Duration {
        uniform(self.min_delay, self.max_delay)
    }

    fn batch_pause(&self) -> Duration {
        uniform(self.batch_delay, self.batch_delay + BATCH_JITTER)
    }
}

fn uniform(low: Duration, high: Duration) -> Duration {
    if high <= low {
        return low;
    }
    Duration::from_secs_f64(rand::thread_rng().gen_range(low.as_secs_f64()..=high.as_secs_f64()))
}

/// Sleep for `duration` unless `cancel` fires first. Returns `false` when
/// cancelled.
pub async fn sleep_or_cancel(duration: Duration, cancel: &CancellationToken) -> bool {
    if duration.is_zero() {
        return !cancel.is_cancelled();
    }
    tokio::select! {
        () = tokio::time::sleep(duration) => true,
        () = cancel.cancelled() => false,
    }
}

/// Tracks batch position across one run's detail phase.
#[derive(Debug)]
pub struct Pacer {
    config: PacingConfig,
    in_batch: usize,
}

impl Pacer {
    pub fn new(config: PacingConfig) -> Result<Self, AppError> {
        config.validate()?;
        Ok(Self {
            config,
            in_batch: 0,
        })
    }

    /// Wait after finishing candidate `index` (0-based) of `total`.
    ///
    /// Nothing happens after the last candidate. Returns `false` if the
    /// wait was cut short by cancellation.
    pub async fn after_item(
        &mut self,
        index: usize,
        total: usize,
        cancel: &CancellationToken,
    ) -> bool {
        if index + 1 >= total {
            return !cancel.is_cancelled();
        }
        if !sleep_or_cancel(self.config.item_delay(), cancel).await {
            return false;
        }

        self.in_batch += 1;
        if self.in_batch >= self.config.batch_size {
            self.in_batch = 0;
            let pause = self.config.batch_pause();
            tracing::info!(pause_secs = pause.as_secs_f64(), "Batch complete, pausing");
            return sleep_or_cancel(pause, cancel).await;
        }
        true
    }
}
