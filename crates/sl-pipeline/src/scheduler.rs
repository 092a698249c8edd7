//! Batch scheduler
//!
//! Drives the resolver over every unresolved record, in input order, one
//! record at a time:
//!
//! ```text
//! for batch in unresolved.chunks(batch_size):
//!     for record in batch:
//!         stop if cancelled
//!         resolve → apply on success, keep prior state otherwise
//!         sleep(delay)
//!     checkpoint.persist(all records)
//! ```
//!
//! Records that already carry a `geocode_source` are skipped entirely, so a
//! restarted run resumes where the last checkpoint left off.

use crate::cancel::CancellationToken;
use crate::error::PipelineError;
use sl_geocode::{Resolution, Resolver};
use sl_record::{GeocodeSource, ServiceLineRecord};
use sl_store::Checkpoint;
use std::time::Duration;

/// Per-run outcome counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunTally {
    /// Resolved by the full primary query
    pub primary: usize,
    /// Resolved by the simplified query
    pub simplified: usize,
    /// Resolved by the locality centroid
    pub fallback: usize,
    /// Every strategy declined or failed
    pub failed: usize,
    /// Already resolved before the run
    pub skipped: usize,
}

impl RunTally {
    /// Count one resolution outcome
    pub fn record(&mut self, resolution: &Resolution) {
        match resolution.geocode().map(|g| &g.source) {
            Some(GeocodeSource::Primary(_)) => self.primary += 1,
            Some(GeocodeSource::Simplified(_)) => self.simplified += 1,
            Some(GeocodeSource::ZipFallback) => self.fallback += 1,
            None => self.failed += 1,
        }
    }

    /// Street-level resolutions (primary and simplified)
    #[inline]
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.primary + self.simplified
    }

    /// Records the resolver was asked about
    #[inline]
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.primary + self.simplified + self.fallback + self.failed
    }
}

/// Summary returned at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Outcome counters
    pub tally: RunTally,
    /// Batches started
    pub batches: usize,
    /// Successful checkpoints
    pub checkpoints: usize,
    /// Records in the set
    pub total: usize,
    /// Run stopped early by cancellation
    pub cancelled: bool,
}

impl std::fmt::Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let suffix = if self.cancelled { " (cancelled)" } else { "" };
        writeln!(f, "Geocoding complete{suffix}")?;
        writeln!(f, "  Succeeded: {}", self.tally.succeeded())?;
        writeln!(f, "    primary:    {}", self.tally.primary)?;
        writeln!(f, "    simplified: {}", self.tally.simplified)?;
        writeln!(f, "  Fallback:  {}", self.tally.fallback)?;
        writeln!(f, "  Failed:    {}", self.tally.failed)?;
        writeln!(f, "  Skipped:   {}", self.tally.skipped)?;
        write!(
            f,
            "  Batches:   {} ({} checkpoints)",
            self.batches, self.checkpoints
        )
    }
}

/// Sequential batch driver over a [`Resolver`]
#[derive(Debug, Clone)]
pub struct BatchScheduler {
    resolver: Resolver,
    batch_size: usize,
    delay: Duration,
    cancel: CancellationToken,
}

impl BatchScheduler {
    /// Create scheduler with batch size 10 and a 500 ms delay
    #[must_use]
    pub fn new(resolver: Resolver) -> Self {
        Self {
            resolver,
            batch_size: crate::config::DEFAULT_BATCH_SIZE,
            delay: Duration::from_millis(crate::config::DEFAULT_DELAY_MS),
            cancel: CancellationToken::new(),
        }
    }

    /// With batch size (values below one are raised to one)
    #[inline]
    #[must_use]
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// With pause after every resolver call
    #[inline]
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// With cancellation token
    #[inline]
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Resolve every unresolved record, checkpointing after each batch
    ///
    /// Per-record failures are counted, never returned. A cancelled run
    /// checkpoints the records processed so far and reports `cancelled`.
    ///
    /// # Errors
    /// `PersistenceFailure` if a checkpoint fails; the run stops there
    pub async fn run<C>(
        &self,
        records: &mut [ServiceLineRecord],
        checkpoint: &C,
    ) -> Result<RunReport, PipelineError>
    where
        C: Checkpoint + ?Sized,
    {
        let pending: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.is_resolved())
            .map(|(i, _)| i)
            .collect();

        let mut report = RunReport {
            total: records.len(),
            tally: RunTally {
                skipped: records.len() - pending.len(),
                ..RunTally::default()
            },
            ..RunReport::default()
        };
        let batch_count = pending.len().div_ceil(self.batch_size);
        tracing::info!(
            total = report.total,
            pending = pending.len(),
            skipped = report.tally.skipped,
            batches = batch_count,
            "starting geocoding run"
        );

        for (batch_index, batch) in pending.chunks(self.batch_size).enumerate() {
            report.batches += 1;

            for &index in batch {
                if self.cancel.is_cancelled() {
                    report.cancelled = true;
                    break;
                }

                let record = &mut records[index];
                let resolution = self.resolver.resolve_record(record).await;
                report.tally.record(&resolution);
                match resolution {
                    Resolution::Resolved(geocode) => {
                        tracing::debug!(
                            record_id = %record.id,
                            source = %geocode.source,
                            "record resolved"
                        );
                        record.apply_geocode(geocode);
                    }
                    Resolution::Unresolved => {
                        tracing::warn!(
                            record_id = %record.id,
                            address = %record.address,
                            "record unresolved"
                        );
                    }
                }

                if !self.delay.is_zero() {
                    tokio::time::sleep(self.delay).await;
                }
            }

            checkpoint.persist(records).map_err(|e| {
                tracing::error!(batch = batch_index + 1, error = %e, "checkpoint failed");
                PipelineError::PersistenceFailure(e)
            })?;
            report.checkpoints += 1;
            tracing::info!(
                batch = batch_index + 1,
                of = batch_count,
                succeeded = report.tally.succeeded(),
                fallback = report.tally.fallback,
                failed = report.tally.failed,
                "batch checkpointed"
            );

            if report.cancelled {
                tracing::warn!(batch = batch_index + 1, "run cancelled");
                break;
            }
        }

        tracing::info!(
            succeeded = report.tally.succeeded(),
            fallback = report.tally.fallback,
            failed = report.tally.failed,
            skipped = report.tally.skipped,
            cancelled = report.cancelled,
            "geocoding run finished"
        );
        Ok(report)
    }
}
