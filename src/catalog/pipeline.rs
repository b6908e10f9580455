//! Embedding pipeline: normalize, check existence, embed per lane, then batch and persist.
//!
//! [`EmbeddingPipeline::run`] processes records strictly in order, one lane at
//! a time, with a minimum interval between embedding calls. Failures are
//! contained at the narrowest boundary that owns them: a failed lane is
//! dropped from its record, a record with no successful lane is counted as
//! failed, a failed batch commit counts all of its records as failed. Only
//! Configuration errors end the run early.
//!
//! Without `force_refresh`, only lanes that do not yet hold a vector are
//! generated; a record whose lanes are all present costs no embedding calls.

use indicatif::ProgressBar;
use rusqlite::Connection;
use serde::Serialize;
use std::time::{Duration, Instant};

use crate::catalog::existence::lane_presence;
use crate::catalog::normalize::ContentNormalizer;
use crate::catalog::persist::persist_batch;
use crate::catalog::types::{ContentRecord, LanePresence, LaneVectors};
use crate::embedding::{EmbeddingProvider, TaskIntent};
use crate::error::{CatalogError, Result};

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Regenerate every lane that has text, even if a vector is stored.
    pub force_refresh: bool,
    /// Records per transaction. Clamped to at least one.
    pub batch_size: usize,
    /// Minimum time between consecutive embedding calls.
    pub pacing: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            force_refresh: false,
            batch_size: 10,
            pacing: Duration::from_millis(500),
        }
    }
}

/// Tally of one run. `succeeded` includes records skipped because they were
/// already fully embedded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    pub processed: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub batches_committed: usize,
    pub embedding_calls: usize,
    pub lanes_failed: usize,
}

impl PipelineReport {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Enforces a minimum interval between calls. The first call never waits.
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    last: Option<Instant>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Block until at least `interval` has passed since the previous call.
    pub fn wait(&mut self) {
        if let Some(last) = self.last {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                std::thread::sleep(self.interval - elapsed);
            }
        }
        self.last = Some(Instant::now());
    }
}

enum RecordOutcome {
    /// Nothing left to generate.
    Satisfied,
    Embedded(LaneVectors),
}

pub struct EmbeddingPipeline<'a> {
    conn: &'a mut Connection,
    provider: &'a dyn EmbeddingProvider,
    normalizer: ContentNormalizer,
    options: PipelineOptions,
    pacer: Pacer,
    progress: Option<ProgressBar>,
}

impl<'a> EmbeddingPipeline<'a> {
    pub fn new(
        conn: &'a mut Connection,
        provider: &'a dyn EmbeddingProvider,
        normalizer: ContentNormalizer,
        options: PipelineOptions,
    ) -> Self {
        let pacer = Pacer::new(options.pacing);
        Self {
            conn,
            provider,
            normalizer,
            options,
            pacer,
            progress: None,
        }
    }

    /// Advance `bar` by one per processed record.
    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.progress = Some(bar);
        self
    }

    pub fn run(&mut self, records: &[ContentRecord]) -> Result<PipelineReport> {
        let batch_size = self.options.batch_size.max(1);
        let mut report = PipelineReport::default();
        let mut batch: Vec<(String, LaneVectors)> = Vec::with_capacity(batch_size);

        tracing::info!(
            records = records.len(),
            batch_size,
            force_refresh = self.options.force_refresh,
            model = self.provider.model(),
            "embedding pipeline started"
        );

        for record in records {
            report.processed += 1;
            if let Some(bar) = &self.progress {
                bar.set_message(record.id.clone());
            }

            match self.embed_record(record, &mut report) {
                Ok(RecordOutcome::Satisfied) => {
                    tracing::debug!(id = %record.id, "all lanes present, skipping");
                    report.skipped += 1;
                    report.succeeded += 1;
                }
                Ok(RecordOutcome::Embedded(lanes)) => batch.push((record.id.clone(), lanes)),
                Err(e) if e.is_configuration() => return Err(e),
                Err(e) => {
                    tracing::warn!(id = %record.id, error = %e, "record failed");
                    report.failed += 1;
                }
            }

            if batch.len() >= batch_size {
                self.flush(&mut batch, &mut report);
            }
            if let Some(bar) = &self.progress {
                bar.inc(1);
            }
        }

        if !batch.is_empty() {
            self.flush(&mut batch, &mut report);
        }

        tracing::info!(
            succeeded = report.succeeded,
            skipped = report.skipped,
            failed = report.failed,
            batches = report.batches_committed,
            calls = report.embedding_calls,
            "embedding pipeline finished"
        );
        Ok(report)
    }

    fn embed_record(
        &mut self,
        record: &ContentRecord,
        report: &mut PipelineReport,
    ) -> Result<RecordOutcome> {
        let texts = self.normalizer.lane_texts(record)?;
        if texts.is_empty() {
            return Err(CatalogError::Validation(format!(
                "{}: no lane has any text",
                record.id
            )));
        }

        let presence = if self.options.force_refresh {
            LanePresence::default()
        } else {
            lane_presence(self.conn, &record.id)?
        };

        let pending: Vec<_> = texts
            .into_iter()
            .filter(|(lane, _)| !presence.has(*lane))
            .collect();
        if pending.is_empty() {
            return Ok(RecordOutcome::Satisfied);
        }

        let attempted = pending.len();
        let mut vectors = LaneVectors::new();
        for (lane, text) in pending {
            self.pacer.wait();
            report.embedding_calls += 1;
            match self.provider.embed(&text, TaskIntent::RetrievalDocument) {
                Ok(vector) => {
                    vectors.insert(lane, vector);
                }
                Err(e) if e.is_configuration() => return Err(e),
                Err(e) => {
                    tracing::warn!(id = %record.id, %lane, error = %e, "lane embedding failed");
                    report.lanes_failed += 1;
                }
            }
        }

        if vectors.is_empty() {
            return Err(CatalogError::External(format!(
                "{}: all {attempted} lane(s) failed to embed",
                record.id
            )));
        }
        Ok(RecordOutcome::Embedded(vectors))
    }

    fn flush(&mut self, batch: &mut Vec<(String, LaneVectors)>, report: &mut PipelineReport) {
        let size = batch.len();
        match persist_batch(self.conn, batch, self.provider.dimensions()) {
            Ok(_) => {
                report.batches_committed += 1;
                report.succeeded += size;
            }
            Err(e) => {
                let first = batch.first().map(|(id, _)| id.as_str()).unwrap_or_default();
                tracing::error!(size, first_id = first, error = %e, "batch rolled back");
                report.failed += size;
            }
        }
        batch.clear();
    }
}
