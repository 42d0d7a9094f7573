//! Run summary
//!
//! Counters accumulated by the orchestrator and reported at the end of a run.

use crate::pipeline::RunStage;
use chrono::{DateTime, Utc};
use std::fmt;

/// Counts and timing for one pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run finished, if it did
    pub finished_at: Option<DateTime<Utc>>,

    /// Catalog items listed by the source
    pub items_found: usize,

    /// Items whose detail came back without a description
    pub detail_failures: usize,

    /// Items dropped because embedding failed
    pub embedding_failures: usize,

    /// Vectors produced by the embedding phase
    pub vectors: usize,

    /// Batches accepted by the index
    pub batches_uploaded: usize,

    /// Whether the vectors were sent to the index
    pub uploaded: bool,
}

impl RunSummary {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            items_found: 0,
            detail_failures: 0,
            embedding_failures: 0,
            vectors: 0,
            batches_uploaded: 0,
            uploaded: false,
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Wall-clock duration, once finished
    pub fn elapsed(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|end| end - self.started_at)
    }

    /// One-line account of a run that failed during `stage`
    pub fn failure_report(&self, stage: RunStage) -> String {
        format!(
            "Run failed during {}: {} items found, {} detail failures, \
             {} embedding failures, {} vectors, {} batches uploaded",
            stage,
            self.items_found,
            self.detail_failures,
            self.embedding_failures,
            self.vectors,
            self.batches_uploaded
        )
    }

    /// Logs the embedding phase outcome
    pub fn log_embedding(&self) {
        tracing::info!(
            "Embedding complete: {} succeeded, {} detail failures, {} embedding failures",
            self.vectors,
            self.detail_failures,
            self.embedding_failures
        );
    }
}

impl Default for RunSummary {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Pipeline Summary ===")?;
        writeln!(f, "  Started: {}", self.started_at.to_rfc3339())?;
        if let Some(finished) = &self.finished_at {
            writeln!(f, "  Finished: {}", finished.to_rfc3339())?;
        }
        if let Some(elapsed) = self.elapsed() {
            writeln!(f, "  Duration: {}s", elapsed.num_seconds())?;
        }
        writeln!(f, "  Items found: {}", self.items_found)?;
        writeln!(f, "  Detail failures: {}", self.detail_failures)?;
        writeln!(f, "  Embedding failures: {}", self.embedding_failures)?;
        writeln!(f, "  Vectors: {}", self.vectors)?;
        if self.uploaded {
            write!(f, "  Uploaded: {} batches", self.batches_uploaded)
        } else {
            write!(f, "  Uploaded: no")
        }
    }
}
