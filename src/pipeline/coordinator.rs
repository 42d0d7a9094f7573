//! Pipeline coordinator - run orchestration logic
//!
//! Sequences one run end to end:
//! - Listing catalog items from the source
//! - Enriching and embedding each item in turn
//! - Writing the optional CSV catalog export and JSON artifact
//! - Uploading vectors in batches

use crate::embedder::Embedder;
use crate::index::{upload_in_batches, VectorIndex, DEFAULT_BATCH_SIZE};
use crate::model::{CatalogItem, EnrichedItem, Vector};
use crate::output::{write_catalog_csv, write_vectors, RunSummary};
use crate::pipeline::state::RunStage;
use crate::retry::RetryPolicy;
use crate::source::ItemSource;
use crate::{PipelineError, Result};
use std::path::PathBuf;

/// Settings for a single run
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Vectors per upsert call
    pub batch_size: usize,

    /// Retry policy for index upserts
    pub retry: RetryPolicy,

    /// Where to write the JSON vectors artifact, if anywhere
    pub output: Option<PathBuf>,

    /// Where to export the enriched catalog as CSV, if anywhere
    pub catalog_csv: Option<PathBuf>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            retry: RetryPolicy::default(),
            output: None,
            catalog_csv: None,
        }
    }
}

/// Main pipeline coordinator
///
/// Items are processed strictly one after another; the only state shared
/// across items is the vector accumulator owned by the run.
pub struct Pipeline<'a> {
    source: &'a dyn ItemSource,
    embedder: &'a dyn Embedder,
    index: Option<&'a dyn VectorIndex>,
    options: PipelineOptions,
    stage: RunStage,
}

impl<'a> Pipeline<'a> {
    /// Creates a pipeline that embeds but does not upload
    pub fn new(
        source: &'a dyn ItemSource,
        embedder: &'a dyn Embedder,
        options: PipelineOptions,
    ) -> Self {
        Self {
            source,
            embedder,
            index: None,
            options,
            stage: RunStage::Start,
        }
    }

    /// Uploads the produced vectors to `index` at the end of the run
    pub fn with_index(mut self, index: &'a dyn VectorIndex) -> Self {
        self.index = Some(index);
        self
    }

    /// Current stage of the run
    pub fn stage(&self) -> RunStage {
        self.stage
    }

    fn advance(&mut self, next: RunStage) {
        debug_assert!(
            self.stage.can_transition_to(next),
            "invalid stage transition {} -> {}",
            self.stage,
            next
        );
        tracing::debug!("Run stage {} -> {}", self.stage, next);
        self.stage = next;
    }

    /// Runs the pipeline to completion
    ///
    /// Per-item failures are counted, never propagated. The run aborts with
    /// [`PipelineError::EmptyCatalog`] or [`PipelineError::NoVectors`] before
    /// any upload when there is nothing to send. On any failure the counters
    /// gathered so far are logged before the error is returned.
    pub async fn run(&mut self) -> Result<RunSummary> {
        let mut summary = RunSummary::new();
        let result = self.execute(&mut summary).await;
        summary.finish();

        match result {
            Ok(()) => Ok(summary),
            Err(e) => {
                tracing::error!("{}", summary.failure_report(self.stage));
                Err(e)
            }
        }
    }

    async fn execute(&mut self, summary: &mut RunSummary) -> Result<()> {
        tracing::info!("Starting pipeline from {}", self.source.describe());

        self.advance(RunStage::Scraping);
        let items = self.source.list().await?;
        summary.items_found = items.len();
        if items.is_empty() {
            self.advance(RunStage::Aborted);
            tracing::error!("No films found. Aborting.");
            return Err(PipelineError::EmptyCatalog);
        }

        self.advance(RunStage::Enriching);
        let (vectors, enriched) = self.embed_items(items, summary).await;
        summary.vectors = vectors.len();
        summary.log_embedding();

        if let Some(path) = &self.options.catalog_csv {
            write_catalog_csv(path, &enriched)?;
        }
        if vectors.is_empty() {
            self.advance(RunStage::Aborted);
            tracing::error!("No vectors generated. Aborting upload.");
            return Err(PipelineError::NoVectors);
        }

        if let Some(path) = &self.options.output {
            write_vectors(path, &vectors)?;
        }

        match self.index {
            Some(index) => {
                self.advance(RunStage::Uploading);
                summary.batches_uploaded = upload_in_batches(
                    index,
                    &vectors,
                    self.options.batch_size,
                    &self.options.retry,
                )
                .await?;
                summary.uploaded = true;
                tracing::info!("Pipeline complete. {} vectors uploaded.", vectors.len());
            }
            None => {
                tracing::info!("Upload skipped. {} vectors generated.", vectors.len());
            }
        }

        self.advance(RunStage::Done);
        Ok(())
    }

    /// Fetches details and embeds every item, dropping failed embeddings
    ///
    /// Enriched items are kept only when a CSV export was requested.
    async fn embed_items(
        &self,
        items: Vec<CatalogItem>,
        summary: &mut RunSummary,
    ) -> (Vec<Vector>, Vec<EnrichedItem>) {
        let total = items.len();
        let mut vectors = Vec::with_capacity(total);
        let mut exported = Vec::new();

        for (position, item) in items.into_iter().enumerate() {
            tracing::info!("Processing {}/{}: {}", position + 1, total, item.title);

            let detail = self.source.detail(position, &item).await;
            if detail.description.is_empty() {
                summary.detail_failures += 1;
            }

            let enriched = EnrichedItem::new(item, detail);
            if self.options.catalog_csv.is_some() {
                exported.push(enriched.clone());
            }
            match self.embedder.embed(&enriched.embedding_text()).await {
                Ok(values) => vectors.push(enriched.into_vector(position, values)),
                Err(e) => {
                    tracing::error!("Failed to embed '{}': {}", enriched.item.title, e);
                    summary.embedding_failures += 1;
                }
            }
        }

        (vectors, exported)
    }
}

/// Uploads a previously written vectors artifact
///
/// Used by upload-only runs; refuses to upload an empty set.
pub async fn upload_only(
    index: &dyn VectorIndex,
    vectors: &[Vector],
    options: &PipelineOptions,
) -> Result<RunSummary> {
    let mut summary = RunSummary::new();
    summary.vectors = vectors.len();
    if vectors.is_empty() {
        tracing::error!("No vectors to upload. Aborting.");
        return Err(PipelineError::NoVectors);
    }

    summary.batches_uploaded =
        upload_in_batches(index, vectors, options.batch_size, &options.retry).await?;
    summary.uploaded = true;
    summary.finish();
    tracing::info!("Upload complete. {} vectors uploaded.", vectors.len());
    Ok(summary)
}
