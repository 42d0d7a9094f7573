//! Vector index upload
//!
//! Vectors are pushed in fixed-size, order-preserving batches. Each batch
//! gets its own retry budget; a batch that exhausts it fails the whole
//! upload, leaving earlier batches committed in the index.

mod pinecone;

pub use pinecone::PineconeIndex;

use crate::model::Vector;
use crate::retry::RetryPolicy;
use crate::{PipelineError, Result};
use async_trait::async_trait;

/// Default number of vectors per upsert call
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// A remote index that accepts batched upserts
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Upserts one batch, in order
    async fn upsert(&self, vectors: &[Vector]) -> Result<()>;
}

/// Splits `vectors` into contiguous batches of at most `batch_size`
///
/// Produces `ceil(len / batch_size)` batches; concatenating them yields the
/// input unchanged. A zero batch size is treated as one.
pub fn partition(vectors: &[Vector], batch_size: usize) -> std::slice::Chunks<'_, Vector> {
    vectors.chunks(batch_size.max(1))
}

/// Number of batches `len` vectors split into
pub fn batch_count(len: usize, batch_size: usize) -> usize {
    len.div_ceil(batch_size.max(1))
}

/// Uploads every vector in batches, returning the number of batches sent
pub async fn upload_in_batches(
    index: &dyn VectorIndex,
    vectors: &[Vector],
    batch_size: usize,
    policy: &RetryPolicy,
) -> Result<usize> {
    let total = batch_count(vectors.len(), batch_size);
    tracing::info!("Uploading {} vectors in {} batches", vectors.len(), total);

    for (position, batch) in partition(vectors, batch_size).enumerate() {
        let number = position + 1;
        let label = format!("Upsert batch {}/{}", number, total);

        policy
            .run(&label, || index.upsert(batch))
            .await
            .map_err(|source| PipelineError::BatchFailed {
                batch: number,
                total,
                source: Box::new(source),
            })?;

        tracing::info!(
            "Uploaded batch {}/{} ({} vectors)",
            number,
            total,
            batch.len()
        );
    }

    Ok(total)
}
