//! Text embedding
//!
//! The pipeline talks to embedding backends through the [`Embedder`] trait.
//! Both entry points (live scrape and CSV import) share one implementation,
//! so malformed vectors are rejected the same way regardless of input.

mod openai;

pub use openai::OpenAiEmbedder;

use crate::{PipelineError, Result};
use async_trait::async_trait;

/// Converts text into a fixed-length embedding vector
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model identifier, for logging
    fn model(&self) -> &str;

    /// Embeds a single text blob
    ///
    /// Returns [`PipelineError::MalformedEmbedding`] rather than a vector
    /// containing non-finite components.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Checks a raw embedding and converts it to plain floats
///
/// `None` components stand for JSON `null`, which is how a not-a-number
/// value arrives over the wire.
pub fn validate_embedding(raw: Vec<Option<f32>>, expected_len: Option<usize>) -> Result<Vec<f32>> {
    if raw.is_empty() {
        return Err(PipelineError::MalformedEmbedding(
            "empty embedding".to_string(),
        ));
    }

    if let Some(expected) = expected_len {
        if raw.len() != expected {
            return Err(PipelineError::MalformedEmbedding(format!(
                "expected {} dimensions, got {}",
                expected,
                raw.len()
            )));
        }
    }

    let mut values = Vec::with_capacity(raw.len());
    for (position, component) in raw.into_iter().enumerate() {
        match component {
            Some(value) if value.is_finite() => values.push(value),
            Some(value) => {
                return Err(PipelineError::MalformedEmbedding(format!(
                    "component {} is {}",
                    position, value
                )))
            }
            None => {
                return Err(PipelineError::MalformedEmbedding(format!(
                    "component {} is NaN",
                    position
                )))
            }
        }
    }

    Ok(values)
}
