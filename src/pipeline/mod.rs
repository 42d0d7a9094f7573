//! Run orchestration
//!
//! This module sequences a pipeline run and tracks its stage:
//! - [`Pipeline`] drives listing, enrichment, embedding and upload
//! - [`RunStage`] records where a run is and which transitions are legal

mod coordinator;
mod state;

pub use coordinator::{upload_only, Pipeline, PipelineOptions};
pub use state::RunStage;
