//! Integration tests for the pipeline
//!
//! These tests use wiremock to stand in for the catalog site, the
//! embeddings API and the vector index, and drive full runs end-to-end.

mod pipeline_tests;
mod upload_tests;
