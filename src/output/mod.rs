//! Output generation module
//!
//! This module produces the artifacts a run leaves behind locally:
//! - The write-once JSON vectors file
//! - The CSV export of the enriched catalog
//! - The end-of-run summary

mod catalog_csv;
mod json;
mod summary;

pub use catalog_csv::write_catalog_csv;
pub use json::{read_vectors, write_vectors};
pub use summary::RunSummary;
