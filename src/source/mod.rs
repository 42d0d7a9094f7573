//! Item sources
//!
//! A run starts from an [`ItemSource`]: the live catalog site or a CSV export
//! of a previous scrape. Both feed the same embedding and upload stages.

mod csv_file;
mod scrape;

pub use csv_file::CsvSource;
pub use scrape::ScrapeSource;

use crate::model::{CatalogItem, ItemDetail};
use crate::Result;
use async_trait::async_trait;

/// Produces catalog items and their details
#[async_trait]
pub trait ItemSource: Send + Sync {
    /// Short description for log lines
    fn describe(&self) -> String;

    /// Lists every catalog item, in order
    ///
    /// An error here is fatal for the run.
    async fn list(&self) -> Result<Vec<CatalogItem>>;

    /// Details for the item at `position` in the listed sequence
    ///
    /// Never fails; an unavailable detail is an empty [`ItemDetail`].
    async fn detail(&self, position: usize, item: &CatalogItem) -> ItemDetail;
}
