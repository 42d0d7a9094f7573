//! CSV export of the enriched catalog
//!
//! Columns match what [`crate::source::CsvSource`] reads, so a scrape can be
//! replayed later without touching the site.

use crate::model::EnrichedItem;
use crate::Result;
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Serialize)]
struct CatalogRow<'a> {
    title: &'a str,
    link: &'a str,
    image: &'a str,
    director: &'a str,
    country: &'a str,
    year: &'a str,
    description: &'a str,
    duration: &'a str,
}

impl<'a> From<&'a EnrichedItem> for CatalogRow<'a> {
    fn from(enriched: &'a EnrichedItem) -> Self {
        Self {
            title: &enriched.item.title,
            link: &enriched.item.link,
            image: &enriched.item.image,
            director: &enriched.item.director,
            country: &enriched.item.country,
            year: &enriched.item.year,
            description: &enriched.detail.description,
            duration: &enriched.detail.duration,
        }
    }
}

/// Writes every enriched item as one CSV row, replacing any existing file
pub fn write_catalog_csv(path: &Path, items: &[EnrichedItem]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    for item in items {
        writer.serialize(CatalogRow::from(item))?;
    }
    writer.flush()?;

    tracing::info!("Saved {} films to {}", items.len(), path.display());
    Ok(())
}
