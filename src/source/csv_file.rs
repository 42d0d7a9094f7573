use crate::model::{CatalogItem, ItemDetail};
use crate::source::ItemSource;
use crate::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// One row of a scraped-films CSV export
///
/// Columns may be missing or empty; both read as empty strings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CsvRow {
    title: String,
    link: String,
    image: String,
    director: String,
    country: String,
    year: String,
    description: String,
    #[serde(alias = "runtime")]
    duration: String,
}

/// Previously scraped catalog read from a CSV file
///
/// The file is read once, up front; details come from the same rows, so no
/// network access happens for this source.
pub struct CsvSource {
    path: PathBuf,
    items: Vec<CatalogItem>,
    details: Vec<ItemDetail>,
}

impl CsvSource {
    /// Reads and parses the whole file
    ///
    /// Rows without a title are skipped.
    pub fn open(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)?;

        let mut items = Vec::new();
        let mut details = Vec::new();
        for record in reader.deserialize::<CsvRow>() {
            let row = record?;
            if row.title.is_empty() {
                tracing::debug!("Skipping CSV row without title");
                continue;
            }
            items.push(CatalogItem {
                title: row.title,
                link: row.link,
                image: row.image,
                director: row.director,
                country: row.country,
                year: row.year,
            });
            details.push(ItemDetail {
                description: row.description,
                duration: row.duration,
            });
        }

        tracing::info!("Loaded {} films from {}", items.len(), path.display());
        Ok(Self {
            path: path.to_path_buf(),
            items,
            details,
        })
    }
}

#[async_trait]
impl ItemSource for CsvSource {
    fn describe(&self) -> String {
        format!("CSV file {}", self.path.display())
    }

    async fn list(&self) -> Result<Vec<CatalogItem>> {
        Ok(self.items.clone())
    }

    async fn detail(&self, position: usize, _item: &CatalogItem) -> ItemDetail {
        self.details.get(position).cloned().unwrap_or_default()
    }
}
