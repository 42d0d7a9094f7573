//! Data shapes flowing through a pipeline run
//!
//! Every value here is created and consumed within one run; only the
//! uploaded [`Vector`] records outlive it, inside the remote index.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row of the catalog listing page
///
/// `title`, `link` and `image` are always non-empty; the remaining fields may
/// be empty strings. An item's identity is its position in the scraped list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub title: String,
    pub link: String,
    pub image: String,
    pub director: String,
    pub country: String,
    pub year: String,
}

/// Fields pulled from an item's detail page
///
/// The default (both fields empty) is what a failed detail fetch produces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDetail {
    pub description: String,
    pub duration: String,
}

impl ItemDetail {
    pub fn is_empty(&self) -> bool {
        self.description.is_empty() && self.duration.is_empty()
    }
}

/// A catalog item merged with its detail fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedItem {
    pub item: CatalogItem,
    pub detail: ItemDetail,
}

impl EnrichedItem {
    pub fn new(item: CatalogItem, detail: ItemDetail) -> Self {
        Self { item, detail }
    }

    /// Labeled summary submitted to the embedding model
    pub fn embedding_text(&self) -> String {
        format!(
            "Title: {}\nDirector: {}\nCountry: {}\nYear: {}\nDescription: {}",
            self.item.title,
            self.item.director,
            self.item.country,
            self.item.year,
            self.detail.description
        )
    }

    /// String metadata stored alongside the vector
    ///
    /// The duration is stored under `runtime`, the key the retrieval side reads.
    pub fn metadata(&self) -> BTreeMap<String, String> {
        let fields = [
            ("title", &self.item.title),
            ("link", &self.item.link),
            ("image", &self.item.image),
            ("director", &self.item.director),
            ("country", &self.item.country),
            ("year", &self.item.year),
            ("description", &self.detail.description),
            ("runtime", &self.detail.duration),
        ];

        fields
            .into_iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    /// Builds the index record for the item at `position` in this run
    pub fn into_vector(self, position: usize, values: Vec<f32>) -> Vector {
        Vector {
            id: vector_id(position),
            values,
            metadata: self.metadata(),
        }
    }
}

/// A record as stored in the vector index and in the JSON artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: BTreeMap<String, String>,
}

/// Vector ID for the item at `position` in the current run's sequence
///
/// Positional, so not stable across runs when the catalog order changes.
pub fn vector_id(position: usize) -> String {
    format!("film-{}", position)
}
