//! Crawler module for the catalog site
//!
//! This module contains the page-level scraping logic, including:
//! - HTTP fetching with retry
//! - Catalog listing parsing
//! - Detail page parsing with per-item failure isolation

mod catalog;
mod detail;
mod fetcher;

pub use catalog::{parse_catalog, scrape_catalog};
pub use detail::{fetch_detail, parse_detail};
pub use fetcher::{build_http_client, fetch_html, get_page};
