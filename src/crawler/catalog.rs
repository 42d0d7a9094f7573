//! Catalog listing parser
//!
//! The listing page is a table with one `tr.criterion-channel__tr` row per
//! film. The film page link lives in the row's `data-href` attribute; the
//! remaining fields are cells identified by class.

use crate::crawler::fetcher::fetch_html;
use crate::model::CatalogItem;
use crate::retry::RetryPolicy;
use crate::Result;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use url::Url;

const ROW_SELECTOR: &str = "tr.criterion-channel__tr";
const TITLE_SELECTOR: &str = "td.criterion-channel__td--title";
const IMAGE_SELECTOR: &str = "img.criterion-channel__film-img";
const DIRECTOR_SELECTOR: &str = "td.criterion-channel__td--director";
const COUNTRY_SELECTOR: &str = "td.criterion-channel__td--country";
const YEAR_SELECTOR: &str = "td.criterion-channel__td--year";

struct RowSelectors {
    row: Selector,
    title: Selector,
    image: Selector,
    director: Selector,
    country: Selector,
    year: Selector,
}

impl RowSelectors {
    fn new() -> Option<Self> {
        Some(Self {
            row: Selector::parse(ROW_SELECTOR).ok()?,
            title: Selector::parse(TITLE_SELECTOR).ok()?,
            image: Selector::parse(IMAGE_SELECTOR).ok()?,
            director: Selector::parse(DIRECTOR_SELECTOR).ok()?,
            country: Selector::parse(COUNTRY_SELECTOR).ok()?,
            year: Selector::parse(YEAR_SELECTOR).ok()?,
        })
    }
}

/// Parses the listing page into catalog items
///
/// Rows missing a title, link or image are dropped without being reported;
/// the listing carries decorative rows that are not films. Relative links and
/// image sources are resolved against `base_url`.
///
/// # Example
///
/// ```
/// use criterion_pipeline::crawler::parse_catalog;
/// use url::Url;
///
/// let html = r#"<table><tr class="criterion-channel__tr" data-href="/videos/m">
///   <td class="criterion-channel__td--title">M</td>
///   <td><img class="criterion-channel__film-img" src="/m.jpg"></td>
/// </tr></table>"#;
/// let base = Url::parse("https://films.example.com/").unwrap();
/// let items = parse_catalog(html, &base);
/// assert_eq!(items[0].link, "https://films.example.com/videos/m");
/// ```
pub fn parse_catalog(html: &str, base_url: &Url) -> Vec<CatalogItem> {
    let Some(selectors) = RowSelectors::new() else {
        return Vec::new();
    };
    let document = Html::parse_document(html);

    document
        .select(&selectors.row)
        .filter_map(|row| parse_row(row, &selectors, base_url))
        .collect()
}

fn parse_row(
    row: ElementRef<'_>,
    selectors: &RowSelectors,
    base_url: &Url,
) -> Option<CatalogItem> {
    let title = cell_text(row, &selectors.title);
    let link = row
        .value()
        .attr("data-href")
        .and_then(|href| resolve(href, base_url))
        .unwrap_or_default();
    let image = row
        .select(&selectors.image)
        .next()
        .and_then(|img| img.value().attr("src"))
        .and_then(|src| resolve(src, base_url))
        .unwrap_or_default();

    if title.is_empty() || link.is_empty() || image.is_empty() {
        tracing::debug!("Skipping incomplete catalog row (title: {:?})", title);
        return None;
    }

    Some(CatalogItem {
        title,
        link,
        image,
        director: cell_text(row, &selectors.director),
        country: cell_text(row, &selectors.country),
        year: cell_text(row, &selectors.year),
    })
}

/// Trimmed text of the first element matching `selector`, or an empty string
fn cell_text(row: ElementRef<'_>, selector: &Selector) -> String {
    row.select(selector)
        .next()
        .map(|cell| cell.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

fn resolve(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    base_url.join(href).ok().map(|url| url.to_string())
}

/// Fetches and parses the catalog listing
///
/// A fetch that exhausts its retries is returned as an error; the caller
/// treats it as fatal for the run.
pub async fn scrape_catalog(
    client: &Client,
    catalog_url: &str,
    policy: &RetryPolicy,
) -> Result<Vec<CatalogItem>> {
    tracing::info!("Fetching main page: {}", catalog_url);
    let base_url = Url::parse(catalog_url)?;
    let html = fetch_html(client, catalog_url, policy).await?;

    let items = parse_catalog(&html, &base_url);
    tracing::info!("Found {} films on main page", items.len());
    Ok(items)
}
