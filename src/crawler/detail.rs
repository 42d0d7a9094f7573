//! Detail page parser
//!
//! Pulls the description from `meta[name="description"]` and the running
//! time from the first `.duration-container` element.

use crate::crawler::fetcher::fetch_html;
use crate::model::ItemDetail;
use crate::retry::RetryPolicy;
use reqwest::Client;
use scraper::{Html, Selector};

/// Extracts description and duration from a detail page
///
/// Missing elements leave the corresponding field empty.
pub fn parse_detail(html: &str) -> ItemDetail {
    let document = Html::parse_document(html);

    let description = Selector::parse(r#"meta[name="description"]"#)
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .next()
                .and_then(|meta| meta.value().attr("content"))
                .map(|content| content.trim().to_string())
        })
        .unwrap_or_default();

    let duration = Selector::parse(".duration-container")
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .next()
                .map(|element| element.text().collect::<String>().trim().to_string())
        })
        .unwrap_or_default();

    ItemDetail {
        description,
        duration,
    }
}

/// Fetches and parses one item's detail page
///
/// Never fails: a fetch that exhausts its retries is logged and yields an
/// empty [`ItemDetail`], so one broken page cannot stop the run.
pub async fn fetch_detail(
    client: &Client,
    title: &str,
    url: &str,
    policy: &RetryPolicy,
) -> ItemDetail {
    match fetch_html(client, url, policy).await {
        Ok(html) => parse_detail(&html),
        Err(e) => {
            tracing::error!("Error fetching detail for {} ({}): {}", title, url, e);
            ItemDetail::default()
        }
    }
}
