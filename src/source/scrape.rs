use crate::config::SourceConfig;
use crate::crawler::{build_http_client, fetch_detail, scrape_catalog};
use crate::model::{CatalogItem, ItemDetail};
use crate::retry::RetryPolicy;
use crate::source::ItemSource;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Live catalog site
///
/// Detail fetches are followed by a fixed pause, whatever their outcome, to
/// keep the request rate against the site low.
pub struct ScrapeSource {
    client: Client,
    catalog_url: String,
    detail_delay: Duration,
    policy: RetryPolicy,
}

impl ScrapeSource {
    pub fn new(config: &SourceConfig, policy: RetryPolicy) -> Result<Self> {
        Ok(Self {
            client: build_http_client(config)?,
            catalog_url: config.catalog_url.clone(),
            detail_delay: config.detail_delay(),
            policy,
        })
    }
}

#[async_trait]
impl ItemSource for ScrapeSource {
    fn describe(&self) -> String {
        format!("catalog site {}", self.catalog_url)
    }

    async fn list(&self) -> Result<Vec<CatalogItem>> {
        scrape_catalog(&self.client, &self.catalog_url, &self.policy).await
    }

    async fn detail(&self, _position: usize, item: &CatalogItem) -> ItemDetail {
        let detail = fetch_detail(&self.client, &item.title, &item.link, &self.policy).await;
        tokio::time::sleep(self.detail_delay).await;
        detail
    }
}
