//! HTTP fetcher for catalog and detail pages
//!
//! This module handles all page requests for the pipeline, including:
//! - Building the HTTP client with the configured user agent and timeout
//! - GET requests that treat non-2xx statuses as failures
//! - Retrying transient failures through the shared [`RetryPolicy`]

use crate::config::SourceConfig;
use crate::retry::RetryPolicy;
use crate::{PipelineError, Result};
use reqwest::Client;
use std::time::Duration;

/// Builds an HTTP client for page fetches
///
/// # Example
///
/// ```no_run
/// use criterion_pipeline::config::SourceConfig;
/// use criterion_pipeline::crawler::build_http_client;
///
/// let client = build_http_client(&SourceConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &SourceConfig) -> std::result::Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.request_timeout())
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a page body in a single attempt
///
/// Connection failures, timeouts and non-2xx statuses all surface as
/// [`PipelineError::Http`]; the status stays on the error so the retry
/// policy can recognize a 429.
pub async fn get_page(client: &Client, url: &str) -> Result<String> {
    let http_error = |source| PipelineError::Http {
        url: url.to_string(),
        source,
    };

    let response = client.get(url).send().await.map_err(http_error)?;
    let response = response.error_for_status().map_err(http_error)?;
    response.text().await.map_err(http_error)
}

/// Fetches a page body, retrying per `policy`
pub async fn fetch_html(client: &Client, url: &str, policy: &RetryPolicy) -> Result<String> {
    tracing::debug!("Fetching {}", url);
    let label = format!("Fetch {}", url);
    policy.run(&label, || get_page(client, url)).await
}
