//! Pinecone data-plane client.
//!
//! Upserts go to `{host}/vectors/upsert`. The host is either configured
//! directly (`PINECONE_HOST`) or looked up once through the control plane.

use crate::config::{IndexConfig, SourceConfig};
use crate::index::VectorIndex;
use crate::model::Vector;
use crate::retry::RetryPolicy;
use crate::{ConfigError, PipelineError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};

const SERVICE: &str = "Pinecone";
const API_VERSION: &str = "2024-07";

/// Pinecone index handle bound to one data-plane host
#[derive(Debug)]
pub struct PineconeIndex {
    client: Client,
    host: String,
    namespace: Option<String>,
}

impl PineconeIndex {
    /// Connects to the named index
    ///
    /// When `host` is `None` the index is described through the control plane
    /// (with retries) to find its data-plane host.
    pub async fn connect(
        api_key: &str,
        index_name: &str,
        host: Option<&str>,
        config: &IndexConfig,
        source: &SourceConfig,
        policy: &RetryPolicy,
    ) -> Result<Self> {
        let client = build_client(api_key, source)?;

        let host = match host {
            Some(host) => host.to_string(),
            None => {
                let label = format!("Describe index {}", index_name);
                policy
                    .run_if(&label, PipelineError::is_transient, || {
                        describe_host(&client, &config.control_url, index_name)
                    })
                    .await?
            }
        };
        let host = normalize_host(&host);
        tracing::info!("Using Pinecone index {} at {}", index_name, host);

        Ok(Self {
            client,
            host,
            namespace: config.namespace.clone(),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn upsert(&self, vectors: &[Vector]) -> Result<()> {
        let url = format!("{}/vectors/upsert", self.host);
        let request = UpsertRequest {
            vectors,
            namespace: self.namespace.as_deref(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|source| PipelineError::Http {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(PipelineError::Api {
                service: SERVICE,
                status,
                body,
            });
        }

        let ack: UpsertResponse = match response.json().await {
            Ok(ack) => ack,
            Err(e) => {
                tracing::debug!("Unreadable Pinecone upsert acknowledgement: {}", e);
                UpsertResponse::default()
            }
        };
        if ack.upserted_count.is_some_and(|count| count != vectors.len()) {
            tracing::warn!(
                "Pinecone acknowledged {:?} of {} vectors",
                ack.upserted_count,
                vectors.len()
            );
        }
        Ok(())
    }
}

fn build_client(api_key: &str, source: &SourceConfig) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        "api-key",
        HeaderValue::from_str(api_key.trim())
            .map_err(|_| ConfigError::Validation("invalid Pinecone API key".to_string()))?,
    );
    headers.insert(
        "x-pinecone-api-version",
        HeaderValue::from_static(API_VERSION),
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    Ok(Client::builder()
        .timeout(source.request_timeout())
        .default_headers(headers)
        .build()?)
}

async fn describe_host(client: &Client, control_url: &str, index_name: &str) -> Result<String> {
    let url = format!("{}/indexes/{}", control_url.trim_end_matches('/'), index_name);
    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|source| PipelineError::Http {
            url: url.clone(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<body unavailable>".to_string());
        return Err(PipelineError::Api {
            service: SERVICE,
            status,
            body,
        });
    }

    let description: IndexDescription =
        response
            .json()
            .await
            .map_err(|e| PipelineError::MalformedResponse {
                service: SERVICE,
                message: e.to_string(),
            })?;
    Ok(description.host)
}

/// Adds a scheme to bare hostnames and strips trailing slashes
fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [Vector],
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Debug, Default, Deserialize)]
struct UpsertResponse {
    #[serde(rename = "upsertedCount")]
    upserted_count: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct IndexDescription {
    host: String,
}
