//! OpenAI embeddings client.

use crate::config::{EmbeddingConfig, SourceConfig};
use crate::embedder::{validate_embedding, Embedder};
use crate::retry::RetryPolicy;
use crate::{ConfigError, PipelineError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};

const SERVICE: &str = "OpenAI embeddings";

/// Embeddings client for OpenAI-compatible `/embeddings` endpoints
pub struct OpenAiEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    dimensions: Option<usize>,
    policy: RetryPolicy,
}

impl OpenAiEmbedder {
    /// Builds a client from the embedding config and an API key.
    pub fn new(
        api_key: &str,
        config: &EmbeddingConfig,
        source: &SourceConfig,
        policy: RetryPolicy,
    ) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(ConfigError::Validation("missing OpenAI API key".to_string()).into());
        }

        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|_| ConfigError::Validation("invalid OpenAI API key".to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(source.request_timeout())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            dimensions: config.dimensions,
            policy,
        })
    }

    async fn request(&self, text: &str) -> Result<Vec<Option<f32>>> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: text,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|source| PipelineError::Http {
                url: self.endpoint.clone(),
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

        let parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            PipelineError::MalformedResponse {
                service: SERVICE,
                message: e.to_string(),
            }
        })?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|entry| entry.embedding)
            .ok_or_else(|| PipelineError::MalformedResponse {
                service: SERVICE,
                message: "response contained no embeddings".to_string(),
            })
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let raw = self
            .policy
            .run_if("Embedding", PipelineError::is_transient, || self.request(text))
            .await?;
        validate_embedding(raw, self.dimensions)
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<Option<f32>>,
}
