//! Criterion Pipeline: catalog scraping into a vector index
//!
//! This crate implements a periodic batch job that scrapes a film catalog,
//! enriches every entry from its detail page, embeds the text through an
//! embeddings API and upserts the resulting vectors into a Pinecone index.

pub mod config;
pub mod crawler;
pub mod embedder;
pub mod index;
pub mod logging;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod retry;
pub mod source;

use thiserror::Error;

/// Main error type for pipeline operations
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("{service} request failed with status {status}: {body}")]
    Api {
        service: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Malformed embedding: {0}")]
    MalformedEmbedding(String),

    #[error("Malformed response from {service}: {message}")]
    MalformedResponse {
        service: &'static str,
        message: String,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No catalog items found")]
    EmptyCatalog,

    #[error("No vectors generated")]
    NoVectors,

    #[error("Failed to upload batch {batch}/{total}: {source}")]
    BatchFailed {
        batch: usize,
        total: usize,
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    /// Returns true for failures that are worth another attempt.
    ///
    /// Network and remote status failures are retried. Data-quality and
    /// local failures are not, since the next attempt would see the same input.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Http { .. } | Self::Api { .. } | Self::Reqwest(_)
        )
    }

    /// Returns true when the remote side throttled the request.
    ///
    /// Decided from the HTTP status, or from an API error body. Request URLs
    /// are never inspected.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            Self::Api { status, body, .. } => {
                *status == reqwest::StatusCode::TOO_MANY_REQUESTS
                    || retry::looks_rate_limited(body)
            }
            Self::Http { source, .. } | Self::Reqwest(source) => {
                source.status() == Some(reqwest::StatusCode::TOO_MANY_REQUESTS)
            }
            Self::BatchFailed { source, .. } => source.is_rate_limited(),
            _ => false,
        }
    }
}

impl retry::RetryError for PipelineError {
    fn is_rate_limited(&self) -> bool {
        PipelineError::is_rate_limited(self)
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Failed to read env file: {0}")]
    EnvFile(#[from] dotenvy::Error),

    #[error("Missing required env vars: {}", .0.join(", "))]
    MissingEnv(Vec<String>),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use model::{CatalogItem, EnrichedItem, ItemDetail, Vector};
pub use pipeline::{Pipeline, RunStage};
pub use retry::RetryPolicy;
