use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for the pipeline
///
/// Every section has defaults, so an absent config file yields a working
/// configuration. Secrets never live in the file; see [`Secrets`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub retry: RetryConfig,
    pub embedding: EmbeddingConfig,
    pub index: IndexConfig,
    pub logging: LoggingConfig,
    #[serde(skip)]
    pub secrets: Secrets,
}

/// Catalog site configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Listing page scraped for catalog rows
    #[serde(rename = "catalog-url")]
    pub catalog_url: String,

    /// User agent sent with every page request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout")]
    pub request_timeout: u64,

    /// Pause after every detail page fetch (milliseconds)
    #[serde(rename = "detail-delay")]
    pub detail_delay: u64,
}

impl SourceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn detail_delay(&self) -> Duration {
        Duration::from_millis(self.detail_delay)
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            catalog_url: "https://films.criterionchannel.com".to_string(),
            user_agent: "CriterionPipelineBot/1.0".to_string(),
            request_timeout: 30,
            detail_delay: 500,
        }
    }
}

/// Retry and backoff configuration shared by every external call
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per call, including the first
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Backoff unit (milliseconds); attempt `n` waits `base-delay * 2^n`
    #[serde(rename = "base-delay")]
    pub base_delay: u64,

    /// Extra multiplier applied when the failure looks like rate limiting
    #[serde(rename = "rate-limit-factor")]
    pub rate_limit_factor: u32,

    /// Add random jitter on top of each backoff
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: 1000,
            rate_limit_factor: 5,
            jitter: true,
        }
    }
}

/// Embeddings API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// OpenAI-compatible API root; `/embeddings` is appended
    #[serde(rename = "base-url")]
    pub base_url: String,

    pub model: String,

    /// Expected vector length; responses of another length are rejected
    pub dimensions: Option<usize>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: None,
        }
    }
}

/// Vector index configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Control plane used to resolve the index host
    #[serde(rename = "control-url")]
    pub control_url: String,

    /// Vectors per upsert call
    #[serde(rename = "batch-size")]
    pub batch_size: usize,

    pub namespace: Option<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            control_url: "https://api.pinecone.io".to_string(),
            batch_size: 100,
            namespace: None,
        }
    }
}

/// Log file configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub file: PathBuf,

    /// Rotate once the file reaches this many bytes
    #[serde(rename = "max-bytes")]
    pub max_bytes: u64,

    /// Number of rotated files kept next to the live one
    pub backups: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("logs/criterion_pipeline.log"),
            max_bytes: 5 * 1024 * 1024,
            backups: 3,
        }
    }
}

/// API credentials read from the environment
#[derive(Clone, Default)]
pub struct Secrets {
    pub openai_api_key: Option<String>,
    pub pinecone_api_key: Option<String>,
    pub pinecone_index: Option<String>,
    /// Data-plane host; skips the control plane lookup when set
    pub pinecone_host: Option<String>,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |value: &Option<String>| value.as_ref().map(|_| "<redacted>");
        f.debug_struct("Secrets")
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("pinecone_api_key", &redact(&self.pinecone_api_key))
            .field("pinecone_index", &self.pinecone_index)
            .field("pinecone_host", &self.pinecone_host)
            .finish()
    }
}
