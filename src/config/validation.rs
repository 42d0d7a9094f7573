use crate::config::parser::{OPENAI_API_KEY, PINECONE_API_KEY, PINECONE_INDEX};
use crate::config::types::{
    Config, EmbeddingConfig, IndexConfig, LoggingConfig, RetryConfig, Secrets, SourceConfig,
};
use crate::ConfigError;
use url::Url;

/// Largest batch the index accepts in a single upsert
pub const MAX_BATCH_SIZE: usize = 1000;

/// External services a run is going to talk to
///
/// Decides which secrets must be present before any network activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Services {
    pub embedding: bool,
    pub index: bool,
}

impl Services {
    pub const ALL: Services = Services {
        embedding: true,
        index: true,
    };
}

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_source_config(&config.source)?;
    validate_retry_config(&config.retry)?;
    validate_embedding_config(&config.embedding)?;
    validate_index_config(&config.index)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

/// Checks that every secret needed by `services` is present
///
/// All missing names are reported together.
pub fn require_secrets(secrets: &Secrets, services: Services) -> Result<(), ConfigError> {
    let mut missing = Vec::new();

    if services.embedding && secrets.openai_api_key.is_none() {
        missing.push(OPENAI_API_KEY.to_string());
    }
    if services.index {
        if secrets.pinecone_api_key.is_none() {
            missing.push(PINECONE_API_KEY.to_string());
        }
        if secrets.pinecone_index.is_none() {
            missing.push(PINECONE_INDEX.to_string());
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::MissingEnv(missing))
    }
}

fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    validate_http_url("catalog-url", &config.catalog_url)?;

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.request_timeout == 0 {
        return Err(ConfigError::Validation(
            "request-timeout must be >= 1s".to_string(),
        ));
    }

    Ok(())
}

fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.rate_limit_factor < 1 {
        return Err(ConfigError::Validation(format!(
            "rate-limit-factor must be >= 1, got {}",
            config.rate_limit_factor
        )));
    }

    Ok(())
}

fn validate_embedding_config(config: &EmbeddingConfig) -> Result<(), ConfigError> {
    validate_http_url("embedding base-url", &config.base_url)?;

    if config.model.trim().is_empty() {
        return Err(ConfigError::Validation(
            "embedding model cannot be empty".to_string(),
        ));
    }

    if config.dimensions == Some(0) {
        return Err(ConfigError::Validation(
            "embedding dimensions must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_index_config(config: &IndexConfig) -> Result<(), ConfigError> {
    validate_http_url("index control-url", &config.control_url)?;

    if config.batch_size < 1 || config.batch_size > MAX_BATCH_SIZE {
        return Err(ConfigError::Validation(format!(
            "batch-size must be between 1 and {}, got {}",
            MAX_BATCH_SIZE, config.batch_size
        )));
    }

    Ok(())
}

fn validate_logging_config(config: &LoggingConfig) -> Result<(), ConfigError> {
    if config.file.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "logging file cannot be empty".to_string(),
        ));
    }

    if config.max_bytes < 1024 {
        return Err(ConfigError::Validation(format!(
            "logging max-bytes must be >= 1024, got {}",
            config.max_bytes
        )));
    }

    Ok(())
}

fn validate_http_url(name: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", name, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            name, value
        )));
    }

    Ok(())
}
