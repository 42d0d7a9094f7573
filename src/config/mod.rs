//! Configuration module for the pipeline
//!
//! Tunables come from an optional TOML file; API credentials come from the
//! environment or a `.env.local` / `.env` file. Both are checked before any
//! network activity.
//!
//! # Example
//!
//! ```no_run
//! use criterion_pipeline::config::{load_config, load_secrets};
//! use std::path::Path;
//!
//! let mut config = load_config(Path::new("pipeline.toml")).unwrap();
//! let (secrets, _env_file) = load_secrets(Path::new(".")).unwrap();
//! config.secrets = secrets;
//! println!("Scraping {}", config.source.catalog_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, EmbeddingConfig, IndexConfig, LoggingConfig, RetryConfig, Secrets, SourceConfig,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, find_env_file, load_config, load_config_with_hash, load_secrets,
    read_env_file, secrets_from_lookup, ENV_FILES, OPENAI_API_KEY, PINECONE_API_KEY,
    PINECONE_HOST, PINECONE_INDEX,
};

pub use validation::{require_secrets, validate, Services, MAX_BATCH_SIZE};
