use crate::config::types::{Config, Secrets};
use crate::config::validation::validate;
use crate::ConfigResult;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const PINECONE_API_KEY: &str = "PINECONE_API_KEY";
pub const PINECONE_INDEX: &str = "PINECONE_INDEX";
pub const PINECONE_HOST: &str = "PINECONE_HOST";

/// Env files looked up next to the job, first match wins
pub const ENV_FILES: [&str; 2] = [".env.local", ".env"];

/// Loads and parses a configuration file from the given path
///
/// Secrets are not part of the file; the returned config carries empty
/// [`Secrets`] until [`load_secrets`] fills them in.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use criterion_pipeline::config::load_config;
///
/// let config = load_config(Path::new("pipeline.toml")).unwrap();
/// println!("Batch size: {}", config.index.batch_size);
/// ```
pub fn load_config(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so a run can be traced back to the exact settings used.
pub fn compute_config_hash(path: &Path) -> ConfigResult<String> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> ConfigResult<(Config, String)> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Reads API credentials from the process environment and an env file in `dir`
///
/// `.env.local` is preferred over `.env`. Process variables take precedence
/// over file entries. Returns the env file used, if any.
pub fn load_secrets(dir: &Path) -> ConfigResult<(Secrets, Option<PathBuf>)> {
    secrets_with_env_file(dir, |key| std::env::var(key).ok())
}

/// Finds the env file to load from `dir`
pub fn find_env_file(dir: &Path) -> Option<PathBuf> {
    ENV_FILES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Parses a dotenv-style file without touching the process environment
pub fn read_env_file(path: &Path) -> ConfigResult<HashMap<String, String>> {
    let vars = dotenvy::from_path_iter(path)?.collect::<Result<HashMap<_, _>, _>>()?;
    Ok(vars)
}

fn secrets_with_env_file<F>(
    dir: &Path,
    process_env: F,
) -> ConfigResult<(Secrets, Option<PathBuf>)>
where
    F: Fn(&str) -> Option<String>,
{
    let env_file = find_env_file(dir);
    let file_vars = match &env_file {
        Some(path) => read_env_file(path)?,
        None => HashMap::new(),
    };

    let secrets = secrets_from_lookup(|key| {
        process_env(key)
            .filter(|value| !value.trim().is_empty())
            .or_else(|| file_vars.get(key).cloned())
    });
    Ok((secrets, env_file))
}

/// Builds [`Secrets`] from an arbitrary key lookup
///
/// Empty or whitespace-only values count as absent.
pub fn secrets_from_lookup<F>(lookup: F) -> Secrets
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| {
        lookup(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    Secrets {
        openai_api_key: get(OPENAI_API_KEY),
        pinecone_api_key: get(PINECONE_API_KEY),
        pinecone_index: get(PINECONE_INDEX),
        pinecone_host: get(PINECONE_HOST),
    }
}
