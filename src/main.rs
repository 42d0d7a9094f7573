//! Criterion Pipeline main entry point
//!
//! Command-line interface for the catalog-to-vector-index batch job. Meant
//! to be started by cron; a non-zero exit status means the run failed.

use anyhow::Context;
use clap::Parser;
use criterion_pipeline::config::{
    load_config_with_hash, load_secrets, require_secrets, Config, Services,
};
use criterion_pipeline::embedder::{Embedder, OpenAiEmbedder};
use criterion_pipeline::index::PineconeIndex;
use criterion_pipeline::logging::setup_logging;
use criterion_pipeline::output::read_vectors;
use criterion_pipeline::pipeline::{upload_only, Pipeline, PipelineOptions};
use criterion_pipeline::source::{CsvSource, ItemSource, ScrapeSource};
use criterion_pipeline::RetryPolicy;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Default config file, used when present and no --config is given
const DEFAULT_CONFIG: &str = "pipeline.toml";

/// Config file path and its hash, when one was read
type LoadedFrom = Option<(PathBuf, String)>;

/// Criterion Pipeline: scrape, embed and index a film catalog
///
/// Scrapes the catalog listing and every film's detail page, embeds each
/// film's text and upserts the vectors into a Pinecone index.
#[derive(Parser, Debug)]
#[command(name = "criterion-pipeline")]
#[command(version = "1.0.0")]
#[command(about = "Scrape a film catalog into a vector index", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Read films from a CSV export instead of scraping the site
    #[arg(long, value_name = "PATH", conflicts_with = "upload_only")]
    csv: Option<PathBuf>,

    /// Write all generated vectors to this JSON file
    #[arg(short, long, value_name = "PATH", conflicts_with = "upload_only")]
    output: Option<PathBuf>,

    /// Export the scraped catalog with descriptions to this CSV file
    #[arg(long, value_name = "PATH", conflicts_with = "upload_only")]
    catalog_csv: Option<PathBuf>,

    /// Directory searched for .env.local or .env
    #[arg(long, value_name = "DIR", default_value = ".")]
    env_dir: PathBuf,

    /// Generate vectors but do not upload them
    #[arg(long, conflicts_with = "upload_only")]
    no_upload: bool,

    /// Upload vectors from a JSON file written by --output and exit
    #[arg(long, value_name = "PATH")]
    upload_only: Option<PathBuf>,

    /// Validate config and environment, show what would run, and exit
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    fn services(&self) -> Services {
        Services {
            embedding: self.upload_only.is_none(),
            index: !self.no_upload,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let (mut config, loaded_from) = match load_configuration(cli.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            // Logging is configured from the file, so fall back to stderr
            eprintln!("Failed to load configuration: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = setup_logging(&config.logging, cli.verbose, cli.quiet) {
        tracing::warn!(
            "Could not open log file {}: {}",
            config.logging.file.display(),
            e
        );
    }

    tracing::info!("{}", "=".repeat(60));
    tracing::info!("Starting Criterion pipeline");
    tracing::info!("{}", "=".repeat(60));
    match loaded_from {
        Some((path, hash)) => tracing::info!(
            "Loaded configuration from {} (hash: {})",
            path.display(),
            hash
        ),
        None => tracing::debug!("No config file, using defaults"),
    }

    match load_secrets(&cli.env_dir) {
        Ok((secrets, env_file)) => {
            match env_file {
                Some(path) => tracing::info!("Loaded environment from {}", path.display()),
                None => tracing::warn!(
                    "No .env.local or .env file found in {}, using process environment",
                    cli.env_dir.display()
                ),
            }
            config.secrets = secrets;
        }
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    }
    if let Err(e) = require_secrets(&config.secrets, cli.services()) {
        tracing::error!("{}", e);
        return ExitCode::FAILURE;
    }
    if let Some(index) = &config.secrets.pinecone_index {
        tracing::info!("Config validated. PINECONE_INDEX={}", index);
    }

    let result = if cli.dry_run {
        handle_dry_run(&cli, &config);
        Ok(())
    } else if let Some(path) = &cli.upload_only {
        handle_upload_only(&config, path).await
    } else {
        handle_run(&cli, &config).await
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Pipeline failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Loads the config file if one was given or the default exists
///
/// Returns the file path and its hash alongside the config when a file was read.
fn load_configuration(path: Option<&Path>) -> anyhow::Result<(Config, LoadedFrom)> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None if Path::new(DEFAULT_CONFIG).exists() => PathBuf::from(DEFAULT_CONFIG),
        None => return Ok((Config::default(), None)),
    };

    let (config, hash) = load_config_with_hash(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    Ok((config, Some((path, hash))))
}

/// Handles the --dry-run mode: shows what a run would do
fn handle_dry_run(cli: &Cli, config: &Config) {
    println!("=== Criterion Pipeline Dry Run ===\n");

    println!("Source:");
    match &cli.csv {
        Some(path) => println!("  CSV file: {}", path.display()),
        None => {
            println!("  Catalog URL: {}", config.source.catalog_url);
            println!("  User agent: {}", config.source.user_agent);
            println!("  Detail delay: {}ms", config.source.detail_delay);
        }
    }

    println!("\nRetry:");
    println!("  Max attempts: {}", config.retry.max_attempts);
    println!("  Base delay: {}ms", config.retry.base_delay);
    println!("  Rate limit factor: {}", config.retry.rate_limit_factor);
    println!("  Jitter: {}", config.retry.jitter);

    println!("\nEmbedding:");
    println!("  Endpoint: {}", config.embedding.base_url);
    println!("  Model: {}", config.embedding.model);

    println!("\nIndex:");
    if cli.no_upload {
        println!("  Upload disabled");
    } else {
        println!(
            "  Name: {}",
            config.secrets.pinecone_index.as_deref().unwrap_or("<unset>")
        );
        println!(
            "  Host: {}",
            config
                .secrets
                .pinecone_host
                .as_deref()
                .unwrap_or("<resolved at runtime>")
        );
        println!("  Batch size: {}", config.index.batch_size);
    }

    if let Some(path) = &cli.output {
        println!("\nOutput: {}", path.display());
    }
    if let Some(path) = &cli.catalog_csv {
        println!("Catalog CSV: {}", path.display());
    }
    println!("Log file: {}", config.logging.file.display());

    println!("\n✓ Configuration is valid");
}

/// Handles the main scrape/embed/upload run
async fn handle_run(cli: &Cli, config: &Config) -> anyhow::Result<()> {
    let policy = RetryPolicy::from_config(&config.retry);

    let source: Box<dyn ItemSource> = match &cli.csv {
        Some(path) => Box::new(CsvSource::open(path)?),
        None => Box::new(ScrapeSource::new(&config.source, policy.clone())?),
    };

    let api_key = config
        .secrets
        .openai_api_key
        .as_deref()
        .context("OPENAI_API_KEY is not set")?;
    let embedder =
        OpenAiEmbedder::new(api_key, &config.embedding, &config.source, policy.clone())?;
    tracing::info!("Embedding with model {}", embedder.model());

    let options = PipelineOptions {
        batch_size: config.index.batch_size,
        retry: policy.clone(),
        output: cli.output.clone(),
        catalog_csv: cli.catalog_csv.clone(),
    };

    let summary = if cli.no_upload {
        Pipeline::new(source.as_ref(), &embedder, options).run().await?
    } else {
        let index = connect_index(config, &policy).await?;
        Pipeline::new(source.as_ref(), &embedder, options)
            .with_index(&index)
            .run()
            .await?
    };

    tracing::info!("{}", "=".repeat(60));
    for line in summary.to_string().lines() {
        tracing::info!("{}", line);
    }
    tracing::info!("{}", "=".repeat(60));
    Ok(())
}

/// Handles the --upload-only mode
async fn handle_upload_only(config: &Config, path: &Path) -> anyhow::Result<()> {
    let policy = RetryPolicy::from_config(&config.retry);
    let vectors = read_vectors(path)?;
    let index = connect_index(config, &policy).await?;

    let options = PipelineOptions {
        batch_size: config.index.batch_size,
        retry: policy,
        ..PipelineOptions::default()
    };
    let summary = upload_only(&index, &vectors, &options).await?;
    for line in summary.to_string().lines() {
        tracing::info!("{}", line);
    }
    Ok(())
}

async fn connect_index(config: &Config, policy: &RetryPolicy) -> anyhow::Result<PineconeIndex> {
    let secrets = &config.secrets;
    let api_key = secrets
        .pinecone_api_key
        .as_deref()
        .context("PINECONE_API_KEY is not set")?;
    let index_name = secrets
        .pinecone_index
        .as_deref()
        .context("PINECONE_INDEX is not set")?;

    let index = PineconeIndex::connect(
        api_key,
        index_name,
        secrets.pinecone_host.as_deref(),
        &config.index,
        &config.source,
        policy,
    )
    .await?;
    Ok(index)
}
