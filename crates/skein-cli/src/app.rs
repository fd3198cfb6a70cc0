//! Skein CLI application.
//!
//! Wires the configuration into an embedding service and search engine and
//! dispatches commands.

use crate::cli::{CliArgs, Command};
use crate::config::SkeinConfig;
use crate::config_handlers;
use skein_core::{Error, Result};
use skein_vector::{
    ChunkVectorWriter, DocumentChunk, EmbeddingBackend, EmbeddingService, MemoryEmbeddingCache,
    SearchQuery, SearchResult, VectorSearchEngine, VectorWriteDriver, WriteStats,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SkeinCli
// ============================================================================

/// Options for the `embed` command.
#[derive(Debug, Clone)]
pub struct EmbedOptions {
    /// Chunk file to read.
    pub input: PathBuf,
    /// Where to write embedded chunks.
    pub output: PathBuf,
    /// Re-embed chunks that already carry vectors.
    pub force: bool,
    /// Model override.
    pub model: Option<String>,
}

/// The Skein command-line application.
pub struct SkeinCli {
    config: SkeinConfig,
    version: String,
}

impl SkeinCli {
    /// Create from CLI args, loading config from file/env.
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let config = SkeinConfig::load(args.config.as_deref())?;
        Ok(Self::new(config))
    }

    /// Create an application with an explicit configuration.
    pub fn new(config: SkeinConfig) -> Self {
        Self {
            config,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Override the version string.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// The loaded configuration.
    pub fn config(&self) -> &SkeinConfig {
        &self.config
    }

    /// Initialise tracing-based logging.
    ///
    /// Uses `RUST_LOG` env var if set, otherwise defaults based on verbosity flags.
    /// Records emitted through the `log` facade are captured too.
    pub fn init_logging(verbose: bool, quiet: bool) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if quiet {
            EnvFilter::new("warn")
        } else if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        };

        // Ignore error if a subscriber is already set (e.g. in tests).
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }

    /// Run the CLI with the given arguments.
    pub async fn run(&self, args: CliArgs) -> Result<()> {
        Self::init_logging(args.verbose, args.quiet);

        match args.command {
            Some(Command::Embed {
                input,
                output,
                force,
                model,
            }) => {
                let output = output.unwrap_or_else(|| input.clone());
                let options = EmbedOptions {
                    input: PathBuf::from(input),
                    output: PathBuf::from(output),
                    force,
                    model,
                };
                let stats = self.embed(&options).await?;
                println!(
                    "Embedded {} chunks ({} already up to date) -> {}",
                    stats.embedded,
                    stats.skipped,
                    options.output.display()
                );
                Ok(())
            }
            Some(Command::Search {
                query,
                store,
                strategy,
                top_k,
                threshold,
                json,
            }) => {
                let mut search_query = SearchQuery::new(query);
                if let Some(strategy) = strategy {
                    search_query = search_query.with_strategy(strategy);
                }
                if let Some(top_k) = top_k {
                    search_query = search_query.with_top_k(top_k);
                }
                if let Some(threshold) = threshold {
                    search_query = search_query.with_threshold(threshold);
                }

                let chunks = load_chunks(Path::new(&store)).await?;
                let result = self.search(&search_query, &chunks).await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&result)?);
                } else {
                    print!("{}", format_results(&result, &chunks));
                }
                Ok(())
            }
            Some(Command::Version) => {
                println!("skein {}", self.version);
                Ok(())
            }
            Some(Command::Config(config_cmd)) => {
                config_handlers::handle_config_command(args.config.as_deref(), config_cmd.command)
            }
            None => {
                println!("skein {} - use --help for usage", self.version);
                Ok(())
            }
        }
    }

    /// Embed the chunks in `options.input` and write them to `options.output`.
    pub async fn embed(&self, options: &EmbedOptions) -> Result<WriteStats> {
        let mut chunks = load_chunks(&options.input).await?;
        let (service, cache) = self.embedding_service()?;

        let driver = VectorWriteDriver::new(service, ChunkVectorWriter);
        let model = options.model.as_deref();
        let stats = if options.force {
            driver.rewrite(&mut chunks, model).await?
        } else {
            driver.write(&mut chunks, model).await?
        };

        save_chunks(&options.output, &chunks).await?;
        self.save_cache(&cache).await?;
        Ok(stats)
    }

    /// Search `chunks` with the configured engine.
    pub async fn search(
        &self,
        query: &SearchQuery,
        chunks: &[DocumentChunk],
    ) -> Result<SearchResult> {
        let (service, cache) = self.embedding_service()?;
        let engine = VectorSearchEngine::new(service, self.config.search.clone());
        let result = engine.search(query, chunks).await?;
        self.save_cache(&cache).await?;
        Ok(result)
    }

    fn embedding_service(&self) -> Result<(Arc<EmbeddingService>, Arc<MemoryEmbeddingCache>)> {
        let cache = match &self.config.embedding.cache_path {
            Some(path) => MemoryEmbeddingCache::load_snapshot(Path::new(path))?,
            None => MemoryEmbeddingCache::new(),
        };
        let cache = Arc::new(cache);
        let service = EmbeddingService::new(
            self.backend(),
            cache.clone(),
            self.config.embedding.clone(),
        );
        Ok((Arc::new(service), cache))
    }

    async fn save_cache(&self, cache: &MemoryEmbeddingCache) -> Result<()> {
        if let Some(path) = &self.config.embedding.cache_path {
            cache.save_snapshot(Path::new(path)).await?;
        }
        Ok(())
    }

    #[cfg(feature = "vector-fastembed")]
    fn backend(&self) -> Arc<dyn EmbeddingBackend> {
        Arc::new(skein_vector::FastEmbedBackend::new(None))
    }

    #[cfg(not(feature = "vector-fastembed"))]
    fn backend(&self) -> Arc<dyn EmbeddingBackend> {
        tracing::warn!("built without vector-fastembed; using the deterministic mock backend");
        Arc::new(skein_vector::MockEmbeddingBackend::new(
            self.config.embedding.dimension,
        ))
    }
}

// ============================================================================
// Chunk files
// ============================================================================

/// Read a JSON array of chunks.
///
/// A missing file is reported as [`Error::NotFound`].
pub async fn load_chunks(path: &Path) -> Result<Vec<DocumentChunk>> {
    let json = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                Error::not_found(format!("chunk file {}", path.display()))
            }
            _ => Error::io_with_path(e, path),
        })?;
    let chunks: Vec<DocumentChunk> = serde_json::from_str(&json)?;
    tracing::debug!("loaded {} chunks from {}", chunks.len(), path.display());
    Ok(chunks)
}

/// Write chunks as a pretty JSON array.
pub async fn save_chunks(path: &Path, chunks: &[DocumentChunk]) -> Result<()> {
    let json = serde_json::to_string_pretty(chunks)?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| Error::io_with_path(e, path))
}

/// Render a result as numbered lines with a content excerpt.
pub fn format_results(result: &SearchResult, chunks: &[DocumentChunk]) -> String {
    if result.is_empty() {
        return format!("No results ({} search)\n", result.strategy);
    }

    let mut out = String::new();
    for (rank, chunk) in result.resolve(chunks).into_iter().enumerate() {
        let score = result.score(&chunk.id).unwrap_or_default();
        let excerpt: String = chunk.content.chars().take(80).collect();
        out.push_str(&format!("{:>2}. [{score:.4}] {}  {excerpt}\n", rank + 1, chunk.id));
    }
    out.push_str(&format!(
        "{} results ({} search, {:.2}ms)\n",
        result.len(),
        result.strategy,
        result.execution_time_ms
    ));
    out
}

// ============================================================================
// Tests
// ============================================================================
