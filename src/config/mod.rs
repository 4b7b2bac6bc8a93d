/// Configuration system for session-rag
///
/// Supports loading from multiple sources with priority:
/// Environment variables > Config file > Defaults
use crate::error::{ConfigError, RagError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file location, relative to the working directory
const DEFAULT_CONFIG_PATH: &str = "session-rag.toml";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Remote embedding service configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Vector store configuration
    #[serde(default)]
    pub vector_store: VectorStoreConfig,

    /// Indexing pipeline configuration
    #[serde(default)]
    pub indexing: IndexingConfig,

    /// Retrieval configuration
    #[serde(default)]
    pub search: SearchConfig,
}

/// Remote embedding service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Base URL of the embedding service
    #[serde(default = "default_embedding_url")]
    pub base_url: String,

    /// Model name sent with every embedding request
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Dimensionality of the vectors the service returns
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Transport timeout in seconds for a single embedding call
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
}

/// Vector store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    /// Vector store server URL
    #[serde(default = "default_store_url")]
    pub url: String,

    /// Collection name shared by all sessions
    #[serde(default = "default_collection_name")]
    pub collection_name: String,

    /// Maximum rows per insert request (transport limit of the store)
    #[serde(default = "default_insert_batch_size")]
    pub insert_batch_size: usize,

    /// Index build polling schedule and bounds
    #[serde(default)]
    pub index: IndexPollConfig,
}

/// Polling schedule for index-build readiness
///
/// The poll interval starts at `initial_ms`, grows by `growth` after every
/// poll, and is capped at `max_interval_ms`. The loop gives up when either
/// `max_wait_ms` of wall-clock time has elapsed or `max_attempts` polls have
/// been made, whichever comes first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexPollConfig {
    #[serde(default = "default_poll_initial_ms")]
    pub initial_ms: u64,

    #[serde(default = "default_poll_growth")]
    pub growth: f64,

    #[serde(default = "default_poll_max_interval_ms")]
    pub max_interval_ms: u64,

    #[serde(default = "default_poll_max_wait_ms")]
    pub max_wait_ms: u64,

    #[serde(default = "default_poll_max_attempts")]
    pub max_attempts: u32,
}

/// Indexing pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexingConfig {
    /// Maximum files processed concurrently
    ///
    /// Kept lower than the embedding ceiling: each in-flight file fans out
    /// again at the chunk level, so peak concurrency is the product of both.
    #[serde(default = "default_max_concurrent_files")]
    pub max_concurrent_files: usize,

    /// Maximum embedding calls in flight per file
    #[serde(default = "default_max_concurrent_embeddings")]
    pub max_concurrent_embeddings: usize,

    /// Lines per chunk for the default line-window chunker
    #[serde(default = "default_chunk_lines")]
    pub chunk_lines: usize,

    /// Include internal error detail in failure payloads
    #[serde(default)]
    pub development_mode: bool,
}

/// Retrieval configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Default result limit
    #[serde(default = "default_search_limit")]
    pub default_limit: usize,

    /// Maximum result limit callers may request
    #[serde(default = "default_search_max_limit")]
    pub max_limit: usize,
}

// Default value functions
fn default_embedding_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_model_name() -> String {
    "bge-large-en-v1.5".to_string()
}

fn default_dimension() -> usize {
    1024
}

fn default_embedding_timeout() -> u64 {
    30
}

fn default_store_url() -> String {
    "http://localhost:19530".to_string()
}

fn default_collection_name() -> String {
    "code_chunks".to_string()
}

fn default_insert_batch_size() -> usize {
    1000
}

fn default_poll_initial_ms() -> u64 {
    500
}

fn default_poll_growth() -> f64 {
    1.2
}

fn default_poll_max_interval_ms() -> u64 {
    5_000
}

fn default_poll_max_wait_ms() -> u64 {
    60_000
}

fn default_poll_max_attempts() -> u32 {
    60
}

fn default_max_concurrent_files() -> usize {
    3
}

fn default_max_concurrent_embeddings() -> usize {
    8
}

fn default_chunk_lines() -> usize {
    50
}

fn default_search_limit() -> usize {
    5
}

fn default_search_max_limit() -> usize {
    10
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: default_embedding_url(),
            model_name: default_model_name(),
            dimension: default_dimension(),
            timeout_secs: default_embedding_timeout(),
        }
    }
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            collection_name: default_collection_name(),
            insert_batch_size: default_insert_batch_size(),
            index: IndexPollConfig::default(),
        }
    }
}

impl Default for IndexPollConfig {
    fn default() -> Self {
        Self {
            initial_ms: default_poll_initial_ms(),
            growth: default_poll_growth(),
            max_interval_ms: default_poll_max_interval_ms(),
            max_wait_ms: default_poll_max_wait_ms(),
            max_attempts: default_poll_max_attempts(),
        }
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            max_concurrent_files: default_max_concurrent_files(),
            max_concurrent_embeddings: default_max_concurrent_embeddings(),
            chunk_lines: default_chunk_lines(),
            development_mode: false,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_search_limit(),
            max_limit: default_search_max_limit(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: &Path) -> Result<Self, RagError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFailed(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseFailed(format!("Invalid TOML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default location or fall back to defaults
    pub fn load_or_default() -> Result<Self, RagError> {
        Self::load_or_default_from(Path::new(DEFAULT_CONFIG_PATH))
    }

    /// Load configuration from `path` if it exists, defaults otherwise
    pub fn load_or_default_from(path: &Path) -> Result<Self, RagError> {
        if path.exists() {
            tracing::info!("Loading config from: {}", path.display());
            Self::from_file(path)
        } else {
            tracing::info!("No config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Env-override logic with the variable lookup injected, so it can be
    /// exercised without mutating process-wide state
    fn apply_env_from(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(url) = get("SESSION_RAG_EMBEDDING_URL") {
            self.embedding.base_url = url;
        }

        if let Some(model) = get("SESSION_RAG_MODEL") {
            self.embedding.model_name = model;
        }

        if let Some(url) = get("SESSION_RAG_STORE_URL") {
            self.vector_store.url = url;
        }

        if let Some(collection) = get("SESSION_RAG_COLLECTION") {
            self.vector_store.collection_name = collection;
        }

        if let Some(dimension) = get("SESSION_RAG_DIMENSION")
            && let Ok(dim) = dimension.parse()
        {
            self.embedding.dimension = dim;
        }

        if let Some(dev) = get("SESSION_RAG_DEV_MODE") {
            self.indexing.development_mode = dev == "1" || dev.eq_ignore_ascii_case("true");
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), RagError> {
        if self.embedding.dimension == 0 {
            return Err(ConfigError::InvalidValue {
                key: "embedding.dimension".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.vector_store.insert_batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "vector_store.insert_batch_size".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.indexing.max_concurrent_files == 0 {
            return Err(ConfigError::InvalidValue {
                key: "indexing.max_concurrent_files".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.indexing.max_concurrent_embeddings == 0 {
            return Err(ConfigError::InvalidValue {
                key: "indexing.max_concurrent_embeddings".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.indexing.chunk_lines == 0 {
            return Err(ConfigError::InvalidValue {
                key: "indexing.chunk_lines".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.vector_store.index.growth < 1.0 {
            return Err(ConfigError::InvalidValue {
                key: "vector_store.index.growth".to_string(),
                reason: format!("must be >= 1.0, got {}", self.vector_store.index.growth),
            }
            .into());
        }

        if self.search.default_limit == 0 || self.search.default_limit > self.search.max_limit {
            return Err(ConfigError::InvalidValue {
                key: "search.default_limit".to_string(),
                reason: format!(
                    "must be between 1 and {}, got {}",
                    self.search.max_limit, self.search.default_limit
                ),
            }
            .into());
        }

        Ok(())
    }

    /// Create a new Config from the default file location, with environment
    /// overrides applied on top
    pub fn new() -> Result<Self, RagError> {
        let mut config = Self::load_or_default()?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.indexing.max_concurrent_files, 3);
        assert_eq!(config.indexing.max_concurrent_embeddings, 8);
        assert_eq!(config.vector_store.insert_batch_size, 1000);
        assert_eq!(config.embedding.dimension, 1024);
    }

    #[test]
    fn test_poll_defaults() {
        let poll = IndexPollConfig::default();
        assert_eq!(poll.initial_ms, 500);
        assert!((poll.growth - 1.2).abs() < f64::EPSILON);
        assert_eq!(poll.max_interval_ms, 5_000);
        assert_eq!(poll.max_wait_ms, 60_000);
        assert_eq!(poll.max_attempts, 60);
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let mut config = Config::default();
        config.vector_store.insert_batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut config = Config::default();
        config.indexing.max_concurrent_files = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_shrinking_poll_growth_rejected() {
        let mut config = Config::default();
        config.vector_store.index.growth = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file_missing() {
        let result = Config::from_file(Path::new("/nonexistent/session-rag.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_from_file_partial_toml_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[embedding]\ndimension = 768\n\n[indexing]\nmax_concurrent_files = 2\n"
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.embedding.dimension, 768);
        assert_eq!(config.indexing.max_concurrent_files, 2);
        // untouched sections keep their defaults
        assert_eq!(config.vector_store.insert_batch_size, 1000);
        assert_eq!(config.search.default_limit, 5);
    }

    #[test]
    fn test_from_file_empty_toml_is_all_defaults() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_or_default_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_or_default_reads_existing_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[search]\ndefault_limit = 3\n").unwrap();

        let config = Config::load_or_default_from(file.path()).unwrap();
        assert_eq!(config.search.default_limit, 3);
    }

    #[test]
    fn test_env_overrides_applied() {
        let vars: std::collections::HashMap<&str, &str> = [
            ("SESSION_RAG_EMBEDDING_URL", "http://embed.internal:8080"),
            ("SESSION_RAG_MODEL", "bge-m3"),
            ("SESSION_RAG_STORE_URL", "http://milvus.internal:19530"),
            ("SESSION_RAG_COLLECTION", "alt_chunks"),
            ("SESSION_RAG_DIMENSION", "768"),
            ("SESSION_RAG_DEV_MODE", "true"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env_from(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.embedding.base_url, "http://embed.internal:8080");
        assert_eq!(config.embedding.model_name, "bge-m3");
        assert_eq!(config.vector_store.url, "http://milvus.internal:19530");
        assert_eq!(config.vector_store.collection_name, "alt_chunks");
        assert_eq!(config.embedding.dimension, 768);
        assert!(config.indexing.development_mode);
    }

    #[test]
    fn test_env_overrides_ignore_unset_and_bad_values() {
        let mut config = Config::default();
        let dimension = config.embedding.dimension;

        config.apply_env_from(|key| {
            (key == "SESSION_RAG_DIMENSION").then(|| "not-a-number".to_string())
        });

        assert_eq!(config.embedding.dimension, dimension);
        assert_eq!(config, Config::default());
    }
}
