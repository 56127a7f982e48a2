//! Configuration management for keydex.
//!
//! Configuration is loaded from multiple sources with the following priority:
//! 1. Environment variables (highest priority)
//! 2. Project-local `keydex.toml` file
//! 3. User config `~/.config/keydex/config.toml`
//! 4. Built-in defaults (lowest priority)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

mod defaults;

pub use defaults::*;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Keyword service configuration.
    pub llm: LLMConfig,

    /// Indexing pipeline configuration.
    pub indexer: IndexerConfig,

    /// Catalog storage configuration.
    pub storage: StorageConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// Searches for config in order:
    /// 1. `./keydex.toml` (project local)
    /// 2. `~/.config/keydex/config.toml` (user config)
    /// 3. Falls back to defaults
    ///
    /// Environment overrides are applied in every case.
    pub fn load() -> Result<Self, ConfigError> {
        if Path::new("keydex.toml").exists() {
            return Self::from_file("keydex.toml");
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("keydex").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("KEYDEX_LLM_URL") {
            self.llm.base_url = url;
        }
        if let Ok(model) = std::env::var("KEYDEX_LLM_MODEL") {
            self.llm.model = model;
        }
        if let Ok(n) = std::env::var("KEYDEX_MAX_CONCURRENT_REQUESTS") {
            if let Ok(n) = n.parse() {
                self.indexer.max_concurrent_requests = n;
            }
        }
        if let Ok(db) = std::env::var("KEYDEX_DATABASE") {
            self.storage.database_path = PathBuf::from(db);
        }
        if let Ok(level) = std::env::var("KEYDEX_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.max_attempts == 0 {
            return Err(ConfigError::Invalid("llm.max_attempts must be at least 1".into()));
        }
        if self.indexer.max_concurrent_files == 0 || self.indexer.max_concurrent_requests == 0 {
            return Err(ConfigError::Invalid(
                "indexer concurrency limits must be at least 1".into(),
            ));
        }
        if self.indexer.keyword_batch_size == 0 {
            return Err(ConfigError::Invalid("indexer.keyword_batch_size must be at least 1".into()));
        }
        Ok(())
    }

    /// Create a default config file content as a string.
    pub fn default_config_string() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Keyword service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LLMConfig {
    /// Base URL of the generate API (without `/api/generate`).
    pub base_url: String,

    /// Model name passed through to the service.
    pub model: String,

    /// Sampling temperature.
    pub temperature: f32,

    /// Per-attempt request timeout in seconds.
    pub timeout_secs: u64,

    /// Characters of input kept before the prompt is built.
    pub max_input_chars: usize,

    /// Total attempts per request.
    pub max_attempts: u32,

    /// Linear backoff unit in milliseconds.
    pub backoff_ms: u64,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LLM_URL.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_ms: DEFAULT_BACKOFF_MS,
        }
    }
}

impl LLMConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

/// What to do when a path being indexed already has a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReindexPolicy {
    /// Delete the existing record (keywords cascade) and index again.
    #[default]
    Replace,
    /// Leave the existing record alone and report a duplicate.
    Reject,
}

/// Indexing pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Maximum number of file pipelines in flight.
    pub max_concurrent_files: usize,

    /// Maximum number of concurrent keyword service requests.
    pub max_concurrent_requests: usize,

    /// Keyword records per persisted batch.
    pub keyword_batch_size: usize,

    /// Bytes of a file read for text extraction.
    pub max_extract_bytes: u64,

    /// Re-index policy, applied uniformly to every file of a run.
    pub reindex: ReindexPolicy,

    /// Follow symbolic links while walking.
    pub follow_links: bool,

    /// Emit per-file stage failures as warnings instead of debug events.
    pub verbose: bool,

    /// Extensions eligible for text extraction (without leading dot).
    pub extensions: Vec<String>,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_files: DEFAULT_MAX_CONCURRENT_FILES,
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
            keyword_batch_size: DEFAULT_KEYWORD_BATCH_SIZE,
            max_extract_bytes: DEFAULT_MAX_EXTRACT_BYTES,
            reindex: ReindexPolicy::default(),
            follow_links: false,
            verbose: false,
            extensions: DEFAULT_TEXT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Catalog storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the SQLite catalog.
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATA_DIR).join(DEFAULT_DATABASE_FILE),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of error, warn, info, debug, trace.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}
