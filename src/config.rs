use crate::chat::ChatSettings;
use crate::chat::ollama::DEFAULT_OLLAMA_URL;
use crate::ingest::chunking::{DEFAULT_OVERLAP_CHARS, DEFAULT_WINDOW_SIZE_CHARS};
use crate::ingest::{ChunkingConfig, ChunkingError, DEFAULT_BATCH_SIZE};
use crate::weaviate::WeaviateSettings;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable {name}: {value:?}")]
    InvalidValue {
        /// Variable name.
        name: String,
        /// Raw value that failed to parse.
        value: String,
    },
    /// Chunk window, overlap, or batch size are unusable together.
    #[error("Invalid ingestion settings: {0}")]
    Chunking(#[from] ChunkingError),
    /// Configuration was already installed in the global cache.
    #[error("Configuration already initialized")]
    AlreadyInitialized,
}

/// Runtime configuration for the document chat server.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the Weaviate instance that stores chunks.
    pub weaviate_url: String,
    /// Optional bearer token for Weaviate.
    pub weaviate_api_key: Option<String>,
    /// Optional OpenAI key forwarded to Weaviate's vectorizer and generative modules.
    pub openai_api_key: Option<String>,
    /// Weaviate class holding document chunks.
    pub chunk_class: String,
    /// Vectorizer module configured on a newly created chunk class.
    pub vectorizer: String,
    /// Generative module configured on a newly created chunk class.
    pub generative_module: String,
    /// Base URL of the Ollama runtime.
    pub ollama_url: String,
    /// Model used for plain chat.
    pub chat_model: String,
    /// Model used when the caller asks for step-by-step reasoning.
    pub reasoning_model: String,
    /// Window length in characters.
    pub chunk_window_chars: usize,
    /// Characters shared between consecutive windows of a page.
    pub chunk_overlap_chars: usize,
    /// Chunk records per insert call.
    pub ingest_batch_size: usize,
    /// Directory holding the latest upload and its chunk log.
    pub upload_dir: PathBuf,
    /// Chunks retrieved per document question.
    pub search_limit: usize,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let text = |key: &str, default: &str| optional(key).unwrap_or_else(|| default.to_string());

        let config = Self {
            weaviate_url: text("WEAVIATE_URL", "http://localhost:8080"),
            weaviate_api_key: optional("WEAVIATE_API_KEY"),
            openai_api_key: optional("OPENAI_API_KEY"),
            chunk_class: text("WEAVIATE_CHUNK_CLASS", "Chunks"),
            vectorizer: text("WEAVIATE_VECTORIZER", "text2vec-openai"),
            generative_module: text("WEAVIATE_GENERATIVE_MODULE", "generative-openai"),
            ollama_url: text("OLLAMA_URL", DEFAULT_OLLAMA_URL),
            chat_model: text("CHAT_MODEL", "llama3.2"),
            reasoning_model: text("CHAT_REASONING_MODEL", "deepseek-r1:8b"),
            chunk_window_chars: parse_or("CHUNK_WINDOW_CHARS", optional("CHUNK_WINDOW_CHARS"))?
                .unwrap_or(DEFAULT_WINDOW_SIZE_CHARS),
            chunk_overlap_chars: parse_or("CHUNK_OVERLAP_CHARS", optional("CHUNK_OVERLAP_CHARS"))?
                .unwrap_or(DEFAULT_OVERLAP_CHARS),
            ingest_batch_size: parse_or("INGEST_BATCH_SIZE", optional("INGEST_BATCH_SIZE"))?
                .unwrap_or(DEFAULT_BATCH_SIZE),
            upload_dir: PathBuf::from(text("UPLOAD_DIR", "uploads")),
            search_limit: parse_or("SEARCH_LIMIT", optional("SEARCH_LIMIT"))?.unwrap_or(3),
            server_port: parse_or("SERVER_PORT", optional("SERVER_PORT"))?,
        };

        config.chunking()?;
        if config.ingest_batch_size == 0 {
            return Err(ChunkingError::ZeroBatchSize.into());
        }
        Ok(config)
    }

    /// Validated chunk geometry.
    pub fn chunking(&self) -> Result<ChunkingConfig, ChunkingError> {
        ChunkingConfig::new(self.chunk_window_chars, self.chunk_overlap_chars)
    }

    /// Connection settings for the Weaviate client.
    pub fn weaviate_settings(&self) -> WeaviateSettings {
        WeaviateSettings {
            url: self.weaviate_url.clone(),
            api_key: self.weaviate_api_key.clone(),
            openai_api_key: self.openai_api_key.clone(),
            chunk_class: self.chunk_class.clone(),
            vectorizer: self.vectorizer.clone(),
            generative_module: self.generative_module.clone(),
        }
    }

    /// Model selection for the chat pipeline.
    pub fn chat_settings(&self) -> ChatSettings {
        ChatSettings {
            chat_model: self.chat_model.clone(),
            reasoning_model: self.reasoning_model.clone(),
            search_limit: self.search_limit,
        }
    }
}

fn parse_or<T: FromStr>(name: &str, raw: Option<String>) -> Result<Option<T>, ConfigError> {
    raw.map(|value| {
        value.trim().parse().map_err(|_| ConfigError::InvalidValue {
            name: name.to_string(),
            value,
        })
    })
    .transpose()
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load `.env` plus the environment and install the result in the global cache.
pub fn init_config() -> Result<&'static Config, ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    tracing::debug!(
        weaviate_url = %config.weaviate_url,
        class = %config.chunk_class,
        ollama_url = %config.ollama_url,
        window = config.chunk_window_chars,
        overlap = config.chunk_overlap_chars,
        batch_size = config.ingest_batch_size,
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    CONFIG
        .set(config)
        .map_err(|_| ConfigError::AlreadyInitialized)?;
    Ok(get_config())
}
