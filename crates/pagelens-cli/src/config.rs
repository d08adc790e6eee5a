//! Configuration management for the CLI.
//!
//! Values come from `~/.pagelens/config.toml` (optional), then environment
//! variables, then command-line flags, each layer overriding the previous.

use crate::error::{CliError, Result};
use pagelens_llm::openai::{
    DEFAULT_BASE_URL, DEFAULT_CHAT_MODEL, DEFAULT_EMBEDDING_MODEL, DEFAULT_TIMEOUT_SECS, DEFAULT_VISION_MODEL,
};
use pagelens_store::DEFAULT_COLLECTION;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Provider credential
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
/// Embedding model override
pub const ENV_EMBEDDING_MODEL: &str = "OPENAI_EMBEDDING_MODEL";
/// Vision model override
pub const ENV_VISION_MODEL: &str = "OPENAI_VISION_MODEL";
/// Chat model override
pub const ENV_CHAT_MODEL: &str = "OPENAI_LLM_MODEL";
/// API base URL override
pub const ENV_BASE_URL: &str = "OPENAI_BASE_URL";
/// PDFium library directory
pub const ENV_PDFIUM_DIR: &str = "PDFIUM_LIB_DIR";

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Model provider settings
    #[serde(default)]
    pub models: ModelSettings,

    /// Store settings
    #[serde(default)]
    pub store: StoreSettings,

    /// Output settings
    #[serde(default)]
    pub output: OutputSettings,

    /// Provider key; read from the environment only, never from the file
    #[serde(skip)]
    pub api_key: Option<String>,

    /// PDFium library directory
    #[serde(skip)]
    pub pdfium_dir: Option<PathBuf>,
}

/// Model provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Embedding model name
    #[serde(default = "default_embedding_model")]
    pub embedding: String,

    /// Vision model name
    #[serde(default = "default_vision_model")]
    pub vision: String,

    /// Chat model name used for answers
    #[serde(default = "default_chat_model")]
    pub chat: String,

    /// OpenAI-compatible API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Collection name
    #[serde(default = "default_collection")]
    pub collection: String,
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
}

impl Config {
    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".pagelens").join("config.toml"))
    }

    /// Load configuration from `path`, or the default location.
    ///
    /// A missing default file yields the defaults; a missing explicit file is
    /// an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let path = Self::path()?;
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load configuration from a file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| CliError::Config(format!("Cannot read '{}': {}", path.display(), e)))?;
        let config: Config = toml::from_str(&contents)?;
        config.validate().map_err(CliError::Config)?;
        Ok(config)
    }

    /// Overlay environment variables read through `lookup`.
    ///
    /// Empty values count as unset.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        self.api_key = get(ENV_API_KEY);
        self.pdfium_dir = get(ENV_PDFIUM_DIR).map(PathBuf::from);
        if let Some(model) = get(ENV_EMBEDDING_MODEL) {
            self.models.embedding = model;
        }
        if let Some(model) = get(ENV_VISION_MODEL) {
            self.models.vision = model;
        }
        if let Some(model) = get(ENV_CHAT_MODEL) {
            self.models.chat = model;
        }
        if let Some(url) = get(ENV_BASE_URL) {
            self.models.base_url = url;
        }
    }

    /// Overlay the process environment.
    pub fn apply_process_env(&mut self) {
        self.apply_env(|key| std::env::var(key).ok());
    }

    /// The provider key, or [`CliError::MissingCredential`].
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or(CliError::MissingCredential(ENV_API_KEY))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.models.embedding.trim().is_empty() {
            return Err("models.embedding must not be empty".to_string());
        }
        if self.models.timeout_secs == 0 {
            return Err("models.timeout_secs must be greater than 0".to_string());
        }
        if self.store.collection.trim().is_empty() {
            return Err("store.collection must not be empty".to_string());
        }
        Ok(())
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            embedding: default_embedding_model(),
            vision: default_vision_model(),
            chat: default_chat_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            collection: default_collection(),
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_vision_model() -> String {
    DEFAULT_VISION_MODEL.to_string()
}

fn default_chat_model() -> String {
    DEFAULT_CHAT_MODEL.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}
