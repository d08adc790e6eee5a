//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// A required credential is not set
    #[error("{0} env var is required.")]
    MissingCredential(&'static str),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pipeline error
    #[error(transparent)]
    Pipeline(#[from] pagelens_pipeline::PipelineError),

    /// Store error
    #[error(transparent)]
    Store(#[from] pagelens_store::StoreError),

    /// PDF engine error
    #[error(transparent)]
    Extractor(#[from] pagelens_extractor::ExtractorError),

    /// Model provider error
    #[error("Model provider error: {0}")]
    Llm(#[from] pagelens_llm::LlmError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
