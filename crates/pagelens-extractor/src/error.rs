//! Error types for the Extractor

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during extraction
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// The PDF engine could not be loaded
    #[error("PDF engine unavailable: {0}")]
    EngineUnavailable(String),

    /// The document could not be opened
    #[error("Cannot open PDF '{path}': {reason}")]
    Open {
        /// Document path
        path: PathBuf,
        /// Engine message
        reason: String,
    },

    /// A page could not be read
    #[error("Page {page} unreadable: {reason}")]
    Page {
        /// 1-based page number
        page: u32,
        /// Engine message
        reason: String,
    },

    /// Rendering failed
    #[error("Render failed: {0}")]
    Render(String),

    /// Pixel data could not be turned into an image
    #[error("Image error: {0}")]
    Image(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<image::ImageError> for ExtractorError {
    fn from(e: image::ImageError) -> Self {
        ExtractorError::Image(e.to_string())
    }
}
