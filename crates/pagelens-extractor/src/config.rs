//! Configuration for the Extractor

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Pages whose embedded images are extracted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddedImageScope {
    /// Every processed page
    #[default]
    EveryPage,
    /// Only the last processed page (legacy behaviour)
    LastPageOnly,
}

/// Configuration for the Extractor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Directory under which `images/` is written
    pub out_dir: PathBuf,

    /// Page raster resolution
    pub dpi: u32,

    /// Stop after this many pages
    pub max_pages: Option<usize>,

    /// Which pages contribute embedded images
    pub image_scope: EmbeddedImageScope,
}

/// Default page raster resolution
pub const DEFAULT_DPI: u32 = 200;

impl ExtractorConfig {
    /// Defaults, writing images under `out_dir/images`
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            dpi: DEFAULT_DPI,
            max_pages: None,
            image_scope: EmbeddedImageScope::EveryPage,
        }
    }

    /// Directory images are saved to
    pub fn image_dir(&self) -> PathBuf {
        self.out_dir.join("images")
    }

    /// Output directory
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.dpi == 0 {
            return Err("dpi must be greater than 0".to_string());
        }
        if self.dpi > 1200 {
            return Err("dpi must not exceed 1200".to_string());
        }
        Ok(())
    }
}
