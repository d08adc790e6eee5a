//! PDF engine seam
//!
//! The extractor only needs a handful of per-page facts: size, positioned
//! text runs, a rendering, and the images placed on the page. Everything the
//! engine reports uses PDF coordinates (points, bottom-left origin).

use crate::error::ExtractorError;
use std::path::Path;

/// A rectangle in PDF user space (bottom-left origin)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfRect {
    /// Left edge
    pub left: f64,
    /// Bottom edge
    pub bottom: f64,
    /// Right edge
    pub right: f64,
    /// Top edge
    pub top: f64,
}

impl PdfRect {
    /// Build from the four edges
    pub fn new(left: f64, bottom: f64, right: f64, top: f64) -> Self {
        Self { left, bottom, right, top }
    }
}

/// One run of text with its position
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    /// Run text
    pub text: String,
    /// Position on the page
    pub rect: PdfRect,
}

/// Sample layout of a [`Pixmap`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    /// 1 byte per pixel
    Gray,
    /// 2 bytes per pixel
    GrayAlpha,
    /// 3 bytes per pixel
    Rgb,
    /// 4 bytes per pixel
    Rgba,
    /// 4 bytes per pixel, subtractive
    Cmyk,
}

impl ColorSpace {
    /// Bytes per pixel
    pub fn channels(&self) -> usize {
        match self {
            ColorSpace::Gray => 1,
            ColorSpace::GrayAlpha => 2,
            ColorSpace::Rgb => 3,
            ColorSpace::Rgba | ColorSpace::Cmyk => 4,
        }
    }
}

/// Decoded pixels, row-major, no padding
#[derive(Debug, Clone, PartialEq)]
pub struct Pixmap {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Sample layout
    pub colorspace: ColorSpace,
    /// `width * height * channels` bytes
    pub samples: Vec<u8>,
}

/// An image object placed on a page
///
/// Either source of pixels may be missing; the extractor tries `encoded`
/// first and falls back to `pixmap`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddedImage {
    /// Placement on the page, if the engine knows it
    pub rect: Option<PdfRect>,
    /// The image stream as stored in the file (PNG, JPEG, ...)
    pub encoded: Option<Vec<u8>>,
    /// The engine's decoded pixels
    pub pixmap: Option<Pixmap>,
}

/// An open document
pub trait PdfDocumentHandle {
    /// Number of pages
    fn page_count(&self) -> usize;

    /// `(width, height)` of a page in points; `index` is 0-based
    fn page_size(&self, index: usize) -> Result<(f64, f64), ExtractorError>;

    /// Text runs of a page, in reading order
    fn text_spans(&self, index: usize) -> Result<Vec<TextSpan>, ExtractorError>;

    /// Render a page to exactly `width` x `height` pixels
    fn render_page(&self, index: usize, width: u32, height: u32) -> Result<Pixmap, ExtractorError>;

    /// Image objects of a page, in content order
    fn images(&self, index: usize) -> Result<Vec<EmbeddedImage>, ExtractorError>;
}

/// A PDF engine
pub trait PdfBackend {
    /// Open the document at `path`
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn PdfDocumentHandle + 'a>, ExtractorError>;
}
