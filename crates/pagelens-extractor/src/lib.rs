//! pagelens Extractor
//!
//! Turns a PDF into records: text blocks, a raster of every page, and the
//! images embedded in the pages, each with its page number and bounding box.
//!
//! # Architecture
//!
//! ```text
//! PDF → PdfBackend (PDFium) → PdfExtractor → Records + images/*.png
//! ```
//!
//! The engine sits behind [`PdfBackend`]. [`PdfiumBackend`] is the production
//! engine; [`MemoryBackend`] serves documents described in code.
//!
//! # Example Usage
//!
//! ```no_run
//! use pagelens_extractor::{ExtractorConfig, PdfExtractor, PdfiumBackend};
//! use std::path::Path;
//!
//! # fn example() -> Result<(), pagelens_extractor::ExtractorError> {
//! let backend = PdfiumBackend::new()?;
//! let extractor = PdfExtractor::new(Box::new(backend), ExtractorConfig::new("./vector_store"))?;
//! let extraction = extractor.extract(Path::new("docs/invoice.pdf"))?;
//! println!("{} records", extraction.records.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod backend;
mod blocks;
mod config;
mod error;
mod extractor;
mod memory;
mod pdfium;


pub use backend::{ColorSpace, EmbeddedImage, PdfBackend, PdfDocumentHandle, PdfRect, Pixmap, TextSpan};
pub use blocks::{group_spans, TextBlock};
pub use config::{EmbeddedImageScope, ExtractorConfig, DEFAULT_DPI};
pub use error::ExtractorError;
pub use extractor::{pixmap_to_rgb, raster_size, Extraction, ExtractionStats, PdfExtractor};
pub use memory::{MemoryBackend, MemoryDocument, MemoryPage};
pub use pdfium::PdfiumBackend;
