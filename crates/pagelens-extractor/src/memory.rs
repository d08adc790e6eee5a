//! In-memory PDF engine
//!
//! Documents are described in code and looked up by file name, so tests can
//! drive the extractor (and the ingest pipeline) without PDFium.
//!
//! # Examples
//!
//! ```
//! use pagelens_extractor::{MemoryBackend, MemoryDocument, MemoryPage, PdfRect};
//!
//! let backend = MemoryBackend::new().with_document(
//!     "invoice.pdf",
//!     MemoryDocument::new().with_page(
//!         MemoryPage::new(612.0, 792.0).with_text("Invoice #42", PdfRect::new(72.0, 700.0, 160.0, 712.0)),
//!     ),
//! );
//! ```

use crate::backend::{
    ColorSpace, EmbeddedImage, PdfBackend, PdfDocumentHandle, PdfRect, Pixmap, TextSpan,
};
use crate::error::ExtractorError;
use std::collections::HashMap;
use std::path::Path;

/// One page of a [`MemoryDocument`]
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryPage {
    width: f64,
    height: f64,
    spans: Vec<TextSpan>,
    images: Vec<EmbeddedImage>,
    fail_render: bool,
}

impl MemoryPage {
    /// Blank page of the given size in points
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            spans: Vec::new(),
            images: Vec::new(),
            fail_render: false,
        }
    }

    /// Add a text run
    pub fn with_text(mut self, text: impl Into<String>, rect: PdfRect) -> Self {
        self.spans.push(TextSpan {
            text: text.into(),
            rect,
        });
        self
    }

    /// Add an image object
    pub fn with_image(mut self, image: EmbeddedImage) -> Self {
        self.images.push(image);
        self
    }

    /// Make rendering this page fail
    pub fn failing_render(mut self) -> Self {
        self.fail_render = true;
        self
    }
}

/// A document made of [`MemoryPage`]s
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryDocument {
    pages: Vec<MemoryPage>,
}

impl MemoryDocument {
    /// Empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a page
    pub fn with_page(mut self, page: MemoryPage) -> Self {
        self.pages.push(page);
        self
    }
}

/// Engine serving [`MemoryDocument`]s by file name
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    documents: HashMap<String, MemoryDocument>,
}

impl MemoryBackend {
    /// Backend with no documents
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `document` under `file_name`
    pub fn with_document(mut self, file_name: impl Into<String>, document: MemoryDocument) -> Self {
        self.documents.insert(file_name.into(), document);
        self
    }
}

impl PdfBackend for MemoryBackend {
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn PdfDocumentHandle + 'a>, ExtractorError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let document = self.documents.get(&name).ok_or_else(|| ExtractorError::Open {
            path: path.to_path_buf(),
            reason: "not a known document".into(),
        })?;
        Ok(Box::new(document))
    }
}

impl MemoryDocument {
    fn page(&self, index: usize) -> Result<&MemoryPage, ExtractorError> {
        self.pages.get(index).ok_or_else(|| ExtractorError::Page {
            page: index as u32 + 1,
            reason: "no such page".into(),
        })
    }
}

impl PdfDocumentHandle for &MemoryDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_size(&self, index: usize) -> Result<(f64, f64), ExtractorError> {
        let page = self.page(index)?;
        Ok((page.width, page.height))
    }

    fn text_spans(&self, index: usize) -> Result<Vec<TextSpan>, ExtractorError> {
        Ok(self.page(index)?.spans.clone())
    }

    fn render_page(&self, index: usize, width: u32, height: u32) -> Result<Pixmap, ExtractorError> {
        let page = self.page(index)?;
        if page.fail_render {
            return Err(ExtractorError::Render(format!("page {} refused to render", index + 1)));
        }
        Ok(Pixmap {
            width,
            height,
            colorspace: ColorSpace::Rgb,
            samples: vec![255; width as usize * height as usize * 3],
        })
    }

    fn images(&self, index: usize) -> Result<Vec<EmbeddedImage>, ExtractorError> {
        Ok(self.page(index)?.images.clone())
    }
}
