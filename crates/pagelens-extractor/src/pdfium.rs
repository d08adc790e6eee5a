//! PDFium backend
//!
//! Binds to a PDFium shared library at runtime. The library is searched in:
//!
//! 1. The directory passed to [`PdfiumBackend::with_library_dir`] (the CLI
//!    passes `PDFIUM_LIB_DIR`)
//! 2. Current directory (`./libpdfium.so`)
//! 3. `./vendor/pdfium/lib/`
//! 4. System library paths

use crate::backend::{ColorSpace, EmbeddedImage, PdfBackend, PdfDocumentHandle, PdfRect, Pixmap, TextSpan};
use crate::error::ExtractorError;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::debug;

/// PDF engine backed by PDFium
pub struct PdfiumBackend {
    pdfium: Pdfium,
}

impl PdfiumBackend {
    /// Bind using the default search order
    pub fn new() -> Result<Self, ExtractorError> {
        Self::with_library_dir(None::<&Path>)
    }

    /// Bind, trying `dir` before the default locations
    pub fn with_library_dir(dir: Option<impl AsRef<Path>>) -> Result<Self, ExtractorError> {
        let explicit = match dir {
            Some(dir) => {
                let dir = dir.as_ref().to_string_lossy().into_owned();
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir))
                    .map_err(|e| debug!(dir = %dir, error = ?e, "PDFium not found in configured directory"))
                    .ok()
            }
            None => None,
        };

        let bindings = match explicit {
            Some(bindings) => bindings,
            None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| {
                    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                        "./vendor/pdfium/lib/",
                    ))
                })
                .or_else(|_| Pdfium::bind_to_system_library())
                .map_err(|e| {
                    ExtractorError::EngineUnavailable(format!(
                        "failed to load the PDFium library; set PDFIUM_LIB_DIR or install libpdfium: {:?}",
                        e
                    ))
                })?,
        };

        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }
}

impl PdfBackend for PdfiumBackend {
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn PdfDocumentHandle + 'a>, ExtractorError> {
        let document = self
            .pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| ExtractorError::Open {
                path: path.to_path_buf(),
                reason: format!("{:?}", e),
            })?;
        Ok(Box::new(PdfiumDocument { document }))
    }
}

struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
}

impl PdfiumDocument<'_> {
    fn page(&self, index: usize) -> Result<PdfPage<'_>, ExtractorError> {
        let page_index = PdfPageIndex::try_from(index).map_err(|_| ExtractorError::Page {
            page: index as u32 + 1,
            reason: "page index out of range".into(),
        })?;
        self.document
            .pages()
            .get(page_index)
            .map_err(|e| page_error(index, e))
    }
}

fn page_error(index: usize, e: PdfiumError) -> ExtractorError {
    ExtractorError::Page {
        page: index as u32 + 1,
        reason: format!("{:?}", e),
    }
}

fn rect_of(rect: &pdfium_render::prelude::PdfRect) -> PdfRect {
    PdfRect::new(
        f64::from(rect.left().value),
        f64::from(rect.bottom().value),
        f64::from(rect.right().value),
        f64::from(rect.top().value),
    )
}

fn pixmap_of(bitmap: &PdfBitmap) -> Pixmap {
    Pixmap {
        width: bitmap.width() as u32,
        height: bitmap.height() as u32,
        colorspace: ColorSpace::Rgba,
        samples: bitmap.as_rgba_bytes(),
    }
}

impl PdfDocumentHandle for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page_size(&self, index: usize) -> Result<(f64, f64), ExtractorError> {
        let page = self.page(index)?;
        Ok((f64::from(page.width().value), f64::from(page.height().value)))
    }

    fn text_spans(&self, index: usize) -> Result<Vec<TextSpan>, ExtractorError> {
        let page = self.page(index)?;
        let text = page.text().map_err(|e| page_error(index, e))?;
        let spans = text
            .segments()
            .iter()
            .map(|segment| TextSpan {
                text: segment.text(),
                rect: rect_of(&segment.bounds()),
            })
            .collect();
        Ok(spans)
    }

    fn render_page(&self, index: usize, width: u32, height: u32) -> Result<Pixmap, ExtractorError> {
        let page = self.page(index)?;
        let config = PdfRenderConfig::new()
            .set_target_width(width as Pixels)
            .set_target_height(height as Pixels);
        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| ExtractorError::Render(format!("{:?}", e)))?;
        Ok(pixmap_of(&bitmap))
    }

    fn images(&self, index: usize) -> Result<Vec<EmbeddedImage>, ExtractorError> {
        let page = self.page(index)?;
        let mut images = Vec::new();

        for object in page.objects().iter() {
            let Some(image) = object.as_image_object() else {
                continue;
            };

            let rect = object.bounds().ok().map(|quad| rect_of(&quad.to_rect()));
            // PDFium hands out decoded bitmaps only: the unfiltered one first,
            // then the one with masks and transforms applied.
            let pixmap = image
                .get_raw_bitmap()
                .or_else(|_| image.get_processed_bitmap(&self.document))
                .map(|bitmap| pixmap_of(&bitmap))
                .ok();

            images.push(EmbeddedImage {
                rect,
                encoded: None,
                pixmap,
            });
        }

        Ok(images)
    }
}
