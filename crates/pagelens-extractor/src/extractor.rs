//! Core extraction logic

use crate::backend::{ColorSpace, EmbeddedImage, PdfBackend, PdfDocumentHandle, Pixmap};
use crate::blocks::group_spans;
use crate::config::{EmbeddedImageScope, ExtractorConfig};
use crate::error::ExtractorError;
use image::{ImageFormat, RgbImage};
use pagelens_domain::{BoundingBox, ContentType, Record};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Per-document counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    /// Pages walked
    pub pages_processed: usize,
    /// Pages whose raster could not be produced
    pub raster_failures: usize,
    /// Embedded images dropped (no placement or undecodable)
    pub images_skipped: usize,
}

/// Records of one document plus what went wrong along the way
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Text, page raster and image records, in page order
    pub records: Vec<Record>,
    /// Counters
    pub stats: ExtractionStats,
}

/// Walks PDFs page by page and emits records
pub struct PdfExtractor {
    backend: Box<dyn PdfBackend>,
    config: ExtractorConfig,
}

impl PdfExtractor {
    /// Create an extractor
    pub fn new(backend: Box<dyn PdfBackend>, config: ExtractorConfig) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;
        Ok(Self { backend, config })
    }

    /// Active configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract every record of the PDF at `path`
    ///
    /// Rasterization and embedded-image failures are absorbed and counted in
    /// [`Extraction::stats`]; failing to open the document is an error.
    pub fn extract(&self, path: &Path) -> Result<Extraction, ExtractorError> {
        let image_dir = self.config.image_dir();
        fs::create_dir_all(&image_dir)?;

        let document = self.backend.open(path)?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());

        let total = document.page_count();
        let pages = self.config.max_pages.map_or(total, |max| max.min(total));
        let mut extraction = Extraction::default();

        for index in 0..pages {
            let page = index as u32 + 1;
            let (width, height) = document.page_size(index)?;

            for block in group_spans(&document.text_spans(index)?, height) {
                extraction
                    .records
                    .push(Record::text(page, block.bbox, block.text, path));
            }

            let raster_path = image_dir.join(format!("{}-page-{}.png", stem, page));
            match self.render_page(document.as_ref(), index, (width, height), &raster_path) {
                Ok(()) => extraction.records.push(Record::image(
                    ContentType::PageImage,
                    page,
                    BoundingBox::page(width, height),
                    raster_path,
                    path,
                )),
                Err(e) => {
                    warn!(pdf = %path.display(), page, error = %e, "Page rasterization failed");
                    extraction.stats.raster_failures += 1;
                }
            }

            if self.config.image_scope == EmbeddedImageScope::EveryPage {
                self.extract_images(document.as_ref(), index, height, &stem, &image_dir, path, &mut extraction)?;
            }
            extraction.stats.pages_processed += 1;
        }

        if self.config.image_scope == EmbeddedImageScope::LastPageOnly && pages > 0 {
            let index = pages - 1;
            let (_, height) = document.page_size(index)?;
            self.extract_images(document.as_ref(), index, height, &stem, &image_dir, path, &mut extraction)?;
        }

        info!(
            pdf = %path.display(),
            pages = extraction.stats.pages_processed,
            records = extraction.records.len(),
            "Extracted document"
        );
        Ok(extraction)
    }

    fn render_page(
        &self,
        document: &dyn PdfDocumentHandle,
        index: usize,
        (width, height): (f64, f64),
        out: &Path,
    ) -> Result<(), ExtractorError> {
        let (px_w, px_h) = raster_size(width, height, self.config.dpi);
        let pixmap = document.render_page(index, px_w, px_h)?;
        pixmap_to_rgb(&pixmap)?.save_with_format(out, ImageFormat::Png)?;
        debug!(path = %out.display(), width = px_w, height = px_h, "Saved page raster");
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn extract_images(
        &self,
        document: &dyn PdfDocumentHandle,
        index: usize,
        page_height: f64,
        stem: &str,
        image_dir: &Path,
        source: &Path,
        extraction: &mut Extraction,
    ) -> Result<(), ExtractorError> {
        let page = index as u32 + 1;

        for (position, image) in document.images(index)?.into_iter().enumerate() {
            let Some(rect) = image.rect else {
                debug!(page, position, "Image without placement skipped");
                extraction.stats.images_skipped += 1;
                continue;
            };

            let Some(rgb) = recover_pixels(&image) else {
                debug!(page, position, "Image not decodable, skipped");
                extraction.stats.images_skipped += 1;
                continue;
            };

            let out: PathBuf = image_dir.join(format!("{}-p{}-{}.png", stem, page, position));
            if let Err(e) = rgb.save_with_format(&out, ImageFormat::Png) {
                debug!(path = %out.display(), error = %e, "Image could not be saved, skipped");
                extraction.stats.images_skipped += 1;
                continue;
            }

            let bbox = BoundingBox::from_pdf_rect(rect.left, rect.bottom, rect.right, rect.top, page_height);
            extraction
                .records
                .push(Record::image(ContentType::Image, page, bbox, out, source));
        }
        Ok(())
    }
}

/// Pixel size of a page raster: `round(points * dpi / 72)`, at least 1
pub fn raster_size(width_pt: f64, height_pt: f64, dpi: u32) -> (u32, u32) {
    let scale = f64::from(dpi) / 72.0;
    let px = |pt: f64| ((pt * scale).round() as u32).max(1);
    (px(width_pt), px(height_pt))
}

/// Original bytes first, engine pixels second
fn recover_pixels(image: &EmbeddedImage) -> Option<RgbImage> {
    if let Some(bytes) = &image.encoded {
        match image::load_from_memory(bytes) {
            Ok(decoded) => return Some(decoded.to_rgb8()),
            Err(e) => debug!(error = %e, "Original image bytes not decodable"),
        }
    }

    image.pixmap.as_ref().and_then(|pixmap| match pixmap_to_rgb(pixmap) {
        Ok(rgb) => Some(rgb),
        Err(e) => {
            debug!(error = %e, "Pixmap not convertible");
            None
        }
    })
}

/// Convert engine pixels to 8-bit RGB: alpha dropped, gray expanded, CMYK converted
pub fn pixmap_to_rgb(pixmap: &Pixmap) -> Result<RgbImage, ExtractorError> {
    let channels = pixmap.colorspace.channels();
    let expected = pixmap.width as usize * pixmap.height as usize * channels;
    if pixmap.samples.len() != expected {
        return Err(ExtractorError::Image(format!(
            "pixmap has {} bytes, expected {} for {}x{} {:?}",
            pixmap.samples.len(),
            expected,
            pixmap.width,
            pixmap.height,
            pixmap.colorspace
        )));
    }

    let mut rgb = Vec::with_capacity(pixmap.width as usize * pixmap.height as usize * 3);
    for px in pixmap.samples.chunks_exact(channels) {
        match pixmap.colorspace {
            ColorSpace::Gray | ColorSpace::GrayAlpha => rgb.extend_from_slice(&[px[0], px[0], px[0]]),
            ColorSpace::Rgb | ColorSpace::Rgba => rgb.extend_from_slice(&px[..3]),
            ColorSpace::Cmyk => {
                let k = 255 - u32::from(px[3]);
                let channel = |c: u8| ((255 - u32::from(c)) * k / 255) as u8;
                rgb.extend_from_slice(&[channel(px[0]), channel(px[1]), channel(px[2])]);
            }
        }
    }

    RgbImage::from_raw(pixmap.width, pixmap.height, rgb)
        .ok_or_else(|| ExtractorError::Image("pixel buffer size mismatch".into()))
}
