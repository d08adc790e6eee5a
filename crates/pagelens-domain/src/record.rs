//! Records produced by the extractor
//!
//! A record is ephemeral: it exists between extraction and the upsert that
//! turns it into a stored entry.

use crate::bbox::RegionBounds;
use std::fmt;
use std::path::{Path, PathBuf};

/// Kind of extracted unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// A block of selectable text
    Text,
    /// An image embedded in the page
    Image,
    /// A rasterization of the whole page
    PageImage,
}

impl ContentType {
    /// Name used in stored metadata
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Text => "text",
            ContentType::Image => "image",
            ContentType::PageImage => "page_image",
        }
    }

    /// Parse a stored metadata value
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text" => Some(ContentType::Text),
            "image" => Some(ContentType::Image),
            "page_image" => Some(ContentType::PageImage),
            _ => None,
        }
    }

    /// True for kinds that point at an image file
    pub fn is_image(&self) -> bool {
        matches!(self, ContentType::Image | ContentType::PageImage)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text recovered from an image by a vision model
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enrichment {
    /// All readable text in the image
    pub extracted_text: String,
    /// Short summary of the visible content
    pub description: String,
}

impl Enrichment {
    /// Build an enrichment from its two fields
    pub fn new(extracted_text: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            extracted_text: extracted_text.into(),
            description: description.into(),
        }
    }

    /// True when neither field carries any text
    pub fn is_empty(&self) -> bool {
        self.extracted_text.trim().is_empty() && self.description.trim().is_empty()
    }
}

/// What a record carries, by kind
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Text block contents
    Text(String),
    /// Saved image file and, after enrichment, what the vision model saw
    Image {
        /// Location of the PNG on disk
        path: PathBuf,
        /// Vision output, absent until enriched
        enrichment: Option<Enrichment>,
    },
}

/// An extracted unit with its position in the source document
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Kind of unit
    pub content_type: ContentType,

    /// 1-based page number
    pub page: u32,

    /// Position on the page
    pub bbox: Option<RegionBounds>,

    /// Text or image payload
    pub payload: Payload,

    /// Originating PDF
    pub source: PathBuf,
}

impl Record {
    /// A text block record
    pub fn text(
        page: u32,
        bbox: impl Into<RegionBounds>,
        text: impl Into<String>,
        source: impl Into<PathBuf>,
    ) -> Self {
        Self {
            content_type: ContentType::Text,
            page,
            bbox: Some(bbox.into()),
            payload: Payload::Text(text.into()),
            source: source.into(),
        }
    }

    /// An image record (`Image` or `PageImage`)
    pub fn image(
        content_type: ContentType,
        page: u32,
        bbox: impl Into<RegionBounds>,
        path: impl Into<PathBuf>,
        source: impl Into<PathBuf>,
    ) -> Self {
        debug_assert!(content_type.is_image());
        Self {
            content_type,
            page,
            bbox: Some(bbox.into()),
            payload: Payload::Image {
                path: path.into(),
                enrichment: None,
            },
            source: source.into(),
        }
    }

    /// Text of a text record
    pub fn text_content(&self) -> Option<&str> {
        match &self.payload {
            Payload::Text(text) => Some(text),
            Payload::Image { .. } => None,
        }
    }

    /// Image path of an image record
    pub fn image_path(&self) -> Option<&Path> {
        match &self.payload {
            Payload::Image { path, .. } => Some(path),
            Payload::Text(_) => None,
        }
    }

    /// Vision output attached to an image record
    pub fn enrichment(&self) -> Option<&Enrichment> {
        match &self.payload {
            Payload::Image { enrichment, .. } => enrichment.as_ref(),
            Payload::Text(_) => None,
        }
    }

    /// Attach vision output. Has no effect on text records, whose payload
    /// never overlaps with enrichment fields.
    pub fn enrich(&mut self, value: Enrichment) {
        if let Payload::Image { enrichment, .. } = &mut self.payload {
            *enrichment = Some(value);
        }
    }

    /// The string that gets embedded and stored: the first non-empty value
    /// among text, extracted text and description, trimmed.
    ///
    /// # Examples
    ///
    /// ```
    /// use pagelens_domain::{BoundingBox, ContentType, Enrichment, Record};
    ///
    /// let mut record = Record::image(
    ///     ContentType::PageImage, 1, BoundingBox::page(612.0, 792.0), "p1.png", "a.pdf",
    /// );
    /// assert_eq!(record.content(), None);
    ///
    /// record.enrich(Enrichment::new("", "A bar chart."));
    /// assert_eq!(record.content(), Some("A bar chart."));
    /// ```
    pub fn content(&self) -> Option<&str> {
        let candidates: [Option<&str>; 3] = match &self.payload {
            Payload::Text(text) => [Some(text.as_str()), None, None],
            Payload::Image { enrichment, .. } => match enrichment {
                Some(e) => [None, Some(e.extracted_text.as_str()), Some(e.description.as_str())],
                None => [None, None, None],
            },
        };

        candidates
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BoundingBox;

    fn page_image() -> Record {
        Record::image(
            ContentType::PageImage,
            2,
            BoundingBox::page(612.0, 792.0),
            "/store/images/doc-page-2.png",
            "/pdfs/doc.pdf",
        )
    }

    #[test]
    fn test_content_type_round_trip() {
        for ct in [ContentType::Text, ContentType::Image, ContentType::PageImage] {
            assert_eq!(ContentType::parse(ct.as_str()), Some(ct));
        }
        assert_eq!(ContentType::parse("table"), None);
    }

    #[test]
    fn test_text_content_is_trimmed() {
        let record = Record::text(1, BoundingBox::new(0.0, 0.0, 1.0, 1.0), "  hello \n", "a.pdf");
        assert_eq!(record.content(), Some("hello"));
    }

    #[test]
    fn test_extracted_text_preferred_over_description() {
        let mut record = page_image();
        record.enrich(Enrichment::new("TOTAL 42", "An invoice."));
        assert_eq!(record.content(), Some("TOTAL 42"));
    }

    #[test]
    fn test_blank_extracted_text_falls_through() {
        let mut record = page_image();
        record.enrich(Enrichment::new("   ", "An invoice."));
        assert_eq!(record.content(), Some("An invoice."));
    }

    #[test]
    fn test_empty_enrichment_has_no_content() {
        let mut record = page_image();
        record.enrich(Enrichment::default());
        assert_eq!(record.content(), None);
    }

    #[test]
    fn test_enrich_ignored_for_text() {
        let mut record = Record::text(1, BoundingBox::new(0.0, 0.0, 1.0, 1.0), "body", "a.pdf");
        record.enrich(Enrichment::new("other", "other"));
        assert!(record.enrichment().is_none());
        assert_eq!(record.content(), Some("body"));
    }
}
