//! Stored entry shape
//!
//! Records are flattened into `content` + a flat metadata map before they are
//! embedded and persisted. The map only holds scalars so that any vector
//! store can keep it verbatim.

use crate::bbox::{BoundingBox, RegionBounds};
use crate::record::{ContentType, Record};
use std::collections::BTreeMap;
use std::fmt;

/// Metadata key: record kind
pub const KEY_CONTENT_TYPE: &str = "content_type";
/// Metadata key: 1-based page
pub const KEY_PAGE: &str = "page";
/// Metadata key: originating file
pub const KEY_SOURCE: &str = "source";
/// Metadata key: image file, empty for text
pub const KEY_IMAGE_PATH: &str = "image_path";
/// Metadata keys: flattened rectangle
pub const KEY_BBOX: [&str; 4] = ["bbox_x0", "bbox_y0", "bbox_x1", "bbox_y1"];
/// Metadata key: fallback for bounds that are not a rectangle
pub const KEY_BBOX_STR: &str = "bbox_str";

/// A scalar metadata value
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    /// String value
    Str(String),
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),
}

impl MetadataValue {
    /// String view, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view, if this is an integer
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MetadataValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view; integers widen to floats
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetadataValue::Float(v) => Some(*v),
            MetadataValue::Int(v) => Some(*v as f64),
            MetadataValue::Str(_) => None,
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Str(s) => f.write_str(s),
            MetadataValue::Int(v) => write!(f, "{}", v),
            MetadataValue::Float(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        MetadataValue::Str(s.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        MetadataValue::Str(s)
    }
}

impl From<i64> for MetadataValue {
    fn from(v: i64) -> Self {
        MetadataValue::Int(v)
    }
}

impl From<f64> for MetadataValue {
    fn from(v: f64) -> Self {
        MetadataValue::Float(v)
    }
}

/// Flat metadata map, ordered by key
pub type Metadata = BTreeMap<String, MetadataValue>;

/// A record reduced to what gets persisted, before an id is assigned
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedEntry {
    /// Text that is embedded and returned by queries
    pub content: String,
    /// Flat metadata
    pub metadata: Metadata,
}

impl NormalizedEntry {
    /// Normalize a record. Returns `None` when the record has no content.
    pub fn from_record(record: &Record) -> Option<Self> {
        let content = record.content()?.to_string();

        let mut metadata = Metadata::new();
        metadata.insert(KEY_CONTENT_TYPE.into(), record.content_type.as_str().into());
        metadata.insert(KEY_PAGE.into(), MetadataValue::Int(i64::from(record.page)));
        metadata.insert(
            KEY_SOURCE.into(),
            record.source.to_string_lossy().into_owned().into(),
        );
        let image_path = record
            .image_path()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        metadata.insert(KEY_IMAGE_PATH.into(), image_path.into());

        match &record.bbox {
            Some(RegionBounds::Rect(rect)) => {
                for (key, value) in KEY_BBOX.iter().zip(rect.to_array()) {
                    metadata.insert((*key).into(), MetadataValue::Float(value));
                }
            }
            Some(irregular @ RegionBounds::Irregular(_)) => {
                metadata.insert(KEY_BBOX_STR.into(), irregular.to_string().into());
            }
            None => {}
        }

        Some(Self { content, metadata })
    }
}

/// Rebuild the bounds stored in a metadata map
pub fn bounds_from_metadata(metadata: &Metadata) -> Option<RegionBounds> {
    let edges: Option<Vec<f64>> = KEY_BBOX
        .iter()
        .map(|key| metadata.get(*key).and_then(MetadataValue::as_f64))
        .collect();

    if let Some([x0, y0, x1, y1]) = edges.as_deref() {
        return Some(RegionBounds::Rect(BoundingBox::new(*x0, *y0, *x1, *y1)));
    }

    let raw = metadata.get(KEY_BBOX_STR)?.as_str()?;
    let values = raw
        .trim_matches(|c| c == '[' || c == ']')
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .ok()?;
    Some(RegionBounds::Irregular(values))
}

/// One query result: stored content plus its metadata
#[derive(Debug, Clone, PartialEq)]
pub struct QueryHit {
    /// Entry id
    pub id: String,
    /// Stored content
    pub content: String,
    /// Flat metadata
    pub metadata: Metadata,
    /// Cosine distance to the query (lower is closer)
    pub distance: f32,
}

impl QueryHit {
    /// Record kind, if recognised
    pub fn content_type(&self) -> Option<ContentType> {
        self.str_field(KEY_CONTENT_TYPE).and_then(ContentType::parse)
    }

    /// 1-based page
    pub fn page(&self) -> Option<i64> {
        self.metadata.get(KEY_PAGE).and_then(MetadataValue::as_i64)
    }

    /// Originating file
    pub fn source(&self) -> &str {
        self.str_field(KEY_SOURCE).unwrap_or_default()
    }

    /// Image file, empty for text entries
    pub fn image_path(&self) -> &str {
        self.str_field(KEY_IMAGE_PATH).unwrap_or_default()
    }

    /// Position on the page
    pub fn bbox(&self) -> Option<RegionBounds> {
        bounds_from_metadata(&self.metadata)
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(MetadataValue::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Enrichment;

    #[test]
    fn test_text_record_metadata() {
        let record = Record::text(3, BoundingBox::new(1.0, 2.0, 3.0, 4.0), "Invoice #42", "/in/a.pdf");
        let entry = NormalizedEntry::from_record(&record).unwrap();

        assert_eq!(entry.content, "Invoice #42");
        assert_eq!(entry.metadata[KEY_CONTENT_TYPE], MetadataValue::from("text"));
        assert_eq!(entry.metadata[KEY_PAGE], MetadataValue::Int(3));
        assert_eq!(entry.metadata[KEY_SOURCE], MetadataValue::from("/in/a.pdf"));
        assert_eq!(entry.metadata[KEY_IMAGE_PATH], MetadataValue::from(""));
        assert_eq!(entry.metadata["bbox_x1"], MetadataValue::Float(3.0));
        assert!(!entry.metadata.contains_key(KEY_BBOX_STR));
    }

    #[test]
    fn test_unenriched_image_is_dropped() {
        let record = Record::image(
            ContentType::Image,
            1,
            BoundingBox::new(0.0, 0.0, 5.0, 5.0),
            "img.png",
            "a.pdf",
        );
        assert!(NormalizedEntry::from_record(&record).is_none());
    }

    #[test]
    fn test_image_metadata_keeps_path() {
        let mut record = Record::image(
            ContentType::Image,
            1,
            BoundingBox::new(0.0, 0.0, 5.0, 5.0),
            "/store/images/a-p1-0.png",
            "a.pdf",
        );
        record.enrich(Enrichment::new("", "A logo."));
        let entry = NormalizedEntry::from_record(&record).unwrap();
        assert_eq!(entry.metadata[KEY_IMAGE_PATH], MetadataValue::from("/store/images/a-p1-0.png"));
        assert_eq!(entry.content, "A logo.");
    }

    #[test]
    fn test_irregular_bounds_use_string_fallback() {
        let mut record = Record::text(1, BoundingBox::new(0.0, 0.0, 1.0, 1.0), "x", "a.pdf");
        record.bbox = Some(RegionBounds::Irregular(vec![1.0, 2.0, 3.0]));
        let entry = NormalizedEntry::from_record(&record).unwrap();

        assert_eq!(entry.metadata[KEY_BBOX_STR], MetadataValue::from("[1, 2, 3]"));
        assert!(!entry.metadata.contains_key("bbox_x0"));
        assert_eq!(
            bounds_from_metadata(&entry.metadata),
            Some(RegionBounds::Irregular(vec![1.0, 2.0, 3.0]))
        );
    }

    #[test]
    fn test_missing_bounds_add_no_keys() {
        let mut record = Record::text(1, BoundingBox::new(0.0, 0.0, 1.0, 1.0), "x", "a.pdf");
        record.bbox = None;
        let entry = NormalizedEntry::from_record(&record).unwrap();
        assert!(bounds_from_metadata(&entry.metadata).is_none());
    }

    #[test]
    fn test_hit_accessors() {
        let record = Record::text(7, BoundingBox::new(1.0, 2.0, 3.0, 4.0), "body", "/in/a.pdf");
        let entry = NormalizedEntry::from_record(&record).unwrap();
        let hit = QueryHit {
            id: "0".into(),
            content: entry.content,
            metadata: entry.metadata,
            distance: 0.1,
        };

        assert_eq!(hit.content_type(), Some(ContentType::Text));
        assert_eq!(hit.page(), Some(7));
        assert_eq!(hit.source(), "/in/a.pdf");
        assert_eq!(hit.image_path(), "");
        assert_eq!(
            hit.bbox(),
            Some(RegionBounds::Rect(BoundingBox::new(1.0, 2.0, 3.0, 4.0)))
        );
    }
}
