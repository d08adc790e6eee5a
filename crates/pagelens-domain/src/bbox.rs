//! Bounding boxes in page coordinates

use std::fmt;

/// Axis-aligned rectangle in PDF points with a top-left origin.
///
/// For a well-formed page region `x0 < x1` and `y0 < y1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Left edge
    pub x0: f64,
    /// Top edge
    pub y0: f64,
    /// Right edge
    pub x1: f64,
    /// Bottom edge
    pub y1: f64,
}

impl BoundingBox {
    /// Create a bounding box from its four edges
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Full-page rectangle `[0, 0, width, height]`
    pub fn page(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Convert a rectangle expressed with PDF's bottom-left origin into
    /// top-left page coordinates.
    ///
    /// # Examples
    ///
    /// ```
    /// use pagelens_domain::BoundingBox;
    ///
    /// // A line of text 20pt from the top of a 792pt tall page
    /// let bbox = BoundingBox::from_pdf_rect(72.0, 760.0, 300.0, 772.0, 792.0);
    /// assert_eq!(bbox.y0, 20.0);
    /// assert_eq!(bbox.y1, 32.0);
    /// ```
    pub fn from_pdf_rect(left: f64, bottom: f64, right: f64, top: f64, page_height: f64) -> Self {
        Self::new(left, page_height - top, right, page_height - bottom)
    }

    /// Width of the box
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    /// Height of the box
    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    /// True when the box has positive area
    pub fn is_well_formed(&self) -> bool {
        self.x0 < self.x1 && self.y0 < self.y1
    }

    /// Smallest box containing both `self` and `other`
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::new(
            self.x0.min(other.x0),
            self.y0.min(other.y0),
            self.x1.max(other.x1),
            self.y1.max(other.y1),
        )
    }

    /// Edges as an array in `[x0, y0, x1, y1]` order
    pub fn to_array(&self) -> [f64; 4] {
        [self.x0, self.y0, self.x1, self.y1]
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.1}, {:.1}, {:.1}, {:.1}]",
            self.x0, self.y0, self.x1, self.y1
        )
    }
}

/// The positional information attached to a record.
///
/// Backends normally report a proper rectangle. Anything else (wrong arity,
/// non-finite numbers) is kept verbatim so it can still be persisted as a
/// string.
#[derive(Debug, Clone, PartialEq)]
pub enum RegionBounds {
    /// A four-edge rectangle
    Rect(BoundingBox),
    /// Values that do not form a rectangle
    Irregular(Vec<f64>),
}

impl RegionBounds {
    /// Classify raw numbers reported by a backend.
    ///
    /// # Examples
    ///
    /// ```
    /// use pagelens_domain::RegionBounds;
    ///
    /// assert!(matches!(RegionBounds::from_values(&[0.0, 0.0, 1.0, 1.0]), RegionBounds::Rect(_)));
    /// assert!(matches!(RegionBounds::from_values(&[0.0, 1.0]), RegionBounds::Irregular(_)));
    /// ```
    pub fn from_values(values: &[f64]) -> Self {
        match values {
            [x0, y0, x1, y1] if values.iter().all(|v| v.is_finite()) => {
                RegionBounds::Rect(BoundingBox::new(*x0, *y0, *x1, *y1))
            }
            _ => RegionBounds::Irregular(values.to_vec()),
        }
    }

    /// The rectangle, if this is one
    pub fn as_rect(&self) -> Option<&BoundingBox> {
        match self {
            RegionBounds::Rect(rect) => Some(rect),
            RegionBounds::Irregular(_) => None,
        }
    }
}

impl From<BoundingBox> for RegionBounds {
    fn from(rect: BoundingBox) -> Self {
        RegionBounds::Rect(rect)
    }
}

impl fmt::Display for RegionBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionBounds::Rect(rect) => write!(f, "{}", rect),
            RegionBounds::Irregular(values) => {
                let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}
