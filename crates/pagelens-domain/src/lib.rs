//! pagelens Domain Layer
//!
//! Plain data shared by every other crate: the records produced while
//! reading a PDF, their bounding boxes, and the flat entry shape they take
//! once they are persisted in a collection.
//!
//! ## Key Concepts
//!
//! - **Record**: one extracted unit (text block, embedded image or page raster)
//! - **Bounding box**: `[x0, y0, x1, y1]` in page points, top-left origin
//! - **Stored entry**: id + content string + flat metadata map
//!
//! The crate has no external dependencies.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bbox;
pub mod entry;
pub mod record;

pub use bbox::{BoundingBox, RegionBounds};
pub use entry::{Metadata, MetadataValue, NormalizedEntry, QueryHit};
pub use record::{ContentType, Enrichment, Payload, Record};
