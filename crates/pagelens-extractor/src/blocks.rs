//! Grouping of text runs into blocks
//!
//! Engines report short runs of text. A block is a run of lines that sit
//! directly under each other and overlap horizontally, which is close to
//! what a reader perceives as a paragraph.

use crate::backend::TextSpan;
use pagelens_domain::BoundingBox;

/// Gap between lines, as a fraction of line height, still inside one block
const MAX_LINE_GAP: f64 = 0.8;

/// Horizontal gap, as a multiple of line height, between runs on one line
const MAX_WORD_GAP: f64 = 3.0;

/// A paragraph-like group of runs
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    /// Lines joined with `\n`, runs on one line joined with a space
    pub text: String,
    /// Union of the runs' boxes, top-left origin
    pub bbox: BoundingBox,
}

/// Group `spans` of a page of height `page_height` into blocks
///
/// Runs with only whitespace are ignored. Coordinates are flipped to a
/// top-left origin.
pub fn group_spans(spans: &[TextSpan], page_height: f64) -> Vec<TextBlock> {
    let mut blocks: Vec<TextBlock> = Vec::new();
    let mut current: Option<(TextBlock, BoundingBox)> = None;

    for span in spans {
        let text = span.text.trim();
        if text.is_empty() {
            continue;
        }
        let r = span.rect;
        let bbox = BoundingBox::from_pdf_rect(r.left, r.bottom, r.right, r.top, page_height);

        current = Some(match current.take() {
            Some((mut block, last_line)) => {
                if same_line(&last_line, &bbox) {
                    block.text.push(' ');
                    block.text.push_str(text);
                    block.bbox = block.bbox.union(&bbox);
                    (block, last_line.union(&bbox))
                } else if next_line(&block.bbox, &last_line, &bbox) {
                    block.text.push('\n');
                    block.text.push_str(text);
                    block.bbox = block.bbox.union(&bbox);
                    (block, bbox)
                } else {
                    blocks.push(block);
                    (TextBlock { text: text.to_string(), bbox }, bbox)
                }
            }
            None => (TextBlock { text: text.to_string(), bbox }, bbox),
        });
    }

    if let Some((block, _)) = current {
        blocks.push(block);
    }
    blocks
}

fn vertical_overlap(a: &BoundingBox, b: &BoundingBox) -> f64 {
    (a.y1.min(b.y1) - a.y0.max(b.y0)).max(0.0)
}

fn same_line(line: &BoundingBox, span: &BoundingBox) -> bool {
    let min_height = line.height().min(span.height());
    if min_height <= 0.0 {
        return false;
    }
    let gap = span.x0 - line.x1;
    vertical_overlap(line, span) >= 0.5 * min_height && gap <= MAX_WORD_GAP * min_height
}

fn next_line(block: &BoundingBox, last_line: &BoundingBox, span: &BoundingBox) -> bool {
    let height = span.height().max(last_line.height());
    let gap = span.y0 - last_line.y1;
    let overlaps_horizontally = span.x0 < block.x1 && span.x1 > block.x0;
    (-0.5 * height..=MAX_LINE_GAP * height).contains(&gap) && overlaps_horizontally
}
