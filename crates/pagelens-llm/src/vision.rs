//! Vision Enrichment
//!
//! Turns a saved image into `extracted_text` + `description` through a
//! multimodal chat model. Enrichment is best-effort: every failure is logged
//! and reported through [`VisionStatus`], and the caller always receives an
//! [`Enrichment`] (possibly empty).

use crate::message::{ChatMessage, ContentPart};
use crate::{ChatModel, LlmError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use pagelens_domain::Enrichment;
use serde_json::Value;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Longest edge, in pixels, of images sent to the model
pub const MAX_IMAGE_EDGE: u32 = 1600;

const SYSTEM_PROMPT: &str = "You convert document images into text + a short description.";

const USER_PROMPT: &str = "Return STRICT JSON with keys exactly 'extracted_text' and 'description'. \
'extracted_text': all readable text (tables, labels, printed text) as UTF-8. \
'description': 1-3 sentences summarizing visible content. \
Do not add extra keys or commentary.";

/// How an enrichment was obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisionStatus {
    /// The model returned a JSON object
    Parsed,
    /// The model returned something other than JSON; kept as the description
    RawFallback,
    /// The image file could not be decoded
    ImageUnreadable(String),
    /// The request failed or the reply had an unexpected shape
    RequestFailed(String),
}

impl VisionStatus {
    /// True for the two failure states
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            VisionStatus::ImageUnreadable(_) | VisionStatus::RequestFailed(_)
        )
    }
}

/// Result of enriching one image
#[derive(Debug, Clone, PartialEq)]
pub struct VisionOutcome {
    /// Recovered fields; empty on failure
    pub enrichment: Enrichment,
    /// How they were obtained
    pub status: VisionStatus,
}

impl VisionOutcome {
    fn failed(status: VisionStatus) -> Self {
        Self {
            enrichment: Enrichment::default(),
            status,
        }
    }
}

/// Sends images to a vision-capable [`ChatModel`]
#[derive(Clone)]
pub struct VisionEnricher {
    model: Arc<dyn ChatModel>,
    max_edge: u32,
}

impl VisionEnricher {
    /// Create an enricher backed by `model`
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self {
            model,
            max_edge: MAX_IMAGE_EDGE,
        }
    }

    /// Override the downscale limit
    pub fn with_max_edge(mut self, max_edge: u32) -> Self {
        self.max_edge = max_edge.max(1);
        self
    }

    /// Name of the model in use
    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    /// Enrich the image at `path`. Never fails; see [`VisionOutcome::status`].
    pub async fn enrich(&self, path: &Path) -> VisionOutcome {
        let data_url = match prepare_image(path, self.max_edge) {
            Ok(url) => url,
            Err(e) => {
                error!(path = %path.display(), error = %e, "Cannot open/prepare image");
                return VisionOutcome::failed(VisionStatus::ImageUnreadable(e.to_string()));
            }
        };

        let messages = [
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user_parts(vec![
                ContentPart::text(USER_PROMPT),
                ContentPart::image_url(data_url),
            ]),
        ];

        let reply = match self.model.complete(&messages).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(path = %path.display(), error = %e, "Vision call failed");
                return VisionOutcome::failed(VisionStatus::RequestFailed(e.to_string()));
            }
        };

        let (enrichment, status) = parse_vision_response(&reply);
        match &status {
            VisionStatus::RequestFailed(reason) => {
                error!(path = %path.display(), reason = %reason, "Vision reply rejected");
            }
            VisionStatus::RawFallback => {
                warn!(path = %path.display(), "Vision reply was not JSON, using raw text");
            }
            _ => debug!(path = %path.display(), "Vision reply parsed"),
        }

        VisionOutcome { enrichment, status }
    }
}

/// Size after shrinking `(width, height)` so the longer edge is at most
/// `max_edge`. Never upscales; truncates; never returns a zero edge.
pub fn target_size(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_edge || longest == 0 {
        return (width, height);
    }

    let scale = f64::from(max_edge) / f64::from(longest);
    let w = ((f64::from(width) * scale) as u32).max(1);
    let h = ((f64::from(height) * scale) as u32).max(1);
    (w, h)
}

/// Decode, convert to RGB, downscale and return a `data:image/png;base64,` URL
pub fn prepare_image(path: &Path, max_edge: u32) -> Result<String, LlmError> {
    let decoded = ImageReader::open(path)
        .map_err(|e| LlmError::InvalidInput(format!("{}: {}", path.display(), e)))?
        .with_guessed_format()
        .map_err(|e| LlmError::InvalidInput(format!("{}: {}", path.display(), e)))?
        .decode()
        .map_err(|e| LlmError::InvalidInput(format!("{}: {}", path.display(), e)))?;

    let mut rgb = DynamicImage::ImageRgb8(decoded.to_rgb8());
    let (w, h) = target_size(rgb.width(), rgb.height(), max_edge);
    if (w, h) != (rgb.width(), rgb.height()) {
        rgb = rgb.resize_exact(w, h, FilterType::Triangle);
    }

    let mut png = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| LlmError::InvalidInput(format!("PNG encoding failed: {}", e)))?;

    Ok(format!("data:image/png;base64,{}", STANDARD.encode(&png)))
}

/// Strip code fences and a leading `json` tag from a model reply
fn clean_reply(raw: &str) -> &str {
    let content = raw.trim().trim_matches('`');
    match content.get(..4) {
        Some(prefix) if prefix.eq_ignore_ascii_case("json") => {
            content[4..].trim_start_matches([':', ' ', '\n'])
        }
        _ => content,
    }
}

/// Interpret a vision reply
///
/// # Examples
///
/// ```
/// use pagelens_llm::vision::parse_vision_response;
/// use pagelens_llm::VisionStatus;
///
/// let (e, status) = parse_vision_response("```json\n{\"extracted_text\": \" 42 \", \"description\": \"A number.\"}\n```");
/// assert_eq!(status, VisionStatus::Parsed);
/// assert_eq!(e.extracted_text, "42");
/// ```
pub fn parse_vision_response(raw: &str) -> (Enrichment, VisionStatus) {
    let content = clean_reply(raw);

    match serde_json::from_str::<Value>(content) {
        Ok(Value::Object(map)) => {
            let field = |key: &str| {
                map.get(key)
                    .and_then(Value::as_str)
                    .map(|s| s.trim().to_string())
                    .unwrap_or_default()
            };
            (
                Enrichment::new(field("extracted_text"), field("description")),
                VisionStatus::Parsed,
            )
        }
        Ok(_) => (
            Enrichment::default(),
            VisionStatus::RequestFailed("unexpected JSON shape".to_string()),
        ),
        Err(_) => (
            Enrichment::new("", content.trim()),
            VisionStatus::RawFallback,
        ),
    }
}
