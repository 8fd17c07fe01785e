//! Serialized shapes exchanged with the content generator and the host.
//!
//! Generated plans arrive without identifiers; [`CarouselDocument::into_plan`]
//! assigns them and applies the initial background visibility rule.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::element::{ElementId, ElementKind, ElementStyles, ImageRef, SlideElement};
use crate::library::SlideStyle;
use crate::slide::{CarouselPlan, Slide, SlideId};
use crate::{EditorError, EditorResult};

/// Visual description the generator uses for slides without a background.
pub const NO_VISUAL: &str = "no visual needed";

/// A web source backing a story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebSource {
    /// Page URL.
    pub uri: String,
    /// Page title.
    pub title: String,
}

/// One grounding citation returned with a story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingChunk {
    /// The cited page.
    pub web: WebSource,
}

/// A licensed photo that can be dropped onto a slide as its background.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealWorldImage {
    /// Image URL or data URL.
    pub url: String,
    /// Credit line, e.g. the agency name.
    pub source: String,
}

impl RealWorldImage {
    /// Parse a drag-and-drop payload. Missing or malformed payloads yield `None`.
    #[must_use]
    pub fn from_payload(payload: &str) -> Option<Self> {
        if payload.trim().is_empty() {
            return None;
        }
        serde_json::from_str::<Self>(payload)
            .ok()
            .filter(|image| !image.url.trim().is_empty())
    }
}

/// The news story a carousel is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    /// Headline.
    pub title: String,
    /// Publisher.
    #[serde(default)]
    pub source: String,
    /// Short summary.
    #[serde(default)]
    pub summary: String,
    /// Search citations.
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
    /// Photos available for dropping onto slides.
    #[serde(default)]
    pub real_world_images: Vec<RealWorldImage>,
}

/// Result of the carousel generation pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedCarousel {
    /// The story the plan narrates.
    pub story: Story,
    /// Ten slides with ids assigned.
    pub plan: CarouselPlan,
    /// Narration script.
    pub spoken_summary: String,
}

/// A generated element; the id is optional and replaced when not a UUID.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementDocument {
    /// Element identifier, if the generator supplied one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Variant and content.
    #[serde(flatten)]
    pub kind: ElementKind,
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
    /// Lock flag.
    #[serde(default)]
    pub is_locked: bool,
    /// Styles.
    #[serde(default)]
    pub styles: ElementStyles,
}

impl ElementDocument {
    /// Convert document to runtime element.
    #[must_use]
    pub fn into_element(self) -> SlideElement {
        let id = self
            .id
            .as_deref()
            .and_then(|id| ElementId::parse(id).ok())
            .unwrap_or_default();
        let element = SlideElement {
            id,
            kind: self.kind,
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            is_locked: self.is_locked,
            styles: self.styles,
        };
        if !element.frame().is_within_canvas() {
            warn!(element = %element.id, frame = ?element.frame(), "element extends past the canvas");
        }
        element
    }
}

/// A generated slide.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideDocument {
    /// Slide identifier, if the generator supplied one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// 1-based position.
    pub slide_number: u32,
    /// Narrative style name.
    pub style_name: String,
    /// Elements, back to front.
    #[serde(default)]
    pub elements: Vec<ElementDocument>,
    /// Background description.
    #[serde(default)]
    pub visual_description: String,
    /// Background image, if already resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<ImageRef>,
}

impl SlideDocument {
    /// Whether a background should be generated for this slide.
    #[must_use]
    pub fn needs_visual(&self) -> bool {
        let description = self.visual_description.trim();
        !description.is_empty() && !description.eq_ignore_ascii_case(NO_VISUAL)
    }

    /// Convert document to runtime slide.
    #[must_use]
    pub fn into_slide(self) -> Slide {
        let id = self
            .id
            .as_deref()
            .and_then(|id| SlideId::parse(id).ok())
            .unwrap_or_default();
        let is_image_visible = self.style_name == SlideStyle::Spotlight.name();
        Slide {
            id,
            slide_number: self.slide_number,
            style_name: self.style_name,
            elements: self
                .elements
                .into_iter()
                .map(ElementDocument::into_element)
                .collect(),
            visual_description: self.visual_description,
            image_url: self.image_url,
            is_regenerating: false,
            is_image_visible,
        }
    }
}

/// A generated carousel plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarouselDocument {
    /// Slides in narrative order.
    pub slides: Vec<SlideDocument>,
}

impl CarouselDocument {
    /// Parse generator output, tolerating markdown fences and chatter.
    ///
    /// # Errors
    ///
    /// Returns an error if no JSON plan can be read from the text.
    pub fn parse(text: &str) -> EditorResult<Self> {
        serde_json::from_str(extract_json(text))
            .map_err(|e| EditorError::MalformedPayload(format!("carousel plan: {e}")))
    }

    /// Assign identifiers and validate the slide count.
    ///
    /// # Errors
    ///
    /// Returns a malformed-payload error unless exactly ten slides are present.
    pub fn into_plan(self) -> EditorResult<CarouselPlan> {
        let found = self.slides.len();
        let awaiting = self
            .slides
            .iter()
            .filter(|slide| slide.image_url.is_none() && slide.needs_visual())
            .count();
        debug!(slides = found, awaiting, "slides awaiting a background");
        CarouselPlan::new(self.slides.into_iter().map(SlideDocument::into_slide).collect())
            .map_err(|_| {
                EditorError::MalformedPayload(format!(
                    "expected {} slides, found {found}",
                    CarouselPlan::SLIDE_COUNT
                ))
            })
    }
}

/// Pull the JSON object out of model output.
///
/// Prefers a fenced ```` ```json ```` block, then the span from the first `{`
/// to the last `}`, and otherwise returns the text unchanged.
#[must_use]
pub fn extract_json(text: &str) -> &str {
    const FENCE: &str = "```json";
    if let Some(start) = text.find(FENCE) {
        let body = &text[start + FENCE.len()..];
        if let Some(end) = body.find("```") {
            let inner = body[..end].trim();
            if !inner.is_empty() {
                return inner;
            }
        }
    }
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => &text[start..=end],
        _ => {
            warn!("no JSON object found in generator output");
            text
        }
    }
}
