//! Scene graph: slides and the carousel plan.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::element::{ElementId, ImageRef, SlideElement};
use crate::geometry::{Point, SnapTarget};
use crate::layering::{self, LayerAction};
use crate::library::SlideStyle;
use crate::{EditorError, EditorResult};

/// Unique identifier for a slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlideId(Uuid);

impl SlideId {
    /// Create a new unique slide ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse from the hyphenated string form.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid UUID.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Default for SlideId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SlideId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One frame of the carousel: a background plus an ordered element list.
///
/// Element order is z-order, back to front.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    /// Stable identifier.
    pub id: SlideId,
    /// 1-based position in the narrative.
    pub slide_number: u32,
    /// Name of the narrative style this slide was generated from.
    pub style_name: String,
    /// Elements, back to front.
    #[serde(default)]
    pub elements: Vec<SlideElement>,
    /// Free-text description used to (re)generate the background.
    #[serde(default)]
    pub visual_description: String,
    /// Background image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<ImageRef>,
    /// A background regeneration is in flight.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_regenerating: bool,
    /// Whether the background is rendered.
    #[serde(default)]
    pub is_image_visible: bool,
}

impl Slide {
    /// Create an empty slide.
    #[must_use]
    pub fn new(slide_number: u32, style: SlideStyle) -> Self {
        Self {
            id: SlideId::new(),
            slide_number,
            style_name: style.name().to_string(),
            elements: Vec::new(),
            visual_description: String::new(),
            image_url: None,
            is_regenerating: false,
            is_image_visible: style.shows_background_initially(),
        }
    }

    /// The parsed narrative style, if the name is a known one.
    #[must_use]
    pub fn style(&self) -> Option<SlideStyle> {
        self.style_name.parse().ok()
    }

    /// Get an element by ID.
    #[must_use]
    pub fn element(&self, id: ElementId) -> Option<&SlideElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    /// Get a mutable reference to an element by ID.
    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut SlideElement> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    /// Z-order position of an element.
    #[must_use]
    pub fn index_of(&self, id: ElementId) -> Option<usize> {
        self.elements.iter().position(|e| e.id == id)
    }

    /// Append an element at the front.
    pub fn add(&mut self, element: SlideElement) -> ElementId {
        let id = element.id;
        self.elements.push(element);
        id
    }

    /// Remove an element.
    ///
    /// # Errors
    ///
    /// Returns an error if the element is not found.
    pub fn remove(&mut self, id: ElementId) -> EditorResult<SlideElement> {
        let index = self
            .index_of(id)
            .ok_or_else(|| EditorError::ElementNotFound(id.to_string()))?;
        Ok(self.elements.remove(index))
    }

    /// The front-most element containing a canvas-space point.
    #[must_use]
    pub fn element_at(&self, point: Point) -> Option<&SlideElement> {
        self.elements.iter().rev().find(|e| e.contains_point(point))
    }

    /// Apply a layer action. Returns whether the order changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the element is not found.
    pub fn reorder(&mut self, id: ElementId, action: LayerAction) -> EditorResult<bool> {
        let index = self
            .index_of(id)
            .ok_or_else(|| EditorError::ElementNotFound(id.to_string()))?;
        Ok(layering::reorder(&mut self.elements, index, action))
    }

    /// Every element except `exclude`, as snap targets.
    #[must_use]
    pub fn snap_targets(&self, exclude: ElementId) -> Vec<SnapTarget> {
        self.elements
            .iter()
            .filter(|e| e.id != exclude)
            .map(|e| SnapTarget {
                id: e.id,
                frame: e.frame(),
            })
            .collect()
    }

    /// The resolved background image.
    #[must_use]
    pub fn background(&self) -> Option<&ImageRef> {
        self.image_url.as_ref().filter(|url| !url.is_empty())
    }
}

/// The ordered, fixed-length sequence of slides that makes up a carousel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarouselPlan {
    slides: Vec<Slide>,
}

impl CarouselPlan {
    /// Number of slides in every carousel.
    pub const SLIDE_COUNT: usize = 10;

    /// Create a plan.
    ///
    /// # Errors
    ///
    /// Returns an error unless exactly [`Self::SLIDE_COUNT`] slides are given.
    pub fn new(slides: Vec<Slide>) -> EditorResult<Self> {
        if slides.len() != Self::SLIDE_COUNT {
            return Err(EditorError::PlanSize {
                expected: Self::SLIDE_COUNT,
                found: slides.len(),
            });
        }
        Ok(Self { slides })
    }

    /// Slides in narrative order.
    #[must_use]
    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    /// Get a slide by ID.
    #[must_use]
    pub fn slide(&self, id: SlideId) -> Option<&Slide> {
        self.slides.iter().find(|s| s.id == id)
    }

    /// Get a slide by narrative position.
    #[must_use]
    pub fn slide_at(&self, index: usize) -> Option<&Slide> {
        self.slides.get(index)
    }

    /// Replace the slide whose id matches `slide`.
    ///
    /// # Errors
    ///
    /// Returns an error if no slide has that id.
    pub fn apply_update(&mut self, slide: Slide) -> EditorResult<()> {
        let target = self
            .slides
            .iter_mut()
            .find(|s| s.id == slide.id)
            .ok_or_else(|| EditorError::SlideNotFound(slide.id.to_string()))?;
        *target = slide;
        Ok(())
    }

    /// Serialize the plan to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> EditorResult<String> {
        serde_json::to_string_pretty(self).map_err(EditorError::Serialization)
    }

    /// Deserialize a plan from JSON, enforcing the slide count.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid or the slide count is wrong.
    pub fn from_json(json: &str) -> EditorResult<Self> {
        #[derive(Deserialize)]
        struct Raw {
            slides: Vec<Slide>,
        }
        let raw: Raw = serde_json::from_str(json)?;
        Self::new(raw.slides)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementKind;
    use crate::geometry::Frame;

    fn text(x: f32) -> SlideElement {
        SlideElement::new(
            ElementKind::Text {
                content: "t".into(),
            },
            Frame::new(x, 0.0, 100.0, 100.0),
        )
    }

    fn plan() -> CarouselPlan {
        let slides = (1..=10)
            .map(|n| Slide::new(n, SlideStyle::ALL[(n as usize - 1) % 12]))
            .collect();
        CarouselPlan::new(slides).expect("ten slides")
    }

    #[test]
    fn test_slide_add_remove() {
        let mut slide = Slide::new(1, SlideStyle::Spotlight);
        assert!(slide.is_image_visible);
        let id = slide.add(text(0.0));
        assert_eq!(slide.index_of(id), Some(0));
        let removed = slide.remove(id).expect("present");
        assert_eq!(removed.id, id);
        assert!(slide.elements.is_empty());
        assert!(slide.remove(id).is_err());
    }

    #[test]
    fn test_element_at_prefers_front() {
        let mut slide = Slide::new(2, SlideStyle::Analyst);
        let back = slide.add(text(0.0));
        let front = slide.add(text(50.0));
        let hit = slide.element_at(Point::new(75.0, 10.0)).expect("hit");
        assert_eq!(hit.id, front);
        let hit = slide.element_at(Point::new(10.0, 10.0)).expect("hit");
        assert_eq!(hit.id, back);
        assert!(slide.element_at(Point::new(500.0, 500.0)).is_none());
    }

    #[test]
    fn test_reorder_and_snap_targets() {
        let mut slide = Slide::new(3, SlideStyle::Timeline);
        let a = slide.add(text(0.0));
        let b = slide.add(text(200.0));
        assert!(slide.reorder(a, LayerAction::BringToFront).expect("present"));
        assert_eq!(slide.index_of(a), Some(1));
        assert!(!slide.reorder(a, LayerAction::BringForward).expect("present"));

        let targets = slide.snap_targets(a);
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].id, b);
    }

    #[test]
    fn test_plan_requires_ten_slides() {
        let err = CarouselPlan::new(vec![Slide::new(1, SlideStyle::Closer)]).unwrap_err();
        assert!(matches!(err, EditorError::PlanSize { expected: 10, found: 1 }));
    }

    #[test]
    fn test_plan_apply_update_splices_by_id() {
        let mut plan = plan();
        let mut slide = plan.slides()[4].clone();
        slide.visual_description = "Obsidian shards".into();
        plan.apply_update(slide.clone()).expect("known id");
        assert_eq!(plan.slide(slide.id), Some(&slide));
        assert_eq!(plan.slides()[4].visual_description, "Obsidian shards");

        let stranger = Slide::new(11, SlideStyle::Map);
        assert!(plan.apply_update(stranger).is_err());
    }

    #[test]
    fn test_plan_json_roundtrip() {
        let mut plan = plan();
        let mut slide = plan.slides()[0].clone();
        slide.add(text(10.0));
        plan.apply_update(slide).expect("known id");

        let json = plan.to_json().expect("serialize");
        assert!(json.contains("\"slideNumber\": 1"));
        assert!(json.contains("\"styleName\": \"The Spotlight\""));
        assert!(!json.contains("isRegenerating"));
        let back = CarouselPlan::from_json(&json).expect("parse");
        assert_eq!(back, plan);
    }

    #[test]
    fn test_style_lookup() {
        let mut slide = Slide::new(1, SlideStyle::DataFlash);
        assert_eq!(slide.style(), Some(SlideStyle::DataFlash));
        slide.style_name = "Freestyle".into();
        assert_eq!(slide.style(), None);
    }
}
