//! # Geometry Engine
//!
//! Pure functions that turn pointer positions into element geometry.
//!
//! All element geometry lives in a fixed logical canvas of
//! [`CANVAS_WIDTH`] x [`CANVAS_HEIGHT`] units with the origin at the top-left.
//! The on-screen canvas is the same surface uniformly scaled by
//! `container_width / CANVAS_WIDTH`, so pointer input arrives in screen
//! pixels (relative to the canvas' top-left corner) and is divided by the
//! scale factor before it touches the model.
//!
//! ```text
//!  screen px ──(/ scale)──► canvas units ──► snap ──► Frame + guides
//! ```
//!
//! Only the horizontal axis snaps. Vertical positions pass through as-is.

use serde::{Deserialize, Serialize};

use crate::ElementId;

/// Logical canvas width.
pub const CANVAS_WIDTH: f32 = 1080.0;

/// Logical canvas height.
pub const CANVAS_HEIGHT: f32 = 1440.0;

/// Distance (canvas units) within which an edge or centre snaps.
pub const SNAP_THRESHOLD: f32 = 5.0;

/// Smallest width or height an element can be resized to.
pub const MIN_ELEMENT_SIZE: f32 = 20.0;

/// A 2D point. Whether it is in screen or canvas space depends on context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
}

impl Point {
    /// Create a point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Whether both coordinates are finite numbers.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance_to(self, other: Self) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Axis-aligned rectangle in canvas space: top-left origin plus size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl Frame {
    /// Create a frame.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Left edge.
    #[must_use]
    pub const fn left(&self) -> f32 {
        self.x
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Horizontal centre.
    #[must_use]
    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    /// Bottom-right corner, where the resize handle sits.
    #[must_use]
    pub fn bottom_right(&self) -> Point {
        Point::new(self.right(), self.bottom())
    }

    /// Whether a canvas-space point lies inside (edges inclusive).
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }

    /// Same frame with every component rounded to whole canvas units.
    #[must_use]
    pub fn rounded(&self) -> Self {
        Self::new(
            self.x.round(),
            self.y.round(),
            self.width.round(),
            self.height.round(),
        )
    }

    /// Whether the frame lies entirely within the logical canvas.
    #[must_use]
    pub fn is_within_canvas(&self) -> bool {
        self.x >= 0.0 && self.y >= 0.0 && self.right() <= CANVAS_WIDTH && self.bottom() <= CANVAS_HEIGHT
    }
}

/// Maps screen pixels to canvas units.
///
/// The scale factor is derived from the rendered container width and must be
/// refreshed whenever the container is resized.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Viewport {
    container_width: f32,
}

impl Viewport {
    /// A viewport whose container has not been measured yet.
    #[must_use]
    pub const fn unmeasured() -> Self {
        Self {
            container_width: 0.0,
        }
    }

    /// A viewport for a container of the given pixel width.
    #[must_use]
    pub fn with_container_width(width: f32) -> Self {
        let mut viewport = Self::unmeasured();
        viewport.observe_container_width(width);
        viewport
    }

    /// Record a new container width. Returns `true` if the scale changed.
    ///
    /// Non-finite or negative widths are treated as "not measured".
    pub fn observe_container_width(&mut self, width: f32) -> bool {
        let width = if width.is_finite() && width > 0.0 {
            width
        } else {
            0.0
        };
        let changed = (self.container_width - width).abs() > f32::EPSILON;
        self.container_width = width;
        changed
    }

    /// Container width in screen pixels.
    #[must_use]
    pub const fn container_width(&self) -> f32 {
        self.container_width
    }

    /// Screen pixels per canvas unit.
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.container_width / CANVAS_WIDTH
    }

    /// Whether a usable scale factor is available.
    #[must_use]
    pub fn is_measured(&self) -> bool {
        self.container_width > 0.0
    }

    /// Convert a screen point (relative to the canvas' top-left) to canvas space.
    ///
    /// Returns `None` until the container has been measured, and for
    /// non-finite input.
    #[must_use]
    pub fn to_canvas(&self, screen: Point) -> Option<Point> {
        (self.is_measured() && screen.is_finite())
            .then(|| Point::new(screen.x / self.scale(), screen.y / self.scale()))
    }

    /// Convert a length in screen pixels to canvas units.
    #[must_use]
    pub fn to_canvas_length(&self, pixels: f32) -> Option<f32> {
        self.is_measured().then(|| pixels / self.scale())
    }
}

/// Orientation of a guide line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuideAxis {
    /// A vertical line at a fixed x.
    Vertical,
    /// A horizontal line at a fixed y.
    Horizontal,
}

/// What a guide line aligned against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "element", rename_all = "camelCase")]
pub enum SnapSource {
    /// The canvas' horizontal centre.
    CanvasCenter,
    /// A sibling's left edge.
    SiblingLeft(ElementId),
    /// A sibling's right edge.
    SiblingRight(ElementId),
}

/// A purely visual alignment hint emitted while dragging.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GuideLine {
    /// Line orientation.
    pub axis: GuideAxis,
    /// Position along the perpendicular axis (x for vertical lines).
    pub position: f32,
    /// Start of the line along its own axis.
    pub start: f32,
    /// End of the line along its own axis.
    pub end: f32,
    /// What the moving element snapped to.
    pub source: SnapSource,
}

impl GuideLine {
    /// A full-height vertical guide at `x`.
    #[must_use]
    pub const fn vertical(x: f32, source: SnapSource) -> Self {
        Self {
            axis: GuideAxis::Vertical,
            position: x,
            start: 0.0,
            end: CANVAS_HEIGHT,
            source,
        }
    }
}

/// A stationary element the moving element may align with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapTarget {
    /// Sibling element id.
    pub id: ElementId,
    /// Sibling geometry.
    pub frame: Frame,
}

/// Candidate geometry plus the guides explaining any snapping.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryUpdate {
    /// New geometry for the active element.
    pub frame: Frame,
    /// Guides to draw until the gesture ends.
    pub guides: Vec<GuideLine>,
}

/// Snap a candidate frame horizontally.
///
/// All comparisons use the unsnapped candidate. The canvas centre is checked
/// first, then each sibling's left and right edges in order; a later match
/// overrides the x chosen by an earlier one, and every match emits a guide.
#[must_use]
pub fn snap_horizontal(candidate: Frame, targets: &[SnapTarget], threshold: f32) -> (f32, Vec<GuideLine>) {
    let mut x = candidate.x;
    let mut guides = Vec::new();
    let canvas_center = CANVAS_WIDTH / 2.0;

    if (candidate.center_x() - canvas_center).abs() < threshold {
        x = canvas_center - candidate.width / 2.0;
        guides.push(GuideLine::vertical(canvas_center, SnapSource::CanvasCenter));
    }

    for target in targets {
        if (candidate.left() - target.frame.left()).abs() < threshold {
            x = target.frame.left();
            guides.push(GuideLine::vertical(
                target.frame.left(),
                SnapSource::SiblingLeft(target.id),
            ));
        }
        if (candidate.right() - target.frame.right()).abs() < threshold {
            x = target.frame.right() - candidate.width;
            guides.push(GuideLine::vertical(
                target.frame.right(),
                SnapSource::SiblingRight(target.id),
            ));
        }
    }

    (x, guides)
}

/// Compute the geometry for a move step.
///
/// `pointer` and `grab_offset` are both in canvas space; the new top-left is
/// `pointer - grab_offset` before snapping. Size never changes.
#[must_use]
pub fn compute_move(
    original: Frame,
    pointer: Point,
    grab_offset: Point,
    targets: &[SnapTarget],
    threshold: f32,
) -> GeometryUpdate {
    let candidate = Frame::new(
        pointer.x - grab_offset.x,
        pointer.y - grab_offset.y,
        original.width,
        original.height,
    );
    let (x, guides) = snap_horizontal(candidate, targets, threshold);
    GeometryUpdate {
        frame: Frame { x, ..candidate },
        guides,
    }
}

/// Compute the geometry for a resize step anchored at the top-left corner.
///
/// `screen_delta` is the pointer movement since the resize started, in screen
/// pixels; it is divided by `scale` before being added to the original size.
/// Both dimensions are floored at `min_size`.
#[must_use]
pub fn compute_resize(original: Frame, screen_delta: Point, scale: f32, min_size: f32) -> Frame {
    let dx = screen_delta.x / scale;
    let dy = screen_delta.y / scale;
    Frame {
        width: (original.width + dx).max(min_size),
        height: (original.height + dy).max(min_size),
        ..original
    }
}
