//! # Gesture Controller
//!
//! Owns the transient drag/resize session of one slide.
//!
//! ```text
//!            begin_move / begin_resize
//!   Idle ───────────────────────────────► Dragging(mode)
//!    ▲                                        │  update (working copy only)
//!    │         finish / cancel                ▼
//!    └──────────────────────────────── Dragging(mode)
//! ```
//!
//! Starting a session hands out a [`PointerCapture`]. Move and up events must
//! present the capture of the live session; anything else is stale and is
//! ignored. Every exit path drops the session and clears the guides.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::editor::EditorConfig;
use crate::element::{ElementId, SlideElement};
use crate::geometry::{self, Frame, GuideLine, Point, SnapTarget, Viewport};

/// Handle for the pointer stream owned by one gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PointerCapture(u64);

/// What a drag does to its element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DragMode {
    /// Translate, with horizontal snapping.
    Move,
    /// Grow or shrink from the bottom-right corner.
    Resize,
}

/// The state recorded when a gesture starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    /// Move or resize.
    pub mode: DragMode,
    /// Element being manipulated.
    pub element_id: ElementId,
    /// Pointer position relative to the element's top-left, in canvas units.
    pub grab_offset: Point,
    /// Pointer position at pointer-down, in screen pixels.
    pub pointer_origin: Point,
    /// Element geometry at pointer-down.
    pub original: Frame,
    /// Capture handle for this session.
    pub capture: PointerCapture,
}

/// Per-slide gesture state machine.
#[derive(Debug, Default)]
pub struct GestureController {
    session: Option<DragSession>,
    guides: Vec<GuideLine>,
    next_capture: u64,
}

impl GestureController {
    /// Create an idle controller.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a gesture is in progress.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// The live session.
    #[must_use]
    pub const fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    /// Guides produced by the latest move step.
    #[must_use]
    pub fn guides(&self) -> &[GuideLine] {
        &self.guides
    }

    /// Start moving `element` from a pointer-down at `pointer` (screen pixels).
    ///
    /// Returns `None` when the element is locked, the viewport is not yet
    /// measured, or another gesture is already running.
    pub fn begin_move(
        &mut self,
        element: &SlideElement,
        pointer: Point,
        viewport: &Viewport,
    ) -> Option<PointerCapture> {
        self.begin(DragMode::Move, element, pointer, viewport)
    }

    /// Start resizing `element` from its bottom-right handle.
    ///
    /// Same refusal rules as [`Self::begin_move`].
    pub fn begin_resize(
        &mut self,
        element: &SlideElement,
        pointer: Point,
        viewport: &Viewport,
    ) -> Option<PointerCapture> {
        self.begin(DragMode::Resize, element, pointer, viewport)
    }

    fn begin(
        &mut self,
        mode: DragMode,
        element: &SlideElement,
        pointer: Point,
        viewport: &Viewport,
    ) -> Option<PointerCapture> {
        if element.is_locked {
            debug!(element = %element.id, "ignoring gesture on locked element");
            return None;
        }
        if self.session.is_some() {
            debug!(element = %element.id, "gesture already active");
            return None;
        }
        let canvas_pointer = viewport.to_canvas(pointer)?;

        self.next_capture += 1;
        let capture = PointerCapture(self.next_capture);
        self.session = Some(DragSession {
            mode,
            element_id: element.id,
            grab_offset: Point::new(canvas_pointer.x - element.x, canvas_pointer.y - element.y),
            pointer_origin: pointer,
            original: element.frame(),
            capture,
        });
        self.guides.clear();
        debug!(element = %element.id, ?mode, "gesture started");
        Some(capture)
    }

    /// Compute the geometry for a pointer-move at `pointer` (screen pixels).
    ///
    /// Returns the element and its new frame, or `None` for a stale capture
    /// or an unmeasured viewport.
    pub fn update(
        &mut self,
        capture: PointerCapture,
        pointer: Point,
        viewport: &Viewport,
        targets: &[SnapTarget],
        config: &EditorConfig,
    ) -> Option<(ElementId, Frame)> {
        let session = self.session.filter(|s| s.capture == capture)?;
        match session.mode {
            DragMode::Move => {
                let canvas_pointer = viewport.to_canvas(pointer)?;
                let update = geometry::compute_move(
                    session.original,
                    canvas_pointer,
                    session.grab_offset,
                    targets,
                    config.snap_threshold,
                );
                self.guides = update.guides;
                Some((session.element_id, update.frame))
            }
            DragMode::Resize => {
                if !viewport.is_measured() {
                    return None;
                }
                let delta = Point::new(
                    pointer.x - session.pointer_origin.x,
                    pointer.y - session.pointer_origin.y,
                );
                let frame = geometry::compute_resize(
                    session.original,
                    delta,
                    viewport.scale(),
                    config.min_element_size,
                );
                Some((session.element_id, frame))
            }
        }
    }

    /// End the gesture on pointer-up. Returns the finished session.
    pub fn finish(&mut self, capture: PointerCapture) -> Option<DragSession> {
        if self.session.map(|s| s.capture) != Some(capture) {
            return None;
        }
        self.cancel()
    }

    /// Abandon any gesture without committing.
    pub fn cancel(&mut self) -> Option<DragSession> {
        self.guides.clear();
        self.session.take()
    }

    /// Abandon the gesture if it manipulates `element_id`.
    pub fn release_element(&mut self, element_id: ElementId) -> Option<DragSession> {
        if self.session.map(|s| s.element_id) == Some(element_id) {
            self.cancel()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementKind;

    fn element(frame: Frame) -> SlideElement {
        SlideElement::new(
            ElementKind::Text {
                content: "drag me".into(),
            },
            frame,
        )
    }

    #[test]
    fn test_move_records_grab_offset_in_canvas_space() {
        let mut gestures = GestureController::new();
        let viewport = Viewport::with_container_width(540.0);
        let el = element(Frame::new(100.0, 100.0, 300.0, 50.0));

        // screen (60, 55) is canvas (120, 110)
        let capture = gestures
            .begin_move(&el, Point::new(60.0, 55.0), &viewport)
            .expect("started");
        let session = gestures.session().expect("active");
        assert_eq!(session.grab_offset, Point::new(20.0, 10.0));

        let (id, frame) = gestures
            .update(capture, Point::new(160.0, 105.0), &viewport, &[], &EditorConfig::default())
            .expect("live capture");
        assert_eq!(id, el.id);
        assert_eq!(frame, Frame::new(300.0, 200.0, 300.0, 50.0));
    }

    #[test]
    fn test_locked_element_never_starts_session() {
        let mut gestures = GestureController::new();
        let viewport = Viewport::with_container_width(1080.0);
        let el = element(Frame::new(0.0, 0.0, 100.0, 100.0)).with_locked(true);
        assert!(gestures.begin_move(&el, Point::new(10.0, 10.0), &viewport).is_none());
        assert!(gestures.begin_resize(&el, Point::new(100.0, 100.0), &viewport).is_none());
        assert!(!gestures.is_active());
    }

    #[test]
    fn test_unmeasured_viewport_refuses_gesture() {
        let mut gestures = GestureController::new();
        let el = element(Frame::new(0.0, 0.0, 100.0, 100.0));
        assert!(gestures
            .begin_move(&el, Point::new(10.0, 10.0), &Viewport::unmeasured())
            .is_none());
    }

    #[test]
    fn test_one_gesture_at_a_time() {
        let mut gestures = GestureController::new();
        let viewport = Viewport::with_container_width(1080.0);
        let a = element(Frame::new(0.0, 0.0, 100.0, 100.0));
        let b = element(Frame::new(200.0, 0.0, 100.0, 100.0));
        assert!(gestures.begin_move(&a, Point::new(10.0, 10.0), &viewport).is_some());
        assert!(gestures.begin_move(&b, Point::new(210.0, 10.0), &viewport).is_none());
        assert_eq!(gestures.session().map(|s| s.element_id), Some(a.id));
    }

    #[test]
    fn test_stale_capture_is_ignored() {
        let mut gestures = GestureController::new();
        let viewport = Viewport::with_container_width(1080.0);
        let el = element(Frame::new(0.0, 0.0, 100.0, 100.0));
        let first = gestures
            .begin_move(&el, Point::new(10.0, 10.0), &viewport)
            .expect("started");
        gestures.finish(first).expect("finished");

        let second = gestures
            .begin_move(&el, Point::new(10.0, 10.0), &viewport)
            .expect("started");
        assert_ne!(first, second);
        let config = EditorConfig::default();
        assert!(gestures.update(first, Point::new(50.0, 50.0), &viewport, &[], &config).is_none());
        assert!(gestures.finish(first).is_none());
        assert!(gestures.is_active());
    }

    #[test]
    fn test_resize_uses_screen_delta_over_scale() {
        let mut gestures = GestureController::new();
        let viewport = Viewport::with_container_width(540.0);
        let el = element(Frame::new(10.0, 10.0, 100.0, 100.0));
        let capture = gestures
            .begin_resize(&el, Point::new(55.0, 55.0), &viewport)
            .expect("started");
        let (_, frame) = gestures
            .update(capture, Point::new(105.0, 5.0), &viewport, &[], &EditorConfig::default())
            .expect("live");
        assert_eq!(frame, Frame::new(10.0, 10.0, 200.0, 20.0));
    }

    #[test]
    fn test_exit_paths_clear_guides() {
        let mut gestures = GestureController::new();
        let viewport = Viewport::with_container_width(1080.0);
        let el = element(Frame::new(0.0, 0.0, 300.0, 50.0));
        let capture = gestures
            .begin_move(&el, Point::new(0.0, 0.0), &viewport)
            .expect("started");
        gestures.update(capture, Point::new(391.0, 0.0), &viewport, &[], &EditorConfig::default());
        assert_eq!(gestures.guides().len(), 1);

        assert!(gestures.release_element(el.id).is_some());
        assert!(gestures.guides().is_empty());
        assert!(!gestures.is_active());
    }
}
