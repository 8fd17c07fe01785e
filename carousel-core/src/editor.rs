//! # Slide Editor
//!
//! One editor per slide. It keeps two copies of the slide:
//!
//! - `committed`: the last value pushed to, or received from, the owner of
//!   the carousel plan.
//! - `working`: what is rendered. It runs ahead of `committed` while a drag
//!   or an inline text edit is in progress.
//!
//! ```text
//!   pointer/keys ──► SlideEditor ──► working copy (live feedback)
//!                        │
//!                        └─ commit ──► EditorOutput::Commit(slide) ──► owner
//!   owner ──► sync_from_committed ──► working copy (or deferred while local)
//! ```
//!
//! Discrete edits commit immediately. Gestures commit once, on pointer-up.
//! External updates that arrive mid-gesture are held back and the gesture's
//! result is rebased onto them when it ends.
//!
//! Image generation and background removal run in three phases: `begin_*`
//! marks the pending state (committing it when the slide changes) and hands
//! back a [`PendingOperation`]; the host runs it against an [`ImageService`];
//! [`SlideEditor::complete`] applies or rolls back. Deleting the target
//! element cancels the operation so a late result is dropped.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::element::{ElementId, ElementKind, ElementStyles, ImageRef, SlideElement};
use crate::event::{EditorInput, PointerTarget, ToolboxAction};
use crate::geometry::{GuideLine, Point, Viewport, MIN_ELEMENT_SIZE, SNAP_THRESHOLD};
use crate::gesture::GestureController;
use crate::inspector::{InspectorPanel, StyleEdit, StyleInspector};
use crate::layering::{ContextMenu, LayerAction, MenuAction, MenuItem, Selection};
use crate::library::{Palette, VisualPrompt};
use crate::schema::RealWorldImage;
use crate::service::{ImageService, ServiceError};
use crate::slide::{Slide, SlideId};
use crate::{EditorError, EditorResult};

/// Tunables for a slide editor.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    /// Snap distance in canvas units (strict less-than).
    pub snap_threshold: f32,
    /// Minimum width and height reachable by resizing.
    pub min_element_size: f32,
    /// Radius around the bottom-right corner, in screen pixels, that counts
    /// as a hit on the resize handle.
    pub handle_hit_radius: f32,
    /// Round geometry to whole canvas units when committing.
    pub round_on_commit: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            snap_threshold: SNAP_THRESHOLD,
            min_element_size: MIN_ELEMENT_SIZE,
            handle_hit_radius: 12.0,
            round_on_commit: true,
        }
    }
}

impl EditorConfig {
    /// Set the snap threshold.
    #[must_use]
    pub fn with_snap_threshold(mut self, threshold: f32) -> Self {
        self.snap_threshold = threshold;
        self
    }

    /// Set the minimum element size.
    #[must_use]
    pub fn with_min_element_size(mut self, size: f32) -> Self {
        self.min_element_size = size;
        self
    }

    /// Set the resize-handle hit radius.
    #[must_use]
    pub fn with_handle_hit_radius(mut self, radius: f32) -> Self {
        self.handle_hit_radius = radius;
        self
    }

    /// Enable or disable rounding on commit.
    #[must_use]
    pub fn with_round_on_commit(mut self, round: bool) -> Self {
        self.round_on_commit = round;
        self
    }
}

/// Identifier of an in-flight asynchronous operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(Uuid);

impl OperationId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What an asynchronous operation will do when it resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PendingKind {
    /// Fill a freshly inserted placeholder image element.
    #[serde(rename_all = "camelCase")]
    ImageElement {
        /// The placeholder.
        element_id: ElementId,
        /// Description to render.
        prompt: String,
    },
    /// Replace an image element's picture with a cut-out.
    #[serde(rename_all = "camelCase")]
    BackgroundRemoval {
        /// The image element.
        element_id: ElementId,
        /// Picture to process.
        source: ImageRef,
    },
    /// Replace the slide background.
    #[serde(rename_all = "camelCase")]
    BackgroundRegeneration {
        /// Description before the regeneration started.
        previous_description: String,
        /// Description to render.
        description: String,
    },
}

impl PendingKind {
    /// The element the operation is tied to, if any.
    #[must_use]
    pub const fn element_id(&self) -> Option<ElementId> {
        match self {
            Self::ImageElement { element_id, .. } | Self::BackgroundRemoval { element_id, .. } => {
                Some(*element_id)
            }
            Self::BackgroundRegeneration { .. } => None,
        }
    }
}

/// An operation the host must run and report back through
/// [`SlideEditor::complete`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingOperation {
    /// Operation handle.
    pub id: OperationId,
    /// Slide the operation belongs to.
    pub slide_id: SlideId,
    /// What to do.
    pub kind: PendingKind,
}

impl PendingOperation {
    /// Run the operation against an image service.
    ///
    /// # Errors
    ///
    /// Returns the service's error unchanged.
    pub async fn execute(
        &self,
        service: &dyn ImageService,
        palette: &Palette,
    ) -> Result<ImageRef, ServiceError> {
        match &self.kind {
            PendingKind::ImageElement { prompt, .. } => service.regenerate_image(prompt, palette).await,
            PendingKind::BackgroundRemoval { source, .. } => service.remove_background(source).await,
            PendingKind::BackgroundRegeneration { description, .. } => {
                service.regenerate_image(description, palette).await
            }
        }
    }
}

/// How a completion was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The result was applied and committed.
    Applied,
    /// The operation failed; state was restored and the user notified.
    RolledBack,
    /// The operation was cancelled or unknown; the result was dropped.
    Stale,
}

/// Which action a notification reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationKind {
    /// Generating an image element.
    ImageGeneration,
    /// Removing an element's background.
    BackgroundRemoval,
    /// Regenerating the slide background.
    BackgroundRegeneration,
}

/// A blocking, user-facing message about a failed action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Source action.
    pub kind: NotificationKind,
    /// Text to show.
    pub message: String,
}

/// Something the editor tells its owner.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorOutput {
    /// A new committed value for the slide.
    Commit(Slide),
    /// The selection changed.
    Select(Selection),
    /// Empty canvas was clicked. Clears the selection whichever slide holds it.
    ClearSelection,
    /// An action failed.
    Notify(Notification),
}

/// Interactive editor for a single slide.
#[derive(Debug)]
pub struct SlideEditor {
    config: EditorConfig,
    palette: Palette,
    committed: Slide,
    working: Slide,
    deferred: Option<Slide>,
    viewport: Viewport,
    gestures: GestureController,
    selected: Option<ElementId>,
    editing: Option<ElementId>,
    context_menu: Option<ContextMenu>,
    pending: HashMap<OperationId, PendingKind>,
    outbox: VecDeque<EditorOutput>,
}

impl SlideEditor {
    /// Create an editor with the default configuration.
    #[must_use]
    pub fn new(slide: Slide, palette: Palette) -> Self {
        Self::with_config(slide, palette, EditorConfig::default())
    }

    /// Create with custom configuration.
    #[must_use]
    pub fn with_config(slide: Slide, palette: Palette, config: EditorConfig) -> Self {
        Self {
            config,
            palette,
            working: slide.clone(),
            committed: slide,
            deferred: None,
            viewport: Viewport::unmeasured(),
            gestures: GestureController::new(),
            selected: None,
            editing: None,
            context_menu: None,
            pending: HashMap::new(),
            outbox: VecDeque::new(),
        }
    }

    /// Slide identifier.
    #[must_use]
    pub fn id(&self) -> SlideId {
        self.working.id
    }

    /// The working copy, as it should be rendered.
    #[must_use]
    pub const fn slide(&self) -> &Slide {
        &self.working
    }

    /// The last committed value.
    #[must_use]
    pub const fn committed(&self) -> &Slide {
        &self.committed
    }

    /// Editor configuration.
    #[must_use]
    pub const fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Active palette.
    #[must_use]
    pub const fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Current viewport.
    #[must_use]
    pub const fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Record the rendered container width. Returns whether the scale changed.
    pub fn observe_container_width(&mut self, width: f32) -> bool {
        let changed = self.viewport.observe_container_width(width);
        if changed {
            debug!(slide = %self.id(), scale = self.viewport.scale(), "viewport rescaled");
        }
        changed
    }

    /// Snap guides to draw.
    #[must_use]
    pub fn guides(&self) -> &[GuideLine] {
        self.gestures.guides()
    }

    /// Whether a drag or resize is in progress.
    #[must_use]
    pub const fn is_dragging(&self) -> bool {
        self.gestures.is_active()
    }

    /// Selected element on this slide.
    #[must_use]
    pub const fn selected(&self) -> Option<ElementId> {
        self.selected
    }

    /// Element in inline text-edit mode.
    #[must_use]
    pub const fn editing(&self) -> Option<ElementId> {
        self.editing
    }

    /// The open context menu.
    #[must_use]
    pub const fn context_menu(&self) -> Option<&ContextMenu> {
        self.context_menu.as_ref()
    }

    /// Rows of the open context menu.
    #[must_use]
    pub fn context_menu_items(&self) -> Vec<MenuItem> {
        self.context_menu
            .and_then(|menu| self.working.element(menu.element_id))
            .map(ContextMenu::items)
            .unwrap_or_default()
    }

    /// Whether an asynchronous operation targets `element_id`.
    #[must_use]
    pub fn is_processing(&self, element_id: ElementId) -> bool {
        self.pending
            .values()
            .any(|kind| kind.element_id() == Some(element_id))
    }

    /// Number of operations awaiting completion.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Take everything emitted since the last call.
    pub fn drain_outputs(&mut self) -> Vec<EditorOutput> {
        self.outbox.drain(..).collect()
    }

    /// Inspector panel for the selected element.
    #[must_use]
    pub fn inspector(&self) -> Option<InspectorPanel> {
        let element = self.working.element(self.selected?)?;
        Some(StyleInspector::panel(element, &self.palette))
    }

    // ----- reconciliation -------------------------------------------------

    fn in_local_session(&self) -> bool {
        self.gestures.is_active() || self.editing.is_some()
    }

    /// Receive the owner's value for this slide. Last committed wins.
    ///
    /// While a gesture or text edit is in progress the value is held back and
    /// adopted when the local session ends.
    ///
    /// # Errors
    ///
    /// Returns an error if the slide has a different id.
    pub fn sync_from_committed(&mut self, slide: Slide) -> EditorResult<()> {
        if slide.id != self.committed.id {
            return Err(EditorError::SlideNotFound(slide.id.to_string()));
        }
        self.cancel_orphaned_operations(&slide);
        self.committed = slide.clone();
        if self.in_local_session() {
            debug!(slide = %slide.id, "deferring external update until local session ends");
            self.deferred = Some(slide);
        } else {
            self.adopt(slide);
        }
        Ok(())
    }

    fn adopt(&mut self, slide: Slide) {
        self.working = slide;
        if let Some(id) = self.selected {
            if self.working.element(id).is_none() {
                self.set_selected(None);
            }
        }
        if let Some(menu) = self.context_menu {
            if self.working.element(menu.element_id).is_none() {
                self.context_menu = None;
            }
        }
    }

    fn cancel_orphaned_operations(&mut self, slide: &Slide) {
        self.pending.retain(|op, kind| match kind.element_id() {
            Some(element_id) if slide.element(element_id).is_none() => {
                debug!(operation = %op, element = %element_id, "cancelling operation on removed element");
                false
            }
            _ => true,
        });
    }

    /// Push the working copy as the new committed value.
    fn commit(&mut self) {
        round_geometry(&self.config, &mut self.working);
        self.committed = self.working.clone();
        info!(
            slide = %self.working.id,
            elements = self.working.elements.len(),
            "slide committed"
        );
        self.outbox.push_back(EditorOutput::Commit(self.working.clone()));
    }

    /// Apply a discrete mutation and commit it.
    ///
    /// During a local session the mutation is applied to both the working
    /// copy and the committed base, and only the base is pushed, so partial
    /// gesture geometry never leaves the editor.
    fn mutate<R>(&mut self, mut change: impl FnMut(&mut Slide) -> R) -> R {
        let result = change(&mut self.working);
        if self.in_local_session() {
            let mut base = self
                .deferred
                .take()
                .unwrap_or_else(|| self.committed.clone());
            change(&mut base);
            round_geometry(&self.config, &mut base);
            self.committed = base.clone();
            info!(slide = %base.id, "slide committed during local session");
            self.outbox.push_back(EditorOutput::Commit(base.clone()));
            self.deferred = Some(base);
        } else {
            self.commit();
        }
        result
    }

    fn set_selected(&mut self, element_id: Option<ElementId>) {
        self.selected = element_id;
        let selection = Selection::from_parts(element_id.map(|_| self.working.id), element_id);
        self.outbox.push_back(EditorOutput::Select(selection));
    }

    /// End any gesture or text edit on `id`, adopting held-back updates once
    /// no local session remains.
    fn release_local_session(&mut self, id: ElementId) {
        let released = self.gestures.release_element(id).is_some();
        let stopped_editing = self.editing == Some(id);
        if stopped_editing {
            self.editing = None;
        }
        if (released || stopped_editing) && !self.in_local_session() {
            if let Some(base) = self.deferred.take() {
                self.adopt(base);
            }
        }
    }

    /// Select an element on this slide, or clear the selection.
    ///
    /// # Errors
    ///
    /// Returns an error if the element is not on the slide.
    pub fn select_element(&mut self, element_id: Option<ElementId>) -> EditorResult<()> {
        if let Some(id) = element_id {
            if self.working.element(id).is_none() {
                return Err(EditorError::ElementNotFound(id.to_string()));
            }
        } else {
            self.context_menu = None;
        }
        self.set_selected(element_id);
        Ok(())
    }

    /// Drop this slide's selection because another slide took it.
    pub fn release_selection(&mut self) {
        self.selected = None;
        self.context_menu = None;
    }

    fn notify(&mut self, kind: NotificationKind, message: String) {
        warn!(slide = %self.working.id, ?kind, %message, "action failed");
        self.outbox
            .push_back(EditorOutput::Notify(Notification { kind, message }));
    }

    // ----- discrete edits -------------------------------------------------

    /// Append an element at the front and commit.
    pub fn add_element(&mut self, element: SlideElement) -> ElementId {
        let id = element.id;
        self.mutate(|slide| {
            slide.add(element.clone());
        });
        id
    }

    /// Add the default text box.
    pub fn add_text_box(&mut self) -> ElementId {
        let element = SlideElement::text_box(&self.palette);
        self.add_element(element)
    }

    /// Add the default rectangle.
    pub fn add_rectangle(&mut self) -> ElementId {
        let element = SlideElement::rectangle(&self.palette);
        self.add_element(element)
    }

    /// Delete an element, cancel its pending operations and clear selection.
    ///
    /// # Errors
    ///
    /// Returns an error if the element is not on the slide.
    pub fn delete_element(&mut self, id: ElementId) -> EditorResult<()> {
        if self.working.element(id).is_none() {
            return Err(EditorError::ElementNotFound(id.to_string()));
        }
        self.release_local_session(id);
        self.pending.retain(|op, kind| {
            let keep = kind.element_id() != Some(id);
            if !keep {
                debug!(operation = %op, element = %id, "cancelling operation on deleted element");
            }
            keep
        });
        self.context_menu = None;
        self.mutate(|slide| {
            let _ = slide.remove(id);
        });
        self.set_selected(None);
        Ok(())
    }

    /// Flip an element's lock. Returns the new state.
    ///
    /// # Errors
    ///
    /// Returns an error if the element is not on the slide.
    pub fn toggle_lock(&mut self, id: ElementId) -> EditorResult<bool> {
        let locked = !self
            .working
            .element(id)
            .ok_or_else(|| EditorError::ElementNotFound(id.to_string()))?
            .is_locked;
        self.mutate(|slide| {
            if let Some(element) = slide.element_mut(id) {
                element.is_locked = locked;
            }
        });
        Ok(locked)
    }

    /// Change an element's z-order. Commits only when the order changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the element is not on the slide.
    pub fn reorder(&mut self, id: ElementId, action: LayerAction) -> EditorResult<bool> {
        let index = self
            .working
            .index_of(id)
            .ok_or_else(|| EditorError::ElementNotFound(id.to_string()))?;
        if action.target_index(index, self.working.elements.len()) == index {
            return Ok(false);
        }
        self.mutate(|slide| slide.reorder(id, action).unwrap_or(false));
        Ok(true)
    }

    /// Merge a partial style into an element and commit.
    ///
    /// # Errors
    ///
    /// Returns an error if the element is not on the slide.
    pub fn apply_style_patch(&mut self, id: ElementId, patch: &ElementStyles) -> EditorResult<()> {
        if self.working.element(id).is_none() {
            return Err(EditorError::ElementNotFound(id.to_string()));
        }
        self.mutate(|slide| {
            if let Some(element) = slide.element_mut(id) {
                element.styles.merge(patch);
            }
        });
        Ok(())
    }

    /// Apply an inspector edit to an element.
    ///
    /// # Errors
    ///
    /// Returns an error if the element is missing or the edit is not valid
    /// for it.
    pub fn apply_style_edit(&mut self, id: ElementId, edit: &StyleEdit) -> EditorResult<()> {
        let element = self
            .working
            .element(id)
            .ok_or_else(|| EditorError::ElementNotFound(id.to_string()))?;
        let patch = StyleInspector::patch_for(element, edit, &self.palette)?;
        self.apply_style_patch(id, &patch)
    }

    /// Show or hide the background.
    pub fn toggle_background_visibility(&mut self) -> bool {
        let visible = !self.working.is_image_visible;
        self.mutate(|slide| slide.is_image_visible = visible);
        visible
    }

    /// Handle a dropped asset payload. Missing or malformed payloads are
    /// ignored. Returns whether the drop was applied.
    pub fn drop_asset(&mut self, payload: &str) -> bool {
        let Some(image) = RealWorldImage::from_payload(payload) else {
            debug!(slide = %self.working.id, "ignoring drop without a usable payload");
            return false;
        };
        let citation = SlideElement::citation(&image.source);
        let url = ImageRef::new(image.url);
        self.mutate(|slide| {
            slide.image_url = Some(url.clone());
            slide.is_image_visible = true;
            slide.add(citation.clone());
        });
        true
    }

    // ----- pointer --------------------------------------------------------

    /// Resolve what a screen point lands on: a resize handle, then the
    /// front-most element, then the canvas.
    ///
    /// # Errors
    ///
    /// Returns an error if the viewport is not measured or the point is not
    /// finite.
    pub fn hit_test(&self, point: Point) -> EditorResult<PointerTarget> {
        if !point.is_finite() {
            return Err(EditorError::InvalidOperation(format!(
                "pointer position ({}, {}) is not finite",
                point.x, point.y
            )));
        }
        let canvas = self
            .viewport
            .to_canvas(point)
            .ok_or(EditorError::ViewportUnmeasured)?;
        let radius = self
            .viewport
            .to_canvas_length(self.config.handle_hit_radius)
            .ok_or(EditorError::ViewportUnmeasured)?;

        let handle = self
            .working
            .elements
            .iter()
            .rev()
            .filter(|e| !e.is_locked)
            .find(|e| e.frame().bottom_right().distance_to(canvas) <= radius);
        if let Some(element) = handle {
            return Ok(PointerTarget::ResizeHandle(element.id));
        }
        Ok(self
            .working
            .element_at(canvas)
            .map_or(PointerTarget::Canvas, |e| PointerTarget::Element(e.id)))
    }

    fn resolve(&self, point: Point, target: PointerTarget) -> EditorResult<PointerTarget> {
        match target {
            PointerTarget::Auto => self.hit_test(point),
            explicit => Ok(explicit),
        }
    }

    /// Primary pointer pressed. Returns whether a gesture started.
    ///
    /// # Errors
    ///
    /// Returns an error if the viewport is unmeasured or the target element
    /// does not exist.
    pub fn pointer_down(&mut self, point: Point, target: PointerTarget) -> EditorResult<bool> {
        if !self.viewport.is_measured() {
            return Err(EditorError::ViewportUnmeasured);
        }
        let target = self.resolve(point, target)?;
        self.context_menu = None;

        if let Some(editing) = self.editing {
            if target == PointerTarget::Element(editing) {
                return Ok(false);
            }
            self.finish_text_edit();
        }

        match target {
            PointerTarget::Auto | PointerTarget::Canvas => {
                self.selected = None;
                self.outbox.push_back(EditorOutput::ClearSelection);
                Ok(false)
            }
            PointerTarget::Element(id) => {
                let element = self
                    .working
                    .element(id)
                    .ok_or_else(|| EditorError::ElementNotFound(id.to_string()))?;
                if element.is_locked {
                    debug!(element = %id, "pointer down on locked element");
                    self.set_selected(Some(id));
                    return Ok(false);
                }
                let started = self
                    .gestures
                    .begin_move(element, point, &self.viewport)
                    .is_some();
                self.set_selected(Some(id));
                Ok(started)
            }
            PointerTarget::ResizeHandle(id) => {
                let element = self
                    .working
                    .element(id)
                    .ok_or_else(|| EditorError::ElementNotFound(id.to_string()))?;
                Ok(self
                    .gestures
                    .begin_resize(element, point, &self.viewport)
                    .is_some())
            }
        }
    }

    /// Pointer moved. Updates the working copy only.
    pub fn drag_to(&mut self, point: Point) -> bool {
        let Some(session) = self.gestures.session().copied() else {
            return false;
        };
        let targets = self.working.snap_targets(session.element_id);
        let Some((id, frame)) =
            self.gestures
                .update(session.capture, point, &self.viewport, &targets, &self.config)
        else {
            return false;
        };
        if let Some(element) = self.working.element_mut(id) {
            element.set_frame(frame);
            true
        } else {
            self.gestures.cancel();
            false
        }
    }

    /// Pointer released. Commits the gesture's geometry, rebased onto any
    /// update that arrived meanwhile. Returns whether a commit happened.
    pub fn pointer_up(&mut self, point: Point) -> bool {
        let Some(session) = self.gestures.session().copied() else {
            return false;
        };
        self.drag_to(point);
        let frame = self.working.element(session.element_id).map(SlideElement::frame);
        self.gestures.finish(session.capture);

        if let Some(base) = self.deferred.take() {
            self.adopt(base);
            let Some(frame) = frame else {
                return false;
            };
            return match self.working.element_mut(session.element_id) {
                Some(element) if element.frame() != frame => {
                    element.set_frame(frame);
                    self.commit();
                    true
                }
                _ => false,
            };
        }

        match frame {
            Some(frame) if frame != session.original => {
                self.commit();
                true
            }
            _ => false,
        }
    }

    /// Abandon the gesture and restore the element's original geometry.
    pub fn cancel_gesture(&mut self) -> bool {
        let Some(session) = self.gestures.cancel() else {
            return false;
        };
        if let Some(element) = self.working.element_mut(session.element_id) {
            element.set_frame(session.original);
        }
        if let Some(base) = self.deferred.take() {
            self.adopt(base);
        }
        debug!(element = %session.element_id, "gesture cancelled");
        true
    }

    // ----- text editing ---------------------------------------------------

    /// Enter inline edit mode on an unlocked text element.
    pub fn begin_text_edit(&mut self, id: ElementId) -> bool {
        if self.gestures.is_active() {
            return false;
        }
        match self.working.element(id) {
            Some(element) if element.is_text() && !element.is_locked => {}
            _ => return false,
        }
        if self.editing.is_some_and(|current| current != id) {
            self.finish_text_edit();
        }
        self.editing = Some(id);
        if self.selected != Some(id) {
            self.set_selected(Some(id));
        }
        true
    }

    /// Replace the content of the element being edited. Working copy only.
    pub fn edit_text(&mut self, content: &str) -> bool {
        let Some(id) = self.editing else {
            return false;
        };
        match self.working.element_mut(id).map(|e| &mut e.kind) {
            Some(ElementKind::Text { content: current }) => {
                content.clone_into(current);
                true
            }
            _ => false,
        }
    }

    /// Leave edit mode and commit the content if it changed.
    pub fn finish_text_edit(&mut self) -> bool {
        let Some(id) = self.editing.take() else {
            return false;
        };
        let content = match self.working.element(id).map(|e| &e.kind) {
            Some(ElementKind::Text { content }) => Some(content.clone()),
            _ => None,
        };
        if let Some(base) = self.deferred.take() {
            self.adopt(base);
        }
        let Some(content) = content else {
            return false;
        };
        let committed = match self.committed.element(id).map(|e| &e.kind) {
            Some(ElementKind::Text { content }) => Some(content.as_str()),
            _ => None,
        };
        if committed == Some(content.as_str()) {
            if let Some(ElementKind::Text { content: current }) =
                self.working.element_mut(id).map(|e| &mut e.kind)
            {
                current.clone_from(&content);
            }
            return false;
        }
        let updated = match self.working.element_mut(id).map(|e| &mut e.kind) {
            Some(ElementKind::Text { content: current }) => {
                *current = content;
                true
            }
            _ => false,
        };
        if updated {
            self.commit();
        }
        updated
    }

    /// Double click: enter text editing on the element under the pointer.
    ///
    /// # Errors
    ///
    /// Returns an error if hit-testing needs an unmeasured viewport.
    pub fn double_click(&mut self, point: Point, target: PointerTarget) -> EditorResult<bool> {
        match self.resolve(point, target)? {
            PointerTarget::Element(id) => Ok(self.begin_text_edit(id)),
            _ => Ok(false),
        }
    }

    // ----- context menu & keyboard ---------------------------------------

    /// Secondary click: select the element and open its menu.
    ///
    /// # Errors
    ///
    /// Returns an error if hit-testing needs an unmeasured viewport or the
    /// element does not exist.
    pub fn open_context_menu(&mut self, point: Point, target: PointerTarget) -> EditorResult<bool> {
        let id = match self.resolve(point, target)? {
            PointerTarget::Element(id) | PointerTarget::ResizeHandle(id) => id,
            PointerTarget::Auto | PointerTarget::Canvas => return Ok(false),
        };
        if self.working.element(id).is_none() {
            return Err(EditorError::ElementNotFound(id.to_string()));
        }
        self.set_selected(Some(id));
        self.context_menu = Some(ContextMenu {
            anchor: point,
            element_id: id,
        });
        Ok(true)
    }

    /// Dismiss the context menu.
    pub fn close_context_menu(&mut self) {
        self.context_menu = None;
    }

    /// Run a context menu action; the menu closes afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the menu's element no longer exists.
    pub fn choose_menu_action(&mut self, action: MenuAction) -> EditorResult<Option<PendingOperation>> {
        let Some(menu) = self.context_menu.take() else {
            debug!(?action, "menu action without an open menu");
            return Ok(None);
        };
        let id = menu.element_id;
        match action {
            MenuAction::Layer(layer) => {
                self.reorder(id, layer)?;
            }
            MenuAction::ToggleLock => {
                self.toggle_lock(id)?;
            }
            MenuAction::RemoveBackground => return self.begin_background_removal(id),
            MenuAction::Delete => self.delete_element(id)?,
        }
        Ok(None)
    }

    /// Keyboard input. Delete and Backspace remove the selected unlocked
    /// element unless text is being edited.
    ///
    /// # Errors
    ///
    /// Returns an error if the selected element vanished.
    pub fn key_down(&mut self, key: &str) -> EditorResult<bool> {
        if self.editing.is_some() || !matches!(key, "Delete" | "Backspace") {
            return Ok(false);
        }
        let Some(id) = self.selected else {
            return Ok(false);
        };
        if self.working.element(id).is_some_and(|e| e.is_locked) {
            debug!(element = %id, "delete key ignored on locked element");
            return Ok(false);
        }
        self.delete_element(id)?;
        Ok(true)
    }

    // ----- asynchronous operations ---------------------------------------

    fn register(&mut self, kind: PendingKind) -> PendingOperation {
        let op = PendingOperation {
            id: OperationId::new(),
            slide_id: self.working.id,
            kind,
        };
        debug!(operation = %op.id, slide = %op.slide_id, "operation started");
        self.pending.insert(op.id, op.kind.clone());
        op
    }

    /// Insert a placeholder image element and request an image for it.
    /// Returns `None` for an empty prompt.
    pub fn begin_image_element(&mut self, prompt: &str) -> Option<PendingOperation> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return None;
        }
        let element_id = self.add_element(SlideElement::image_placeholder());
        Some(self.register(PendingKind::ImageElement {
            element_id,
            prompt: prompt.to_string(),
        }))
    }

    /// Request a background cut-out for an image element.
    ///
    /// Returns `None` when the element has no resolved image or is already
    /// being processed.
    ///
    /// # Errors
    ///
    /// Returns an error if the element is not on the slide.
    pub fn begin_background_removal(&mut self, id: ElementId) -> EditorResult<Option<PendingOperation>> {
        let element = self
            .working
            .element(id)
            .ok_or_else(|| EditorError::ElementNotFound(id.to_string()))?;
        let Some(source) = element.image_url().cloned() else {
            return Ok(None);
        };
        if self.is_processing(id) {
            return Ok(None);
        }
        self.context_menu = None;
        Ok(Some(self.register(PendingKind::BackgroundRemoval {
            element_id: id,
            source,
        })))
    }

    /// Background removal for the selected element, if it is an unlocked
    /// image.
    ///
    /// # Errors
    ///
    /// Returns an error if the selected element vanished.
    pub fn begin_remove_selected_background(&mut self) -> EditorResult<Option<PendingOperation>> {
        match self.selected.and_then(|id| self.working.element(id)) {
            Some(element) if !element.is_locked => self.begin_background_removal(element.id),
            _ => Ok(None),
        }
    }

    /// Regenerate the slide background from a new description. Returns
    /// `None` when a regeneration is already running.
    pub fn begin_background_regeneration(&mut self, description: &str) -> Option<PendingOperation> {
        let busy = self
            .pending
            .values()
            .any(|kind| matches!(kind, PendingKind::BackgroundRegeneration { .. }));
        if busy {
            return None;
        }
        let previous_description = self.working.visual_description.clone();
        let description = description.trim().to_string();
        self.mutate(|slide| {
            slide.is_regenerating = true;
            slide.visual_description.clone_from(&description);
        });
        Some(self.register(PendingKind::BackgroundRegeneration {
            previous_description,
            description,
        }))
    }

    /// Regenerate the background with the current concept in a different
    /// material and lighting.
    pub fn begin_background_restyle(
        &mut self,
        material: &str,
        lighting: &str,
    ) -> Option<PendingOperation> {
        let prompt = VisualPrompt {
            material: material.to_string(),
            lighting: lighting.to_string(),
            ..VisualPrompt::parse(&self.working.visual_description)
        };
        self.begin_background_regeneration(&prompt.to_string())
    }

    /// Apply the outcome of an operation.
    pub fn complete(
        &mut self,
        id: OperationId,
        result: Result<ImageRef, ServiceError>,
    ) -> Completion {
        let Some(kind) = self.pending.remove(&id) else {
            debug!(operation = %id, "dropping result of cancelled operation");
            return Completion::Stale;
        };
        let result = result.and_then(|image| {
            if image.is_empty() {
                Err(ServiceError::Generation("no image was returned".into()))
            } else {
                Ok(image)
            }
        });

        match (kind, result) {
            (PendingKind::ImageElement { element_id, .. }, Ok(image)) => {
                self.mutate(|slide| {
                    if let Some(element) = slide.element_mut(element_id) {
                        element.kind = ElementKind::Image {
                            image_url: Some(image.clone()),
                        };
                    }
                });
                Completion::Applied
            }
            (PendingKind::ImageElement { element_id, .. }, Err(err)) => {
                self.release_local_session(element_id);
                if self.selected == Some(element_id) {
                    self.set_selected(None);
                }
                self.mutate(|slide| {
                    let _ = slide.remove(element_id);
                });
                self.notify(
                    NotificationKind::ImageGeneration,
                    format!("Image generation failed: {err}"),
                );
                Completion::RolledBack
            }
            (PendingKind::BackgroundRemoval { element_id, .. }, Ok(image)) => {
                self.mutate(|slide| {
                    if let Some(element) = slide.element_mut(element_id) {
                        element.kind = ElementKind::Image {
                            image_url: Some(image.clone()),
                        };
                    }
                });
                Completion::Applied
            }
            (PendingKind::BackgroundRemoval { .. }, Err(err)) => {
                self.notify(NotificationKind::BackgroundRemoval, err.to_string());
                Completion::RolledBack
            }
            (PendingKind::BackgroundRegeneration { .. }, Ok(image)) => {
                self.mutate(|slide| {
                    slide.image_url = Some(image.clone());
                    slide.is_regenerating = false;
                });
                Completion::Applied
            }
            (
                PendingKind::BackgroundRegeneration {
                    previous_description,
                    ..
                },
                Err(err),
            ) => {
                self.mutate(|slide| {
                    slide.is_regenerating = false;
                    slide.visual_description.clone_from(&previous_description);
                });
                self.notify(
                    NotificationKind::BackgroundRegeneration,
                    format!("Image generation failed: {err}"),
                );
                Completion::RolledBack
            }
        }
    }

    /// Run an operation to completion against `service`.
    pub async fn run_operation(
        &mut self,
        op: &PendingOperation,
        service: &dyn ImageService,
    ) -> Completion {
        let palette = self.palette.clone();
        let result = op.execute(service, &palette).await;
        self.complete(op.id, result)
    }

    // ----- dispatch -------------------------------------------------------

    fn toolbox(&mut self, action: ToolboxAction) -> EditorResult<Option<PendingOperation>> {
        match action {
            ToolboxAction::AddText => {
                self.add_text_box();
            }
            ToolboxAction::AddShape => {
                self.add_rectangle();
            }
            ToolboxAction::GenerateImage { prompt } => return Ok(self.begin_image_element(&prompt)),
            ToolboxAction::ToggleBackground => {
                self.toggle_background_visibility();
            }
            ToolboxAction::RemoveBackground => return self.begin_remove_selected_background(),
            ToolboxAction::RegenerateBackground { description } => {
                return Ok(self.begin_background_regeneration(&description));
            }
            ToolboxAction::RestyleBackground { material, lighting } => {
                return Ok(self.begin_background_restyle(&material, &lighting));
            }
        }
        Ok(None)
    }

    /// Route an input event. Returns an operation the host must run, if the
    /// event started one.
    ///
    /// # Errors
    ///
    /// Returns an error when the event cannot be applied to this slide.
    pub fn handle(&mut self, input: EditorInput) -> EditorResult<Option<PendingOperation>> {
        if input.position().is_some_and(|p| !p.is_finite()) {
            debug!(slide = %self.working.id, ?input, "ignoring non-finite pointer event");
            return Ok(None);
        }
        match input {
            EditorInput::PointerDown { x, y, target } => {
                self.pointer_down(Point::new(x, y), target)?;
            }
            EditorInput::PointerMove { x, y } => {
                self.drag_to(Point::new(x, y));
            }
            EditorInput::PointerUp { x, y } => {
                self.pointer_up(Point::new(x, y));
            }
            EditorInput::PointerCancel => {
                self.cancel_gesture();
            }
            EditorInput::DoubleClick { x, y, target } => {
                self.double_click(Point::new(x, y), target)?;
            }
            EditorInput::ContextMenu { x, y, target } => {
                self.open_context_menu(Point::new(x, y), target)?;
            }
            EditorInput::Key { key } => {
                self.key_down(&key)?;
            }
            EditorInput::TextInput { content } => {
                self.edit_text(&content);
            }
            EditorInput::Blur => {
                self.finish_text_edit();
            }
            EditorInput::Drop { payload } => {
                self.drop_asset(&payload);
            }
            EditorInput::MenuAction { action } => return self.choose_menu_action(action),
            EditorInput::CloseMenu => self.close_context_menu(),
            EditorInput::Toolbox(action) => return self.toolbox(action),
            EditorInput::ContainerResized { width } => {
                self.observe_container_width(width);
            }
        }
        Ok(None)
    }
}

fn round_geometry(config: &EditorConfig, slide: &mut Slide) {
    if config.round_on_commit {
        for element in &mut slide.elements {
            element.set_frame(element.frame().rounded());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Frame;
    use crate::library::SlideStyle;

    fn text(frame: Frame) -> SlideElement {
        SlideElement::new(
            ElementKind::Text {
                content: "Headline".into(),
            },
            frame,
        )
    }

    fn editor_with(elements: Vec<SlideElement>) -> SlideEditor {
        let mut slide = Slide::new(1, SlideStyle::Analyst);
        slide.elements = elements;
        let mut editor = SlideEditor::new(slide, Palette::default());
        editor.observe_container_width(1080.0);
        editor
    }

    fn commits(outputs: &[EditorOutput]) -> Vec<&Slide> {
        outputs
            .iter()
            .filter_map(|o| match o {
                EditorOutput::Commit(slide) => Some(slide),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_moves_do_not_commit_until_pointer_up() {
        let el = text(Frame::new(100.0, 100.0, 300.0, 50.0));
        let id = el.id;
        let mut editor = editor_with(vec![el]);

        assert!(editor
            .pointer_down(Point::new(110.0, 110.0), PointerTarget::Auto)
            .expect("measured"));
        editor.drain_outputs();
        for dx in [7.0, 14.0, 21.0, 28.0, 35.0] {
            assert!(editor.drag_to(Point::new(110.0 + dx, 110.0)));
        }
        assert!(commits(&editor.drain_outputs()).is_empty());
        assert!((editor.slide().element(id).expect("present").x - 135.0).abs() < f32::EPSILON);
        assert!((editor.committed().element(id).expect("present").x - 100.0).abs() < f32::EPSILON);

        assert!(editor.pointer_up(Point::new(145.0, 110.0)));
        let outputs = editor.drain_outputs();
        let committed = commits(&outputs);
        assert_eq!(committed.len(), 1);
        assert!((committed[0].element(id).expect("present").x - 135.0).abs() < f32::EPSILON);
        assert!(editor.guides().is_empty());
    }

    #[test]
    fn test_commit_rounds_geometry() {
        let el = text(Frame::new(0.0, 0.0, 100.0, 40.0));
        let id = el.id;
        let mut editor = editor_with(vec![el]);
        editor.observe_container_width(540.0);
        editor
            .pointer_down(Point::new(5.0, 5.0), PointerTarget::Element(id))
            .expect("down");
        // 55.3 screen px is 110.6 canvas units at scale 0.5
        editor.pointer_up(Point::new(55.3, 5.0));
        let frame = editor.committed().element(id).expect("present").frame();
        assert_eq!(frame, frame.rounded());
        assert!((frame.x - 101.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_external_update_during_drag_is_rebased() {
        let a = text(Frame::new(100.0, 100.0, 200.0, 50.0));
        let b = text(Frame::new(600.0, 900.0, 200.0, 50.0));
        let (a_id, b_id) = (a.id, b.id);
        let mut editor = editor_with(vec![a, b]);

        editor
            .pointer_down(Point::new(110.0, 110.0), PointerTarget::Auto)
            .expect("down");
        editor.drag_to(Point::new(160.0, 310.0));

        let mut external = editor.committed().clone();
        external.visual_description = "Liquid chrome city".into();
        external.element_mut(b_id).expect("present").is_locked = true;
        editor.sync_from_committed(external).expect("same slide");
        assert_eq!(editor.slide().visual_description, "");

        assert!(editor.pointer_up(Point::new(160.0, 310.0)));
        let slide = editor.committed();
        assert_eq!(slide.visual_description, "Liquid chrome city");
        assert!(slide.element(b_id).expect("present").is_locked);
        assert_eq!(
            slide.element(a_id).expect("present").frame(),
            Frame::new(150.0, 300.0, 200.0, 50.0)
        );
    }

    #[test]
    fn test_discrete_edit_during_drag_keeps_partial_geometry_private() {
        let a = text(Frame::new(100.0, 100.0, 200.0, 50.0));
        let a_id = a.id;
        let mut editor = editor_with(vec![a]);
        editor
            .pointer_down(Point::new(110.0, 110.0), PointerTarget::Auto)
            .expect("down");
        editor.drag_to(Point::new(310.0, 110.0));
        editor.drain_outputs();

        editor.toggle_background_visibility();
        let outputs = editor.drain_outputs();
        let pushed = commits(&outputs);
        assert_eq!(pushed.len(), 1);
        assert!((pushed[0].element(a_id).expect("present").x - 100.0).abs() < f32::EPSILON);
        assert!(editor.slide().is_image_visible);

        editor.pointer_up(Point::new(310.0, 110.0));
        let slide = editor.committed();
        assert!(slide.is_image_visible);
        assert!((slide.element(a_id).expect("present").x - 300.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_cancel_restores_original_geometry() {
        let el = text(Frame::new(100.0, 100.0, 300.0, 50.0));
        let id = el.id;
        let mut editor = editor_with(vec![el]);
        editor
            .pointer_down(Point::new(120.0, 120.0), PointerTarget::Auto)
            .expect("down");
        editor.drag_to(Point::new(500.0, 500.0));
        assert!(editor.cancel_gesture());
        assert_eq!(
            editor.slide().element(id).expect("present").frame(),
            Frame::new(100.0, 100.0, 300.0, 50.0)
        );
        assert!(!editor.is_dragging());
    }

    #[test]
    fn test_text_edit_commits_on_blur_only() {
        let el = text(Frame::new(100.0, 100.0, 300.0, 50.0));
        let id = el.id;
        let mut editor = editor_with(vec![el]);
        assert!(editor.begin_text_edit(id));
        editor.drain_outputs();

        assert!(editor.edit_text("Breaking"));
        assert!(editor.edit_text("Breaking news"));
        assert!(commits(&editor.drain_outputs()).is_empty());

        // drag start is suppressed on the element being edited
        assert!(!editor
            .pointer_down(Point::new(150.0, 120.0), PointerTarget::Auto)
            .expect("down"));

        assert!(editor.finish_text_edit());
        let outputs = editor.drain_outputs();
        let pushed = commits(&outputs);
        assert_eq!(pushed.len(), 1);
        assert!(matches!(
            &pushed[0].element(id).expect("present").kind,
            ElementKind::Text { content } if content == "Breaking news"
        ));
        assert_eq!(editor.editing(), None);
    }

    #[test]
    fn test_locked_or_non_text_cannot_be_edited() {
        let locked = text(Frame::new(0.0, 0.0, 100.0, 100.0)).with_locked(true);
        let shape = SlideElement::rectangle(&Palette::default());
        let (locked_id, shape_id) = (locked.id, shape.id);
        let mut editor = editor_with(vec![locked, shape]);
        assert!(!editor.begin_text_edit(locked_id));
        assert!(!editor.begin_text_edit(shape_id));
    }

    #[test]
    fn test_hit_test_prefers_handle_then_front_element() {
        let back = text(Frame::new(0.0, 0.0, 200.0, 200.0));
        let front = text(Frame::new(100.0, 100.0, 200.0, 200.0));
        let (back_id, front_id) = (back.id, front.id);
        let editor = editor_with(vec![back, front]);

        assert_eq!(
            editor.hit_test(Point::new(150.0, 150.0)).expect("measured"),
            PointerTarget::Element(front_id)
        );
        assert_eq!(
            editor.hit_test(Point::new(50.0, 50.0)).expect("measured"),
            PointerTarget::Element(back_id)
        );
        assert_eq!(
            editor.hit_test(Point::new(296.0, 297.0)).expect("measured"),
            PointerTarget::ResizeHandle(front_id)
        );
        assert_eq!(
            editor.hit_test(Point::new(900.0, 900.0)).expect("measured"),
            PointerTarget::Canvas
        );
    }

    #[test]
    fn test_pointer_down_requires_measured_viewport() {
        let mut slide = Slide::new(1, SlideStyle::Analyst);
        slide.add(text(Frame::new(0.0, 0.0, 100.0, 100.0)));
        let mut editor = SlideEditor::new(slide, Palette::default());
        let err = editor
            .pointer_down(Point::new(10.0, 10.0), PointerTarget::Auto)
            .unwrap_err();
        assert!(matches!(err, EditorError::ViewportUnmeasured));
    }

    #[test]
    fn test_canvas_click_clears_selection_and_menu() {
        let el = text(Frame::new(0.0, 0.0, 100.0, 100.0));
        let id = el.id;
        let mut editor = editor_with(vec![el]);
        editor
            .open_context_menu(Point::new(10.0, 10.0), PointerTarget::Auto)
            .expect("menu");
        assert_eq!(editor.selected(), Some(id));
        assert!(editor.context_menu().is_some());

        editor
            .pointer_down(Point::new(800.0, 800.0), PointerTarget::Auto)
            .expect("down");
        assert_eq!(editor.selected(), None);
        assert!(editor.context_menu().is_none());
        assert!(editor
            .drain_outputs()
            .contains(&EditorOutput::ClearSelection));
    }

    #[test]
    fn test_drop_sets_background_and_citation() {
        let mut editor = editor_with(vec![]);
        assert!(!editor.drop_asset(""));
        assert!(!editor.drop_asset("not json"));
        assert!(editor.drain_outputs().is_empty());

        assert!(editor.drop_asset(r#"{"url":"https://cdn/a.jpg","source":"AP"}"#));
        let slide = editor.committed();
        assert_eq!(slide.background().map(ImageRef::as_str), Some("https://cdn/a.jpg"));
        assert!(slide.is_image_visible);
        assert_eq!(slide.elements.len(), 1);
        assert_eq!(
            slide.elements[0].frame(),
            Frame::new(820.0, 1395.0, 240.0, 30.0)
        );
    }

    #[test]
    fn test_menu_actions_close_menu() {
        let a = text(Frame::new(0.0, 0.0, 100.0, 100.0));
        let b = text(Frame::new(300.0, 300.0, 100.0, 100.0));
        let a_id = a.id;
        let mut editor = editor_with(vec![a, b]);
        editor
            .open_context_menu(Point::new(10.0, 10.0), PointerTarget::Auto)
            .expect("menu");
        let labels: Vec<_> = editor.context_menu_items().iter().map(|i| i.label).collect();
        assert!(labels.contains(&"Lock"));
        assert!(!labels.contains(&"Remove Background"));

        editor
            .choose_menu_action(MenuAction::Layer(LayerAction::BringToFront))
            .expect("reorder");
        assert!(editor.context_menu().is_none());
        assert_eq!(editor.committed().index_of(a_id), Some(1));

        editor
            .open_context_menu(Point::new(10.0, 10.0), PointerTarget::Element(a_id))
            .expect("menu");
        editor.choose_menu_action(MenuAction::ToggleLock).expect("lock");
        assert!(editor.committed().element(a_id).expect("present").is_locked);
    }

    #[test]
    fn test_style_edit_merges_and_commits() {
        let palette = Palette::default();
        let el = SlideElement::text_box(&palette);
        let id = el.id;
        let mut editor = editor_with(vec![el]);
        editor
            .apply_style_edit(id, &StyleEdit::FontSize(64))
            .expect("valid edit");
        let styles = &editor.committed().element(id).expect("present").styles;
        assert_eq!(styles.font_size, Some(64));
        assert_eq!(styles.color.as_deref(), Some("#FFFFFF"));

        let err = editor
            .apply_style_edit(id, &StyleEdit::TextColor("#000001".into()))
            .unwrap_err();
        assert!(matches!(err, EditorError::ColorNotInPalette(_)));
    }

    #[test]
    fn test_external_removal_cancels_operations() {
        let mut editor = editor_with(vec![]);
        let op = editor.begin_image_element("a glass brain").expect("started");
        let PendingKind::ImageElement { element_id, .. } = op.kind else {
            panic!("wrong kind");
        };
        assert!(editor.is_processing(element_id));

        let mut external = editor.committed().clone();
        external.elements.clear();
        editor.sync_from_committed(external).expect("same slide");
        assert!(!editor.is_processing(element_id));
        assert_eq!(
            editor.complete(op.id, Ok(ImageRef::new("data:image/png;base64,AA"))),
            Completion::Stale
        );
        assert!(editor.committed().elements.is_empty());
    }

    #[test]
    fn test_regeneration_failure_restores_description() {
        let mut slide = Slide::new(1, SlideStyle::Spotlight);
        slide.visual_description = "Obsidian monolith".into();
        let mut editor = SlideEditor::new(slide, Palette::default());

        let op = editor
            .begin_background_regeneration("Holographic mesh skyline")
            .expect("started");
        assert!(editor.committed().is_regenerating);
        assert!(editor.begin_background_regeneration("again").is_none());

        let outcome = editor.complete(op.id, Err(ServiceError::Generation("quota".into())));
        assert_eq!(outcome, Completion::RolledBack);
        let slide = editor.committed();
        assert!(!slide.is_regenerating);
        assert_eq!(slide.visual_description, "Obsidian monolith");
        assert!(editor.drain_outputs().iter().any(|o| matches!(
            o,
            EditorOutput::Notify(Notification {
                kind: NotificationKind::BackgroundRegeneration,
                ..
            })
        )));
    }

    #[test]
    fn test_restyle_keeps_concept() {
        let mut slide = Slide::new(1, SlideStyle::Spotlight);
        slide.visual_description = "A cracked hourglass. Obsidian texture.".into();
        let mut editor = SlideEditor::new(slide, Palette::default());

        let op = editor
            .handle(EditorInput::Toolbox(ToolboxAction::RestyleBackground {
                material: "Liquid Chrome".into(),
                lighting: "Cinematic".into(),
            }))
            .expect("toolbox")
            .expect("started");
        let expected = "A cracked hourglass. A metaphorical representation using a Liquid Chrome texture with Cinematic lighting.";
        assert_eq!(editor.committed().visual_description, expected);
        assert!(matches!(
            op.kind,
            PendingKind::BackgroundRegeneration { ref description, .. } if description == expected
        ));

        let outcome = editor.complete(op.id, Ok(ImageRef::new("https://img.test/bg.png")));
        assert_eq!(outcome, Completion::Applied);
        assert_eq!(
            editor.committed().image_url.as_ref().map(ImageRef::as_str),
            Some("https://img.test/bg.png")
        );
        assert!(!editor.committed().is_regenerating);
    }

    #[test]
    fn test_sync_rejects_foreign_slide() {
        let mut editor = editor_with(vec![]);
        let stranger = Slide::new(2, SlideStyle::Map);
        assert!(editor.sync_from_committed(stranger).is_err());
    }
}
