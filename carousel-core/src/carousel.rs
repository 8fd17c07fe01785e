//! Carousel-wide coordination: one [`SlideEditor`] per slide, the single
//! global selection, and splicing of committed slides into the plan.

use std::collections::VecDeque;
use std::fmt;

use tracing::{debug, warn};

use crate::editor::{
    Completion, EditorConfig, EditorOutput, Notification, PendingOperation, SlideEditor,
};
use crate::element::ImageRef;
use crate::event::EditorInput;
use crate::inspector::{InspectorPanel, StyleEdit};
use crate::layering::Selection;
use crate::library::Palette;
use crate::service::{ImageService, ServiceError};
use crate::slide::{CarouselPlan, Slide, SlideId};
use crate::{EditorError, EditorResult};

/// Callback fired with every committed slide.
pub type UpdateCallback = Box<dyn Fn(&Slide) + Send + Sync>;

/// Callback fired whenever the global selection changes.
pub type SelectCallback = Box<dyn Fn(Selection) + Send + Sync>;

/// Editors for every slide of a carousel plus the plan they write back to.
pub struct CarouselEditor {
    plan: CarouselPlan,
    editors: Vec<SlideEditor>,
    selection: Selection,
    palette: Palette,
    notifications: VecDeque<Notification>,
    on_update: Option<UpdateCallback>,
    on_select: Option<SelectCallback>,
}

impl fmt::Debug for CarouselEditor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CarouselEditor")
            .field("plan", &self.plan)
            .field("selection", &self.selection)
            .field("palette", &self.palette.name)
            .field("notifications", &self.notifications.len())
            .finish_non_exhaustive()
    }
}

impl CarouselEditor {
    /// Create editors for every slide of `plan`.
    #[must_use]
    pub fn new(plan: CarouselPlan, palette: Palette) -> Self {
        Self::with_config(plan, palette, &EditorConfig::default())
    }

    /// Create with custom editor configuration.
    #[must_use]
    pub fn with_config(plan: CarouselPlan, palette: Palette, config: &EditorConfig) -> Self {
        let editors = plan
            .slides()
            .iter()
            .map(|slide| SlideEditor::with_config(slide.clone(), palette.clone(), config.clone()))
            .collect();
        Self {
            plan,
            editors,
            selection: Selection::None,
            palette,
            notifications: VecDeque::new(),
            on_update: None,
            on_select: None,
        }
    }

    /// Set the callback for committed slides.
    pub fn set_on_update<F>(&mut self, callback: F)
    where
        F: Fn(&Slide) + Send + Sync + 'static,
    {
        self.on_update = Some(Box::new(callback));
    }

    /// Set the callback for selection changes.
    pub fn set_on_select<F>(&mut self, callback: F)
    where
        F: Fn(Selection) + Send + Sync + 'static,
    {
        self.on_select = Some(Box::new(callback));
    }

    /// The plan with every commit applied.
    #[must_use]
    pub const fn plan(&self) -> &CarouselPlan {
        &self.plan
    }

    /// Active palette.
    #[must_use]
    pub const fn palette(&self) -> &Palette {
        &self.palette
    }

    /// The global selection.
    #[must_use]
    pub const fn selection(&self) -> Selection {
        self.selection
    }

    /// Slide id at a narrative position.
    #[must_use]
    pub fn slide_id_at(&self, index: usize) -> Option<SlideId> {
        self.editors.get(index).map(SlideEditor::id)
    }

    /// Editor of a slide.
    #[must_use]
    pub fn editor(&self, slide_id: SlideId) -> Option<&SlideEditor> {
        self.editors.iter().find(|e| e.id() == slide_id)
    }

    fn position(&self, slide_id: SlideId) -> EditorResult<usize> {
        self.editors
            .iter()
            .position(|e| e.id() == slide_id)
            .ok_or_else(|| EditorError::SlideNotFound(slide_id.to_string()))
    }

    /// Record the container width on every slide.
    pub fn observe_container_width(&mut self, width: f32) {
        for editor in &mut self.editors {
            editor.observe_container_width(width);
        }
    }

    /// Deliver an input event to one slide.
    ///
    /// # Errors
    ///
    /// Returns an error if the slide is unknown or the editor rejects the event.
    pub fn dispatch(
        &mut self,
        slide_id: SlideId,
        input: EditorInput,
    ) -> EditorResult<Option<PendingOperation>> {
        let index = self.position(slide_id)?;
        let result = self.editors[index].handle(input);
        self.pump(index);
        result
    }

    /// Route a key press to the slide holding the selection.
    ///
    /// # Errors
    ///
    /// Returns an error if the editor rejects the key.
    pub fn key_down(&mut self, key: &str) -> EditorResult<bool> {
        let Some(slide_id) = self.selection.slide_id() else {
            return Ok(false);
        };
        let index = self.position(slide_id)?;
        let result = self.editors[index].key_down(key);
        self.pump(index);
        result
    }

    /// Replace the global selection.
    ///
    /// # Errors
    ///
    /// Returns an error if the slide or element does not exist.
    pub fn select(&mut self, selection: Selection) -> EditorResult<()> {
        match selection {
            Selection::Element {
                slide_id,
                element_id,
            } => {
                let index = self.position(slide_id)?;
                self.editors[index].select_element(Some(element_id))?;
                self.pump(index);
            }
            Selection::None => self.clear_selection(),
        }
        Ok(())
    }

    /// Clear the selection wherever it is.
    pub fn clear_selection(&mut self) {
        let Some(index) = self
            .selection
            .slide_id()
            .and_then(|id| self.position(id).ok())
        else {
            return;
        };
        if self.editors[index].select_element(None).is_ok() {
            self.pump(index);
        }
    }

    /// Apply a value for a slide that changed outside the editors.
    ///
    /// # Errors
    ///
    /// Returns an error if no slide has that id.
    pub fn apply_external_update(&mut self, slide: Slide) -> EditorResult<()> {
        let index = self.position(slide.id)?;
        self.editors[index].sync_from_committed(slide.clone())?;
        self.plan.apply_update(slide)?;
        self.pump(index);
        Ok(())
    }

    /// Inspector panel for the selected element.
    #[must_use]
    pub fn inspector(&self) -> Option<InspectorPanel> {
        self.editor(self.selection.slide_id()?)?.inspector()
    }

    /// Apply an inspector edit to the selected element.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing is selected or the edit is invalid.
    pub fn apply_style_edit(&mut self, edit: &StyleEdit) -> EditorResult<()> {
        let Selection::Element {
            slide_id,
            element_id,
        } = self.selection
        else {
            return Err(EditorError::InvalidOperation("no element selected".into()));
        };
        let index = self.position(slide_id)?;
        let result = self.editors[index].apply_style_edit(element_id, edit);
        self.pump(index);
        result
    }

    /// Close the inspector: clears the selection without touching any slide.
    pub fn close_inspector(&mut self) {
        self.clear_selection();
    }

    /// Report the outcome of an operation started by a slide.
    pub fn complete(
        &mut self,
        op: &PendingOperation,
        result: Result<ImageRef, ServiceError>,
    ) -> Completion {
        let Ok(index) = self.position(op.slide_id) else {
            debug!(operation = %op.id, "operation for unknown slide");
            return Completion::Stale;
        };
        let completion = self.editors[index].complete(op.id, result);
        self.pump(index);
        completion
    }

    /// Run an operation against `service` and apply its outcome.
    pub async fn run_operation(
        &mut self,
        op: &PendingOperation,
        service: &dyn ImageService,
    ) -> Completion {
        let result = op.execute(service, &self.palette).await;
        self.complete(op, result)
    }

    /// Take the failure notifications raised since the last call.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain(..).collect()
    }

    fn pump(&mut self, index: usize) {
        let origin = self.editors[index].id();
        for output in self.editors[index].drain_outputs() {
            match output {
                EditorOutput::Commit(slide) => {
                    if let Err(err) = self.plan.apply_update(slide.clone()) {
                        warn!(slide = %slide.id, error = %err, "commit for slide outside plan");
                        continue;
                    }
                    if let Some(callback) = &self.on_update {
                        callback(&slide);
                    }
                }
                EditorOutput::Select(selection) => self.set_selection(origin, selection),
                EditorOutput::ClearSelection => {
                    for editor in &mut self.editors {
                        editor.release_selection();
                    }
                    self.publish_selection(Selection::None);
                }
                EditorOutput::Notify(notification) => self.notifications.push_back(notification),
            }
        }
    }

    fn set_selection(&mut self, origin: SlideId, selection: Selection) {
        let next = match selection {
            Selection::Element { slide_id, .. } => {
                for editor in &mut self.editors {
                    if editor.id() != slide_id {
                        editor.release_selection();
                    }
                }
                selection
            }
            // a slide clearing its own selection must not clear another's
            Selection::None if self.selection.slide_id() == Some(origin) => Selection::None,
            Selection::None => return,
        };
        self.publish_selection(next);
    }

    fn publish_selection(&mut self, next: Selection) {
        if next != self.selection {
            self.selection = next;
            debug!(?next, "selection changed");
            if let Some(callback) = &self.on_select {
                callback(next);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::element::{ElementKind, SlideElement};
    use crate::event::PointerTarget;
    use crate::geometry::Frame;
    use crate::library::SlideStyle;

    fn plan() -> CarouselPlan {
        let slides = SlideStyle::ALL[..10]
            .iter()
            .zip(1..)
            .map(|(style, n)| {
                let mut slide = Slide::new(n, *style);
                slide.add(SlideElement::new(
                    ElementKind::Text {
                        content: format!("Slide {n}"),
                    },
                    Frame::new(100.0, 100.0, 300.0, 50.0),
                ));
                slide
            })
            .collect();
        CarouselPlan::new(slides).expect("ten slides")
    }

    fn carousel() -> CarouselEditor {
        let mut carousel = CarouselEditor::new(plan(), Palette::default());
        carousel.observe_container_width(1080.0);
        carousel
    }

    #[test]
    fn test_selection_is_exclusive_across_slides() {
        let mut carousel = carousel();
        let first = carousel.slide_id_at(0).expect("slide");
        let second = carousel.slide_id_at(1).expect("slide");

        carousel
            .dispatch(
                first,
                EditorInput::PointerDown {
                    x: 150.0,
                    y: 120.0,
                    target: PointerTarget::Auto,
                },
            )
            .expect("down");
        carousel
            .dispatch(first, EditorInput::PointerUp { x: 150.0, y: 120.0 })
            .expect("up");
        assert_eq!(carousel.selection().slide_id(), Some(first));

        carousel
            .dispatch(
                second,
                EditorInput::PointerDown {
                    x: 150.0,
                    y: 120.0,
                    target: PointerTarget::Auto,
                },
            )
            .expect("down");
        assert_eq!(carousel.selection().slide_id(), Some(second));
        assert_eq!(carousel.editor(first).expect("editor").selected(), None);

        // empty canvas on any slide clears the single selection
        carousel
            .dispatch(
                first,
                EditorInput::PointerDown {
                    x: 900.0,
                    y: 900.0,
                    target: PointerTarget::Auto,
                },
            )
            .expect("down");
        assert_eq!(carousel.selection(), Selection::None);
        assert_eq!(carousel.editor(second).expect("editor").selected(), None);
        assert!(carousel.inspector().is_none());
    }

    #[test]
    fn test_commits_splice_into_plan_and_fire_callback() {
        let mut carousel = carousel();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        carousel.set_on_update(move |slide| {
            if let Ok(mut seen) = sink.lock() {
                seen.push(slide.id);
            }
        });

        let third = carousel.slide_id_at(2).expect("slide");
        carousel
            .dispatch(third, EditorInput::Toolbox(crate::event::ToolboxAction::AddShape))
            .expect("add");
        assert_eq!(carousel.plan().slide(third).expect("slide").elements.len(), 2);
        assert_eq!(seen.lock().expect("lock").as_slice(), &[third]);
    }

    #[test]
    fn test_inspector_follows_selection() {
        let mut carousel = carousel();
        assert!(carousel.inspector().is_none());
        assert!(carousel.apply_style_edit(&StyleEdit::FontSize(30)).is_err());

        let slide_id = carousel.slide_id_at(4).expect("slide");
        let element_id = carousel.plan().slide(slide_id).expect("slide").elements[0].id;
        carousel
            .select(Selection::Element {
                slide_id,
                element_id,
            })
            .expect("select");
        assert!(matches!(carousel.inspector(), Some(InspectorPanel::Text { .. })));

        carousel
            .apply_style_edit(&StyleEdit::FontSize(30))
            .expect("edit");
        let element = &carousel.plan().slide(slide_id).expect("slide").elements[0];
        assert_eq!(element.styles.font_size, Some(30));

        let before = carousel.plan().clone();
        carousel.close_inspector();
        assert_eq!(carousel.selection(), Selection::None);
        assert_eq!(carousel.plan(), &before);
    }

    #[test]
    fn test_key_down_routes_to_selected_slide() {
        let mut carousel = carousel();
        let slide_id = carousel.slide_id_at(7).expect("slide");
        carousel
            .dispatch(
                slide_id,
                EditorInput::PointerDown {
                    x: 120.0,
                    y: 120.0,
                    target: PointerTarget::Auto,
                },
            )
            .expect("down");
        carousel
            .dispatch(slide_id, EditorInput::PointerUp { x: 120.0, y: 120.0 })
            .expect("up");
        assert!(carousel.key_down("Backspace").expect("delete"));
        assert!(carousel.plan().slide(slide_id).expect("slide").elements.is_empty());
        assert_eq!(carousel.selection(), Selection::None);
        assert!(!carousel.key_down("Delete").expect("nothing selected"));
    }

    #[test]
    fn test_external_update_replaces_slide() {
        let mut carousel = carousel();
        let slide_id = carousel.slide_id_at(0).expect("slide");
        let mut slide = carousel.plan().slide(slide_id).expect("slide").clone();
        slide.elements[0].set_frame(Frame::new(0.0, 0.0, 50.0, 50.0));
        carousel.apply_external_update(slide.clone()).expect("known slide");
        assert_eq!(carousel.editor(slide_id).expect("editor").slide(), &slide);
        assert_eq!(carousel.plan().slide(slide_id), Some(&slide));
    }
}
