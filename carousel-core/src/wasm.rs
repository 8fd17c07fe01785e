//! WebAssembly bindings for carousel-core.
//!
//! Everything crosses the boundary as JSON strings.

use wasm_bindgen::prelude::*;

use crate::carousel::CarouselEditor;
use crate::editor::{PendingKind, PendingOperation};
use crate::element::ImageRef;
use crate::event::EditorInput;
use crate::inspector::StyleEdit;
use crate::layering::Selection;
use crate::library::Palette;
use crate::service::ServiceError;
use crate::slide::{CarouselPlan, Slide};

/// Initialize the editor WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "wasm")]
    console_error_panic_hook::set_once();
}

/// Carousel editor instance for WASM.
#[wasm_bindgen]
pub struct WasmCarouselEditor {
    editor: CarouselEditor,
}

#[wasm_bindgen]
impl WasmCarouselEditor {
    /// Open a plan serialized as JSON, using a built-in palette.
    ///
    /// # Errors
    ///
    /// Returns an error string if the plan is invalid or the palette unknown.
    #[wasm_bindgen(constructor)]
    pub fn new(plan_json: &str, palette_name: &str) -> Result<WasmCarouselEditor, String> {
        let plan = CarouselPlan::from_json(plan_json).map_err(|e| e.to_string())?;
        let palette =
            Palette::by_name(palette_name).ok_or_else(|| format!("unknown palette: {palette_name}"))?;
        Ok(Self {
            editor: CarouselEditor::new(plan, palette),
        })
    }

    /// Get the current plan as JSON.
    #[wasm_bindgen(js_name = getPlanJson)]
    #[must_use]
    pub fn get_plan_json(&self) -> String {
        serde_json::to_string(self.editor.plan()).unwrap_or_default()
    }

    /// Get the rendered (working) slide at `index` as JSON.
    #[wasm_bindgen(js_name = getSlideJson)]
    #[must_use]
    pub fn get_slide_json(&self, index: usize) -> Option<String> {
        let editor = self.editor.editor(self.editor.slide_id_at(index)?)?;
        serde_json::to_string(editor.slide()).ok()
    }

    /// Get the selection as JSON.
    #[wasm_bindgen(js_name = getSelectionJson)]
    #[must_use]
    pub fn get_selection_json(&self) -> String {
        serde_json::to_string(&self.editor.selection()).unwrap_or_default()
    }

    /// Get the inspector panel for the selection as JSON.
    #[wasm_bindgen(js_name = getInspectorJson)]
    #[must_use]
    pub fn get_inspector_json(&self) -> Option<String> {
        serde_json::to_string(&self.editor.inspector()?).ok()
    }

    /// Record the rendered width of the slide container.
    #[wasm_bindgen(js_name = observeContainerWidth)]
    pub fn observe_container_width(&mut self, width: f32) {
        self.editor.observe_container_width(width);
    }

    /// Deliver an input event to the slide at `index`.
    ///
    /// Returns the pending asynchronous operation as JSON, if one started.
    ///
    /// # Errors
    ///
    /// Returns an error string if the event is malformed or rejected.
    #[wasm_bindgen(js_name = dispatchJson)]
    pub fn dispatch_json(&mut self, index: usize, input_json: &str) -> Result<Option<String>, String> {
        let slide_id = self
            .editor
            .slide_id_at(index)
            .ok_or_else(|| format!("no slide at index {index}"))?;
        let input: EditorInput = serde_json::from_str(input_json).map_err(|e| e.to_string())?;
        let pending = self.editor.dispatch(slide_id, input).map_err(|e| e.to_string())?;
        pending
            .map(|op| serde_json::to_string(&op).map_err(|e| e.to_string()))
            .transpose()
    }

    /// Route a key press to the slide holding the selection.
    ///
    /// # Errors
    ///
    /// Returns an error string if the editor rejects the key.
    #[wasm_bindgen(js_name = keyDown)]
    pub fn key_down(&mut self, key: &str) -> Result<bool, String> {
        self.editor.key_down(key).map_err(|e| e.to_string())
    }

    /// Replace the selection from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error string if parsing fails or the target does not exist.
    #[wasm_bindgen(js_name = selectJson)]
    pub fn select_json(&mut self, json: &str) -> Result<(), String> {
        let selection: Selection = serde_json::from_str(json).map_err(|e| e.to_string())?;
        self.editor.select(selection).map_err(|e| e.to_string())
    }

    /// Apply an inspector edit to the selected element.
    ///
    /// # Errors
    ///
    /// Returns an error string if parsing fails or the edit is invalid.
    #[wasm_bindgen(js_name = applyStyleEditJson)]
    pub fn apply_style_edit_json(&mut self, json: &str) -> Result<(), String> {
        let edit: StyleEdit = serde_json::from_str(json).map_err(|e| e.to_string())?;
        self.editor.apply_style_edit(&edit).map_err(|e| e.to_string())
    }

    /// Apply a slide that changed outside the editor.
    ///
    /// # Errors
    ///
    /// Returns an error string if parsing fails or the slide is unknown.
    #[wasm_bindgen(js_name = applyExternalUpdateJson)]
    pub fn apply_external_update_json(&mut self, json: &str) -> Result<(), String> {
        let slide: Slide = serde_json::from_str(json).map_err(|e| e.to_string())?;
        self.editor.apply_external_update(slide).map_err(|e| e.to_string())
    }

    /// Report a successful operation with the produced image URL.
    ///
    /// # Errors
    ///
    /// Returns an error string if the operation JSON is malformed.
    #[wasm_bindgen(js_name = resolveOperation)]
    pub fn resolve_operation(&mut self, op_json: &str, image_url: &str) -> Result<String, String> {
        let op: PendingOperation = serde_json::from_str(op_json).map_err(|e| e.to_string())?;
        let completion = self.editor.complete(&op, Ok(ImageRef::new(image_url)));
        Ok(format!("{completion:?}"))
    }

    /// Report a failed operation.
    ///
    /// # Errors
    ///
    /// Returns an error string if the operation JSON is malformed.
    #[wasm_bindgen(js_name = rejectOperation)]
    pub fn reject_operation(&mut self, op_json: &str, message: &str) -> Result<String, String> {
        let op: PendingOperation = serde_json::from_str(op_json).map_err(|e| e.to_string())?;
        let err = match op.kind {
            PendingKind::BackgroundRemoval { .. } => {
                ServiceError::BackgroundRemoval(message.to_string())
            }
            PendingKind::ImageElement { .. } | PendingKind::BackgroundRegeneration { .. } => {
                ServiceError::Generation(message.to_string())
            }
        };
        let completion = self.editor.complete(&op, Err(err));
        Ok(format!("{completion:?}"))
    }

    /// Take pending failure notifications as a JSON array.
    #[wasm_bindgen(js_name = takeNotificationsJson)]
    #[must_use]
    pub fn take_notifications_json(&mut self) -> String {
        serde_json::to_string(&self.editor.take_notifications()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementKind, SlideElement};
    use crate::geometry::Frame;
    use crate::library::SlideStyle;

    fn plan_json() -> String {
        let slides = (1..=10).map(|n| Slide::new(n, SlideStyle::Analyst)).collect();
        CarouselPlan::new(slides)
            .and_then(|plan| plan.to_json())
            .expect("plan json")
    }

    #[test]
    fn new_rejects_unknown_palette() {
        assert!(WasmCarouselEditor::new(&plan_json(), "Neon Dreams").is_err());
    }

    #[test]
    fn new_rejects_short_plan() {
        assert!(WasmCarouselEditor::new(r#"{"slides":[]}"#, "Eco Report").is_err());
    }

    #[test]
    fn plan_json_round_trips_through_the_binding() {
        let editor = WasmCarouselEditor::new(&plan_json(), "Eco Report").expect("editor");
        let reopened = WasmCarouselEditor::new(&editor.get_plan_json(), "Eco Report");
        assert!(reopened.is_ok());
        assert_eq!(editor.get_selection_json(), r#"{"kind":"none"}"#);
        assert!(editor.get_inspector_json().is_none());
    }

    #[test]
    fn dispatch_adds_text_and_commits() {
        let mut editor = WasmCarouselEditor::new(&plan_json(), "Eco Report").expect("editor");
        let pending = editor
            .dispatch_json(0, r#"{"type":"toolbox","data":{"tool":"addText"}}"#)
            .expect("toolbox");
        assert!(pending.is_none());
        let slide = editor.get_slide_json(0).expect("slide");
        assert!(slide.contains("New Text"));
        assert!(editor.get_plan_json().contains("New Text"));
    }

    #[test]
    fn dispatch_rejects_bad_input() {
        let mut editor = WasmCarouselEditor::new(&plan_json(), "Eco Report").expect("editor");
        assert!(editor.dispatch_json(0, "{ nope }").is_err());
        assert!(editor
            .dispatch_json(42, r#"{"type":"pointerCancel"}"#)
            .is_err());
    }

    #[test]
    fn failed_image_generation_is_reported() {
        let mut editor = WasmCarouselEditor::new(&plan_json(), "Eco Report").expect("editor");
        let op = editor
            .dispatch_json(
                0,
                r#"{"type":"toolbox","data":{"tool":"generateImage","prompt":"robot"}}"#,
            )
            .expect("toolbox")
            .expect("pending operation");
        assert_eq!(editor.reject_operation(&op, "quota").as_deref(), Ok("RolledBack"));
        assert!(editor.take_notifications_json().contains("quota"));
        assert_eq!(editor.resolve_operation(&op, "https://x/y.png").as_deref(), Ok("Stale"));
    }

    #[test]
    fn rejected_background_removal_is_reported_as_removal() {
        let mut slides: Vec<Slide> = (1..=10).map(|n| Slide::new(n, SlideStyle::Analyst)).collect();
        let element_id = slides[0].add(SlideElement::new(
            ElementKind::Image {
                image_url: Some(ImageRef::new("https://x/a.png")),
            },
            Frame::new(0.0, 0.0, 400.0, 400.0),
        ));
        let selection = Selection::Element {
            slide_id: slides[0].id,
            element_id,
        };
        let plan_json = CarouselPlan::new(slides)
            .and_then(|plan| plan.to_json())
            .expect("plan json");

        let mut editor = WasmCarouselEditor::new(&plan_json, "Eco Report").expect("editor");
        editor
            .select_json(&serde_json::to_string(&selection).expect("selection json"))
            .expect("select");
        let op = editor
            .dispatch_json(0, r#"{"type":"toolbox","data":{"tool":"removeBackground"}}"#)
            .expect("toolbox")
            .expect("pending operation");
        assert_eq!(editor.reject_operation(&op, "boom").as_deref(), Ok("RolledBack"));

        let notices = editor.take_notifications_json();
        assert!(notices.contains("Failed to remove background: boom"));
        assert!(!notices.contains("Generation failed"));
        assert!(editor.get_slide_json(0).expect("slide").contains("https://x/a.png"));
    }
}
