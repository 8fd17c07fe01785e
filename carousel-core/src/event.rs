//! Input events delivered to a slide editor by its host.
//!
//! Pointer coordinates are screen pixels relative to the top-left corner of
//! the rendered canvas; the editor maps them into canvas space.

use serde::{Deserialize, Serialize};

use crate::element::ElementId;
use crate::geometry::Point;
use crate::layering::MenuAction;

/// What a pointer event landed on, as reported by the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "element", rename_all = "camelCase")]
pub enum PointerTarget {
    /// Let the editor hit-test the point.
    #[default]
    Auto,
    /// The empty canvas.
    Canvas,
    /// The body of an element.
    Element(ElementId),
    /// The bottom-right resize handle of an element.
    ResizeHandle(ElementId),
}

/// Actions offered by the slide toolbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tool", rename_all = "camelCase")]
pub enum ToolboxAction {
    /// Add a default text box.
    AddText,
    /// Add a default rectangle.
    AddShape,
    /// Generate a new image element from a prompt.
    GenerateImage {
        /// What to draw.
        prompt: String,
    },
    /// Show or hide the slide background.
    ToggleBackground,
    /// Strip the background from the selected image element.
    RemoveBackground,
    /// Regenerate the slide background from a new description.
    RegenerateBackground {
        /// New visual description.
        description: String,
    },
    /// Keep the background's concept but change its material and lighting.
    RestyleBackground {
        /// One of the known materials.
        material: String,
        /// One of the known lighting styles.
        lighting: String,
    },
}

/// A unified input event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum EditorInput {
    /// Primary button pressed.
    PointerDown {
        /// Screen x.
        x: f32,
        /// Screen y.
        y: f32,
        /// What was pressed.
        #[serde(default)]
        target: PointerTarget,
    },
    /// Pointer moved while a gesture may be active.
    PointerMove {
        /// Screen x.
        x: f32,
        /// Screen y.
        y: f32,
    },
    /// Primary button released.
    PointerUp {
        /// Screen x.
        x: f32,
        /// Screen y.
        y: f32,
    },
    /// The host lost the pointer stream mid-gesture.
    PointerCancel,
    /// Double click, used to enter inline text editing.
    DoubleClick {
        /// Screen x.
        x: f32,
        /// Screen y.
        y: f32,
        /// What was clicked.
        #[serde(default)]
        target: PointerTarget,
    },
    /// Secondary click, opens the element context menu.
    ContextMenu {
        /// Screen x.
        x: f32,
        /// Screen y.
        y: f32,
        /// What was clicked.
        #[serde(default)]
        target: PointerTarget,
    },
    /// A key was pressed.
    Key {
        /// Key name, e.g. `Delete`.
        key: String,
    },
    /// New content for the element being text-edited.
    TextInput {
        /// Full replacement content.
        content: String,
    },
    /// The text editor lost focus.
    Blur,
    /// An asset was dropped on the slide.
    Drop {
        /// JSON `{url, source}` payload.
        payload: String,
    },
    /// A context menu row was chosen.
    MenuAction {
        /// Chosen action.
        action: MenuAction,
    },
    /// The context menu was dismissed.
    CloseMenu,
    /// A toolbox button was pressed.
    Toolbox(ToolboxAction),
    /// The rendered canvas container changed width.
    ContainerResized {
        /// New width in screen pixels.
        width: f32,
    },
}

impl EditorInput {
    /// The pointer position carried by the event, if any.
    #[must_use]
    pub fn position(&self) -> Option<Point> {
        match *self {
            Self::PointerDown { x, y, .. }
            | Self::PointerMove { x, y }
            | Self::PointerUp { x, y }
            | Self::DoubleClick { x, y, .. }
            | Self::ContextMenu { x, y, .. } => Some(Point::new(x, y)),
            _ => None,
        }
    }

    /// Whether this event belongs to a continuous gesture.
    #[must_use]
    pub const fn is_pointer_stream(&self) -> bool {
        matches!(
            self,
            Self::PointerMove { .. } | Self::PointerUp { .. } | Self::PointerCancel
        )
    }
}
