//! # Layering & Selection
//!
//! Z-order is the position of an element in its slide's sequence: index 0 is
//! the back, the last index is the front. Every layer operation is a splice
//! that preserves the relative order of all other elements.

use serde::{Deserialize, Serialize};

use crate::element::{ElementId, SlideElement};
use crate::geometry::Point;
use crate::slide::SlideId;

/// A z-order change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayerAction {
    /// One step toward the front, capped at the last index.
    BringForward,
    /// One step toward the back, capped at index 0.
    SendBackward,
    /// To the very front.
    BringToFront,
    /// To the very back.
    SendToBack,
}

impl LayerAction {
    /// All actions in menu order.
    pub const ALL: [Self; 4] = [
        Self::BringForward,
        Self::SendBackward,
        Self::BringToFront,
        Self::SendToBack,
    ];

    /// Target index for an item currently at `index` in a sequence of `len`.
    #[must_use]
    pub fn target_index(self, index: usize, len: usize) -> usize {
        let last = len.saturating_sub(1);
        match self {
            Self::BringForward => (index + 1).min(last),
            Self::SendBackward => index.saturating_sub(1),
            Self::BringToFront => last,
            Self::SendToBack => 0,
        }
    }

    /// Menu label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::BringForward => "Bring Forward",
            Self::SendBackward => "Send Backward",
            Self::BringToFront => "Bring to Front",
            Self::SendToBack => "Send to Back",
        }
    }
}

/// Move `items[index]` according to `action`.
///
/// Returns `false` (and leaves the sequence untouched) when the item is
/// already where the action would put it.
pub fn reorder<T>(items: &mut Vec<T>, index: usize, action: LayerAction) -> bool {
    if index >= items.len() {
        return false;
    }
    let target = action.target_index(index, items.len());
    if target == index {
        return false;
    }
    let item = items.remove(index);
    items.insert(target, item);
    true
}

/// The single global selection.
///
/// Holding at most one `(slide, element)` pair makes selecting in one slide
/// clear every other slide's selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Selection {
    /// Nothing selected.
    #[default]
    None,
    /// One element on one slide.
    #[serde(rename_all = "camelCase")]
    Element {
        /// Owning slide.
        slide_id: SlideId,
        /// Selected element.
        element_id: ElementId,
    },
}

impl Selection {
    /// Build from the optional pair used by host callbacks.
    #[must_use]
    pub fn from_parts(slide_id: Option<SlideId>, element_id: Option<ElementId>) -> Self {
        match (slide_id, element_id) {
            (Some(slide_id), Some(element_id)) => Self::Element {
                slide_id,
                element_id,
            },
            _ => Self::None,
        }
    }

    /// The element selected on `slide_id`, if that slide holds the selection.
    #[must_use]
    pub fn element_in(&self, slide_id: SlideId) -> Option<ElementId> {
        match *self {
            Self::Element {
                slide_id: owner,
                element_id,
            } if owner == slide_id => Some(element_id),
            _ => None,
        }
    }

    /// The slide holding the selection.
    #[must_use]
    pub fn slide_id(&self) -> Option<SlideId> {
        match *self {
            Self::Element { slide_id, .. } => Some(slide_id),
            Self::None => None,
        }
    }

    /// Whether anything is selected.
    #[must_use]
    pub const fn is_some(&self) -> bool {
        matches!(self, Self::Element { .. })
    }
}

/// An action offered by the per-element context menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "layer", rename_all = "camelCase")]
pub enum MenuAction {
    /// Change z-order.
    Layer(LayerAction),
    /// Lock or unlock.
    ToggleLock,
    /// Strip the background from an image element.
    RemoveBackground,
    /// Delete the element.
    Delete,
}

/// One row of the context menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    /// What choosing the row does.
    pub action: MenuAction,
    /// Row label.
    pub label: &'static str,
}

/// An open context menu.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextMenu {
    /// Where the menu opened, in screen pixels relative to the canvas.
    pub anchor: Point,
    /// Element the menu acts on.
    pub element_id: ElementId,
}

impl ContextMenu {
    /// The rows offered for `element`.
    #[must_use]
    pub fn items(element: &SlideElement) -> Vec<MenuItem> {
        let mut items: Vec<MenuItem> = LayerAction::ALL
            .into_iter()
            .map(|action| MenuItem {
                action: MenuAction::Layer(action),
                label: action.label(),
            })
            .collect();
        items.push(MenuItem {
            action: MenuAction::ToggleLock,
            label: if element.is_locked { "Unlock" } else { "Lock" },
        });
        if element.supports_background_removal() {
            items.push(MenuItem {
                action: MenuAction::RemoveBackground,
                label: "Remove Background",
            });
        }
        items.push(MenuItem {
            action: MenuAction::Delete,
            label: "Delete",
        });
        items
    }
}
