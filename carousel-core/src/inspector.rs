//! # Style Inspector
//!
//! Exposes only the style axes that make sense for the selected element's
//! variant and turns each edit into a partial [`ElementStyles`] patch.
//! Colours are restricted to the active palette.

use serde::{Deserialize, Serialize};

use crate::element::{ElementKind, ElementStyles, SlideElement, TextAlign};
use crate::library::Palette;
use crate::{EditorError, EditorResult};

/// A single inspector edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "axis", content = "value", rename_all = "camelCase")]
pub enum StyleEdit {
    /// Text font size in canvas pixels.
    FontSize(u32),
    /// Text alignment.
    Align(TextAlign),
    /// Text colour.
    TextColor(String),
    /// Shape fill.
    Fill(String),
}

impl StyleEdit {
    const fn axis(&self) -> &'static str {
        match self {
            Self::FontSize(_) => "fontSize",
            Self::Align(_) => "textAlign",
            Self::TextColor(_) => "color",
            Self::Fill(_) => "backgroundColor",
        }
    }
}

/// A palette colour offered by the inspector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Swatch {
    /// Hex colour.
    pub color: String,
    /// Whether the element currently uses it.
    pub selected: bool,
}

/// The controls shown for an element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum InspectorPanel {
    /// Text controls.
    #[serde(rename_all = "camelCase")]
    Text {
        /// Current font size, if set.
        font_size: Option<u32>,
        /// Current alignment, if set.
        align: Option<TextAlign>,
        /// Text colour choices.
        swatches: Vec<Swatch>,
    },
    /// Shape controls.
    Shape {
        /// Fill colour choices.
        swatches: Vec<Swatch>,
    },
    /// Images expose no style axes.
    Image,
}

/// Maps elements to their editable style subset.
#[derive(Debug, Clone, Copy, Default)]
pub struct StyleInspector;

impl StyleInspector {
    /// The panel for `element` under `palette`.
    #[must_use]
    pub fn panel(element: &SlideElement, palette: &Palette) -> InspectorPanel {
        let swatches = |current: Option<&str>| -> Vec<Swatch> {
            palette
                .swatches()
                .iter()
                .map(|color| Swatch {
                    color: (*color).to_string(),
                    selected: current.is_some_and(|c| c.eq_ignore_ascii_case(color)),
                })
                .collect()
        };
        match element.kind {
            ElementKind::Text { .. } => InspectorPanel::Text {
                font_size: element.styles.font_size,
                align: element.styles.text_align,
                swatches: swatches(element.styles.color.as_deref()),
            },
            ElementKind::Shape { .. } => InspectorPanel::Shape {
                swatches: swatches(element.styles.background_color.as_deref()),
            },
            ElementKind::Image { .. } => InspectorPanel::Image,
        }
    }

    /// Validate `edit` against the element variant and palette, producing the
    /// partial style to merge.
    ///
    /// # Errors
    ///
    /// Returns an error if the axis does not apply to the variant, the colour
    /// is not in the palette, or the font size is zero.
    pub fn patch_for(
        element: &SlideElement,
        edit: &StyleEdit,
        palette: &Palette,
    ) -> EditorResult<ElementStyles> {
        let not_applicable = || EditorError::StyleNotApplicable {
            style: edit.axis(),
            kind: element.kind.tag(),
        };
        let palette_color = |color: &str| {
            palette
                .swatches()
                .into_iter()
                .find(|swatch| swatch.eq_ignore_ascii_case(color))
                .map(str::to_string)
                .ok_or_else(|| EditorError::ColorNotInPalette(color.to_string()))
        };

        let mut patch = ElementStyles::default();
        match (&element.kind, edit) {
            (ElementKind::Text { .. }, StyleEdit::FontSize(0)) => {
                return Err(EditorError::InvalidOperation("font size must be positive".into()));
            }
            (ElementKind::Text { .. }, StyleEdit::FontSize(size)) => patch.font_size = Some(*size),
            (ElementKind::Text { .. }, StyleEdit::Align(align)) => patch.text_align = Some(*align),
            (ElementKind::Text { .. }, StyleEdit::TextColor(color)) => {
                patch.color = Some(palette_color(color)?);
            }
            (ElementKind::Shape { .. }, StyleEdit::Fill(color)) => {
                patch.background_color = Some(palette_color(color)?);
            }
            _ => return Err(not_applicable()),
        }
        Ok(patch)
    }
}
