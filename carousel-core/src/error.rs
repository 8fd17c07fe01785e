//! Error types for editor operations.

use thiserror::Error;

/// Result type for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;

/// Errors that can occur while editing slides.
#[derive(Debug, Error)]
pub enum EditorError {
    /// Element not found on the slide.
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// Slide not found in the carousel plan.
    #[error("Slide not found: {0}")]
    SlideNotFound(String),

    /// Invalid element or slide operation.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// The canvas container has not reported a width yet, so screen
    /// coordinates cannot be mapped into canvas space.
    #[error("Viewport not measured")]
    ViewportUnmeasured,

    /// A carousel plan did not contain the required number of slides.
    #[error("Carousel plan must contain exactly {expected} slides, found {found}")]
    PlanSize {
        /// Required slide count.
        expected: usize,
        /// Slide count that was supplied.
        found: usize,
    },

    /// A style axis was edited on an element variant that does not expose it.
    #[error("Style {style} does not apply to {kind} elements")]
    StyleNotApplicable {
        /// Style axis that was edited.
        style: &'static str,
        /// Element variant tag.
        kind: &'static str,
    },

    /// A colour was chosen that is not part of the active palette.
    #[error("Color {0} is not in the active palette")]
    ColorNotInPalette(String),

    /// An upstream payload did not match the expected schema.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
