//! # Carousel Core
//!
//! Interactive slide-canvas editor for ten-slide news carousels.
//! Compiles to WASM so the same logic drives the browser editor.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │             carousel-core.wasm              │
//! ├─────────────────────────────────────────────┤
//! │  Scene Graph     │  Gesture Controller      │
//! │  - Slides        │  - Move / resize         │
//! │  - Elements      │  - Snap guides           │
//! │  - Z-order       │  - Pointer capture       │
//! ├─────────────────────────────────────────────┤
//! │  Slide Editor    │  Style Inspector         │
//! │  - Commit/rebase │  - Per-variant axes      │
//! │  - Async ops     │  - Palette swatches      │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod carousel;
pub mod editor;
pub mod element;
pub mod error;
pub mod event;
pub mod geometry;
pub mod gesture;
pub mod inspector;
pub mod layering;
pub mod library;
pub mod schema;
pub mod service;
pub mod slide;
pub mod state;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use carousel::CarouselEditor;
pub use editor::{
    Completion, EditorConfig, EditorOutput, Notification, NotificationKind, OperationId,
    PendingKind, PendingOperation, SlideEditor,
};
pub use element::{
    ElementId, ElementKind, ElementStyles, FontFamily, FontWeight, ImageRef, ShapeKind,
    SlideElement, TextAlign, TextTransform,
};
pub use error::{EditorError, EditorResult};
pub use event::{EditorInput, PointerTarget, ToolboxAction};
pub use geometry::{Frame, GuideLine, Point, Viewport, CANVAS_HEIGHT, CANVAS_WIDTH};
pub use gesture::{DragMode, GestureController};
pub use inspector::{InspectorPanel, StyleEdit, StyleInspector, Swatch};
pub use layering::{ContextMenu, LayerAction, MenuAction, MenuItem, Selection};
pub use library::{Palette, SlideStyle, VisualPrompt};
pub use schema::{CarouselDocument, GeneratedCarousel, RealWorldImage, Story};
pub use service::{CarouselGenerator, ImageService, ServiceError};
pub use slide::{CarouselPlan, Slide, SlideId};
pub use state::{AppPhase, AppState};

/// Carousel core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
