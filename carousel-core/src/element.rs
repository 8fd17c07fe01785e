//! Slide elements - the positionable units of a slide.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{Frame, Point, CANVAS_HEIGHT, CANVAS_WIDTH};
use crate::Palette;

/// Unique identifier for an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(Uuid);

impl ElementId {
    /// Create a new unique element ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse from the hyphenated string form.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid UUID.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to displayable image data: a URL or a `data:` URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    /// Wrap a URL or data URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// The underlying reference.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the reference is empty (generation produced nothing).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Shape kinds. Only rectangles exist today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    /// Axis-aligned rectangle.
    #[default]
    Rectangle,
}

/// The variant-specific content of an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    /// A text box.
    Text {
        /// Text content; lines are separated by `\n`.
        #[serde(default)]
        content: String,
    },
    /// A filled shape.
    Shape {
        /// Shape kind.
        #[serde(rename = "shapeType", default)]
        shape_type: ShapeKind,
    },
    /// An image; the reference is absent while generation is pending.
    Image {
        /// Resolved image, if any.
        #[serde(rename = "imageUrl", default, skip_serializing_if = "Option::is_none")]
        image_url: Option<ImageRef>,
    },
}

impl ElementKind {
    /// Variant tag as it appears on the wire.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Shape { .. } => "shape",
            Self::Image { .. } => "image",
        }
    }
}

/// Font families available to text elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FontFamily {
    /// Headline face.
    Montserrat,
    /// Body face.
    #[serde(rename = "Open Sans")]
    OpenSans,
    /// Data and quotes face.
    #[serde(rename = "Source Code Pro")]
    SourceCodePro,
}

/// Font weights available to text elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    /// Bold.
    Bold,
    /// Regular.
    Normal,
    /// Medium.
    Medium,
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Flush left.
    Left,
    /// Centred.
    Center,
    /// Flush right.
    Right,
    /// Justified.
    Justify,
}

/// Text case transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextTransform {
    /// Render in upper case.
    Uppercase,
    /// Render as written.
    None,
}

/// Sparse style record. An absent field means "default rendering", never zero.
///
/// The same type doubles as a partial update: see [`ElementStyles::merge`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementStyles {
    /// Font family (text).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<FontFamily>,
    /// Font size in canvas pixels (text).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    /// Font weight (text).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<FontWeight>,
    /// Alignment (text).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_align: Option<TextAlign>,
    /// Text colour as hex (text).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Case transform (text).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_transform: Option<TextTransform>,
    /// Fill colour as hex, optionally with an alpha suffix (shape).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

impl ElementStyles {
    /// Overlay the fields present in `patch`; fields it leaves out are kept.
    pub fn merge(&mut self, patch: &Self) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if let Some(value) = &patch.$field {
                    self.$field = Some(value.clone());
                })*
            };
        }
        take!(
            font_family,
            font_size,
            font_weight,
            text_align,
            color,
            text_transform,
            background_color
        );
    }

    /// Whether no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One positionable unit on a slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideElement {
    /// Unique identifier, stable for the element's lifetime.
    pub id: ElementId,
    /// Variant and variant-specific content.
    #[serde(flatten)]
    pub kind: ElementKind,
    /// Left edge in canvas units.
    #[serde(with = "canvas_units")]
    pub x: f32,
    /// Top edge in canvas units.
    #[serde(with = "canvas_units")]
    pub y: f32,
    /// Width in canvas units.
    #[serde(with = "canvas_units")]
    pub width: f32,
    /// Height in canvas units.
    #[serde(with = "canvas_units")]
    pub height: f32,
    /// Locked elements cannot be moved, resized or deleted by keyboard.
    #[serde(default)]
    pub is_locked: bool,
    /// Sparse styles.
    #[serde(default)]
    pub styles: ElementStyles,
}

impl SlideElement {
    /// Create an unlocked, unstyled element with the given kind and geometry.
    #[must_use]
    pub fn new(kind: ElementKind, frame: Frame) -> Self {
        Self {
            id: ElementId::new(),
            kind,
            x: frame.x,
            y: frame.y,
            width: frame.width,
            height: frame.height,
            is_locked: false,
            styles: ElementStyles::default(),
        }
    }

    /// Set the styles.
    #[must_use]
    pub fn with_styles(mut self, styles: ElementStyles) -> Self {
        self.styles = styles;
        self
    }

    /// Set the lock flag.
    #[must_use]
    pub fn with_locked(mut self, locked: bool) -> Self {
        self.is_locked = locked;
        self
    }

    /// The default text box added from the toolbox: 300x50, centred.
    #[must_use]
    pub fn text_box(palette: &Palette) -> Self {
        Self::new(
            ElementKind::Text {
                content: "New Text".to_string(),
            },
            Frame::new(CANVAS_WIDTH / 2.0 - 150.0, CANVAS_HEIGHT / 2.0 - 25.0, 300.0, 50.0),
        )
        .with_styles(ElementStyles {
            font_family: Some(FontFamily::OpenSans),
            font_size: Some(48),
            font_weight: Some(FontWeight::Normal),
            text_align: Some(TextAlign::Center),
            color: Some(palette.colors.text.clone()),
            ..ElementStyles::default()
        })
    }

    /// The default rectangle added from the toolbox: 400x200, centred,
    /// filled with the primary colour at half opacity.
    #[must_use]
    pub fn rectangle(palette: &Palette) -> Self {
        Self::new(
            ElementKind::Shape {
                shape_type: ShapeKind::Rectangle,
            },
            Frame::new(CANVAS_WIDTH / 2.0 - 200.0, CANVAS_HEIGHT / 2.0 - 100.0, 400.0, 200.0),
        )
        .with_styles(ElementStyles {
            background_color: Some(format!("{}80", palette.colors.primary)),
            ..ElementStyles::default()
        })
    }

    /// A centred 3:4 image element with no image yet.
    #[must_use]
    pub fn image_placeholder() -> Self {
        let width = CANVAS_WIDTH * 0.5;
        let height = width * (4.0 / 3.0);
        Self::new(
            ElementKind::Image { image_url: None },
            Frame::new(
                (CANVAS_WIDTH - width) / 2.0,
                (CANVAS_HEIGHT - height) / 2.0,
                width,
                height,
            ),
        )
    }

    /// Photo credit anchored near the bottom-right corner of the canvas.
    #[must_use]
    pub fn citation(source: &str) -> Self {
        Self::new(
            ElementKind::Text {
                content: format!("Photo: {source}"),
            },
            Frame::new(CANVAS_WIDTH - 260.0, CANVAS_HEIGHT - 45.0, 240.0, 30.0),
        )
        .with_styles(ElementStyles {
            font_family: Some(FontFamily::OpenSans),
            font_size: Some(18),
            font_weight: Some(FontWeight::Normal),
            text_align: Some(TextAlign::Right),
            color: Some("#FFFFFF".to_string()),
            ..ElementStyles::default()
        })
    }

    /// Current geometry.
    #[must_use]
    pub const fn frame(&self) -> Frame {
        Frame::new(self.x, self.y, self.width, self.height)
    }

    /// Replace the geometry.
    pub fn set_frame(&mut self, frame: Frame) {
        self.x = frame.x;
        self.y = frame.y;
        self.width = frame.width;
        self.height = frame.height;
    }

    /// Check if a canvas-space point is within this element.
    #[must_use]
    pub fn contains_point(&self, point: Point) -> bool {
        self.frame().contains(point)
    }

    /// Whether this is a text element.
    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self.kind, ElementKind::Text { .. })
    }

    /// The resolved image of an image element.
    #[must_use]
    pub fn image_url(&self) -> Option<&ImageRef> {
        match &self.kind {
            ElementKind::Image { image_url } => image_url.as_ref().filter(|url| !url.is_empty()),
            _ => None,
        }
    }

    /// Whether the element offers "remove background": an image with a resolved reference.
    #[must_use]
    pub fn supports_background_removal(&self) -> bool {
        self.image_url().is_some()
    }
}

/// Geometry is integral on the wire whenever it is integral in memory.
mod canvas_units {
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::trivially_copy_pass_by_ref, clippy::float_cmp, clippy::cast_possible_truncation)]
    pub fn serialize<S: Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() && value.fract() == 0.0 && value.abs() < 1.0e9 {
            serializer.serialize_i64(*value as i64)
        } else {
            serializer.serialize_f32(*value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
        f32::deserialize(deserializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_element_wire_format() {
        let element = SlideElement::new(
            ElementKind::Text {
                content: "Hello".to_string(),
            },
            Frame::new(100.0, 100.0, 300.0, 50.0),
        );
        let json = serde_json::to_value(&element).expect("serialize");
        assert_eq!(json["type"], "text");
        assert_eq!(json["content"], "Hello");
        assert_eq!(json["x"], serde_json::json!(100));
        assert_eq!(json["isLocked"], false);
        assert!(json["styles"].as_object().expect("object").is_empty());
    }

    #[test]
    fn test_fractional_geometry_stays_fractional() {
        let element = SlideElement::new(
            ElementKind::Shape {
                shape_type: ShapeKind::Rectangle,
            },
            Frame::new(389.5, 0.0, 301.0, 50.0),
        );
        let json = serde_json::to_string(&element).expect("serialize");
        assert!(json.contains("\"x\":389.5"));
        assert!(json.contains("\"shapeType\":\"rectangle\""));
    }

    #[test]
    fn test_parses_generation_element() {
        let json = r##"{
            "id": "6f1c2a4e-8a55-4c4e-9c39-0d7d1d2e3f40",
            "type": "shape",
            "content": "",
            "imageUrl": null,
            "x": 0, "y": 1200, "width": 1080, "height": 240,
            "isLocked": false,
            "shapeType": "rectangle",
            "styles": {"backgroundColor": "#333333"}
        }"##;
        let element: SlideElement = serde_json::from_str(json).expect("parse");
        assert!(matches!(element.kind, ElementKind::Shape { .. }));
        assert!((element.y - 1200.0).abs() < f32::EPSILON);
        assert_eq!(element.styles.background_color.as_deref(), Some("#333333"));
    }

    #[test]
    fn test_image_placeholder_and_removal_support() {
        let mut element = SlideElement::image_placeholder();
        assert!((element.width - 540.0).abs() < f32::EPSILON);
        assert!((element.height - 720.0).abs() < f32::EPSILON);
        assert!((element.x - 270.0).abs() < f32::EPSILON);
        assert!(!element.supports_background_removal());

        element.kind = ElementKind::Image {
            image_url: Some(ImageRef::new("data:image/png;base64,AAAA")),
        };
        assert!(element.supports_background_removal());
    }

    #[test]
    fn test_style_merge_keeps_unnamed_fields() {
        let mut styles = ElementStyles {
            font_size: Some(48),
            color: Some("#FFFFFF".to_string()),
            ..ElementStyles::default()
        };
        styles.merge(&ElementStyles {
            text_align: Some(TextAlign::Right),
            color: Some("#BB86FC".to_string()),
            ..ElementStyles::default()
        });
        assert_eq!(styles.font_size, Some(48));
        assert_eq!(styles.text_align, Some(TextAlign::Right));
        assert_eq!(styles.color.as_deref(), Some("#BB86FC"));
    }

    #[test]
    fn test_toolbox_defaults() {
        let palette = Palette::default();
        let text = SlideElement::text_box(&palette);
        assert_eq!(text.frame(), Frame::new(390.0, 695.0, 300.0, 50.0));
        assert_eq!(text.styles.color.as_deref(), Some("#FFFFFF"));

        let rect = SlideElement::rectangle(&palette);
        assert_eq!(rect.styles.background_color.as_deref(), Some("#BB86FC80"));

        let citation = SlideElement::citation("Reuters");
        assert_eq!(citation.frame(), Frame::new(820.0, 1395.0, 240.0, 30.0));
        assert!(matches!(
            &citation.kind,
            ElementKind::Text { content } if content == "Photo: Reuters"
        ));
    }
}
