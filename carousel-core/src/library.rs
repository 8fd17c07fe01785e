//! Fixed design vocabulary: narrative slide styles, colour palettes and the
//! building blocks of background art direction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::EditorError;

/// One of the 12 narrative slide styles a carousel is assembled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlideStyle {
    /// Full-bleed hook image with a headline.
    #[serde(rename = "The Spotlight")]
    Spotlight,
    /// Title plus three or four key takeaways.
    #[serde(rename = "The Analyst")]
    Analyst,
    /// A large centred quote.
    #[serde(rename = "The Visionary Quote")]
    VisionaryQuote,
    /// A single massive statistic.
    #[serde(rename = "The Data Flash")]
    DataFlash,
    /// Split-screen comparison.
    #[serde(rename = "The Versus Slide")]
    Versus,
    /// Dated sequence of events.
    #[serde(rename = "The Timeline")]
    Timeline,
    /// Grid of the people or organisations involved.
    #[serde(rename = "The Key Players")]
    KeyPlayers,
    /// Geographic context.
    #[serde(rename = "The Map")]
    Map,
    /// Two-column balanced view.
    #[serde(rename = "The Pros & Cons")]
    ProsCons,
    /// Numbered steps.
    #[serde(rename = "The Process")]
    Process,
    /// Direct question to the audience.
    #[serde(rename = "The Question")]
    Question,
    /// Call to action.
    #[serde(rename = "The Closer")]
    Closer,
}

impl SlideStyle {
    /// Every style, in library order.
    pub const ALL: [Self; 12] = [
        Self::Spotlight,
        Self::Analyst,
        Self::VisionaryQuote,
        Self::DataFlash,
        Self::Versus,
        Self::Timeline,
        Self::KeyPlayers,
        Self::Map,
        Self::ProsCons,
        Self::Process,
        Self::Question,
        Self::Closer,
    ];

    /// Display name, as it appears in generated plans.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Spotlight => "The Spotlight",
            Self::Analyst => "The Analyst",
            Self::VisionaryQuote => "The Visionary Quote",
            Self::DataFlash => "The Data Flash",
            Self::Versus => "The Versus Slide",
            Self::Timeline => "The Timeline",
            Self::KeyPlayers => "The Key Players",
            Self::Map => "The Map",
            Self::ProsCons => "The Pros & Cons",
            Self::Process => "The Process",
            Self::Question => "The Question",
            Self::Closer => "The Closer",
        }
    }

    /// Whether slides of this style get a generated background.
    #[must_use]
    pub const fn needs_visual(self) -> bool {
        !matches!(self, Self::VisionaryQuote | Self::Question | Self::Closer)
    }

    /// Whether the background is shown when a plan is first generated.
    #[must_use]
    pub const fn shows_background_initially(self) -> bool {
        matches!(self, Self::Spotlight)
    }
}

impl fmt::Display for SlideStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SlideStyle {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|style| style.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| EditorError::InvalidOperation(format!("unknown slide style: {s}")))
    }
}

/// The five semantic colours of a palette.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteColors {
    /// Canvas background.
    pub bg: String,
    /// Primary text.
    pub text: String,
    /// Primary accent.
    pub primary: String,
    /// Secondary accent.
    pub secondary: String,
    /// Container/panel fill.
    pub container: String,
}

/// A named colour palette, chosen once before generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    /// Palette name.
    pub name: String,
    /// Semantic colours.
    pub colors: PaletteColors,
}

impl Palette {
    fn named(name: &str, colors: [&str; 5]) -> Self {
        let [bg, text, primary, secondary, container] = colors;
        Self {
            name: name.to_string(),
            colors: PaletteColors {
                bg: bg.to_string(),
                text: text.to_string(),
                primary: primary.to_string(),
                secondary: secondary.to_string(),
                container: container.to_string(),
            },
        }
    }

    /// The palettes offered at topic entry.
    #[must_use]
    pub fn builtin() -> Vec<Self> {
        vec![
            Self::named(
                "FeedNexus Original",
                ["#121212", "#FFFFFF", "#BB86FC", "#03DAC6", "#333333"],
            ),
            Self::named(
                "Midnight Tech",
                ["#0D1B2A", "#E0E1DD", "#36A2EB", "#FF6B6B", "#1B263B"],
            ),
            Self::named(
                "Sunrise News",
                ["#F8F9FA", "#212529", "#FF8C00", "#4682B4", "#E9ECEF"],
            ),
            Self::named(
                "Eco Report",
                ["#F0F4F0", "#2F3E46", "#4CAF50", "#8BC34A", "#E8F5E9"],
            ),
        ]
    }

    /// Look up a built-in palette by name (case-insensitive).
    #[must_use]
    pub fn by_name(name: &str) -> Option<Self> {
        Self::builtin()
            .into_iter()
            .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
    }

    /// The swatches offered by the style inspector, in semantic order.
    #[must_use]
    pub fn swatches(&self) -> [&str; 5] {
        [
            self.colors.bg.as_str(),
            self.colors.text.as_str(),
            self.colors.primary.as_str(),
            self.colors.secondary.as_str(),
            self.colors.container.as_str(),
        ]
    }

    /// Whether `color` is one of this palette's swatches.
    #[must_use]
    pub fn contains(&self, color: &str) -> bool {
        self.swatches().iter().any(|c| c.eq_ignore_ascii_case(color))
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::named(
            "FeedNexus Original",
            ["#121212", "#FFFFFF", "#BB86FC", "#03DAC6", "#333333"],
        )
    }
}

/// Materials offered when art-directing a background.
pub const MATERIALS: [&str; 6] = [
    "Crystalline",
    "Obsidian",
    "Liquid Chrome",
    "Frosted Glass",
    "Polished Marble",
    "Holographic Mesh",
];

/// Lighting styles offered when art-directing a background.
pub const LIGHTING_STYLES: [&str; 5] = [
    "Dramatic High-Contrast",
    "Soft & Serene",
    "Cinematic",
    "Volumetric",
    "Studio Lighting",
];

/// A background visual description split into its editable parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualPrompt {
    /// The metaphorical concept (first sentence of the description).
    pub concept: String,
    /// One of [`MATERIALS`].
    pub material: String,
    /// One of [`LIGHTING_STYLES`].
    pub lighting: String,
}

impl VisualPrompt {
    /// Split a free-text description.
    ///
    /// Material and lighting are the first known option mentioned anywhere in
    /// the text, falling back to the first option of each list.
    #[must_use]
    pub fn parse(description: &str) -> Self {
        let concept = description
            .split('.')
            .map(str::trim)
            .next()
            .filter(|c| !c.is_empty())
            .unwrap_or(description)
            .to_string();
        let lowered = description.to_lowercase();
        let pick = |options: &[&str]| {
            options
                .iter()
                .find(|o| lowered.contains(&o.to_lowercase()))
                .unwrap_or(&options[0])
                .to_string()
        };
        Self {
            concept,
            material: pick(&MATERIALS[..]),
            lighting: pick(&LIGHTING_STYLES[..]),
        }
    }
}

impl fmt::Display for VisualPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}. A metaphorical representation using a {} texture with {} lighting.",
            self.concept, self.material, self.lighting
        )
    }
}
