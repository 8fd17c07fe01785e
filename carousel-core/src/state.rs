//! Application state: topic entry, generation and editing.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::carousel::CarouselEditor;
use crate::library::Palette;
use crate::schema::Story;
use crate::service::CarouselGenerator;
use crate::{EditorError, EditorResult};

/// Top-level phase of the application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AppPhase {
    /// Waiting for a topic and palette.
    #[default]
    TopicInput,
    /// The generator is running.
    Generating,
    /// A carousel is open for editing.
    Editing,
}

/// The complete application state.
#[derive(Debug, Default)]
pub struct AppState {
    phase: AppPhase,
    palette: Palette,
    story: Option<Story>,
    spoken_summary: Option<String>,
    carousel: Option<CarouselEditor>,
    error: Option<String>,
}

impl AppState {
    /// Create in the topic-entry phase with the default palette.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> AppPhase {
        self.phase
    }

    /// Selected palette.
    #[must_use]
    pub const fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Error banner text, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The story behind the open carousel.
    #[must_use]
    pub const fn story(&self) -> Option<&Story> {
        self.story.as_ref()
    }

    /// Narration for the open carousel.
    #[must_use]
    pub fn spoken_summary(&self) -> Option<&str> {
        self.spoken_summary.as_deref()
    }

    /// The open carousel.
    #[must_use]
    pub const fn carousel(&self) -> Option<&CarouselEditor> {
        self.carousel.as_ref()
    }

    /// Mutable access to the open carousel.
    pub fn carousel_mut(&mut self) -> Option<&mut CarouselEditor> {
        self.carousel.as_mut()
    }

    /// Choose a built-in palette. Only possible before generation.
    ///
    /// # Errors
    ///
    /// Returns an error outside topic entry or for an unknown palette name.
    pub fn select_palette(&mut self, name: &str) -> EditorResult<()> {
        if self.phase != AppPhase::TopicInput {
            return Err(EditorError::InvalidOperation(
                "palette is fixed once generation starts".into(),
            ));
        }
        self.palette = Palette::by_name(name)
            .ok_or_else(|| EditorError::InvalidOperation(format!("unknown palette: {name}")))?;
        Ok(())
    }

    /// Generate a carousel for `topic` and open it for editing.
    ///
    /// On failure the error banner is set and the state returns to topic
    /// entry. Returns whether a carousel was opened.
    pub async fn submit_topic(&mut self, topic: &str, generator: &dyn CarouselGenerator) -> bool {
        let topic = topic.trim();
        if topic.is_empty() || self.phase == AppPhase::Generating {
            return false;
        }
        self.phase = AppPhase::Generating;
        self.error = None;
        info!(%topic, palette = %self.palette.name, "generating carousel");

        match generator.generate_carousel_plan(topic, &self.palette).await {
            Ok(generated) => {
                self.carousel = Some(CarouselEditor::new(generated.plan, self.palette.clone()));
                self.story = Some(generated.story);
                self.spoken_summary = Some(generated.spoken_summary);
                self.phase = AppPhase::Editing;
                true
            }
            Err(err) => {
                warn!(error = %err, "carousel generation failed");
                self.error = Some(err.to_string());
                self.phase = AppPhase::TopicInput;
                false
            }
        }
    }

    /// Hide the error banner.
    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Drop the carousel and return to topic entry.
    pub fn reset(&mut self) {
        self.phase = AppPhase::TopicInput;
        self.story = None;
        self.spoken_summary = None;
        self.carousel = None;
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::SlideStyle;
    use crate::schema::GeneratedCarousel;
    use crate::service::ServiceError;
    use crate::slide::{CarouselPlan, Slide};

    struct FixedGenerator {
        fail: bool,
    }

    #[async_trait::async_trait]
    impl CarouselGenerator for FixedGenerator {
        async fn generate_carousel_plan(
            &self,
            topic: &str,
            _palette: &Palette,
        ) -> Result<GeneratedCarousel, ServiceError> {
            if self.fail {
                return Err(ServiceError::Generation("model unavailable".into()));
            }
            let slides = (1..=10).map(|n| Slide::new(n, SlideStyle::Analyst)).collect();
            Ok(GeneratedCarousel {
                story: Story {
                    title: topic.to_string(),
                    source: "Wire".into(),
                    summary: String::new(),
                    grounding_chunks: Vec::new(),
                    real_world_images: Vec::new(),
                },
                plan: CarouselPlan::new(slides)?,
                spoken_summary: "Here is the news.".into(),
            })
        }
    }

    #[tokio::test]
    async fn test_submit_topic_opens_editor() {
        let mut state = AppState::new();
        state.select_palette("Eco Report").expect("known palette");
        assert!(state.submit_topic("Open weights", &FixedGenerator { fail: false }).await);
        assert_eq!(state.phase(), AppPhase::Editing);
        assert_eq!(state.story().map(|s| s.title.as_str()), Some("Open weights"));
        assert_eq!(
            state.carousel().map(|c| c.palette().name.clone()),
            Some("Eco Report".to_string())
        );
        assert!(state.select_palette("Midnight Tech").is_err());

        state.reset();
        assert_eq!(state.phase(), AppPhase::TopicInput);
        assert!(state.carousel().is_none());
    }

    #[tokio::test]
    async fn test_generation_failure_sets_banner() {
        let mut state = AppState::new();
        assert!(!state.submit_topic("chips", &FixedGenerator { fail: true }).await);
        assert_eq!(state.phase(), AppPhase::TopicInput);
        assert_eq!(state.error(), Some("Generation failed: model unavailable"));
        state.dismiss_error();
        assert!(state.error().is_none());
    }

    #[tokio::test]
    async fn test_blank_topic_is_ignored() {
        let mut state = AppState::new();
        assert!(!state.submit_topic("   ", &FixedGenerator { fail: false }).await);
        assert_eq!(state.phase(), AppPhase::TopicInput);
    }
}
