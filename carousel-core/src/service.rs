//! Contracts for the asynchronous collaborators the editor depends on.
//!
//! Implementations live outside this crate (model APIs, background removal
//! libraries). The editor only sees a resolve/reject boundary.

use thiserror::Error;

use crate::element::ImageRef;
use crate::library::Palette;
use crate::schema::GeneratedCarousel;

/// Failures reported by external collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// Story, plan, image or audio generation failed.
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Background removal failed.
    #[error("Failed to remove background: {0}")]
    BackgroundRemoval(String),

    /// The collaborator answered with something that does not fit the schema.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedPayload(err.to_string())
    }
}

impl From<crate::EditorError> for ServiceError {
    fn from(err: crate::EditorError) -> Self {
        Self::MalformedPayload(err.to_string())
    }
}

/// Image synthesis and post-processing.
#[async_trait::async_trait]
pub trait ImageService: Send + Sync {
    /// Render an image for a visual description in the palette's colours.
    async fn regenerate_image(
        &self,
        description: &str,
        palette: &Palette,
    ) -> Result<ImageRef, ServiceError>;

    /// Strip the background from an image.
    async fn remove_background(&self, image: &ImageRef) -> Result<ImageRef, ServiceError>;
}

/// The end-to-end topic-to-carousel pipeline.
#[async_trait::async_trait]
pub trait CarouselGenerator: Send + Sync {
    /// Research a topic and produce a ten-slide plan.
    async fn generate_carousel_plan(
        &self,
        topic: &str,
        palette: &Palette,
    ) -> Result<GeneratedCarousel, ServiceError>;
}
