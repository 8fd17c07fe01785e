//! # Carousel Edit
//!
//! Headless host for `carousel-core`: loads a carousel plan, replays a
//! script of editor input against it, and writes the committed plan back out.
//!
//! ## Usage
//!
//! ```bash
//! carousel-edit --plan plan.json --script steps.json --output edited.json
//! ```
//!
//! A script is a JSON array of steps:
//!
//! ```json
//! [
//!   {"step": "input", "slide": 0, "input": {"type": "toolbox", "data": {"tool": "addText"}}},
//!   {"step": "select", "slide": 0, "element": 0},
//!   {"step": "style", "edit": {"axis": "fontSize", "value": 64}},
//!   {"step": "key", "key": "Delete"}
//! ]
//! ```
//!
//! Asynchronous operations started by a step are run to completion against
//! [`PlaceholderImages`] before the next step.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Context;
use carousel_core::{
    CarouselDocument, CarouselEditor, CarouselPlan, Completion, EditorConfig, EditorError,
    EditorInput, ImageRef, ImageService, Notification, Palette, PendingOperation, Selection,
    ServiceError, StyleEdit,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Command-line arguments for carousel-edit.
#[derive(Debug, Clone, Parser)]
#[command(name = "carousel-edit")]
#[command(about = "Replay editor input against a ten-slide carousel plan")]
#[command(version)]
pub struct CliArgs {
    /// Carousel plan (editor JSON or raw generator output)
    #[arg(long, env = "CAROUSEL_PLAN")]
    pub plan: PathBuf,

    /// Script of editor steps
    #[arg(long, env = "CAROUSEL_SCRIPT")]
    pub script: PathBuf,

    /// Where to write the edited plan (stdout when omitted)
    #[arg(long, env = "CAROUSEL_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Built-in palette name
    #[arg(long, env = "CAROUSEL_PALETTE", default_value = "FeedNexus Original")]
    pub palette: String,

    /// Rendered container width in screen pixels
    #[arg(long, env = "CAROUSEL_CONTAINER_WIDTH", default_value = "540")]
    pub container_width: f32,

    /// Snap distance in canvas units
    #[arg(long, default_value = "5")]
    pub snap_threshold: f32,

    /// Make every image operation fail
    #[arg(long)]
    pub fail_images: bool,
}

/// Replay configuration.
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Plan to open.
    pub plan: PathBuf,
    /// Steps to replay.
    pub script: PathBuf,
    /// Output path.
    pub output: Option<PathBuf>,
    /// Palette name.
    pub palette: String,
    /// Container width.
    pub container_width: f32,
    /// Editor tunables.
    pub editor: EditorConfig,
    /// Fail image operations.
    pub fail_images: bool,
}

impl From<CliArgs> for ReplayConfig {
    fn from(args: CliArgs) -> Self {
        Self {
            plan: args.plan,
            script: args.script,
            output: args.output,
            palette: args.palette,
            container_width: args.container_width,
            editor: EditorConfig::default().with_snap_threshold(args.snap_threshold),
            fail_images: args.fail_images,
        }
    }
}

/// Script errors.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// A step names a slide position outside the plan.
    #[error("step {step}: no slide at index {slide}")]
    NoSuchSlide {
        /// Step index.
        step: usize,
        /// Slide index.
        slide: usize,
    },

    /// A step names an element position outside the slide.
    #[error("step {step}: slide {slide} has no element at index {element}")]
    NoSuchElement {
        /// Step index.
        step: usize,
        /// Slide index.
        slide: usize,
        /// Element index.
        element: usize,
    },

    /// The palette name is not a built-in palette.
    #[error("unknown palette: {0}")]
    UnknownPalette(String),
}

/// One scripted step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "camelCase")]
pub enum Step {
    /// Deliver an input event to a slide.
    Input {
        /// Slide position.
        slide: usize,
        /// The event.
        input: EditorInput,
    },
    /// Select an element by its z-index, or clear the selection.
    Select {
        /// Slide position.
        slide: usize,
        /// Element position, back to front.
        #[serde(default)]
        element: Option<usize>,
    },
    /// Apply an inspector edit to the selection.
    Style {
        /// The edit.
        edit: StyleEdit,
    },
    /// A key press routed to the selection.
    Key {
        /// Key name.
        key: String,
    },
}

/// Outcome of a replay.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayReport {
    /// Steps executed.
    pub steps: usize,
    /// Slides committed.
    pub commits: usize,
    /// Operations applied.
    pub applied: usize,
    /// Operations rolled back.
    pub rolled_back: usize,
    /// Steps the editor rejected, with the reason.
    pub rejected: Vec<String>,
    /// Failure notifications raised by the editor.
    pub notifications: Vec<Notification>,
}

/// An [`ImageService`] that hands out placeholder references.
#[derive(Debug, Default)]
pub struct PlaceholderImages {
    fail: bool,
    issued: AtomicUsize,
}

impl PlaceholderImages {
    /// Create a service; with `fail` set every call errors.
    #[must_use]
    pub fn new(fail: bool) -> Self {
        Self {
            fail,
            issued: AtomicUsize::new(0),
        }
    }

    fn next(&self) -> usize {
        self.issued.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[async_trait::async_trait]
impl ImageService for PlaceholderImages {
    async fn regenerate_image(
        &self,
        description: &str,
        palette: &Palette,
    ) -> Result<ImageRef, ServiceError> {
        if self.fail {
            return Err(ServiceError::Generation("image service disabled".into()));
        }
        tracing::debug!(%description, palette = %palette.name, "issuing placeholder image");
        Ok(ImageRef::new(format!("placeholder://image/{}", self.next())))
    }

    async fn remove_background(&self, image: &ImageRef) -> Result<ImageRef, ServiceError> {
        if self.fail {
            return Err(ServiceError::BackgroundRemoval("image service disabled".into()));
        }
        Ok(ImageRef::new(format!("{image}?cutout={}", self.next())))
    }
}

/// Load a plan, accepting editor JSON or raw generator output.
///
/// # Errors
///
/// Returns an error if the file cannot be read or holds no valid plan.
pub async fn load_plan(path: &Path) -> anyhow::Result<CarouselPlan> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read plan {}", path.display()))?;
    match CarouselPlan::from_json(&text) {
        Ok(plan) => Ok(plan),
        Err(err) => {
            tracing::debug!(error = %err, "not an editor plan, trying generator output");
            let plan = CarouselDocument::parse(&text)?.into_plan()?;
            Ok(plan)
        }
    }
}

/// Load a script of steps.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub async fn load_script(path: &Path) -> anyhow::Result<Vec<Step>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read script {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid script {}", path.display()))
}

/// Replay `steps` against `editor`, running any started operation against
/// `images` before moving on.
///
/// Editor rejections are recorded in the report rather than aborting the run.
///
/// # Errors
///
/// Returns an error only when a step addresses a slide or element that does
/// not exist.
pub async fn replay(
    editor: &mut CarouselEditor,
    steps: Vec<Step>,
    images: &dyn ImageService,
) -> anyhow::Result<ReplayReport> {
    let commits = Arc::new(Mutex::new(0_usize));
    let counter = Arc::clone(&commits);
    editor.set_on_update(move |slide| {
        tracing::debug!(slide = %slide.id, "slide committed");
        if let Ok(mut count) = counter.lock() {
            *count += 1;
        }
    });

    let mut report = ReplayReport::default();
    for (index, step) in steps.into_iter().enumerate() {
        report.steps += 1;
        let outcome: Result<Vec<PendingOperation>, EditorError> = match step {
            Step::Input { slide, input } => {
                let slide_id = editor
                    .slide_id_at(slide)
                    .ok_or(ScriptError::NoSuchSlide { step: index, slide })?;
                editor.dispatch(slide_id, input).map(|pending| pending.into_iter().collect())
            }
            Step::Select { slide, element } => {
                let slide_id = editor
                    .slide_id_at(slide)
                    .ok_or(ScriptError::NoSuchSlide { step: index, slide })?;
                let selection = match element {
                    Some(element) => {
                        let element_id = editor
                            .editor(slide_id)
                            .and_then(|e| e.slide().elements.get(element))
                            .map(|e| e.id)
                            .ok_or(ScriptError::NoSuchElement {
                                step: index,
                                slide,
                                element,
                            })?;
                        Selection::Element {
                            slide_id,
                            element_id,
                        }
                    }
                    None => Selection::None,
                };
                editor.select(selection).map(|()| Vec::new())
            }
            Step::Style { edit } => editor.apply_style_edit(&edit).map(|()| Vec::new()),
            Step::Key { key } => editor.key_down(&key).map(|_| Vec::new()),
        };

        match outcome {
            Ok(operations) => {
                for op in operations {
                    match editor.run_operation(&op, images).await {
                        Completion::Applied => report.applied += 1,
                        Completion::RolledBack => report.rolled_back += 1,
                        Completion::Stale => {}
                    }
                }
            }
            Err(err) => {
                tracing::warn!(step = index, error = %err, "step rejected");
                report.rejected.push(format!("step {index}: {err}"));
            }
        }
    }

    report.notifications = editor.take_notifications();
    report.commits = commits.lock().map(|count| *count).unwrap_or_default();
    Ok(report)
}

/// Run a full replay as configured and return the edited plan with its report.
///
/// # Errors
///
/// Returns an error if loading fails, the palette is unknown, or a step
/// addresses a missing slide or element.
pub async fn run(config: &ReplayConfig) -> anyhow::Result<(CarouselPlan, ReplayReport)> {
    let palette = Palette::by_name(&config.palette)
        .ok_or_else(|| ScriptError::UnknownPalette(config.palette.clone()))?;
    let plan = load_plan(&config.plan).await?;
    let steps = load_script(&config.script).await?;
    tracing::info!(
        steps = steps.len(),
        palette = %palette.name,
        container_width = config.container_width,
        "replaying script"
    );

    let mut editor = CarouselEditor::with_config(plan, palette, &config.editor);
    editor.observe_container_width(config.container_width);
    let images = PlaceholderImages::new(config.fail_images);
    let report = replay(&mut editor, steps, &images).await?;
    Ok((editor.plan().clone(), report))
}

/// Write the plan to `output`, or stdout when `None`.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub async fn write_plan(plan: &CarouselPlan, output: Option<&Path>) -> anyhow::Result<()> {
    let json = plan.to_json()?;
    match output {
        Some(path) => tokio::fs::write(path, json)
            .await
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_args_map_to_config() {
        let args = CliArgs::parse_from([
            "carousel-edit",
            "--plan",
            "plan.json",
            "--script",
            "steps.json",
            "--palette",
            "Eco Report",
            "--container-width",
            "1080",
            "--snap-threshold",
            "8",
        ]);
        let config = ReplayConfig::from(args);
        assert_eq!(config.palette, "Eco Report");
        assert!((config.container_width - 1080.0).abs() < f32::EPSILON);
        assert!((config.editor.snap_threshold - 8.0).abs() < f32::EPSILON);
        assert!(config.output.is_none());
        assert!(!config.fail_images);
    }

    #[test]
    fn test_steps_parse_from_json() {
        let steps: Vec<Step> = serde_json::from_str(
            r##"[
                {"step": "input", "slide": 2, "input": {"type": "toolbox", "data": {"tool": "addShape"}}},
                {"step": "select", "slide": 2},
                {"step": "style", "edit": {"axis": "fill", "value": "#BB86FC"}},
                {"step": "key", "key": "Delete"}
            ]"##,
        )
        .expect("script");
        assert_eq!(steps.len(), 4);
        assert!(matches!(steps[1], Step::Select { slide: 2, element: None }));
    }

    #[tokio::test]
    async fn test_placeholder_images_fail_when_disabled() {
        let images = PlaceholderImages::new(true);
        assert!(images
            .regenerate_image("robot", &Palette::default())
            .await
            .is_err());
        let images = PlaceholderImages::new(false);
        let first = images
            .regenerate_image("robot", &Palette::default())
            .await
            .expect("image");
        assert_eq!(first.as_str(), "placeholder://image/1");
    }
}
