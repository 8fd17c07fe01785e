//! # Carousel Edit
//!
//! Replays scripted editor input against a carousel plan.

use carousel_cli::{run, write_plan, CliArgs, ReplayConfig};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize structured tracing with optional JSON format.
///
/// Set `RUST_LOG` to control log levels (default: info,carousel_core=debug).
/// Set `RUST_LOG_FORMAT=json` for JSON output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,carousel_core=debug,carousel_cli=debug"));

    // stdout carries the plan when no output path is given
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ReplayConfig::from(CliArgs::parse());
    tracing::info!(plan = %config.plan.display(), script = %config.script.display(), "starting replay");

    let (plan, report) = run(&config).await?;
    write_plan(&plan, config.output.as_deref()).await?;

    tracing::info!(
        steps = report.steps,
        commits = report.commits,
        applied = report.applied,
        rolled_back = report.rolled_back,
        rejected = report.rejected.len(),
        "replay finished"
    );
    for notification in &report.notifications {
        tracing::warn!(kind = ?notification.kind, "{}", notification.message);
    }
    eprintln!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
