use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use danmaku_core::{CueSheet, EngineConfig};
use danmaku_ui::PlayerApp;
use eframe::egui;
use tracing_subscriber::EnvFilter;

/// Play a danmaku cue sheet over a simulated video timeline.
#[derive(Parser)]
#[command(name = "danmaku-ui", version)]
struct Cli {
    /// Cue sheet JSON: an array of records or `{"danmakus": [...]}`.
    feed: Option<PathBuf>,

    /// Engine config JSON. Fields left out keep their defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn read(path: &PathBuf) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EngineConfig::from_json(&read(path)?)
            .with_context(|| format!("failed to parse {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let sheet = match &cli.feed {
        Some(path) => CueSheet::from_json(&read(path)?)
            .with_context(|| format!("failed to parse {}", path.display()))?,
        None => CueSheet::default(),
    };
    tracing::info!(cues = sheet.len(), "starting desktop player");

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([960.0, 600.0])
            .with_min_inner_size([480.0, 320.0]),
        ..Default::default()
    };
    eframe::run_native(
        "danmaku",
        native_options,
        Box::new(move |cc| Ok(Box::new(PlayerApp::new(cc, config, sheet)))),
    )
    .map_err(|e| anyhow::anyhow!("eframe failed: {e}"))
}
