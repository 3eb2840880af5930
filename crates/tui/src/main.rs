mod app;
mod clipboard;
mod renderer;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use danmaku_core::{CueSheet, EngineConfig};
use tracing_subscriber::EnvFilter;

/// Play a danmaku cue sheet over an empty terminal "video".
#[derive(Parser)]
#[command(name = "danmaku-tui", version)]
struct Cli {
    /// Cue sheet JSON: an array of records or `{"danmakus": [...]}`.
    feed: Option<PathBuf>,

    /// Engine config JSON. Replaces the terminal-sized defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for the daily log file. The terminal is busy drawing.
    #[arg(long, default_value = ".")]
    log_dir: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let appender = tracing_appender::rolling::daily(&cli.log_dir, "danmaku-tui.log");
    let (writer, _guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    let config = match &cli.config {
        Some(path) => {
            let data = std::fs::read(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            EngineConfig::from_json(&data)
                .with_context(|| format!("failed to parse {}", path.display()))?
        }
        None => app::terminal_config(),
    };

    let sheet = match &cli.feed {
        Some(path) => {
            let data = std::fs::read(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            CueSheet::from_json(&data)
                .with_context(|| format!("failed to parse {}", path.display()))?
        }
        None => CueSheet::default(),
    };
    tracing::info!(cues = sheet.len(), "starting terminal player");

    app::run(config, sheet)
}
