//! Smile Player - bouncing sprite demo
//!
//! Usage:
//!   smile-player [--config smile.toml] [--assets <dir>] [--width N --height N]
//!   smile-player --screenshot out.png [--frames N]
//!   smile-player --dry-run [--frames N]

use anyhow::{Context, Result};
use clap::Parser;
use smile_player::{run_dry, run_offscreen, PlayerApp, PlayerConfig};
use std::path::PathBuf;
use winit::event_loop::{ControlFlow, EventLoop};

#[derive(Parser)]
#[command(name = "smile-player")]
#[command(about = "Bouncing sprite on a spring-damper pair")]
struct Args {
    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Asset root directory, overrides the config
    #[arg(long)]
    assets: Option<String>,

    /// Window or image width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Window or image height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Render offscreen and save the last frame to this PNG
    #[arg(long)]
    screenshot: Option<PathBuf>,

    /// Frames to run with --screenshot or --dry-run
    #[arg(long, default_value_t = 120)]
    frames: u32,

    /// Run on the CPU-only backend without a window or GPU
    #[arg(long, conflicts_with = "screenshot")]
    dry_run: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => PlayerConfig::load(path)?,
        None => PlayerConfig::default(),
    };
    if let Some(assets) = args.assets {
        config.assets.root = assets;
    }
    if let Some(width) = args.width {
        config.window.width = width;
    }
    if let Some(height) = args.height {
        config.window.height = height;
    }

    if args.dry_run {
        let summary = run_dry(&config, args.frames)?;
        println!("{} frames, {} draws", summary.frames, summary.draws);
        return Ok(());
    }

    if let Some(output) = &args.screenshot {
        return run_offscreen(&config, args.frames, output);
    }

    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = PlayerApp::new(config);
    event_loop.run_app(&mut app)?;

    Ok(())
}
