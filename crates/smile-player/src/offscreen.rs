//! Fixed-length runs without a window

use crate::config::PlayerConfig;
use anyhow::{Context, Result};
use smile_core::GeomInstance;
use smile_engine::{FrameRecord, MemoryBackend, SmileContext};
use smile_render::{request_headless_device, FrameEncoder, OffscreenTarget, WgpuBackend};
use std::path::Path;

/// Simulated time per frame in fixed-length runs
pub const FRAME_TIME: f64 = 1.0 / 60.0;

/// Outcome of `run_dry`
#[derive(Clone, Debug, PartialEq)]
pub struct DryRunSummary {
    pub frames: u32,
    pub draws: usize,
    pub instance: Option<GeomInstance>,
}

/// Render `frames` frames offscreen and save the last one to `output`
pub fn run_offscreen(config: &PlayerConfig, frames: u32, output: &Path) -> Result<()> {
    let (width, height) = (config.window.width, config.window.height);
    let (device, queue) =
        pollster::block_on(request_headless_device()).context("Failed to create GPU device")?;
    let target = OffscreenTarget::new(&device, width, height);
    let backend = WgpuBackend::new(
        device,
        queue,
        OffscreenTarget::FORMAT,
        config.asset_directory(),
    );

    let mut context = SmileContext::new(backend, config.engine.clone());
    context.set_up()?;
    context
        .reload_resources()
        .context("Failed to load sprite resources")?;

    for _ in 0..frames.max(1) {
        context.update(FRAME_TIME)?;
        let mut frame = FrameEncoder::new();
        context.render(&mut frame)?;
        context
            .backend()
            .encode_frame(&frame, &target.view, target.width, target.height)?;
    }

    let backend = context.backend();
    let pixels = target.read_pixels(&backend.device, &backend.queue)?;
    let image = image::RgbaImage::from_raw(target.width, target.height, pixels)
        .context("Readback size does not match the target")?;
    image
        .save(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    log::info!(
        "Saved {}x{} frame to {}",
        target.width,
        target.height,
        output.display()
    );

    context.unload_resources()?;
    context.tear_down()?;
    Ok(())
}

/// Run `frames` frames on the CPU-only backend and report what was drawn
pub fn run_dry(config: &PlayerConfig, frames: u32) -> Result<DryRunSummary> {
    let backend = MemoryBackend::with_directory(config.asset_directory());
    let mut context = SmileContext::new(backend, config.engine.clone());
    context.set_up()?;
    context
        .reload_resources()
        .context("Failed to load sprite resources")?;

    let mut draws = 0;
    for _ in 0..frames {
        context.update(FRAME_TIME)?;
        let mut frame = FrameRecord::new();
        context.render(&mut frame)?;
        draws += frame.draws().len();
    }

    let instance = context.simulation().map(|s| s.instance());
    if let Some(instance) = &instance {
        log::info!(
            "Dry run: {} frames, {} draws, top {:?}, bottom {:?}",
            frames,
            draws,
            instance.top,
            instance.bottom
        );
    }

    context.unload_resources()?;
    context.tear_down()?;
    let stats = &context.backend().stats;
    log::debug!(
        "Dry run created {} buffers and {} textures, {} commits",
        stats.buffers_created,
        stats.textures_created,
        stats.commits
    );

    Ok(DryRunSummary {
        frames,
        draws,
        instance,
    })
}
