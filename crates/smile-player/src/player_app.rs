//! Player application implementing winit ApplicationHandler
//!
//! Updates and draws the sprite at most 60 times a second.

use crate::config::PlayerConfig;
use anyhow::{Context, Result};
use smile_engine::SmileContext;
use smile_render::{FrameEncoder, WgpuBackend, WindowSurface};
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow};
use winit::window::{Window, WindowId};

/// Shortest time between two frames
const FRAME_INTERVAL: Duration = Duration::from_micros(16_667);

pub struct PlayerApp {
    pub config: PlayerConfig,
    window: Option<Arc<Window>>,
    surface: Option<WindowSurface>,
    context: Option<SmileContext<WgpuBackend>>,
    last_frame: Option<Instant>,
}

impl PlayerApp {
    pub fn new(config: PlayerConfig) -> Self {
        Self {
            config,
            window: None,
            surface: None,
            context: None,
            last_frame: None,
        }
    }

    fn initialize(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window_attrs = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(PhysicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));
        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .context("Failed to create window")?,
        );

        let (surface, device, queue) = pollster::block_on(WindowSurface::new(window.clone()))
            .context("Failed to initialize rendering")?;
        let backend = WgpuBackend::new(
            device,
            queue,
            surface.format(),
            self.config.asset_directory(),
        );

        let mut context = SmileContext::new(backend, self.config.engine.clone());
        context.set_up()?;
        context
            .reload_resources()
            .context("Failed to load sprite resources")?;

        log::info!(
            "Window {}x{}, surface format {:?}",
            surface.size.width,
            surface.size.height,
            surface.format()
        );

        self.window = Some(window);
        self.surface = Some(surface);
        self.context = Some(context);
        Ok(())
    }

    fn frame(&mut self) {
        let (Some(surface), Some(context)) = (&mut self.surface, &mut self.context) else {
            return;
        };

        let now = Instant::now();
        let dt = self
            .last_frame
            .map(|last| now.duration_since(last).as_secs_f64())
            .unwrap_or(0.0);
        self.last_frame = Some(now);

        if let Err(e) = context.update(dt) {
            log::warn!("Update failed: {}", e);
        }

        let mut frame = FrameEncoder::new();
        if let Err(e) = context.render(&mut frame) {
            log::warn!("Render failed: {}", e);
        }

        let backend = context.backend();
        let output = match surface.acquire(&backend.device) {
            Ok(output) => output,
            Err(e) => {
                log::warn!("{}", e);
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let (width, height) = (surface.config.width, surface.config.height);
        if let Err(e) = backend.encode_frame(&frame, &view, width, height) {
            log::warn!("Encoding frame failed: {}", e);
        }

        output.present();
    }

    fn shut_down(&mut self) {
        if let Some(mut context) = self.context.take() {
            if let Err(e) = context.unload_resources() {
                log::debug!("Unload on exit: {}", e);
            }
            if let Err(e) = context.tear_down() {
                log::warn!("Tear down failed: {}", e);
            }
        }
        self.surface = None;
        self.window = None;
    }
}

impl ApplicationHandler for PlayerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.initialize(event_loop) {
                log::error!("{:#}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                if let (Some(surface), Some(context)) = (&mut self.surface, &self.context) {
                    surface.resize(&context.backend().device, new_size);
                }
            }

            WindowEvent::RedrawRequested => {
                self.frame();
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(window) = &self.window else {
            return;
        };
        let next = self
            .last_frame
            .map(|last| last + FRAME_INTERVAL)
            .unwrap_or_else(Instant::now);
        if Instant::now() >= next {
            window.request_redraw();
            event_loop.set_control_flow(ControlFlow::Poll);
        } else {
            event_loop.set_control_flow(ControlFlow::WaitUntil(next));
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shut_down();
    }
}
