//! Simulation context and resource state machine
//!
//! | From     | Operation          | To       |
//! |----------|--------------------|----------|
//! | Unloaded | `reload_resources` | Loaded   |
//! | Loaded   | `update`           | Ready    |
//! | Ready    | `update`           | Ready    |
//! | any      | `unload_resources` | Unloaded |
//!
//! `render` only draws in `Ready`.

use crate::backend::GraphicsBackend;
use crate::pending::PendingResources;
use crate::settings::SmileSettings;
use smile_core::{GeomInstance, ResourceState, Result, SmileError, Vertex, QUAD_INDICES};
use smile_image::PixelFormat;
use smile_physics::{Simulation, SimulationEvent};

/// Indices drawn per frame
pub const INDEX_COUNT: u32 = QUAD_INDICES.len() as u32;
/// Sprite instances drawn per frame
pub const INSTANCE_COUNT: u32 = 1;

/// Backend handles owned by a loaded context
pub struct Resources<B: GraphicsBackend> {
    pub vertices: B::Buffer,
    pub indices: B::Buffer,
    pub instances: B::Buffer,
    pub texture: B::Texture,
}

impl<B: GraphicsBackend> Resources<B> {
    fn release(self, backend: &mut B) {
        backend.release_buffer(self.vertices);
        backend.release_buffer(self.indices);
        backend.release_buffer(self.instances);
        backend.release_texture(self.texture);
    }
}

/// State that exists between `set_up` and `tear_down`
struct SmileData<B: GraphicsBackend> {
    simulation: Simulation,
    state: ResourceState,
    resources: Option<Resources<B>>,
}

/// Owns a backend and drives the sprite through its resource lifecycle
pub struct SmileContext<B: GraphicsBackend> {
    backend: B,
    settings: SmileSettings,
    data: Option<SmileData<B>>,
}

fn write_buffer<B: GraphicsBackend>(
    backend: &mut B,
    buffer: &mut B::Buffer,
    bytes: &[u8],
) -> Result<()> {
    let contents = backend.buffer_contents(buffer);
    let capacity = contents.len();
    let dst = contents.get_mut(..bytes.len()).ok_or_else(|| {
        SmileError::InternalError(format!(
            "buffer of {} bytes cannot hold {} bytes",
            capacity,
            bytes.len()
        ))
    })?;
    dst.copy_from_slice(bytes);
    backend.commit_buffer(buffer, 0, bytes.len())
}

impl<B: GraphicsBackend> SmileContext<B> {
    /// Create a context that still needs `set_up`
    pub fn new(backend: B, settings: SmileSettings) -> Self {
        Self {
            backend,
            settings,
            data: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn settings(&self) -> &SmileSettings {
        &self.settings
    }

    pub fn is_set_up(&self) -> bool {
        self.data.is_some()
    }

    pub fn state(&self) -> ResourceState {
        self.data
            .as_ref()
            .map(|d| d.state)
            .unwrap_or(ResourceState::Unloaded)
    }

    pub fn simulation(&self) -> Option<&Simulation> {
        self.data.as_ref().map(|d| &d.simulation)
    }

    pub fn resources(&self) -> Option<&Resources<B>> {
        self.data.as_ref().and_then(|d| d.resources.as_ref())
    }

    /// Create the simulation state, at rest on the floor
    pub fn set_up(&mut self) -> Result<()> {
        if self.data.is_some() {
            return Err(SmileError::Already("context is already set up".into()));
        }
        self.data = Some(SmileData {
            simulation: Simulation::new(
                self.settings.physics.clone(),
                self.settings.cadence.clone(),
            ),
            state: ResourceState::Unloaded,
            resources: None,
        });
        log::debug!("Context set up");
        Ok(())
    }

    /// Release resources if loaded and drop the simulation state
    pub fn tear_down(&mut self) -> Result<()> {
        if self.data.is_none() {
            return Err(SmileError::Already("context is not set up".into()));
        }
        if self.state() != ResourceState::Unloaded {
            self.unload_resources()?;
        }
        self.data = None;
        log::debug!("Context torn down");
        Ok(())
    }

    /// Create buffers and the sprite texture. Nothing is kept on failure.
    pub fn reload_resources(&mut self) -> Result<()> {
        let data = self.data.as_mut().ok_or(SmileError::NotInitialized)?;
        if data.state != ResourceState::Unloaded {
            return Err(SmileError::Already(format!(
                "resources are {}",
                data.state.as_str()
            )));
        }

        let mut pending = PendingResources::new(&mut self.backend);
        pending.create_buffers(
            std::mem::size_of::<[Vertex; 4]>(),
            std::mem::size_of_val(&QUAD_INDICES),
            std::mem::size_of::<GeomInstance>(),
        )?;

        let asset = &self.settings.sprite_asset;
        let bytes = pending.backend().load_asset(asset)?;
        log::debug!("Loaded asset {} ({} bytes)", asset, bytes.len());
        let decoded = smile_image::decode(&bytes);
        pending.backend().free_asset(bytes);
        let mut image = decoded?;
        image.convert(PixelFormat::R8G8B8A8)?;
        pending.create_texture(&image)?;

        data.resources = Some(pending.commit()?);
        data.state = ResourceState::Loaded;
        log::debug!("Resources loaded");
        Ok(())
    }

    /// Release every backend handle
    pub fn unload_resources(&mut self) -> Result<()> {
        let data = self.data.as_mut().ok_or(SmileError::NotInitialized)?;
        if data.state == ResourceState::Unloaded {
            return Err(SmileError::Already("resources are unloaded".into()));
        }
        if let Some(resources) = data.resources.take() {
            resources.release(&mut self.backend);
        }
        data.state = ResourceState::Unloaded;
        log::debug!("Resources unloaded");
        Ok(())
    }

    /// Advance one frame of `dt` seconds and refresh the instance buffer
    pub fn update(&mut self, dt: f64) -> Result<()> {
        let data = self.data.as_mut().ok_or(SmileError::NotInitialized)?;
        let backend = &mut self.backend;

        match data.state {
            ResourceState::Unloaded => Ok(()),
            ResourceState::Loaded => {
                let resources = data.resources.as_mut().ok_or_else(|| {
                    SmileError::InternalError("loaded context has no resources".into())
                })?;
                let quad = Vertex::quad(data.simulation.oscillator.params().size as f32);
                write_buffer(backend, &mut resources.vertices, bytemuck::cast_slice(&quad))?;
                write_buffer(backend, &mut resources.indices, bytemuck::cast_slice(&QUAD_INDICES))?;
                let instance = data.simulation.instance();
                write_buffer(backend, &mut resources.instances, bytemuck::bytes_of(&instance))?;

                data.simulation.suppress_next_frame();
                data.state = ResourceState::Ready;
                log::debug!("Buffers filled, context ready");
                Ok(())
            }
            ResourceState::Ready => {
                let resources = data.resources.as_mut().ok_or_else(|| {
                    SmileError::InternalError("ready context has no resources".into())
                })?;
                if let SimulationEvent::Suppressed = data.simulation.advance(dt) {
                    return Ok(());
                }
                let instance = data.simulation.instance();
                write_buffer(backend, &mut resources.instances, bytemuck::bytes_of(&instance))
            }
        }
    }

    /// Record this frame's draw calls into `frame`
    pub fn render(&mut self, frame: &mut B::Frame) -> Result<()> {
        let data = self.data.as_ref().ok_or(SmileError::NotInitialized)?;
        if data.state != ResourceState::Ready {
            return Ok(());
        }
        let resources = data
            .resources
            .as_ref()
            .ok_or_else(|| SmileError::InternalError("ready context has no resources".into()))?;

        let backend = &mut self.backend;
        backend.set_clear_color(frame, self.settings.clear_color);
        backend.bind_vertex_buffer(frame, &resources.vertices, 0);
        backend.bind_vertex_buffer(frame, &resources.instances, 1);
        backend.bind_texture(frame, &resources.texture, 0);
        backend.draw_indexed_instanced(frame, INDEX_COUNT, INSTANCE_COUNT, &resources.indices)
    }
}

impl<B: GraphicsBackend> Drop for SmileContext<B> {
    fn drop(&mut self) {
        if self.data.is_some() {
            if let Err(e) = self.tear_down() {
                log::warn!("Tear down on drop failed: {}", e);
            }
        }
    }
}
