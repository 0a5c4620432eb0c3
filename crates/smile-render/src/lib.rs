//! Smile Render - wgpu backend for the bouncing sprite
//!
//! `WgpuBackend` implements the engine's `GraphicsBackend` on a wgpu device:
//! buffers are shadowed on the CPU and written to the GPU on commit, and each
//! frame's recorded commands are replayed in one alpha-blended render pass.
//! Frames go to a window through `WindowSurface` or to an `OffscreenTarget`
//! for screenshots.

mod backend;
mod context;
mod headless;
mod pipeline;

pub use backend::{address_mode_for, FrameEncoder, WgpuBackend, WgpuBuffer, WgpuTexture};
pub use context::{request_headless_device, RenderError, WindowSurface};
pub use headless::OffscreenTarget;
pub use pipeline::{SpritePipeline, ViewUniforms};

#[cfg(test)]
mod tests {
    #[test]
    fn sprite_shader_wgsl_parses() {
        let source = include_str!("sprite.wgsl");
        naga::front::wgsl::parse_str(source).expect("sprite.wgsl failed to parse");
    }
}
