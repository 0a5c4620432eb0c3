//! Graphics backend contract

use smile_core::{BufferKind, ClearColor, Result, SmileError};
use smile_image::RasterImage;

/// Primitive operations a platform renderer provides to the engine.
///
/// Handles are owned values: releasing a buffer or texture consumes it, so a
/// handle can only be released once.
pub trait GraphicsBackend {
    type Buffer;
    type Texture;
    /// Per-frame command target passed to `SmileContext::render`
    type Frame;

    fn create_buffer(&mut self, kind: BufferKind, size: usize, label: &str)
        -> Result<Self::Buffer>;

    fn release_buffer(&mut self, buffer: Self::Buffer);

    /// CPU-visible contents of a buffer; changes reach the GPU on `commit_buffer`
    fn buffer_contents<'a>(&mut self, buffer: &'a mut Self::Buffer) -> &'a mut [u8];

    /// Publish `size` bytes at `offset`. Static buffers must be committed in full.
    fn commit_buffer(&mut self, buffer: &mut Self::Buffer, offset: usize, size: usize)
        -> Result<()>;

    /// Upload an `R8G8B8A8` image
    fn create_texture(&mut self, image: &RasterImage, label: &str) -> Result<Self::Texture>;

    fn release_texture(&mut self, texture: Self::Texture);

    fn set_clear_color(&mut self, frame: &mut Self::Frame, color: ClearColor);

    fn bind_vertex_buffer(&mut self, frame: &mut Self::Frame, buffer: &Self::Buffer, slot: u32);

    fn bind_texture(&mut self, frame: &mut Self::Frame, texture: &Self::Texture, slot: u32);

    fn draw_indexed_instanced(
        &mut self,
        frame: &mut Self::Frame,
        index_count: u32,
        instance_count: u32,
        indices: &Self::Buffer,
    ) -> Result<()>;

    /// Read a named asset into memory
    fn load_asset(&mut self, name: &str) -> Result<Vec<u8>>;

    /// Hand back asset bytes once decoded
    fn free_asset(&mut self, bytes: Vec<u8>) {
        drop(bytes);
    }
}

/// Validate a commit of `size` bytes at `offset` into a `len`-byte buffer of `kind`
pub fn check_commit_range(kind: BufferKind, len: usize, offset: usize, size: usize) -> Result<()> {
    let end = offset.checked_add(size).filter(|&end| end <= len).ok_or_else(|| {
        SmileError::InvalidInput(format!(
            "commit of {} bytes at {} overruns {}-byte buffer",
            size, offset, len
        ))
    })?;
    if !kind.is_dynamic() && (offset != 0 || end != len) {
        return Err(SmileError::InvalidInput(format!(
            "{:?} buffers must be committed in full ({} bytes), got {}..{}",
            kind, len, offset, end
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_buffers_commit_in_full() {
        assert!(check_commit_range(BufferKind::Geometry, 64, 0, 64).is_ok());
        assert!(check_commit_range(BufferKind::Indices, 12, 0, 8).is_err());
        assert!(check_commit_range(BufferKind::Uniforms, 16, 4, 12).is_err());
    }

    #[test]
    fn test_dynamic_buffers_commit_sub_ranges() {
        assert!(check_commit_range(BufferKind::Instance, 32, 16, 16).is_ok());
        assert!(check_commit_range(BufferKind::Instance, 32, 0, 4).is_ok());
        let err = check_commit_range(BufferKind::Instance, 32, 24, 16).unwrap_err();
        assert!(matches!(err, SmileError::InvalidInput(_)));
        assert!(check_commit_range(BufferKind::Instance, 32, usize::MAX, 2).is_err());
    }
}
