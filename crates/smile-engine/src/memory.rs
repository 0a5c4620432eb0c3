//! CPU-only backend
//!
//! Buffers are byte vectors with a separately committed copy, textures keep
//! their pixels, and frames record the commands issued into them. Counters on
//! `MemoryStats` make leaks visible, and creation failures can be injected to
//! exercise the engine's error paths.

use crate::assets::DirectoryAssets;
use crate::backend::{check_commit_range, GraphicsBackend};
use smile_core::{BufferKind, ClearColor, Result, SmileError};
use smile_image::{PixelFormat, RasterImage};
use std::collections::HashMap;

#[derive(Clone, Debug)]
pub struct MemoryBuffer {
    id: u32,
    kind: BufferKind,
    label: String,
    contents: Vec<u8>,
    committed: Vec<u8>,
}

impl MemoryBuffer {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    /// Bytes as last committed
    pub fn committed(&self) -> &[u8] {
        &self.committed
    }
}

#[derive(Clone, Debug)]
pub struct MemoryTexture {
    id: u32,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl MemoryTexture {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Tightly packed RGBA rows, bottom row first
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// One command recorded into a frame
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    SetClearColor(ClearColor),
    BindVertexBuffer { slot: u32, buffer: u32 },
    BindTexture { slot: u32, texture: u32 },
    DrawIndexed {
        index_count: u32,
        instance_count: u32,
        indices: u32,
    },
}

/// Commands issued during one frame
#[derive(Clone, Debug, Default)]
pub struct FrameRecord {
    pub commands: Vec<DrawCommand>,
}

impl FrameRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(index_count, instance_count)` of every draw
    pub fn draws(&self) -> Vec<(u32, u32)> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::DrawIndexed {
                    index_count,
                    instance_count,
                    ..
                } => Some((*index_count, *instance_count)),
                _ => None,
            })
            .collect()
    }

    pub fn clear_color(&self) -> Option<ClearColor> {
        self.commands.iter().rev().find_map(|c| match c {
            DrawCommand::SetClearColor(color) => Some(*color),
            _ => None,
        })
    }
}

/// Lifetime counters of a `MemoryBackend`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryStats {
    pub buffers_created: usize,
    pub buffers_released: usize,
    pub textures_created: usize,
    pub textures_released: usize,
    pub commits: usize,
    pub assets_loaded: usize,
    pub assets_freed: usize,
}

impl MemoryStats {
    pub fn live_buffers(&self) -> usize {
        self.buffers_created - self.buffers_released
    }

    pub fn live_textures(&self) -> usize {
        self.textures_created - self.textures_released
    }
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    assets: HashMap<String, Vec<u8>>,
    directory: Option<DirectoryAssets>,
    next_id: u32,
    pub stats: MemoryStats,
    /// Buffer creations allowed before the next one fails
    fail_buffer_after: Option<usize>,
    fail_textures: bool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fall back to files under `directory` for assets not inserted directly
    pub fn with_directory(directory: DirectoryAssets) -> Self {
        Self {
            directory: Some(directory),
            ..Self::default()
        }
    }

    pub fn insert_asset(&mut self, name: &str, bytes: Vec<u8>) {
        self.assets.insert(name.to_string(), bytes);
    }

    /// Let `count` more buffers be created, then fail
    pub fn fail_buffers_after(&mut self, count: usize) {
        self.fail_buffer_after = Some(count);
    }

    pub fn fail_textures(&mut self, fail: bool) {
        self.fail_textures = fail;
    }

    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

impl GraphicsBackend for MemoryBackend {
    type Buffer = MemoryBuffer;
    type Texture = MemoryTexture;
    type Frame = FrameRecord;

    fn create_buffer(&mut self, kind: BufferKind, size: usize, label: &str) -> Result<MemoryBuffer> {
        if let Some(remaining) = self.fail_buffer_after.as_mut() {
            if *remaining == 0 {
                return Err(SmileError::InternalError(format!(
                    "buffer creation failed: {}",
                    label
                )));
            }
            *remaining -= 1;
        }
        if size == 0 {
            return Err(SmileError::InvalidInput(format!("empty buffer: {}", label)));
        }
        self.stats.buffers_created += 1;
        Ok(MemoryBuffer {
            id: self.next_id(),
            kind,
            label: label.to_string(),
            contents: vec![0; size],
            committed: vec![0; size],
        })
    }

    fn release_buffer(&mut self, buffer: MemoryBuffer) {
        self.stats.buffers_released += 1;
        drop(buffer);
    }

    fn buffer_contents<'a>(&mut self, buffer: &'a mut MemoryBuffer) -> &'a mut [u8] {
        &mut buffer.contents
    }

    fn commit_buffer(&mut self, buffer: &mut MemoryBuffer, offset: usize, size: usize) -> Result<()> {
        check_commit_range(buffer.kind, buffer.contents.len(), offset, size)?;
        let range = offset..offset + size;
        buffer.committed[range.clone()].copy_from_slice(&buffer.contents[range]);
        self.stats.commits += 1;
        Ok(())
    }

    fn create_texture(&mut self, image: &RasterImage, label: &str) -> Result<MemoryTexture> {
        if self.fail_textures {
            return Err(SmileError::InternalError(format!(
                "texture creation failed: {}",
                label
            )));
        }
        if image.format() != PixelFormat::R8G8B8A8 {
            return Err(SmileError::InvalidInput(format!(
                "textures must be R8G8B8A8, got {}",
                image.format()
            )));
        }
        let pixels = image.to_tight()?;
        self.stats.textures_created += 1;
        Ok(MemoryTexture {
            id: self.next_id(),
            width: image.width(),
            height: image.height(),
            pixels,
        })
    }

    fn release_texture(&mut self, texture: MemoryTexture) {
        self.stats.textures_released += 1;
        drop(texture);
    }

    fn set_clear_color(&mut self, frame: &mut FrameRecord, color: ClearColor) {
        frame.commands.push(DrawCommand::SetClearColor(color));
    }

    fn bind_vertex_buffer(&mut self, frame: &mut FrameRecord, buffer: &MemoryBuffer, slot: u32) {
        frame.commands.push(DrawCommand::BindVertexBuffer {
            slot,
            buffer: buffer.id,
        });
    }

    fn bind_texture(&mut self, frame: &mut FrameRecord, texture: &MemoryTexture, slot: u32) {
        frame.commands.push(DrawCommand::BindTexture {
            slot,
            texture: texture.id,
        });
    }

    fn draw_indexed_instanced(
        &mut self,
        frame: &mut FrameRecord,
        index_count: u32,
        instance_count: u32,
        indices: &MemoryBuffer,
    ) -> Result<()> {
        let needed = index_count as usize * std::mem::size_of::<u16>();
        if indices.kind != BufferKind::Indices || indices.committed.len() < needed {
            return Err(SmileError::InvalidInput(format!(
                "buffer '{}' cannot supply {} indices",
                indices.label, index_count
            )));
        }
        frame.commands.push(DrawCommand::DrawIndexed {
            index_count,
            instance_count,
            indices: indices.id,
        });
        Ok(())
    }

    fn load_asset(&mut self, name: &str) -> Result<Vec<u8>> {
        let bytes = match (self.assets.get(name), &self.directory) {
            (Some(bytes), _) => bytes.clone(),
            (None, Some(directory)) => directory.load(name)?,
            (None, None) => {
                return Err(SmileError::InvalidInput(format!("unknown asset '{}'", name)))
            }
        };
        self.stats.assets_loaded += 1;
        Ok(bytes)
    }

    fn free_asset(&mut self, bytes: Vec<u8>) {
        self.stats.assets_freed += 1;
        drop(bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_copies_range() {
        let mut backend = MemoryBackend::new();
        let mut buf = backend.create_buffer(BufferKind::Instance, 8, "inst").unwrap();
        backend.buffer_contents(&mut buf).copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        backend.commit_buffer(&mut buf, 4, 4).unwrap();
        assert_eq!(buf.committed(), &[0, 0, 0, 0, 5, 6, 7, 8]);

        let mut geometry = backend.create_buffer(BufferKind::Geometry, 8, "geom").unwrap();
        assert!(backend.commit_buffer(&mut geometry, 4, 4).is_err());

        backend.release_buffer(buf);
        backend.release_buffer(geometry);
        assert_eq!(backend.stats.live_buffers(), 0);
        assert_eq!(backend.stats.commits, 1);
    }

    #[test]
    fn test_injected_buffer_failure() {
        let mut backend = MemoryBackend::new();
        backend.fail_buffers_after(1);
        assert!(backend.create_buffer(BufferKind::Geometry, 4, "a").is_ok());
        let err = backend.create_buffer(BufferKind::Geometry, 4, "b").unwrap_err();
        assert!(matches!(err, SmileError::InternalError(_)));
    }

    #[test]
    fn test_texture_requires_rgba() {
        let mut backend = MemoryBackend::new();
        let gray = RasterImage::new(2, 2, PixelFormat::A8).unwrap();
        assert!(matches!(
            backend.create_texture(&gray, "gray"),
            Err(SmileError::InvalidInput(_))
        ));

        let rgba = RasterImage::new(2, 2, PixelFormat::R8G8B8A8).unwrap();
        let tex = backend.create_texture(&rgba, "rgba").unwrap();
        assert_eq!(tex.size(), (2, 2));
        assert_eq!(tex.pixels().len(), 16);
    }

    #[test]
    fn test_short_index_buffer_named_in_error() {
        let mut backend = MemoryBackend::new();
        let indices = backend.create_buffer(BufferKind::Indices, 4, "quad indices").unwrap();
        let mut frame = FrameRecord::new();

        let err = backend
            .draw_indexed_instanced(&mut frame, 6, 1, &indices)
            .unwrap_err();
        assert!(err.to_string().contains("quad indices"));
        assert!(frame.commands.is_empty());

        backend.draw_indexed_instanced(&mut frame, 2, 1, &indices).unwrap();
        assert_eq!(frame.draws(), vec![(2, 1)]);
    }

    #[test]
    fn test_unknown_asset() {
        let mut backend = MemoryBackend::new();
        backend.insert_asset("a.png", vec![1]);
        assert_eq!(backend.load_asset("a.png").unwrap(), vec![1]);
        assert!(matches!(
            backend.load_asset("b.png"),
            Err(SmileError::InvalidInput(_))
        ));
    }
}
