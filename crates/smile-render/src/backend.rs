//! wgpu implementation of the engine's backend contract

use crate::context::RenderError;
use crate::pipeline::{SpritePipeline, ViewUniforms};
use smile_core::{BufferKind, ClearColor, Result, SmileError};
use smile_engine::{check_commit_range, DirectoryAssets, GraphicsBackend};
use smile_image::{PixelFormat, RasterImage};
use std::collections::HashMap;
use wgpu::util::DeviceExt;

/// Vertex slots the sprite pipeline reads
const VERTEX_SLOTS: usize = 2;
/// Texture slots the sprite pipeline reads
const TEXTURE_SLOTS: usize = 1;

/// Buffer handle: a CPU shadow of the contents plus the id of the GPU copy
#[derive(Debug)]
pub struct WgpuBuffer {
    id: u64,
    kind: BufferKind,
    shadow: Vec<u8>,
}

impl WgpuBuffer {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn kind(&self) -> BufferKind {
        self.kind
    }
}

#[derive(Debug)]
pub struct WgpuTexture {
    id: u64,
    width: u32,
    height: u32,
}

impl WgpuTexture {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[derive(Clone, Debug, PartialEq)]
struct DrawCall {
    vertex_buffers: [Option<u64>; VERTEX_SLOTS],
    textures: [Option<u64>; TEXTURE_SLOTS],
    indices: u64,
    index_count: u32,
    instance_count: u32,
}

/// Commands recorded for one frame, replayed by `WgpuBackend::encode_frame`
#[derive(Clone, Debug, Default)]
pub struct FrameEncoder {
    clear_color: Option<ClearColor>,
    vertex_buffers: [Option<u64>; VERTEX_SLOTS],
    textures: [Option<u64>; TEXTURE_SLOTS],
    draws: Vec<DrawCall>,
}

impl FrameEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear_color(&self) -> Option<ClearColor> {
        self.clear_color
    }

    pub fn draw_count(&self) -> usize {
        self.draws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clear_color.is_none() && self.draws.is_empty()
    }
}

struct GpuTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

/// `GraphicsBackend` on a wgpu device.
///
/// GPU objects live in maps keyed by handle id, so frames can be replayed
/// without borrowing the engine's handles.
pub struct WgpuBackend {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub format: wgpu::TextureFormat,
    pipeline: SpritePipeline,
    view_buffer: wgpu::Buffer,
    view_bind_group: wgpu::BindGroup,
    buffers: HashMap<u64, wgpu::Buffer>,
    textures: HashMap<u64, GpuTexture>,
    assets: DirectoryAssets,
    next_id: u64,
}

fn is_power_of_two(n: u32) -> bool {
    n != 0 && n & (n - 1) == 0
}

/// Address mode for a sprite: repeat only when both sides are powers of two
pub fn address_mode_for(width: u32, height: u32) -> wgpu::AddressMode {
    if is_power_of_two(width) && is_power_of_two(height) {
        wgpu::AddressMode::Repeat
    } else {
        wgpu::AddressMode::ClampToEdge
    }
}

fn usage_for(kind: BufferKind) -> wgpu::BufferUsages {
    let usage = match kind {
        BufferKind::Geometry | BufferKind::Instance => wgpu::BufferUsages::VERTEX,
        BufferKind::Indices => wgpu::BufferUsages::INDEX,
        BufferKind::Uniforms => wgpu::BufferUsages::UNIFORM,
        BufferKind::Unspecified => wgpu::BufferUsages::empty(),
    };
    usage | wgpu::BufferUsages::COPY_DST
}

fn align_up(n: usize, align: usize) -> usize {
    n.div_ceil(align) * align
}

/// Widen `offset..offset + size` to copy alignment, clipped to `aligned_len`
fn aligned_range(offset: usize, size: usize, aligned_len: usize) -> (usize, usize) {
    let align = wgpu::COPY_BUFFER_ALIGNMENT as usize;
    let start = offset / align * align;
    let end = align_up(offset + size, align).min(aligned_len);
    (start, end)
}

impl WgpuBackend {
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        format: wgpu::TextureFormat,
        assets: DirectoryAssets,
    ) -> Self {
        let pipeline = SpritePipeline::new(&device, format);

        let view_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sprite View Buffer"),
            contents: bytemuck::bytes_of(&ViewUniforms::default()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let view_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Sprite View Bind Group"),
            layout: &pipeline.view_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: view_buffer.as_entire_binding(),
            }],
        });

        log::debug!("Created sprite pipeline for {:?}", format);

        Self {
            device,
            queue,
            format,
            pipeline,
            view_buffer,
            view_bind_group,
            buffers: HashMap::new(),
            textures: HashMap::new(),
            assets,
            next_id: 0,
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn gpu_buffer(&self, id: u64) -> std::result::Result<&wgpu::Buffer, RenderError> {
        self.buffers
            .get(&id)
            .ok_or(RenderError::UnknownHandle("buffer", id))
    }

    /// Replay `frame` into `view` in a single render pass and submit it
    pub fn encode_frame(
        &self,
        frame: &FrameEncoder,
        view: &wgpu::TextureView,
        width: u32,
        height: u32,
    ) -> std::result::Result<(), RenderError> {
        self.queue.write_buffer(
            &self.view_buffer,
            0,
            bytemuck::bytes_of(&ViewUniforms::for_target(width, height)),
        );

        let clear = frame.clear_color.unwrap_or_default().to_array();
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Sprite Encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Sprite Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear[0] as f64,
                            g: clear[1] as f64,
                            b: clear[2] as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_pipeline(&self.pipeline.pipeline);
            pass.set_bind_group(0, &self.view_bind_group, &[]);

            for draw in &frame.draws {
                for (slot, id) in draw.vertex_buffers.iter().enumerate() {
                    if let Some(id) = id {
                        pass.set_vertex_buffer(slot as u32, self.gpu_buffer(*id)?.slice(..));
                    }
                }
                for (slot, id) in draw.textures.iter().enumerate() {
                    if let Some(id) = id {
                        let texture = self
                            .textures
                            .get(id)
                            .ok_or(RenderError::UnknownHandle("texture", *id))?;
                        pass.set_bind_group(1 + slot as u32, &texture.bind_group, &[]);
                    }
                }
                pass.set_index_buffer(
                    self.gpu_buffer(draw.indices)?.slice(..),
                    wgpu::IndexFormat::Uint16,
                );
                pass.draw_indexed(0..draw.index_count, 0, 0..draw.instance_count);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }
}

impl GraphicsBackend for WgpuBackend {
    type Buffer = WgpuBuffer;
    type Texture = WgpuTexture;
    type Frame = FrameEncoder;

    fn create_buffer(&mut self, kind: BufferKind, size: usize, label: &str) -> Result<WgpuBuffer> {
        if size == 0 {
            return Err(SmileError::InvalidInput(format!("empty buffer: {}", label)));
        }
        let aligned = align_up(size, wgpu::COPY_BUFFER_ALIGNMENT as usize);
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: aligned as wgpu::BufferAddress,
            usage: usage_for(kind),
            mapped_at_creation: false,
        });
        let id = self.next_id();
        self.buffers.insert(id, buffer);
        Ok(WgpuBuffer {
            id,
            kind,
            shadow: vec![0; size],
        })
    }

    fn release_buffer(&mut self, buffer: WgpuBuffer) {
        match self.buffers.remove(&buffer.id) {
            Some(gpu) => gpu.destroy(),
            None => log::warn!("Released unknown buffer {}", buffer.id),
        }
    }

    fn buffer_contents<'a>(&mut self, buffer: &'a mut WgpuBuffer) -> &'a mut [u8] {
        &mut buffer.shadow
    }

    fn commit_buffer(&mut self, buffer: &mut WgpuBuffer, offset: usize, size: usize) -> Result<()> {
        check_commit_range(buffer.kind, buffer.shadow.len(), offset, size)?;
        if size == 0 {
            return Ok(());
        }
        let gpu = self.gpu_buffer(buffer.id)?;
        let (start, end) = aligned_range(offset, size, gpu.size() as usize);

        // Pad the tail past the shadow with zeros
        let mut data = vec![0u8; end - start];
        let available = buffer.shadow.len().min(end) - start;
        data[..available].copy_from_slice(&buffer.shadow[start..start + available]);
        self.queue.write_buffer(gpu, start as wgpu::BufferAddress, &data);
        Ok(())
    }

    fn create_texture(&mut self, image: &RasterImage, label: &str) -> Result<WgpuTexture> {
        if image.format() != PixelFormat::R8G8B8A8 {
            return Err(SmileError::InvalidInput(format!(
                "textures must be R8G8B8A8, got {}",
                image.format()
            )));
        }
        let (width, height) = (image.width(), image.height());
        let pixels = image.to_tight()?;

        let texture = self.device.create_texture_with_data(
            &self.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &pixels,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let address_mode = address_mode_for(width, height);
        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Sprite Sampler"),
            address_mode_u: address_mode,
            address_mode_v: address_mode,
            address_mode_w: address_mode,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Sprite Texture Bind Group"),
            layout: &self.pipeline.texture_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let id = self.next_id();
        self.textures.insert(
            id,
            GpuTexture {
                texture,
                bind_group,
            },
        );
        Ok(WgpuTexture { id, width, height })
    }

    fn release_texture(&mut self, texture: WgpuTexture) {
        match self.textures.remove(&texture.id) {
            Some(gpu) => gpu.texture.destroy(),
            None => log::warn!("Released unknown texture {}", texture.id),
        }
    }

    fn set_clear_color(&mut self, frame: &mut FrameEncoder, color: ClearColor) {
        frame.clear_color = Some(color);
    }

    fn bind_vertex_buffer(&mut self, frame: &mut FrameEncoder, buffer: &WgpuBuffer, slot: u32) {
        match frame.vertex_buffers.get_mut(slot as usize) {
            Some(bound) => *bound = Some(buffer.id),
            None => log::warn!("Vertex slot {} is out of range", slot),
        }
    }

    fn bind_texture(&mut self, frame: &mut FrameEncoder, texture: &WgpuTexture, slot: u32) {
        match frame.textures.get_mut(slot as usize) {
            Some(bound) => *bound = Some(texture.id),
            None => log::warn!("Texture slot {} is out of range", slot),
        }
    }

    fn draw_indexed_instanced(
        &mut self,
        frame: &mut FrameEncoder,
        index_count: u32,
        instance_count: u32,
        indices: &WgpuBuffer,
    ) -> Result<()> {
        if indices.kind != BufferKind::Indices {
            return Err(SmileError::InvalidInput(format!(
                "{:?} buffer bound as indices",
                indices.kind
            )));
        }
        if frame.vertex_buffers.iter().any(Option::is_none)
            || frame.textures.iter().any(Option::is_none)
        {
            return Err(SmileError::LogicError(
                "draw issued before every slot was bound".into(),
            ));
        }
        frame.draws.push(DrawCall {
            vertex_buffers: frame.vertex_buffers,
            textures: frame.textures,
            indices: indices.id,
            index_count,
            instance_count,
        });
        Ok(())
    }

    fn load_asset(&mut self, name: &str) -> Result<Vec<u8>> {
        self.assets.load(name)
    }
}
