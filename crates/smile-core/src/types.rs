//! GPU layouts and lifecycle types

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Quad vertex: position in model space plus texture coordinate
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub texel: [f32; 2],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, u: f32, v: f32) -> Self {
        Self {
            position: [x, y],
            texel: [u, v],
        }
    }

    /// The four corners of a square sprite of side `size`, centred on the origin.
    ///
    /// Texel `v = 0` is the bottom edge; images are stored bottom row first.
    pub fn quad(size: f32) -> [Vertex; 4] {
        let h = size * 0.5;
        [
            Vertex::new(-h, -h, 0.0, 0.0),
            Vertex::new(-h, h, 0.0, 1.0),
            Vertex::new(h, h, 1.0, 1.0),
            Vertex::new(h, -h, 1.0, 0.0),
        ]
    }
}

/// Two counter-clockwise triangles over `Vertex::quad`
pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

/// Per-instance offsets of the sprite's top and bottom edges
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GeomInstance {
    pub top: [f32; 2],
    pub bottom: [f32; 2],
}

/// How a backend buffer is used
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferKind {
    Geometry,
    Uniforms,
    Instance,
    Indices,
    Unspecified,
}

impl BufferKind {
    /// Dynamic buffers are rewritten every frame and may commit sub-ranges.
    pub fn is_dynamic(&self) -> bool {
        matches!(self, BufferKind::Instance)
    }
}

/// Whether backend resources exist and hold valid frame data
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResourceState {
    #[default]
    Unloaded,
    Loaded,
    Ready,
}

impl ResourceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceState::Unloaded => "unloaded",
            ResourceState::Loaded => "loaded",
            ResourceState::Ready => "ready",
        }
    }
}

/// Opaque background colour
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClearColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl ClearColor {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn to_array(&self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

impl Default for ClearColor {
    fn default() -> Self {
        Self::new(0.23, 0.39, 0.51)
    }
}
