//! Provisional resource set built during a reload

use crate::backend::GraphicsBackend;
use crate::context::Resources;
use smile_core::{BufferKind, Result, SmileError};
use smile_image::RasterImage;

/// Resources created so far by an in-progress reload.
///
/// Everything still held when the guard is dropped goes back to the backend,
/// so a failed reload leaves nothing behind. `commit` hands the full set over
/// to the caller instead.
pub(crate) struct PendingResources<'a, B: GraphicsBackend> {
    backend: &'a mut B,
    vertices: Option<B::Buffer>,
    indices: Option<B::Buffer>,
    instances: Option<B::Buffer>,
    texture: Option<B::Texture>,
}

impl<'a, B: GraphicsBackend> PendingResources<'a, B> {
    pub fn new(backend: &'a mut B) -> Self {
        Self {
            backend,
            vertices: None,
            indices: None,
            instances: None,
            texture: None,
        }
    }

    pub fn backend(&mut self) -> &mut B {
        &mut *self.backend
    }

    pub fn create_buffers(
        &mut self,
        vertex_bytes: usize,
        index_bytes: usize,
        instance_bytes: usize,
    ) -> Result<()> {
        let vertices = self
            .backend
            .create_buffer(BufferKind::Geometry, vertex_bytes, "smile vertices")?;
        self.vertices = Some(vertices);
        log::debug!("Created vertex buffer ({} bytes)", vertex_bytes);

        let indices = self
            .backend
            .create_buffer(BufferKind::Indices, index_bytes, "smile indices")?;
        self.indices = Some(indices);
        log::debug!("Created index buffer ({} bytes)", index_bytes);

        let instances =
            self.backend
                .create_buffer(BufferKind::Instance, instance_bytes, "smile instance")?;
        self.instances = Some(instances);
        log::debug!("Created instance buffer ({} bytes)", instance_bytes);
        Ok(())
    }

    pub fn create_texture(&mut self, image: &RasterImage) -> Result<()> {
        let texture = self.backend.create_texture(image, "smile sprite")?;
        self.texture = Some(texture);
        log::debug!(
            "Created {}x{} sprite texture",
            image.width(),
            image.height()
        );
        Ok(())
    }

    /// Take ownership of the complete set
    pub fn commit(mut self) -> Result<Resources<B>> {
        match (
            self.vertices.take(),
            self.indices.take(),
            self.instances.take(),
            self.texture.take(),
        ) {
            (Some(vertices), Some(indices), Some(instances), Some(texture)) => Ok(Resources {
                vertices,
                indices,
                instances,
                texture,
            }),
            (vertices, indices, instances, texture) => {
                self.vertices = vertices;
                self.indices = indices;
                self.instances = instances;
                self.texture = texture;
                Err(SmileError::InternalError(
                    "resource set is incomplete".into(),
                ))
            }
        }
    }
}

impl<B: GraphicsBackend> Drop for PendingResources<'_, B> {
    fn drop(&mut self) {
        let mut released = 0;
        for buffer in [
            self.vertices.take(),
            self.indices.take(),
            self.instances.take(),
        ]
        .into_iter()
        .flatten()
        {
            self.backend.release_buffer(buffer);
            released += 1;
        }
        if let Some(texture) = self.texture.take() {
            self.backend.release_texture(texture);
            released += 1;
        }
        if released > 0 {
            log::debug!("Released {} provisional resources", released);
        }
    }
}
