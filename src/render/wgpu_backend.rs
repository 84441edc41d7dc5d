//! wgpu implementation of the device capabilities.

use std::borrow::Cow;
use std::collections::HashMap;

use wgpu::util::DeviceExt;

use crate::export::HeightmapRaster;
use crate::terrain::TerrainMesh;
use super::{
    MeshBufferFactory, MeshHandle, RenderError, ShaderHandle, ShaderKind, ShaderLoader,
    TextureHandle, TextureLoader,
};

struct MeshBuffers {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
}

/// Holds a wgpu device/queue and every resource created through it.
pub struct WgpuDevice {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    next_id: u64,
    meshes: HashMap<u64, MeshBuffers>,
    textures: HashMap<u64, wgpu::Texture>,
    shaders: HashMap<u64, wgpu::ShaderModule>,
}

impl WgpuDevice {
    /// Create a headless device, blocking until the adapter answers.
    pub fn new() -> Result<Self, RenderError> {
        pollster::block_on(Self::new_async())
    }

    pub async fn new_async() -> Result<Self, RenderError> {
        let instance = wgpu::Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("planetgen-device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await
            .map_err(|e| RenderError::RequestDevice(e.to_string()))?;

        Ok(Self {
            device,
            queue,
            next_id: 0,
            meshes: HashMap::new(),
            textures: HashMap::new(),
            shaders: HashMap::new(),
        })
    }

    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Runs `f` inside an out-of-memory error scope.
    fn scoped<T>(&self, what: &'static str, f: impl FnOnce() -> T) -> Result<T, RenderError> {
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let value = f();
        match pollster::block_on(self.device.pop_error_scope()) {
            None => Ok(value),
            Some(err) => Err(RenderError::Upload {
                what,
                reason: err.to_string(),
            }),
        }
    }

    pub fn vertex_buffer(&self, handle: MeshHandle) -> Option<&wgpu::Buffer> {
        self.meshes.get(&handle.0).map(|m| &m.vertices)
    }

    pub fn index_buffer(&self, handle: MeshHandle) -> Option<&wgpu::Buffer> {
        self.meshes.get(&handle.0).map(|m| &m.indices)
    }

    pub fn texture(&self, handle: TextureHandle) -> Option<&wgpu::Texture> {
        self.textures.get(&handle.0)
    }

    pub fn shader(&self, handle: ShaderHandle) -> Option<&wgpu::ShaderModule> {
        self.shaders.get(&handle.0)
    }

    pub fn live_resources(&self) -> usize {
        self.meshes.len() + self.textures.len() + self.shaders.len()
    }

    /// Vertex layout matching [`crate::terrain::VertexRecord`].
    pub fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
            wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x4];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<crate::terrain::VertexRecord>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

impl MeshBufferFactory for WgpuDevice {
    fn create_mesh_buffers(&mut self, mesh: &TerrainMesh) -> Result<MeshHandle, RenderError> {
        if mesh.is_empty() || mesh.indices.is_empty() {
            return Err(RenderError::Upload {
                what: "mesh buffers",
                reason: "mesh is empty".into(),
            });
        }
        let buffers = self.scoped("mesh buffers", || MeshBuffers {
            vertices: self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("planetgen-vertices"),
                contents: mesh.vertex_bytes(),
                usage: wgpu::BufferUsages::VERTEX,
            }),
            indices: self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("planetgen-indices"),
                contents: mesh.index_bytes(),
                usage: wgpu::BufferUsages::INDEX,
            }),
        })?;
        let id = self.allocate();
        self.meshes.insert(id, buffers);
        Ok(MeshHandle(id))
    }

    fn release_mesh_buffers(&mut self, handle: MeshHandle) {
        if let Some(buffers) = self.meshes.remove(&handle.0) {
            buffers.vertices.destroy();
            buffers.indices.destroy();
        }
    }
}

impl TextureLoader for WgpuDevice {
    fn create_texture(&mut self, raster: &HeightmapRaster) -> Result<TextureHandle, RenderError> {
        if raster.pixels.len() != raster.pixel_count() || raster.pixels.is_empty() {
            return Err(RenderError::Upload {
                what: "heightmap texture",
                reason: format!(
                    "{} pixels for a {}x{} raster",
                    raster.pixels.len(),
                    raster.width,
                    raster.height
                ),
            });
        }
        let bytes: &[u8] = bytemuck::cast_slice(&raster.pixels);
        let size = wgpu::Extent3d {
            width: raster.width,
            height: raster.height,
            depth_or_array_layers: 1,
        };

        let texture = self.scoped("heightmap texture", || {
            let texture = self.device.create_texture(&wgpu::TextureDescriptor {
                label: Some("planetgen-heightmap"),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::R32Float,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            });
            self.queue.write_texture(
                wgpu::ImageCopyTexture {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                bytes,
                wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(raster.width * 4),
                    rows_per_image: Some(raster.height),
                },
                size,
            );
            texture
        })?;

        let id = self.allocate();
        self.textures.insert(id, texture);
        Ok(TextureHandle(id))
    }

    fn release_texture(&mut self, handle: TextureHandle) {
        if let Some(texture) = self.textures.remove(&handle.0) {
            texture.destroy();
        }
    }
}

impl ShaderLoader for WgpuDevice {
    fn load_shader(&mut self, kind: ShaderKind) -> Result<ShaderHandle, RenderError> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(kind.label()),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(kind.source())),
        });
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(RenderError::Upload {
                what: "shader module",
                reason: err.to_string(),
            });
        }
        let id = self.allocate();
        self.shaders.insert(id, module);
        Ok(ShaderHandle(id))
    }

    fn release_shader(&mut self, handle: ShaderHandle) {
        self.shaders.remove(&handle.0);
    }
}
