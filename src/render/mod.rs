//! Boundary between generation and the GPU.
//!
//! The orchestrator never talks to a graphics API directly. It receives a
//! device implementing [`MeshBufferFactory`], [`TextureLoader`] and
//! [`ShaderLoader`] at construction, and only holds opaque handles.

mod headless;
mod wgpu_backend;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::export::HeightmapRaster;
use crate::terrain::TerrainMesh;

pub use headless::{DeviceCounters, HeadlessDevice};
pub use wgpu_backend::WgpuDevice;

/// Errors raised by a rendering device.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("No suitable GPU adapter found")]
    NoAdapter,
    #[error("Failed to request device: {0}")]
    RequestDevice(String),
    #[error("Upload of {what} failed: {reason}")]
    Upload { what: &'static str, reason: String },
    #[error("Unknown {kind} handle {id}")]
    UnknownHandle { kind: &'static str, id: u64 },
}

/// GPU vertex + index buffers for one mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u64);

/// GPU texture created from a heightmap raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

/// Compiled shader module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub u64);

/// How the terrain is shaded; selected in the generator configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Shading {
    /// Debug path using the biome colours baked into each vertex.
    #[default]
    VertexColor,
    /// Lit path sampling a baked heightmap texture.
    ShaderLit,
}

/// Shading chosen for one regeneration, with the data it needs.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderMode {
    VertexColor,
    ShaderLit(HeightmapRaster),
}

impl RenderMode {
    pub fn shading(&self) -> Shading {
        match self {
            RenderMode::VertexColor => Shading::VertexColor,
            RenderMode::ShaderLit(_) => Shading::ShaderLit,
        }
    }

    pub fn raster(&self) -> Option<&HeightmapRaster> {
        match self {
            RenderMode::VertexColor => None,
            RenderMode::ShaderLit(raster) => Some(raster),
        }
    }
}

/// Shader programs the renderer needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    VertexColor,
    ShaderLit,
    Water,
}

impl ShaderKind {
    pub fn for_shading(shading: Shading) -> Self {
        match shading {
            Shading::VertexColor => ShaderKind::VertexColor,
            Shading::ShaderLit => ShaderKind::ShaderLit,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ShaderKind::VertexColor => "planetgen-vertex-color",
            ShaderKind::ShaderLit => "planetgen-shader-lit",
            ShaderKind::Water => "planetgen-water",
        }
    }

    pub fn source(self) -> &'static str {
        match self {
            ShaderKind::VertexColor => include_str!("shaders/vertex_color.wgsl"),
            ShaderKind::ShaderLit => include_str!("shaders/shader_lit.wgsl"),
            ShaderKind::Water => include_str!("shaders/water.wgsl"),
        }
    }
}

/// Creates and releases mesh buffers.
pub trait MeshBufferFactory {
    fn create_mesh_buffers(&mut self, mesh: &TerrainMesh) -> Result<MeshHandle, RenderError>;
    fn release_mesh_buffers(&mut self, handle: MeshHandle);
}

/// Creates and releases textures from baked rasters.
pub trait TextureLoader {
    fn create_texture(&mut self, raster: &HeightmapRaster) -> Result<TextureHandle, RenderError>;
    fn release_texture(&mut self, handle: TextureHandle);
}

/// Loads shader modules.
pub trait ShaderLoader {
    fn load_shader(&mut self, kind: ShaderKind) -> Result<ShaderHandle, RenderError>;
    fn release_shader(&mut self, handle: ShaderHandle);
}

/// Everything the orchestrator needs from a device.
pub trait RenderDevice: MeshBufferFactory + TextureLoader + ShaderLoader {}

impl<T: MeshBufferFactory + TextureLoader + ShaderLoader> RenderDevice for T {}
