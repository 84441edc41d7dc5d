//! In-memory device that records uploads without touching a GPU.
//!
//! Used for dry runs and to check that every created resource is released.

use std::collections::HashMap;

use crate::export::HeightmapRaster;
use crate::terrain::TerrainMesh;
use super::{
    MeshBufferFactory, MeshHandle, RenderError, ShaderHandle, ShaderKind, ShaderLoader,
    TextureHandle, TextureLoader,
};

/// Lifetime totals of created and released resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceCounters {
    pub meshes_created: usize,
    pub meshes_released: usize,
    pub textures_created: usize,
    pub textures_released: usize,
    pub shaders_loaded: usize,
    pub shaders_released: usize,
}

#[derive(Debug, Default)]
pub struct HeadlessDevice {
    next_id: u64,
    meshes: HashMap<u64, usize>,
    textures: HashMap<u64, (u32, u32)>,
    shaders: HashMap<u64, ShaderKind>,
    counters: DeviceCounters,
    fail_mesh_uploads: bool,
    fail_texture_uploads: bool,
    bytes_uploaded: usize,
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Makes subsequent mesh uploads fail, simulating device exhaustion.
    pub fn set_fail_mesh_uploads(&mut self, fail: bool) {
        self.fail_mesh_uploads = fail;
    }

    /// Makes subsequent texture uploads fail.
    pub fn set_fail_texture_uploads(&mut self, fail: bool) {
        self.fail_texture_uploads = fail;
    }

    pub fn live_meshes(&self) -> usize {
        self.meshes.len()
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn live_shaders(&self) -> usize {
        self.shaders.len()
    }

    /// Total number of live resources of any kind.
    pub fn live_resources(&self) -> usize {
        self.live_meshes() + self.live_textures() + self.live_shaders()
    }

    pub fn counters(&self) -> DeviceCounters {
        self.counters
    }

    pub fn bytes_uploaded(&self) -> usize {
        self.bytes_uploaded
    }

    pub fn mesh_vertex_count(&self, handle: MeshHandle) -> Option<usize> {
        self.meshes.get(&handle.0).copied()
    }

    pub fn texture_size(&self, handle: TextureHandle) -> Option<(u32, u32)> {
        self.textures.get(&handle.0).copied()
    }
}

impl MeshBufferFactory for HeadlessDevice {
    fn create_mesh_buffers(&mut self, mesh: &TerrainMesh) -> Result<MeshHandle, RenderError> {
        if self.fail_mesh_uploads {
            return Err(RenderError::Upload {
                what: "mesh buffers",
                reason: "uploads disabled".into(),
            });
        }
        let id = self.allocate();
        self.meshes.insert(id, mesh.vertex_count());
        self.bytes_uploaded += mesh.vertex_bytes().len() + mesh.index_bytes().len();
        self.counters.meshes_created += 1;
        Ok(MeshHandle(id))
    }

    fn release_mesh_buffers(&mut self, handle: MeshHandle) {
        if self.meshes.remove(&handle.0).is_some() {
            self.counters.meshes_released += 1;
        } else {
            log::warn!("release of unknown mesh handle {}", handle.0);
        }
    }
}

impl TextureLoader for HeadlessDevice {
    fn create_texture(&mut self, raster: &HeightmapRaster) -> Result<TextureHandle, RenderError> {
        if self.fail_texture_uploads {
            return Err(RenderError::Upload {
                what: "heightmap texture",
                reason: "uploads disabled".into(),
            });
        }
        let id = self.allocate();
        self.textures.insert(id, (raster.width, raster.height));
        self.bytes_uploaded += raster.pixels.len() * std::mem::size_of::<f32>();
        self.counters.textures_created += 1;
        Ok(TextureHandle(id))
    }

    fn release_texture(&mut self, handle: TextureHandle) {
        if self.textures.remove(&handle.0).is_some() {
            self.counters.textures_released += 1;
        } else {
            log::warn!("release of unknown texture handle {}", handle.0);
        }
    }
}

impl ShaderLoader for HeadlessDevice {
    fn load_shader(&mut self, kind: ShaderKind) -> Result<ShaderHandle, RenderError> {
        let id = self.allocate();
        self.shaders.insert(id, kind);
        self.counters.shaders_loaded += 1;
        Ok(ShaderHandle(id))
    }

    fn release_shader(&mut self, handle: ShaderHandle) {
        if self.shaders.remove(&handle.0).is_some() {
            self.counters.shaders_released += 1;
        }
    }
}
