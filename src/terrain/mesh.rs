//! GPU-ready terrain mesh data.

use bytemuck::{Pod, Zeroable};
use glam::{DVec3, Vec3};

use crate::biomes::BiomeKind;

/// One vertex as uploaded to the GPU.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct VertexRecord {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
}

impl VertexRecord {
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn normal(&self) -> Vec3 {
        Vec3::from_array(self.normal)
    }
}

/// Per-vertex generation record, kept only when explicitly requested.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElevationSample {
    /// Undisplaced unit direction.
    pub point: DVec3,
    pub raw_height: f64,
    pub biome: BiomeKind,
}

/// Displaced, coloured and lit planet surface.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TerrainMesh {
    pub vertices: Vec<VertexRecord>,
    pub indices: Vec<u32>,
}

impl TerrainMesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Raw vertex bytes in upload layout.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Raw index bytes in upload layout.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Distance of the closest and farthest vertex from the centre.
    pub fn radius_range(&self) -> (f32, f32) {
        self.vertices.iter().fold((f32::MAX, f32::MIN), |(lo, hi), v| {
            let r = v.position().length();
            (lo.min(r), hi.max(r))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_layout() {
        assert_eq!(std::mem::size_of::<VertexRecord>(), 40);
        let mesh = TerrainMesh {
            vertices: vec![VertexRecord::zeroed(); 3],
            indices: vec![0, 1, 2],
        };
        assert_eq!(mesh.vertex_bytes().len(), 120);
        assert_eq!(mesh.index_bytes().len(), 12);
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn test_radius_range() {
        let mut a = VertexRecord::zeroed();
        a.position = [2.0, 0.0, 0.0];
        let mut b = VertexRecord::zeroed();
        b.position = [0.0, 0.0, -3.0];
        let mesh = TerrainMesh {
            vertices: vec![a, b],
            indices: Vec::new(),
        };
        assert_eq!(mesh.radius_range(), (2.0, 3.0));
    }
}
