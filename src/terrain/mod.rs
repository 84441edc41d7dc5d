//! Terrain surface module.
//!
//! Turns unit-sphere sample points into the displaced, biome-coloured
//! [`TerrainMesh`] handed to the renderer, plus the water shell that sits
//! at sea level around it.

mod compositor;
mod mesh;
mod water;

pub use compositor::{
    accumulate_normals, composite, composite_with, composite_with_samples, displaced_radius,
    normal_tilt, CompositeOutput, CompositeStats,
};
pub use mesh::{ElevationSample, TerrainMesh, VertexRecord};
pub use water::{
    water_radius, WaterShell, WaterUniforms, DEFAULT_WATER_DETAIL, DEFAULT_WAVE_SPEED,
};
