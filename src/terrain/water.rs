//! Companion water shell drawn at sea level around the terrain.
//!
//! The shell's geometry is a fixed unit geodesic sphere. Only its scale
//! follows the ocean level, so an ocean-level edit never rebuilds either the
//! shell or the terrain.

use std::f32::consts::TAU;

use bytemuck::{Pod, Zeroable};

use crate::geometry::build_geodesic_sphere;
use crate::params::GenerationParameters;
use super::mesh::{TerrainMesh, VertexRecord};

/// Subdivision rounds of the shell sphere.
pub const DEFAULT_WATER_DETAIL: u32 = 4;
/// Wave phase advance per second, in radians.
pub const DEFAULT_WAVE_SPEED: f32 = 0.6;

const WATER_COLOR: [f32; 4] = [0.08, 0.30, 0.62, 0.65];

/// Per-frame uniform block read by the water shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct WaterUniforms {
    pub radius: f32,
    pub wave_phase: f32,
    pub ocean_level: f32,
    pub _pad0: f32,
    pub color: [f32; 4],
}

#[derive(Debug, Clone)]
pub struct WaterShell {
    mesh: TerrainMesh,
    radius: f64,
    ocean_level: f64,
    wave_phase: f32,
    wave_speed: f32,
}

/// Sea-surface radius for a parameter set.
pub fn water_radius(params: &GenerationParameters) -> f64 {
    params.radius * (1.0 + params.ocean_level.clamp(0.0, 1.0) * params.elevation_scale)
}

impl WaterShell {
    pub fn new(params: &GenerationParameters) -> Self {
        Self::with_detail(params, DEFAULT_WATER_DETAIL)
    }

    pub fn with_detail(params: &GenerationParameters, detail: u32) -> Self {
        let (points, indices) = build_geodesic_sphere(detail);
        let vertices = points
            .iter()
            .map(|p| {
                let unit = p.as_vec3().to_array();
                VertexRecord {
                    position: unit,
                    normal: unit,
                    color: WATER_COLOR,
                }
            })
            .collect();

        Self {
            mesh: TerrainMesh { vertices, indices },
            radius: water_radius(params),
            ocean_level: params.ocean_level,
            wave_phase: 0.0,
            wave_speed: DEFAULT_WAVE_SPEED,
        }
    }

    /// Unit-radius geometry; scale by [`WaterShell::radius`] when drawing.
    pub fn mesh(&self) -> &TerrainMesh {
        &self.mesh
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn ocean_level(&self) -> f64 {
        self.ocean_level
    }

    pub fn wave_phase(&self) -> f32 {
        self.wave_phase
    }

    /// Moves the shell to the sea level of `params`. Geometry is untouched.
    pub fn set_ocean_level(&mut self, params: &GenerationParameters) {
        self.ocean_level = params.ocean_level;
        self.radius = water_radius(params);
    }

    pub fn set_wave_speed(&mut self, speed: f32) {
        self.wave_speed = if speed.is_finite() { speed } else { 0.0 };
    }

    /// Advances the wave animation by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        if !dt.is_finite() {
            return;
        }
        self.wave_phase = (self.wave_phase + dt * self.wave_speed).rem_euclid(TAU);
    }

    pub fn uniforms(&self) -> WaterUniforms {
        WaterUniforms {
            radius: self.radius as f32,
            wave_phase: self.wave_phase,
            ocean_level: self.ocean_level as f32,
            _pad0: 0.0,
            color: WATER_COLOR,
        }
    }
}
