//! Elevation field on the unit sphere.
//!
//! Three independent noise layers are evaluated directly at the 3D sample
//! point:
//! - a low-frequency continent layer shaping landmass outlines,
//! - a ridged mountain layer that only contributes where the continent layer
//!   already rises above sea-floor level,
//! - a low-weight detail layer adding roughness everywhere.
//!
//! The weighted sum is offset to mid-range and clamped to [0, 1].

use glam::DVec3;

use crate::execution::{map_batched, CancelToken, Cancelled, ExecutionMode};
use crate::params::GenerationParameters;
use super::fractal::{sample_fractal_noise, sample_ridged_noise, FractalNoiseConfig};

/// Fixed weight of the roughness layer.
pub const DETAIL_WEIGHT: f64 = 0.05;
/// Continent value at which mountains begin to appear.
pub const MOUNTAIN_BLEND_START: f64 = 0.0;
/// Continent value at which mountains reach full strength.
pub const MOUNTAIN_BLEND_END: f64 = 0.25;

const MOUNTAIN_SEED_OFFSET: i32 = 7919;
const DETAIL_SEED_OFFSET: i32 = 104_729;

/// Output of the synthesizer for one direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightSample {
    /// Elevation in [0, 1].
    pub raw_height: f64,
    /// Absolute polar-axis (Y) component of the direction, in [0, 1].
    pub latitude: f64,
}

/// Folds a 64-bit seed into the 32-bit seed space of the noise backend.
pub fn fold_seed(seed: i64) -> i32 {
    (seed ^ (seed >> 32)) as i32
}

fn smoothstep(edge0: f64, edge1: f64, x: f64) -> f64 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Prepared noise layers for one parameter set.
#[derive(Debug, Clone)]
pub struct HeightField {
    continent: FractalNoiseConfig,
    mountain: FractalNoiseConfig,
    detail: FractalNoiseConfig,
    continent_height: f64,
    mountain_height: f64,
}

impl HeightField {
    pub fn new(params: &GenerationParameters) -> Self {
        let seed = fold_seed(params.seed);
        Self {
            continent: FractalNoiseConfig::layer(
                seed,
                params.continent_frequency as f32,
                params.continent_octaves,
            ),
            mountain: FractalNoiseConfig::layer(
                seed.wrapping_add(MOUNTAIN_SEED_OFFSET),
                params.mountain_frequency as f32,
                params.mountain_octaves,
            ),
            detail: FractalNoiseConfig::layer(
                seed.wrapping_add(DETAIL_SEED_OFFSET),
                params.detail_frequency as f32,
                params.detail_octaves,
            ),
            continent_height: params.continent_height,
            mountain_height: params.mountain_height,
        }
    }

    /// Samples elevation and latitude at a unit direction.
    pub fn sample(&self, point: DVec3) -> HeightSample {
        let p = point.as_vec3();

        let continent = finite_or_zero(sample_fractal_noise(p, &self.continent) as f64);
        let ridge = finite_or_zero(sample_ridged_noise(p, &self.mountain) as f64);
        let detail = finite_or_zero(sample_fractal_noise(p, &self.detail) as f64);
        let mask = smoothstep(MOUNTAIN_BLEND_START, MOUNTAIN_BLEND_END, continent);

        let combined = 0.5
            + self.continent_height * continent
            + self.mountain_height * mask * ridge
            + DETAIL_WEIGHT * detail;

        HeightSample {
            raw_height: finite_or_zero(combined).clamp(0.0, 1.0),
            latitude: finite_or_zero(point.y.abs()).min(1.0),
        }
    }

    /// Samples every point, optionally in parallel and cancellable between batches.
    pub fn sample_batch(
        &self,
        points: &[DVec3],
        mode: ExecutionMode,
        cancel: Option<&CancelToken>,
    ) -> Result<Vec<HeightSample>, Cancelled> {
        map_batched(points, mode, cancel, |p| self.sample(*p))
    }
}

/// One-shot sampling; prefer [`HeightField`] when sampling many points.
pub fn sample(point: DVec3, params: &GenerationParameters) -> HeightSample {
    HeightField::new(params).sample(point)
}
