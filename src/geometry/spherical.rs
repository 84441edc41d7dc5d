//! Spherical coordinate conventions shared by the mesh builders and the baker.
//!
//! The polar axis is +Y. The polar angle `theta` is measured from +Y (0 at the
//! north pole, pi at the south pole); the azimuth `phi` runs from +X towards +Z.

use std::f64::consts::{PI, TAU};

use glam::DVec3;

/// Converts a polar angle and azimuth to a unit direction.
#[inline]
pub fn spherical_to_unit(theta: f64, phi: f64) -> DVec3 {
    let (sin_theta, cos_theta) = theta.sin_cos();
    let (sin_phi, cos_phi) = phi.sin_cos();
    DVec3::new(sin_theta * cos_phi, cos_theta, sin_theta * sin_phi)
}

/// Converts a direction to `(theta, phi)` with `phi` wrapped to [0, 2pi).
pub fn unit_to_spherical(dir: DVec3) -> (f64, f64) {
    let dir = dir.normalize_or_zero();
    let theta = dir.y.clamp(-1.0, 1.0).acos();
    let mut phi = dir.z.atan2(dir.x);
    if phi < 0.0 {
        phi += TAU;
    }
    (theta, phi)
}

/// Polar angle for the centre of raster row `row` of `rows`.
#[inline]
pub fn row_to_theta(row: u32, rows: u32) -> f64 {
    PI * (row as f64 + 0.5) / rows as f64
}

/// Azimuth for the centre of raster column `col` of `cols`.
#[inline]
pub fn col_to_phi(col: u32, cols: u32) -> f64 {
    TAU * (col as f64 + 0.5) / cols as f64
}
