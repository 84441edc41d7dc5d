//! Latitude/longitude grid sphere.
//!
//! An `n x n` grid: row `i` sits at polar angle `pi * i / (n - 1)` and column
//! `j` at azimuth `2pi * j / (n - 1)`. The first and last columns coincide in
//! position (the azimuth seam) and every point of the first and last rows
//! collapses onto a pole. Both are properties of this parameterization; the
//! geodesic builder has neither.

use std::f64::consts::{PI, TAU};

use glam::DVec3;

use super::spherical::spherical_to_unit;

/// Smallest grid that still encloses volume.
pub const MIN_UV_RESOLUTION: u32 = 4;
/// Largest grid accepted.
pub const MAX_UV_RESOLUTION: u32 = 1024;

/// Grid size used for a requested level of detail.
pub fn uv_resolution(level_of_detail: u32) -> u32 {
    level_of_detail.clamp(MIN_UV_RESOLUTION, MAX_UV_RESOLUTION)
}

/// Builds the grid points and outward-wound triangles.
pub fn build_uv_sphere(level_of_detail: u32) -> (Vec<DVec3>, Vec<u32>) {
    let n = uv_resolution(level_of_detail);
    let last = (n - 1) as f64;

    let mut points = Vec::with_capacity((n * n) as usize);
    for i in 0..n {
        let theta = PI * i as f64 / last;
        for j in 0..n {
            let phi = TAU * j as f64 / last;
            let p = if i == 0 {
                DVec3::Y
            } else if i == n - 1 {
                DVec3::NEG_Y
            } else if j == n - 1 {
                // Exact copy of column 0 so seam vertices sample identically.
                points[(i * n) as usize]
            } else {
                spherical_to_unit(theta, phi)
            };
            points.push(p);
        }
    }

    let index = |i: u32, j: u32| i * n + j;
    let mut indices = Vec::with_capacity(((n - 1) * (n - 1) * 6) as usize);
    for i in 0..n - 1 {
        for j in 0..n - 1 {
            let a = index(i, j);
            let b = index(i + 1, j);
            let c = index(i, j + 1);
            let d = index(i + 1, j + 1);
            // a and c share the north pole on the first row.
            if i != 0 {
                indices.extend_from_slice(&[a, c, b]);
            }
            // b and d share the south pole on the last row.
            if i != n - 2 {
                indices.extend_from_slice(&[c, d, b]);
            }
        }
    }

    (points, indices)
}
