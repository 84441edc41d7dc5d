//! Topology selection and the shared sphere-mesh container.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use super::geodesic::{build_geodesic_sphere, geodesic_subdivisions};
use super::uv_sphere::{build_uv_sphere, uv_resolution};

/// Which connectivity generator produces the sample points.
///
/// `level_of_detail` means a grid size for [`Topology::UvSphere`] and a
/// subdivision count for [`Topology::Geodesic`]; the two scales are not
/// comparable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Topology {
    /// Latitude/longitude grid with pole singularities and an azimuth seam.
    UvSphere,
    /// Subdivided icosahedron: near-uniform, seamless.
    #[default]
    Geodesic,
}

impl Topology {
    pub const fn name(self) -> &'static str {
        match self {
            Topology::UvSphere => "uv",
            Topology::Geodesic => "geodesic",
        }
    }

    /// The level of detail the builder will actually use.
    pub fn effective_level(self, level_of_detail: u32) -> u32 {
        match self {
            Topology::UvSphere => uv_resolution(level_of_detail),
            Topology::Geodesic => geodesic_subdivisions(level_of_detail),
        }
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Topology {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "uv" | "uvsphere" | "uv_sphere" | "uv-sphere" => Ok(Topology::UvSphere),
            "geodesic" | "icosphere" | "ico" => Ok(Topology::Geodesic),
            other => Err(format!("unknown topology '{}'", other)),
        }
    }
}

/// Unit-sphere sample points plus their triangle list.
#[derive(Debug, Clone, PartialEq)]
pub struct SphereTopology {
    pub topology: Topology,
    /// Unit-length directions.
    pub points: Vec<DVec3>,
    /// Outward-wound triangles, three indices each.
    pub indices: Vec<u32>,
}

impl SphereTopology {
    /// Builds the points and connectivity for `topology` at `level_of_detail`.
    pub fn build(level_of_detail: u32, topology: Topology) -> Self {
        let (points, indices) = match topology {
            Topology::UvSphere => build_uv_sphere(level_of_detail),
            Topology::Geodesic => build_geodesic_sphere(level_of_detail),
        };
        Self {
            topology,
            points,
            indices,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.points.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Returns true if every index refers to an existing point.
    pub fn validate(&self) -> bool {
        self.indices.len() % 3 == 0
            && self
                .indices
                .iter()
                .all(|&i| (i as usize) < self.points.len())
    }

    /// Number of triangles using each undirected edge.
    pub fn edge_use_counts(&self) -> HashMap<(u32, u32), u32> {
        let mut counts = HashMap::with_capacity(self.indices.len());
        for tri in self.indices.chunks_exact(3) {
            for k in 0..3 {
                let (a, b) = (tri[k], tri[(k + 1) % 3]);
                let key = if a < b { (a, b) } else { (b, a) };
                *counts.entry(key).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Signed volume enclosed by the triangles (positive when wound outward).
    pub fn signed_volume(&self) -> f64 {
        self.indices
            .chunks_exact(3)
            .map(|tri| {
                let a = self.points[tri[0] as usize];
                let b = self.points[tri[1] as usize];
                let c = self.points[tri[2] as usize];
                a.dot(b.cross(c)) / 6.0
            })
            .sum()
    }
}

/// Contract form of [`SphereTopology::build`].
pub fn build(level_of_detail: u32, topology: Topology) -> (Vec<DVec3>, Vec<u32>) {
    let mesh = SphereTopology::build(level_of_detail, topology);
    (mesh.points, mesh.indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geodesic_is_closed_manifold() {
        for lod in 0..4 {
            let mesh = SphereTopology::build(lod, Topology::Geodesic);
            let counts = mesh.edge_use_counts();
            assert!(
                counts.values().all(|&c| c == 2),
                "lod {} has boundary or non-manifold edges",
                lod
            );
            // Euler characteristic of a sphere.
            let v = mesh.vertex_count() as i64;
            let e = counts.len() as i64;
            let f = mesh.triangle_count() as i64;
            assert_eq!(v - e + f, 2);
        }
    }

    #[test]
    fn test_geodesic_has_no_duplicate_positions() {
        let mesh = SphereTopology::build(3, Topology::Geodesic);
        let mut seen = std::collections::HashSet::new();
        for p in &mesh.points {
            let key = (
                (p.x * 1e9).round() as i64,
                (p.y * 1e9).round() as i64,
                (p.z * 1e9).round() as i64,
            );
            assert!(seen.insert(key), "duplicate vertex at {:?}", p);
        }
    }

    #[test]
    fn test_both_topologies_wind_outward() {
        for topology in [Topology::UvSphere, Topology::Geodesic] {
            let mesh = SphereTopology::build(4, topology);
            assert!(mesh.signed_volume() > 0.0, "{} winds inward", topology);
            for tri in mesh.indices.chunks_exact(3) {
                let [a, b, c] = [0, 1, 2].map(|k| mesh.points[tri[k] as usize]);
                let normal = (b - a).cross(c - a);
                assert!(normal.dot(a + b + c) > 0.0, "{} has an inward triangle", topology);
            }
        }
    }

    #[test]
    fn test_points_are_unit_length() {
        for topology in [Topology::UvSphere, Topology::Geodesic] {
            let mesh = SphereTopology::build(6, topology);
            assert!(mesh.validate());
            for p in &mesh.points {
                assert!((p.length() - 1.0).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_zero_lod_is_not_empty() {
        for topology in [Topology::UvSphere, Topology::Geodesic] {
            let mesh = SphereTopology::build(0, topology);
            assert!(mesh.vertex_count() >= 12);
            assert!(mesh.triangle_count() >= 12);
            assert!(mesh.signed_volume() > 0.0);
        }
    }

    #[test]
    fn test_topology_parsing() {
        assert_eq!("uv".parse::<Topology>().unwrap(), Topology::UvSphere);
        assert_eq!("Geodesic".parse::<Topology>().unwrap(), Topology::Geodesic);
        assert!("cube".parse::<Topology>().is_err());
    }
}
