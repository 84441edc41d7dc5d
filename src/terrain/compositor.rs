//! Biome classification, displacement and normal reconstruction.
//!
//! Height sampling is the only per-vertex step that may run in parallel.
//! Displacement and colouring are cheap and done in order, and normal
//! accumulation walks the triangle list sequentially in f64 so that the
//! result is bit-identical whatever the execution mode.

use std::collections::HashMap;

use glam::{DVec3, Vec3};

use crate::biomes::{biome_color, classify, is_submerged, BiomeKind};
use crate::execution::{CancelToken, Cancelled, ExecutionMode};
use crate::noise::{HeightField, HeightSample};
use crate::params::GenerationParameters;
use super::mesh::{ElevationSample, TerrainMesh, VertexRecord};

/// Squared length below which an accumulated normal counts as degenerate.
const DEGENERATE_NORMAL_EPSILON: f64 = 1e-24;

/// Summary of one composite pass.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CompositeStats {
    /// Vertex count per biome, indexed by [`BiomeKind::as_u8`].
    pub biome_counts: [usize; 4],
    pub min_height: f64,
    pub max_height: f64,
    /// Vertices whose normal fell back to the undisplaced direction.
    pub degenerate_normals: usize,
}

impl CompositeStats {
    pub fn count(&self, biome: BiomeKind) -> usize {
        self.biome_counts[biome.as_u8() as usize]
    }

    pub fn total(&self) -> usize {
        self.biome_counts.iter().sum()
    }

    /// Fraction of vertices classified as `biome`, 0 for an empty mesh.
    pub fn fraction(&self, biome: BiomeKind) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.count(biome) as f64 / total as f64
        }
    }
}

/// Full result of [`composite_with_samples`].
#[derive(Debug, Clone)]
pub struct CompositeOutput {
    pub mesh: TerrainMesh,
    pub samples: Vec<ElevationSample>,
    pub stats: CompositeStats,
}

/// Distance from the centre of a vertex with the given raw height.
///
/// Submerged vertices are pinned flat at the ocean surface instead of
/// being pushed below it.
pub fn displaced_radius(raw_height: f64, params: &GenerationParameters) -> f64 {
    let surface = if is_submerged(raw_height, params) {
        raw_height.max(params.ocean_level.min(1.0))
    } else {
        raw_height
    };
    params.radius * (1.0 + surface * params.elevation_scale)
}

/// Builds the displaced, coloured terrain mesh on the calling thread.
pub fn composite(points: &[DVec3], indices: &[u32], params: &GenerationParameters) -> TerrainMesh {
    match composite_with(points, indices, params, ExecutionMode::Serial, None) {
        Ok((mesh, _)) => mesh,
        // No token was supplied, so the pass cannot be cancelled.
        Err(Cancelled) => TerrainMesh::default(),
    }
}

/// [`composite`] with a choice of execution mode and optional cancellation.
///
/// Cancellation is only observed while heights are sampled; once normal
/// accumulation starts the pass runs to completion.
pub fn composite_with(
    points: &[DVec3],
    indices: &[u32],
    params: &GenerationParameters,
    mode: ExecutionMode,
    cancel: Option<&CancelToken>,
) -> Result<(TerrainMesh, CompositeStats), Cancelled> {
    let heights = HeightField::new(params).sample_batch(points, mode, cancel)?;
    let (mesh, stats, _) = assemble(points, indices, &heights, params, false);
    Ok((mesh, stats))
}

/// Like [`composite_with`], also returning the per-vertex elevation records.
pub fn composite_with_samples(
    points: &[DVec3],
    indices: &[u32],
    params: &GenerationParameters,
    mode: ExecutionMode,
    cancel: Option<&CancelToken>,
) -> Result<CompositeOutput, Cancelled> {
    let heights = HeightField::new(params).sample_batch(points, mode, cancel)?;
    let (mesh, stats, samples) = assemble(points, indices, &heights, params, true);
    Ok(CompositeOutput {
        mesh,
        samples,
        stats,
    })
}

fn assemble(
    points: &[DVec3],
    indices: &[u32],
    heights: &[HeightSample],
    params: &GenerationParameters,
    keep_samples: bool,
) -> (TerrainMesh, CompositeStats, Vec<ElevationSample>) {
    let mut stats = CompositeStats {
        min_height: f64::INFINITY,
        max_height: f64::NEG_INFINITY,
        ..Default::default()
    };
    let mut samples = Vec::with_capacity(if keep_samples { points.len() } else { 0 });
    let mut displaced = Vec::with_capacity(points.len());
    let mut vertices = Vec::with_capacity(points.len());

    for (&point, sample) in points.iter().zip(heights) {
        let biome = classify(sample.raw_height, sample.latitude, params);
        stats.biome_counts[biome.as_u8() as usize] += 1;
        stats.min_height = stats.min_height.min(sample.raw_height);
        stats.max_height = stats.max_height.max(sample.raw_height);

        let position = point * displaced_radius(sample.raw_height, params);
        displaced.push(position);
        vertices.push(VertexRecord {
            position: position.as_vec3().to_array(),
            normal: [0.0; 3],
            color: biome_color(biome, sample.raw_height, sample.latitude, params),
        });

        if keep_samples {
            samples.push(ElevationSample {
                point,
                raw_height: sample.raw_height,
                biome,
            });
        }
    }

    if points.is_empty() {
        stats.min_height = 0.0;
        stats.max_height = 0.0;
    }

    let normals = accumulate_normals(&displaced, indices);
    for (i, (vertex, normal)) in vertices.iter_mut().zip(normals).enumerate() {
        let n = if normal.length_squared() > DEGENERATE_NORMAL_EPSILON {
            normal.normalize()
        } else {
            stats.degenerate_normals += 1;
            points[i]
        };
        vertex.normal = n.as_vec3().to_array();
    }

    if stats.degenerate_normals > 0 {
        log::debug!(
            "{} degenerate normals replaced by sphere directions",
            stats.degenerate_normals
        );
    }

    let mesh = TerrainMesh {
        vertices,
        indices: indices.to_vec(),
    };
    (mesh, stats, samples)
}

/// Sums the area-weighted face normal of every triangle at each vertex.
///
/// The cross product's length is twice the triangle's area, so summing raw
/// cross products weights each face by its area. Out-of-range indices are
/// skipped. Vertices at bit-identical positions (the UV poles and azimuth
/// seam) share one normal summed over all of their faces.
pub fn accumulate_normals(positions: &[DVec3], indices: &[u32]) -> Vec<DVec3> {
    let mut normals = vec![DVec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }
        let face = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }
    weld_coincident(positions, &mut normals);
    normals
}

fn position_key(p: DVec3) -> [u64; 3] {
    [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()]
}

fn weld_coincident(positions: &[DVec3], normals: &mut [DVec3]) {
    let mut sums: HashMap<[u64; 3], DVec3> = HashMap::with_capacity(positions.len());
    for (p, n) in positions.iter().zip(normals.iter()) {
        *sums.entry(position_key(*p)).or_insert(DVec3::ZERO) += *n;
    }
    if sums.len() == positions.len() {
        return;
    }
    for (p, n) in positions.iter().zip(normals.iter_mut()) {
        if let Some(sum) = sums.get(&position_key(*p)) {
            *n = *sum;
        }
    }
}

/// Angle in radians between a vertex normal and its radial direction.
pub fn normal_tilt(vertex: &VertexRecord) -> f32 {
    let radial = vertex.position().normalize_or_zero();
    let normal = Vec3::from_array(vertex.normal);
    radial.dot(normal).clamp(-1.0, 1.0).acos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{build, Topology};

    fn minimal_mesh() -> (Vec<DVec3>, Vec<u32>, GenerationParameters) {
        let params = GenerationParameters::minimal();
        let (points, indices) = build(params.level_of_detail, Topology::Geodesic);
        (points, indices, params)
    }

    #[test]
    fn test_composite_preserves_connectivity() {
        let (points, indices, params) = minimal_mesh();
        let mesh = composite(&points, &indices, &params);
        assert_eq!(mesh.vertex_count(), 42);
        assert_eq!(mesh.triangle_count(), 80);
        assert_eq!(mesh.indices, indices);
    }

    #[test]
    fn test_displacement_bounds() {
        let (points, indices, params) = minimal_mesh();
        let mesh = composite(&points, &indices, &params);
        let (lo, hi) = mesh.radius_range();
        let floor = (params.radius * (1.0 + params.ocean_level * params.elevation_scale)) as f32;
        let ceiling = (params.radius * (1.0 + params.elevation_scale)) as f32;
        assert!(lo >= floor - 1e-5, "vertex below sea surface: {}", lo);
        assert!(hi <= ceiling + 1e-5);
    }

    #[test]
    fn test_ocean_is_pinned_flat() {
        let params = GenerationParameters {
            ocean_level: 0.6,
            ..GenerationParameters::minimal()
        };
        assert_eq!(displaced_radius(0.1, &params), displaced_radius(0.5, &params));
        assert!(displaced_radius(0.8, &params) > displaced_radius(0.5, &params));
    }

    #[test]
    fn test_normals_point_outward_and_are_unit() {
        let params = GenerationParameters::default();
        let (points, indices) = build(3, Topology::Geodesic);
        let mesh = composite(&points, &indices, &params);
        for v in &mesh.vertices {
            let n = v.normal();
            assert!((n.length() - 1.0).abs() < 1e-4);
            assert!(n.dot(v.position()) > 0.0);
        }
    }

    #[test]
    fn test_flat_sphere_normals_are_radial() {
        let params = GenerationParameters {
            elevation_scale: 0.0,
            ..Default::default()
        };
        let (points, indices) = build(3, Topology::Geodesic);
        let mesh = composite(&points, &indices, &params);
        for v in &mesh.vertices {
            assert!(normal_tilt(v) < 0.1);
        }
    }

    #[test]
    fn test_degenerate_normal_falls_back_to_direction() {
        let params = GenerationParameters::minimal();
        // A collapsed triangle plus one vertex no triangle touches.
        let points = vec![DVec3::X, DVec3::X, DVec3::X, DVec3::Z];
        let indices = vec![0, 1, 2];
        let (mesh, stats) =
            composite_with(&points, &indices, &params, ExecutionMode::Serial, None).unwrap();
        assert_eq!(stats.degenerate_normals, 4);
        assert_eq!(mesh.vertices[3].normal, [0.0, 0.0, 1.0]);
        assert_eq!(mesh.vertices[0].normal, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_uv_poles_and_seam_share_normals() {
        let params = GenerationParameters::default();
        let n = 16usize;
        let (points, indices) = build(n as u32, Topology::UvSphere);
        let (mesh, stats) =
            composite_with(&points, &indices, &params, ExecutionMode::Serial, None).unwrap();
        assert_eq!(stats.degenerate_normals, 0);

        let north = mesh.vertices[0].normal;
        let south = mesh.vertices[(n - 1) * n].normal;
        for j in 0..n {
            assert_eq!(mesh.vertices[j].normal, north);
            assert_eq!(mesh.vertices[(n - 1) * n + j].normal, south);
        }
        assert!(Vec3::from_array(north).dot(Vec3::Y) > 0.9);
        assert!(Vec3::from_array(south).dot(Vec3::NEG_Y) > 0.9);

        for i in 1..n - 1 {
            assert_eq!(mesh.vertices[i * n].normal, mesh.vertices[i * n + n - 1].normal);
        }
    }

    #[test]
    fn test_samples_and_stats_agree() {
        let (points, indices, params) = minimal_mesh();
        let out =
            composite_with_samples(&points, &indices, &params, ExecutionMode::Serial, None)
                .unwrap();
        assert_eq!(out.samples.len(), points.len());
        assert_eq!(out.stats.total(), points.len());
        for biome in BiomeKind::all() {
            let n = out.samples.iter().filter(|s| s.biome == biome).count();
            assert_eq!(out.stats.count(biome), n);
        }
        for s in &out.samples {
            assert!(s.raw_height >= out.stats.min_height && s.raw_height <= out.stats.max_height);
        }
    }

    #[test]
    fn test_parallel_is_bit_identical() {
        let params = GenerationParameters::default();
        let (points, indices) = build(4, Topology::Geodesic);
        let (serial, _) =
            composite_with(&points, &indices, &params, ExecutionMode::Serial, None).unwrap();
        let (parallel, _) =
            composite_with(&points, &indices, &params, ExecutionMode::Parallel, None).unwrap();
        assert_eq!(serial.vertex_bytes(), parallel.vertex_bytes());
    }

    #[test]
    fn test_cancelled_before_sampling() {
        let (points, indices, params) = minimal_mesh();
        let token = CancelToken::new();
        token.cancel();
        let result =
            composite_with(&points, &indices, &params, ExecutionMode::Serial, Some(&token));
        assert!(result.is_err());
    }

    #[test]
    fn test_ocean_only_planet() {
        let params = GenerationParameters {
            ocean_level: 1.0,
            ..GenerationParameters::minimal()
        };
        let (points, indices) = build(3, Topology::Geodesic);
        let out =
            composite_with_samples(&points, &indices, &params, ExecutionMode::Serial, None)
                .unwrap();
        for s in &out.samples {
            if s.point.y.abs() <= params.polar_cutoff {
                assert_eq!(s.biome, BiomeKind::Ocean);
            }
        }
        assert_eq!(out.stats.count(BiomeKind::Lowland), 0);
        assert_eq!(out.stats.count(BiomeKind::Highland), 0);
    }
}
