//! Recursively subdivided icosahedron.
//!
//! Each round splits every triangle into four. Edge midpoints are cached by
//! their unordered parent pair, so a vertex is created once and shared by both
//! adjacent triangles and the mesh stays a closed manifold.

use std::collections::HashMap;

use glam::DVec3;

/// Highest number of subdivision rounds (655,362 vertices).
pub const MAX_GEODESIC_SUBDIVISIONS: u32 = 8;

/// Subdivision rounds used for a requested level of detail.
pub fn geodesic_subdivisions(level_of_detail: u32) -> u32 {
    level_of_detail.min(MAX_GEODESIC_SUBDIVISIONS)
}

/// Vertex count after `subdivisions` rounds.
pub fn geodesic_vertex_count(subdivisions: u32) -> usize {
    10 * 4usize.pow(subdivisions) + 2
}

/// Triangle count after `subdivisions` rounds.
pub fn geodesic_triangle_count(subdivisions: u32) -> usize {
    20 * 4usize.pow(subdivisions)
}

fn icosahedron() -> (Vec<DVec3>, Vec<u32>) {
    let t = (1.0 + 5.0_f64.sqrt()) / 2.0;

    let points = [
        DVec3::new(-1.0, t, 0.0),
        DVec3::new(1.0, t, 0.0),
        DVec3::new(-1.0, -t, 0.0),
        DVec3::new(1.0, -t, 0.0),
        DVec3::new(0.0, -1.0, t),
        DVec3::new(0.0, 1.0, t),
        DVec3::new(0.0, -1.0, -t),
        DVec3::new(0.0, 1.0, -t),
        DVec3::new(t, 0.0, -1.0),
        DVec3::new(t, 0.0, 1.0),
        DVec3::new(-t, 0.0, -1.0),
        DVec3::new(-t, 0.0, 1.0),
    ]
    .into_iter()
    .map(DVec3::normalize)
    .collect();

    let indices = vec![
        0, 11, 5, 0, 5, 1, 0, 1, 7, 0, 7, 10, 0, 10, 11,
        1, 5, 9, 5, 11, 4, 11, 10, 2, 10, 7, 6, 7, 1, 8,
        3, 9, 4, 3, 4, 2, 3, 2, 6, 3, 6, 8, 3, 8, 9,
        4, 9, 5, 2, 4, 11, 6, 2, 10, 8, 6, 7, 9, 8, 1,
    ];

    (points, indices)
}

fn midpoint(
    a: u32,
    b: u32,
    points: &mut Vec<DVec3>,
    cache: &mut HashMap<(u32, u32), u32>,
) -> u32 {
    let key = if a < b { (a, b) } else { (b, a) };
    if let Some(&idx) = cache.get(&key) {
        return idx;
    }
    let mid = (points[a as usize] + points[b as usize]).normalize();
    let idx = points.len() as u32;
    points.push(mid);
    cache.insert(key, idx);
    idx
}

fn subdivide(points: &mut Vec<DVec3>, indices: &mut Vec<u32>) {
    let mut cache: HashMap<(u32, u32), u32> = HashMap::with_capacity(indices.len() / 2);
    let mut next = Vec::with_capacity(indices.len() * 4);

    for tri in indices.chunks_exact(3) {
        let (a, b, c) = (tri[0], tri[1], tri[2]);
        let ab = midpoint(a, b, points, &mut cache);
        let bc = midpoint(b, c, points, &mut cache);
        let ca = midpoint(c, a, points, &mut cache);

        next.extend_from_slice(&[a, ab, ca]);
        next.extend_from_slice(&[b, bc, ab]);
        next.extend_from_slice(&[c, ca, bc]);
        next.extend_from_slice(&[ab, bc, ca]);
    }

    *indices = next;
}

/// Builds the geodesic sphere for a level of detail (0 = bare icosahedron).
pub fn build_geodesic_sphere(level_of_detail: u32) -> (Vec<DVec3>, Vec<u32>) {
    let rounds = geodesic_subdivisions(level_of_detail);
    let (mut points, mut indices) = icosahedron();
    points.reserve(geodesic_vertex_count(rounds) - points.len());
    for _ in 0..rounds {
        subdivide(&mut points, &mut indices);
    }
    (points, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_icosahedron() {
        let (points, indices) = build_geodesic_sphere(0);
        assert_eq!(points.len(), 12);
        assert_eq!(indices.len(), 60);
    }

    #[test]
    fn test_counts_per_level() {
        for lod in 0..5 {
            let (points, indices) = build_geodesic_sphere(lod);
            assert_eq!(points.len(), geodesic_vertex_count(lod));
            assert_eq!(indices.len() / 3, geodesic_triangle_count(lod));
        }
    }

    #[test]
    fn test_one_round() {
        let (points, indices) = build_geodesic_sphere(1);
        assert_eq!(points.len(), 42);
        assert_eq!(indices.len() / 3, 80);
    }

    #[test]
    fn test_points_on_unit_sphere() {
        let (points, _) = build_geodesic_sphere(3);
        for p in points {
            assert!((p.length() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_level_is_capped() {
        assert_eq!(geodesic_subdivisions(40), MAX_GEODESIC_SUBDIVISIONS);
    }
}
