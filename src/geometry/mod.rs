//! Sphere mesh topologies.
//!
//! Produces unit-length sample points and triangle connectivity for either a
//! latitude/longitude grid or a subdivided icosahedron. Nothing here knows
//! about elevation.

mod geodesic;
mod spherical;
mod topology;
mod uv_sphere;

pub use geodesic::{
    build_geodesic_sphere, geodesic_subdivisions, geodesic_triangle_count,
    geodesic_vertex_count, MAX_GEODESIC_SUBDIVISIONS,
};
pub use spherical::{col_to_phi, row_to_theta, spherical_to_unit, unit_to_spherical};
pub use topology::{build, SphereTopology, Topology};
pub use uv_sphere::{build_uv_sphere, uv_resolution, MAX_UV_RESOLUTION, MIN_UV_RESOLUTION};
