//! Procedural planetary terrain generator.
//!
//! This crate generates a seeded sphere-shaped landmass (continents, oceans,
//! mountains and polar ice) as a displaced, biome-coloured mesh on either a
//! UV-sphere or a geodesic topology, bakes the same height field into an
//! equirectangular heightmap, and keeps both on the GPU through a
//! regeneration orchestrator.

pub mod biomes;
pub mod error;
pub mod execution;
pub mod export;
pub mod geometry;
pub mod noise;
pub mod params;
pub mod pipeline;
pub mod render;
pub mod terrain;

pub use biomes::BiomeKind;
pub use error::TerrainError;
pub use execution::{CancelToken, ExecutionMode};
pub use export::{bake, HeightmapRaster};
pub use geometry::{build, SphereTopology, Topology};
pub use noise::{sample, HeightField, HeightSample};
pub use params::{GenerationParameters, ParameterName};
pub use pipeline::{GeneratorConfig, Orchestrator, OrchestratorState, PipelineError};
pub use render::{HeadlessDevice, RenderMode, Shading};
pub use terrain::{composite, ElevationSample, TerrainMesh, VertexRecord, WaterShell};
