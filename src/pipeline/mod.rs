//! Pipeline module for orchestrating planet generation stages.
//!
//! Provides a trait-based architecture for modular generation stages,
//! and the orchestrator that runs them on demand and swaps the result onto
//! the GPU.

mod orchestrator;
mod stage;

pub use orchestrator::{Generation, Orchestrator, OrchestratorState};
pub use stage::{
    GenerationStage, GeneratorConfig, HeightmapStage, Pipeline, PipelineError, PlanetBuild,
    StageContext, StageId, SurfaceStage, TopologyStage,
};
