//! Generation stage trait and pipeline orchestration.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::TerrainError;
use crate::execution::{CancelToken, Cancelled, ExecutionMode};
use crate::export::{bake_with, ExportError, HeightmapRaster};
use crate::geometry::{SphereTopology, Topology};
use crate::params::GenerationParameters;
use crate::render::{RenderError, Shading};
use crate::terrain::{composite_with, CompositeStats, TerrainMesh, DEFAULT_WATER_DETAIL};

/// Unique identifier for generation stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageId {
    /// Unit-sphere points and connectivity.
    Topology,
    /// Sampling, displacement, colouring and normals.
    Surface,
    /// Equirectangular raster for the lit shading path.
    Heightmap,
}

impl StageId {
    /// Returns the name of the stage.
    pub fn name(&self) -> &'static str {
        match self {
            StageId::Topology => "topology",
            StageId::Surface => "surface",
            StageId::Heightmap => "heightmap",
        }
    }
}

/// Generator settings that are not part of the planet itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub topology: Topology,
    pub shading: Shading,
    /// Heightmap raster width, used by the lit shading path.
    pub raster_width: u32,
    pub raster_height: u32,
    pub execution: ExecutionMode,
    /// Subdivision rounds of the water shell.
    pub water_detail: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            topology: Topology::Geodesic,
            shading: Shading::VertexColor,
            raster_width: 512,
            raster_height: 256,
            execution: ExecutionMode::Serial,
            water_detail: DEFAULT_WATER_DETAIL,
        }
    }
}

impl GeneratorConfig {
    pub fn with_topology(topology: Topology) -> Self {
        Self {
            topology,
            ..Default::default()
        }
    }

    /// Lit shading with a `width` x `height` heightmap.
    pub fn shader_lit(mut self, width: u32, height: u32) -> Self {
        self.shading = Shading::ShaderLit;
        self.raster_width = width;
        self.raster_height = height;
        self
    }
}

/// Errors that can occur during pipeline execution.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Stage '{0}' failed: {1}")]
    StageFailed(String, String),
    #[error("Missing dependency: stage '{0}' requires '{1}'")]
    MissingDependency(String, String),
    #[error(transparent)]
    Terrain(#[from] TerrainError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

impl PipelineError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipelineError::Cancelled(_))
    }
}

/// Everything a stage may read besides the build it modifies.
#[derive(Debug, Clone, Copy)]
pub struct StageContext<'a> {
    pub params: &'a GenerationParameters,
    pub config: &'a GeneratorConfig,
    pub cancel: Option<&'a CancelToken>,
}

impl StageContext<'_> {
    fn check_cancelled(&self) -> Result<(), Cancelled> {
        match self.cancel {
            Some(token) => token.check(),
            None => Ok(()),
        }
    }
}

/// Intermediate products of one regeneration.
#[derive(Debug, Clone, Default)]
pub struct PlanetBuild {
    pub sphere: Option<SphereTopology>,
    pub mesh: Option<TerrainMesh>,
    pub stats: Option<CompositeStats>,
    pub raster: Option<HeightmapRaster>,
}

/// Trait for implementing generation stages.
///
/// Each stage fills in part of the [`PlanetBuild`], building upon previous
/// stages.
pub trait GenerationStage: Send + Sync {
    /// Returns the unique identifier for this stage.
    fn id(&self) -> StageId;

    /// Returns a human-readable name for the stage.
    fn name(&self) -> &str;

    /// Returns the stage IDs that must be executed before this stage.
    fn dependencies(&self) -> &[StageId] {
        &[]
    }

    /// Executes the generation stage, modifying the build in place.
    fn execute(&self, build: &mut PlanetBuild, ctx: &StageContext<'_>) -> Result<(), PipelineError>;
}

/// Orchestrates multiple generation stages into a complete pipeline.
pub struct Pipeline {
    stages: Vec<Box<dyn GenerationStage>>,
    config: GeneratorConfig,
}

impl Pipeline {
    /// Creates a new empty pipeline with the given configuration.
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            stages: Vec::new(),
            config,
        }
    }

    /// Topology and surface stages, plus the heightmap stage when the
    /// configuration asks for lit shading.
    pub fn standard(config: GeneratorConfig) -> Self {
        let lit = config.shading == Shading::ShaderLit;
        let mut pipeline = Self::new(config);
        pipeline.add_stage(TopologyStage).add_stage(SurfaceStage);
        if lit {
            pipeline.add_stage(HeightmapStage);
        }
        pipeline
    }

    /// Adds a stage to the pipeline.
    pub fn add_stage<S: GenerationStage + 'static>(&mut self, stage: S) -> &mut Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Returns the number of stages in the pipeline.
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Executes all stages in order.
    pub fn run(
        &self,
        params: &GenerationParameters,
        cancel: Option<&CancelToken>,
    ) -> Result<PlanetBuild, PipelineError> {
        self.run_with_callbacks(params, cancel, |_, _, _| {}, |_, _, _| {})
    }

    /// Executes all stages with progress callbacks.
    ///
    /// # Arguments
    /// * `on_stage_start` - Called when each stage begins
    /// * `on_stage_complete` - Called when each stage finishes
    pub fn run_with_callbacks<F1, F2>(
        &self,
        params: &GenerationParameters,
        cancel: Option<&CancelToken>,
        mut on_stage_start: F1,
        mut on_stage_complete: F2,
    ) -> Result<PlanetBuild, PipelineError>
    where
        F1: FnMut(&str, usize, usize),
        F2: FnMut(&str, usize, usize),
    {
        let ctx = StageContext {
            params,
            config: &self.config,
            cancel,
        };
        let total = self.stages.len();
        let mut build = PlanetBuild::default();
        let mut completed: Vec<StageId> = Vec::new();

        for (i, stage) in self.stages.iter().enumerate() {
            for dep in stage.dependencies() {
                if !completed.contains(dep) {
                    return Err(PipelineError::MissingDependency(
                        stage.name().to_string(),
                        dep.name().to_string(),
                    ));
                }
            }
            ctx.check_cancelled()?;

            on_stage_start(stage.name(), i, total);
            let start = Instant::now();
            stage.execute(&mut build, &ctx)?;
            log::debug!(
                "stage '{}' finished in {:.1} ms",
                stage.name(),
                start.elapsed().as_secs_f64() * 1000.0
            );
            completed.push(stage.id());
            on_stage_complete(stage.name(), i, total);
        }

        Ok(build)
    }
}

/// Builds the unit-sphere topology selected in the configuration.
pub struct TopologyStage;

impl GenerationStage for TopologyStage {
    fn id(&self) -> StageId {
        StageId::Topology
    }

    fn name(&self) -> &str {
        "Topology"
    }

    fn execute(&self, build: &mut PlanetBuild, ctx: &StageContext<'_>) -> Result<(), PipelineError> {
        let sphere = SphereTopology::build(ctx.params.level_of_detail, ctx.config.topology);
        if !sphere.validate() {
            return Err(PipelineError::StageFailed(
                self.name().to_string(),
                "index out of range".to_string(),
            ));
        }
        build.sphere = Some(sphere);
        Ok(())
    }
}

/// Samples heights and composites the displaced, coloured mesh.
pub struct SurfaceStage;

impl GenerationStage for SurfaceStage {
    fn id(&self) -> StageId {
        StageId::Surface
    }

    fn name(&self) -> &str {
        "Surface"
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::Topology]
    }

    fn execute(&self, build: &mut PlanetBuild, ctx: &StageContext<'_>) -> Result<(), PipelineError> {
        let sphere = build.sphere.as_ref().ok_or_else(|| {
            PipelineError::StageFailed(self.name().to_string(), "no topology".to_string())
        })?;
        let (mesh, stats) = composite_with(
            &sphere.points,
            &sphere.indices,
            ctx.params,
            ctx.config.execution,
            ctx.cancel,
        )?;
        build.mesh = Some(mesh);
        build.stats = Some(stats);
        Ok(())
    }
}

/// Bakes the heightmap raster.
pub struct HeightmapStage;

impl GenerationStage for HeightmapStage {
    fn id(&self) -> StageId {
        StageId::Heightmap
    }

    fn name(&self) -> &str {
        "Heightmap"
    }

    fn execute(&self, build: &mut PlanetBuild, ctx: &StageContext<'_>) -> Result<(), PipelineError> {
        let raster = bake_with(
            ctx.config.raster_width,
            ctx.config.raster_height,
            ctx.params,
            ctx.config.execution,
            ctx.cancel,
        )
        .map_err(|e| match e {
            ExportError::Raster(e) => PipelineError::Terrain(e),
            ExportError::Cancelled(c) => PipelineError::Cancelled(c),
            other => PipelineError::Export(other),
        })?;
        build.raster = Some(raster);
        Ok(())
    }
}
