//! Regeneration orchestrator.
//!
//! Owns the parameters, the generator configuration, the device and the
//! currently displayed generation. Edits are collected first and applied by
//! an explicit [`Orchestrator::regenerate`]. A new generation is fully built
//! and uploaded before it replaces the displayed one; on any failure the
//! resources created so far are released and the displayed generation is
//! left untouched.

use std::time::Instant;

use rand::Rng;

use crate::execution::CancelToken;
use crate::geometry::Topology;
use crate::params::{GenerationParameters, ParameterName};
use crate::render::{
    MeshHandle, RenderDevice, RenderMode, ShaderHandle, ShaderKind, Shading, TextureHandle,
};
use crate::terrain::{CompositeStats, TerrainMesh, WaterShell, WaterUniforms};
use super::stage::{GeneratorConfig, Pipeline, PipelineError};

/// Lifecycle of the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    /// Nothing generated yet, or shut down.
    Idle,
    /// A regeneration is in progress.
    Regenerating,
    /// A complete generation is displayed.
    Ready,
}

/// One complete, uploaded generation.
#[derive(Debug)]
pub struct Generation {
    pub params: GenerationParameters,
    pub topology: Topology,
    pub mesh: TerrainMesh,
    pub stats: CompositeStats,
    pub render_mode: RenderMode,
    /// Monotonic counter, 1 for the first generation.
    pub serial: u64,
    mesh_handle: MeshHandle,
    texture: Option<TextureHandle>,
    shader: ShaderHandle,
}

impl Generation {
    pub fn mesh_handle(&self) -> MeshHandle {
        self.mesh_handle
    }

    pub fn texture(&self) -> Option<TextureHandle> {
        self.texture
    }

    pub fn shader(&self) -> ShaderHandle {
        self.shader
    }
}

/// Resources created during a regeneration that is not committed yet.
#[derive(Default)]
struct Staged {
    mesh: Option<MeshHandle>,
    texture: Option<TextureHandle>,
    shader: Option<ShaderHandle>,
}

impl Staged {
    fn release<D: RenderDevice>(self, device: &mut D) {
        if let Some(handle) = self.mesh {
            device.release_mesh_buffers(handle);
        }
        if let Some(handle) = self.texture {
            device.release_texture(handle);
        }
        if let Some(handle) = self.shader {
            device.release_shader(handle);
        }
    }
}

struct WaterResources {
    mesh: MeshHandle,
    shader: ShaderHandle,
}

fn upload_water<D: RenderDevice>(
    device: &mut D,
    water: &WaterShell,
) -> Result<WaterResources, PipelineError> {
    let mesh = device.create_mesh_buffers(water.mesh())?;
    match device.load_shader(ShaderKind::Water) {
        Ok(shader) => Ok(WaterResources { mesh, shader }),
        Err(e) => {
            device.release_mesh_buffers(mesh);
            Err(e.into())
        }
    }
}

pub struct Orchestrator<D: RenderDevice> {
    device: D,
    params: GenerationParameters,
    config: GeneratorConfig,
    state: OrchestratorState,
    dirty: bool,
    current: Option<Generation>,
    water: WaterShell,
    water_resources: Option<WaterResources>,
    generations: u64,
}

impl<D: RenderDevice> Orchestrator<D> {
    /// Takes ownership of `device` and uploads the water shell.
    ///
    /// Parameters are clamped; a parameter that cannot be clamped is an error.
    pub fn new(
        mut device: D,
        params: GenerationParameters,
        config: GeneratorConfig,
    ) -> Result<Self, PipelineError> {
        let params = params.clamped()?;
        let water = WaterShell::with_detail(&params, config.water_detail);
        let water_resources = upload_water(&mut device, &water)?;

        Ok(Self {
            device,
            params,
            config,
            state: OrchestratorState::Idle,
            dirty: true,
            current: None,
            water,
            water_resources: Some(water_resources),
            generations: 0,
        })
    }

    pub fn params(&self) -> &GenerationParameters {
        &self.params
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    /// True if edits were made since the displayed generation was built.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn current(&self) -> Option<&Generation> {
        self.current.as_ref()
    }

    pub fn mesh(&self) -> Option<&TerrainMesh> {
        self.current.as_ref().map(|g| &g.mesh)
    }

    pub fn render_mode(&self) -> Option<&RenderMode> {
        self.current.as_ref().map(|g| &g.render_mode)
    }

    pub fn water(&self) -> &WaterShell {
        &self.water
    }

    pub fn water_mesh_handle(&self) -> Option<MeshHandle> {
        self.water_resources.as_ref().map(|w| w.mesh)
    }

    pub fn water_uniforms(&self) -> WaterUniforms {
        self.water.uniforms()
    }

    /// Advances the water animation by `dt` seconds.
    pub fn advance_water(&mut self, dt: f32) {
        self.water.advance(dt);
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Sets one parameter by name, clamping into range.
    ///
    /// Takes effect at the next [`Orchestrator::regenerate`], except that the
    /// water shell follows sea-level changes immediately.
    pub fn set_parameter(&mut self, name: &str, value: f64) -> Result<f64, PipelineError> {
        let name: ParameterName = name.parse()?;
        self.set(name, value)
    }

    pub fn set(&mut self, name: ParameterName, value: f64) -> Result<f64, PipelineError> {
        let stored = self.params.set(name, value)?;
        self.dirty = true;
        if matches!(
            name,
            ParameterName::OceanLevel | ParameterName::Radius | ParameterName::ElevationScale
        ) {
            self.water.set_ocean_level(&self.params);
        }
        Ok(stored)
    }

    /// Replaces every parameter at once.
    pub fn update_parameters(&mut self, params: GenerationParameters) -> Result<(), PipelineError> {
        self.params = params.clamped()?;
        self.water.set_ocean_level(&self.params);
        self.dirty = true;
        Ok(())
    }

    /// Draws a fresh seed.
    pub fn reseed<R: Rng>(&mut self, rng: &mut R) {
        self.params.reseed(rng);
        self.dirty = true;
    }

    pub fn set_topology(&mut self, topology: Topology) {
        if self.config.topology != topology {
            self.config.topology = topology;
            self.dirty = true;
        }
    }

    pub fn set_shading(&mut self, shading: Shading) {
        if self.config.shading != shading {
            self.config.shading = shading;
            self.dirty = true;
        }
    }

    pub fn set_config(&mut self, config: GeneratorConfig) {
        if self.config != config {
            self.config = config;
            self.dirty = true;
        }
    }

    /// Rebuilds and swaps in a new generation.
    pub fn regenerate(&mut self) -> Result<&Generation, PipelineError> {
        self.regenerate_with(&CancelToken::new())
    }

    /// [`Orchestrator::regenerate`], checking `cancel` between stages and
    /// between sample batches.
    pub fn regenerate_with(&mut self, cancel: &CancelToken) -> Result<&Generation, PipelineError> {
        let previous_state = self.state;
        self.state = OrchestratorState::Regenerating;
        let start = Instant::now();

        match self.build_generation(cancel) {
            Ok(generation) => {
                log::info!(
                    "generation {} ready: {} vertices, {} triangles ({}, lod {}) in {:.1} ms",
                    generation.serial,
                    generation.mesh.vertex_count(),
                    generation.mesh.triangle_count(),
                    generation.topology,
                    generation.params.level_of_detail,
                    start.elapsed().as_secs_f64() * 1000.0
                );
                if let Some(old) = self.current.replace(generation) {
                    self.release_generation(old);
                }
                self.state = OrchestratorState::Ready;
                self.dirty = false;
                self.current.as_ref().ok_or_else(|| {
                    PipelineError::StageFailed("commit".into(), "generation missing".into())
                })
            }
            Err(e) => {
                log::warn!("regeneration failed, keeping previous generation: {}", e);
                self.state = previous_state;
                Err(e)
            }
        }
    }

    fn build_generation(&mut self, cancel: &CancelToken) -> Result<Generation, PipelineError> {
        self.params.validate()?;
        if self.water_resources.is_none() {
            self.water_resources = Some(upload_water(&mut self.device, &self.water)?);
        }
        let params = self.params.clone();
        let config = self.config.clone();

        let build = Pipeline::standard(config.clone()).run(&params, Some(cancel))?;
        let mesh = build.mesh.ok_or_else(|| {
            PipelineError::StageFailed("surface".into(), "no mesh produced".into())
        })?;
        let stats = build.stats.unwrap_or_default();
        let render_mode = match (config.shading, build.raster) {
            (Shading::VertexColor, _) => RenderMode::VertexColor,
            (Shading::ShaderLit, Some(raster)) => RenderMode::ShaderLit(raster),
            (Shading::ShaderLit, None) => {
                return Err(PipelineError::StageFailed(
                    "heightmap".into(),
                    "no raster produced".into(),
                ))
            }
        };

        let mut staged = Staged::default();
        match self.upload(&mesh, &render_mode, &mut staged) {
            Ok(()) => {}
            Err(e) => {
                staged.release(&mut self.device);
                return Err(e);
            }
        }

        let (Some(mesh_handle), Some(shader)) = (staged.mesh, staged.shader) else {
            staged.release(&mut self.device);
            return Err(PipelineError::StageFailed(
                "upload".into(),
                "incomplete upload".into(),
            ));
        };

        self.generations += 1;
        Ok(Generation {
            params,
            topology: config.topology,
            mesh,
            stats,
            render_mode,
            serial: self.generations,
            mesh_handle,
            texture: staged.texture,
            shader,
        })
    }

    fn upload(
        &mut self,
        mesh: &TerrainMesh,
        render_mode: &RenderMode,
        staged: &mut Staged,
    ) -> Result<(), PipelineError> {
        staged.mesh = Some(self.device.create_mesh_buffers(mesh)?);
        if let Some(raster) = render_mode.raster() {
            staged.texture = Some(self.device.create_texture(raster)?);
        }
        staged.shader = Some(
            self.device
                .load_shader(ShaderKind::for_shading(render_mode.shading()))?,
        );
        Ok(())
    }

    fn release_generation(&mut self, generation: Generation) {
        Staged {
            mesh: Some(generation.mesh_handle),
            texture: generation.texture,
            shader: Some(generation.shader),
        }
        .release(&mut self.device);
    }

    /// Releases every GPU resource and returns to `Idle`.
    ///
    /// The next [`Orchestrator::regenerate`] uploads the water shell again.
    pub fn shutdown(&mut self) {
        if let Some(generation) = self.current.take() {
            self.release_generation(generation);
        }
        if let Some(water) = self.water_resources.take() {
            self.device.release_mesh_buffers(water.mesh);
            self.device.release_shader(water.shader);
        }
        self.state = OrchestratorState::Idle;
        self.dirty = true;
    }
}

impl<D: RenderDevice> Drop for Orchestrator<D> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::HeadlessDevice;

    fn orchestrator(config: GeneratorConfig) -> Orchestrator<HeadlessDevice> {
        Orchestrator::new(HeadlessDevice::new(), GenerationParameters::minimal(), config).unwrap()
    }

    #[test]
    fn test_state_machine() {
        let mut orch = orchestrator(GeneratorConfig::default());
        assert_eq!(orch.state(), OrchestratorState::Idle);
        assert!(orch.is_dirty());
        assert!(orch.mesh().is_none());

        orch.regenerate().unwrap();
        assert_eq!(orch.state(), OrchestratorState::Ready);
        assert!(!orch.is_dirty());
        assert_eq!(orch.mesh().unwrap().vertex_count(), 42);

        orch.set_parameter("oceanLevel", 0.6).unwrap();
        assert!(orch.is_dirty());
        assert_eq!(orch.state(), OrchestratorState::Ready);
    }

    #[test]
    fn test_swap_releases_previous() {
        let mut orch = orchestrator(GeneratorConfig::default());
        orch.regenerate().unwrap();
        let first = orch.current().unwrap().mesh_handle();
        orch.regenerate().unwrap();
        let second = orch.current().unwrap().mesh_handle();
        assert_ne!(first, second);
        assert_eq!(orch.current().unwrap().serial, 2);

        // Water shell + current terrain.
        assert_eq!(orch.device().live_meshes(), 2);
        assert_eq!(orch.device().live_shaders(), 2);
        assert_eq!(orch.device().mesh_vertex_count(first), None);
    }

    #[test]
    fn test_failure_keeps_previous_generation() {
        let mut orch = orchestrator(GeneratorConfig::default());
        orch.regenerate().unwrap();
        let before = orch.mesh().unwrap().clone();

        orch.set_parameter("seed", 1234.0).unwrap();
        orch.set_config(GeneratorConfig::default().shader_lit(64, 32));
        orch.device_mut().set_fail_texture_uploads(true);
        assert!(orch.regenerate().is_err());

        assert_eq!(orch.state(), OrchestratorState::Ready);
        assert!(orch.is_dirty());
        assert_eq!(orch.mesh().unwrap(), &before);
        // The mesh uploaded before the texture failure was released again.
        assert_eq!(orch.device().live_meshes(), 2);
        assert_eq!(orch.device().live_textures(), 0);
    }

    #[test]
    fn test_invalid_raster_rejected_before_upload() {
        let mut orch = orchestrator(GeneratorConfig::default().shader_lit(0, 0));
        let created = orch.device().counters().meshes_created;
        assert!(matches!(orch.regenerate(), Err(PipelineError::Terrain(_))));
        assert_eq!(orch.state(), OrchestratorState::Idle);
        assert_eq!(orch.device().counters().meshes_created, created);
    }

    #[test]
    fn test_shader_lit_mode_carries_raster() {
        let mut orch = orchestrator(GeneratorConfig::default().shader_lit(32, 16));
        let generation = orch.regenerate().unwrap();
        let raster = generation.render_mode.raster().unwrap();
        assert_eq!((raster.width, raster.height), (32, 16));
        assert!(generation.texture().is_some());
    }

    #[test]
    fn test_cancel_keeps_state() {
        let mut orch = orchestrator(GeneratorConfig::default());
        let token = CancelToken::new();
        token.cancel();
        let err = orch.regenerate_with(&token).unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(orch.state(), OrchestratorState::Idle);
        assert!(orch.mesh().is_none());
    }

    #[test]
    fn test_ocean_edit_moves_water_only() {
        let mut orch = orchestrator(GeneratorConfig::default());
        orch.regenerate().unwrap();
        let mesh_before = orch.mesh().unwrap().clone();
        let radius_before = orch.water().radius();

        orch.set_parameter("ocean_level", 0.9).unwrap();
        assert!(orch.water().radius() > radius_before);
        assert_eq!(orch.mesh().unwrap(), &mesh_before);
        assert_eq!(orch.water_uniforms().ocean_level, 0.9);
    }

    #[test]
    fn test_clamp_and_reject() {
        let mut orch = orchestrator(GeneratorConfig::default());
        assert_eq!(orch.set_parameter("oceanLevel", -5.0).unwrap(), 0.0);
        assert_eq!(orch.params().ocean_level, 0.0);
        assert!(orch.set_parameter("radius", -1.0).is_err());
        assert!(orch.set_parameter("gravity", 1.0).is_err());
        assert_eq!(orch.params().radius, 1.0);
    }

    #[test]
    fn test_shutdown_releases_everything() {
        let mut orch = orchestrator(GeneratorConfig::default().shader_lit(8, 4));
        orch.regenerate().unwrap();
        orch.regenerate().unwrap();
        orch.shutdown();
        assert_eq!(orch.state(), OrchestratorState::Idle);
        assert_eq!(orch.device().live_resources(), 0);
        let c = orch.device().counters();
        assert_eq!(c.meshes_created, c.meshes_released);
        assert_eq!(c.textures_created, c.textures_released);
        assert_eq!(c.shaders_loaded, c.shaders_released);
    }

    #[test]
    fn test_regenerate_after_shutdown_restores_water() {
        let mut orch = orchestrator(GeneratorConfig::default());
        orch.regenerate().unwrap();
        orch.shutdown();
        assert!(orch.water_mesh_handle().is_none());

        orch.regenerate().unwrap();
        let water = orch.water_mesh_handle().unwrap();
        assert!(orch.device().mesh_vertex_count(water).is_some());
        // Water shell + terrain, each with its shader.
        assert_eq!(orch.device().live_meshes(), 2);
        assert_eq!(orch.device().live_shaders(), 2);
    }
}
