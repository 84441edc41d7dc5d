//! Planetgen CLI - Procedural planet terrain generator.
//!
//! Builds a displaced, biome-coloured planet mesh on a headless device and
//! optionally bakes and saves its equirectangular heightmap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use planetgen::biomes::BiomeKind;
use planetgen::execution::ExecutionMode;
use planetgen::export::{
    bake_with, save_exr, save_luma16_png, save_rgba8_png, ExrExportOptions, HeightmapRaster,
    PngExportOptions,
};
use planetgen::geometry::{geodesic_triangle_count, geodesic_vertex_count, uv_resolution, Topology};
use planetgen::params::{load_parameters, save_parameters, GenerationParameters, ParameterName};
use planetgen::pipeline::{GeneratorConfig, Orchestrator};
use planetgen::render::HeadlessDevice;
use planetgen::terrain::VertexRecord;

/// Procedural planet terrain generator.
#[derive(Parser)]
#[command(name = "planetgen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a planet mesh, optionally baking its heightmap.
    Generate {
        #[command(flatten)]
        planet: PlanetArgs,

        /// Mesh topology (uv or geodesic).
        #[arg(short, long, default_value = "geodesic")]
        topology: Topology,

        /// Bake a heightmap of this size, e.g. 1024x512.
        #[arg(long, value_parser = parse_size)]
        bake: Option<(u32, u32)>,

        /// Output directory for baked files.
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Base name for output files.
        #[arg(short, long, default_value = "planet")]
        name: String,

        /// Heightmap file format.
        #[arg(short, long, default_value = "png")]
        format: ExportFormat,

        /// Write the parameters used to this JSON file.
        #[arg(long)]
        save_params: Option<PathBuf>,
    },

    /// Bake only the heightmap raster.
    Bake {
        #[command(flatten)]
        planet: PlanetArgs,

        /// Raster size, e.g. 2048x1024.
        #[arg(long, value_parser = parse_size, default_value = "1024x512")]
        size: (u32, u32),

        /// Output directory for baked files.
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Base name for output files.
        #[arg(short, long, default_value = "planet")]
        name: String,

        /// Heightmap file format.
        #[arg(short, long, default_value = "png")]
        format: ExportFormat,
    },

    /// Display mesh sizes for a topology and level of detail.
    Info {
        /// Mesh topology (uv or geodesic).
        #[arg(short, long, default_value = "geodesic")]
        topology: Topology,

        /// Level of detail.
        #[arg(short, long, default_value = "5")]
        lod: u32,
    },
}

#[derive(Args)]
struct PlanetArgs {
    /// Load parameters from a JSON record; other flags override it.
    #[arg(long)]
    params: Option<PathBuf>,

    /// Random seed for reproducible generation (drawn at random if omitted).
    #[arg(short, long)]
    seed: Option<i64>,

    /// Level of detail (geodesic subdivisions or UV grid size).
    #[arg(short, long)]
    lod: Option<u32>,

    /// Use the Earth-like preset.
    #[arg(long, conflicts_with = "params")]
    earth_like: bool,

    /// Sample heights on all cores.
    #[arg(long)]
    parallel: bool,

    /// Override a parameter, e.g. `--set ocean_level=0.6`. Repeatable.
    #[arg(long = "set", value_parser = parse_assignment)]
    overrides: Vec<(ParameterName, f64)>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    /// 8-bit RGBA PNG.
    Png,
    /// 16-bit grayscale PNG.
    Png16,
    /// 32-bit float OpenEXR.
    Exr,
}

impl ExportFormat {
    fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png | ExportFormat::Png16 => "png",
            ExportFormat::Exr => "exr",
        }
    }
}

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(|c| c == 'x' || c == 'X')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
    let w = w.trim().parse::<u32>().map_err(|e| e.to_string())?;
    let h = h.trim().parse::<u32>().map_err(|e| e.to_string())?;
    Ok((w, h))
}

fn parse_assignment(s: &str) -> Result<(ParameterName, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))?;
    let name = name.trim().parse::<ParameterName>().map_err(|e| e.to_string())?;
    let value = value.trim().parse::<f64>().map_err(|e| e.to_string())?;
    Ok((name, value))
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate {
            planet,
            topology,
            bake,
            output,
            name,
            format,
            save_params,
        } => run_generate(&planet, topology, bake, &output, &name, format, save_params.as_deref()),
        Commands::Bake {
            planet,
            size,
            output,
            name,
            format,
        } => run_bake(&planet, size, &output, &name, format),
        Commands::Info { topology, lod } => {
            run_info(topology, lod);
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn resolve_params(args: &PlanetArgs) -> CliResult<GenerationParameters> {
    let mut params = match &args.params {
        Some(path) => load_parameters(path)?,
        None if args.earth_like => GenerationParameters::earth_like(0),
        None => GenerationParameters::default(),
    };
    if args.params.is_none() || args.seed.is_some() {
        match args.seed {
            Some(seed) => params.seed = seed,
            None => params.reseed(&mut rand::rng()),
        }
    }
    if let Some(lod) = args.lod {
        params.level_of_detail = lod;
    }
    for &(name, value) in &args.overrides {
        params.set(name, value)?;
    }
    Ok(params.clamped()?)
}

fn execution_mode(args: &PlanetArgs) -> ExecutionMode {
    if args.parallel {
        ExecutionMode::Parallel
    } else {
        ExecutionMode::Serial
    }
}

fn write_raster(
    raster: &HeightmapRaster,
    output: &Path,
    name: &str,
    format: ExportFormat,
) -> CliResult<PathBuf> {
    std::fs::create_dir_all(output)?;
    let path = output.join(format!("{}_height.{}", name, format.extension()));
    match format {
        ExportFormat::Png => save_rgba8_png(raster, &path, &PngExportOptions::default())?,
        ExportFormat::Png16 => save_luma16_png(raster, &path, &PngExportOptions::default())?,
        ExportFormat::Exr => save_exr(raster, &path, &ExrExportOptions::default())?,
    }
    Ok(path)
}

fn run_generate(
    args: &PlanetArgs,
    topology: Topology,
    bake: Option<(u32, u32)>,
    output: &Path,
    name: &str,
    format: ExportFormat,
    save_params: Option<&Path>,
) -> CliResult<()> {
    let params = resolve_params(args)?;

    println!("Planetgen - Procedural Planet Generator");
    println!("=======================================");
    println!("Topology: {} (lod {})", topology, params.level_of_detail);
    println!("Seed: {}", params.seed);
    println!("Radius: {}", params.radius);

    let mut config = GeneratorConfig::with_topology(topology);
    config.execution = execution_mode(args);
    if let Some((w, h)) = bake {
        config = config.shader_lit(w, h);
    }

    let start = Instant::now();
    let mut orchestrator = Orchestrator::new(HeadlessDevice::new(), params.clone(), config)?;
    let generation = orchestrator.regenerate()?;
    println!("Generation completed in {:.2?}", start.elapsed());

    let mesh = &generation.mesh;
    let stats = &generation.stats;
    println!();
    println!("Mesh:");
    println!("  Vertices:  {:>10}", mesh.vertex_count());
    println!("  Triangles: {:>10}", mesh.triangle_count());
    println!("  Height range: [{:.4}, {:.4}]", stats.min_height, stats.max_height);
    if stats.degenerate_normals > 0 {
        println!("  Degenerate normals: {}", stats.degenerate_normals);
    }
    println!("Biomes:");
    for biome in BiomeKind::all() {
        println!(
            "  {:<10} {:>10} ({:.1}%)",
            biome.name(),
            stats.count(biome),
            stats.fraction(biome) * 100.0
        );
    }

    if let Some(raster) = generation.render_mode.raster() {
        let path = write_raster(raster, output, name, format)?;
        println!("\nExported heightmap: {}", path.display());
    }

    if let Some(path) = save_params {
        save_parameters(&params, path)?;
        println!("Saved parameters: {}", path.display());
    }

    orchestrator.shutdown();
    println!("\nTotal time: {:.2?}", start.elapsed());
    println!("Done!");
    Ok(())
}

fn run_bake(
    args: &PlanetArgs,
    (width, height): (u32, u32),
    output: &Path,
    name: &str,
    format: ExportFormat,
) -> CliResult<()> {
    let params = resolve_params(args)?;

    println!("Planetgen - Heightmap Bake");
    println!("==========================");
    println!("Size: {}x{}", width, height);
    println!("Seed: {}", params.seed);

    let start = Instant::now();
    let raster = bake_with(width, height, &params, execution_mode(args), None)?;
    let (lo, hi) = raster.height_range();
    println!("Baked in {:.2?}, height range [{:.4}, {:.4}]", start.elapsed(), lo, hi);

    let path = write_raster(&raster, output, name, format)?;
    println!("Exported heightmap: {}", path.display());
    println!("Done!");
    Ok(())
}

fn run_info(topology: Topology, lod: u32) {
    let effective = topology.effective_level(lod);
    let (vertices, triangles) = match topology {
        Topology::Geodesic => (
            geodesic_vertex_count(effective),
            geodesic_triangle_count(effective),
        ),
        Topology::UvSphere => {
            let n = uv_resolution(lod) as usize;
            // Pole rows contribute one triangle per quad instead of two.
            (n * n, 2 * (n - 1) * (n - 1) - 2 * (n - 1))
        }
    };

    let vertex_bytes = vertices * std::mem::size_of::<VertexRecord>();
    let index_bytes = triangles * 3 * std::mem::size_of::<u32>();
    let mb = |b: usize| b as f64 / 1024.0 / 1024.0;

    println!("Planetgen - Mesh Configuration Info");
    println!("===================================");
    println!();
    println!("Topology: {}", topology);
    println!("Requested lod: {}  (effective {})", lod, effective);
    println!();
    println!("Counts:");
    println!("  Vertices:  {:>12}", vertices);
    println!("  Triangles: {:>12}", triangles);
    println!();
    println!("GPU memory:");
    println!("  Vertex buffer: {:>12} bytes ({:.2} MB)", vertex_bytes, mb(vertex_bytes));
    println!("  Index buffer:  {:>12} bytes ({:.2} MB)", index_bytes, mb(index_bytes));
    println!(
        "  Total:         {:>12} bytes ({:.2} MB)",
        vertex_bytes + index_bytes,
        mb(vertex_bytes + index_bytes)
    );
    if topology == Topology::UvSphere {
        println!();
        println!("Note: UV spheres duplicate pole vertices and the azimuth seam column.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_preset_conflicts_with_params_file() {
        let result = Cli::try_parse_from([
            "planetgen",
            "generate",
            "--params",
            "planet.json",
            "--earth-like",
        ]);
        let err = result.err().expect("preset and params file must conflict");
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);

        assert!(Cli::try_parse_from(["planetgen", "bake", "--earth-like"]).is_ok());
        assert!(Cli::try_parse_from(["planetgen", "bake", "--params", "planet.json"]).is_ok());
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_size("1024x512").unwrap(), (1024, 512));
        assert!(parse_size("1024").is_err());
        let (name, value) = parse_assignment("detail_octaves=3").unwrap();
        assert_eq!(name, ParameterName::DetailOctaves);
        assert_eq!(value, 3.0);
    }
}
