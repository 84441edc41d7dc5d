//! Heightmap baking and export.
//!
//! The baker resamples the height field onto an equirectangular raster.
//! Rasters can be written as 8-bit RGBA or 16-bit grayscale PNG for quick
//! viewing, or as float EXR for lossless inspection.

mod equirect;
mod error;
mod exr;
mod png;

pub use equirect::{bake, bake_with, direction_at, HeightmapRaster, MAX_RASTER_DIMENSION};
pub use error::ExportError;
pub use self::exr::{save_exr, ExrExportOptions};
pub use self::png::{save_luma16_png, save_rgba8_png, PngExportOptions};
