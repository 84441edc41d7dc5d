//! PNG export for baked heightmaps.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::ImageEncoder;

use super::equirect::HeightmapRaster;
use super::error::ExportError;

/// Options for PNG export.
#[derive(Debug, Clone)]
pub struct PngExportOptions {
    /// PNG compression type.
    pub compression: CompressionType,
    /// PNG filter type.
    pub filter: FilterType,
}

impl Default for PngExportOptions {
    fn default() -> Self {
        Self {
            compression: CompressionType::Default,
            filter: FilterType::Adaptive,
        }
    }
}

fn create_writer(path: &Path) -> Result<BufWriter<File>, ExportError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(BufWriter::new(File::create(path)?))
}

/// Writes the raster as a row-major 8-bit RGBA PNG (grey, opaque).
pub fn save_rgba8_png(
    raster: &HeightmapRaster,
    path: &Path,
    options: &PngExportOptions,
) -> Result<(), ExportError> {
    let rgba = raster.to_rgba8()?;
    let encoder = PngEncoder::new_with_quality(create_writer(path)?, options.compression, options.filter);
    encoder.write_image(
        &rgba,
        raster.width,
        raster.height,
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(())
}

/// Writes the raster as a 16-bit grayscale PNG.
pub fn save_luma16_png(
    raster: &HeightmapRaster,
    path: &Path,
    options: &PngExportOptions,
) -> Result<(), ExportError> {
    let luma = raster.to_luma16()?;
    let encoder = PngEncoder::new_with_quality(create_writer(path)?, options.compression, options.filter);

    // Native-endian samples; the encoder does the byte swap.
    let byte_slice: &[u8] = bytemuck::cast_slice(&luma);
    encoder.write_image(
        byte_slice,
        raster.width,
        raster.height,
        image::ExtendedColorType::L16,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::bake;
    use crate::params::GenerationParameters;
    use tempfile::tempdir;

    #[test]
    fn test_rgba8_roundtrip() {
        let raster = bake(32, 16, &GenerationParameters::default()).unwrap();
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("height.png");
        save_rgba8_png(&raster, &path, &PngExportOptions::default()).unwrap();

        let img = image::open(&path).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (32, 16));
        assert_eq!(img.as_raw(), &raster.to_rgba8().unwrap());
    }

    #[test]
    fn test_luma16_roundtrip() {
        let raster = HeightmapRaster {
            width: 3,
            height: 2,
            pixels: vec![0.0, 0.25, 0.5, 0.75, 1.0, 0.1],
        };
        let dir = tempdir().unwrap();
        let path = dir.path().join("height16.png");
        save_luma16_png(&raster, &path, &PngExportOptions::default()).unwrap();

        let img = image::open(&path).unwrap();
        assert_eq!(img.color(), image::ColorType::L16);
        let luma = img.to_luma16();
        assert_eq!(luma.as_raw(), &raster.to_luma16().unwrap());
    }

    #[test]
    fn test_bad_raster_not_written() {
        let raster = HeightmapRaster {
            width: 4,
            height: 4,
            pixels: vec![0.0; 3],
        };
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.png");
        assert!(save_rgba8_png(&raster, &path, &PngExportOptions::default()).is_err());
        assert!(!path.exists());
    }
}
