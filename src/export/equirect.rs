//! Equirectangular heightmap baking.
//!
//! Each raster cell is mapped back to a direction on the unit sphere and the
//! height field is sampled there directly, so the raster never depends on the
//! mesh. Rows run from the north pole (row 0) to the south pole, columns run
//! eastward in azimuth from +X.

use glam::DVec3;
use rayon::prelude::*;

use crate::error::TerrainError;
use crate::execution::{CancelToken, ExecutionMode, BATCH_SIZE};
use crate::geometry::{col_to_phi, row_to_theta, spherical_to_unit, unit_to_spherical};
use crate::noise::HeightField;
use crate::params::GenerationParameters;
use super::error::ExportError;

/// Largest accepted raster edge.
pub const MAX_RASTER_DIMENSION: u32 = 16_384;

/// Raw heights baked onto a longitude x latitude grid, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightmapRaster {
    pub width: u32,
    pub height: u32,
    /// Raw heights in [0, 1].
    pub pixels: Vec<f32>,
}

/// Unit direction sampled by cell `(row, col)` of a `width` x `height` raster.
pub fn direction_at(row: u32, col: u32, width: u32, height: u32) -> DVec3 {
    spherical_to_unit(row_to_theta(row, height), col_to_phi(col, width))
}

fn check_dimensions(width: u32, height: u32) -> Result<(), TerrainError> {
    if width == 0 || height == 0 || width > MAX_RASTER_DIMENSION || height > MAX_RASTER_DIMENSION {
        return Err(TerrainError::InvalidRasterDimensions(width, height));
    }
    Ok(())
}

/// Bakes the height field for `params` into a `width` x `height` raster.
pub fn bake(
    width: u32,
    height: u32,
    params: &GenerationParameters,
) -> Result<HeightmapRaster, TerrainError> {
    match bake_with(width, height, params, ExecutionMode::Serial, None) {
        Ok(raster) => Ok(raster),
        Err(ExportError::Raster(e)) => Err(e),
        // Only dimension and parameter checks can fail without a cancel token.
        Err(other) => Err(TerrainError::invalid("raster", other.to_string())),
    }
}

/// [`bake`] with a choice of execution mode and optional cancellation.
///
/// Rows are processed in batches of roughly [`BATCH_SIZE`] cells; the token
/// is checked before each batch.
pub fn bake_with(
    width: u32,
    height: u32,
    params: &GenerationParameters,
    mode: ExecutionMode,
    cancel: Option<&CancelToken>,
) -> Result<HeightmapRaster, ExportError> {
    check_dimensions(width, height)?;
    params.validate()?;

    let field = HeightField::new(params);
    let w = width as usize;
    let rows_per_batch = (BATCH_SIZE / w).max(1);
    let mut pixels = vec![0.0f32; w * height as usize];

    let fill_row = |row: u32, out: &mut [f32]| {
        for (col, px) in out.iter_mut().enumerate() {
            let dir = direction_at(row, col as u32, width, height);
            *px = field.sample(dir).raw_height as f32;
        }
    };

    for (batch, chunk) in pixels.chunks_mut(rows_per_batch * w).enumerate() {
        if let Some(token) = cancel {
            token.check()?;
        }
        let first_row = batch * rows_per_batch;
        match mode {
            ExecutionMode::Serial => chunk
                .chunks_mut(w)
                .enumerate()
                .for_each(|(k, out)| fill_row((first_row + k) as u32, out)),
            ExecutionMode::Parallel => chunk
                .par_chunks_mut(w)
                .enumerate()
                .for_each(|(k, out)| fill_row((first_row + k) as u32, out)),
        }
    }

    Ok(HeightmapRaster {
        width,
        height,
        pixels,
    })
}

impl HeightmapRaster {
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn get(&self, row: u32, col: u32) -> f32 {
        self.pixels[(row * self.width + col) as usize]
    }

    /// Direction sampled by cell `(row, col)`.
    pub fn direction_at(&self, row: u32, col: u32) -> DVec3 {
        direction_at(row, col, self.width, self.height)
    }

    /// Cell whose area contains `dir`.
    pub fn cell_at(&self, dir: DVec3) -> (u32, u32) {
        let (theta, phi) = unit_to_spherical(dir);
        let row = (theta / std::f64::consts::PI * self.height as f64) as u32;
        let col = (phi / std::f64::consts::TAU * self.width as f64) as u32;
        (row.min(self.height - 1), col.min(self.width - 1))
    }

    /// Nearest-cell height at `dir`.
    pub fn sample_nearest(&self, dir: DVec3) -> f32 {
        let (row, col) = self.cell_at(dir);
        self.get(row, col)
    }

    pub fn height_range(&self) -> (f32, f32) {
        self.pixels
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), &h| (lo.min(h), hi.max(h)))
    }

    fn check_len(&self) -> Result<(), ExportError> {
        if self.pixels.len() != self.pixel_count() {
            return Err(ExportError::PixelCount {
                got: self.pixels.len(),
                expected: self.pixel_count(),
            });
        }
        Ok(())
    }

    /// Row-major grey RGBA8, alpha 255.
    pub fn to_rgba8(&self) -> Result<Vec<u8>, ExportError> {
        self.check_len()?;
        let mut out = Vec::with_capacity(self.pixels.len() * 4);
        for &h in &self.pixels {
            let v = (h.clamp(0.0, 1.0) * 255.0).round() as u8;
            out.extend_from_slice(&[v, v, v, 255]);
        }
        Ok(out)
    }

    /// Row-major 16-bit grey.
    pub fn to_luma16(&self) -> Result<Vec<u16>, ExportError> {
        self.check_len()?;
        Ok(self
            .pixels
            .iter()
            .map(|&h| (h.clamp(0.0, 1.0) * 65535.0).round() as u16)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::sample;

    #[test]
    fn test_zero_dimensions_rejected() {
        let params = GenerationParameters::default();
        assert_eq!(bake(0, 16, &params), Err(TerrainError::InvalidRasterDimensions(0, 16)));
        assert_eq!(bake(16, 0, &params), Err(TerrainError::InvalidRasterDimensions(16, 0)));
        assert!(bake(MAX_RASTER_DIMENSION + 1, 4, &params).is_err());
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = GenerationParameters {
            radius: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            bake(8, 4, &params),
            Err(TerrainError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_bake_matches_synthesizer() {
        let params = GenerationParameters::with_seed(7);
        for &(w, h) in &[(16, 8), (37, 19)] {
            let raster = bake(w, h, &params).unwrap();
            assert_eq!(raster.pixels.len(), (w * h) as usize);
            for row in (0..h).step_by(3) {
                for col in (0..w).step_by(5) {
                    let expected = sample(raster.direction_at(row, col), &params).raw_height;
                    assert!((raster.get(row, col) as f64 - expected).abs() < 1e-6);
                }
            }
        }
    }

    #[test]
    fn test_cell_lookup_roundtrip() {
        let raster = bake(32, 16, &GenerationParameters::default()).unwrap();
        for row in 0..16 {
            for col in 0..32 {
                assert_eq!(raster.cell_at(raster.direction_at(row, col)), (row, col));
            }
        }
    }

    #[test]
    fn test_modes_agree_and_cancel() {
        let params = GenerationParameters::default();
        let serial = bake_with(300, 40, &params, ExecutionMode::Serial, None).unwrap();
        let parallel = bake_with(300, 40, &params, ExecutionMode::Parallel, None).unwrap();
        assert_eq!(serial, parallel);

        let token = CancelToken::new();
        token.cancel();
        let result = bake_with(300, 40, &params, ExecutionMode::Parallel, Some(&token));
        assert!(matches!(result, Err(ExportError::Cancelled(_))));
    }

    #[test]
    fn test_pixel_conversions() {
        let raster = HeightmapRaster {
            width: 2,
            height: 1,
            pixels: vec![0.0, 1.0],
        };
        assert_eq!(raster.to_rgba8().unwrap(), vec![0, 0, 0, 255, 255, 255, 255, 255]);
        assert_eq!(raster.to_luma16().unwrap(), vec![0, 65535]);

        let broken = HeightmapRaster {
            width: 3,
            height: 3,
            pixels: vec![0.5; 4],
        };
        assert!(broken.to_rgba8().is_err());
    }
}
