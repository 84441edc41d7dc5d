use thiserror::Error;

use crate::error::TerrainError;
use crate::execution::Cancelled;

/// Errors that can occur while baking or writing a heightmap raster.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),
    #[error("IO / EXR error: {0}")]
    Exr(#[from] exr::error::Error),
    #[error(transparent)]
    Raster(#[from] TerrainError),
    #[error("Raster has {got} pixels, expected {expected}")]
    PixelCount { got: usize, expected: usize },
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}
