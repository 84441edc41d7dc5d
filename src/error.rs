//! Errors surfaced at the generation API boundary.

use thiserror::Error;

/// Rejections raised before any resource is touched.
///
/// Geometry degeneracies are not represented here: they are recovered inside
/// the compositor and only counted in its statistics.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TerrainError {
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },
    #[error("Invalid raster dimensions: {0}x{1}")]
    InvalidRasterDimensions(u32, u32),
}

impl TerrainError {
    pub(crate) fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        TerrainError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
