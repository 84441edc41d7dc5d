//! OpenEXR export (lossless float heights).

use std::path::Path;

use exr::image::{AnyChannel, AnyChannels, FlatSamples, Image, Layer};
use exr::meta::header::LayerAttributes;
use exr::prelude::{Encoding, WritableImage};

use super::equirect::HeightmapRaster;
use super::error::ExportError;

/// Options for EXR export.
#[derive(Debug, Clone)]
pub struct ExrExportOptions {
    /// Compression/encoding choice.
    pub encoding: Encoding,
    /// Layer name in the EXR file.
    pub layer_name: &'static str,
}

impl Default for ExrExportOptions {
    fn default() -> Self {
        Self {
            encoding: Encoding::FAST_LOSSLESS,
            layer_name: "planetgen",
        }
    }
}

/// Writes the raster as a single-layer EXR with one f32 `height` channel.
pub fn save_exr(
    raster: &HeightmapRaster,
    path: &Path,
    options: &ExrExportOptions,
) -> Result<(), ExportError> {
    if raster.pixels.len() != raster.pixel_count() {
        return Err(ExportError::PixelCount {
            got: raster.pixels.len(),
            expected: raster.pixel_count(),
        });
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let channels = vec![AnyChannel::new(
        "height",
        FlatSamples::F32(raster.pixels.clone()),
    )];
    let layer = Layer::new(
        (raster.width as usize, raster.height as usize),
        LayerAttributes::named(options.layer_name),
        options.encoding,
        AnyChannels::sort(channels.into()),
    );

    Image::from_layer(layer).write().to_file(path)?;
    Ok(())
}
