//! Biome classification and the debug colour palette.
//!
//! A biome is a pure function of `(raw_height, latitude, parameters)`:
//! - latitude above the polar cutoff is ice, whatever the height,
//! - otherwise height below the ocean level is ocean,
//! - otherwise the land band above the ocean level splits into lowland and
//!   highland halves.

use serde::{Deserialize, Serialize};

use crate::params::GenerationParameters;

/// Fraction of the land band (ocean level to 1.0) classified as lowland.
pub const LOWLAND_FRACTION: f64 = 0.5;
/// Width, in latitude, of the colour fade toward ice below the polar cutoff.
pub const ICE_BLEND_BAND: f64 = 0.05;

/// Terrain classification of one vertex. `as_u8()` is stable for storage/export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum BiomeKind {
    Ocean = 0,
    Lowland = 1,
    Highland = 2,
    PolarIce = 3,
}

impl BiomeKind {
    pub const fn all() -> [BiomeKind; 4] {
        [
            BiomeKind::Ocean,
            BiomeKind::Lowland,
            BiomeKind::Highland,
            BiomeKind::PolarIce,
        ]
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub const fn name(self) -> &'static str {
        match self {
            BiomeKind::Ocean => "ocean",
            BiomeKind::Lowland => "lowland",
            BiomeKind::Highland => "highland",
            BiomeKind::PolarIce => "polar_ice",
        }
    }

    /// Colours at the bottom and top of this biome's height band.
    pub fn palette(self) -> ([f32; 3], [f32; 3]) {
        match self {
            BiomeKind::Ocean => ([0.02, 0.07, 0.30], [0.10, 0.35, 0.70]),
            BiomeKind::Lowland => ([0.76, 0.70, 0.50], [0.20, 0.52, 0.18]),
            BiomeKind::Highland => ([0.42, 0.36, 0.28], [0.92, 0.92, 0.94]),
            BiomeKind::PolarIce => ([0.80, 0.87, 0.95], [1.00, 1.00, 1.00]),
        }
    }

    /// 8-bit preview colour at the middle of the band.
    pub fn preview_rgb(self) -> [u8; 3] {
        let (lo, hi) = self.palette();
        let c = lerp3(lo, hi, 0.5);
        c.map(|v| (v * 255.0).round() as u8)
    }
}

/// Height at which lowland gives way to highland.
pub fn highland_level(params: &GenerationParameters) -> f64 {
    params.ocean_level + (1.0 - params.ocean_level) * LOWLAND_FRACTION
}

/// True if `raw_height` lies below sea level.
///
/// An ocean level of 1.0 or more floods every non-polar point, including
/// those whose height was clamped to exactly 1.0.
pub fn is_submerged(raw_height: f64, params: &GenerationParameters) -> bool {
    raw_height < params.ocean_level || params.ocean_level >= 1.0
}

/// Classifies one sample.
pub fn classify(raw_height: f64, latitude: f64, params: &GenerationParameters) -> BiomeKind {
    if latitude > params.polar_cutoff {
        BiomeKind::PolarIce
    } else if is_submerged(raw_height, params) {
        BiomeKind::Ocean
    } else if raw_height < highland_level(params) {
        BiomeKind::Lowland
    } else {
        BiomeKind::Highland
    }
}

fn lerp3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

fn band_position(value: f64, low: f64, high: f64) -> f32 {
    if high - low <= f64::EPSILON {
        return 1.0;
    }
    ((value - low) / (high - low)).clamp(0.0, 1.0) as f32
}

/// RGBA debug colour for a classified sample.
///
/// Within each band the colour is interpolated by the sample's position in
/// that band. Non-polar samples close to the polar cutoff fade toward ice.
pub fn biome_color(
    biome: BiomeKind,
    raw_height: f64,
    latitude: f64,
    params: &GenerationParameters,
) -> [f32; 4] {
    let highland = highland_level(params);
    let t = match biome {
        BiomeKind::Ocean => band_position(raw_height, 0.0, params.ocean_level),
        BiomeKind::Lowland => band_position(raw_height, params.ocean_level, highland),
        BiomeKind::Highland => band_position(raw_height, highland, 1.0),
        BiomeKind::PolarIce => band_position(raw_height, 0.0, 1.0),
    };
    let (lo, hi) = biome.palette();
    let mut rgb = lerp3(lo, hi, t);

    if biome != BiomeKind::PolarIce {
        let fade_start = params.polar_cutoff - ICE_BLEND_BAND;
        if latitude > fade_start {
            let fade = band_position(latitude, fade_start, params.polar_cutoff);
            let (ice, _) = BiomeKind::PolarIce.palette();
            rgb = lerp3(rgb, ice, fade * 0.5);
        }
    }

    [rgb[0], rgb[1], rgb[2], 1.0]
}
