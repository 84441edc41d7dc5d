//! Generation parameters.
//!
//! `GenerationParameters` is the single value type that drives every stage of
//! planet generation. Out-of-range values are clamped into their documented
//! range; only values that cannot be clamped meaningfully (a non-positive
//! radius or frequency, NaN) are rejected.

mod record;

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::TerrainError;

pub use record::{load_parameters, save_parameters, RecordError};

/// Largest accepted radius in world units.
pub const MAX_RADIUS: f64 = 1.0e7;
/// Accepted frequency range for every noise layer.
pub const FREQUENCY_RANGE: (f64, f64) = (1.0e-3, 64.0);
/// Highest level of detail accepted before a topology applies its own cap.
pub const MAX_LEVEL_OF_DETAIL: u32 = 1024;
/// Upper bound on octaves per noise layer.
pub const MAX_OCTAVES: u8 = 8;

/// Parameters for one generated planet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationParameters {
    /// Sphere radius in world units (> 0).
    pub radius: f64,
    /// Noise seed. Same seed and parameters produce a bit-identical mesh.
    pub seed: i64,
    /// Frequency of the broad landmass layer.
    pub continent_frequency: f64,
    /// Frequency of the ridge layer.
    pub mountain_frequency: f64,
    /// Frequency of the fine roughness layer.
    pub detail_frequency: f64,
    /// Weight of the landmass layer in [0, 1].
    pub continent_height: f64,
    /// Weight of the ridge layer in [0, 1].
    pub mountain_height: f64,
    /// Elevation below which a vertex is ocean, in [0, 1].
    pub ocean_level: f64,
    /// Absolute polar-axis component above which ice overrides, in [0, 1].
    pub polar_cutoff: f64,
    /// Radial displacement per unit of elevation, as a fraction of the radius.
    pub elevation_scale: f64,
    /// Topology-specific resolution (subdivisions or grid size).
    pub level_of_detail: u32,
    /// Octaves summed in the landmass layer.
    pub continent_octaves: u8,
    /// Octaves summed in the ridge layer.
    pub mountain_octaves: u8,
    /// Octaves summed in the roughness layer.
    pub detail_octaves: u8,
}

impl Default for GenerationParameters {
    fn default() -> Self {
        Self {
            radius: 1.0,
            seed: 42,
            continent_frequency: 0.8,
            mountain_frequency: 2.5,
            detail_frequency: 6.0,
            continent_height: 0.4,
            mountain_height: 0.3,
            ocean_level: 0.45,
            polar_cutoff: 0.85,
            elevation_scale: 0.1,
            level_of_detail: 5,
            continent_octaves: 4,
            mountain_octaves: 3,
            detail_octaves: 2,
        }
    }
}

impl GenerationParameters {
    /// Creates default parameters with the given seed.
    pub fn with_seed(seed: i64) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }

    /// Large oceans, pronounced continents and ice caps.
    pub fn earth_like(seed: i64) -> Self {
        Self {
            seed,
            continent_frequency: 1.1,
            mountain_frequency: 3.0,
            detail_frequency: 8.0,
            continent_height: 0.45,
            mountain_height: 0.35,
            ocean_level: 0.5,
            polar_cutoff: 0.88,
            elevation_scale: 0.05,
            level_of_detail: 6,
            ..Default::default()
        }
    }

    /// The smallest useful planet: a single geodesic subdivision.
    pub fn minimal() -> Self {
        Self {
            radius: 1.0,
            seed: 0,
            continent_frequency: 0.5,
            mountain_frequency: 2.0,
            detail_frequency: 4.0,
            continent_height: 0.1,
            mountain_height: 0.5,
            ocean_level: 0.4,
            polar_cutoff: 0.7,
            level_of_detail: 1,
            ..Default::default()
        }
    }

    /// Draws a fresh seed from `rng`.
    pub fn reseed<R: Rng>(&mut self, rng: &mut R) {
        self.seed = rng.random::<i64>();
    }

    /// Checks the values that cannot be clamped.
    pub fn validate(&self) -> Result<(), TerrainError> {
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(TerrainError::invalid(
                ParameterName::Radius.as_str(),
                format!("radius must be positive, got {}", self.radius),
            ));
        }
        for (name, value) in [
            (ParameterName::ContinentFrequency, self.continent_frequency),
            (ParameterName::MountainFrequency, self.mountain_frequency),
            (ParameterName::DetailFrequency, self.detail_frequency),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(TerrainError::invalid(
                    name.as_str(),
                    format!("frequency must be positive, got {}", value),
                ));
            }
        }
        for (name, value) in [
            (ParameterName::ContinentHeight, self.continent_height),
            (ParameterName::MountainHeight, self.mountain_height),
            (ParameterName::OceanLevel, self.ocean_level),
            (ParameterName::PolarCutoff, self.polar_cutoff),
            (ParameterName::ElevationScale, self.elevation_scale),
        ] {
            if value.is_nan() {
                return Err(TerrainError::invalid(name.as_str(), "value is NaN"));
            }
        }
        Ok(())
    }

    /// Returns a copy with every clampable field forced into its range.
    ///
    /// Fails only for values [`validate`](Self::validate) rejects.
    pub fn clamped(&self) -> Result<Self, TerrainError> {
        self.validate()?;
        let (fmin, fmax) = FREQUENCY_RANGE;
        Ok(Self {
            radius: self.radius.min(MAX_RADIUS),
            seed: self.seed,
            continent_frequency: self.continent_frequency.clamp(fmin, fmax),
            mountain_frequency: self.mountain_frequency.clamp(fmin, fmax),
            detail_frequency: self.detail_frequency.clamp(fmin, fmax),
            continent_height: self.continent_height.clamp(0.0, 1.0),
            mountain_height: self.mountain_height.clamp(0.0, 1.0),
            ocean_level: self.ocean_level.clamp(0.0, 1.0),
            polar_cutoff: self.polar_cutoff.clamp(0.0, 1.0),
            elevation_scale: self.elevation_scale.clamp(0.0, 1.0),
            level_of_detail: self.level_of_detail.min(MAX_LEVEL_OF_DETAIL),
            continent_octaves: self.continent_octaves.clamp(1, MAX_OCTAVES),
            mountain_octaves: self.mountain_octaves.clamp(1, MAX_OCTAVES),
            detail_octaves: self.detail_octaves.clamp(1, MAX_OCTAVES),
        })
    }

    /// Sets one field by name, clamping into range.
    ///
    /// Returns the value actually stored.
    pub fn set(&mut self, name: ParameterName, value: f64) -> Result<f64, TerrainError> {
        if value.is_nan() {
            return Err(TerrainError::invalid(name.as_str(), "value is NaN"));
        }
        let (fmin, fmax) = FREQUENCY_RANGE;
        let octaves = |v: f64| v.round().clamp(1.0, MAX_OCTAVES as f64) as u8;
        let positive_frequency = |v: f64| -> Result<f64, TerrainError> {
            if v <= 0.0 || !v.is_finite() {
                Err(TerrainError::invalid(
                    name.as_str(),
                    format!("frequency must be positive, got {}", v),
                ))
            } else {
                Ok(v.clamp(fmin, fmax))
            }
        };

        let stored = match name {
            ParameterName::Radius => {
                if value <= 0.0 || !value.is_finite() {
                    return Err(TerrainError::invalid(
                        name.as_str(),
                        format!("radius must be positive, got {}", value),
                    ));
                }
                self.radius = value.min(MAX_RADIUS);
                self.radius
            }
            ParameterName::Seed => {
                self.seed = value as i64;
                self.seed as f64
            }
            ParameterName::ContinentFrequency => {
                self.continent_frequency = positive_frequency(value)?;
                self.continent_frequency
            }
            ParameterName::MountainFrequency => {
                self.mountain_frequency = positive_frequency(value)?;
                self.mountain_frequency
            }
            ParameterName::DetailFrequency => {
                self.detail_frequency = positive_frequency(value)?;
                self.detail_frequency
            }
            ParameterName::ContinentHeight => {
                self.continent_height = value.clamp(0.0, 1.0);
                self.continent_height
            }
            ParameterName::MountainHeight => {
                self.mountain_height = value.clamp(0.0, 1.0);
                self.mountain_height
            }
            ParameterName::OceanLevel => {
                self.ocean_level = value.clamp(0.0, 1.0);
                self.ocean_level
            }
            ParameterName::PolarCutoff => {
                self.polar_cutoff = value.clamp(0.0, 1.0);
                self.polar_cutoff
            }
            ParameterName::ElevationScale => {
                self.elevation_scale = value.clamp(0.0, 1.0);
                self.elevation_scale
            }
            ParameterName::LevelOfDetail => {
                self.level_of_detail = value.clamp(0.0, MAX_LEVEL_OF_DETAIL as f64) as u32;
                self.level_of_detail as f64
            }
            ParameterName::ContinentOctaves => {
                self.continent_octaves = octaves(value);
                self.continent_octaves as f64
            }
            ParameterName::MountainOctaves => {
                self.mountain_octaves = octaves(value);
                self.mountain_octaves as f64
            }
            ParameterName::DetailOctaves => {
                self.detail_octaves = octaves(value);
                self.detail_octaves as f64
            }
        };

        if stored != value {
            log::warn!("{} = {} clamped to {}", name, value, stored);
        }
        Ok(stored)
    }
}

/// Names accepted by [`GenerationParameters::set`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterName {
    Radius,
    Seed,
    ContinentFrequency,
    MountainFrequency,
    DetailFrequency,
    ContinentHeight,
    MountainHeight,
    OceanLevel,
    PolarCutoff,
    ElevationScale,
    LevelOfDetail,
    ContinentOctaves,
    MountainOctaves,
    DetailOctaves,
}

impl ParameterName {
    /// All parameter names in record order.
    pub const fn all() -> [ParameterName; 14] {
        [
            ParameterName::Radius,
            ParameterName::Seed,
            ParameterName::ContinentFrequency,
            ParameterName::MountainFrequency,
            ParameterName::DetailFrequency,
            ParameterName::ContinentHeight,
            ParameterName::MountainHeight,
            ParameterName::OceanLevel,
            ParameterName::PolarCutoff,
            ParameterName::ElevationScale,
            ParameterName::LevelOfDetail,
            ParameterName::ContinentOctaves,
            ParameterName::MountainOctaves,
            ParameterName::DetailOctaves,
        ]
    }

    /// The snake_case field name.
    pub const fn as_str(self) -> &'static str {
        match self {
            ParameterName::Radius => "radius",
            ParameterName::Seed => "seed",
            ParameterName::ContinentFrequency => "continent_frequency",
            ParameterName::MountainFrequency => "mountain_frequency",
            ParameterName::DetailFrequency => "detail_frequency",
            ParameterName::ContinentHeight => "continent_height",
            ParameterName::MountainHeight => "mountain_height",
            ParameterName::OceanLevel => "ocean_level",
            ParameterName::PolarCutoff => "polar_cutoff",
            ParameterName::ElevationScale => "elevation_scale",
            ParameterName::LevelOfDetail => "level_of_detail",
            ParameterName::ContinentOctaves => "continent_octaves",
            ParameterName::MountainOctaves => "mountain_octaves",
            ParameterName::DetailOctaves => "detail_octaves",
        }
    }
}

impl fmt::Display for ParameterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParameterName {
    type Err = TerrainError;

    /// Accepts snake_case (`ocean_level`) and camelCase (`oceanLevel`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        ParameterName::all()
            .into_iter()
            .find(|name| name.as_str().replace('_', "") == normalized)
            .ok_or_else(|| TerrainError::invalid(s, "unknown parameter name"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_default_is_valid() {
        assert!(GenerationParameters::default().validate().is_ok());
        assert!(GenerationParameters::earth_like(7).validate().is_ok());
        assert!(GenerationParameters::minimal().validate().is_ok());
    }

    #[test]
    fn test_negative_ocean_level_is_clamped() {
        let mut params = GenerationParameters::default();
        let stored = params.set(ParameterName::OceanLevel, -5.0).unwrap();
        assert_eq!(stored, 0.0);
        assert_eq!(params.ocean_level, 0.0);
    }

    #[test]
    fn test_clamped_copies_fields_into_range() {
        let params = GenerationParameters {
            ocean_level: -5.0,
            polar_cutoff: 3.0,
            mountain_height: 1.5,
            detail_frequency: 1000.0,
            continent_octaves: 0,
            ..Default::default()
        };
        let clamped = params.clamped().unwrap();
        assert_eq!(clamped.ocean_level, 0.0);
        assert_eq!(clamped.polar_cutoff, 1.0);
        assert_eq!(clamped.mountain_height, 1.0);
        assert_eq!(clamped.detail_frequency, FREQUENCY_RANGE.1);
        assert_eq!(clamped.continent_octaves, 1);
    }

    #[test]
    fn test_negative_radius_is_rejected() {
        let mut params = GenerationParameters::default();
        let err = params.set(ParameterName::Radius, -1.0).unwrap_err();
        assert!(matches!(err, TerrainError::InvalidParameter { .. }));
        assert_eq!(params.radius, 1.0, "rejected edits must not mutate");

        let bad = GenerationParameters {
            radius: 0.0,
            ..Default::default()
        };
        assert!(bad.clamped().is_err());
    }

    #[test]
    fn test_zero_frequency_is_rejected() {
        let mut params = GenerationParameters::default();
        assert!(params.set(ParameterName::MountainFrequency, 0.0).is_err());
        assert!(params.set(ParameterName::MountainFrequency, 0.5).is_ok());
        assert_eq!(params.mountain_frequency, 0.5);
    }

    #[test]
    fn test_nan_is_rejected() {
        let mut params = GenerationParameters::default();
        assert!(params.set(ParameterName::OceanLevel, f64::NAN).is_err());
        let bad = GenerationParameters {
            polar_cutoff: f64::NAN,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_parameter_name_parsing() {
        assert_eq!("ocean_level".parse::<ParameterName>().unwrap(), ParameterName::OceanLevel);
        assert_eq!("oceanLevel".parse::<ParameterName>().unwrap(), ParameterName::OceanLevel);
        assert_eq!(
            "levelOfDetail".parse::<ParameterName>().unwrap(),
            ParameterName::LevelOfDetail
        );
        assert!("sea_level".parse::<ParameterName>().is_err());
    }

    #[test]
    fn test_level_of_detail_clamps() {
        let mut params = GenerationParameters::default();
        assert_eq!(params.set(ParameterName::LevelOfDetail, -3.0).unwrap(), 0.0);
        assert_eq!(
            params.set(ParameterName::LevelOfDetail, 1.0e9).unwrap(),
            MAX_LEVEL_OF_DETAIL as f64
        );
    }

    #[test]
    fn test_octaves_are_settable_by_name() {
        let mut params = GenerationParameters::default();
        let name: ParameterName = "mountainOctaves".parse().unwrap();
        assert_eq!(params.set(name, 6.0).unwrap(), 6.0);
        assert_eq!(params.mountain_octaves, 6);
        assert_eq!(params.set(ParameterName::ContinentOctaves, 0.0).unwrap(), 1.0);
        assert_eq!(
            params.set(ParameterName::DetailOctaves, 40.0).unwrap(),
            MAX_OCTAVES as f64
        );
        assert_eq!(params.detail_octaves, MAX_OCTAVES);
    }

    #[test]
    fn test_every_field_has_a_name() {
        let record = serde_json::to_value(GenerationParameters::default()).unwrap();
        let fields = record.as_object().unwrap();
        assert_eq!(fields.len(), ParameterName::all().len());
        for name in ParameterName::all() {
            assert!(fields.contains_key(name.as_str()), "{} missing", name);
        }
    }

    #[test]
    fn test_reseed_is_reproducible() {
        let mut a = GenerationParameters::default();
        let mut b = GenerationParameters::default();
        a.reseed(&mut ChaCha8Rng::seed_from_u64(9));
        b.reseed(&mut ChaCha8Rng::seed_from_u64(9));
        assert_eq!(a.seed, b.seed);
    }
}
