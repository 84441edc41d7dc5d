//! Multi-octave fractal Brownian motion (fBm) noise generation.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use simdnoise::NoiseBuilder;

/// Seed stride between consecutive octaves of one layer.
const OCTAVE_SEED_STRIDE: i32 = 31337;

/// Gain that brings simdnoise's unscaled 3D simplex output (about +-1/32)
/// up to [-1, 1]. The backend sums the corner contributions without the
/// usual simplex normalization factor.
pub const SIMPLEX_3D_SCALE: f32 = 32.0;

/// Configuration for one multi-octave noise layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FractalNoiseConfig {
    /// Number of noise octaves.
    pub octaves: u8,
    /// Base frequency of the noise.
    pub frequency: f32,
    /// Frequency multiplier per octave (typically 2.0).
    pub lacunarity: f32,
    /// Amplitude decay per octave (0.4-0.6 typical).
    pub persistence: f32,
    /// Random seed for reproducible generation.
    pub seed: i32,
}

impl Default for FractalNoiseConfig {
    fn default() -> Self {
        Self {
            octaves: 4,
            frequency: 1.0,
            lacunarity: 2.0,
            persistence: 0.5,
            seed: 42,
        }
    }
}

impl FractalNoiseConfig {
    /// Creates a layer with the given seed, frequency and octave count.
    pub fn layer(seed: i32, frequency: f32, octaves: u8) -> Self {
        Self {
            octaves: octaves.max(1),
            frequency,
            seed,
            ..Default::default()
        }
    }

    /// Sum of the octave amplitudes, used to normalize the output.
    pub fn max_amplitude(&self) -> f32 {
        let mut amplitude = 1.0f32;
        let mut total = 0.0f32;
        for _ in 0..self.octaves.max(1) {
            total += amplitude;
            amplitude *= self.persistence;
        }
        total
    }
}

/// Evaluates one simplex octave at `pos`, in [-1, 1].
///
/// Non-finite output is replaced by 0.0.
fn simplex_3d(pos: Vec3, seed: i32) -> f32 {
    let value = NoiseBuilder::fbm_3d_offset(pos.x, 1, pos.y, 1, pos.z, 1)
        .with_seed(seed)
        .with_freq(1.0)
        .with_octaves(1)
        .generate()
        .0[0];
    if value.is_finite() {
        (value * SIMPLEX_3D_SCALE).clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Samples fractal noise at a 3D position (typically on a unit sphere).
///
/// Sampling in 3D rather than in an unwrapped UV space means the field is
/// continuous across the poles and the azimuth wraparound.
///
/// # Returns
/// A noise value in [-1, 1] (normalized by the amplitude sum).
pub fn sample_fractal_noise(pos: Vec3, config: &FractalNoiseConfig) -> f32 {
    let mut total = 0.0f32;
    let mut amplitude = 1.0f32;
    let mut frequency = config.frequency;

    for octave in 0..config.octaves.max(1) {
        let octave_seed = config
            .seed
            .wrapping_add((octave as i32).wrapping_mul(OCTAVE_SEED_STRIDE));
        total += simplex_3d(pos * frequency, octave_seed) * amplitude;
        amplitude *= config.persistence;
        frequency *= config.lacunarity;
    }

    let normalized = total / config.max_amplitude();
    if normalized.is_finite() {
        normalized
    } else {
        0.0
    }
}

/// Samples ridged noise: `1 - |fbm|`, peaking in [0, 1] along creases.
pub fn sample_ridged_noise(pos: Vec3, config: &FractalNoiseConfig) -> f32 {
    (1.0 - sample_fractal_noise(pos, config).abs()).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FractalNoiseConfig::default();
        assert_eq!(config.octaves, 4);
        assert_eq!(config.lacunarity, 2.0);
        assert_eq!(config.persistence, 0.5);
    }

    #[test]
    fn test_max_amplitude() {
        let config = FractalNoiseConfig::layer(1, 1.0, 3);
        assert!((config.max_amplitude() - 1.75).abs() < 1e-6);
        let single = FractalNoiseConfig::layer(1, 1.0, 0);
        assert_eq!(single.octaves, 1);
        assert_eq!(single.max_amplitude(), 1.0);
    }

    #[test]
    fn test_noise_reproducibility() {
        let config = FractalNoiseConfig::layer(12345, 1.5, 4);
        let pos = Vec3::new(0.5, 0.3, 0.7);

        let result1 = sample_fractal_noise(pos, &config);
        let result2 = sample_fractal_noise(pos, &config);

        assert_eq!(result1, result2, "Same seed and position should produce same result");
    }

    #[test]
    fn test_noise_range() {
        let config = FractalNoiseConfig::default();
        let test_positions = [
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(0.577, 0.577, 0.577),
            Vec3::new(-0.5, 0.5, 0.707),
        ];

        for pos in test_positions {
            let value = sample_fractal_noise(pos, &config);
            assert!(
                (-1.0..=1.0).contains(&value),
                "Noise value {} at {:?} out of expected range",
                value,
                pos
            );
            let ridge = sample_ridged_noise(pos, &config);
            assert!((0.0..=1.0).contains(&ridge));
        }
    }

    #[test]
    fn test_noise_uses_most_of_its_range() {
        let config = FractalNoiseConfig::layer(7, 0.8, 4);
        let mut lo = f32::MAX;
        let mut hi = f32::MIN;
        for i in 0..2000 {
            let t = i as f32 * 0.731;
            let pos = Vec3::new(t.sin() * (t * 0.37).cos(), (t * 1.13).cos(), t.cos()).normalize();
            let value = sample_fractal_noise(pos, &config);
            lo = lo.min(value);
            hi = hi.max(value);
        }
        assert!(hi - lo > 0.5, "fbm spread too small: [{}, {}]", lo, hi);
        assert!(lo < 0.0 && hi > 0.0);

        let ridged: Vec<f32> = (0..200)
            .map(|i| {
                let t = i as f32 * 0.41;
                sample_ridged_noise(Vec3::new(t.sin(), t.cos(), (t * 0.3).sin()).normalize(), &config)
            })
            .collect();
        assert!(ridged.iter().any(|&r| r < 0.8), "ridges never leave the crest");
    }

    #[test]
    fn test_zero_seed_is_finite() {
        let config = FractalNoiseConfig::layer(0, 0.5, 4);
        for pos in [Vec3::ZERO, Vec3::X, Vec3::new(0.3, -0.9, 0.1)] {
            assert!(sample_fractal_noise(pos, &config).is_finite());
        }
    }

    #[test]
    fn test_different_seeds_produce_different_results() {
        let config1 = FractalNoiseConfig::layer(1, 1.0, 4);
        let config2 = FractalNoiseConfig::layer(2, 1.0, 4);
        let pos = Vec3::new(0.5, 0.3, 0.7);

        let result1 = sample_fractal_noise(pos, &config1);
        let result2 = sample_fractal_noise(pos, &config2);

        assert_ne!(result1, result2, "Different seeds should produce different results");
    }
}
