//! Noise generation module for terrain synthesis.
//!
//! Uses simdnoise for the simplex octaves; [`HeightField`] combines three
//! seeded layers into the planet's elevation field.

mod fractal;
mod height_field;

pub use fractal::{
    sample_fractal_noise, sample_ridged_noise, FractalNoiseConfig, SIMPLEX_3D_SCALE,
};
pub use height_field::{fold_seed, sample, HeightField, HeightSample, DETAIL_WEIGHT};
