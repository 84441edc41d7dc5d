//! Flat field/value records for saving and restoring a generated planet.
//!
//! A record is a single JSON object whose keys are the parameter field names.
//! Missing keys fall back to defaults; unknown keys are rejected so a typo
//! never silently produces a different planet.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use thiserror::Error;

use super::GenerationParameters;
use crate::error::TerrainError;

/// Errors that can occur while reading or writing a parameter record.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed parameter record: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] TerrainError),
}

impl GenerationParameters {
    /// Serializes the parameters as a flat JSON object.
    pub fn to_record(&self) -> Result<String, RecordError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a flat JSON object, clamping every value into range.
    pub fn from_record(text: &str) -> Result<Self, RecordError> {
        let params: GenerationParameters = serde_json::from_str(text)?;
        Ok(params.clamped()?)
    }
}

/// Writes `params` to `path` as a flat record.
pub fn save_parameters(params: &GenerationParameters, path: &Path) -> Result<(), RecordError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, params)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Reads a flat record from `path`.
pub fn load_parameters(path: &Path) -> Result<GenerationParameters, RecordError> {
    let file = File::open(path)?;
    let params: GenerationParameters = serde_json::from_reader(BufReader::new(file))?;
    Ok(params.clamped()?)
}
