use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Global settings of a deployed checkpoint.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ModelGlobals {
    /// Pair interaction cutoff in Angstroms.
    pub cutoff: f64,
}

/// Per-species parameters of a deployed checkpoint.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SpeciesParams {
    /// Lennard-Jones distance parameter in Angstroms.
    pub sigma: f64,
    /// Lennard-Jones well depth in eV.
    pub epsilon: f64,
    /// Per-atom energy offset in eV, added once per atom of this species.
    #[serde(default)]
    pub energy_offset: f64,
}

/// The full parameter set of one deployed model checkpoint.
///
/// Checkpoints are TOML files:
///
/// ```toml
/// [model]
/// cutoff = 6.0
///
/// [species.Au]
/// sigma = 2.62
/// epsilon = 0.35
/// energy_offset = -3.2
/// ```
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PotentialParams {
    pub model: ModelGlobals,
    pub species: HashMap<String, SpeciesParams>,
}

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Invalid checkpoint '{path}': {message}")]
    Invalid { path: String, message: String },
}

impl PotentialParams {
    /// Loads and validates a deployed checkpoint from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`CheckpointError::Io`] if the file cannot be read,
    /// [`CheckpointError::Toml`] if it is not valid TOML for this schema, or
    /// [`CheckpointError::Invalid`] if a parameter is out of range.
    pub fn load(path: &Path) -> Result<Self, CheckpointError> {
        let content = std::fs::read_to_string(path).map_err(|source| CheckpointError::Io {
            path: path.to_string_lossy().to_string(),
            source,
        })?;
        let params: PotentialParams =
            toml::from_str(&content).map_err(|source| CheckpointError::Toml {
                path: path.to_string_lossy().to_string(),
                source,
            })?;
        params
            .validate()
            .map_err(|message| CheckpointError::Invalid {
                path: path.to_string_lossy().to_string(),
                message,
            })?;
        Ok(params)
    }

    fn validate(&self) -> Result<(), String> {
        if !(self.model.cutoff > 0.0) {
            return Err("cutoff must be positive".to_string());
        }
        if self.species.is_empty() {
            return Err("at least one species entry is required".to_string());
        }
        for (label, params) in &self.species {
            if !(params.sigma > 0.0) {
                return Err(format!("species '{label}': sigma must be positive"));
            }
            if params.epsilon < 0.0 {
                return Err(format!("species '{label}': epsilon must be non-negative"));
            }
        }
        Ok(())
    }
}
