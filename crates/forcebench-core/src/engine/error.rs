use thiserror::Error;

use super::compare::CompareError;
use super::config::ConfigError;
use super::extract::ExtractError;
use crate::core::io::table::TableError;
use crate::core::io::xyz::XyzError;
use crate::core::potential::params::CheckpointError;
use std::path::PathBuf;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Output directory '{path}' already exists", path = path.display())]
    OutputExists { path: PathBuf },

    #[error("Failed to load evaluation dataset '{path}': {source}", path = path.display())]
    Dataset {
        path: PathBuf,
        #[source]
        source: XyzError,
    },

    #[error("Failed to load model '{name}' from '{path}': {source}", path = path.display())]
    ModelLoad {
        name: String,
        path: PathBuf,
        #[source]
        source: CheckpointError,
    },

    #[error("Species mapping omits '{species}', which is present in the evaluation set")]
    UnmappedSpecies { species: String },

    #[error("Model '{name}' has no parameters for species label '{label}'")]
    ModelSpecies { name: String, label: String },

    #[error("Extraction failed for '{label}': {source}")]
    Extraction {
        label: String,
        #[source]
        source: ExtractError,
    },

    #[error("Comparison against reference failed for model '{name}': {source}")]
    Comparison {
        name: String,
        #[source]
        source: CompareError,
    },

    #[error("Failed to write '{path}': {source}", path = path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: TableError,
    },
}
