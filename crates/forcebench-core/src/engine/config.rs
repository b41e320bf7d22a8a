use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// How many trailing structures of the trajectory are evaluated when the
/// configuration does not say otherwise.
pub const DEFAULT_TAIL: usize = 1000;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("At least one model checkpoint is required")]
    NoModels,

    #[error("Got {names} display name(s) for {models} model checkpoint(s)")]
    NameCountMismatch { models: usize, names: usize },

    #[error("Two models derive the same output name '{name}'")]
    DuplicateOutputName { name: String },

    #[error("Cannot derive an output name from checkpoint path '{path}'", path = path.display())]
    UnnamedCheckpoint { path: PathBuf },

    #[error("Evaluation tail must be at least 1 structure")]
    ZeroTail,
}

/// One model under test: its deployed checkpoint and an optional display
/// name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    /// Path to the deployed checkpoint file.
    pub checkpoint_path: PathBuf,
    /// Display name, used for the output file; defaults to the checkpoint's
    /// base file name with the extension stripped.
    pub display_name: Option<String>,
}

impl ModelSpec {
    /// Derives the name used for this model's output table.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnnamedCheckpoint`] if no display name was
    /// supplied and the checkpoint path has no usable file stem.
    pub fn output_name(&self) -> Result<String, ConfigError> {
        if let Some(name) = &self.display_name {
            return Ok(name.clone());
        }
        self.checkpoint_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .filter(|stem| !stem.is_empty())
            .ok_or_else(|| ConfigError::UnnamedCheckpoint {
                path: self.checkpoint_path.clone(),
            })
    }
}

/// The complete configuration of one evaluation run, built once at process
/// start and passed into the workflow; there is no other run state.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationConfig {
    /// Path to the evaluation trajectory (extended-XYZ).
    pub dataset_path: PathBuf,
    /// How many trailing structures of the trajectory form the evaluation
    /// set; a tail longer than the trajectory means the whole trajectory.
    pub tail: usize,
    /// Directory the tables are written to; must not exist yet.
    pub output_dir: PathBuf,
    /// Mapping from structure-native species labels to the labels the models
    /// were trained on, shared by all models.
    pub species_map: HashMap<String, String>,
    /// The models under test, in registration order.
    pub models: Vec<ModelSpec>,
}

impl EvaluationConfig {
    /// Derives the output names of all models, in registration order, and
    /// verifies they are collision-free.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnnamedCheckpoint`] if a name cannot be
    /// derived, or [`ConfigError::DuplicateOutputName`] if two models derive
    /// the same name.
    pub fn output_names(&self) -> Result<Vec<String>, ConfigError> {
        let mut names = Vec::with_capacity(self.models.len());
        for model in &self.models {
            let name = model.output_name()?;
            if names.contains(&name) {
                return Err(ConfigError::DuplicateOutputName { name });
            }
            names.push(name);
        }
        Ok(names)
    }
}

/// Builder for [`EvaluationConfig`].
#[derive(Debug, Default)]
pub struct EvaluationConfigBuilder {
    dataset_path: Option<PathBuf>,
    tail: Option<usize>,
    output_dir: Option<PathBuf>,
    species_map: Option<HashMap<String, String>>,
    checkpoints: Option<Vec<PathBuf>>,
    model_names: Option<Vec<String>>,
}

impl EvaluationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dataset_path(mut self, path: PathBuf) -> Self {
        self.dataset_path = Some(path);
        self
    }
    pub fn tail(mut self, tail: usize) -> Self {
        self.tail = Some(tail);
        self
    }
    pub fn output_dir(mut self, path: PathBuf) -> Self {
        self.output_dir = Some(path);
        self
    }
    pub fn species_map(mut self, map: HashMap<String, String>) -> Self {
        self.species_map = Some(map);
        self
    }
    pub fn checkpoints(mut self, paths: Vec<PathBuf>) -> Self {
        self.checkpoints = Some(paths);
        self
    }
    /// Display names for the models, all-or-nothing; the list length must
    /// equal the checkpoint list length.
    pub fn model_names(mut self, names: Vec<String>) -> Self {
        self.model_names = Some(names);
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a required parameter is missing, the
    /// model list is empty, the name list length does not match, the tail is
    /// zero, or the derived output names are not collision-free.
    pub fn build(self) -> Result<EvaluationConfig, ConfigError> {
        let checkpoints = self
            .checkpoints
            .ok_or(ConfigError::MissingParameter("checkpoints"))?;
        if checkpoints.is_empty() {
            return Err(ConfigError::NoModels);
        }

        let models = match self.model_names {
            Some(names) => {
                if names.len() != checkpoints.len() {
                    return Err(ConfigError::NameCountMismatch {
                        models: checkpoints.len(),
                        names: names.len(),
                    });
                }
                checkpoints
                    .into_iter()
                    .zip(names)
                    .map(|(checkpoint_path, name)| ModelSpec {
                        checkpoint_path,
                        display_name: Some(name),
                    })
                    .collect()
            }
            None => checkpoints
                .into_iter()
                .map(|checkpoint_path| ModelSpec {
                    checkpoint_path,
                    display_name: None,
                })
                .collect(),
        };

        let tail = self.tail.unwrap_or(DEFAULT_TAIL);
        if tail == 0 {
            return Err(ConfigError::ZeroTail);
        }

        let config = EvaluationConfig {
            dataset_path: self
                .dataset_path
                .ok_or(ConfigError::MissingParameter("dataset_path"))?,
            tail,
            output_dir: self
                .output_dir
                .ok_or(ConfigError::MissingParameter("output_dir"))?,
            species_map: self
                .species_map
                .ok_or(ConfigError::MissingParameter("species_map"))?,
            models,
        };
        config.output_names()?;
        Ok(config)
    }
}
