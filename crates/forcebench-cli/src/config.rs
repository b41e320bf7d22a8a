use crate::cli::Cli;
use crate::error::{CliError, Result};
use forcebench::engine::config::{EvaluationConfig, EvaluationConfigBuilder};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The on-disk run file. Every field can be omitted; [`load`] merges it with
/// the CLI overrides and defers validation to the core config builder.
#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RunFile {
    /// Path to the evaluation trajectory (extended-XYZ).
    pub dataset: Option<PathBuf>,
    /// Directory the tables are written to; must not exist yet.
    pub output: Option<PathBuf>,
    /// How many trailing structures of the trajectory are evaluated.
    pub tail: Option<usize>,
    /// Deployed model checkpoints, in registration order.
    #[serde(default)]
    pub checkpoints: Vec<PathBuf>,
    /// Optional display names, one per checkpoint.
    pub names: Option<Vec<String>>,
    /// Mapping from structure-native species labels to model labels.
    #[serde(default)]
    pub species: HashMap<String, String>,
}

impl RunFile {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: anyhow::Error::new(e),
        })?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: anyhow::Error::new(e),
        })
    }
}

/// Loads the run file named on the command line and merges the CLI overrides
/// into the final core configuration (command line wins).
pub fn load(cli: &Cli) -> Result<EvaluationConfig> {
    let file = RunFile::from_file(&cli.config)?;
    debug!("Run file loaded: {:?}", file);

    let mut builder = EvaluationConfigBuilder::new().checkpoints(file.checkpoints);
    if let Some(path) = cli.dataset.clone().or(file.dataset) {
        builder = builder.dataset_path(path);
    }
    if let Some(path) = cli.output.clone().or(file.output) {
        builder = builder.output_dir(path);
    }
    if let Some(tail) = cli.tail.or(file.tail) {
        builder = builder.tail(tail);
    }
    if let Some(names) = file.names {
        builder = builder.model_names(names);
    }
    if !file.species.is_empty() {
        builder = builder.species_map(file.species);
    }

    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use forcebench::engine::config::ConfigError;
    use std::fs;
    use tempfile::tempdir;

    const RUN_FILE: &str = r#"
dataset = "test_set.extxyz"
output = "evaluated_models"
tail = 200
checkpoints = ["models/A.toml", "models/B.toml"]

[species]
Au = "Au"
O = "O"
"#;

    fn cli_with(args: &[&str], config_path: &Path) -> Cli {
        let mut full = vec!["forcebench", "--config", config_path.to_str().unwrap()];
        full.extend_from_slice(args);
        Cli::parse_from(full)
    }

    #[test]
    fn run_file_alone_builds_a_complete_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.toml");
        fs::write(&path, RUN_FILE).unwrap();

        let config = load(&cli_with(&[], &path)).unwrap();
        assert_eq!(config.dataset_path, PathBuf::from("test_set.extxyz"));
        assert_eq!(config.tail, 200);
        assert_eq!(config.models.len(), 2);
        assert_eq!(config.species_map.get("O"), Some(&"O".to_string()));
    }

    #[test]
    fn cli_overrides_take_precedence_over_the_run_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.toml");
        fs::write(&path, RUN_FILE).unwrap();

        let config = load(&cli_with(
            &["--dataset", "fresh.extxyz", "--tail", "10"],
            &path,
        ))
        .unwrap();
        assert_eq!(config.dataset_path, PathBuf::from("fresh.extxyz"));
        assert_eq!(config.tail, 10);
        assert_eq!(config.output_dir, PathBuf::from("evaluated_models"));
    }

    #[test]
    fn missing_run_file_is_a_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let result = load(&cli_with(&[], &path));
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.toml");
        fs::write(&path, "datset = \"typo.extxyz\"\n").unwrap();
        let result = load(&cli_with(&[], &path));
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }

    #[test]
    fn missing_species_table_surfaces_as_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.toml");
        fs::write(
            &path,
            "dataset = \"d.extxyz\"\noutput = \"out\"\ncheckpoints = [\"a.toml\"]\n",
        )
        .unwrap();

        let result = load(&cli_with(&[], &path));
        assert!(matches!(
            result,
            Err(CliError::Config(ConfigError::MissingParameter(
                "species_map"
            )))
        ));
    }

    #[test]
    fn mismatched_name_list_surfaces_as_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.toml");
        fs::write(
            &path,
            "dataset = \"d.extxyz\"\n\
             output = \"out\"\n\
             checkpoints = [\"a.toml\", \"b.toml\"]\n\
             names = [\"only-one\"]\n\
             [species]\n\
             Au = \"Au\"\n",
        )
        .unwrap();

        let result = load(&cli_with(&[], &path));
        assert!(matches!(
            result,
            Err(CliError::Config(ConfigError::NameCountMismatch {
                models: 2,
                names: 1
            }))
        ));
    }
}
