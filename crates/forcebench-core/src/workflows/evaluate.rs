use crate::core::io::table::{self, TableError};
use crate::core::io::traits::TrajectoryFile;
use crate::core::io::xyz::ExtXyzFile;
use crate::core::models::structure::Structure;
use crate::core::models::table::{AnnotatedTable, EvalTable};
use crate::engine::compare::annotate;
use crate::engine::config::EvaluationConfig;
use crate::engine::error::EngineError;
use crate::engine::extract::extract;
use crate::engine::predictor::{PairPotentialPredictor, Predictor, REFERENCE_LABEL};
use crate::engine::progress::{Progress, ProgressReporter};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{info, instrument};

/// File name of the persisted reference (ground-truth) table.
pub const REFERENCE_TABLE_FILE: &str = "ME_test_data.csv";

// Downstream tooling keys on this marker in row 0 of each model table.
const ANNOTATION_MARKER: &str = "test";

/// One persisted model table.
#[derive(Debug, Clone)]
pub struct WrittenTable {
    /// The model's output name.
    pub model: String,
    /// Where the table was written.
    pub path: PathBuf,
    /// Number of atom rows in the table.
    pub rows: usize,
}

/// Summary of a completed evaluation run.
#[derive(Debug, Clone)]
pub struct EvaluationReport {
    /// The created output directory.
    pub output_dir: PathBuf,
    /// Number of structures in the evaluated slice.
    pub evaluated_structures: usize,
    /// Number of atom rows in every table of the run.
    pub table_rows: usize,
    /// The persisted model tables, in registration order.
    pub tables: Vec<WrittenTable>,
}

/// Runs one complete evaluation: constructs every registered model, extracts
/// the reference table and one table per model from the trailing slice of
/// the dataset, annotates each model table with its deviation from the
/// reference, and persists all tables into a freshly created output
/// directory.
///
/// Any failure aborts the run immediately; since the output directory is
/// only created after all computation succeeded, a failed run leaves no
/// partial output behind.
///
/// # Errors
///
/// Returns an [`EngineError`] naming the offending model, structure, or
/// path; see the error type for the full taxonomy.
#[instrument(skip_all, name = "evaluation_workflow")]
pub fn run(
    config: &EvaluationConfig,
    reporter: &ProgressReporter,
) -> Result<EvaluationReport, EngineError> {
    if config.output_dir.exists() {
        return Err(EngineError::OutputExists {
            path: config.output_dir.clone(),
        });
    }
    let output_names = config.output_names()?;

    // === Phase 1: Model construction ===
    reporter.report(Progress::PhaseStart {
        name: "Retrieving models",
    });
    info!(
        models = config.models.len(),
        "Constructing predictors from checkpoints."
    );
    let predictors = construct_predictors(config, &output_names)?;
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Test data ===
    reporter.report(Progress::PhaseStart {
        name: "Loading test data",
    });
    let structures = load_evaluation_set(config)?;
    validate_species_coverage(config, &output_names, &predictors, &structures)?;
    info!(
        structures = structures.len(),
        tail = config.tail,
        "Evaluation set loaded and validated."
    );
    let reference_table =
        extract(&structures, None).map_err(|source| EngineError::Extraction {
            label: REFERENCE_LABEL.to_string(),
            source,
        })?;
    reporter.report(Progress::PhaseFinish);

    // === Phase 3: Model extraction ===
    reporter.report(Progress::PhaseStart {
        name: "Extracting model data",
    });
    reporter.report(Progress::TaskStart {
        total_steps: predictors.len() as u64,
    });
    let mut model_tables: Vec<EvalTable> = Vec::with_capacity(predictors.len());
    for (index, predictor) in predictors.iter().enumerate() {
        let model_table = extract(&structures, Some(predictor as &dyn Predictor)).map_err(
            |source| EngineError::Extraction {
                label: predictor.label().to_string(),
                source,
            },
        )?;
        info!(
            model = predictor.label(),
            rows = model_table.len(),
            "Model table extracted."
        );
        model_tables.push(model_table);
        reporter.report(Progress::TaskAdvance);
        reporter.report(Progress::Message(format!(
            "{}/{} models",
            index + 1,
            predictors.len()
        )));
    }
    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    // === Phase 4: Differences ===
    reporter.report(Progress::PhaseStart {
        name: "Computing differences",
    });
    let mut annotated_tables: Vec<AnnotatedTable> = Vec::with_capacity(model_tables.len());
    for (model_table, name) in model_tables.iter().zip(&output_names) {
        let mut annotated = annotate(model_table, &reference_table).map_err(|source| {
            EngineError::Comparison {
                name: name.clone(),
                source,
            }
        })?;
        annotated.stamp_marker(ANNOTATION_MARKER);
        annotated_tables.push(annotated);
    }
    reporter.report(Progress::PhaseFinish);

    // === Phase 5: Persistence ===
    reporter.report(Progress::PhaseStart { name: "Saving" });
    let tables = persist_tables(config, &output_names, &reference_table, &annotated_tables)?;
    reporter.report(Progress::PhaseFinish);

    info!(
        output_dir = %config.output_dir.display(),
        tables = tables.len() + 1,
        "Evaluation complete."
    );
    Ok(EvaluationReport {
        output_dir: config.output_dir.clone(),
        evaluated_structures: structures.len(),
        table_rows: reference_table.len(),
        tables,
    })
}

fn construct_predictors(
    config: &EvaluationConfig,
    output_names: &[String],
) -> Result<Vec<PairPotentialPredictor>, EngineError> {
    let mut predictors = Vec::with_capacity(config.models.len());
    for (spec, name) in config.models.iter().zip(output_names) {
        let predictor = PairPotentialPredictor::from_checkpoint(
            &spec.checkpoint_path,
            config.species_map.clone(),
            name.clone(),
        )
        .map_err(|source| EngineError::ModelLoad {
            name: name.clone(),
            path: spec.checkpoint_path.clone(),
            source,
        })?;
        info!(model = %name, path = %spec.checkpoint_path.display(), "Model checkpoint loaded.");
        predictors.push(predictor);
    }
    Ok(predictors)
}

fn load_evaluation_set(config: &EvaluationConfig) -> Result<Vec<Structure>, EngineError> {
    let mut structures =
        ExtXyzFile::read_from_path(&config.dataset_path).map_err(|source| {
            EngineError::Dataset {
                path: config.dataset_path.clone(),
                source,
            }
        })?;
    let start = structures.len().saturating_sub(config.tail);
    Ok(structures.split_off(start))
}

/// Verifies, before any extraction, that the shared species mapping and
/// every model cover every species present in the evaluated slice.
fn validate_species_coverage(
    config: &EvaluationConfig,
    output_names: &[String],
    predictors: &[PairPotentialPredictor],
    structures: &[Structure],
) -> Result<(), EngineError> {
    let mut species: BTreeSet<&str> = BTreeSet::new();
    for structure in structures {
        for site in structure.sites() {
            species.insert(site.species.as_str());
        }
    }

    for &native in &species {
        if !config.species_map.contains_key(native) {
            return Err(EngineError::UnmappedSpecies {
                species: native.to_string(),
            });
        }
    }

    for (predictor, name) in predictors.iter().zip(output_names) {
        for &native in &species {
            if !predictor.supports_species(native) {
                let label = config
                    .species_map
                    .get(native)
                    .cloned()
                    .unwrap_or_else(|| native.to_string());
                return Err(EngineError::ModelSpecies {
                    name: name.clone(),
                    label,
                });
            }
        }
    }
    Ok(())
}

fn persist_tables(
    config: &EvaluationConfig,
    output_names: &[String],
    reference_table: &EvalTable,
    annotated_tables: &[AnnotatedTable],
) -> Result<Vec<WrittenTable>, EngineError> {
    table::create_output_dir(&config.output_dir).map_err(|source| match source {
        TableError::AlreadyExists { .. } => EngineError::OutputExists {
            path: config.output_dir.clone(),
        },
        other => EngineError::Save {
            path: config.output_dir.clone(),
            source: other,
        },
    })?;

    let reference_path = config.output_dir.join(REFERENCE_TABLE_FILE);
    table::write_eval_table(reference_table, &reference_path).map_err(|source| {
        EngineError::Save {
            path: reference_path.clone(),
            source,
        }
    })?;
    info!(
        path = %reference_path.display(),
        rows = reference_table.len(),
        "Reference table written."
    );

    let mut written = Vec::with_capacity(annotated_tables.len());
    for (annotated, name) in annotated_tables.iter().zip(output_names) {
        let path = config.output_dir.join(format!("{name}.csv"));
        table::write_annotated_table(annotated, &path).map_err(|source| EngineError::Save {
            path: path.clone(),
            source,
        })?;
        info!(model = %name, path = %path.display(), "Model table written.");
        written.push(WrittenTable {
            model: name.clone(),
            path,
            rows: annotated.len(),
        });
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::EvaluationConfigBuilder;
    use std::collections::HashMap;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    const TRAJECTORY: &str = "\
2
Properties=species:S:1:pos:R:3:forces:R:3 energy=1.0
Au 0.0 0.0 0.0 0.1 0.0 0.0
Au 3.0 0.0 0.0 -0.1 0.0 0.0
3
Properties=species:S:1:pos:R:3:forces:R:3 energy=2.0
Au 0.0 0.0 0.0 0.0 0.0 0.0
Au 3.0 0.0 0.0 0.0 0.0 0.0
Au 0.0 3.0 0.0 0.0 0.0 0.0
";

    const CHECKPOINT: &str = "\
[model]
cutoff = 6.0

[species.Au]
sigma = 2.62
epsilon = 0.35
";

    fn write_fixture(dir: &Path, checkpoints: &[&str]) -> (PathBuf, Vec<PathBuf>) {
        let dataset = dir.join("test_set.extxyz");
        fs::write(&dataset, TRAJECTORY).unwrap();

        let mut paths = Vec::new();
        for name in checkpoints {
            let path = dir.join(format!("{name}.toml"));
            fs::write(&path, CHECKPOINT).unwrap();
            paths.push(path);
        }
        (dataset, paths)
    }

    fn config_for(dir: &Path, checkpoints: Vec<PathBuf>, dataset: PathBuf) -> EvaluationConfig {
        EvaluationConfigBuilder::new()
            .dataset_path(dataset)
            .output_dir(dir.join("evaluated_models"))
            .species_map(HashMap::from([("Au".to_string(), "Au".to_string())]))
            .checkpoints(checkpoints)
            .build()
            .unwrap()
    }

    #[test]
    fn run_writes_reference_and_model_tables() {
        let dir = tempdir().unwrap();
        let (dataset, checkpoints) = write_fixture(dir.path(), &["A", "B"]);
        let config = config_for(dir.path(), checkpoints, dataset);

        let report = run(&config, &ProgressReporter::new()).unwrap();

        assert_eq!(report.evaluated_structures, 2);
        assert_eq!(report.table_rows, 5);
        assert_eq!(report.tables.len(), 2);
        assert_eq!(report.tables[0].model, "A");
        assert_eq!(report.tables[1].model, "B");

        let reference_path = report.output_dir.join(REFERENCE_TABLE_FILE);
        assert!(reference_path.is_file());
        assert!(report.output_dir.join("A.csv").is_file());
        assert!(report.output_dir.join("B.csv").is_file());

        let reference = fs::read_to_string(&reference_path).unwrap();
        let lines: Vec<&str> = reference.lines().collect();
        assert_eq!(lines[0], "structure_id,atom_id,f_x,f_y,f_z,E");
        assert_eq!(lines.len(), 6);
        assert!(lines[1].starts_with("0,0,"));
        assert!(lines[5].starts_with("1,2,"));
    }

    #[test]
    fn model_tables_carry_diff_columns_and_marker() {
        let dir = tempdir().unwrap();
        let (dataset, checkpoints) = write_fixture(dir.path(), &["A"]);
        let config = config_for(dir.path(), checkpoints, dataset);

        let report = run(&config, &ProgressReporter::new()).unwrap();
        let model = fs::read_to_string(report.output_dir.join("A.csv")).unwrap();
        let lines: Vec<&str> = model.lines().collect();
        assert_eq!(
            lines[0],
            "structure_id,atom_id,f_x,f_y,f_z,E,diff_f_x,diff_f_y,diff_f_z,diff_|f|,diff_E,metadata"
        );
        assert!(lines[1].ends_with(",test"));
        assert!(lines[2].ends_with(','));
    }

    #[test]
    fn second_run_fails_loudly_and_leaves_first_run_untouched() {
        let dir = tempdir().unwrap();
        let (dataset, checkpoints) = write_fixture(dir.path(), &["A"]);
        let config = config_for(dir.path(), checkpoints, dataset);

        let report = run(&config, &ProgressReporter::new()).unwrap();
        let reference_path = report.output_dir.join(REFERENCE_TABLE_FILE);
        let before = fs::read(&reference_path).unwrap();

        let result = run(&config, &ProgressReporter::new());
        assert!(matches!(result, Err(EngineError::OutputExists { .. })));
        assert_eq!(fs::read(&reference_path).unwrap(), before);
    }

    #[test]
    fn supplied_display_names_control_output_files() {
        let dir = tempdir().unwrap();
        let (dataset, checkpoints) = write_fixture(dir.path(), &["A", "B"]);
        let config = EvaluationConfigBuilder::new()
            .dataset_path(dataset)
            .output_dir(dir.path().join("evaluated_models"))
            .species_map(HashMap::from([("Au".to_string(), "Au".to_string())]))
            .checkpoints(checkpoints)
            .model_names(vec!["wide".to_string(), "deep".to_string()])
            .build()
            .unwrap();

        let report = run(&config, &ProgressReporter::new()).unwrap();
        assert!(report.output_dir.join("wide.csv").is_file());
        assert!(report.output_dir.join("deep.csv").is_file());
        assert!(!report.output_dir.join("A.csv").exists());
    }

    #[test]
    fn tail_limits_the_evaluated_slice() {
        let dir = tempdir().unwrap();
        let (dataset, checkpoints) = write_fixture(dir.path(), &["A"]);
        let config = EvaluationConfigBuilder::new()
            .dataset_path(dataset)
            .output_dir(dir.path().join("evaluated_models"))
            .species_map(HashMap::from([("Au".to_string(), "Au".to_string())]))
            .checkpoints(checkpoints)
            .tail(1)
            .build()
            .unwrap();

        let report = run(&config, &ProgressReporter::new()).unwrap();
        // Only the last structure (3 atoms) survives the slice; its rows are
        // re-indexed from structure 0.
        assert_eq!(report.evaluated_structures, 1);
        assert_eq!(report.table_rows, 3);
    }

    #[test]
    fn missing_species_mapping_aborts_before_any_output() {
        let dir = tempdir().unwrap();
        let (dataset, checkpoints) = write_fixture(dir.path(), &["A"]);
        let config = EvaluationConfigBuilder::new()
            .dataset_path(dataset)
            .output_dir(dir.path().join("evaluated_models"))
            .species_map(HashMap::from([("Ti".to_string(), "Ti".to_string())]))
            .checkpoints(checkpoints)
            .build()
            .unwrap();

        let result = run(&config, &ProgressReporter::new());
        assert!(matches!(
            result,
            Err(EngineError::UnmappedSpecies { species }) if species == "Au"
        ));
        assert!(!dir.path().join("evaluated_models").exists());
    }

    #[test]
    fn model_without_species_parameters_is_a_configuration_error() {
        let dir = tempdir().unwrap();
        let (dataset, _) = write_fixture(dir.path(), &[]);
        let checkpoint = dir.path().join("other.toml");
        fs::write(
            &checkpoint,
            "[model]\ncutoff = 6.0\n[species.Pt]\nsigma = 2.7\nepsilon = 0.5\n",
        )
        .unwrap();

        let config = EvaluationConfigBuilder::new()
            .dataset_path(dataset)
            .output_dir(dir.path().join("evaluated_models"))
            .species_map(HashMap::from([("Au".to_string(), "Au".to_string())]))
            .checkpoints(vec![checkpoint])
            .build()
            .unwrap();

        let result = run(&config, &ProgressReporter::new());
        assert!(matches!(
            result,
            Err(EngineError::ModelSpecies { name, label }) if name == "other" && label == "Au"
        ));
    }

    #[test]
    fn unreadable_checkpoint_aborts_the_whole_run() {
        let dir = tempdir().unwrap();
        let (dataset, mut checkpoints) = write_fixture(dir.path(), &["A"]);
        checkpoints.push(dir.path().join("missing.toml"));
        let config = config_for(dir.path(), checkpoints, dataset);

        let result = run(&config, &ProgressReporter::new());
        assert!(matches!(
            result,
            Err(EngineError::ModelLoad { name, .. }) if name == "missing"
        ));
        assert!(!dir.path().join("evaluated_models").exists());
    }

    #[test]
    fn progress_phases_are_reported_in_pipeline_order() {
        let dir = tempdir().unwrap();
        let (dataset, checkpoints) = write_fixture(dir.path(), &["A"]);
        let config = config_for(dir.path(), checkpoints, dataset);

        let phases: std::sync::Mutex<Vec<&'static str>> = std::sync::Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::PhaseStart { name } = event {
                phases.lock().unwrap().push(name);
            }
        }));

        run(&config, &reporter).unwrap();
        drop(reporter);

        assert_eq!(
            phases.into_inner().unwrap(),
            vec![
                "Retrieving models",
                "Loading test data",
                "Extracting model data",
                "Computing differences",
                "Saving",
            ]
        );
    }
}
