use crate::core::models::structure::Structure;
use crate::core::models::table::{EvalRow, EvalTable};
use crate::engine::predictor::{Predictor, PredictorError, Reference};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Predictor returned {actual} force row(s) for structure {structure}, which has {expected} atom(s)")]
    ShapeMismatch {
        structure: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Predictor failed on structure {structure}: {source}")]
    UpstreamFailure {
        structure: usize,
        #[source]
        source: PredictorError,
    },
}

/// Flattens a structure sequence into an evaluation table: one row per atom,
/// in (structure, atom) order, with the structure energy duplicated across
/// its atom rows.
///
/// With `predictor` absent the structures' stored reference forces/energy
/// are read (through the [`Reference`] predictor); with a predictor present
/// its predictions are tabulated instead. Either way the same slice yields
/// the same row keys in the same order, which is what keeps all tables of a
/// run row-aligned.
///
/// # Errors
///
/// Returns [`ExtractError::ShapeMismatch`] if a prediction does not have one
/// force row per atom, or [`ExtractError::UpstreamFailure`] if the predictor
/// fails on a structure. There is no skip policy: the first failure aborts
/// the whole pass.
pub fn extract(
    structures: &[Structure],
    predictor: Option<&dyn Predictor>,
) -> Result<EvalTable, ExtractError> {
    let reference = Reference;
    let source: &dyn Predictor = predictor.unwrap_or(&reference);

    let mut table = EvalTable::new();
    for (structure_id, structure) in structures.iter().enumerate() {
        let prediction =
            source
                .evaluate(structure)
                .map_err(|source| ExtractError::UpstreamFailure {
                    structure: structure_id,
                    source,
                })?;

        if prediction.forces.len() != structure.atom_count() {
            return Err(ExtractError::ShapeMismatch {
                structure: structure_id,
                expected: structure.atom_count(),
                actual: prediction.forces.len(),
            });
        }

        for (atom_id, force) in prediction.forces.iter().enumerate() {
            table.push(EvalRow {
                structure_id,
                atom_id,
                f_x: force.x,
                f_y: force.y,
                f_z: force.z,
                energy: prediction.energy,
            });
        }
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::structure::AtomSite;
    use crate::engine::predictor::Prediction;
    use nalgebra::{Point3, Vector3};

    /// Predicts a fixed force for every atom and a fixed energy for every
    /// structure.
    struct ConstantPredictor {
        force: Vector3<f64>,
        energy: f64,
    }

    impl Predictor for ConstantPredictor {
        fn label(&self) -> &str {
            "constant"
        }

        fn evaluate(&self, structure: &Structure) -> Result<Prediction, PredictorError> {
            Ok(Prediction {
                forces: vec![self.force; structure.atom_count()],
                energy: self.energy,
            })
        }
    }

    /// Always returns a single force row, whatever the structure size.
    struct TruncatingPredictor;

    impl Predictor for TruncatingPredictor {
        fn label(&self) -> &str {
            "truncating"
        }

        fn evaluate(&self, _structure: &Structure) -> Result<Prediction, PredictorError> {
            Ok(Prediction {
                forces: vec![Vector3::zeros()],
                energy: 0.0,
            })
        }
    }

    /// Fails on every structure.
    struct FailingPredictor;

    impl Predictor for FailingPredictor {
        fn label(&self) -> &str {
            "failing"
        }

        fn evaluate(&self, _structure: &Structure) -> Result<Prediction, PredictorError> {
            Err(PredictorError::MissingReference)
        }
    }

    fn labeled_structures() -> Vec<Structure> {
        let mut first = Structure::new(vec![
            AtomSite::new("Au", Point3::new(0.0, 0.0, 0.0)),
            AtomSite::new("Au", Point3::new(2.0, 0.0, 0.0)),
        ]);
        first
            .set_reference(
                vec![Vector3::new(1.0, 0.0, 0.0), Vector3::new(-1.0, 0.0, 0.0)],
                1.0,
            )
            .unwrap();

        let mut second = Structure::new(vec![
            AtomSite::new("O", Point3::new(0.0, 0.0, 0.0)),
            AtomSite::new("O", Point3::new(0.0, 2.0, 0.0)),
            AtomSite::new("O", Point3::new(0.0, 0.0, 2.0)),
        ]);
        second
            .set_reference(vec![Vector3::zeros(); 3], 2.0)
            .unwrap();

        vec![first, second]
    }

    #[test]
    fn reference_extraction_flattens_in_lexicographic_order() {
        let structures = labeled_structures();
        let table = extract(&structures, None).unwrap();

        assert_eq!(table.len(), 5);
        let keys: Vec<_> = table
            .rows()
            .iter()
            .map(|r| (r.structure_id, r.atom_id))
            .collect();
        assert_eq!(keys, vec![(0, 0), (0, 1), (1, 0), (1, 1), (1, 2)]);
    }

    #[test]
    fn reference_extraction_duplicates_energy_per_structure() {
        let structures = labeled_structures();
        let table = extract(&structures, None).unwrap();

        assert!(table.rows()[..2].iter().all(|r| r.energy == 1.0));
        assert!(table.rows()[2..].iter().all(|r| r.energy == 2.0));
        assert_eq!(table.rows()[0].f_x, 1.0);
        assert_eq!(table.rows()[1].f_x, -1.0);
    }

    #[test]
    fn zero_predictor_yields_all_zero_columns() {
        let structures = labeled_structures();
        let predictor = ConstantPredictor {
            force: Vector3::zeros(),
            energy: 0.0,
        };
        let table = extract(&structures, Some(&predictor)).unwrap();

        assert_eq!(table.len(), 5);
        assert!(table
            .rows()
            .iter()
            .all(|r| r.f_x == 0.0 && r.f_y == 0.0 && r.f_z == 0.0 && r.energy == 0.0));
    }

    #[test]
    fn empty_sequence_yields_empty_table() {
        let table = extract(&[], None).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn wrong_force_count_fails_with_shape_mismatch() {
        let structures = labeled_structures();
        let result = extract(&structures, Some(&TruncatingPredictor));
        assert!(matches!(
            result,
            Err(ExtractError::ShapeMismatch {
                structure: 0,
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn predictor_failure_names_the_structure() {
        let structures = labeled_structures();
        let result = extract(&structures, Some(&FailingPredictor));
        assert!(matches!(
            result,
            Err(ExtractError::UpstreamFailure { structure: 0, .. })
        ));
    }

    #[test]
    fn missing_reference_surfaces_as_upstream_failure() {
        let structures = vec![Structure::new(vec![AtomSite::new(
            "Au",
            Point3::origin(),
        )])];
        let result = extract(&structures, None);
        assert!(matches!(
            result,
            Err(ExtractError::UpstreamFailure {
                structure: 0,
                source: PredictorError::MissingReference
            })
        ));
    }
}
