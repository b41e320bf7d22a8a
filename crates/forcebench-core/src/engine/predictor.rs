use crate::core::models::structure::Structure;
use crate::core::potential::pair::{self, PotentialError};
use crate::core::potential::params::{CheckpointError, PotentialParams};
use nalgebra::Vector3;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// The label reference extractions run under in progress and error output.
pub const REFERENCE_LABEL: &str = "reference";

/// The result of evaluating a predictor on one structure: one force vector
/// per atom, in site order, and the total energy of the structure.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub forces: Vec<Vector3<f64>>,
    pub energy: f64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PredictorError {
    #[error("Structure carries no stored reference forces/energy")]
    MissingReference,

    #[error("Species mapping has no entry for '{species}'")]
    UnmappedSpecies { species: String },

    #[error(transparent)]
    Potential(#[from] PotentialError),
}

/// The capability of mapping a structure to per-atom forces and a total
/// energy.
///
/// Ground truth and trained models sit behind this same interface:
/// [`Reference`] reads the structure's stored observables, while
/// [`PairPotentialPredictor`] computes them from a deployed checkpoint.
/// Callers dispatch through the trait; nothing inspects the concrete type.
pub trait Predictor {
    /// The display label of this predictor, used in progress and error
    /// reporting.
    fn label(&self) -> &str;

    /// Evaluates this predictor on one structure.
    ///
    /// # Errors
    ///
    /// Returns a [`PredictorError`] if the structure cannot be evaluated;
    /// implementations never skip a structure silently.
    fn evaluate(&self, structure: &Structure) -> Result<Prediction, PredictorError>;
}

/// The ground-truth variant: reads the reference forces and energy the
/// structure was labeled with.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reference;

impl Predictor for Reference {
    fn label(&self) -> &str {
        REFERENCE_LABEL
    }

    fn evaluate(&self, structure: &Structure) -> Result<Prediction, PredictorError> {
        let data = structure
            .reference()
            .ok_or(PredictorError::MissingReference)?;
        Ok(Prediction {
            forces: data.forces.clone(),
            energy: data.energy,
        })
    }
}

/// A trained model under test: a deployed pair-potential checkpoint plus the
/// species mapping shared by the run.
#[derive(Debug, Clone)]
pub struct PairPotentialPredictor {
    label: String,
    params: PotentialParams,
    species_map: HashMap<String, String>,
}

impl PairPotentialPredictor {
    /// Constructs a predictor from a deployed checkpoint file.
    ///
    /// `species_map` translates structure-native species labels to the
    /// labels the checkpoint was parameterized with.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckpointError`] if the checkpoint cannot be read or is
    /// invalid.
    pub fn from_checkpoint(
        path: &Path,
        species_map: HashMap<String, String>,
        label: String,
    ) -> Result<Self, CheckpointError> {
        let params = PotentialParams::load(path)?;
        Ok(Self {
            label,
            params,
            species_map,
        })
    }

    /// Whether this predictor can handle a structure-native species label:
    /// the mapping must have an entry for it and the checkpoint must have
    /// parameters for the mapped label.
    pub fn supports_species(&self, native: &str) -> bool {
        self.species_map
            .get(native)
            .is_some_and(|label| self.params.species.contains_key(label))
    }
}

impl Predictor for PairPotentialPredictor {
    fn label(&self) -> &str {
        &self.label
    }

    fn evaluate(&self, structure: &Structure) -> Result<Prediction, PredictorError> {
        let mut labels = Vec::with_capacity(structure.atom_count());
        for site in structure.sites() {
            let label = self.species_map.get(&site.species).ok_or_else(|| {
                PredictorError::UnmappedSpecies {
                    species: site.species.clone(),
                }
            })?;
            labels.push(label.as_str());
        }
        let positions: Vec<_> = structure.sites().iter().map(|site| site.position).collect();

        let (forces, energy) = pair::evaluate(&self.params, &labels, &positions)?;
        Ok(Prediction { forces, energy })
    }
}
