use super::params::{PotentialParams, SpeciesParams};
use nalgebra::{Point3, Vector3};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PotentialError {
    #[error("No parameters for species label '{label}'")]
    UnknownSpecies { label: String },
}

/// Evaluates the total energy and per-atom forces of one configuration under
/// a pair-potential parameterization.
///
/// `labels` are model-side species labels (already translated through the
/// species mapping), one per atom in `positions`. Pairs interact through a
/// Lennard-Jones 12-6 potential truncated at the model cutoff, with
/// Lorentz-Berthelot mixing (arithmetic sigma, geometric epsilon); the total
/// energy additionally includes each atom's per-species energy offset.
///
/// # Errors
///
/// Returns [`PotentialError::UnknownSpecies`] if any label has no parameter
/// entry in the checkpoint.
pub fn evaluate(
    params: &PotentialParams,
    labels: &[&str],
    positions: &[Point3<f64>],
) -> Result<(Vec<Vector3<f64>>, f64), PotentialError> {
    let mut per_atom: Vec<&SpeciesParams> = Vec::with_capacity(labels.len());
    for label in labels {
        let species =
            params
                .species
                .get(*label)
                .ok_or_else(|| PotentialError::UnknownSpecies {
                    label: (*label).to_string(),
                })?;
        per_atom.push(species);
    }

    let cutoff_squared = params.model.cutoff * params.model.cutoff;
    let mut forces = vec![Vector3::zeros(); positions.len()];
    let mut energy: f64 = per_atom.iter().map(|p| p.energy_offset).sum();

    for i in 0..positions.len() {
        for j in (i + 1)..positions.len() {
            let separation = positions[i] - positions[j];
            let distance_squared = separation.norm_squared();
            if distance_squared == 0.0 || distance_squared > cutoff_squared {
                continue;
            }
            let distance = distance_squared.sqrt();

            let sigma = 0.5 * (per_atom[i].sigma + per_atom[j].sigma);
            let epsilon = (per_atom[i].epsilon * per_atom[j].epsilon).sqrt();
            let sr6 = (sigma / distance).powi(6);
            let sr12 = sr6 * sr6;

            energy += 4.0 * epsilon * (sr12 - sr6);

            // F_i = -dU/dr * (r_i - r_j) / r, equal and opposite on j.
            let du_dr = 4.0 * epsilon * (6.0 * sr6 - 12.0 * sr12) / distance;
            let pair_force = -(du_dr / distance) * separation;
            forces[i] += pair_force;
            forces[j] -= pair_force;
        }
    }

    Ok((forces, energy))
}
