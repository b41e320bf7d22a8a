use nalgebra::{Point3, Vector3};
use thiserror::Error;

/// A single atom within a structure: its species label and position.
///
/// Keeping the label and position together in one record guarantees that the
/// two stay aligned for the lifetime of the structure, which is what makes
/// the per-atom flattening downstream valid without an explicit join key.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomSite {
    /// The structure-native species label (e.g., "Au", "Ti", "O").
    pub species: String,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
}

impl AtomSite {
    /// Creates a new atom site from a species label and a position.
    pub fn new(species: &str, position: Point3<f64>) -> Self {
        Self {
            species: species.to_string(),
            position,
        }
    }
}

/// Stored ground-truth observables attached to a structure.
///
/// These are the labels the structure was recorded with: one force vector per
/// atom (eV/Angstrom) and the total energy of the configuration (eV).
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceData {
    /// One reference force vector per atom, in site order.
    pub forces: Vec<Vector3<f64>>,
    /// The reference total energy of the structure.
    pub energy: f64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StructureError {
    #[error("Reference force count {actual} does not match atom count {expected}")]
    ForceCountMismatch { expected: usize, actual: usize },
}

/// One atomic configuration: an ordered sequence of atom sites, plus the
/// reference forces/energy it was labeled with, when available.
///
/// Structures are immutable once loaded; the trajectory reader builds them
/// and every later pipeline stage only reads them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Structure {
    sites: Vec<AtomSite>,
    reference: Option<ReferenceData>,
}

impl Structure {
    /// Creates a structure from an ordered sequence of atom sites, without
    /// reference data.
    pub fn new(sites: Vec<AtomSite>) -> Self {
        Self {
            sites,
            reference: None,
        }
    }

    /// Attaches stored reference forces and energy to this structure.
    ///
    /// # Errors
    ///
    /// Returns [`StructureError::ForceCountMismatch`] if the number of force
    /// vectors differs from the number of atoms.
    pub fn set_reference(
        &mut self,
        forces: Vec<Vector3<f64>>,
        energy: f64,
    ) -> Result<(), StructureError> {
        if forces.len() != self.sites.len() {
            return Err(StructureError::ForceCountMismatch {
                expected: self.sites.len(),
                actual: forces.len(),
            });
        }
        self.reference = Some(ReferenceData { forces, energy });
        Ok(())
    }

    /// The number of atoms in this structure.
    pub fn atom_count(&self) -> usize {
        self.sites.len()
    }

    /// The ordered atom sites of this structure.
    pub fn sites(&self) -> &[AtomSite] {
        &self.sites
    }

    /// The stored reference observables, if the structure carries any.
    pub fn reference(&self) -> Option<&ReferenceData> {
        self.reference.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_site_structure() -> Structure {
        Structure::new(vec![
            AtomSite::new("Au", Point3::new(0.0, 0.0, 0.0)),
            AtomSite::new("O", Point3::new(1.0, 2.0, 3.0)),
        ])
    }

    #[test]
    fn new_structure_has_sites_and_no_reference() {
        let structure = two_site_structure();
        assert_eq!(structure.atom_count(), 2);
        assert_eq!(structure.sites()[0].species, "Au");
        assert_eq!(structure.sites()[1].position, Point3::new(1.0, 2.0, 3.0));
        assert!(structure.reference().is_none());
    }

    #[test]
    fn set_reference_stores_forces_and_energy() {
        let mut structure = two_site_structure();
        structure
            .set_reference(
                vec![Vector3::new(0.1, 0.2, 0.3), Vector3::new(-0.1, 0.0, 0.0)],
                -4.5,
            )
            .unwrap();

        let reference = structure.reference().unwrap();
        assert_eq!(reference.forces.len(), 2);
        assert_eq!(reference.forces[0], Vector3::new(0.1, 0.2, 0.3));
        assert_eq!(reference.energy, -4.5);
    }

    #[test]
    fn set_reference_rejects_wrong_force_count() {
        let mut structure = two_site_structure();
        let result = structure.set_reference(vec![Vector3::zeros()], 0.0);
        assert_eq!(
            result,
            Err(StructureError::ForceCountMismatch {
                expected: 2,
                actual: 1
            })
        );
        assert!(structure.reference().is_none());
    }

    #[test]
    fn empty_structure_is_valid() {
        let structure = Structure::default();
        assert_eq!(structure.atom_count(), 0);
        assert!(structure.sites().is_empty());
    }
}
