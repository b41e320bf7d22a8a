use crate::core::models::table::{AnnotatedRow, AnnotatedTable, EvalTable};
use nalgebra::Vector3;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompareError {
    #[error("Model table has {model_rows} row(s), reference table has {reference_rows}")]
    RowCountMismatch {
        model_rows: usize,
        reference_rows: usize,
    },

    #[error(
        "Row {row} is misaligned: model key {model:?} vs reference key {reference:?}"
    )]
    KeyMismatch {
        row: usize,
        model: (usize, usize),
        reference: (usize, usize),
    },
}

/// Annotates a model table with its row-wise deviation from the reference
/// table.
///
/// Both tables must come from the same structure slice; alignment is
/// asserted on the (structure_id, atom_id) key of every row rather than
/// assumed. Each output row carries the model's values plus
/// `diff_f_{x,y,z}` (model minus reference), `diff_|f|` (the Euclidean norm
/// of that per-row difference vector, never a norm over any other axis) and
/// `diff_E` (model minus reference energy, duplicated across a structure's
/// atom rows exactly like `E` itself). The annotation column starts empty.
///
/// Pure function: no I/O, inputs are untouched.
///
/// # Errors
///
/// Returns [`CompareError::RowCountMismatch`] or
/// [`CompareError::KeyMismatch`] if the tables are not row-aligned.
pub fn annotate(
    model: &EvalTable,
    reference: &EvalTable,
) -> Result<AnnotatedTable, CompareError> {
    if model.len() != reference.len() {
        return Err(CompareError::RowCountMismatch {
            model_rows: model.len(),
            reference_rows: reference.len(),
        });
    }

    let mut table = AnnotatedTable::new();
    for (row, (m, r)) in model.rows().iter().zip(reference.rows()).enumerate() {
        if (m.structure_id, m.atom_id) != (r.structure_id, r.atom_id) {
            return Err(CompareError::KeyMismatch {
                row,
                model: (m.structure_id, m.atom_id),
                reference: (r.structure_id, r.atom_id),
            });
        }

        let diff = Vector3::new(m.f_x - r.f_x, m.f_y - r.f_y, m.f_z - r.f_z);
        table.push(AnnotatedRow {
            structure_id: m.structure_id,
            atom_id: m.atom_id,
            f_x: m.f_x,
            f_y: m.f_y,
            f_z: m.f_z,
            energy: m.energy,
            diff_f_x: diff.x,
            diff_f_y: diff.y,
            diff_f_z: diff.z,
            diff_f_norm: diff.norm(),
            diff_energy: m.energy - r.energy,
            metadata: String::new(),
        });
    }

    Ok(table)
}
