use serde::Serialize;

/// One row of an evaluation table: the forces on one atom and the energy of
/// the structure that owns it.
///
/// The serialized column order is the field order below, giving the stable
/// header `structure_id,atom_id,f_x,f_y,f_z,E`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EvalRow {
    /// Index of the source structure (0-based, in source order).
    pub structure_id: usize,
    /// Index of the atom within its structure.
    pub atom_id: usize,
    /// Force x-component on this atom.
    pub f_x: f64,
    /// Force y-component on this atom.
    pub f_y: f64,
    /// Force z-component on this atom.
    pub f_z: f64,
    /// Energy of the owning structure, duplicated across all its atom rows.
    #[serde(rename = "E")]
    pub energy: f64,
}

/// The central data product: one row per (structure, atom) pair, ordered by
/// structure index then atom index.
///
/// Row count equals the sum of the per-structure atom counts. Every table
/// derived from the same structure slice shares this row order, which is what
/// makes row-wise subtraction between a model table and the reference table
/// valid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvalTable {
    rows: Vec<EvalRow>,
}

impl EvalTable {
    /// Creates an empty evaluation table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a row; callers append in (structure_id, atom_id) order.
    pub fn push(&mut self, row: EvalRow) {
        self.rows.push(row);
    }

    /// The number of atom rows in the table.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The rows of the table, in (structure_id, atom_id) order.
    pub fn rows(&self) -> &[EvalRow] {
        &self.rows
    }
}

/// An [`EvalRow`] augmented with its deviation from the reference table.
///
/// `diff_f_norm` serializes under the header `diff_|f|`: the Euclidean norm
/// of the per-row force-difference vector, one scalar per atom row.
/// `metadata` is a sparse free-form annotation column, empty except where a
/// marker was stamped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedRow {
    /// Index of the source structure (0-based, in source order).
    pub structure_id: usize,
    /// Index of the atom within its structure.
    pub atom_id: usize,
    /// Predicted force x-component on this atom.
    pub f_x: f64,
    /// Predicted force y-component on this atom.
    pub f_y: f64,
    /// Predicted force z-component on this atom.
    pub f_z: f64,
    /// Predicted energy of the owning structure.
    #[serde(rename = "E")]
    pub energy: f64,
    /// Difference to the reference force x-component.
    pub diff_f_x: f64,
    /// Difference to the reference force y-component.
    pub diff_f_y: f64,
    /// Difference to the reference force z-component.
    pub diff_f_z: f64,
    /// Euclidean norm of the force-difference vector of this row.
    #[serde(rename = "diff_|f|")]
    pub diff_f_norm: f64,
    /// Difference to the reference energy, duplicated per structure.
    #[serde(rename = "diff_E")]
    pub diff_energy: f64,
    /// Free-form per-row annotation, sparsely populated.
    pub metadata: String,
}

/// An evaluation table annotated with per-row differences against the
/// reference; produced for model tables only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotatedTable {
    rows: Vec<AnnotatedRow>,
}

impl AnnotatedTable {
    /// Creates an empty annotated table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a row; callers append in (structure_id, atom_id) order.
    pub fn push(&mut self, row: AnnotatedRow) {
        self.rows.push(row);
    }

    /// The number of atom rows in the table.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The rows of the table, in (structure_id, atom_id) order.
    pub fn rows(&self) -> &[AnnotatedRow] {
        &self.rows
    }

    /// Writes `marker` into the annotation column of the first row.
    ///
    /// All other rows keep an empty annotation; stamping an empty table is a
    /// no-op.
    pub fn stamp_marker(&mut self, marker: &str) {
        if let Some(first) = self.rows.first_mut() {
            first.metadata = marker.to_string();
        }
    }
}
