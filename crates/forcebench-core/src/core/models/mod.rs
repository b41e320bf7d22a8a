//! Data models for atomic structures and evaluation tables.
//!
//! [`structure`] holds one atomic configuration (species, positions, and
//! optionally the stored reference forces/energy it was labeled with).
//! [`table`] holds the flattened per-atom tables the pipeline produces: one
//! row per (structure, atom) pair, with the structure energy duplicated
//! across its atom rows.

pub mod structure;
pub mod table;
