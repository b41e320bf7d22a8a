//! # ForceBench Core Library
//!
//! A batch evaluation harness for trained interatomic force/energy models:
//! it extracts a flat per-atom table of forces and structure energies from a
//! held-out trajectory slice (once from stored reference data and once per
//! model under test), computes row-wise deviations against the reference,
//! and persists one tabular file per model.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to ensure a
//! clear separation of concerns, making it modular, testable, and extensible.
//!
//! - **[`core`]: The Foundation.** Contains stateless data models
//!   (`Structure`, the evaluation tables), the pure pair-potential math that
//!   backs deployed model checkpoints, and file I/O (trajectory reading,
//!   tabular output).
//!
//! - **[`engine`]: The Logic Core.** Hosts the pipeline building blocks: the
//!   `Predictor` capability (reference data and checkpoint-backed models
//!   behind one trait), the table `extract` and `annotate` passes, the run
//!   configuration, and progress reporting.
//!
//! - **[`workflows`]: The Public API.** The highest-level, user-facing layer.
//!   [`workflows::evaluate::run`] sequences the whole evaluation, from model
//!   construction through extraction and comparison to persistence, with
//!   fail-fast error propagation and no partial output.

pub mod core;
pub mod engine;
pub mod workflows;
