//! # Engine Module
//!
//! This module hosts the building blocks of the evaluation pipeline: the run
//! configuration, the predictor capability that puts stored reference data
//! and checkpoint-backed models behind one interface, the table extraction
//! and comparison passes, progress reporting, and the engine-level error
//! type.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - The single explicit run configuration
//!   and its builder; output-name derivation for model tables.
//! - **Prediction** ([`predictor`]) - The `Predictor` trait with its
//!   reference and checkpoint-backed implementations.
//! - **Extraction** ([`extract`]) - Flattening a structure slice into the
//!   per-atom evaluation table, optionally through a predictor.
//! - **Comparison** ([`compare`]) - Row-wise annotation of a model table
//!   with its deviation from the reference table.
//! - **Progress Monitoring** ([`progress`]) - Progress events and the
//!   callback-based reporter.
//! - **Error Handling** ([`error`]) - Engine-specific error types naming the
//!   offending model, structure, or path.

pub mod compare;
pub mod config;
pub mod error;
pub mod extract;
pub mod predictor;
pub mod progress;
