use crate::core::models::table::{AnnotatedTable, EvalTable};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Output directory '{path}' already exists")]
    AlreadyExists { path: String },
    #[error("File I/O error for '{path}': {source}")]
    Io { path: String, source: io::Error },
    #[error("CSV serialization error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
}

/// Creates the run's output directory.
///
/// The directory must not exist yet: a pre-existing directory fails with
/// [`TableError::AlreadyExists`] so a prior run's results are never silently
/// overwritten.
///
/// # Errors
///
/// Returns [`TableError::AlreadyExists`] if the path exists, or
/// [`TableError::Io`] for any other filesystem failure.
pub fn create_output_dir<P: AsRef<Path>>(path: P) -> Result<(), TableError> {
    let path = path.as_ref();
    fs::create_dir(path).map_err(|source| {
        let path = path.to_string_lossy().to_string();
        if source.kind() == io::ErrorKind::AlreadyExists {
            TableError::AlreadyExists { path }
        } else {
            TableError::Io { path, source }
        }
    })
}

/// Writes an evaluation table to `path` as a delimited file with one header
/// row and the stable column order `structure_id,atom_id,f_x,f_y,f_z,E`.
///
/// # Errors
///
/// Returns [`TableError::Io`] if the file cannot be created or flushed, or
/// [`TableError::Csv`] if serialization fails.
pub fn write_eval_table<P: AsRef<Path>>(table: &EvalTable, path: P) -> Result<(), TableError> {
    write_rows(table.rows(), path.as_ref())
}

/// Writes an annotated model table to `path`; the column order extends the
/// evaluation-table columns with `diff_f_x,diff_f_y,diff_f_z,diff_|f|,diff_E`
/// and the `metadata` annotation column.
///
/// # Errors
///
/// Returns [`TableError::Io`] if the file cannot be created or flushed, or
/// [`TableError::Csv`] if serialization fails.
pub fn write_annotated_table<P: AsRef<Path>>(
    table: &AnnotatedTable,
    path: P,
) -> Result<(), TableError> {
    write_rows(table.rows(), path.as_ref())
}

fn write_rows<S: Serialize>(rows: &[S], path: &Path) -> Result<(), TableError> {
    let display = path.to_string_lossy().to_string();
    let file = File::create(path).map_err(|source| TableError::Io {
        path: display.clone(),
        source,
    })?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(file));
    for row in rows {
        writer.serialize(row).map_err(|source| TableError::Csv {
            path: display.clone(),
            source,
        })?;
    }
    writer.flush().map_err(|source| TableError::Io {
        path: display,
        source,
    })
}
