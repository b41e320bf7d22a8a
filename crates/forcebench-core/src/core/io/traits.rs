use crate::core::models::structure::Structure;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Defines the interface for reading trajectory file formats.
///
/// A trajectory is an ordered sequence of atomic structures; implementors
/// handle format-specific parsing and yield the structures in file order, so
/// callers can slice the result positionally.
pub trait TrajectoryFile {
    /// The error type for read operations.
    type Error: Error + From<io::Error>;

    /// Reads an ordered sequence of structures from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or I/O operations encounter issues.
    fn read_from(reader: &mut impl BufRead) -> Result<Vec<Structure>, Self::Error>;

    /// Reads an ordered sequence of structures from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Structure>, Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }
}
