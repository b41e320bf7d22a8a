use crate::core::io::traits::TrajectoryFile;
use crate::core::models::structure::{AtomSite, Structure, StructureError};
use nalgebra::{Point3, Vector3};
use std::collections::HashMap;
use std::io::{self, BufRead};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XyzError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: XyzParseErrorKind,
    },
    #[error("Inconsistent frame starting on line {line}: {source}")]
    Inconsistency {
        line: usize,
        source: StructureError,
    },
}

#[derive(Debug, Error)]
pub enum XyzParseErrorKind {
    #[error("Invalid atom count (value: '{value}')")]
    InvalidAtomCount { value: String },
    #[error("Unexpected end of file ({missing} frame line(s) missing)")]
    UnexpectedEof { missing: usize },
    #[error("Atom line has {actual} column(s), expected {expected}")]
    TooFewColumns { expected: usize, actual: usize },
    #[error("Invalid float in column '{column}' (value: '{value}')")]
    InvalidFloat {
        column: &'static str,
        value: String,
    },
    #[error("Malformed Properties descriptor '{value}'")]
    InvalidProperties { value: String },
    #[error("Invalid energy value '{value}'")]
    InvalidEnergy { value: String },
}

/// Column layout of one frame's atom lines, derived from the `Properties`
/// descriptor of the comment line.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ColumnLayout {
    species: usize,
    position: usize,
    forces: Option<usize>,
    width: usize,
}

impl ColumnLayout {
    /// The layout assumed when the comment line carries no `Properties` key:
    /// a species column followed by three position columns.
    fn plain() -> Self {
        Self {
            species: 0,
            position: 1,
            forces: None,
            width: 4,
        }
    }
}

/// Reader for extended-XYZ trajectory files.
///
/// A trajectory is a concatenation of frames, each formed by an atom-count
/// line, a comment line of whitespace-separated `key=value` pairs
/// (double-quoted values allowed), and one line per atom. The recognized
/// comment keys are `Properties` (the column layout, as `name:type:count`
/// triplets; `species:S:1` and `pos:R:3` are required, `forces:R:3` is
/// optional, other properties are skipped by their column width) and
/// `energy`. A frame carries stored reference data only when it has both a
/// forces column and an energy value.
pub struct ExtXyzFile;

impl TrajectoryFile for ExtXyzFile {
    type Error = XyzError;

    fn read_from(reader: &mut impl BufRead) -> Result<Vec<Structure>, XyzError> {
        let mut structures = Vec::new();
        let mut lines = reader.lines().enumerate();

        while let Some((index, line_result)) = lines.next() {
            let line = line_result?;
            let frame_line = index + 1;
            if line.trim().is_empty() {
                continue;
            }

            let atom_count: usize = line.trim().parse().map_err(|_| XyzError::Parse {
                line: frame_line,
                kind: XyzParseErrorKind::InvalidAtomCount {
                    value: line.trim().to_string(),
                },
            })?;

            let (comment_line, comment) = match lines.next() {
                Some((i, l)) => (i + 1, l?),
                None => {
                    return Err(XyzError::Parse {
                        line: frame_line,
                        kind: XyzParseErrorKind::UnexpectedEof {
                            missing: atom_count + 1,
                        },
                    });
                }
            };

            let keys = parse_comment_keys(&comment);
            let layout = match keys.get("Properties") {
                Some(value) => parse_properties(value).map_err(|kind| XyzError::Parse {
                    line: comment_line,
                    kind,
                })?,
                None => ColumnLayout::plain(),
            };
            let energy = match keys.get("energy") {
                Some(value) => {
                    Some(value.parse::<f64>().map_err(|_| XyzError::Parse {
                        line: comment_line,
                        kind: XyzParseErrorKind::InvalidEnergy {
                            value: value.clone(),
                        },
                    })?)
                }
                None => None,
            };

            let mut sites = Vec::with_capacity(atom_count);
            let mut forces = Vec::with_capacity(atom_count);
            for remaining in (1..=atom_count).rev() {
                let (atom_line, line) = match lines.next() {
                    Some((i, l)) => (i + 1, l?),
                    None => {
                        return Err(XyzError::Parse {
                            line: frame_line,
                            kind: XyzParseErrorKind::UnexpectedEof { missing: remaining },
                        });
                    }
                };

                let columns: Vec<&str> = line.split_whitespace().collect();
                if columns.len() < layout.width {
                    return Err(XyzError::Parse {
                        line: atom_line,
                        kind: XyzParseErrorKind::TooFewColumns {
                            expected: layout.width,
                            actual: columns.len(),
                        },
                    });
                }

                let position = Point3::new(
                    parse_float(&columns, layout.position, "pos.x", atom_line)?,
                    parse_float(&columns, layout.position + 1, "pos.y", atom_line)?,
                    parse_float(&columns, layout.position + 2, "pos.z", atom_line)?,
                );
                sites.push(AtomSite::new(columns[layout.species], position));

                if let Some(start) = layout.forces {
                    forces.push(Vector3::new(
                        parse_float(&columns, start, "forces.x", atom_line)?,
                        parse_float(&columns, start + 1, "forces.y", atom_line)?,
                        parse_float(&columns, start + 2, "forces.z", atom_line)?,
                    ));
                }
            }

            let mut structure = Structure::new(sites);
            if let (true, Some(energy)) = (layout.forces.is_some(), energy) {
                structure
                    .set_reference(forces, energy)
                    .map_err(|source| XyzError::Inconsistency {
                        line: frame_line,
                        source,
                    })?;
            }
            structures.push(structure);
        }

        Ok(structures)
    }
}

/// Splits a comment line into `key=value` pairs, honoring double quotes
/// around values (`Lattice="..."`). Tokens without '=' are ignored.
fn parse_comment_keys(comment: &str) -> HashMap<String, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for c in comment.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
        .into_iter()
        .filter_map(|token| {
            token
                .split_once('=')
                .map(|(key, value)| (key.to_string(), value.to_string()))
        })
        .collect()
}

/// Parses a `Properties` descriptor (`name:type:count` triplets) into a
/// column layout.
fn parse_properties(value: &str) -> Result<ColumnLayout, XyzParseErrorKind> {
    let malformed = || XyzParseErrorKind::InvalidProperties {
        value: value.to_string(),
    };

    let fields: Vec<&str> = value.split(':').collect();
    if fields.is_empty() || fields.len() % 3 != 0 {
        return Err(malformed());
    }

    let mut species = None;
    let mut position = None;
    let mut forces = None;
    let mut offset = 0usize;
    for triplet in fields.chunks(3) {
        let name = triplet[0];
        let count: usize = triplet[2].parse().map_err(|_| malformed())?;
        match name {
            "species" if count == 1 => species = Some(offset),
            "pos" if count == 3 => position = Some(offset),
            "forces" if count == 3 => forces = Some(offset),
            _ => {}
        }
        offset += count;
    }

    match (species, position) {
        (Some(species), Some(position)) => Ok(ColumnLayout {
            species,
            position,
            forces,
            width: offset,
        }),
        _ => Err(malformed()),
    }
}

fn parse_float(
    columns: &[&str],
    index: usize,
    column: &'static str,
    line: usize,
) -> Result<f64, XyzError> {
    columns[index].parse().map_err(|_| XyzError::Parse {
        line,
        kind: XyzParseErrorKind::InvalidFloat {
            column,
            value: columns[index].to_string(),
        },
    })
}
