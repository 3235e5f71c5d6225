//! Module defining parsers for different sample file formats.

// Export the core parser trait
pub mod parser;
pub use parser::FormatParser;

// Format-specific implementations
pub mod json_format;
pub mod ron_format;

#[cfg(feature = "serde")]
use crate::source::{SampleGrid, SampleSet, SymmetryTable};
#[cfg(feature = "serde")]
use crate::types::TileId;
#[cfg(feature = "serde")]
use crate::LoadError;
#[cfg(feature = "serde")]
use std::collections::HashMap;

/// Converts deserialized rows and character maps into a `SampleSet`.
#[cfg(feature = "serde")]
pub(crate) fn build_sample_set(
    samples: &[Vec<String>],
    rotate: &HashMap<char, char>,
    reflect: &HashMap<char, char>,
) -> Result<SampleSet, LoadError> {
    if samples.is_empty() {
        return Err(LoadError::InvalidData("No samples defined.".to_owned()));
    }
    let samples = samples
        .iter()
        .enumerate()
        .map(|(index, rows)| {
            SampleGrid::from_rows(rows).map_err(|e| {
                LoadError::InvalidData(format!("Sample {index}: {e}"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let to_table = |map: &HashMap<char, char>| {
        map.iter()
            .map(|(&from, &to)| (TileId::from_char(from), TileId::from_char(to)))
            .collect()
    };
    Ok(SampleSet {
        samples,
        symmetry: SymmetryTable {
            rotate: to_table(rotate),
            reflect: to_table(reflect),
        },
    })
}
