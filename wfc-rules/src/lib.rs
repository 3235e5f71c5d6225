//! Pattern extraction and adjacency rules for the overlapping Wave Function Collapse model.
//!
//! Samples come in through the [`GridSource`] / [`SymmetryMappingSource`] collaborator traits
//! (or from a sample file via [`loader::load_from_file`]) and leave as an immutable
//! [`PatternCatalog`] plus the [`AdjacencyRules`] the solver propagates with.

use thiserror::Error;

pub mod adjacency;
pub mod catalog;
pub mod formats;
pub mod loader;
pub mod source;
pub mod types;

pub use adjacency::{AdjacencyRules, Direction};
pub use catalog::{build_patterns, CatalogError, CatalogOptions, CategoryGrid, Pattern, PatternCatalog, SymmetryMap};
pub use source::{GridSource, SampleGrid, SampleSet, SymmetryMappingSource, SymmetryTable};
pub use types::{Category, TileDictionary, TileId};

/// Errors that can occur while loading a sample file.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("I/O error reading file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse sample format (e.g., RON/JSON): {0}")]
    ParseError(String),
    #[error("Invalid sample data: {0}")]
    InvalidData(String),
    #[error("Unsupported sample file format: {0}")]
    UnsupportedFormat(String),
    #[error("Feature not enabled: {0}")]
    FeatureNotEnabled(String),
}
