use crate::formats::FormatParser;
use crate::{LoadError, SampleSet};
#[cfg(feature = "serde")]
use serde::Deserialize;
#[cfg(feature = "serde")]
use std::collections::HashMap;

/// A parser implementation for RON (Rusty Object Notation) sample files.
pub struct RonFormatParser;

impl Default for RonFormatParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RonFormatParser {
    /// Creates a new RON format parser
    pub fn new() -> Self {
        Self
    }
}

/// Represents the top-level structure of a sample file in RON format.
/// Used internally for deserialization.
#[cfg(feature = "serde")]
#[derive(Debug, Clone, Deserialize)]
struct RonSampleFile {
    /// Sample grids, each a list of rows with one character per tile.
    samples: Vec<Vec<String>>,
    /// Tile each tile turns into under a quarter turn.
    #[serde(default)]
    rotate: HashMap<char, char>,
    /// Tile each tile turns into when mirrored horizontally.
    #[serde(default)]
    reflect: HashMap<char, char>,
}

impl FormatParser for RonFormatParser {
    fn format_name(&self) -> &'static str {
        "Rusty Object Notation (RON)"
    }

    #[cfg(feature = "serde")]
    fn parse(&self, ron_content: &str) -> Result<SampleSet, LoadError> {
        let file: RonSampleFile = ron::from_str(ron_content)
            .map_err(|e| LoadError::ParseError(format!("RON deserialization failed: {e}")))?;
        super::build_sample_set(&file.samples, &file.rotate, &file.reflect)
    }

    /// Stub implementation when the `serde` feature is not enabled.
    #[cfg(not(feature = "serde"))]
    fn parse(&self, _ron_content: &str) -> Result<SampleSet, LoadError> {
        Err(LoadError::FeatureNotEnabled(
            "serde (required for RON parsing)".to_string(),
        ))
    }
}

/// Parses a sample set defined in a RON string.
pub fn parse_ron_samples(ron_content: &str) -> Result<SampleSet, LoadError> {
    RonFormatParser::new().parse(ron_content)
}
