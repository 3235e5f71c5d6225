use crate::{LoadError, SampleSet};

/// Trait defining the interface for format-specific sample parsers.
///
/// Implementors of this trait can parse sample grids and symmetry mappings from
/// different file formats (e.g., RON, JSON).
pub trait FormatParser {
    /// Parses file content into the samples and symmetry mapping it describes.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::ParseError` for malformed content and
    /// `LoadError::InvalidData` for well-formed content describing invalid samples.
    fn parse(&self, content: &str) -> Result<SampleSet, LoadError>;

    /// Returns a descriptive name for this parser format.
    ///
    /// This can be used for debugging, logging, or user-facing error messages.
    fn format_name(&self) -> &'static str;
}
