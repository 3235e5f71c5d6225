use crate::formats::json_format::JsonFormatParser;
use crate::formats::ron_format::RonFormatParser;
use crate::formats::FormatParser;
use crate::{LoadError, SampleSet};
use log::{debug, info};
use std::fs;
use std::path::Path;

/// Picks a parser from the file extension.
fn parser_for(path: &Path) -> Result<Box<dyn FormatParser>, LoadError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("ron") => Ok(Box::new(RonFormatParser::new())),
        Some("json") => Ok(Box::new(JsonFormatParser)),
        other => Err(LoadError::UnsupportedFormat(
            other.unwrap_or("<none>").to_owned(),
        )),
    }
}

/// Loads sample grids and the symmetry mapping from a specified file.
///
/// The format is chosen by extension: `.ron` or `.json`.
///
/// # Errors
///
/// Returns `LoadError::UnsupportedFormat` for unknown extensions, `LoadError::Io`
/// if the file cannot be read, and parse/validation errors from the format parser.
pub fn load_from_file(path: &Path) -> Result<SampleSet, LoadError> {
    let parser = parser_for(path)?;
    debug!("Reading {:?} as {}", path, parser.format_name());
    let content = fs::read_to_string(path)?;
    let set = parser.parse(&content)?;
    info!(
        "Loaded {} sample(s) from {:?} ({} rotate, {} reflect mappings)",
        set.samples.len(),
        path,
        set.symmetry.rotate.len(),
        set.symmetry.reflect.len()
    );
    Ok(set)
}
