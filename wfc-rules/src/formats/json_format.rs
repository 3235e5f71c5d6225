use crate::formats::FormatParser;
use crate::{LoadError, SampleSet};
#[cfg(feature = "serde")]
use serde::Deserialize;
#[cfg(feature = "serde")]
use std::collections::HashMap;

/// A parser implementation for JSON sample files.
///
/// Same shape as the RON format; map keys are one-character strings.
#[derive(Debug, Default)]
pub struct JsonFormatParser;

#[cfg(feature = "serde")]
#[derive(Debug, Clone, Deserialize)]
struct JsonSampleFile {
    samples: Vec<Vec<String>>,
    #[serde(default)]
    rotate: HashMap<char, char>,
    #[serde(default)]
    reflect: HashMap<char, char>,
}

impl FormatParser for JsonFormatParser {
    fn format_name(&self) -> &'static str {
        "JSON"
    }

    #[cfg(feature = "serde")]
    fn parse(&self, content: &str) -> Result<SampleSet, LoadError> {
        let file: JsonSampleFile = serde_json::from_str(content)
            .map_err(|e| LoadError::ParseError(format!("JSON deserialization failed: {e}")))?;
        super::build_sample_set(&file.samples, &file.rotate, &file.reflect)
    }

    #[cfg(not(feature = "serde"))]
    fn parse(&self, _content: &str) -> Result<SampleSet, LoadError> {
        Err(LoadError::FeatureNotEnabled(
            "serde (required for JSON parsing)".to_string(),
        ))
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;
    use crate::{SymmetryMappingSource, TileId};

    #[test]
    fn parses_reflect_map() {
        let content = r#"{ "samples": [["/\\"]], "reflect": { "/": "\\", "\\": "/" } }"#;
        let set = JsonFormatParser.parse(content).unwrap();
        assert_eq!(set.samples.len(), 1);
        assert_eq!(
            set.symmetry.reflected(TileId::from_char('/')),
            Some(TileId::from_char('\\'))
        );
    }

    #[test]
    fn rejects_empty_sample_list() {
        assert!(matches!(
            JsonFormatParser.parse(r#"{ "samples": [] }"#),
            Err(LoadError::InvalidData(_))
        ));
    }
}
