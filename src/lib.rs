// Library exports for tabdim

pub mod csv_reader;
pub mod data;
pub mod encode;
pub mod error;
pub mod filter;
pub mod parser;
pub mod runtime;
pub mod scale;
pub mod types;

// Derived views over a loaded dataset
pub mod ir;
pub mod resolve;
pub mod transform;

use serde::Deserialize;

pub use data::{Dataset, DimensionData, DimensionRef, Value};
pub use error::{LoadError, LookupError};
pub use filter::RangeFilter;
pub use resolve::{BarAggregation, BarSpec};
pub use types::DataType;

/// How delimited text is split into fields.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoadOptions {
    /// Source name used in diagnostics
    #[serde(default)]
    pub name: Option<String>,
    /// Field separator. Detected from the header line when absent.
    #[serde(default)]
    pub delimiter: Option<char>,
    /// Honour double-quoted fields
    #[serde(default = "default_quoting")]
    pub quoting: bool,
}

fn default_quoting() -> bool { true }

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            name: None,
            delimiter: None,
            quoting: true,
        }
    }
}

impl LoadOptions {
    pub fn source_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| "data".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_options_defaults() {
        let options: LoadOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, LoadOptions::default());
        assert_eq!(options.source_name(), "data");
    }

    #[test]
    fn test_load_options_from_json() {
        let options: LoadOptions =
            serde_json::from_str(r#"{"name": "cars.tsv", "delimiter": "\t", "quoting": false}"#).unwrap();
        assert_eq!(options.delimiter, Some('\t'));
        assert!(!options.quoting);
        assert_eq!(options.source_name(), "cars.tsv");
    }
}
