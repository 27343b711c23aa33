use crate::parser::{parse_bool, parse_clock, parse_float, parse_int};
use serde::{Deserialize, Serialize};

/// Column type, inferred once per column from its first data row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    #[default]
    Undefined,
    Float,
    Integer,
    Boolean,
    String,
    Date,
    Time,
    GraphEdgeList,
}

impl DataType {
    /// Date and String columns are laid out one bin per distinct value.
    pub fn is_categorical(self) -> bool {
        matches!(self, DataType::String | DataType::Date)
    }
}

/// Classify a cleaned token. The first matching rule wins.
pub fn infer_type(token: &str) -> DataType {
    if parse_bool(token).is_some() {
        DataType::Boolean
    } else if is_date(token) {
        DataType::Date
    } else if is_time(token) {
        DataType::Time
    } else if parse_int(token).is_some() {
        DataType::Integer
    } else if parse_float(token).is_some() {
        DataType::Float
    } else if token.contains('|') {
        DataType::GraphEdgeList
    } else if !token.is_empty() {
        DataType::String
    } else {
        DataType::Undefined
    }
}

fn is_date(token: &str) -> bool {
    token.contains('\\') && parse_clock(token, '\\').is_some()
}

// Colon-separated readings are never inferred; Time columns can only come
// from an explicit type.
fn is_time(_token: &str) -> bool {
    false
}
