//! Column encoding: raw string tokens to raw floats.
//!
//! Numeric columns parse leniently (unparsable tokens become zero). String
//! columns are dictionary-encoded in first-occurrence order, and edge lists
//! are recorded in a side table keyed by row.

use crate::parser::{parse_bool, parse_clock, parse_edge_list, parse_float, parse_int};
use crate::types::DataType;
use indexmap::IndexSet;
use log::debug;
use std::collections::BTreeMap;

/// Row index → edge targets, for graph edge-list columns
pub type GraphEdges = BTreeMap<usize, Vec<i64>>;

/// Bidirectional string ↔ code table for one String column.
///
/// Codes are insertion indices: the first distinct value gets `0` and each
/// new value gets one more than the highest existing code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringTable {
    values: IndexSet<String>,
}

impl StringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Code for `value`, assigning the next one if unseen.
    pub fn encode(&mut self, value: &str) -> i32 {
        if let Some(code) = self.values.get_index_of(value) {
            return code as i32;
        }
        let (code, _) = self.values.insert_full(value.to_string());
        code as i32
    }

    pub fn code_of(&self, value: &str) -> Option<i32> {
        self.values.get_index_of(value).map(|c| c as i32)
    }

    pub fn value_of(&self, code: i32) -> Option<&str> {
        usize::try_from(code)
            .ok()
            .and_then(|c| self.values.get_index(c))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(code, value)` pairs in code order
    pub fn iter(&self) -> impl Iterator<Item = (i32, &str)> {
        self.values
            .iter()
            .enumerate()
            .map(|(code, value)| (code as i32, value.as_str()))
    }
}

/// One column after encoding, before normalization
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncodedColumn {
    pub values: Vec<f64>,
    pub string_table: Option<StringTable>,
    pub edges: GraphEdges,
}

/// Encode every row of a column. `None` marks a row too short to have this field.
pub fn encode_column<'a, I>(identifier: &str, data_type: DataType, tokens: I) -> EncodedColumn
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut column = EncodedColumn {
        string_table: (data_type == DataType::String).then(StringTable::new),
        ..Default::default()
    };
    let mut degraded = 0usize;

    for (row, token) in tokens.into_iter().enumerate() {
        let Some(token) = token else {
            degraded += 1;
            column.values.push(0.0);
            continue;
        };

        let value = match data_type {
            DataType::Boolean => parse_bool(token).map(|b| if b { 1.0 } else { 0.0 }),
            DataType::Integer => parse_int(token).map(f64::from),
            DataType::Float => parse_float(token),
            DataType::Date => encode_clock(token, '\\'),
            DataType::Time => encode_clock(token, ':'),
            DataType::GraphEdgeList => {
                column.edges.insert(row, parse_edge_list(token));
                Some(0.0)
            }
            DataType::String => column
                .string_table
                .as_mut()
                .map(|table| f64::from(table.encode(token))),
            DataType::Undefined => Some(0.0),
        };

        column.values.push(value.unwrap_or_else(|| {
            degraded += 1;
            0.0
        }));
    }

    if degraded > 0 {
        debug!(
            "Column '{}' ({:?}): {} token(s) degraded to zero",
            identifier, data_type, degraded
        );
    }

    column
}

/// `H\M` → `H*60 + M`, `H\M\S` → `H*3600 + M*60 + S`
fn encode_clock(token: &str, separator: char) -> Option<f64> {
    match parse_clock(token, separator)?.as_slice() {
        [a, b] => Some(a * 60.0 + b),
        [h, m, s] => Some(h * 3600.0 + m * 60.0 + s),
        _ => None,
    }
}
