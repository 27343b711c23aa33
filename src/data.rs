use crate::csv_reader::{self, CsvData};
use crate::encode::{encode_column, GraphEdges, StringTable};
use crate::error::{LoadError, LookupError};
use crate::filter::RangeFilter;
use crate::scale::{closest_value, normalize_column, Metadata};
use crate::types::{infer_type, DataType};
use crate::LoadOptions;
use log::{info, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

/// A denormalized value: a number, or the original string of a String column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
        }
    }
}

/// Address of a dimension, by position or by identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionRef<'a> {
    Index(usize),
    Identifier(&'a str),
}

impl From<usize> for DimensionRef<'_> {
    fn from(index: usize) -> Self {
        DimensionRef::Index(index)
    }
}

impl<'a> From<&'a str> for DimensionRef<'a> {
    fn from(identifier: &'a str) -> Self {
        DimensionRef::Identifier(identifier)
    }
}

impl<'a> From<&'a String> for DimensionRef<'a> {
    fn from(identifier: &'a String) -> Self {
        DimensionRef::Identifier(identifier.as_str())
    }
}

/// One named column of the dataset, normalized into `[0, 1]`
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionData {
    identifier: String,
    index: usize,
    metadata: Metadata,
    data: Vec<f32>,
    string_table: Option<StringTable>,
}

impl DimensionData {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn data_type(&self) -> DataType {
        self.metadata.data_type
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Present iff the dimension is String-typed (and loaded)
    pub fn string_table(&self) -> Option<&StringTable> {
        self.string_table.as_ref()
    }

    pub fn is_categorical(&self) -> bool {
        self.metadata.data_type.is_categorical()
    }

    fn denormalize(&self, normalized: f32) -> f64 {
        self.metadata.denormalize(normalized as f64)
    }

    fn decode(&self, raw: f64) -> Option<Value> {
        let code = raw.round() as i32;
        self.string_table
            .as_ref()?
            .value_of(code)
            .map(|s| Value::Text(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadState {
    Empty,
    HeaderOnly,
    Loaded,
}

type LoadListener = Box<dyn Fn(&Dataset)>;

/// In-memory table of normalized dimensions built from delimited text.
///
/// A load either replaces every dimension at once or leaves the dataset as
/// it was.
pub struct Dataset {
    options: LoadOptions,
    dimensions: Vec<DimensionData>,
    name_index: HashMap<String, usize>,
    row_count: usize,
    graph_edges: GraphEdges,
    state: LoadState,
    listeners: Vec<LoadListener>,
}

impl fmt::Debug for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dataset")
            .field("name", &self.name())
            .field("dimensions", &self.dimensions)
            .field("row_count", &self.row_count)
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for Dataset {
    fn default() -> Self {
        Self::with_options(LoadOptions::default())
    }
}

/// Dimensions produced by one load, committed only on success
struct Staged {
    dimensions: Vec<DimensionData>,
    name_index: HashMap<String, usize>,
    row_count: usize,
    graph_edges: GraphEdges,
}

impl Dataset {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_options(LoadOptions {
            name: Some(name.into()),
            ..LoadOptions::default()
        })
    }

    pub fn with_options(options: LoadOptions) -> Self {
        Self {
            options,
            dimensions: Vec::new(),
            name_index: HashMap::new(),
            row_count: 0,
            graph_edges: GraphEdges::new(),
            state: LoadState::Empty,
            listeners: Vec::new(),
        }
    }

    pub fn name(&self) -> String {
        self.options.source_name()
    }

    /// Register a callback run after every successful [`Dataset::load`].
    pub fn on_loaded<F>(&mut self, listener: F)
    where
        F: Fn(&Dataset) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn is_loaded(&self) -> bool {
        self.state == LoadState::Loaded
    }

    pub fn dimension_count(&self) -> usize {
        self.dimensions.len()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn graph_edges(&self) -> &GraphEdges {
        &self.graph_edges
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DimensionData> {
        self.dimensions.iter()
    }

    pub fn index_of(&self, identifier: &str) -> Option<usize> {
        self.name_index.get(identifier).copied()
    }

    pub fn get<'a>(&self, dimension: impl Into<DimensionRef<'a>>) -> Option<&DimensionData> {
        match dimension.into() {
            DimensionRef::Index(index) => self.dimensions.get(index),
            DimensionRef::Identifier(identifier) => self
                .index_of(identifier)
                .and_then(|index| self.dimensions.get(index)),
        }
    }

    /// Like [`Dataset::get`], but a miss is an error.
    pub fn require<'a>(
        &self,
        dimension: impl Into<DimensionRef<'a>>,
    ) -> Result<&DimensionData, LookupError> {
        let dimension = dimension.into();
        self.get(dimension).ok_or_else(|| match dimension {
            DimensionRef::Index(index) => LookupError::IndexOutOfRange {
                index,
                count: self.dimensions.len(),
            },
            DimensionRef::Identifier(identifier) => {
                LookupError::UnknownDimension(identifier.to_string())
            }
        })
    }

    /// Dimension a filter refers to. Undefined or unknown names resolve to `None`.
    pub fn resolve(&self, filter: &RangeFilter) -> Option<&DimensionData> {
        if filter.is_undefined() {
            None
        } else {
            self.get(filter.name.as_str())
        }
    }

    pub fn string_table<'a>(&self, dimension: impl Into<DimensionRef<'a>>) -> Option<&StringTable> {
        self.get(dimension)?.string_table()
    }

    pub fn get_category_count<'a>(&self, dimension: impl Into<DimensionRef<'a>>) -> Option<usize> {
        self.get(dimension).map(|d| d.metadata.category_count)
    }

    /// Original value at a normalized position. String dimensions snap to the
    /// closest category first.
    pub fn get_value_approximate<'a>(
        &self,
        normalized: f32,
        dimension: impl Into<DimensionRef<'a>>,
    ) -> Option<Value> {
        let dimension = self.get(dimension)?;
        if dimension.data_type() == DataType::String {
            let closest = closest_value(&dimension.metadata.categories, normalized)?;
            dimension.decode(dimension.denormalize(closest))
        } else {
            Some(Value::Number(dimension.denormalize(normalized)))
        }
    }

    /// Original value at an exact normalized position.
    pub fn get_value_precise<'a>(
        &self,
        normalized: f32,
        dimension: impl Into<DimensionRef<'a>>,
    ) -> Option<Value> {
        let dimension = self.get(dimension)?;
        let raw = dimension.denormalize(normalized);
        if dimension.data_type() == DataType::String {
            dimension.decode(raw)
        } else {
            Some(Value::Number(raw))
        }
    }

    /// Parse, encode and normalize `text`, replacing all dimensions.
    pub fn load(&mut self, text: &str) -> Result<(), LoadError> {
        let started = Instant::now();
        let csv = csv_reader::read_csv(text, &self.options)?;
        let staged = stage(&csv);

        self.commit(staged, LoadState::Loaded);

        info!(
            "Data file {} successfully loaded in {:.3} seconds ({} dimensions, {} rows)",
            self.name(),
            started.elapsed().as_secs_f64(),
            self.dimension_count(),
            self.row_count
        );

        for listener in &self.listeners {
            listener(self);
        }
        Ok(())
    }

    /// Read identifiers and inferred types only. No data is loaded.
    pub fn load_header_only(&mut self, text: &str) -> Result<(), LoadError> {
        let header = csv_reader::read_header(text, &self.options)?;
        let types: Vec<DataType> = header
            .headers
            .iter()
            .enumerate()
            .map(|(i, _)| {
                header
                    .type_hints
                    .as_ref()
                    .and_then(|hints| hints.get(i))
                    .map(|hint| infer_type(hint))
                    .unwrap_or_default()
            })
            .collect();

        let mut staged = Staged {
            dimensions: Vec::with_capacity(header.headers.len()),
            name_index: HashMap::new(),
            row_count: 0,
            graph_edges: GraphEdges::new(),
        };
        for (index, (identifier, data_type)) in header.headers.into_iter().zip(types).enumerate() {
            index_identifier(&mut staged.name_index, &identifier, index);
            staged.dimensions.push(DimensionData {
                identifier,
                index,
                metadata: Metadata::with_type(data_type),
                data: Vec::new(),
                string_table: None,
            });
        }

        self.commit(staged, LoadState::HeaderOnly);
        Ok(())
    }

    fn commit(&mut self, staged: Staged, state: LoadState) {
        self.dimensions = staged.dimensions;
        self.name_index = staged.name_index;
        self.row_count = staged.row_count;
        self.graph_edges = staged.graph_edges;
        self.state = state;
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a DimensionData;
    type IntoIter = std::slice::Iter<'a, DimensionData>;

    fn into_iter(self) -> Self::IntoIter {
        self.dimensions.iter()
    }
}

fn index_identifier(name_index: &mut HashMap<String, usize>, identifier: &str, index: usize) {
    if let Some(existing) = name_index.get(identifier) {
        warn!(
            "Duplicate dimension identifier '{}' at index {}; lookups resolve to index {}",
            identifier, index, existing
        );
    } else {
        name_index.insert(identifier.to_string(), index);
    }
}

fn stage(csv: &CsvData) -> Staged {
    let width = csv.headers.len();
    let ragged = csv.rows.iter().filter(|row| row.len() != width).count();
    if ragged > 0 {
        log::debug!("{} row(s) do not have exactly {} fields", ragged, width);
    }

    let mut staged = Staged {
        dimensions: Vec::with_capacity(width),
        name_index: HashMap::new(),
        row_count: csv.rows.len(),
        graph_edges: GraphEdges::new(),
    };

    for (index, identifier) in csv.headers.iter().enumerate() {
        let data_type = csv.rows[0]
            .get(index)
            .map(|hint| infer_type(hint))
            .unwrap_or_default();

        let column = encode_column(
            identifier,
            data_type,
            csv.rows.iter().map(|row| row.get(index).map(String::as_str)),
        );
        let (data, metadata) = normalize_column(data_type, &column.values);

        for (row, edges) in column.edges {
            staged.graph_edges.entry(row).or_default().extend(edges);
        }

        index_identifier(&mut staged.name_index, identifier, index);
        staged.dimensions.push(DimensionData {
            identifier: identifier.clone(),
            index,
            metadata,
            data,
            string_table: column.string_table,
        });
    }

    staged
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    const CARS: &str = "name,mpg,origin\nford,18,usa\nvw,31,europe\nhonda,36,japan\nchevy,15,usa\n";

    fn loaded() -> Dataset {
        let mut dataset = Dataset::new("cars.csv");
        dataset.load(CARS).unwrap();
        dataset
    }

    #[test]
    fn test_load_basic() {
        let dataset = loaded();
        assert!(dataset.is_loaded());
        assert_eq!(dataset.dimension_count(), 3);
        assert_eq!(dataset.row_count(), 4);

        let mpg = dataset.get("mpg").unwrap();
        assert_eq!(mpg.index(), 1);
        assert_eq!(mpg.data_type(), DataType::Integer);
        assert_eq!(mpg.data()[3], 0.0);
        assert_eq!(mpg.data()[2], 1.0);

        let origin = dataset.get(2).unwrap();
        assert_eq!(origin.identifier(), "origin");
        assert_eq!(origin.data_type(), DataType::String);
        assert_eq!(dataset.get_category_count("origin"), Some(3));
    }

    #[test]
    fn test_lookup_miss() {
        let dataset = loaded();
        assert!(dataset.get("weight").is_none());
        assert!(dataset.get(9).is_none());
        assert!(dataset.get_value_approximate(0.5, "weight").is_none());
        assert_eq!(
            dataset.require(9).unwrap_err(),
            LookupError::IndexOutOfRange { index: 9, count: 3 }
        );
    }

    #[test]
    fn test_value_approximate_snaps_strings() {
        let dataset = loaded();
        // origin codes: usa 0, europe 1, japan 2 → normalized 0, 0.5, 1
        assert_eq!(
            dataset.get_value_approximate(0.4, "origin"),
            Some(Value::Text("europe".to_string()))
        );
        assert_eq!(
            dataset.get_value_approximate(0.95, "origin"),
            Some(Value::Text("japan".to_string()))
        );
        assert_eq!(
            dataset.get_value_approximate(0.5, "mpg"),
            Some(Value::Number(25.5))
        );
    }

    #[test]
    fn test_value_precise() {
        let dataset = loaded();
        assert_eq!(
            dataset.get_value_precise(0.0, "origin"),
            Some(Value::Text("usa".to_string()))
        );
        assert_eq!(dataset.get_value_precise(1.0, 1), Some(Value::Number(36.0)));
    }

    #[test]
    fn test_single_row_values_decode() {
        let mut dataset = Dataset::new("city.csv");
        dataset.load("city,pop\nparis,10\n").unwrap();
        let paris = Some(Value::Text("paris".to_string()));
        assert_eq!(dataset.get_value_approximate(0.0, "city"), paris);
        assert_eq!(dataset.get_value_precise(0.0, "city"), paris);
        assert_eq!(dataset.get_value_approximate(0.0, "pop"), Some(Value::Number(10.0)));
        assert_eq!(dataset.get_value_precise(0.0, "pop"), Some(Value::Number(10.0)));
    }

    #[test]
    fn test_single_category_string_decodes() {
        let mut dataset = Dataset::new("city.csv");
        dataset.load("city,pop\nparis,10\nparis,20\n").unwrap();
        let paris = Some(Value::Text("paris".to_string()));
        assert_eq!(dataset.get_value_approximate(0.0, "city"), paris);
        assert_eq!(dataset.get_value_approximate(0.9, "city"), paris);
        assert_eq!(dataset.get_value_precise(0.0, "city"), paris);
        assert_eq!(dataset.get_value_precise(1.0, "pop"), Some(Value::Number(20.0)));
    }

    #[test]
    fn test_failed_load_keeps_previous_state() {
        let mut dataset = loaded();
        let before = dataset.get("mpg").unwrap().clone();

        assert!(dataset.load("a,b\n1\n").is_err());
        assert!(dataset.load("").is_err());

        assert!(dataset.is_loaded());
        assert_eq!(dataset.dimension_count(), 3);
        assert_eq!(dataset.get("mpg"), Some(&before));
    }

    #[test]
    fn test_loaded_notification() {
        let calls = Rc::new(Cell::new(0));
        let mut dataset = Dataset::new("cars.csv");
        let counter = Rc::clone(&calls);
        dataset.on_loaded(move |d| {
            assert!(d.is_loaded());
            counter.set(counter.get() + 1);
        });

        dataset.load(CARS).unwrap();
        assert!(dataset.load("").is_err());
        dataset.load(CARS).unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_header_only() {
        let mut dataset = Dataset::new("cars.csv");
        dataset.load_header_only(CARS).unwrap();
        assert!(!dataset.is_loaded());
        assert_eq!(dataset.dimension_count(), 3);
        assert_eq!(dataset.row_count(), 0);
        assert_eq!(dataset.get("origin").unwrap().data_type(), DataType::String);
        assert!(dataset.get("origin").unwrap().data().is_empty());
    }

    #[test]
    fn test_ragged_rows_do_not_crash() {
        let mut dataset = Dataset::new("ragged.csv");
        dataset.load("a,b\n1,2\n3\n5,8,7\n").unwrap();
        assert_eq!(dataset.row_count(), 3);
        let b = dataset.get("b").unwrap();
        assert_eq!(b.data(), &[0.25, 0.0, 1.0]);
    }

    #[test]
    fn test_duplicate_identifier_resolves_to_first() {
        let mut dataset = Dataset::new("dup.csv");
        dataset.load("x,x\n1,a\n2,b\n").unwrap();
        assert_eq!(dataset.dimension_count(), 2);
        assert_eq!(dataset.get("x").unwrap().index(), 0);
    }

    #[test]
    fn test_graph_edges() {
        let mut dataset = Dataset::new("graph.csv");
        dataset.load("id,links\n0,1|2\n1,2|\n2,|\n").unwrap();
        assert_eq!(dataset.get("links").unwrap().data_type(), DataType::GraphEdgeList);
        assert_eq!(dataset.graph_edges().get(&0), Some(&vec![1, 2]));
        assert_eq!(dataset.graph_edges().get(&1), Some(&vec![2]));
        assert_eq!(dataset.graph_edges().get(&2), Some(&vec![]));
    }

    #[test]
    fn test_resolve_filter() {
        let dataset = loaded();
        assert!(dataset.resolve(&RangeFilter::undefined()).is_none());
        assert!(dataset.resolve(&RangeFilter::new("renamed")).is_none());
        assert_eq!(dataset.resolve(&RangeFilter::new("mpg")).unwrap().index(), 1);
    }
}
