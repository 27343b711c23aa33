use thiserror::Error;

/// Structural failures that abort a load. The dataset keeps its previous state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("Data file {source_name} has no lines. The file may be corrupted or have an incorrect encoding.")]
    NoLines { source_name: String },

    #[error("Data file {source_name} has a header but no values.")]
    HeaderWithoutValues { source_name: String },

    #[error(
        "Data file {source_name} has an inconsistent number of headers ({headers}) and values ({values}) in each row."
    )]
    ColumnCountMismatch {
        source_name: String,
        headers: usize,
        values: usize,
    },
}

/// Raised by pipelines that require a dimension to exist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("Dimension '{0}' not found")]
    UnknownDimension(String),

    #[error("Dimension index {index} out of range ({count} dimensions)")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("Dataset is not loaded")]
    NotLoaded,
}
