// Bar-chart pipeline and dataset summaries over a loaded dataset

use crate::data::{Dataset, DimensionData};
use crate::error::LookupError;
use crate::filter::RangeFilter;
use crate::ir::{BarLayout, BinnedDimension};
use crate::resolve::BarSpec;
use crate::scale::Metadata;
use crate::transform::{aggregate, bin_dimension, Reduction};
use log::warn;
use serde::Serialize;

/// Footprint used along an axis with no dimension bound to it
pub const UNBOUND_EXTENT: f32 = 0.005;

/// Compute bar positions for every row of `dataset`.
///
/// X and Z are binned (one bin per distinct value for categorical
/// dimensions). Y is either passed through or reduced per `(x, z)` cell; with
/// no Y dimension the bars show row counts.
pub fn build_bar_layout(dataset: &Dataset, spec: &BarSpec) -> Result<BarLayout, LookupError> {
    if !dataset.is_loaded() {
        return Err(LookupError::NotLoaded);
    }
    let rows = dataset.row_count();

    let x_binned = bin_axis(dataset, spec.x(), spec.x_bins());
    let z_binned = bin_axis(dataset, spec.z(), spec.z_bins());

    let x = x_binned
        .as_ref()
        .map_or_else(|| vec![0.0; rows], |b| b.positions.clone());
    let z = z_binned
        .as_ref()
        .map_or_else(|| vec![0.0; rows], |b| b.positions.clone());

    let (y, representative, groups) = match (bound(dataset, spec.y()), spec.aggregation().reduction()) {
        (None, _) => {
            let agg = aggregate(&x, &z, None, Reduction::Count);
            (agg.values, agg.representative, agg.groups)
        }
        (Some(y), None) => (y.data().to_vec(), vec![true; rows], Vec::new()),
        (Some(y), Some(reduction)) => {
            let agg = aggregate(&x, &z, Some(y.data()), reduction);
            (agg.values, agg.representative, agg.groups)
        }
    };

    let extent = |binned: &Option<BinnedDimension>| -> (f32, usize) {
        match binned {
            Some(b) => (1.0 / b.bin_count as f32 / 2.0, b.bin_count),
            None => (UNBOUND_EXTENT, 0),
        }
    };
    let (width, x_bins) = extent(&x_binned);
    let (depth, z_bins) = extent(&z_binned);

    Ok(BarLayout {
        x,
        y,
        z,
        representative,
        width,
        depth,
        x_bins,
        z_bins,
        groups,
    })
}

/// Dimension behind a filter. A name that no longer resolves behaves as unbound.
fn bound<'d>(dataset: &'d Dataset, filter: &RangeFilter) -> Option<&'d DimensionData> {
    let dimension = dataset.resolve(filter);
    if dimension.is_none() && !filter.is_undefined() {
        warn!("Dimension '{}' not found, treating it as unbound", filter.name);
    }
    dimension
}

fn bin_axis(dataset: &Dataset, filter: &RangeFilter, bins: usize) -> Option<BinnedDimension> {
    bound(dataset, filter).map(|d| bin_dimension(d.data(), bins, d.is_categorical()))
}

/// Serializable description of a dataset
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary<'a> {
    pub name: String,
    pub loaded: bool,
    pub rows: usize,
    pub dimensions: Vec<DimensionSummary<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DimensionSummary<'a> {
    pub identifier: &'a str,
    pub index: usize,
    #[serde(flatten)]
    pub metadata: &'a Metadata,
    /// Decoded categories of a String dimension, in code order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<&'a str>>,
}

pub fn summarize(dataset: &Dataset) -> DatasetSummary<'_> {
    DatasetSummary {
        name: dataset.name(),
        loaded: dataset.is_loaded(),
        rows: dataset.row_count(),
        dimensions: dataset
            .iter()
            .map(|d| DimensionSummary {
                identifier: d.identifier(),
                index: d.index(),
                metadata: d.metadata(),
                labels: d
                    .string_table()
                    .map(|table| table.iter().map(|(_, value)| value).collect()),
            })
            .collect(),
    }
}
