use crate::transform::Reduction;
use serde::Serialize;

// =============================================================================
// Binning
// =============================================================================

/// A column assigned to equal-width bins.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinnedDimension {
    /// Number of bins actually used (the distinct count for categorical columns)
    pub bin_count: usize,
    /// Bin index per row, in `[0, bin_count)`
    pub bins: Vec<usize>,
    /// Bin centre per row: `(2 * bin + 1) / (2 * bin_count)`, never 0 or 1
    pub positions: Vec<f32>,
}

// =============================================================================
// Aggregation
// =============================================================================

/// One occupied `(x, z)` cell of an aggregation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupCell {
    pub x: f32,
    pub z: f32,
    /// Rows that fell into this cell
    pub rows: usize,
    /// First row that introduced this cell
    pub representative: usize,
    /// Reduction result before renormalization
    pub reduced: f32,
    /// Value emitted for every row of the cell
    pub value: f32,
}

/// Result of reducing one column over `(x, z)` cells.
///
/// Only occupied cells are listed, in order of first appearance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedDimension {
    pub reduction: Reduction,
    /// Aggregated value per row
    pub values: Vec<f32>,
    /// True for exactly one row per cell
    pub representative: Vec<bool>,
    pub groups: Vec<GroupCell>,
}

impl AggregatedDimension {
    pub fn cell(&self, x: f32, z: f32) -> Option<&GroupCell> {
        self.groups.iter().find(|g| g.x == x && g.z == z)
    }
}

// =============================================================================
// Bar layout
// =============================================================================

/// Per-row positions for a bar chart, ready for a renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarLayout {
    pub x: Vec<f32>,
    pub y: Vec<f32>,
    pub z: Vec<f32>,
    /// Rows that should be drawn; the others duplicate a representative bar
    pub representative: Vec<bool>,
    /// Half-footprint of a bar along X and Z
    pub width: f32,
    pub depth: f32,
    pub x_bins: usize,
    pub z_bins: usize,
    /// Occupied cells, when Y was aggregated
    pub groups: Vec<GroupCell>,
}

impl BarLayout {
    /// Number of bars actually drawn
    pub fn visible_bars(&self) -> usize {
        self.representative.iter().filter(|r| **r).count()
    }
}
