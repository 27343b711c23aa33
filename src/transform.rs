use crate::ir::{AggregatedDimension, BinnedDimension, GroupCell};
use crate::scale::widen_range;
use indexmap::IndexMap;
use log::debug;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

// =============================================================================
// Binning
// =============================================================================

/// Equal-width, half-open intervals over the observed range of a column
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscreteBinner {
    min: f64,
    width: f64,
    bin_count: usize,
}

impl DiscreteBinner {
    /// Partition the range of `data` into `bin_count` intervals.
    ///
    /// A zero bin count is treated as one bin, and a zero-width range is
    /// widened the same way normalization widens constant columns.
    pub fn make_intervals(data: &[f32], bin_count: usize) -> Self {
        let bin_count = bin_count.max(1);
        let (min, max) = data.iter().fold(None, |acc: Option<(f64, f64)>, &v| {
            let v = v as f64;
            Some(match acc {
                Some((lo, hi)) => (lo.min(v), hi.max(v)),
                None => (v, v),
            })
        })
        .unwrap_or((0.0, 0.0));
        let (min, max) = widen_range(min, max);

        Self {
            min,
            width: (max - min) / bin_count as f64,
            bin_count,
        }
    }

    pub fn bin_count(&self) -> usize {
        self.bin_count
    }

    /// Interval containing `value`, clamped to `[0, bin_count - 1]`
    pub fn bin(&self, value: f32) -> usize {
        let idx = ((value as f64 - self.min) / self.width).floor();
        if idx.is_nan() || idx < 0.0 {
            0
        } else {
            (idx as usize).min(self.bin_count - 1)
        }
    }
}

/// Centre of a bin on `[0, 1]`
pub fn bin_position(bin: usize, bin_count: usize) -> f32 {
    ((bin * 2 + 1) as f64 / (bin_count.max(1) * 2) as f64) as f32
}

/// Number of distinct values in a column
pub fn distinct_count(data: &[f32]) -> usize {
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted.dedup();
    sorted.len()
}

/// Bin a normalized column. Categorical columns get one bin per distinct
/// value regardless of `requested_bins`.
pub fn bin_dimension(data: &[f32], requested_bins: usize, categorical: bool) -> BinnedDimension {
    let requested = if categorical {
        distinct_count(data)
    } else {
        requested_bins
    };
    if requested == 0 {
        debug!("Bin count of 0 requested, using a single bin");
    }

    let binner = DiscreteBinner::make_intervals(data, requested);
    let bin_count = binner.bin_count();
    let bins: Vec<usize> = data.iter().map(|&v| binner.bin(v)).collect();
    let positions = bins.iter().map(|&b| bin_position(b, bin_count)).collect();

    BinnedDimension {
        bin_count,
        bins,
        positions,
    }
}

// =============================================================================
// Aggregation
// =============================================================================

/// How the values of one `(x, z)` cell collapse into a scalar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reduction {
    Count,
    Sum,
    Average,
    Median,
    Min,
    Max,
}

impl Reduction {
    /// Count and Sum results are divided by their maximum to land in `[0, 1]`.
    pub fn renormalizes(self) -> bool {
        matches!(self, Reduction::Count | Reduction::Sum)
    }

    fn uses_values(self) -> bool {
        self != Reduction::Count
    }
}

type CellKey = (OrderedFloat<f32>, OrderedFloat<f32>);

struct Cell {
    values: Vec<f32>,
    representative: usize,
}

/// Reduce `y` over the cells formed by the exact `(x[i], z[i])` pairs.
///
/// With `y` absent every row contributes `0`, so only `Count` is meaningful.
/// Rows beyond the shortest input are ignored.
pub fn aggregate(
    x: &[f32],
    z: &[f32],
    y: Option<&[f32]>,
    reduction: Reduction,
) -> AggregatedDimension {
    let rows = y.map_or(x.len().min(z.len()), |y| x.len().min(z.len()).min(y.len()));

    let mut cells: IndexMap<CellKey, Cell> = IndexMap::new();
    let mut row_cell = Vec::with_capacity(rows);
    let mut representative = vec![false; rows];

    for i in 0..rows {
        let key = (OrderedFloat(x[i]), OrderedFloat(z[i]));
        let entry = cells.entry(key);
        let cell_index = entry.index();
        let cell = entry.or_insert_with(|| {
            representative[i] = true;
            Cell {
                values: Vec::new(),
                representative: i,
            }
        });

        let value = match y {
            Some(y) if reduction.uses_values() => y[i],
            _ => 0.0,
        };
        cell.values.push(value);
        row_cell.push(cell_index);
    }

    let reduced: Vec<f32> = cells
        .values_mut()
        .map(|cell| reduce(&mut cell.values, reduction))
        .collect();

    let max = reduced.iter().copied().fold(0.0f32, f32::max);
    let emit = |r: f32| -> f32 {
        if !reduction.renormalizes() {
            r
        } else if max > 0.0 {
            r / max
        } else {
            0.0
        }
    };

    let groups: Vec<GroupCell> = cells
        .iter()
        .zip(reduced.iter())
        .map(|((key, cell), &r)| GroupCell {
            x: key.0.into_inner(),
            z: key.1.into_inner(),
            rows: cell.values.len(),
            representative: cell.representative,
            reduced: r,
            value: emit(r),
        })
        .collect();

    let values = row_cell.iter().map(|&c| groups[c].value).collect();

    AggregatedDimension {
        reduction,
        values,
        representative,
        groups,
    }
}

/// Collapse one cell. `values` is never empty.
fn reduce(values: &mut [f32], reduction: Reduction) -> f32 {
    let n = values.len();
    match reduction {
        Reduction::Count => n as f32,
        Reduction::Sum => values.iter().map(|&v| v as f64).sum::<f64>() as f32,
        Reduction::Average => (values.iter().map(|&v| v as f64).sum::<f64>() / n as f64) as f32,
        Reduction::Median => {
            values.sort_by(|a, b| a.total_cmp(b));
            let mid = (n - 1) as f32 / 2.0;
            let lower = values[mid as usize];
            let upper = values[(mid + 0.5) as usize];
            (lower + upper) / 2.0
        }
        Reduction::Min => values.iter().copied().fold(f32::INFINITY, f32::min),
        Reduction::Max => values.iter().copied().fold(f32::NEG_INFINITY, f32::max),
    }
}
