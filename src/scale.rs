use crate::types::DataType;
use serde::Serialize;

/// Per-dimension metadata recorded during normalization.
///
/// `min <= max` always holds; for a constant column the range has been
/// widened by one on each side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    pub data_type: DataType,
    pub min: f64,
    pub max: f64,
    /// Distinct values of the column, normalized, ascending
    pub categories: Vec<f32>,
    pub category_count: usize,
    pub bin_count: usize,
}

impl Metadata {
    /// Metadata for a dimension that has a type but no data yet.
    pub fn with_type(data_type: DataType) -> Self {
        Self {
            data_type,
            min: 0.0,
            max: 0.0,
            categories: Vec::new(),
            category_count: 0,
            bin_count: 0,
        }
    }

    /// Raw value at a normalized position.
    ///
    /// A constant column has a single category and a widened range; every
    /// position maps back to its one raw value, the centre of that range.
    pub fn denormalize(&self, normalized: f64) -> f64 {
        if self.category_count == 1 {
            (self.min + self.max) / 2.0
        } else {
            denormalize_value(normalized, self.min, self.max)
        }
    }
}

/// Widen a zero-width range so that it can be divided by.
pub fn widen_range(min: f64, max: f64) -> (f64, f64) {
    if min == max {
        (min - 1.0, max + 1.0)
    } else {
        (min, max)
    }
}

/// Position of `value` between `min` and `max` on `[0, 1]`.
pub fn normalize_value(value: f64, min: f64, max: f64) -> f64 {
    (value - min) / (max - min)
}

/// Inverse of [`normalize_value`].
pub fn denormalize_value(normalized: f64, min: f64, max: f64) -> f64 {
    min + normalized * (max - min)
}

/// Rescale a raw column into `[0, 1]` and record its metadata.
///
/// Every value of a constant column normalizes to `0`.
pub fn normalize_column(data_type: DataType, raw: &[f64]) -> (Vec<f32>, Metadata) {
    let (raw_min, raw_max) = raw
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let (raw_min, raw_max) = if raw.is_empty() { (0.0, 0.0) } else { (raw_min, raw_max) };

    let constant = raw_min == raw_max;
    let (min, max) = widen_range(raw_min, raw_max);

    let normalize = |v: f64| -> f32 {
        if constant {
            0.0
        } else {
            normalize_value(v, min, max) as f32
        }
    };

    let normalized: Vec<f32> = raw.iter().map(|&v| normalize(v)).collect();

    let mut categories = normalized.clone();
    categories.sort_by(|a, b| a.total_cmp(b));
    categories.dedup();

    let metadata = Metadata {
        data_type,
        min,
        max,
        category_count: categories.len(),
        categories,
        bin_count: (max - min).floor() as usize + 1,
    };

    (normalized, metadata)
}

/// The element of `values` closest to `target`. Ties keep the earliest element.
pub fn closest_value(values: &[f32], target: f32) -> Option<f32> {
    let (&first, rest) = values.split_first()?;
    let mut closest = first;
    let mut distance = (first - target).abs();
    for &v in rest {
        let d = (v - target).abs();
        if d < distance {
            distance = d;
            closest = v;
        }
    }
    Some(closest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn test_normalize_column() {
        let (normalized, meta) = normalize_column(DataType::Float, &[10.0, 20.0, 15.0, 20.0]);
        assert_eq!(normalized, vec![0.0, 1.0, 0.5, 1.0]);
        assert_eq!(meta.min, 10.0);
        assert_eq!(meta.max, 20.0);
        assert_eq!(meta.categories, vec![0.0, 0.5, 1.0]);
        assert_eq!(meta.category_count, 3);
        assert_eq!(meta.bin_count, 11);
    }

    #[test]
    fn test_constant_column() {
        let (normalized, meta) = normalize_column(DataType::Integer, &[5.0, 5.0, 5.0]);
        assert_eq!(normalized, vec![0.0, 0.0, 0.0]);
        assert!(normalized.iter().all(|v| v.is_finite()));
        assert_eq!((meta.min, meta.max), (4.0, 6.0));
        assert_eq!(meta.categories, vec![0.0]);
        assert_eq!(meta.bin_count, 3);
    }

    #[test]
    fn test_constant_column_denormalizes_to_its_value() {
        let (_, meta) = normalize_column(DataType::Integer, &[5.0, 5.0]);
        assert_eq!(meta.denormalize(0.0), 5.0);
        assert_eq!(meta.denormalize(0.7), 5.0);

        let (_, meta) = normalize_column(DataType::String, &[0.0]);
        assert_eq!(meta.denormalize(0.0), 0.0);
    }

    #[test]
    fn test_round_trip() {
        let raw = [-3.5, 0.0, 12.25, 7.0, 100.0];
        let (normalized, meta) = normalize_column(DataType::Float, &raw);
        for (n, x) in normalized.iter().zip(raw.iter()) {
            let back = denormalize_value(*n as f64, meta.min, meta.max);
            assert!(approx_eq!(f64, back, *x, epsilon = 1e-4));
        }
    }

    #[test]
    fn test_widen_range() {
        assert_eq!(widen_range(2.0, 2.0), (1.0, 3.0));
        assert_eq!(widen_range(0.0, 4.0), (0.0, 4.0));
    }

    #[test]
    fn test_closest_value_tie_keeps_first() {
        assert_eq!(closest_value(&[0.0, 0.5, 1.0], 0.7), Some(0.5));
        assert_eq!(closest_value(&[0.0, 0.5, 1.0], 0.25), Some(0.0));
        assert_eq!(closest_value(&[], 0.25), None);
    }
}
