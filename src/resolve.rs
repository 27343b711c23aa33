use crate::filter::RangeFilter;
use crate::transform::Reduction;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Properties a child visualisation may override instead of inheriting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Property {
    X,
    Y,
    Z,
    XBins,
    ZBins,
    Aggregation,
}

/// Set of properties explicitly set on a spec. Everything else inherits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    set: BTreeSet<Property>,
}

impl Overrides {
    pub fn mark(&mut self, property: Property) {
        self.set.insert(property);
    }

    pub fn is_overridden(&self, property: Property) -> bool {
        self.set.contains(&property)
    }

    pub fn iter(&self) -> impl Iterator<Item = Property> + '_ {
        self.set.iter().copied()
    }
}

/// Y-axis treatment of a bar chart: raw values, or a reduction per cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarAggregation {
    #[default]
    None,
    Count,
    Sum,
    Average,
    Median,
    Min,
    Max,
}

impl BarAggregation {
    pub fn reduction(self) -> Option<Reduction> {
        match self {
            BarAggregation::None => None,
            BarAggregation::Count => Some(Reduction::Count),
            BarAggregation::Sum => Some(Reduction::Sum),
            BarAggregation::Average => Some(Reduction::Average),
            BarAggregation::Median => Some(Reduction::Median),
            BarAggregation::Min => Some(Reduction::Min),
            BarAggregation::Max => Some(Reduction::Max),
        }
    }
}

impl FromStr for BarAggregation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(BarAggregation::None),
            "count" => Ok(BarAggregation::Count),
            "sum" => Ok(BarAggregation::Sum),
            "average" | "mean" => Ok(BarAggregation::Average),
            "median" => Ok(BarAggregation::Median),
            "min" => Ok(BarAggregation::Min),
            "max" => Ok(BarAggregation::Max),
            other => Err(format!("Unknown aggregation '{}'", other)),
        }
    }
}

/// Dimension bindings and binning options of a bar chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarSpec {
    x: RangeFilter,
    y: RangeFilter,
    z: RangeFilter,
    x_bins: usize,
    z_bins: usize,
    aggregation: BarAggregation,
    #[serde(skip)]
    overrides: Overrides,
}

impl Default for BarSpec {
    fn default() -> Self {
        Self {
            x: RangeFilter::undefined(),
            y: RangeFilter::undefined(),
            z: RangeFilter::undefined(),
            x_bins: 1,
            z_bins: 1,
            aggregation: BarAggregation::None,
            overrides: Overrides::default(),
        }
    }
}

impl BarSpec {
    /// Parse a spec from JSON. Filter values are clamped to `[0, 1]`.
    pub fn from_json(json: &str) -> Result<Self> {
        let spec: BarSpec = serde_json::from_str(json).context("Invalid bar specification")?;
        Ok(spec.clamped())
    }

    fn clamped(mut self) -> Self {
        self.x = self.x.clamped();
        self.y = self.y.clamped();
        self.z = self.z.clamped();
        self
    }

    pub fn x(&self) -> &RangeFilter {
        &self.x
    }

    pub fn y(&self) -> &RangeFilter {
        &self.y
    }

    pub fn z(&self) -> &RangeFilter {
        &self.z
    }

    pub fn x_bins(&self) -> usize {
        self.x_bins
    }

    pub fn z_bins(&self) -> usize {
        self.z_bins
    }

    pub fn aggregation(&self) -> BarAggregation {
        self.aggregation
    }

    pub fn overrides(&self) -> &Overrides {
        &self.overrides
    }

    pub fn x_mut(&mut self) -> &mut RangeFilter {
        self.overrides.mark(Property::X);
        &mut self.x
    }

    pub fn y_mut(&mut self) -> &mut RangeFilter {
        self.overrides.mark(Property::Y);
        &mut self.y
    }

    pub fn z_mut(&mut self) -> &mut RangeFilter {
        self.overrides.mark(Property::Z);
        &mut self.z
    }

    pub fn set_x(&mut self, filter: RangeFilter) {
        *self.x_mut() = filter;
    }

    pub fn set_y(&mut self, filter: RangeFilter) {
        *self.y_mut() = filter;
    }

    pub fn set_z(&mut self, filter: RangeFilter) {
        *self.z_mut() = filter;
    }

    pub fn set_x_bins(&mut self, bins: usize) {
        self.overrides.mark(Property::XBins);
        self.x_bins = bins;
    }

    pub fn set_z_bins(&mut self, bins: usize) {
        self.overrides.mark(Property::ZBins);
        self.z_bins = bins;
    }

    pub fn set_aggregation(&mut self, aggregation: BarAggregation) {
        self.overrides.mark(Property::Aggregation);
        self.aggregation = aggregation;
    }

    /// Copy every property this spec has not overridden from `parent`.
    pub fn inherit_from(&mut self, parent: &BarSpec) {
        let own = &self.overrides;
        if !own.is_overridden(Property::X) {
            self.x = parent.x.clone();
        }
        if !own.is_overridden(Property::Y) {
            self.y = parent.y.clone();
        }
        if !own.is_overridden(Property::Z) {
            self.z = parent.z.clone();
        }
        if !own.is_overridden(Property::XBins) {
            self.x_bins = parent.x_bins;
        }
        if !own.is_overridden(Property::ZBins) {
            self.z_bins = parent.z_bins;
        }
        if !own.is_overridden(Property::Aggregation) {
            self.aggregation = parent.aggregation;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_defaults() {
        let spec = BarSpec::from_json(r#"{"x": {"name": "origin"}, "aggregation": "average"}"#).unwrap();
        assert_eq!(spec.x().name, "origin");
        assert!(spec.y().is_undefined());
        assert_eq!(spec.x_bins(), 1);
        assert_eq!(spec.aggregation(), BarAggregation::Average);
        assert_eq!(spec.aggregation().reduction(), Some(Reduction::Average));
    }

    #[test]
    fn test_from_json_clamps_filters() {
        let spec = BarSpec::from_json(r#"{"z": {"name": "year", "max_filter": 4.0}}"#).unwrap();
        assert_eq!(spec.z().max_filter(), 1.0);
    }

    #[test]
    fn test_from_json_rejects_unknown_aggregation() {
        assert!(BarSpec::from_json(r#"{"aggregation": "mode"}"#).is_err());
    }

    #[test]
    fn test_inherit_keeps_overrides() {
        let mut parent = BarSpec::default();
        parent.set_x(RangeFilter::new("origin"));
        parent.set_y(RangeFilter::new("mpg"));
        parent.set_x_bins(4);
        parent.set_aggregation(BarAggregation::Sum);

        let mut child = BarSpec::default();
        child.set_aggregation(BarAggregation::Max);
        child.y_mut().set_max_filter(0.5);
        child.inherit_from(&parent);

        assert_eq!(child.x().name, "origin");
        assert_eq!(child.x_bins(), 4);
        assert_eq!(child.aggregation(), BarAggregation::Max);
        // Y was overridden (even though only a filter changed)
        assert!(child.y().is_undefined());
        assert_eq!(child.y().max_filter(), 0.5);
    }

    #[test]
    fn test_setters_mark_overrides() {
        let mut spec = BarSpec::default();
        assert_eq!(spec.overrides().iter().count(), 0);
        spec.set_z(RangeFilter::new("year"));
        spec.set_x_bins(3);
        assert!(spec.overrides().is_overridden(Property::Z));
        assert!(!spec.overrides().is_overridden(Property::X));
        assert_eq!(
            spec.overrides().iter().collect::<Vec<_>>(),
            vec![Property::Z, Property::XBins]
        );
    }

    #[test]
    fn test_aggregation_from_str() {
        assert_eq!("Median".parse::<BarAggregation>(), Ok(BarAggregation::Median));
        assert_eq!("mean".parse::<BarAggregation>(), Ok(BarAggregation::Average));
        assert!("mode".parse::<BarAggregation>().is_err());
    }
}
