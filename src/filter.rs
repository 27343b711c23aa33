use serde::{Deserialize, Serialize};

/// Name used by a filter that is not bound to any dimension.
pub const UNDEFINED: &str = "Undefined";

/// Visible sub-range and rescaling window for one visual dimension.
///
/// All four values live in normalized space and are clamped to `[0, 1]` on
/// every write. `min_filter > max_filter` (or the scale equivalent) is
/// allowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeFilter {
    pub name: String,
    min_filter: f32,
    max_filter: f32,
    min_scale: f32,
    max_scale: f32,
}

impl Default for RangeFilter {
    fn default() -> Self {
        Self::new(UNDEFINED)
    }
}

impl RangeFilter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min_filter: 0.0,
            max_filter: 1.0,
            min_scale: 0.0,
            max_scale: 1.0,
        }
    }

    pub fn undefined() -> Self {
        Self::default()
    }

    pub fn is_undefined(&self) -> bool {
        self.name == UNDEFINED
    }

    pub fn min_filter(&self) -> f32 {
        self.min_filter
    }

    pub fn max_filter(&self) -> f32 {
        self.max_filter
    }

    pub fn min_scale(&self) -> f32 {
        self.min_scale
    }

    pub fn max_scale(&self) -> f32 {
        self.max_scale
    }

    pub fn set_min_filter(&mut self, value: f32) {
        self.min_filter = clamp_unit(value);
    }

    pub fn set_max_filter(&mut self, value: f32) {
        self.max_filter = clamp_unit(value);
    }

    pub fn set_min_scale(&mut self, value: f32) {
        self.min_scale = clamp_unit(value);
    }

    pub fn set_max_scale(&mut self, value: f32) {
        self.max_scale = clamp_unit(value);
    }

    /// Clamp every field, e.g. after deserializing out-of-range values.
    pub fn clamped(mut self) -> Self {
        self.min_filter = clamp_unit(self.min_filter);
        self.max_filter = clamp_unit(self.max_filter);
        self.min_scale = clamp_unit(self.min_scale);
        self.max_scale = clamp_unit(self.max_scale);
        self
    }

    /// Normalized position at fraction `t` of the scale window.
    pub fn scale_at(&self, t: f32) -> f32 {
        self.min_scale + (self.max_scale - self.min_scale) * t
    }

    /// True when `value` lies outside the filter range.
    pub fn is_filtered(&self, value: f32) -> bool {
        value < self.min_filter || value > self.max_filter
    }

    /// Map the scale window onto `[0, 1]`. A zero-width window maps to `0`.
    pub fn rescale(&self, value: f32) -> f32 {
        let width = self.max_scale - self.min_scale;
        if width == 0.0 {
            0.0
        } else {
            (value - self.min_scale) / width
        }
    }
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
