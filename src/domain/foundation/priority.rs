//! Steering priority value object (0.0 - 1.0 scale).

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use super::ValidationError;

/// A real-valued influence weight bounded to `[0.0, 1.0]`.
///
/// Higher means more influence. NaN is never representable, so the type is
/// totally ordered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Priority(f64);

impl Priority {
    /// Lowest priority.
    pub const MIN: Self = Self(0.0);

    /// Highest priority.
    pub const MAX: Self = Self(1.0);

    /// Creates a Priority, clamping to the valid range. NaN maps to zero.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self::MIN;
        }
        Self(value.clamp(0.0, 1.0))
    }

    /// Creates a Priority, returning error if out of range.
    pub fn try_new(value: f64) -> Result<Self, ValidationError> {
        if value.is_nan() {
            return Err(ValidationError::invalid_format("priority", "NaN is not a priority"));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(ValidationError::out_of_range_f64("priority", 0.0, 1.0, value));
        }
        Ok(Self(value))
    }

    /// Returns the value.
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Eq for Priority {}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self(0.5)
    }
}

impl TryFrom<f64> for Priority {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

impl From<Priority> for f64 {
    fn from(priority: Priority) -> Self {
        priority.0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
