//! Tri-state numeric values for averages and percentages.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A statistic that is either a finite number or explicitly undefined.
///
/// Averages and percentages are undefined when their denominator is zero.
/// The undefined state is never represented as `0`, `NaN` or infinity.
/// Serializes as a number or `null`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum Metric {
    /// The denominator was zero.
    #[default]
    Undefined,
    /// A finite value.
    Value(f64),
}

impl Metric {
    /// `numerator / denominator`, undefined when the denominator is zero.
    pub fn ratio(numerator: u64, denominator: u64) -> Self {
        if denominator == 0 {
            Self::Undefined
        } else {
            Self::Value(numerator as f64 / denominator as f64)
        }
    }

    /// `part / whole * 100`, undefined when `whole` is zero.
    pub fn percent(part: u64, whole: u64) -> Self {
        match Self::ratio(part, whole) {
            Self::Value(v) => Self::Value(v * 100.0),
            Self::Undefined => Self::Undefined,
        }
    }

    /// The value, if defined.
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(v),
            Self::Undefined => None,
        }
    }

    /// Check if the metric is undefined.
    pub fn is_undefined(self) -> bool {
        matches!(self, Self::Undefined)
    }
}

impl From<Option<f64>> for Metric {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_finite() => Self::Value(v),
            _ => Self::Undefined,
        }
    }
}

impl From<Metric> for Option<f64> {
    fn from(metric: Metric) -> Self {
        metric.value()
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => match f.precision() {
                Some(p) => write!(f, "{v:.p$}"),
                None => write!(f, "{v}"),
            },
            Self::Undefined => f.write_str("undefined"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio() {
        assert_eq!(Metric::ratio(3, 2), Metric::Value(1.5));
        assert_eq!(Metric::ratio(0, 4), Metric::Value(0.0));
        assert_eq!(Metric::ratio(5, 0), Metric::Undefined);
    }

    #[test]
    fn test_percent() {
        assert_eq!(Metric::percent(1, 4), Metric::Value(25.0));
        assert_eq!(Metric::percent(0, 4), Metric::Value(0.0));
        assert!(Metric::percent(5, 0).is_undefined());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{:.2}", Metric::Value(1.0 / 3.0)), "0.33");
        assert_eq!(format!("{:.2}", Metric::Undefined), "undefined");
    }

    #[test]
    fn test_non_finite_becomes_undefined() {
        assert!(Metric::from(Some(f64::NAN)).is_undefined());
        assert!(Metric::from(Some(f64::INFINITY)).is_undefined());
        assert_eq!(Metric::from(Some(2.0)).value(), Some(2.0));
    }
}
