//! Water-usage normalization.
//!
//! Parameters are fitted at training time and exported to `scaler.json`:
//!
//! ```json
//! { "kind": "standard", "mean": 118.4, "scale": 41.7 }
//! { "kind": "min_max", "data_min": 10.0, "data_max": 300.0, "feature_range": [0.0, 1.0] }
//! ```

use serde::{Deserialize, Serialize};

/// A fixed affine transform applied to every water-usage value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scaler {
    /// `(x - mean) / scale`.
    Standard { mean: f64, scale: f64 },
    /// Linear map of `[data_min, data_max]` onto `feature_range`.
    MinMax {
        data_min: f64,
        data_max: f64,
        #[serde(default = "default_feature_range")]
        feature_range: (f64, f64),
    },
}

fn default_feature_range() -> (f64, f64) {
    (0.0, 1.0)
}

impl Scaler {
    /// Apply the transform.
    ///
    /// A zero `scale` (or zero data range) is treated as 1, matching how the
    /// fitted scaler handles constant features.
    pub fn transform(&self, x: f64) -> f64 {
        match *self {
            Scaler::Standard { mean, scale } => (x - mean) / non_zero(scale),
            Scaler::MinMax {
                data_min,
                data_max,
                feature_range: (lo, hi),
            } => (x - data_min) / non_zero(data_max - data_min) * (hi - lo) + lo,
        }
    }

    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Scaler::Standard { .. } => "standard",
            Scaler::MinMax { .. } => "min_max",
        }
    }

    /// `true` when every parameter is finite.
    pub fn is_finite(&self) -> bool {
        match *self {
            Scaler::Standard { mean, scale } => mean.is_finite() && scale.is_finite(),
            Scaler::MinMax {
                data_min,
                data_max,
                feature_range: (lo, hi),
            } => [data_min, data_max, lo, hi].iter().all(|v| v.is_finite()),
        }
    }
}

fn non_zero(v: f64) -> f64 {
    if v == 0.0 {
        1.0
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_centres_and_scales() {
        let s = Scaler::Standard {
            mean: 100.0,
            scale: 20.0,
        };
        assert!((s.transform(120.0) - 1.0).abs() < 1e-12);
        assert!((s.transform(100.0)).abs() < 1e-12);
    }

    #[test]
    fn standard_zero_scale_only_centres() {
        let s = Scaler::Standard {
            mean: 5.0,
            scale: 0.0,
        };
        assert_eq!(s.transform(7.0), 2.0);
    }

    #[test]
    fn min_max_maps_range() {
        let s = Scaler::MinMax {
            data_min: 0.0,
            data_max: 200.0,
            feature_range: (-1.0, 1.0),
        };
        assert_eq!(s.transform(0.0), -1.0);
        assert_eq!(s.transform(100.0), 0.0);
        assert_eq!(s.transform(200.0), 1.0);
    }

    #[test]
    fn transform_is_deterministic() {
        let s = Scaler::Standard {
            mean: 118.4,
            scale: 41.7,
        };
        assert_eq!(s.transform(120.0).to_bits(), s.transform(120.0).to_bits());
    }

    #[test]
    fn parses_tagged_json() {
        let s: Scaler = serde_json::from_str(r#"{"kind":"min_max","data_min":1,"data_max":3}"#)
            .expect("parse");
        assert_eq!(
            s,
            Scaler::MinMax {
                data_min: 1.0,
                data_max: 3.0,
                feature_range: (0.0, 1.0)
            }
        );
        assert_eq!(s.kind(), "min_max");
    }

    #[test]
    fn nan_parameters_are_not_finite() {
        let s = Scaler::Standard {
            mean: f64::NAN,
            scale: 1.0,
        };
        assert!(!s.is_finite());
    }
}
