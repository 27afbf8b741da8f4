use std::fmt;

use serde::{Deserialize, Serialize};

/// Floor applied before logarithms and the guard for near-zero denominators.
pub const EPSILON: f64 = 1e-6;

// ---------------------------------------------------------------------------
// Formula – how two band values become one index
// ---------------------------------------------------------------------------

/// Two-band index formula. `a` is the first reference band, `b` the second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formula {
    /// `(b - a) / (a + b + ε)`, NDVI-style with a = red, b = NIR.
    RatioDifference,
    /// `(ln b - ln a) / (ln b + ln a)`.
    LogRatio,
    /// `(ln(1/a) - ln(1/b)) / (ln(1/a) + ln(1/b))`, the NDNI form of
    /// Serrano et al. (2002) with a = R1510, b = R1680.
    LogReciprocal,
}

impl Formula {
    pub const ALL: &[Formula] = &[
        Formula::RatioDifference,
        Formula::LogRatio,
        Formula::LogReciprocal,
    ];

    /// Short human-readable expression, for readouts.
    pub fn expression(&self) -> &'static str {
        match self {
            Formula::RatioDifference => "(b - a) / (a + b)",
            Formula::LogRatio => "(ln b - ln a) / (ln b + ln a)",
            Formula::LogReciprocal => "(ln 1/a - ln 1/b) / (ln 1/a + ln 1/b)",
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Formula::RatioDifference => "ratio-difference",
            Formula::LogRatio => "log-ratio",
            Formula::LogReciprocal => "log-reciprocal",
        };
        write!(f, "{name}")
    }
}

/// Outcome of a single formula evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexValue {
    pub value: f64,
    /// Set when the denominator collapsed (or an input was not finite) and
    /// `value` was forced to 0.
    pub degenerate: bool,
}

impl IndexValue {
    fn ok(value: f64) -> Self {
        Self {
            value,
            degenerate: false,
        }
    }

    fn degenerate() -> Self {
        Self {
            value: 0.0,
            degenerate: true,
        }
    }
}

/// Evaluate `formula` on two band values already expressed in the caller's
/// unit. Never returns NaN or infinity.
pub fn compute_index(a: f64, b: f64, formula: Formula) -> IndexValue {
    if !a.is_finite() || !b.is_finite() {
        return IndexValue::degenerate();
    }

    let (numerator, denominator) = match formula {
        Formula::RatioDifference => {
            let sum = a + b;
            if sum.abs() <= EPSILON {
                return IndexValue::degenerate();
            }
            (b - a, sum + EPSILON)
        }
        Formula::LogRatio => {
            let (la, lb) = (a.max(EPSILON).ln(), b.max(EPSILON).ln());
            (lb - la, lb + la)
        }
        Formula::LogReciprocal => {
            let ra = (1.0 / a.max(EPSILON)).ln();
            let rb = (1.0 / b.max(EPSILON)).ln();
            (ra - rb, ra + rb)
        }
    };

    if denominator.abs() <= EPSILON {
        return IndexValue::degenerate();
    }
    let value = numerator / denominator;
    if value.is_finite() {
        IndexValue::ok(value)
    } else {
        IndexValue::degenerate()
    }
}
