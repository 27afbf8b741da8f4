/// Band-ratio health indices.
///
/// ```text
///  spectrum + wavelengths
///        │
///        ▼
///   ┌──────────────┐
///   │ nearest_band │  target nm → band index (x2)
///   └──────────────┘
///        │
///        ▼
///   ┌───────────────┐
///   │ compute_index │  Formula (ratio-difference / log-ratio)
///   └───────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ classify │  ordered (bound, label) tiers
///   └──────────┘
///        │
///        ▼
///    IndexResult
/// ```
///
/// Everything in here is pure: no I/O, no logging, no plotting.

pub mod calculator;
pub mod formula;
pub mod presets;
pub mod thresholds;

use thiserror::Error;

pub use calculator::{evaluate, nearest_band, IndexResult};
pub use formula::{compute_index, Formula, IndexValue, EPSILON};
pub use presets::{IndexSpec, Preset, ReferenceBands};
pub use thresholds::{Thresholds, Tier};

/// Errors raised by the index calculator.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum IndexError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, IndexError>;
