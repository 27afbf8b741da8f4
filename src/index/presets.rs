use serde::{Deserialize, Serialize};

use super::formula::Formula;
use super::thresholds::Thresholds;

// ---------------------------------------------------------------------------
// ReferenceBands – the two lookup wavelengths
// ---------------------------------------------------------------------------

/// Two target wavelengths (nm) with display labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceBands {
    pub a_nm: f64,
    pub b_nm: f64,
    pub a_label: String,
    pub b_label: String,
}

impl ReferenceBands {
    pub fn new(a_nm: f64, a_label: &str, b_nm: f64, b_label: &str) -> Self {
        Self {
            a_nm,
            b_nm,
            a_label: a_label.to_string(),
            b_label: b_label.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// IndexSpec – everything needed to evaluate one index on one pixel
// ---------------------------------------------------------------------------

/// A fully parameterised two-band index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSpec {
    /// Short name shown in readouts ("NDVI", "NDNI").
    pub name: String,
    pub bands: ReferenceBands,
    pub formula: Formula,
    /// Multiplier applied to both band values before the formula.
    /// NDNI presets use 0.01 to turn percent reflectance into a fraction.
    #[serde(default = "unit_scale")]
    pub input_scale: f64,
    /// Unit suffix of the spectrum values, for readouts.
    #[serde(default = "percent")]
    pub value_unit: String,
    pub thresholds: Thresholds,
}

fn unit_scale() -> f64 {
    1.0
}

fn percent() -> String {
    "%".to_string()
}

fn health_thresholds(bounds: [f64; 3]) -> Thresholds {
    Thresholds::from_pairs(
        [
            (bounds[0], "Very healthy"),
            (bounds[1], "Moderately healthy"),
            (bounds[2], "Possible stress"),
        ],
        "Severe stress",
    )
}

impl IndexSpec {
    /// NDVI from red (670 nm) and NIR (798 nm) reflectance.
    pub fn ndvi() -> Self {
        Self {
            name: "NDVI".to_string(),
            bands: ReferenceBands::new(670.0, "Red", 798.0, "NIR"),
            formula: Formula::RatioDifference,
            input_scale: 1.0,
            value_unit: percent(),
            thresholds: health_thresholds([0.8, 0.4, 0.2]),
        }
    }

    /// NDNI in the reciprocal-log form, `a` = 1510 nm, `b` = 1680 nm.
    pub fn ndni_reciprocal() -> Self {
        Self {
            name: "NDNI".to_string(),
            bands: ReferenceBands::new(1510.0, "R1510", 1680.0, "R1680"),
            formula: Formula::LogReciprocal,
            input_scale: 0.01,
            value_unit: percent(),
            thresholds: health_thresholds([0.18, 0.12, 0.05]),
        }
    }

    /// NDNI in the direct log-ratio form. Same bands as
    /// [`IndexSpec::ndni_reciprocal`], opposite sign.
    pub fn ndni_log_ratio() -> Self {
        Self {
            name: "NDNI (log-ratio)".to_string(),
            formula: Formula::LogRatio,
            ..Self::ndni_reciprocal()
        }
    }
}

// ---------------------------------------------------------------------------
// Named presets
// ---------------------------------------------------------------------------

/// Built-in index presets, selectable from the CLI and the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    Ndvi,
    NdniReciprocal,
    NdniLogRatio,
}

impl Preset {
    pub const ALL: &[Preset] = &[Preset::Ndvi, Preset::NdniReciprocal, Preset::NdniLogRatio];

    pub fn spec(&self) -> IndexSpec {
        match self {
            Preset::Ndvi => IndexSpec::ndvi(),
            Preset::NdniReciprocal => IndexSpec::ndni_reciprocal(),
            Preset::NdniLogRatio => IndexSpec::ndni_log_ratio(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Preset::Ndvi => "NDVI (670/798 nm)",
            Preset::NdniReciprocal => "NDNI, log(1/R) form",
            Preset::NdniLogRatio => "NDNI, log(R) form",
        }
    }
}
