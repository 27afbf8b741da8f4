use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::calibration::{
    ReflectanceConfig, DEFAULT_REFLECTANCE_SCALE, DEFAULT_WHITE_REFLECTANCE,
};
use crate::data::display::{BandBoost, DisplayConfig, Rounding, Stretch};
use crate::index::{IndexSpec, Preset};
use crate::input::ClickPolicy;
use crate::smoothing::SmoothingConfig;

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// Which acquisition the session is set up for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// VIS-NIR camera TIFF, scaled reflectance, NDVI.
    VisNir,
    /// SWIR line scanner ENVI with dark/white references, NDNI.
    Swir,
    /// 8-bit LWIR frame.
    Thermal,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::VisNir => write!(f, "VIS-NIR"),
            Mode::Swir => write!(f, "SWIR"),
            Mode::Thermal => write!(f, "Thermal"),
        }
    }
}

impl Mode {
    pub const ALL: &[Mode] = &[Mode::VisNir, Mode::Swir, Mode::Thermal];

    /// Whether this mode needs dark and white reference cubes.
    pub fn needs_references(&self) -> bool {
        matches!(self, Mode::Swir)
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sources {
    pub sample: Option<PathBuf>,
    pub dark: Option<PathBuf>,
    pub white: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColormapKind {
    Grayscale,
    Inferno,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickConfig {
    pub policy: ClickPolicy,
    pub rounding: Rounding,
}

// ---------------------------------------------------------------------------
// InspectorConfig
// ---------------------------------------------------------------------------

/// Everything a session needs, loadable from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectorConfig {
    pub mode: Mode,
    #[serde(default)]
    pub sources: Sources,
    pub reflectance: ReflectanceConfig,
    /// `None` for modes without a spectral index (thermal).
    pub index: Option<IndexSpec>,
    /// Bands dropped from the front of the cube after loading.
    #[serde(default)]
    pub crop_leading_bands: usize,
    pub display: DisplayConfig,
    pub colormap: ColormapKind,
    pub click: ClickConfig,
    #[serde(default)]
    pub smoothing: SmoothingConfig,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self::for_mode(Mode::VisNir)
    }
}

impl InspectorConfig {
    /// Defaults matching each acquisition setup.
    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::VisNir => Self {
                mode,
                sources: Sources::default(),
                reflectance: ReflectanceConfig::Scaled {
                    scale: DEFAULT_REFLECTANCE_SCALE,
                },
                index: Some(IndexSpec::ndvi()),
                // 350..398 nm is ultraviolet noise on this camera.
                crop_leading_bands: 12,
                display: DisplayConfig {
                    band: 0,
                    target_rows: None,
                    stretch: Stretch::Percentile {
                        low: 1.0,
                        high: 99.0,
                    },
                    boost: Some(BandBoost {
                        first_band: 125,
                        last_band: 140,
                        scale: DEFAULT_REFLECTANCE_SCALE,
                        gain: 1.2,
                        offset: 0.05,
                    }),
                },
                colormap: ColormapKind::Grayscale,
                click: ClickConfig {
                    policy: ClickPolicy::RequireModifier,
                    rounding: Rounding::Round,
                },
                smoothing: SmoothingConfig::default(),
            },
            Mode::Swir => Self {
                mode,
                sources: Sources::default(),
                reflectance: ReflectanceConfig::WhiteDark {
                    white_reflectance: DEFAULT_WHITE_REFLECTANCE,
                },
                index: Some(IndexSpec::ndni_reciprocal()),
                crop_leading_bands: 0,
                display: DisplayConfig {
                    band: 30,
                    target_rows: Some(500),
                    stretch: Stretch::MinMax,
                    boost: None,
                },
                colormap: ColormapKind::Grayscale,
                click: ClickConfig {
                    policy: ClickPolicy::Always,
                    rounding: Rounding::Truncate,
                },
                smoothing: SmoothingConfig {
                    enabled: false,
                    ..SmoothingConfig::default()
                },
            },
            Mode::Thermal => Self {
                mode,
                sources: Sources::default(),
                reflectance: ReflectanceConfig::Raw,
                index: None,
                crop_leading_bands: 0,
                display: DisplayConfig {
                    band: 0,
                    target_rows: None,
                    stretch: Stretch::Identity,
                    boost: None,
                },
                colormap: ColormapKind::Inferno,
                click: ClickConfig {
                    policy: ClickPolicy::Always,
                    rounding: Rounding::Truncate,
                },
                smoothing: SmoothingConfig {
                    enabled: false,
                    ..SmoothingConfig::default()
                },
            },
        }
    }

    /// Replace the index with a built-in preset.
    pub fn with_preset(mut self, preset: Preset) -> Self {
        self.index = Some(preset.spec());
        self
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self).context("serializing config")?;
        std::fs::write(path, text).with_context(|| format!("writing config {}", path.display()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serializing config")
    }
}
