//! A loaded scene and per-click pixel inspection.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Serialize;

use crate::config::InspectorConfig;
use crate::data::calibration::{Calibration, ReflectanceConfig, ReflectanceModel};
use crate::data::display::{render_band, DisplayImage};
use crate::data::loader::load_file;
use crate::data::model::ImageCube;
use crate::index::{evaluate, IndexResult, IndexSpec};
use crate::smoothing::plot_curve;

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

/// The sample cube together with the reflectance model bound to it.
#[derive(Debug, Clone)]
pub struct Scene {
    pub sample: ImageCube,
    pub reflectance: ReflectanceModel,
}

impl Scene {
    pub fn new(sample: ImageCube, reflectance: ReflectanceModel) -> Self {
        Self {
            sample,
            reflectance,
        }
    }

    /// Load the sample (and references, if the reflectance model needs them)
    /// named in `config.sources`.
    pub fn load(config: &InspectorConfig) -> Result<Self> {
        let sample_path = config
            .sources
            .sample
            .as_deref()
            .context("no sample image selected")?;
        let sample = load_cropped(sample_path, config.crop_leading_bands)?;

        let reflectance = match &config.reflectance {
            ReflectanceConfig::WhiteDark { white_reflectance } => {
                let (Some(dark_path), Some(white_path)) =
                    (config.sources.dark.as_deref(), config.sources.white.as_deref())
                else {
                    bail!("dark and white reference cubes are required for calibration");
                };
                let dark = load_cropped(dark_path, config.crop_leading_bands)?;
                let white = load_cropped(white_path, config.crop_leading_bands)?;
                let cal = Calibration::new(&sample.cube, dark.cube, white.cube, *white_reflectance)
                    .context("matching references to the sample")?;
                ReflectanceModel::WhiteDark(cal)
            }
            ReflectanceConfig::Scaled { scale } => ReflectanceModel::Scaled { scale: *scale },
            ReflectanceConfig::Raw => ReflectanceModel::Raw,
        };

        if let Err(e) = sample.wavelengths.validate() {
            log::warn!("{}: {e}", sample.source.display());
        }
        Ok(Self::new(sample, reflectance))
    }

    /// Render one band for display.
    pub fn render(&self, band: usize, config: &InspectorConfig) -> Result<DisplayImage> {
        let band = band.min(self.sample.cube.bands() - 1);
        render_band(&self.sample.cube, band, &config.display)
    }

    /// Reflectance spectrum at (row, col) plus the optional index readout.
    pub fn inspect(&self, row: usize, col: usize, config: &InspectorConfig) -> Result<PixelReport> {
        let values = self
            .reflectance
            .pixel(&self.sample.cube, row, col)
            .with_context(|| format!("reading pixel (row {row}, col {col})"))?;
        let wavelengths = self.sample.wavelengths.as_slice().to_vec();

        let index = match &config.index {
            Some(spec) => {
                let result = evaluate(&values, &wavelengths, spec)?;
                Some(IndexReadout::new(spec, result))
            }
            None => None,
        };

        let curve = plot_curve(&wavelengths, &values, &config.smoothing);
        Ok(PixelReport {
            row,
            col,
            unit: self.reflectance.unit().to_string(),
            wavelengths,
            values,
            curve,
            index,
        })
    }
}

fn load_cropped(path: &Path, crop: usize) -> Result<ImageCube> {
    let cube = load_file(path)?;
    if crop == 0 || cube.cube.bands() <= crop {
        return Ok(cube);
    }
    Ok(cube.crop_leading_bands(crop)?)
}

// ---------------------------------------------------------------------------
// PixelReport
// ---------------------------------------------------------------------------

/// Index result with the labels needed to present it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexReadout {
    pub name: String,
    pub a_label: String,
    pub b_label: String,
    pub a_target_nm: f64,
    pub b_target_nm: f64,
    pub result: IndexResult,
}

impl IndexReadout {
    pub fn new(spec: &IndexSpec, result: IndexResult) -> Self {
        Self {
            name: spec.name.clone(),
            a_label: spec.bands.a_label.clone(),
            b_label: spec.bands.b_label.clone(),
            a_target_nm: spec.bands.a_nm,
            b_target_nm: spec.bands.b_nm,
            result,
        }
    }
}

/// Everything shown for one inspected pixel. Discarded after display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PixelReport {
    pub row: usize,
    pub col: usize,
    pub unit: String,
    pub wavelengths: Vec<f64>,
    pub values: Vec<f64>,
    /// Plot-ready curve (smoothed and resampled when enabled).
    pub curve: Vec<[f64; 2]>,
    pub index: Option<IndexReadout>,
}
