use serde::{Deserialize, Serialize};

use super::model::{Cube, CubeError};
use crate::index::EPSILON;

/// Reflectance of the white reference panel.
pub const DEFAULT_WHITE_REFLECTANCE: f64 = 0.99;

/// Digital numbers that correspond to 100 % in scaled-reflectance products.
pub const DEFAULT_REFLECTANCE_SCALE: f64 = 10_000.0;

// ---------------------------------------------------------------------------
// Reference – a dark or white frame matched to the sample geometry
// ---------------------------------------------------------------------------

/// A dark or white reference resolved against the sample's shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Reference {
    /// Same rows, cols and bands as the sample.
    PerPixel(Cube),
    /// Same cols and bands; averaged over its own rows (`col * bands + band`).
    PerColumn { bands: usize, means: Vec<f64> },
    /// Same bands only; one value per band.
    PerBand(Vec<f64>),
}

impl Reference {
    /// Pick the most specific layout `reference` supports for `sample`.
    pub fn for_sample(reference: Cube, sample: &Cube) -> Result<Self, CubeError> {
        let (rows, cols, bands) = sample.shape();
        let (r_rows, r_cols, r_bands) = reference.shape();
        if r_bands != bands {
            return Err(CubeError::Shape(format!(
                "reference has {r_bands} bands, sample has {bands}"
            )));
        }
        Ok(if r_rows == rows && r_cols == cols {
            Reference::PerPixel(reference)
        } else if r_cols == cols {
            log::info!("reference has {r_rows} lines; using per-column means");
            Reference::PerColumn {
                bands,
                means: reference.column_means(),
            }
        } else {
            log::info!("reference is {r_rows} x {r_cols}; using per-band means");
            Reference::PerBand(reference.band_means())
        })
    }

    fn values(&self, row: usize, col: usize) -> Result<Vec<f64>, CubeError> {
        match self {
            Reference::PerPixel(cube) => cube.spectrum(row, col),
            Reference::PerColumn { bands, means } => {
                let start = col * bands;
                means
                    .get(start..start + bands)
                    .map(<[f64]>::to_vec)
                    .ok_or(CubeError::OutOfBounds {
                        row,
                        col,
                        rows: 1,
                        cols: means.len() / bands,
                    })
            }
            Reference::PerBand(means) => Ok(means.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// Calibration – dark/white normalisation
// ---------------------------------------------------------------------------

/// Dark/white-reference calibration producing percent reflectance.
#[derive(Debug, Clone, PartialEq)]
pub struct Calibration {
    pub dark: Reference,
    pub white: Reference,
    pub white_reflectance: f64,
}

impl Calibration {
    pub fn new(sample: &Cube, dark: Cube, white: Cube, white_reflectance: f64) -> Result<Self, CubeError> {
        Ok(Self {
            dark: Reference::for_sample(dark, sample)?,
            white: Reference::for_sample(white, sample)?,
            white_reflectance,
        })
    }

    /// Percent reflectance of one pixel:
    /// `clip((s - d) / (w - d + ε) * white_reflectance * 100, 0, 100)`.
    pub fn pixel(&self, sample: &Cube, row: usize, col: usize) -> Result<Vec<f64>, CubeError> {
        let s = sample.spectrum(row, col)?;
        let d = self.dark.values(row, col)?;
        let w = self.white.values(row, col)?;
        Ok(s.iter()
            .zip(d.iter().zip(w.iter()))
            .map(|(&s, (&d, &w))| white_dark(s, d, w, self.white_reflectance))
            .collect())
    }
}

fn white_dark(s: f64, d: f64, w: f64, white_reflectance: f64) -> f64 {
    let r = (s - d) / (w - d + EPSILON) * white_reflectance * 100.0;
    if r.is_nan() {
        0.0
    } else {
        r.clamp(0.0, 100.0)
    }
}

// ---------------------------------------------------------------------------
// ReflectanceModel – how a pixel spectrum is derived from raw samples
// ---------------------------------------------------------------------------

/// Serializable choice of reflectance derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReflectanceConfig {
    /// Dark/white reference calibration (SWIR line scanner).
    WhiteDark { white_reflectance: f64 },
    /// Scaled integer reflectance: `v / scale * 100` (VIS-NIR camera).
    Scaled { scale: f64 },
    /// Raw values (thermal frames).
    Raw,
}

/// A reflectance derivation bound to its reference data.
#[derive(Debug, Clone, PartialEq)]
pub enum ReflectanceModel {
    WhiteDark(Calibration),
    Scaled { scale: f64 },
    Raw,
}

impl ReflectanceModel {
    /// Per-pixel values in the model's output unit.
    pub fn pixel(&self, sample: &Cube, row: usize, col: usize) -> Result<Vec<f64>, CubeError> {
        match self {
            ReflectanceModel::WhiteDark(cal) => cal.pixel(sample, row, col),
            ReflectanceModel::Scaled { scale } => Ok(sample
                .spectrum(row, col)?
                .into_iter()
                .map(|v| v / scale * 100.0)
                .collect()),
            ReflectanceModel::Raw => sample.spectrum(row, col),
        }
    }

    /// Unit suffix for readouts.
    pub fn unit(&self) -> &'static str {
        match self {
            ReflectanceModel::WhiteDark(_) | ReflectanceModel::Scaled { .. } => "%",
            ReflectanceModel::Raw => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(rows: usize, cols: usize, bands: usize, v: f32) -> Cube {
        Cube::new(rows, cols, bands, vec![v; rows * cols * bands]).unwrap()
    }

    #[test]
    fn test_white_dark_formula() {
        let sample = filled(2, 2, 3, 60.0);
        let cal = Calibration::new(&sample, filled(2, 2, 3, 10.0), filled(2, 2, 3, 110.0), 0.99)
            .unwrap();
        let r = cal.pixel(&sample, 1, 1).unwrap();
        // (60 - 10) / 100 * 0.99 * 100
        for v in r {
            assert!((v - 49.5).abs() < 1e-3, "got {v}");
        }
    }

    #[test]
    fn test_clipping() {
        let sample = Cube::new(1, 1, 2, vec![0.0, 500.0]).unwrap();
        let cal = Calibration::new(&sample, filled(1, 1, 2, 10.0), filled(1, 1, 2, 110.0), 0.99)
            .unwrap();
        assert_eq!(cal.pixel(&sample, 0, 0).unwrap(), vec![0.0, 100.0]);
    }

    #[test]
    fn test_flat_reference_does_not_blow_up() {
        let sample = filled(1, 1, 1, 20.0);
        let cal =
            Calibration::new(&sample, filled(1, 1, 1, 20.0), filled(1, 1, 1, 20.0), 0.99).unwrap();
        assert_eq!(cal.pixel(&sample, 0, 0).unwrap(), vec![0.0]);
    }

    #[test]
    fn test_reference_layouts() {
        let sample = filled(4, 3, 2, 1.0);
        assert!(matches!(
            Reference::for_sample(filled(4, 3, 2, 0.0), &sample).unwrap(),
            Reference::PerPixel(_)
        ));
        assert!(matches!(
            Reference::for_sample(filled(1, 3, 2, 0.0), &sample).unwrap(),
            Reference::PerColumn { .. }
        ));
        assert!(matches!(
            Reference::for_sample(filled(5, 5, 2, 0.0), &sample).unwrap(),
            Reference::PerBand(_)
        ));
        assert!(Reference::for_sample(filled(4, 3, 5, 0.0), &sample).is_err());
    }

    #[test]
    fn test_single_line_white_panel() {
        let sample = Cube::new(2, 2, 1, vec![55.0, 30.0, 55.0, 30.0]).unwrap();
        let white = Cube::new(1, 2, 1, vec![110.0, 60.0]).unwrap();
        let cal = Calibration::new(&sample, filled(1, 1, 1, 0.0), white, 1.0).unwrap();
        let a = cal.pixel(&sample, 1, 0).unwrap()[0];
        let b = cal.pixel(&sample, 1, 1).unwrap()[0];
        assert!((a - 50.0).abs() < 1e-3);
        assert!((b - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_scaled_reflectance() {
        let sample = Cube::new(1, 1, 2, vec![2500.0, 10_000.0]).unwrap();
        let model = ReflectanceModel::Scaled {
            scale: DEFAULT_REFLECTANCE_SCALE,
        };
        assert_eq!(model.pixel(&sample, 0, 0).unwrap(), vec![25.0, 100.0]);
        assert_eq!(model.unit(), "%");
        assert_eq!(ReflectanceModel::Raw.unit(), "");
    }
}
