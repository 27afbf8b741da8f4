use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use image::{ImageBuffer, Luma};
use serde::{Deserialize, Serialize};

use super::model::Cube;

// ---------------------------------------------------------------------------
// Display configuration
// ---------------------------------------------------------------------------

/// How a band plane is mapped to 0..=255.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Stretch {
    /// Linear between the plane's minimum and maximum.
    MinMax,
    /// Linear between two percentiles, clipped.
    Percentile { low: f64, high: f64 },
    /// Values taken as already being 0..=255.
    Identity,
}

/// Contrast boost for a band range: `clip(v / scale * gain - offset, 0, 1)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandBoost {
    pub first_band: usize,
    pub last_band: usize,
    pub scale: f64,
    pub gain: f64,
    pub offset: f64,
}

impl BandBoost {
    pub fn contains(&self, band: usize) -> bool {
        (self.first_band..=self.last_band).contains(&band)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Band shown on start-up (clamped to the cube).
    pub band: usize,
    /// Resample the image to this many rows (columns unchanged).
    pub target_rows: Option<u32>,
    pub stretch: Stretch,
    pub boost: Option<BandBoost>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            band: 0,
            target_rows: None,
            stretch: Stretch::MinMax,
            boost: None,
        }
    }
}

// ---------------------------------------------------------------------------
// DisplayImage
// ---------------------------------------------------------------------------

/// How fractional click coordinates become pixel indices. Display
/// coordinates are corner-based: pixel `i` covers `[i, i + 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rounding {
    /// Nearest pixel centre (`i + 0.5`).
    Round,
    Truncate,
}

/// An 8-bit single-band rendering of one cube band.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayImage {
    pub width: usize,
    pub height: usize,
    pub band: usize,
    pub values: Vec<u8>,
    source_rows: usize,
    source_cols: usize,
}

impl DisplayImage {
    /// Map display coordinates to a source (row, col). `None` outside.
    pub fn to_source(&self, x: f64, y: f64, rounding: Rounding) -> Option<(usize, usize)> {
        if !(x >= 0.0 && y >= 0.0) || x >= self.width as f64 || y >= self.height as f64 {
            return None;
        }
        let (x, y) = match rounding {
            Rounding::Round => ((x - 0.5).round().max(0.0), (y - 0.5).round().max(0.0)),
            Rounding::Truncate => (x.floor(), y.floor()),
        };
        let x = (x as usize).min(self.width - 1);
        let y = (y as usize).min(self.height - 1);
        let col = (x * self.source_cols) / self.width;
        let row = (y * self.source_rows) / self.height;
        Some((row, col))
    }

    pub fn source_shape(&self) -> (usize, usize) {
        (self.source_rows, self.source_cols)
    }
}

/// Render `band` of `cube` according to `config`.
pub fn render_band(cube: &Cube, band: usize, config: &DisplayConfig) -> Result<DisplayImage> {
    let mut plane = cube.band(band)?;
    let (mut width, mut height) = (cube.cols(), cube.rows());

    if let Some(rows) = config.target_rows.filter(|&r| r as usize != height && r > 0) {
        plane = resize_rows(&plane, width, height, rows)?;
        height = rows as usize;
    }

    let values = match &config.boost {
        Some(boost) if boost.contains(band) => plane
            .iter()
            .map(|&v| {
                let t = (v as f64 / boost.scale * boost.gain - boost.offset).clamp(0.0, 1.0);
                to_u8(t)
            })
            .collect(),
        _ => stretch(&plane, &config.stretch),
    };

    Ok(DisplayImage {
        width,
        height,
        band,
        values,
        source_rows: cube.rows(),
        source_cols: cube.cols(),
    })
}

/// Bilinear resample of a row-major plane to `target_rows` rows.
///
/// The image crate clamps float samples to 0..=1 while filtering, so the
/// plane is normalised around the resize and mapped back afterwards.
pub fn resize_rows(plane: &[f32], width: usize, height: usize, target_rows: u32) -> Result<Vec<f32>> {
    let (lo, hi) = plane
        .iter()
        .filter(|v| v.is_finite())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = if hi > lo { hi - lo } else { 1.0 };
    let lo = if lo.is_finite() { lo } else { 0.0 };

    let normalised: Vec<f32> = plane
        .iter()
        .map(|&v| if v.is_finite() { (v - lo) / range } else { 0.0 })
        .collect();
    let buffer: ImageBuffer<Luma<f32>, Vec<f32>> =
        ImageBuffer::from_raw(width as u32, height as u32, normalised)
            .context("plane size does not match its dimensions")?;
    let resized = imageops::resize(&buffer, width as u32, target_rows, FilterType::Triangle);
    Ok(resized.into_raw().into_iter().map(|v| v * range + lo).collect())
}

fn to_u8(t: f64) -> u8 {
    (t * 255.0) as u8
}

/// Map a plane to 8 bits. Non-finite samples render black.
pub fn stretch(plane: &[f32], policy: &Stretch) -> Vec<u8> {
    let finite: Vec<f64> = plane
        .iter()
        .filter(|v| v.is_finite())
        .map(|&v| v as f64)
        .collect();

    let (lo, hi) = match policy {
        Stretch::Identity => (0.0, 255.0),
        Stretch::MinMax => {
            let lo = finite.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            (lo, hi)
        }
        Stretch::Percentile { low, high } => {
            let mut sorted = finite.clone();
            sorted.sort_by(f64::total_cmp);
            (percentile(&sorted, *low), percentile(&sorted, *high))
        }
    };

    let range = hi - lo;
    plane
        .iter()
        .map(|&v| {
            let v = v as f64;
            if !v.is_finite() || !range.is_finite() || range <= f64::EPSILON {
                0
            } else {
                to_u8(((v - lo) / range).clamp(0.0, 1.0))
            }
        })
        .collect()
}

/// Linear-interpolated percentile of sorted data (`p` in 0..=100).
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let rank = (p.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            let frac = rank - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}
