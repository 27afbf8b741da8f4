use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by in-memory cube operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CubeError {
    #[error("pixel ({row}, {col}) outside cube of {rows} x {cols}")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("band {band} outside cube with {bands} bands")]
    BandOutOfRange { band: usize, bands: usize },

    #[error("cube shape mismatch: {0}")]
    Shape(String),
}

// ---------------------------------------------------------------------------
// Cube – rows x cols x bands of radiometric values
// ---------------------------------------------------------------------------

/// A hyperspectral cube stored band-interleaved-by-pixel: the spectrum of
/// one pixel is a contiguous slice.
#[derive(Debug, Clone, PartialEq)]
pub struct Cube {
    rows: usize,
    cols: usize,
    bands: usize,
    data: Vec<f32>,
}

impl Cube {
    /// Wrap BIP-ordered samples. `data.len()` must equal `rows * cols * bands`.
    pub fn new(rows: usize, cols: usize, bands: usize, data: Vec<f32>) -> Result<Self, CubeError> {
        if rows == 0 || cols == 0 || bands == 0 {
            return Err(CubeError::Shape(format!(
                "empty cube {rows} x {cols} x {bands}"
            )));
        }
        let expected = rows.checked_mul(cols).and_then(|n| n.checked_mul(bands));
        if expected != Some(data.len()) {
            return Err(CubeError::Shape(format!(
                "{} samples for a {rows} x {cols} x {bands} cube",
                data.len()
            )));
        }
        Ok(Self {
            rows,
            cols,
            bands,
            data,
        })
    }

    /// Build a cube from per-band row-major planes of identical size.
    pub fn from_bands(rows: usize, cols: usize, planes: &[Vec<f32>]) -> Result<Self, CubeError> {
        let bands = planes.len();
        if let Some(bad) = planes.iter().position(|p| p.len() != rows * cols) {
            return Err(CubeError::Shape(format!(
                "band {bad} has {} samples, expected {}",
                planes[bad].len(),
                rows * cols
            )));
        }
        let mut data = vec![0.0f32; rows * cols * bands];
        for (b, plane) in planes.iter().enumerate() {
            for (px, &v) in plane.iter().enumerate() {
                data[px * bands + b] = v;
            }
        }
        Self::new(rows, cols, bands, data)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn bands(&self) -> usize {
        self.bands
    }

    /// (rows, cols, bands)
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.rows, self.cols, self.bands)
    }

    fn check_pixel(&self, row: usize, col: usize) -> Result<usize, CubeError> {
        if row >= self.rows || col >= self.cols {
            return Err(CubeError::OutOfBounds {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok((row * self.cols + col) * self.bands)
    }

    /// Raw samples of one pixel.
    pub fn pixel(&self, row: usize, col: usize) -> Result<&[f32], CubeError> {
        let start = self.check_pixel(row, col)?;
        Ok(&self.data[start..start + self.bands])
    }

    /// The spectrum of one pixel, widened to `f64`.
    pub fn spectrum(&self, row: usize, col: usize) -> Result<Vec<f64>, CubeError> {
        Ok(self.pixel(row, col)?.iter().map(|&v| v as f64).collect())
    }

    /// One band as a row-major plane.
    pub fn band(&self, band: usize) -> Result<Vec<f32>, CubeError> {
        if band >= self.bands {
            return Err(CubeError::BandOutOfRange {
                band,
                bands: self.bands,
            });
        }
        Ok(self
            .data
            .iter()
            .skip(band)
            .step_by(self.bands)
            .copied()
            .collect())
    }

    /// Drop the first `n` bands of every pixel.
    pub fn crop_leading_bands(&self, n: usize) -> Result<Self, CubeError> {
        if n >= self.bands {
            return Err(CubeError::BandOutOfRange {
                band: n,
                bands: self.bands,
            });
        }
        let data = self
            .data
            .chunks_exact(self.bands)
            .flat_map(|px| px[n..].iter().copied())
            .collect();
        Self::new(self.rows, self.cols, self.bands - n, data)
    }

    /// Per-band mean over all pixels.
    pub fn band_means(&self) -> Vec<f64> {
        let mut sums = vec![0.0f64; self.bands];
        for px in self.data.chunks_exact(self.bands) {
            for (s, &v) in sums.iter_mut().zip(px) {
                *s += v as f64;
            }
        }
        let n = (self.rows * self.cols) as f64;
        sums.into_iter().map(|s| s / n).collect()
    }

    /// Per (column, band) mean over all rows, laid out `col * bands + band`.
    pub fn column_means(&self) -> Vec<f64> {
        let mut sums = vec![0.0f64; self.cols * self.bands];
        for row in 0..self.rows {
            let start = row * self.cols * self.bands;
            let line = &self.data[start..start + self.cols * self.bands];
            for (s, &v) in sums.iter_mut().zip(line) {
                *s += v as f64;
            }
        }
        let n = self.rows as f64;
        sums.into_iter().map(|s| s / n).collect()
    }

    /// All samples in BIP order.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

// ---------------------------------------------------------------------------
// WavelengthTable
// ---------------------------------------------------------------------------

/// Band centre wavelengths in nanometres, aligned with the cube's bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WavelengthTable(Vec<f64>);

impl WavelengthTable {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    /// `0, 1, .., bands-1`, used when the source carries no wavelengths.
    pub fn band_numbers(bands: usize) -> Self {
        Self((0..bands).map(|b| b as f64).collect())
    }

    /// The VIS-NIR camera table: 350 nm to 1002 nm in 4 nm steps.
    pub fn vis_nir() -> Self {
        Self((0..VIS_NIR_BANDS).map(|i| 350.0 + 4.0 * i as f64).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Require finite, strictly increasing values.
    pub fn validate(&self) -> Result<(), CubeError> {
        if let Some(i) = self.0.iter().position(|w| !w.is_finite()) {
            return Err(CubeError::Shape(format!("wavelength {i} is not finite")));
        }
        if let Some(i) = self.0.windows(2).position(|w| w[1] <= w[0]) {
            return Err(CubeError::Shape(format!(
                "wavelengths not increasing at band {}: {} -> {}",
                i + 1,
                self.0[i],
                self.0[i + 1]
            )));
        }
        Ok(())
    }

    pub fn crop_front(&self, n: usize) -> Self {
        Self(self.0.iter().skip(n).copied().collect())
    }

    pub fn range(&self) -> Option<(f64, f64)> {
        Some((*self.0.first()?, *self.0.last()?))
    }
}

/// Number of bands produced by the VIS-NIR camera.
pub const VIS_NIR_BANDS: usize = 164;

// ---------------------------------------------------------------------------
// ImageCube – a loaded cube with provenance
// ---------------------------------------------------------------------------

/// Where a cube came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CubeKind {
    Envi,
    Tiff,
    Thermal,
}

impl fmt::Display for CubeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CubeKind::Envi => write!(f, "ENVI"),
            CubeKind::Tiff => write!(f, "TIFF"),
            CubeKind::Thermal => write!(f, "thermal"),
        }
    }
}

/// A cube plus its wavelength table.
#[derive(Debug, Clone)]
pub struct ImageCube {
    pub cube: Cube,
    pub wavelengths: WavelengthTable,
    pub source: PathBuf,
    pub kind: CubeKind,
}

impl ImageCube {
    pub fn new(cube: Cube, wavelengths: WavelengthTable, source: PathBuf, kind: CubeKind) -> Result<Self, CubeError> {
        if cube.bands() != wavelengths.len() {
            return Err(CubeError::Shape(format!(
                "{} bands but {} wavelengths",
                cube.bands(),
                wavelengths.len()
            )));
        }
        Ok(Self {
            cube,
            wavelengths,
            source,
            kind,
        })
    }

    /// Drop the first `n` bands from both the cube and its wavelengths.
    pub fn crop_leading_bands(self, n: usize) -> Result<Self, CubeError> {
        if n == 0 {
            return Ok(self);
        }
        Ok(Self {
            cube: self.cube.crop_leading_bands(n)?,
            wavelengths: self.wavelengths.crop_front(n),
            ..self
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(rows: usize, cols: usize, bands: usize) -> Cube {
        let data = (0..rows * cols * bands).map(|v| v as f32).collect();
        Cube::new(rows, cols, bands, data).unwrap()
    }

    #[test]
    fn test_spectrum_slice() {
        let c = ramp(2, 3, 4);
        assert_eq!(c.spectrum(1, 2).unwrap(), vec![20.0, 21.0, 22.0, 23.0]);
    }

    #[test]
    fn test_out_of_bounds() {
        let c = ramp(2, 3, 4);
        assert!(matches!(
            c.spectrum(2, 0),
            Err(CubeError::OutOfBounds { row: 2, .. })
        ));
        assert!(c.pixel(0, 3).is_err());
        assert!(c.band(4).is_err());
    }

    #[test]
    fn test_band_plane() {
        let c = ramp(2, 2, 3);
        assert_eq!(c.band(1).unwrap(), vec![1.0, 4.0, 7.0, 10.0]);
    }

    #[test]
    fn test_from_bands_round_trip() {
        let c = ramp(3, 2, 5);
        let planes: Vec<Vec<f32>> = (0..5).map(|b| c.band(b).unwrap()).collect();
        assert_eq!(Cube::from_bands(3, 2, &planes).unwrap(), c);
    }

    #[test]
    fn test_bad_shape() {
        assert!(Cube::new(2, 2, 2, vec![0.0; 7]).is_err());
        assert!(Cube::new(0, 2, 2, vec![]).is_err());
    }

    #[test]
    fn test_crop_leading_bands() {
        let c = ramp(1, 2, 4).crop_leading_bands(1).unwrap();
        assert_eq!(c.bands(), 3);
        assert_eq!(c.spectrum(0, 1).unwrap(), vec![5.0, 6.0, 7.0]);
    }

    #[test]
    fn test_means() {
        let c = ramp(2, 2, 2);
        // band 0: 0, 2, 4, 6
        assert_eq!(c.band_means(), vec![3.0, 4.0]);
        // col 0 band 0: rows 0 and 1 -> 0 and 4
        assert_eq!(c.column_means(), vec![2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_vis_nir_table() {
        let t = WavelengthTable::vis_nir();
        assert_eq!(t.len(), VIS_NIR_BANDS);
        assert_eq!(t.range(), Some((350.0, 1002.0)));
        assert!(t.validate().is_ok());
        assert_eq!(t.crop_front(12).as_slice()[0], 398.0);
    }

    #[test]
    fn test_validate_rejects_unsorted() {
        assert!(WavelengthTable::new(vec![400.0, 400.0]).validate().is_err());
        assert!(WavelengthTable::new(vec![400.0, f64::NAN]).validate().is_err());
    }

    #[test]
    fn test_image_cube_band_count() {
        let c = ramp(1, 1, 3);
        let res = ImageCube::new(c, WavelengthTable::band_numbers(4), PathBuf::new(), CubeKind::Envi);
        assert!(res.is_err());
    }
}
