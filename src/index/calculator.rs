use serde::Serialize;

use super::formula::compute_index;
use super::presets::IndexSpec;
use super::{IndexError, Result};

// ---------------------------------------------------------------------------
// Band lookup
// ---------------------------------------------------------------------------

/// Index of the wavelength closest to `target`.
///
/// Ties resolve to the lowest index. Non-finite table entries are never
/// preferred over finite ones.
pub fn nearest_band(wavelengths: &[f64], target: f64) -> Result<usize> {
    if wavelengths.is_empty() {
        return Err(IndexError::InvalidInput(
            "wavelength table is empty".to_string(),
        ));
    }
    if !target.is_finite() {
        return Err(IndexError::InvalidInput(format!(
            "target wavelength {target} is not finite"
        )));
    }

    let mut best = 0;
    let mut best_diff = f64::INFINITY;
    for (i, &w) in wavelengths.iter().enumerate() {
        let diff = (w - target).abs();
        // Strict `<` keeps the first minimum.
        if diff < best_diff {
            best = i;
            best_diff = diff;
        }
    }
    Ok(best)
}

// ---------------------------------------------------------------------------
// IndexResult
// ---------------------------------------------------------------------------

/// One evaluated index for one pixel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexResult {
    pub index: f64,
    /// Band values as read from the spectrum (before `input_scale`).
    pub band_a_value: f64,
    pub band_b_value: f64,
    pub band_a_index: usize,
    pub band_b_index: usize,
    /// Wavelengths actually used, which may differ from the targets.
    pub band_a_wavelength: f64,
    pub band_b_wavelength: f64,
    pub label: String,
    pub degenerate: bool,
}

/// Resolve both reference bands, compute the index and classify it.
///
/// A degenerate computation is reported with index 0 and the lowest tier.
pub fn evaluate(spectrum: &[f64], wavelengths: &[f64], spec: &IndexSpec) -> Result<IndexResult> {
    if spectrum.is_empty() {
        return Err(IndexError::InvalidInput("spectrum is empty".to_string()));
    }
    if spectrum.len() != wavelengths.len() {
        return Err(IndexError::InvalidInput(format!(
            "spectrum has {} values but wavelength table has {}",
            spectrum.len(),
            wavelengths.len()
        )));
    }

    let ia = nearest_band(wavelengths, spec.bands.a_nm)?;
    let ib = nearest_band(wavelengths, spec.bands.b_nm)?;
    let (va, vb) = (spectrum[ia], spectrum[ib]);

    let value = compute_index(va * spec.input_scale, vb * spec.input_scale, spec.formula);
    let label = if value.degenerate {
        spec.thresholds.default_label().to_string()
    } else {
        spec.thresholds.classify(value.value).to_string()
    };

    Ok(IndexResult {
        index: value.value,
        band_a_value: va,
        band_b_value: vb,
        band_a_index: ia,
        band_b_index: ib,
        band_a_wavelength: wavelengths[ia],
        band_b_wavelength: wavelengths[ib],
        label,
        degenerate: value.degenerate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{Formula, Thresholds};

    fn table() -> Vec<f64> {
        (0..20).map(|i| 600.0 + i as f64 * 20.0).collect()
    }

    #[test]
    fn test_nearest_exact_match() {
        let wl = table();
        for (i, &w) in wl.iter().enumerate() {
            assert_eq!(nearest_band(&wl, w).unwrap(), i);
        }
    }

    #[test]
    fn test_nearest_tie_takes_first() {
        assert_eq!(nearest_band(&[670.0, 672.0], 671.0).unwrap(), 0);
    }

    #[test]
    fn test_nearest_out_of_range() {
        let wl = table();
        assert_eq!(nearest_band(&wl, 100.0).unwrap(), 0);
        assert_eq!(nearest_band(&wl, 5000.0).unwrap(), wl.len() - 1);
    }

    #[test]
    fn test_nearest_skips_nan_entries() {
        assert_eq!(nearest_band(&[f64::NAN, 700.0, 800.0], 690.0).unwrap(), 1);
    }

    #[test]
    fn test_nearest_empty() {
        assert!(matches!(
            nearest_band(&[], 670.0),
            Err(IndexError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_evaluate_ndvi_scenario() {
        let wl = vec![600.0, 650.0, 670.0, 720.0, 798.0, 850.0];
        let sp = vec![10.0, 10.0, 10.0, 10.0, 30.0, 10.0];
        let spec = IndexSpec {
            thresholds: Thresholds::from_pairs(
                [(0.8, "healthy"), (0.4, "moderate"), (0.2, "stressed")],
                "severe",
            ),
            ..IndexSpec::ndvi()
        };
        let r = evaluate(&sp, &wl, &spec).unwrap();
        assert_eq!(r.band_a_index, 2);
        assert_eq!(r.band_b_index, 4);
        assert_eq!(r.band_a_value, 10.0);
        assert_eq!(r.band_b_value, 30.0);
        assert!((r.index - 0.5).abs() < 1e-6, "got {}", r.index);
        assert_eq!(r.label, "moderate");
        assert!(!r.degenerate);
    }

    #[test]
    fn test_evaluate_length_mismatch() {
        let wl = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let sp = vec![0.0; 5];
        let err = evaluate(&sp, &wl, &IndexSpec::ndvi()).unwrap_err();
        assert!(matches!(err, IndexError::InvalidInput(_)));
    }

    #[test]
    fn test_evaluate_empty() {
        assert!(evaluate(&[], &[], &IndexSpec::ndvi()).is_err());
    }

    #[test]
    fn test_evaluate_degenerate_gets_lowest_tier() {
        let wl = vec![670.0, 798.0];
        let r = evaluate(&[0.0, 0.0], &wl, &IndexSpec::ndvi()).unwrap();
        assert_eq!(r.index, 0.0);
        assert!(r.degenerate);
        assert_eq!(r.label, "Severe stress");
    }

    #[test]
    fn test_evaluate_ndni_uses_scale() {
        let wl = vec![1400.0, 1510.0, 1600.0, 1680.0];
        let sp = vec![50.0, 30.0, 45.0, 40.0];
        let r = evaluate(&sp, &wl, &IndexSpec::ndni_reciprocal()).unwrap();
        assert_eq!(r.band_a_value, 30.0);
        assert_eq!(r.band_b_value, 40.0);
        assert!((r.index - 0.135_68).abs() < 1e-4, "got {}", r.index);
        assert_eq!(r.label, "Moderately healthy");

        let flipped = evaluate(&sp, &wl, &IndexSpec::ndni_log_ratio()).unwrap();
        assert!((flipped.index + r.index).abs() < 1e-12);
        assert_eq!(flipped.label, "Severe stress");
    }

    #[test]
    fn test_evaluate_reports_resolved_wavelengths() {
        let wl = vec![666.0, 674.0, 795.0, 803.0];
        let spec = IndexSpec {
            formula: Formula::RatioDifference,
            ..IndexSpec::ndvi()
        };
        let r = evaluate(&[5.0, 6.0, 40.0, 41.0], &wl, &spec).unwrap();
        assert_eq!(r.band_a_wavelength, 666.0);
        assert_eq!(r.band_b_wavelength, 795.0);
    }
}
