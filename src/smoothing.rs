//! Curve helpers for the plotted spectrum: Savitzky–Golay smoothing and a
//! natural cubic spline for dense resampling. Index values are always
//! computed from the unsmoothed spectrum.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SmoothingError {
    #[error("window length {0} must be odd and at least 3")]
    Window(usize),

    #[error("polynomial order {order} must be below the window length {window}")]
    Order { order: usize, window: usize },

    #[error("spline needs at least 2 points with strictly increasing x")]
    SplineInput,

    #[error("x and y lengths differ: {0} vs {1}")]
    Length(usize, usize),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmoothingConfig {
    pub enabled: bool,
    pub window: usize,
    pub polyorder: usize,
    /// Number of points on the resampled curve.
    pub spline_points: usize,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window: 9,
            polyorder: 2,
            spline_points: 500,
        }
    }
}

// ---------------------------------------------------------------------------
// Savitzky–Golay
// ---------------------------------------------------------------------------

/// Savitzky–Golay filter. Every output sample is the value at its position
/// of a least-squares polynomial fitted to a full window; near the edges the
/// window is shifted inwards instead of padded.
///
/// Inputs shorter than the window are returned unchanged.
pub fn savitzky_golay(y: &[f64], window: usize, polyorder: usize) -> Result<Vec<f64>, SmoothingError> {
    if window < 3 || window % 2 == 0 {
        return Err(SmoothingError::Window(window));
    }
    if polyorder >= window {
        return Err(SmoothingError::Order {
            order: polyorder,
            window,
        });
    }
    let n = y.len();
    if n < window {
        return Ok(y.to_vec());
    }

    let half = window / 2;
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let start = i.saturating_sub(half).min(n - window);
        let coeffs = fit_polynomial(&y[start..start + window], polyorder, half as f64);
        let t = i as f64 - start as f64 - half as f64;
        out.push(eval_polynomial(&coeffs, t));
    }
    Ok(out)
}

/// Least-squares polynomial through `ys` at x = j - centre.
fn fit_polynomial(ys: &[f64], order: usize, centre: f64) -> Vec<f64> {
    let m = order + 1;
    // Normal equations: (XᵀX) c = Xᵀy
    let mut a = vec![vec![0.0f64; m + 1]; m];
    for (j, &yj) in ys.iter().enumerate() {
        let x = j as f64 - centre;
        let powers: Vec<f64> = (0..2 * m).map(|p| x.powi(p as i32)).collect();
        for r in 0..m {
            for c in 0..m {
                a[r][c] += powers[r + c];
            }
            a[r][m] += powers[r] * yj;
        }
    }
    solve(a)
}

/// Gauss–Jordan elimination with partial pivoting on an augmented matrix.
fn solve(mut a: Vec<Vec<f64>>) -> Vec<f64> {
    let m = a.len();
    for col in 0..m {
        let pivot = (col..m)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        a.swap(col, pivot);
        let p = a[col][col];
        if p.abs() < f64::EPSILON {
            continue;
        }
        for c in col..=m {
            a[col][c] /= p;
        }
        for r in 0..m {
            if r != col {
                let f = a[r][col];
                for c in col..=m {
                    a[r][c] -= f * a[col][c];
                }
            }
        }
    }
    a.into_iter().map(|row| row[m]).collect()
}

fn eval_polynomial(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

// ---------------------------------------------------------------------------
// Natural cubic spline
// ---------------------------------------------------------------------------

/// Interpolating cubic spline with zero second derivative at both ends.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    /// Second derivatives at the knots.
    m: Vec<f64>,
}

impl CubicSpline {
    pub fn natural(x: &[f64], y: &[f64]) -> Result<Self, SmoothingError> {
        if x.len() != y.len() {
            return Err(SmoothingError::Length(x.len(), y.len()));
        }
        let n = x.len();
        if n < 2 || x.windows(2).any(|w| !(w[1] > w[0])) {
            return Err(SmoothingError::SplineInput);
        }

        let mut m = vec![0.0; n];
        if n > 2 {
            // Thomas algorithm on the interior knots.
            let k = n - 2;
            let mut diag = vec![0.0; k];
            let mut upper = vec![0.0; k];
            let mut rhs = vec![0.0; k];
            for i in 0..k {
                let h0 = x[i + 1] - x[i];
                let h1 = x[i + 2] - x[i + 1];
                diag[i] = 2.0 * (h0 + h1);
                upper[i] = h1;
                rhs[i] = 6.0 * ((y[i + 2] - y[i + 1]) / h1 - (y[i + 1] - y[i]) / h0);
            }
            for i in 1..k {
                let lower = x[i + 1] - x[i];
                let w = lower / diag[i - 1];
                diag[i] -= w * upper[i - 1];
                rhs[i] -= w * rhs[i - 1];
            }
            m[k] = rhs[k - 1] / diag[k - 1];
            for i in (0..k - 1).rev() {
                m[i + 1] = (rhs[i] - upper[i] * m[i + 2]) / diag[i];
            }
        }

        Ok(Self {
            x: x.to_vec(),
            y: y.to_vec(),
            m,
        })
    }

    /// Value at `t`; outside the knot range the end segments are extended.
    pub fn eval(&self, t: f64) -> f64 {
        let n = self.x.len();
        let i = match self.x.partition_point(|&xi| xi <= t) {
            0 => 0,
            p if p >= n => n - 2,
            p => p - 1,
        };
        let h = self.x[i + 1] - self.x[i];
        let a = (self.x[i + 1] - t) / h;
        let b = (t - self.x[i]) / h;
        a * self.y[i]
            + b * self.y[i + 1]
            + ((a.powi(3) - a) * self.m[i] + (b.powi(3) - b) * self.m[i + 1]) * h * h / 6.0
    }

    /// `points` evenly spaced samples across the knot range, as `[x, y]`.
    pub fn resample(&self, points: usize) -> Vec<[f64; 2]> {
        let (lo, hi) = (self.x[0], self.x[self.x.len() - 1]);
        if points < 2 {
            return vec![[lo, self.eval(lo)]];
        }
        let step = (hi - lo) / (points - 1) as f64;
        (0..points)
            .map(|i| {
                let t = lo + step * i as f64;
                [t, self.eval(t)]
            })
            .collect()
    }
}

/// Smooth then resample a spectrum for plotting, per `config`.
/// Falls back to the raw points when smoothing is disabled or impossible.
pub fn plot_curve(x: &[f64], y: &[f64], config: &SmoothingConfig) -> Vec<[f64; 2]> {
    let raw = || -> Vec<[f64; 2]> { x.iter().zip(y).map(|(&a, &b)| [a, b]).collect() };
    if !config.enabled {
        return raw();
    }
    let smoothed = match savitzky_golay(y, config.window, config.polyorder) {
        Ok(s) => s,
        Err(e) => {
            log::warn!("smoothing skipped: {e}");
            return raw();
        }
    };
    match CubicSpline::natural(x, &smoothed) {
        Ok(spline) => spline.resample(config.spline_points),
        Err(e) => {
            log::warn!("spline skipped: {e}");
            x.iter().zip(&smoothed).map(|(&a, &b)| [a, b]).collect()
        }
    }
}
