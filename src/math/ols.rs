//! Ordinary least squares for a single regressor.
//!
//! Used to regress the actual fund's daily returns on the simulated ones:
//!
//! ```text
//! actual_i = alpha + beta * simulated_i + e_i
//! ```
//!
//! The design matrix `[1, x_i]` is solved with SVD so a near-constant regressor
//! degrades to `None` instead of a panic.

use nalgebra::{DMatrix, DVector};

/// Fitted intercept/slope with goodness of fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub alpha: f64,
    pub beta: f64,
    pub r_squared: f64,
}

/// Fit `y = alpha + beta * x`. Needs at least 3 paired observations.
pub fn fit_line(x: &[f64], y: &[f64]) -> Option<LineFit> {
    let n = x.len();
    if n != y.len() || n < 3 {
        return None;
    }

    let design = DMatrix::from_fn(n, 2, |i, j| if j == 0 { 1.0 } else { x[i] });
    let target = DVector::from_column_slice(y);

    let svd = design.clone().svd(true, true);
    let coef = svd.solve(&target, 1e-12).ok()?;
    if !coef.iter().all(|v| v.is_finite()) {
        return None;
    }
    // A constant regressor leaves the slope unidentified.
    if svd.singular_values.iter().any(|s| *s < 1e-12) {
        return None;
    }

    let fitted = &design * &coef;
    let mean_y = target.mean();
    let ss_res = (&target - fitted).norm_squared();
    let ss_tot = target.iter().map(|v| (v - mean_y).powi(2)).sum::<f64>();
    let r_squared = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 1.0 };

    Some(LineFit {
        alpha: coef[0],
        beta: coef[1],
        r_squared,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_exact_line() {
        // y = 0.001 + 0.9x
        let x = [0.01, -0.02, 0.03, 0.0, 0.015];
        let y: Vec<f64> = x.iter().map(|v| 0.001 + 0.9 * v).collect();
        let fit = fit_line(&x, &y).unwrap();
        assert!((fit.alpha - 0.001).abs() < 1e-10);
        assert!((fit.beta - 0.9).abs() < 1e-10);
        assert!((fit.r_squared - 1.0).abs() < 1e-10);
    }

    #[test]
    fn degenerate_inputs_return_none() {
        assert!(fit_line(&[1.0, 2.0], &[1.0, 2.0]).is_none());
        assert!(fit_line(&[1.0, 2.0, 3.0], &[1.0, 2.0]).is_none());
        assert!(fit_line(&[0.5, 0.5, 0.5], &[1.0, 2.0, 3.0]).is_none());
    }
}
