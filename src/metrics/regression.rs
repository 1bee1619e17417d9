//! Ordinary least squares fit used by the slope window.

use thiserror::Error;

/// Result of a straight-line fit `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination, 0-1
    pub r_squared: f64,
}

/// Regression errors.
#[derive(Debug, Error, PartialEq)]
pub enum RegressionError {
    #[error("Need at least 2 points for regression, got {0}")]
    InsufficientData(usize),

    #[error("All x values are equal")]
    Degenerate,
}

/// Linear regression on (x, y) pairs.
///
/// Sums are taken around the means so large distances (tens of kilometers)
/// do not cancel out.
pub fn linear_regression(points: &[(f64, f64)]) -> Result<LinearFit, RegressionError> {
    if points.len() < 2 {
        return Err(RegressionError::InsufficientData(points.len()));
    }
    let n = points.len() as f64;

    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    let s_xx: f64 = points.iter().map(|(x, _)| (x - mean_x).powi(2)).sum();
    let s_xy: f64 = points
        .iter()
        .map(|(x, y)| (x - mean_x) * (y - mean_y))
        .sum();

    if s_xx.abs() < 1e-10 {
        return Err(RegressionError::Degenerate);
    }

    let slope = s_xy / s_xx;
    let intercept = mean_y - slope * mean_x;

    let ss_tot: f64 = points.iter().map(|(_, y)| (y - mean_y).powi(2)).sum();
    let ss_res: f64 = points
        .iter()
        .map(|(x, y)| (y - (slope * x + intercept)).powi(2))
        .sum();

    // A flat line through flat data is a perfect fit
    let r_squared = if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else if ss_res < 1e-12 {
        1.0
    } else {
        0.0
    };

    Ok(LinearFit {
        slope,
        intercept,
        r_squared,
    })
}
