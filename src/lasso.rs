//! Built-in L1-regularized least-squares solver.
//!
//! Cyclic coordinate descent on column-centered data, minimizing
//! `1/(2n) * ||y - Xw - b||^2 + penalty * ||w||_1` per target column. The
//! cascade trainer only depends on the [`RegressionSolver`] contract, so any
//! other solver can be plugged in; this one makes the crate usable without
//! external numeric dependencies.

use log::warn;
use ndarray::{Array1, Array2, ArrayView2};

use crate::error::{Error, Result};
use crate::regression::{RegressionSolver, RegressorStage};

/// Coordinate-descent solver options.
///
/// The iteration order is fixed (cyclic over features, columns fitted in
/// order), so fits are deterministic for fixed inputs and penalty.
#[derive(Debug, Clone, Copy)]
pub struct LassoSolver {
    /// Maximum coordinate-descent sweeps per target column.
    pub max_iterations: usize,
    /// Sweep stops once the largest coefficient update falls below this.
    pub tolerance: f64,
}

impl Default for LassoSolver {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-6,
        }
    }
}

#[inline]
fn soft_threshold(value: f64, threshold: f64) -> f64 {
    if value > threshold {
        value - threshold
    } else if value < -threshold {
        value + threshold
    } else {
        0.0
    }
}

impl RegressionSolver for LassoSolver {
    fn fit(
        &self,
        features: ArrayView2<'_, f64>,
        targets: ArrayView2<'_, f64>,
        penalty: f64,
    ) -> Result<RegressorStage> {
        if !penalty.is_finite() || penalty < 0.0 {
            return Err(Error::Config(format!(
                "penalty must be finite and non-negative, got {}",
                penalty
            )));
        }

        let samples = features.nrows();
        let num_features = features.ncols();
        let num_outputs = targets.ncols();
        if samples == 0 || num_features == 0 || num_outputs == 0 {
            return Err(Error::Solver(format!(
                "degenerate input: {} samples, {} features, {} outputs",
                samples, num_features, num_outputs
            )));
        }
        if targets.nrows() != samples {
            return Err(Error::Solver(format!(
                "feature matrix has {} rows but target matrix has {}",
                samples,
                targets.nrows()
            )));
        }
        if features.iter().any(|v| !v.is_finite()) || targets.iter().any(|v| !v.is_finite()) {
            return Err(Error::Solver("input contains non-finite values".into()));
        }

        // Center columns; the intercept is recovered from the means after the
        // coefficients are fitted, as in the reference Lasso formulation.
        let feature_means = features
            .mean_axis(ndarray::Axis(0))
            .ok_or_else(|| Error::Solver("empty feature matrix".into()))?;
        let target_means = targets
            .mean_axis(ndarray::Axis(0))
            .ok_or_else(|| Error::Solver("empty target matrix".into()))?;
        let centered = &features - &feature_means;
        let column_norms: Vec<f64> = (0..num_features)
            .map(|j| centered.column(j).dot(&centered.column(j)))
            .collect();

        let threshold = penalty * samples as f64;
        let mut coefficients = Array2::<f64>::zeros((num_features, num_outputs));
        let mut intercept = Array1::<f64>::zeros(num_outputs);

        for k in 0..num_outputs {
            let mut weights = Array1::<f64>::zeros(num_features);
            // residual = centered_target - centered_features . weights
            let mut residual = &targets.column(k) - target_means[k];

            let mut converged = false;
            for _ in 0..self.max_iterations {
                let mut max_update = 0.0f64;
                for j in 0..num_features {
                    if column_norms[j] == 0.0 {
                        continue;
                    }
                    let column = centered.column(j);
                    let rho = column.dot(&residual) + column_norms[j] * weights[j];
                    let updated = soft_threshold(rho, threshold) / column_norms[j];
                    let delta = updated - weights[j];
                    if delta != 0.0 {
                        residual.scaled_add(-delta, &column);
                        weights[j] = updated;
                    }
                    max_update = max_update.max(delta.abs());
                }
                if max_update < self.tolerance {
                    converged = true;
                    break;
                }
            }
            if !converged {
                warn!(
                    "coordinate descent did not converge within {} sweeps for output {}",
                    self.max_iterations, k
                );
            }
            if weights.iter().any(|w| !w.is_finite()) {
                return Err(Error::Solver(format!(
                    "coordinate descent diverged on output {}",
                    k
                )));
            }

            intercept[k] = target_means[k] - feature_means.dot(&weights);
            coefficients.column_mut(k).assign(&weights);
        }

        RegressorStage::new(coefficients, intercept)
    }
}
