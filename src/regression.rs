//! The regression solver contract consumed by the cascade trainer, and the
//! fitted stage values a solver returns.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Fitted coefficients and intercept for one cascade stage.
///
/// Immutable once fitted. `coefficients` maps a descriptor of length `D` to
/// `K` outputs; `intercept` has length `K`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressorStage {
    coefficients: Array2<f64>,
    intercept: Array1<f64>,
}

impl RegressorStage {
    /// Bundle solver output, validating that the coefficient matrix and the
    /// intercept agree on the output dimension.
    pub fn new(coefficients: Array2<f64>, intercept: Array1<f64>) -> Result<Self> {
        if coefficients.ncols() != intercept.len() {
            return Err(Error::Solver(format!(
                "coefficient matrix has {} outputs but intercept has {}",
                coefficients.ncols(),
                intercept.len()
            )));
        }
        Ok(Self {
            coefficients,
            intercept,
        })
    }

    /// Descriptor length this stage was fitted against.
    pub fn num_features(&self) -> usize {
        self.coefficients.nrows()
    }

    /// Number of predicted outputs (two per landmark).
    pub fn num_outputs(&self) -> usize {
        self.intercept.len()
    }

    pub fn coefficients(&self) -> &Array2<f64> {
        &self.coefficients
    }

    pub fn intercept(&self) -> &Array1<f64> {
        &self.intercept
    }

    /// Predict the correction for one descriptor: an explicit matrix-vector
    /// multiply plus the intercept, with the shape checked up front.
    pub fn apply(&self, descriptor: ArrayView1<'_, f64>) -> Result<Array1<f64>> {
        if descriptor.len() != self.num_features() {
            return Err(Error::Shape(format!(
                "descriptor of length {} does not match stage fitted on {} features",
                descriptor.len(),
                self.num_features()
            )));
        }
        Ok(descriptor.dot(&self.coefficients) + &self.intercept)
    }
}

/// Contract for the L1-regularized least-squares solver the trainer invokes.
///
/// `features` is `samples x D`, `targets` is `samples x K`, row-aligned.
/// Implementations must fit all `K` outputs against the shared feature
/// matrix (independently or jointly), be deterministic for fixed inputs and
/// penalty, and drive coefficients to exactly zero as the penalty grows.
pub trait RegressionSolver {
    fn fit(
        &self,
        features: ArrayView2<'_, f64>,
        targets: ArrayView2<'_, f64>,
        penalty: f64,
    ) -> Result<RegressorStage>;
}
