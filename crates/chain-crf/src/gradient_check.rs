//! Finite-difference verification of the analytic NLL gradient.
//!
//! The numeric gradient uses central differences,
//! `(f(θ + εeᵢ) − f(θ − εeᵢ)) / 2ε`, one coordinate at a time.

use scirs2_core::ndarray::Array1;

use crate::error::{CrfError, Result};
use crate::feature::Feature;
use crate::objective::CrfObjective;

/// Configuration for gradient checking
#[derive(Clone, Copy, Debug)]
pub struct GradientCheckConfig {
    /// Step used for the central differences
    pub epsilon: f64,
    /// Relative tolerance for gradient comparison
    pub rtol: f64,
    /// Absolute tolerance for gradient comparison
    pub atol: f64,
}

impl Default for GradientCheckConfig {
    fn default() -> Self {
        Self {
            epsilon: 1e-5,
            rtol: 1e-4,
            atol: 1e-4,
        }
    }
}

/// Outcome of comparing an analytic gradient with a numeric one.
#[derive(Clone, Debug)]
pub struct GradientCheckResult {
    /// Largest absolute difference over all coordinates
    pub max_abs_diff: f64,
    /// Largest relative difference over all coordinates
    pub max_rel_diff: f64,
    /// Coordinate with the largest absolute difference
    pub worst_index: Option<usize>,
    /// Whether every coordinate is within tolerance
    pub passed: bool,
    /// Number of coordinates compared
    pub num_elements: usize,
}

/// Central-difference gradient of `f` at `theta`.
pub fn numeric_gradient<F>(f: F, theta: &Array1<f64>, epsilon: f64) -> Result<Array1<f64>>
where
    F: Fn(&Array1<f64>) -> Result<f64>,
{
    if !(epsilon.is_finite() && epsilon > 0.0) {
        return Err(CrfError::InvalidInput(format!(
            "finite-difference step must be positive, got {}",
            epsilon
        )));
    }

    let mut grad = Array1::zeros(theta.len());
    let mut shifted = theta.clone();
    for i in 0..theta.len() {
        shifted[i] = theta[i] + epsilon;
        let plus = f(&shifted)?;
        shifted[i] = theta[i] - epsilon;
        let minus = f(&shifted)?;
        shifted[i] = theta[i];
        grad[i] = (plus - minus) / (2.0 * epsilon);
    }
    Ok(grad)
}

/// Compare analytical and numeric gradients coordinate by coordinate.
///
/// A coordinate passes when it is within `atol` absolutely or `rtol`
/// relatively.
pub fn compare_gradients(
    analytical: &Array1<f64>,
    numeric: &Array1<f64>,
    config: &GradientCheckConfig,
) -> Result<GradientCheckResult> {
    if analytical.len() != numeric.len() {
        return Err(CrfError::DimensionMismatch {
            expected: vec![numeric.len()],
            got: vec![analytical.len()],
        });
    }

    let mut result = GradientCheckResult {
        max_abs_diff: 0.0,
        max_rel_diff: 0.0,
        worst_index: None,
        passed: true,
        num_elements: analytical.len(),
    };

    for (i, (a, n)) in analytical.iter().zip(numeric.iter()).enumerate() {
        let abs_diff = (a - n).abs();
        let rel_diff = if n.abs() > 1e-10 {
            abs_diff / n.abs()
        } else {
            abs_diff
        };

        if result.worst_index.is_none() || abs_diff > result.max_abs_diff {
            result.max_abs_diff = abs_diff;
            result.worst_index = Some(i);
        }
        result.max_rel_diff = result.max_rel_diff.max(rel_diff);

        // NaN fails both comparisons.
        if !(abs_diff <= config.atol || rel_diff <= config.rtol) {
            result.passed = false;
        }
    }

    Ok(result)
}

/// Check the gradient returned by [`CrfObjective::evaluate`] against finite
/// differences of its NLL.
pub fn check_objective_gradient(
    objective: &CrfObjective,
    n_var: usize,
    labels: &[usize],
    theta: &Array1<f64>,
    features: &[Feature],
    config: &GradientCheckConfig,
) -> Result<GradientCheckResult> {
    let analytical = objective.evaluate(n_var, labels, theta, features)?.gradient;
    let numeric = numeric_gradient(
        |t| Ok(objective.evaluate(n_var, labels, t, features)?.nll),
        theta,
        config.epsilon,
    )?;
    let result = compare_gradients(&analytical, &numeric, config)?;

    log::debug!(
        "gradient check over {} params: max abs diff {:.3e}, max rel diff {:.3e}, passed = {}",
        result.num_elements,
        result.max_abs_diff,
        result.max_rel_diff,
        result.passed
    );

    Ok(result)
}
