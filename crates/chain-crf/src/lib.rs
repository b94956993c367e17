//! Exact inference for linear-chain conditional random fields.
//!
//! This crate computes the regularized negative log-likelihood of a labelled
//! sequence and its gradient with respect to a shared parameter vector.
//! Indicator features over single positions or adjacent pairs are folded into
//! potentials, arranged in a clique tree and calibrated with two-pass
//! sum-product message passing.
//!
//! # Core Concepts
//!
//! - **Factors**: Tables over discrete variables with product and marginalization
//! - **Features**: Indicators tied to entries of `theta`
//! - **Calibration**: Forward and backward message sweeps over the chain
//! - **Objective**: `log Z` minus the empirical score, plus an L2 penalty
//!
//! # Architecture
//!
//! ```text
//! Features + θ → LogPotentials → ChainCliqueTree → CalibratedTree → (nll, ∇nll)
//!                      ↓                                 ↓
//!               Linear | Log space                marginals, log Z
//! ```
//!
//! # Example
//!
//! ```
//! use chain_crf::{instance_neg_log_likelihood, Feature, ModelParams};
//! use scirs2_core::ndarray::{array, Array2};
//!
//! let x = Array2::<f64>::zeros((2, 1));
//! let features = [Feature::node(0, 0, 0)];
//! let theta = array![1.0, 0.0];
//!
//! let (nll, grad) =
//!     instance_neg_log_likelihood(&x, &[0, 1], &theta, &features, &ModelParams::new(2, 2))
//!         .unwrap();
//! let e = 1f64.exp();
//! assert!((nll - ((2.0 * e + 2.0).ln() - 1.0)).abs() < 1e-12);
//! assert_eq!(grad.len(), 2);
//! ```

mod calibration;
mod clique_tree;
mod config;
mod error;
pub mod factor;
mod feature;
pub mod gradient_check;
mod objective;
mod potentials;

pub use calibration::{CalibratedTree, CliqueTreeCalibrator, MapAssignment};
pub use clique_tree::{ChainCliqueTree, ChainLayout, Clique, CliqueEdge};
pub use config::{InferenceConfig, ModelParams, PotentialSpace};
pub use error::{CrfError, Result};
pub use factor::{assignment_to_index, index_to_assignment, logsumexp, Factor};
pub use feature::{Feature, FeatureSet};
pub use gradient_check::{
    check_objective_gradient, compare_gradients, numeric_gradient, GradientCheckConfig,
    GradientCheckResult,
};
pub use objective::{
    instance_neg_log_likelihood, CrfObjective, ObjectiveValue, SufficientStatistics,
};
pub use potentials::{LogPotentials, Potentials};
