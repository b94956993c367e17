//! Regularized negative log-likelihood of a labelled sequence and its gradient.
//!
//! For a label sequence `y` and parameters `θ`:
//!
//! ```text
//! nll(θ)  = log Z(θ) − Σ_f θ[p(f)] · 1[y ⊨ f] + ½ λ ‖θ‖²
//! ∇nll(θ) = E_θ[counts] − counts(y) + λ θ
//! ```
//!
//! where the expected counts come from the calibrated clique tree.

use scirs2_core::ndarray::{Array1, Array2};

use crate::calibration::{CalibratedTree, CliqueTreeCalibrator, MapAssignment};
use crate::clique_tree::{ChainCliqueTree, ChainLayout};
use crate::config::{InferenceConfig, ModelParams};
use crate::error::{CrfError, Result};
use crate::factor::Factor;
use crate::feature::{Feature, FeatureSet};
use crate::potentials::LogPotentials;

/// Empirical and expected feature counts, one entry per parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct SufficientStatistics {
    /// Expected count of every parameter's features under the model
    pub model_feature_counts: Array1<f64>,
    /// Count of every parameter's features that fire on the labels
    pub sample_feature_counts: Array1<f64>,
    /// Σ θ[p] over features that fire on the labels
    pub weighted_empirical_score: f64,
}

impl SufficientStatistics {
    /// Fold every feature into fresh count vectors.
    pub fn collect(
        features: &FeatureSet,
        labels: &[usize],
        theta: &Array1<f64>,
        tree: &CalibratedTree,
    ) -> Result<Self> {
        let node_marginals = tree.variable_marginals()?;
        let clique_marginals = (0..tree.beliefs().len())
            .map(|idx| tree.clique_marginal(idx))
            .collect::<Result<Vec<Factor>>>()?;

        let num_params = theta.len();
        let empty = Self {
            model_feature_counts: Array1::zeros(num_params),
            sample_feature_counts: Array1::zeros(num_params),
            weighted_empirical_score: 0.0,
        };

        features.iter().try_fold(empty, |mut stats, feature| -> Result<Self> {
            let p = feature.param_index;
            stats.model_feature_counts[p] +=
                expected_count(feature, &node_marginals, &clique_marginals)?;
            if feature.is_active(labels) {
                stats.sample_feature_counts[p] += 1.0;
                stats.weighted_empirical_score += theta[p];
            }
            Ok(stats)
        })
    }
}

/// Probability under the model that `feature` fires.
fn expected_count(
    feature: &Feature,
    node_marginals: &Array2<f64>,
    clique_marginals: &[Factor],
) -> Result<f64> {
    match feature.scope[..] {
        [var] => Ok(node_marginals[[var, feature.assignment[0]]]),
        [a, b] => {
            // Pair (a, a + 1) is stored in clique a.
            let clique = clique_marginals
                .get(a.min(b))
                .filter(|c| c.contains(a) && c.contains(b))
                .ok_or_else(|| CrfError::UnsupportedFeatureScope {
                    scope: feature.scope.clone(),
                    reason: "no clique contains both variables".to_string(),
                })?;
            let others: Vec<usize> = clique
                .scope()
                .iter()
                .copied()
                .filter(|&v| v != a && v != b)
                .collect();
            clique
                .marginalize(&others)?
                .value_for(&feature.scope, &feature.assignment)
        }
        _ => Err(CrfError::UnsupportedFeatureScope {
            scope: feature.scope.clone(),
            reason: "scope must hold 1 or 2 variables".to_string(),
        }),
    }
}

/// Objective and gradient of one sequence.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectiveValue {
    /// Regularized negative log-likelihood
    pub nll: f64,
    /// Gradient of `nll` with respect to theta
    pub gradient: Array1<f64>,
    /// Log partition function
    pub log_z: f64,
    /// Σ θ[p] over features that fire on the labels
    pub weighted_empirical_score: f64,
}

/// Evaluates the CRF objective for single sequences.
#[derive(Clone, Debug, Default)]
pub struct CrfObjective {
    params: ModelParams,
    config: InferenceConfig,
}

impl CrfObjective {
    /// Create an objective with the default inference configuration.
    pub fn new(params: ModelParams) -> Self {
        Self {
            params,
            config: InferenceConfig::default(),
        }
    }

    /// Use a different inference configuration.
    pub fn with_config(mut self, config: InferenceConfig) -> Self {
        self.config = config;
        self
    }

    /// Model parameters.
    pub fn params(&self) -> &ModelParams {
        &self.params
    }

    /// Inference configuration.
    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    fn build_tree(
        &self,
        n_var: usize,
        theta: &Array1<f64>,
        features: &[Feature],
    ) -> Result<(FeatureSet, ChainCliqueTree)> {
        self.params.validate()?;
        let layout = ChainLayout::new(n_var)?;
        let features = FeatureSet::new(
            features,
            &layout,
            self.params.num_hidden_states,
            theta.len(),
        )?;
        let potentials = LogPotentials::accumulate(&features, theta, &layout)?
            .into_potentials(self.config.space);
        let tree = ChainCliqueTree::build(&layout, &potentials)?;
        Ok((features, tree))
    }

    /// Build and calibrate the clique tree of a chain.
    pub fn infer(
        &self,
        n_var: usize,
        theta: &Array1<f64>,
        features: &[Feature],
    ) -> Result<CalibratedTree> {
        let (_, tree) = self.build_tree(n_var, theta, features)?;
        CliqueTreeCalibrator::new(self.config.clone()).calibrate(tree)
    }

    /// Most likely label sequence of a chain.
    pub fn decode(
        &self,
        n_var: usize,
        theta: &Array1<f64>,
        features: &[Feature],
    ) -> Result<MapAssignment> {
        let (_, tree) = self.build_tree(n_var, theta, features)?;
        CliqueTreeCalibrator::new(self.config.clone()).map_assignment(&tree)
    }

    /// Negative log-likelihood of `labels` and its gradient.
    pub fn evaluate(
        &self,
        n_var: usize,
        labels: &[usize],
        theta: &Array1<f64>,
        features: &[Feature],
    ) -> Result<ObjectiveValue> {
        if labels.len() != n_var {
            return Err(CrfError::DimensionMismatch {
                expected: vec![n_var],
                got: vec![labels.len()],
            });
        }
        let k = self.params.num_hidden_states;
        if let Some(&label) = labels.iter().find(|&&l| l >= k) {
            return Err(CrfError::InvalidInput(format!(
                "label {} out of range for {} states",
                label, k
            )));
        }

        let (features, tree) = self.build_tree(n_var, theta, features)?;
        let calibrated = CliqueTreeCalibrator::new(self.config.clone()).calibrate(tree)?;
        let stats = SufficientStatistics::collect(&features, labels, theta, &calibrated)?;

        let lambda = self.params.lambda;
        let log_z = calibrated.log_z();
        let penalty = 0.5 * lambda * theta.dot(theta);
        let nll = log_z - stats.weighted_empirical_score + penalty;
        let gradient =
            &stats.model_feature_counts - &stats.sample_feature_counts + theta * lambda;

        if self.config.check_finite && !nll.is_finite() {
            return Err(CrfError::unstable("negative log-likelihood", nll));
        }

        log::debug!(
            "nll = {:.6} (logZ = {:.6}, score = {:.6}, penalty = {:.6}) over {} features",
            nll,
            log_z,
            stats.weighted_empirical_score,
            penalty,
            features.len()
        );

        Ok(ObjectiveValue {
            nll,
            gradient,
            log_z,
            weighted_empirical_score: stats.weighted_empirical_score,
        })
    }
}

/// Negative log-likelihood and gradient for one observed sequence.
///
/// Only the number of rows of `x` is read: one row per position.
pub fn instance_neg_log_likelihood(
    x: &Array2<f64>,
    y: &[usize],
    theta: &Array1<f64>,
    features: &[Feature],
    params: &ModelParams,
) -> Result<(f64, Array1<f64>)> {
    let value = CrfObjective::new(params.clone()).evaluate(x.nrows(), y, theta, features)?;
    Ok((value.nll, value.gradient))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use scirs2_core::ndarray::array;

    #[test]
    fn test_single_node_feature_scenario() {
        // n_var = 2, K = 2, one feature on x0 = 0 tied to theta[0] = 1.
        let features = [Feature::node(0, 0, 0)];
        let theta = array![1.0, 0.0];
        let objective = CrfObjective::new(ModelParams::new(2, 2));

        let value = objective.evaluate(2, &[0, 1], &theta, &features).unwrap();
        let e = 1f64.exp();
        assert_abs_diff_eq!(value.log_z, (2.0 * e + 2.0).ln(), epsilon = 1e-12);
        assert_abs_diff_eq!(value.weighted_empirical_score, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(value.nll, (2.0 * e + 2.0).ln() - 1.0, epsilon = 1e-12);

        // P(x0 = 0) = e / (e + 1).
        assert_abs_diff_eq!(value.gradient[0], e / (e + 1.0) - 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(value.gradient[1], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_sufficient_statistics_counts_tied_features() {
        let features = [
            Feature::node(0, 1, 0),
            Feature::node(1, 1, 0),
            Feature::edge((0, 1), (1, 1), 1),
        ];
        let theta = array![0.0, 0.0];
        let objective = CrfObjective::new(ModelParams::new(2, 2));
        let calibrated = objective.infer(2, &theta, &features).unwrap();

        let layout = ChainLayout::new(2).unwrap();
        let set = FeatureSet::new(&features, &layout, 2, 2).unwrap();
        let stats = SufficientStatistics::collect(&set, &[1, 1], &theta, &calibrated).unwrap();

        assert_abs_diff_eq!(stats.model_feature_counts[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(stats.model_feature_counts[1], 0.25, epsilon = 1e-12);
        assert_eq!(stats.sample_feature_counts, array![2.0, 1.0]);
        assert_abs_diff_eq!(stats.weighted_empirical_score, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_regularization() {
        let features = [Feature::node(0, 0, 0), Feature::edge((0, 1), (0, 1), 1)];
        let theta = array![0.7, -1.3];
        let labels = [0, 1];

        let plain = CrfObjective::new(ModelParams::new(2, 2))
            .evaluate(2, &labels, &theta, &features)
            .unwrap();
        assert_abs_diff_eq!(
            plain.nll,
            plain.log_z - plain.weighted_empirical_score,
            epsilon = 1e-12
        );

        let lambda = 0.5;
        let regularized = CrfObjective::new(ModelParams::new(2, 2).with_lambda(lambda))
            .evaluate(2, &labels, &theta, &features)
            .unwrap();
        let penalty = 0.5 * lambda * (0.7f64 * 0.7 + 1.3 * 1.3);
        assert_abs_diff_eq!(regularized.nll, plain.nll + penalty, epsilon = 1e-12);
        for i in 0..2 {
            assert_abs_diff_eq!(
                regularized.gradient[i],
                plain.gradient[i] + lambda * theta[i],
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_label_validation() {
        let objective = CrfObjective::new(ModelParams::new(2, 2));
        let theta = array![0.0];
        let features = [Feature::node(0, 0, 0)];

        assert!(matches!(
            objective.evaluate(2, &[0], &theta, &features).unwrap_err(),
            CrfError::DimensionMismatch { .. }
        ));
        assert!(matches!(
            objective.evaluate(2, &[0, 2], &theta, &features).unwrap_err(),
            CrfError::InvalidInput(_)
        ));
    }

    #[test]
    fn test_instance_neg_log_likelihood_reads_rows() {
        let x = Array2::zeros((3, 5));
        let theta = array![0.0];
        let features = [Feature::node(2, 1, 0)];
        let (nll, grad) =
            instance_neg_log_likelihood(&x, &[0, 0, 0], &theta, &features, &ModelParams::new(2, 2))
                .unwrap();

        assert_abs_diff_eq!(nll, 8f64.ln(), epsilon = 1e-12);
        assert_abs_diff_eq!(grad[0], 0.5, epsilon = 1e-12);
    }
}
