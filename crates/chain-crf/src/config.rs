//! Model parameters and inference configuration.

use serde::{Deserialize, Serialize};

use crate::error::{CrfError, Result};

/// Parameters of the CRF model that are shared by every sequence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    /// Number of hidden labels per position (K)
    pub num_hidden_states: usize,
    /// Number of observed symbols; only the feature generator reads this
    pub num_observed_states: usize,
    /// L2 regularization strength
    pub lambda: f64,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            num_hidden_states: 2,
            num_observed_states: 2,
            lambda: 0.0,
        }
    }
}

impl ModelParams {
    /// Create model parameters without regularization.
    pub fn new(num_hidden_states: usize, num_observed_states: usize) -> Self {
        Self {
            num_hidden_states,
            num_observed_states,
            lambda: 0.0,
        }
    }

    /// Set the regularization strength.
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.lambda = lambda;
        self
    }

    /// Check that the parameters describe a usable model.
    pub fn validate(&self) -> Result<()> {
        if self.num_hidden_states == 0 {
            return Err(CrfError::InvalidInput(
                "num_hidden_states must be at least 1".to_string(),
            ));
        }
        if !self.lambda.is_finite() || self.lambda < 0.0 {
            return Err(CrfError::InvalidInput(format!(
                "lambda must be finite and non-negative, got {}",
                self.lambda
            )));
        }
        Ok(())
    }
}

/// Representation used for potentials, clique beliefs and messages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PotentialSpace {
    /// Multiplicative potentials, `exp` of the accumulated weights.
    #[default]
    Linear,
    /// Additive log-potentials combined with log-sum-exp.
    Log,
}

/// Options for a single inference call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Space in which potentials are combined
    pub space: PotentialSpace,
    /// Reject a non-finite logZ, NLL or marginal, or a table that cannot be
    /// normalized. When off these come back as infinities or NaN.
    pub check_finite: bool,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            space: PotentialSpace::Linear,
            check_finite: true,
        }
    }
}

impl InferenceConfig {
    /// Configuration that calibrates in log space.
    pub fn log_space() -> Self {
        Self {
            space: PotentialSpace::Log,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_params_validate() {
        assert!(ModelParams::new(26, 2).validate().is_ok());
        assert!(ModelParams::new(0, 2).validate().is_err());
        assert!(ModelParams::new(2, 2).with_lambda(-1.0).validate().is_err());
        assert!(ModelParams::new(2, 2)
            .with_lambda(f64::NAN)
            .validate()
            .is_err());
    }

    #[test]
    fn test_model_params_serde() {
        let params = ModelParams::new(3, 4).with_lambda(0.5);
        let json = serde_json::to_string(&params).unwrap();
        let back: ModelParams = serde_json::from_str(&json).unwrap();
        assert_eq!(params, back);

        let config: InferenceConfig =
            serde_json::from_str(r#"{"space":"Log","check_finite":false}"#).unwrap();
        assert_eq!(config.space, PotentialSpace::Log);
        assert!(!config.check_finite);
    }
}
