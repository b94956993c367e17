//! Indicator features handed over by the feature generator.

use serde::{Deserialize, Serialize};

use crate::clique_tree::ChainLayout;
use crate::error::{CrfError, Result};

/// An indicator feature over one position or one adjacent pair of positions.
///
/// The feature fires when the labels of `scope` equal `assignment`; its
/// weight is `theta[param_index]`. Several features may share a parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Feature {
    /// Variables the feature looks at (one or two)
    pub scope: Vec<usize>,
    /// Labels the scope must take for the feature to fire
    pub assignment: Vec<usize>,
    /// Index into the shared parameter vector
    pub param_index: usize,
}

impl Feature {
    /// Feature firing when `var` takes `label`.
    pub fn node(var: usize, label: usize, param_index: usize) -> Self {
        Self {
            scope: vec![var],
            assignment: vec![label],
            param_index,
        }
    }

    /// Feature firing when `vars.0` takes `labels.0` and `vars.1` takes `labels.1`.
    pub fn edge(vars: (usize, usize), labels: (usize, usize), param_index: usize) -> Self {
        Self {
            scope: vec![vars.0, vars.1],
            assignment: vec![labels.0, labels.1],
            param_index,
        }
    }

    /// Whether this feature looks at a single variable.
    pub fn is_node(&self) -> bool {
        self.scope.len() == 1
    }

    /// Same feature with the scope sorted ascending.
    pub fn normalized(&self) -> Feature {
        let mut pairs: Vec<(usize, usize)> = self
            .scope
            .iter()
            .copied()
            .zip(self.assignment.iter().copied())
            .collect();
        pairs.sort_unstable_by_key(|&(var, _)| var);
        Feature {
            scope: pairs.iter().map(|&(var, _)| var).collect(),
            assignment: pairs.iter().map(|&(_, label)| label).collect(),
            param_index: self.param_index,
        }
    }

    /// Whether the feature fires on a full label sequence.
    pub fn is_active(&self, labels: &[usize]) -> bool {
        self.scope
            .iter()
            .zip(&self.assignment)
            .all(|(&var, &label)| labels.get(var) == Some(&label))
    }
}

/// Features checked against one chain, with pair scopes in ascending order.
#[derive(Clone, Debug)]
pub struct FeatureSet {
    features: Vec<Feature>,
    num_states: usize,
    num_params: usize,
}

impl FeatureSet {
    /// Validate `features` for a chain of `layout.n_var()` variables with
    /// `num_states` labels and a parameter vector of length `num_params`.
    pub fn new(
        features: &[Feature],
        layout: &ChainLayout,
        num_states: usize,
        num_params: usize,
    ) -> Result<Self> {
        let features = features
            .iter()
            .map(|feature| Self::check(feature, layout, num_states, num_params))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            features,
            num_states,
            num_params,
        })
    }

    fn check(
        feature: &Feature,
        layout: &ChainLayout,
        num_states: usize,
        num_params: usize,
    ) -> Result<Feature> {
        let unsupported = |reason: String| CrfError::UnsupportedFeatureScope {
            scope: feature.scope.clone(),
            reason,
        };

        if feature.scope.is_empty() || feature.scope.len() > 2 {
            return Err(unsupported(format!(
                "scope must hold 1 or 2 variables, got {}",
                feature.scope.len()
            )));
        }
        if feature.assignment.len() != feature.scope.len() {
            return Err(CrfError::DimensionMismatch {
                expected: vec![feature.scope.len()],
                got: vec![feature.assignment.len()],
            });
        }
        if let Some(&var) = feature.scope.iter().find(|&&v| v >= layout.n_var()) {
            return Err(unsupported(format!(
                "variable {} outside chain of length {}",
                var,
                layout.n_var()
            )));
        }
        if let Some(&label) = feature.assignment.iter().find(|&&l| l >= num_states) {
            return Err(CrfError::InvalidInput(format!(
                "label {} out of range for {} states",
                label, num_states
            )));
        }
        if feature.param_index >= num_params {
            return Err(CrfError::InvalidInput(format!(
                "param index {} out of range for {} parameters",
                feature.param_index, num_params
            )));
        }

        let normalized = feature.normalized();
        if let [a, b] = normalized.scope[..] {
            if layout.edge_slot(a, b).is_none() {
                return Err(unsupported(format!(
                    "variables {} and {} are not adjacent",
                    a, b
                )));
            }
        }

        Ok(normalized)
    }

    /// Validated features.
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Iterate over the validated features.
    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether there are no features.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Number of labels per variable.
    pub fn num_states(&self) -> usize {
        self.num_states
    }

    /// Length of the parameter vector the features index into.
    pub fn num_params(&self) -> usize {
        self.num_params
    }
}
