//! Folding indicator features into node and edge potentials.
//!
//! Accumulation happens in two phases. [`LogPotentials::accumulate`] folds
//! every feature weight into freshly allocated additive tables, then
//! [`LogPotentials::into_potentials`] produces the potential set used by the
//! clique tree, either exponentiated or left in log space.

use scirs2_core::ndarray::Array1;

use crate::clique_tree::ChainLayout;
use crate::config::PotentialSpace;
use crate::error::{CrfError, Result};
use crate::factor::{assignment_to_index, Factor};
use crate::feature::FeatureSet;

/// Additive log-potentials for every variable and every adjacent pair.
#[derive(Clone, Debug)]
pub struct LogPotentials {
    nodes: Vec<Factor>,
    edges: Vec<Factor>,
    num_states: usize,
}

impl LogPotentials {
    /// Sum the weights of all features into per-node and per-edge tables.
    pub fn accumulate(
        features: &FeatureSet,
        theta: &Array1<f64>,
        layout: &ChainLayout,
    ) -> Result<Self> {
        if theta.len() != features.num_params() {
            return Err(CrfError::DimensionMismatch {
                expected: vec![features.num_params()],
                got: vec![theta.len()],
            });
        }

        let k = features.num_states();
        let empty = (
            vec![Array1::<f64>::zeros(k); layout.n_var()],
            vec![Array1::<f64>::zeros(k * k); layout.num_edges()],
        );

        let (node_tables, edge_tables) =
            features
                .iter()
                .try_fold(empty, |(mut nodes, mut edges), feature| -> Result<_> {
                    let weight = theta[feature.param_index];
                    match feature.scope[..] {
                        [var] => nodes[var][feature.assignment[0]] += weight,
                        [a, b] => {
                            let slot = layout.edge_slot(a, b).ok_or_else(|| {
                                CrfError::UnsupportedFeatureScope {
                                    scope: feature.scope.clone(),
                                    reason: "no edge factor for this pair".to_string(),
                                }
                            })?;
                            edges[slot][assignment_to_index(&feature.assignment, &[k, k])] +=
                                weight;
                        }
                        _ => {
                            return Err(CrfError::UnsupportedFeatureScope {
                                scope: feature.scope.clone(),
                                reason: "scope must hold 1 or 2 variables".to_string(),
                            })
                        }
                    }
                    Ok((nodes, edges))
                })?;

        let nodes = node_tables
            .into_iter()
            .enumerate()
            .map(|(var, table)| Factor::new(vec![var], vec![k], table))
            .collect::<Result<Vec<_>>>()?;
        let edges = edge_tables
            .into_iter()
            .enumerate()
            .map(|(slot, table)| {
                let (a, b) = layout.edge_scope(slot);
                Factor::new(vec![a, b], vec![k, k], table)
            })
            .collect::<Result<Vec<_>>>()?;

        log::trace!(
            "accumulated {} features into {} node and {} edge tables",
            features.len(),
            nodes.len(),
            edges.len()
        );

        Ok(Self {
            nodes,
            edges,
            num_states: k,
        })
    }

    /// Log-potential of variable `var`.
    pub fn node(&self, var: usize) -> Option<&Factor> {
        self.nodes.get(var)
    }

    /// Log-potential of the edge in `slot`.
    pub fn edge(&self, slot: usize) -> Option<&Factor> {
        self.edges.get(slot)
    }

    /// Convert into the potential set for `space`.
    ///
    /// `Linear` exponentiates every entry; large weights can overflow there,
    /// which `Log` avoids.
    pub fn into_potentials(self, space: PotentialSpace) -> Potentials {
        let convert = |factors: Vec<Factor>| -> Vec<Factor> {
            match space {
                PotentialSpace::Linear => factors.iter().map(|f| f.map_values(f64::exp)).collect(),
                PotentialSpace::Log => factors,
            }
        };

        Potentials {
            space,
            num_states: self.num_states,
            nodes: convert(self.nodes),
            edges: convert(self.edges),
        }
    }
}

/// Node and edge potentials ready for clique construction.
#[derive(Clone, Debug)]
pub struct Potentials {
    space: PotentialSpace,
    num_states: usize,
    nodes: Vec<Factor>,
    edges: Vec<Factor>,
}

impl Potentials {
    /// Space the tables are expressed in.
    pub fn space(&self) -> PotentialSpace {
        self.space
    }

    /// Number of labels per variable.
    pub fn num_states(&self) -> usize {
        self.num_states
    }

    /// Potential of variable `var`.
    pub fn node(&self, var: usize) -> Result<&Factor> {
        self.nodes.get(var).ok_or(CrfError::VariableNotFound(var))
    }

    /// Potential of the edge in `slot`.
    pub fn edge(&self, slot: usize) -> Result<&Factor> {
        self.edges.get(slot).ok_or_else(|| {
            CrfError::InvalidInput(format!("no edge potential in slot {}", slot))
        })
    }

    /// Number of node potentials.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edge potentials.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }
}
