//! Clique tree construction for linear chains.
//!
//! A chain `X₀ - X₁ - ... - Xₙ₋₁` gets one clique per adjacent pair:
//!
//! ```text
//! C₀{X₀,X₁} ── C₁{X₁,X₂} ── ... ── Cₙ₋₂{Xₙ₋₂,Xₙ₋₁}
//!         sep{X₁}      sep{X₂}
//! ```
//!
//! Clique `i` starts from the edge potential `(i, i+1)` times the node
//! potential of `i+1`; clique 0 additionally takes the node potential of
//! `X₀`, so every node potential enters the tree exactly once.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::config::PotentialSpace;
use crate::error::{CrfError, Result};
use crate::factor::Factor;
use crate::potentials::Potentials;

/// Variables and adjacent pairs of a chain, fixed before any potential exists.
///
/// Pairs are keyed by `(min, max)` so features, potentials and cliques agree
/// on which slot holds a given pair.
#[derive(Clone, Debug)]
pub struct ChainLayout {
    n_var: usize,
    edge_slots: HashMap<(usize, usize), usize>,
}

impl ChainLayout {
    /// Layout of a chain with `n_var` variables.
    pub fn new(n_var: usize) -> Result<Self> {
        if n_var == 0 {
            return Err(CrfError::InvalidInput(
                "chain must have at least one variable".to_string(),
            ));
        }
        let edge_slots = (0..n_var - 1).map(|i| ((i, i + 1), i)).collect();
        Ok(Self { n_var, edge_slots })
    }

    /// Number of variables.
    pub fn n_var(&self) -> usize {
        self.n_var
    }

    /// Number of adjacent pairs.
    pub fn num_edges(&self) -> usize {
        self.edge_slots.len()
    }

    /// Slot of the pair `{a, b}`, if the two variables are adjacent.
    pub fn edge_slot(&self, a: usize, b: usize) -> Option<usize> {
        self.edge_slots.get(&(a.min(b), a.max(b))).copied()
    }

    /// Ascending variable pair stored in `slot`.
    pub fn edge_scope(&self, slot: usize) -> (usize, usize) {
        (slot, slot + 1)
    }
}

/// A clique of the chain tree.
#[derive(Debug, Clone)]
pub struct Clique {
    /// Index of the clique along the chain
    pub id: usize,
    /// Potential (before calibration) or belief (after)
    pub potential: Factor,
}

impl Clique {
    /// Variables in this clique.
    pub fn scope(&self) -> &[usize] {
        self.potential.scope()
    }

    /// Check if this clique contains a variable.
    pub fn contains(&self, var: usize) -> bool {
        self.potential.contains(var)
    }

    /// Get the shared variables with another clique.
    pub fn intersection(&self, other: &Clique) -> Vec<usize> {
        self.scope()
            .iter()
            .copied()
            .filter(|&v| other.contains(v))
            .collect()
    }
}

/// Edge between two neighbouring cliques.
#[derive(Debug, Clone)]
pub struct CliqueEdge {
    /// Clique closer to the start of the chain
    pub left: usize,
    /// Clique closer to the end of the chain
    pub right: usize,
    /// Shared variables
    pub separator: Vec<usize>,
    /// Message sent from `left` to `right`
    pub message_to_right: Option<Factor>,
    /// Message sent from `right` to `left`
    pub message_to_left: Option<Factor>,
}

impl CliqueEdge {
    /// Create an edge without messages.
    pub fn new(left: usize, right: usize, separator: Vec<usize>) -> Self {
        Self {
            left,
            right,
            separator,
            message_to_right: None,
            message_to_left: None,
        }
    }

    /// Message arriving at `clique` over this edge, if one was sent.
    pub fn incoming(&self, clique: usize) -> Option<&Factor> {
        if self.right == clique {
            self.message_to_right.as_ref()
        } else if self.left == clique {
            self.message_to_left.as_ref()
        } else {
            None
        }
    }

    /// The clique on the other side of `clique`, if the edge touches it.
    pub fn other(&self, clique: usize) -> Option<usize> {
        if self.left == clique {
            Some(self.right)
        } else if self.right == clique {
            Some(self.left)
        } else {
            None
        }
    }
}

/// Uncalibrated clique tree over a chain.
#[derive(Debug, Clone)]
pub struct ChainCliqueTree {
    pub(crate) space: PotentialSpace,
    pub(crate) n_var: usize,
    pub(crate) num_states: usize,
    pub(crate) cliques: Vec<Clique>,
    pub(crate) edges: Vec<CliqueEdge>,
    pub(crate) var_to_cliques: Vec<Vec<usize>>,
}

impl ChainCliqueTree {
    /// Assemble the cliques and their path adjacency from potentials.
    pub fn build(layout: &ChainLayout, potentials: &Potentials) -> Result<Self> {
        let space = potentials.space();
        if potentials.num_nodes() != layout.n_var() || potentials.num_edges() != layout.num_edges()
        {
            return Err(CrfError::DimensionMismatch {
                expected: vec![layout.n_var(), layout.num_edges()],
                got: vec![potentials.num_nodes(), potentials.num_edges()],
            });
        }

        let cliques = if layout.num_edges() == 0 {
            // A single variable still forms a (one-variable) clique.
            vec![Clique {
                id: 0,
                potential: potentials.node(0)?.clone(),
            }]
        } else {
            (0..layout.num_edges())
                .map(|slot| -> Result<Clique> {
                    let (_, right) = layout.edge_scope(slot);
                    let mut potential = potentials
                        .edge(slot)?
                        .product_in(potentials.node(right)?, space)?;
                    if slot == 0 {
                        potential = potential.product_in(potentials.node(0)?, space)?;
                    }
                    Ok(Clique {
                        id: slot,
                        potential,
                    })
                })
                .collect::<Result<Vec<_>>>()?
        };

        let edges = cliques
            .windows(2)
            .map(|pair| CliqueEdge::new(pair[0].id, pair[1].id, pair[0].intersection(&pair[1])))
            .collect();

        let mut var_to_cliques = vec![Vec::new(); layout.n_var()];
        for clique in &cliques {
            for &var in clique.scope() {
                var_to_cliques[var].push(clique.id);
            }
        }

        let tree = Self {
            space,
            n_var: layout.n_var(),
            num_states: potentials.num_states(),
            cliques,
            edges,
            var_to_cliques,
        };

        if !tree.is_path() {
            return Err(CrfError::InvalidInput(
                "clique adjacency is not a path".to_string(),
            ));
        }

        log::trace!(
            "built chain clique tree: {} cliques, {} edges",
            tree.cliques.len(),
            tree.edges.len()
        );

        Ok(tree)
    }

    /// Space the clique potentials are expressed in.
    pub fn space(&self) -> PotentialSpace {
        self.space
    }

    /// Number of chain variables.
    pub fn n_var(&self) -> usize {
        self.n_var
    }

    /// Number of labels per variable.
    pub fn num_states(&self) -> usize {
        self.num_states
    }

    /// Cliques in chain order.
    pub fn cliques(&self) -> &[Clique] {
        &self.cliques
    }

    /// Edges in chain order.
    pub fn edges(&self) -> &[CliqueEdge] {
        &self.edges
    }

    /// Number of cliques.
    pub fn num_cliques(&self) -> usize {
        self.cliques.len()
    }

    /// Cliques adjacent to `clique`.
    pub fn neighbors(&self, clique: usize) -> Vec<usize> {
        incident_edges(&self.edges, clique)
            .filter_map(|idx| self.edges[idx].other(clique))
            .collect()
    }

    /// Cliques whose scope contains `var`, in chain order.
    pub fn cliques_containing(&self, var: usize) -> Result<&[usize]> {
        self.var_to_cliques
            .get(var)
            .map(Vec::as_slice)
            .ok_or(CrfError::VariableNotFound(var))
    }

    /// Check that the adjacency is connected and acyclic.
    ///
    /// Edge `i` must join cliques `i` and `i + 1`; message passing relies on
    /// that layout to find a clique's edges without searching.
    pub fn is_path(&self) -> bool {
        let n = self.cliques.len();
        if n == 0 || self.edges.len() + 1 != n {
            return false;
        }
        let ordered = self
            .cliques
            .iter()
            .enumerate()
            .all(|(idx, clique)| clique.id == idx);
        let linked = self
            .edges
            .iter()
            .enumerate()
            .all(|(idx, edge)| edge.left == idx && edge.right == idx + 1);
        if !ordered || !linked {
            return false;
        }

        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(0);
        visited.insert(0);

        while let Some(current) = queue.pop_front() {
            let neighbors = self.neighbors(current);
            if neighbors.len() > 2 {
                return false;
            }
            for next in neighbors {
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        visited.len() == n
    }
}

/// Indices of the edges touching `clique`: edge `clique - 1` on its left and
/// edge `clique` on its right, where they exist.
pub(crate) fn incident_edges(edges: &[CliqueEdge], clique: usize) -> impl Iterator<Item = usize> {
    let left = clique.checked_sub(1).filter(|&idx| idx < edges.len());
    let right = (clique < edges.len()).then_some(clique);
    left.into_iter().chain(right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{Feature, FeatureSet};
    use crate::potentials::LogPotentials;
    use approx::assert_abs_diff_eq;
    use scirs2_core::ndarray::Array1;

    fn tree_for(features: &[Feature], theta: Vec<f64>, n_var: usize, k: usize) -> ChainCliqueTree {
        let layout = ChainLayout::new(n_var).unwrap();
        let theta = Array1::from(theta);
        let set = FeatureSet::new(features, &layout, k, theta.len()).unwrap();
        let potentials = LogPotentials::accumulate(&set, &theta, &layout)
            .unwrap()
            .into_potentials(PotentialSpace::Linear);
        ChainCliqueTree::build(&layout, &potentials).unwrap()
    }

    #[test]
    fn test_layout() {
        let layout = ChainLayout::new(4).unwrap();
        assert_eq!(layout.num_edges(), 3);
        assert_eq!(layout.edge_slot(2, 1), Some(1));
        assert_eq!(layout.edge_slot(0, 2), None);
        assert_eq!(layout.edge_scope(2), (2, 3));
        assert!(ChainLayout::new(0).is_err());
    }

    #[test]
    fn test_chain_structure() {
        let tree = tree_for(&[], vec![], 4, 2);
        assert_eq!(tree.num_cliques(), 3);
        assert_eq!(tree.edges().len(), 2);
        assert!(tree.is_path());

        assert_eq!(tree.cliques()[1].scope(), &[1, 2]);
        assert_eq!(tree.edges()[0].separator, vec![1]);
        assert_eq!(tree.edges()[1].separator, vec![2]);
        assert_eq!(tree.neighbors(1), vec![0, 2]);
        assert_eq!(tree.cliques_containing(0).unwrap(), &[0]);
        assert_eq!(tree.cliques_containing(2).unwrap(), &[1, 2]);
    }

    #[test]
    fn test_incident_edges() {
        let tree = tree_for(&[], vec![], 4, 2);
        let edges = tree.edges();
        assert_eq!(incident_edges(edges, 0).collect::<Vec<_>>(), vec![0]);
        assert_eq!(incident_edges(edges, 1).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(incident_edges(edges, 2).collect::<Vec<_>>(), vec![1]);
        assert_eq!(incident_edges(edges, 7).count(), 0);
        assert!(tree.neighbors(7).is_empty());
    }

    #[test]
    fn test_is_path_requires_chain_order() {
        let mut tree = tree_for(&[], vec![], 4, 2);
        tree.edges.swap(0, 1);
        assert!(!tree.is_path());
    }

    #[test]
    fn test_node_potentials_enter_once() {
        // Weight 1 on x_v = 1 for every variable.
        let features: Vec<Feature> = (0..3).map(|v| Feature::node(v, 1, 0)).collect();
        let tree = tree_for(&features, vec![1.0], 3, 2);

        let e = 1f64.exp();
        let c0 = &tree.cliques()[0].potential;
        let c1 = &tree.cliques()[1].potential;
        // Clique 0 carries x0 and x1, clique 1 only x2.
        assert_abs_diff_eq!(c0.value_at(&[1, 1]).unwrap(), e * e, epsilon = 1e-12);
        assert_abs_diff_eq!(c1.value_at(&[1, 1]).unwrap(), e, epsilon = 1e-12);
        assert_abs_diff_eq!(c1.value_at(&[1, 0]).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_single_variable_chain() {
        let tree = tree_for(&[Feature::node(0, 0, 0)], vec![2.0], 1, 3);
        assert_eq!(tree.num_cliques(), 1);
        assert!(tree.edges().is_empty());
        assert!(tree.is_path());
        assert_eq!(tree.cliques()[0].scope(), &[0]);
    }
}
