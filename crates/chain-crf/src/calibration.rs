//! Sum-product calibration of the chain clique tree.
//!
//! Calibration runs the two-phase schedule of the junction tree algorithm,
//! rooted at the last clique of the chain:
//!
//! ```text
//! collect    C₀ → C₁ → ... → Cₘ₋₁      (forward sweep)
//! distribute C₀ ← C₁ ← ... ← Cₘ₋₁      (backward sweep)
//! ```
//!
//! A message sums the sending clique's potential, times every message it
//! received from its other neighbours, down to the separator. Afterwards each
//! belief is its potential times all incoming messages; all beliefs then carry
//! the same total mass `Z` and agree on their shared marginals.
//!
//! The forward sweep alone makes only the root belief exact. Beliefs of
//! earlier cliques miss the potentials to their right until the backward
//! sweep has run, so both sweeps are always performed.

use scirs2_core::ndarray::{Array1, Array2};
use std::collections::HashSet;

use crate::clique_tree::{incident_edges, ChainCliqueTree, Clique, CliqueEdge};
use crate::config::{InferenceConfig, PotentialSpace};
use crate::error::{CrfError, Result};
use crate::factor::Factor;

/// Most likely label sequence under the chain.
#[derive(Clone, Debug, PartialEq)]
pub struct MapAssignment {
    /// Best label of every variable
    pub labels: Vec<usize>,
    /// Unnormalized log score of `labels`
    pub log_score: f64,
}

/// Calibrates chain clique trees.
#[derive(Clone, Debug, Default)]
pub struct CliqueTreeCalibrator {
    config: InferenceConfig,
}

impl CliqueTreeCalibrator {
    /// Create a calibrator with the given configuration.
    pub fn new(config: InferenceConfig) -> Self {
        Self { config }
    }

    /// Calibrate the tree by passing messages in both directions.
    pub fn calibrate(&self, tree: ChainCliqueTree) -> Result<CalibratedTree> {
        let root = tree.num_cliques().saturating_sub(1);
        let (collect, distribute) = schedule(&tree, root)?;

        let ChainCliqueTree {
            space,
            n_var,
            num_states,
            cliques,
            mut edges,
            var_to_cliques,
        } = tree;

        for (from, to) in collect.into_iter().chain(distribute) {
            let edge_idx = find_edge(&edges, from, to)?;
            let message = compute_message(&cliques, &edges, space, from, edge_idx)?;
            log::trace!("message {} -> {}: {:?}", from, to, message.values());

            let edge = &mut edges[edge_idx];
            if edge.left == from {
                edge.message_to_right = Some(message);
            } else {
                edge.message_to_left = Some(message);
            }
        }

        let beliefs = cliques
            .iter()
            .map(|clique| -> Result<Clique> {
                let mut belief = clique.potential.clone();
                for idx in incident_edges(&edges, clique.id) {
                    if let Some(message) = edges[idx].incoming(clique.id) {
                        belief = belief.product_in(message, space)?;
                    }
                }
                Ok(Clique {
                    id: clique.id,
                    potential: belief,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let log_z = beliefs[root].potential.log_total_in(space);
        if self.config.check_finite && !log_z.is_finite() {
            return Err(CrfError::unstable("logZ", log_z));
        }
        log::debug!(
            "calibrated chain of {} variables ({} cliques): logZ = {:.6}",
            n_var,
            beliefs.len(),
            log_z
        );

        Ok(CalibratedTree {
            space,
            n_var,
            num_states,
            check_finite: self.config.check_finite,
            cliques: beliefs,
            edges,
            var_to_cliques,
            log_z,
        })
    }

    /// Find the most likely joint assignment by max-product message passing.
    ///
    /// Runs a forward max-sum sweep in log space and reads the assignment
    /// back from the last clique.
    pub fn map_assignment(&self, tree: &ChainCliqueTree) -> Result<MapAssignment> {
        let space = tree.space();
        let cliques = tree.cliques();

        let mut scores: Vec<Factor> = Vec::with_capacity(cliques.len());
        for (i, clique) in cliques.iter().enumerate() {
            let local = clique.potential.to_log_in(space);
            let score = match scores.last() {
                None => local,
                Some(previous) => {
                    let separator = &tree.edges()[i - 1].separator;
                    let eliminate: Vec<usize> = previous
                        .scope()
                        .iter()
                        .copied()
                        .filter(|v| !separator.contains(v))
                        .collect();
                    local.log_product(&previous.maximize(&eliminate)?)?
                }
            };
            scores.push(score);
        }

        let mut labels: Vec<Option<usize>> = vec![None; tree.n_var()];
        let mut log_score = f64::NEG_INFINITY;

        for (step, score) in scores.iter().rev().enumerate() {
            let (best, value) = (0..score.num_entries())
                .filter(|&idx| {
                    let assignment = score.assignment_of(idx);
                    score
                        .scope()
                        .iter()
                        .zip(&assignment)
                        .all(|(&var, &label)| labels[var].map_or(true, |l| l == label))
                })
                .map(|idx| (idx, score.values()[idx]))
                .fold((0, f64::NEG_INFINITY), |best, candidate| {
                    if candidate.1 > best.1 {
                        candidate
                    } else {
                        best
                    }
                });

            // The last clique's best entry scores the whole sequence.
            if step == 0 {
                log_score = value;
            }
            for (&var, label) in score.scope().iter().zip(score.assignment_of(best)) {
                labels[var] = Some(label);
            }
        }

        if self.config.check_finite && !log_score.is_finite() {
            return Err(CrfError::unstable("MAP score", log_score));
        }

        let labels = labels
            .into_iter()
            .enumerate()
            .map(|(var, label)| label.ok_or(CrfError::VariableNotFound(var)))
            .collect::<Result<Vec<_>>>()?;

        Ok(MapAssignment { labels, log_score })
    }
}

/// Ordered `(from, to)` clique pairs of one sweep.
type Sweep = Vec<(usize, usize)>;

/// Collect (towards `root`) and distribute (away from `root`) message order.
fn schedule(tree: &ChainCliqueTree, root: usize) -> Result<(Sweep, Sweep)> {
    let mut order = Vec::with_capacity(tree.num_cliques());
    let mut parent = vec![None; tree.num_cliques()];
    let mut visited = HashSet::new();
    let mut stack = vec![root];
    visited.insert(root);

    while let Some(current) = stack.pop() {
        order.push(current);
        for next in tree.neighbors(current) {
            if visited.insert(next) {
                parent[next] = Some(current);
                stack.push(next);
            }
        }
    }

    if order.len() != tree.num_cliques() {
        return Err(CrfError::InvalidInput(
            "clique tree is not connected".to_string(),
        ));
    }

    let collect = order
        .iter()
        .rev()
        .filter_map(|&c| parent[c].map(|p| (c, p)))
        .collect();
    let distribute = order
        .iter()
        .filter_map(|&c| parent[c].map(|p| (p, c)))
        .collect();

    Ok((collect, distribute))
}

/// Edge joining neighbouring cliques `from` and `to`.
fn find_edge(edges: &[CliqueEdge], from: usize, to: usize) -> Result<usize> {
    let idx = from.min(to);
    match edges.get(idx) {
        Some(edge) if edge.other(from) == Some(to) => Ok(idx),
        _ => Err(CrfError::InvalidInput(format!(
            "no edge between cliques {} and {}",
            from, to
        ))),
    }
}

/// Message from clique `from` over `edges[edge_idx]`.
fn compute_message(
    cliques: &[Clique],
    edges: &[CliqueEdge],
    space: PotentialSpace,
    from: usize,
    edge_idx: usize,
) -> Result<Factor> {
    let mut message = cliques[from].potential.clone();
    for idx in incident_edges(edges, from).filter(|&idx| idx != edge_idx) {
        if let Some(incoming) = edges[idx].incoming(from) {
            message = message.product_in(incoming, space)?;
        }
    }

    let separator = &edges[edge_idx].separator;
    let eliminate: Vec<usize> = message
        .scope()
        .iter()
        .copied()
        .filter(|v| !separator.contains(v))
        .collect();

    message.marginalize_in(&eliminate, space)
}

/// Clique tree after calibration, with its log partition function.
#[derive(Debug, Clone)]
pub struct CalibratedTree {
    space: PotentialSpace,
    n_var: usize,
    num_states: usize,
    check_finite: bool,
    cliques: Vec<Clique>,
    edges: Vec<CliqueEdge>,
    var_to_cliques: Vec<Vec<usize>>,
    log_z: f64,
}

impl CalibratedTree {
    /// Log partition function.
    pub fn log_z(&self) -> f64 {
        self.log_z
    }

    /// Space the beliefs are expressed in.
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

    /// Calibrated cliques; beliefs are unnormalized.
    pub fn beliefs(&self) -> &[Clique] {
        &self.cliques
    }

    /// Edges with the messages sent in both directions.
    pub fn edges(&self) -> &[CliqueEdge] {
        &self.edges
    }

    /// Unnormalized belief of clique `idx`.
    pub fn belief(&self, idx: usize) -> Result<&Factor> {
        self.cliques
            .get(idx)
            .map(|c| &c.potential)
            .ok_or_else(|| CrfError::InvalidInput(format!("no clique {}", idx)))
    }

    /// Normalized joint distribution over the scope of clique `idx`.
    pub fn clique_marginal(&self, idx: usize) -> Result<Factor> {
        self.normalized(self.belief(idx)?, "clique marginal")
    }

    /// Normalized joint distribution of two variables sharing a clique, in
    /// the order `(a, b)`.
    pub fn pair_marginal(&self, a: usize, b: usize) -> Result<Factor> {
        // Adjacent pair (i, i + 1) lives in clique i.
        let clique = self
            .cliques
            .get(a.min(b))
            .filter(|c| c.contains(a) && c.contains(b))
            .ok_or_else(|| CrfError::UnsupportedFeatureScope {
                scope: vec![a, b],
                reason: "no clique contains both variables".to_string(),
            })?;
        let others: Vec<usize> = clique
            .scope()
            .iter()
            .copied()
            .filter(|&v| v != a && v != b)
            .collect();
        let joint = clique.potential.marginalize_in(&others, self.space)?;
        self.normalized(&joint, "pair marginal")?.reorder(&[a, b])
    }

    /// Normalized marginal distribution of `var`.
    ///
    /// Read from the first clique containing the variable; after calibration
    /// every clique containing it gives the same answer.
    pub fn variable_marginal(&self, var: usize) -> Result<Array1<f64>> {
        let clique = self
            .var_to_cliques
            .get(var)
            .and_then(|ids| ids.first())
            .ok_or(CrfError::VariableNotFound(var))?;
        let belief = &self.cliques[*clique].potential;
        let others: Vec<usize> = belief.scope().iter().copied().filter(|&v| v != var).collect();
        let marginal = belief.marginalize_in(&others, self.space)?;
        Ok(self.normalized(&marginal, "variable marginal")?.values().clone())
    }

    /// Marginals of every variable, one row per variable.
    pub fn variable_marginals(&self) -> Result<Array2<f64>> {
        let mut marginals = Array2::zeros((self.n_var, self.num_states));
        for var in 0..self.n_var {
            marginals.row_mut(var).assign(&self.variable_marginal(var)?);
        }
        Ok(marginals)
    }

    /// Check that neighbouring cliques agree on their separator marginals.
    pub fn is_calibrated(&self, tolerance: f64) -> bool {
        self.edges.iter().all(|edge| {
            let side = |clique: usize| -> Option<Factor> {
                let belief = &self.cliques[clique].potential;
                let others: Vec<usize> = belief
                    .scope()
                    .iter()
                    .copied()
                    .filter(|v| !edge.separator.contains(v))
                    .collect();
                belief
                    .marginalize_in(&others, self.space)
                    .and_then(|m| m.normalize_in(self.space))
                    .and_then(|m| m.reorder(&edge.separator))
                    .ok()
            };
            match (side(edge.left), side(edge.right)) {
                (Some(left), Some(right)) => left
                    .values()
                    .iter()
                    .zip(right.values().iter())
                    .all(|(a, b)| (a - b).abs() <= tolerance),
                _ => false,
            }
        })
    }

    /// Normalize `factor` into probabilities.
    ///
    /// With `check_finite` off, a table that cannot be normalized comes back
    /// as NaN instead of an error.
    fn normalized(&self, factor: &Factor, quantity: &str) -> Result<Factor> {
        let normalized = match factor.normalize_in(self.space) {
            Ok(normalized) => normalized,
            Err(_) if !self.check_finite => return Ok(factor.map_values(|_| f64::NAN)),
            Err(CrfError::NumericInstability { value, .. }) => {
                return Err(CrfError::unstable(quantity, value))
            }
            Err(err) => return Err(err),
        };
        if self.check_finite {
            if let Some(&bad) = normalized.values().iter().find(|v| !v.is_finite()) {
                return Err(CrfError::unstable(quantity, bad));
            }
        }
        Ok(normalized)
    }
}
