//! Factor representation and operations.
//!
//! A factor is a dense table over a small ordered scope of discrete variables.
//! Every table in this crate uses the same mixed-radix layout: the **first**
//! scope variable is the least significant digit, so for scope `(a, b)` with
//! cardinalities `(Ka, Kb)` the entry for `(a, b)` lives at `a + Ka * b`.

use scirs2_core::ndarray::Array1;

use crate::config::PotentialSpace;
use crate::error::{CrfError, Result};

/// Compute the stride of every digit of a mixed-radix encoding.
fn strides(cardinalities: &[usize]) -> Vec<usize> {
    let mut strides = Vec::with_capacity(cardinalities.len());
    let mut stride = 1;
    for &card in cardinalities {
        strides.push(stride);
        stride *= card;
    }
    strides
}

/// Encode a joint assignment as a flat table index.
///
/// Entries of `assignment` must be below the matching cardinality.
pub fn assignment_to_index(assignment: &[usize], cardinalities: &[usize]) -> usize {
    assignment
        .iter()
        .zip(strides(cardinalities))
        .map(|(&value, stride)| value * stride)
        .sum()
}

/// Decode a flat table index into a joint assignment.
pub fn index_to_assignment(index: usize, cardinalities: &[usize]) -> Vec<usize> {
    let mut rest = index;
    cardinalities
        .iter()
        .map(|&card| {
            let digit = rest % card;
            rest /= card;
            digit
        })
        .collect()
}

/// Computes `ln(Σ exp(x))` without overflowing.
///
/// Returns negative infinity for an empty input or when every term is zero
/// mass.
pub fn logsumexp<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
    I::IntoIter: Clone,
{
    let iter = values.into_iter();
    let max = iter.clone().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    if !max.is_finite() {
        return max;
    }
    max + iter.map(|x| (x - max).exp()).sum::<f64>().ln()
}

/// Advance an odometer-style assignment, first digit fastest.
fn next_assignment(assignment: &mut [usize], cardinalities: &[usize]) -> bool {
    for (digit, &card) in assignment.iter_mut().zip(cardinalities) {
        *digit += 1;
        if *digit < card {
            return true;
        }
        *digit = 0;
    }
    false
}

/// A factor in the chain model.
///
/// Represents a function over a subset of variables: φ(X₁, ..., Xₖ) → ℝ.
/// Depending on the configured potential space the table holds potentials
/// or log-potentials; the operations below come in both flavours.
#[derive(Clone, Debug, PartialEq)]
pub struct Factor {
    scope: Vec<usize>,
    cardinalities: Vec<usize>,
    values: Array1<f64>,
}

impl Factor {
    /// Create a new factor, checking the table against the scope.
    pub fn new(scope: Vec<usize>, cardinalities: Vec<usize>, values: Array1<f64>) -> Result<Self> {
        if scope.len() != cardinalities.len() {
            return Err(CrfError::DimensionMismatch {
                expected: vec![scope.len()],
                got: vec![cardinalities.len()],
            });
        }
        for (i, var) in scope.iter().enumerate() {
            if scope[..i].contains(var) {
                return Err(CrfError::InvalidInput(format!(
                    "variable {} appears twice in scope {:?}",
                    var, scope
                )));
            }
        }
        if cardinalities.contains(&0) {
            return Err(CrfError::InvalidInput(format!(
                "zero cardinality in {:?}",
                cardinalities
            )));
        }

        let expected: usize = cardinalities.iter().product();
        if values.len() != expected {
            return Err(CrfError::DimensionMismatch {
                expected: vec![expected],
                got: vec![values.len()],
            });
        }

        Ok(Self {
            scope,
            cardinalities,
            values,
        })
    }

    /// Create a factor with every entry set to `value`.
    pub fn filled(scope: Vec<usize>, cardinalities: Vec<usize>, value: f64) -> Result<Self> {
        let size: usize = cardinalities.iter().product();
        Self::new(scope, cardinalities, Array1::from_elem(size, value))
    }

    /// The scope-less factor with value 1, neutral under [`Factor::product`].
    pub fn identity() -> Self {
        Self {
            scope: Vec::new(),
            cardinalities: Vec::new(),
            values: Array1::from_elem(1, 1.0),
        }
    }

    /// Variables of this factor, in table order.
    pub fn scope(&self) -> &[usize] {
        &self.scope
    }

    /// Cardinality of every scope variable.
    pub fn cardinalities(&self) -> &[usize] {
        &self.cardinalities
    }

    /// Flat value table.
    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    /// Number of table entries.
    pub fn num_entries(&self) -> usize {
        self.values.len()
    }

    /// Position of `var` within the scope.
    pub fn position(&self, var: usize) -> Option<usize> {
        self.scope.iter().position(|&v| v == var)
    }

    /// Whether `var` is in the scope.
    pub fn contains(&self, var: usize) -> bool {
        self.position(var).is_some()
    }

    /// Get cardinality of a variable.
    pub fn cardinality(&self, var: usize) -> Option<usize> {
        self.position(var).map(|idx| self.cardinalities[idx])
    }

    /// Table index of a joint assignment given in scope order.
    pub fn index_of(&self, assignment: &[usize]) -> Result<usize> {
        if assignment.len() != self.scope.len() {
            return Err(CrfError::DimensionMismatch {
                expected: vec![self.scope.len()],
                got: vec![assignment.len()],
            });
        }
        for ((&value, &card), &var) in assignment
            .iter()
            .zip(&self.cardinalities)
            .zip(&self.scope)
        {
            if value >= card {
                return Err(CrfError::InvalidInput(format!(
                    "value {} out of bounds for variable {} with cardinality {}",
                    value, var, card
                )));
            }
        }
        Ok(assignment_to_index(assignment, &self.cardinalities))
    }

    /// Joint assignment stored at a table index.
    pub fn assignment_of(&self, index: usize) -> Vec<usize> {
        index_to_assignment(index, &self.cardinalities)
    }

    /// Value of a joint assignment given in scope order.
    pub fn value_at(&self, assignment: &[usize]) -> Result<f64> {
        Ok(self.values[self.index_of(assignment)?])
    }

    /// Sum of every entry.
    pub fn total(&self) -> f64 {
        self.values.sum()
    }

    /// Apply `f` to every entry, keeping the scope.
    pub fn map_values<F>(&self, f: F) -> Factor
    where
        F: Fn(f64) -> f64,
    {
        Factor {
            scope: self.scope.clone(),
            cardinalities: self.cardinalities.clone(),
            values: self.values.mapv(f),
        }
    }

    /// Return a copy scaled to sum to 1.
    pub fn normalize(&self) -> Result<Factor> {
        let sum = self.total();
        if !sum.is_finite() || sum <= 0.0 {
            return Err(CrfError::unstable("factor normalizer", sum));
        }
        Ok(self.map_values(|v| v / sum))
    }

    /// Interpret the table as log-potentials and return normalized
    /// probabilities.
    pub fn normalize_log(&self) -> Result<Factor> {
        let log_sum = logsumexp(self.values.iter().copied());
        if !log_sum.is_finite() {
            return Err(CrfError::unstable("log factor normalizer", log_sum));
        }
        Ok(self.map_values(|v| (v - log_sum).exp()))
    }
}

impl Factor {
    /// Compute the product of two factors.
    ///
    /// φ₁(X₁) * φ₂(X₂) = φ(X₁ ∪ X₂), with `self`'s variables first.
    pub fn product(&self, other: &Factor) -> Result<Factor> {
        self.combine(other, |a, b| a * b)
    }

    /// Product of two log-space factors, i.e. the elementwise sum.
    pub fn log_product(&self, other: &Factor) -> Result<Factor> {
        self.combine(other, |a, b| a + b)
    }

    fn combine<F>(&self, other: &Factor, op: F) -> Result<Factor>
    where
        F: Fn(f64, f64) -> f64,
    {
        let mut scope = self.scope.clone();
        let mut cardinalities = self.cardinalities.clone();

        for (&var, &card) in other.scope.iter().zip(&other.cardinalities) {
            match self.cardinality(var) {
                Some(existing) if existing != card => {
                    return Err(CrfError::ScopeCardinalityMismatch {
                        variable: var,
                        left: existing,
                        right: card,
                    });
                }
                Some(_) => {}
                None => {
                    scope.push(var);
                    cardinalities.push(card);
                }
            }
        }

        // Result positions of each operand's scope variables.
        let self_map: Vec<usize> = (0..self.scope.len()).collect();
        let other_map: Vec<usize> = other
            .scope
            .iter()
            .map(|&var| scope.iter().position(|&v| v == var).unwrap_or_default())
            .collect();
        let self_strides = strides(&self.cardinalities);
        let other_strides = strides(&other.cardinalities);

        let total: usize = cardinalities.iter().product();
        let mut values = Array1::zeros(total);
        let mut assignment = vec![0; scope.len()];

        for value in values.iter_mut() {
            let self_idx: usize = self_map
                .iter()
                .zip(&self_strides)
                .map(|(&pos, &stride)| assignment[pos] * stride)
                .sum();
            let other_idx: usize = other_map
                .iter()
                .zip(&other_strides)
                .map(|(&pos, &stride)| assignment[pos] * stride)
                .sum();

            *value = op(self.values[self_idx], other.values[other_idx]);
            next_assignment(&mut assignment, &cardinalities);
        }

        Ok(Factor {
            scope,
            cardinalities,
            values,
        })
    }

    /// Marginalize out variables by summing over them.
    ///
    /// ∑ₓ φ(X, Y) = φ(Y). Removing every variable leaves a scope-less factor
    /// holding the table sum.
    pub fn marginalize(&self, vars: &[usize]) -> Result<Factor> {
        self.reduce_with(vars, 0.0, |acc, v| acc + v)
    }

    /// Maximize out variables (for max-product decoding).
    pub fn maximize(&self, vars: &[usize]) -> Result<Factor> {
        self.reduce_with(vars, f64::NEG_INFINITY, f64::max)
    }

    /// Marginalize out variables of a log-space factor with log-sum-exp.
    pub fn log_marginalize(&self, vars: &[usize]) -> Result<Factor> {
        let maxima = self.maximize(vars)?;
        let kept = self.kept_positions(vars)?;
        let kept_cards: Vec<usize> = kept.iter().map(|&p| self.cardinalities[p]).collect();

        let mut sums = Array1::<f64>::zeros(maxima.values.len());
        let mut assignment = vec![0; self.scope.len()];
        for &value in self.values.iter() {
            let reduced: Vec<usize> = kept.iter().map(|&p| assignment[p]).collect();
            let idx = assignment_to_index(&reduced, &kept_cards);
            let max = maxima.values[idx];
            if max.is_finite() {
                sums[idx] += (value - max).exp();
            }
            next_assignment(&mut assignment, &self.cardinalities);
        }

        let values = maxima
            .values
            .iter()
            .zip(sums.iter())
            .map(|(&max, &sum)| if max.is_finite() { max + sum.ln() } else { max })
            .collect::<Array1<f64>>();

        Ok(Factor { values, ..maxima })
    }

    /// Marginalize out all variables except `var`.
    pub fn marginal_onto(&self, var: usize) -> Result<Factor> {
        if !self.contains(var) {
            return Err(CrfError::VariableNotFound(var));
        }
        let others: Vec<usize> = self.scope.iter().copied().filter(|&v| v != var).collect();
        self.marginalize(&others)
    }

    /// Same function with the scope permuted to `scope`.
    pub fn reorder(&self, scope: &[usize]) -> Result<Factor> {
        if scope.len() != self.scope.len() {
            return Err(CrfError::DimensionMismatch {
                expected: vec![self.scope.len()],
                got: vec![scope.len()],
            });
        }
        let positions = scope
            .iter()
            .map(|&var| self.position(var).ok_or(CrfError::VariableNotFound(var)))
            .collect::<Result<Vec<usize>>>()?;
        let cardinalities: Vec<usize> = positions.iter().map(|&p| self.cardinalities[p]).collect();

        let mut values = Array1::zeros(self.values.len());
        let mut assignment = vec![0; scope.len()];
        let mut original = vec![0; scope.len()];
        for value in values.iter_mut() {
            for (&digit, &pos) in assignment.iter().zip(&positions) {
                original[pos] = digit;
            }
            *value = self.values[assignment_to_index(&original, &self.cardinalities)];
            next_assignment(&mut assignment, &cardinalities);
        }

        Factor::new(scope.to_vec(), cardinalities, values)
    }

    /// Value of the assignment `labels` to `vars`, which must cover the
    /// scope in any order.
    pub fn value_for(&self, vars: &[usize], labels: &[usize]) -> Result<f64> {
        if vars.len() != self.scope.len() || labels.len() != vars.len() {
            return Err(CrfError::DimensionMismatch {
                expected: vec![self.scope.len()],
                got: vec![vars.len(), labels.len()],
            });
        }
        let mut assignment = vec![0; self.scope.len()];
        for (&var, &label) in vars.iter().zip(labels) {
            let pos = self.position(var).ok_or(CrfError::VariableNotFound(var))?;
            assignment[pos] = label;
        }
        self.value_at(&assignment)
    }

    fn kept_positions(&self, vars: &[usize]) -> Result<Vec<usize>> {
        if let Some(&missing) = vars.iter().find(|&&v| !self.contains(v)) {
            return Err(CrfError::VariableNotFound(missing));
        }
        Ok((0..self.scope.len())
            .filter(|&p| !vars.contains(&self.scope[p]))
            .collect())
    }

    fn reduce_with<F>(&self, vars: &[usize], init: f64, fold: F) -> Result<Factor>
    where
        F: Fn(f64, f64) -> f64,
    {
        let kept = self.kept_positions(vars)?;
        let scope: Vec<usize> = kept.iter().map(|&p| self.scope[p]).collect();
        let cardinalities: Vec<usize> = kept.iter().map(|&p| self.cardinalities[p]).collect();
        let kept_strides = strides(&cardinalities);

        let size: usize = cardinalities.iter().product();
        let mut values = Array1::from_elem(size, init);
        let mut assignment = vec![0; self.scope.len()];

        for &value in self.values.iter() {
            let idx: usize = kept
                .iter()
                .zip(&kept_strides)
                .map(|(&p, &stride)| assignment[p] * stride)
                .sum();
            values[idx] = fold(values[idx], value);
            next_assignment(&mut assignment, &self.cardinalities);
        }

        Ok(Factor {
            scope,
            cardinalities,
            values,
        })
    }
}

/// Operations that depend on how the table is interpreted.
impl Factor {
    /// Factor product in the given potential space.
    pub fn product_in(&self, other: &Factor, space: PotentialSpace) -> Result<Factor> {
        match space {
            PotentialSpace::Linear => self.product(other),
            PotentialSpace::Log => self.log_product(other),
        }
    }

    /// Sum out `vars` in the given potential space.
    pub fn marginalize_in(&self, vars: &[usize], space: PotentialSpace) -> Result<Factor> {
        match space {
            PotentialSpace::Linear => self.marginalize(vars),
            PotentialSpace::Log => self.log_marginalize(vars),
        }
    }

    /// Log of the total mass of the table.
    pub fn log_total_in(&self, space: PotentialSpace) -> f64 {
        match space {
            PotentialSpace::Linear => self.total().ln(),
            PotentialSpace::Log => logsumexp(self.values.iter().copied()),
        }
    }

    /// Normalized probabilities, whatever the table holds.
    pub fn normalize_in(&self, space: PotentialSpace) -> Result<Factor> {
        match space {
            PotentialSpace::Linear => self.normalize(),
            PotentialSpace::Log => self.normalize_log(),
        }
    }

    /// Log-potentials of the table.
    pub fn to_log_in(&self, space: PotentialSpace) -> Factor {
        match space {
            PotentialSpace::Linear => self.map_values(f64::ln),
            PotentialSpace::Log => self.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use scirs2_core::ndarray::array;

    fn pair(scope: [usize; 2], values: [f64; 4]) -> Factor {
        Factor::new(scope.to_vec(), vec![2, 2], Array1::from(values.to_vec())).unwrap()
    }

    #[test]
    fn test_factor_creation() {
        let factor = pair([0, 1], [0.1, 0.2, 0.3, 0.4]);
        assert_eq!(factor.scope(), &[0, 1]);
        assert_eq!(factor.num_entries(), 4);

        let err = Factor::new(vec![0, 1], vec![2, 2], array![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, CrfError::DimensionMismatch { .. }));

        let err = Factor::new(vec![0, 0], vec![2, 2], Array1::zeros(4)).unwrap_err();
        assert!(matches!(err, CrfError::InvalidInput(_)));
    }

    #[test]
    fn test_index_round_trip() {
        let cards = [3, 2, 4];
        let total: usize = cards.iter().product();
        for index in 0..total {
            let assignment = index_to_assignment(index, &cards);
            assert_eq!(assignment_to_index(&assignment, &cards), index);
        }
        // First variable is least significant.
        assert_eq!(assignment_to_index(&[1, 0, 0], &cards), 1);
        assert_eq!(assignment_to_index(&[0, 1, 0], &cards), 3);
        assert_eq!(assignment_to_index(&[0, 0, 1], &cards), 6);
    }

    #[test]
    fn test_value_at_layout() {
        // (x0, x1): (0,0)=0.1 (1,0)=0.2 (0,1)=0.3 (1,1)=0.4
        let factor = pair([0, 1], [0.1, 0.2, 0.3, 0.4]);
        assert_abs_diff_eq!(factor.value_at(&[1, 0]).unwrap(), 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(factor.value_at(&[0, 1]).unwrap(), 0.3, epsilon = 1e-12);
        assert!(factor.value_at(&[2, 0]).is_err());
    }

    #[test]
    fn test_factor_product() {
        let f1 = Factor::new(vec![0], vec![2], array![0.6, 0.4]).unwrap();
        let f2 = Factor::new(vec![1], vec![2], array![0.7, 0.3]).unwrap();

        let product = f1.product(&f2).unwrap();
        assert_eq!(product.scope(), &[0, 1]);
        assert_abs_diff_eq!(product.value_at(&[0, 0]).unwrap(), 0.42, epsilon = 1e-12);
        assert_abs_diff_eq!(product.value_at(&[1, 0]).unwrap(), 0.28, epsilon = 1e-12);
        assert_abs_diff_eq!(product.value_at(&[0, 1]).unwrap(), 0.18, epsilon = 1e-12);
        assert_abs_diff_eq!(product.value_at(&[1, 1]).unwrap(), 0.12, epsilon = 1e-12);
    }

    #[test]
    fn test_factor_product_with_shared_vars() {
        let f1 = pair([0, 1], [1.0, 2.0, 3.0, 4.0]);
        let f2 = pair([1, 2], [5.0, 6.0, 7.0, 8.0]);

        let product = f1.product(&f2).unwrap();
        assert_eq!(product.scope(), &[0, 1, 2]);
        for index in 0..product.num_entries() {
            let a = product.assignment_of(index);
            let expected =
                f1.value_at(&[a[0], a[1]]).unwrap() * f2.value_at(&[a[1], a[2]]).unwrap();
            assert_abs_diff_eq!(product.values()[index], expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_filled_factor() {
        let factor = Factor::filled(vec![3, 1], vec![2, 3], 0.25).unwrap();
        assert_eq!(factor.num_entries(), 6);
        assert_abs_diff_eq!(factor.total(), 1.5, epsilon = 1e-12);
        assert!(Factor::filled(vec![0], vec![0], 1.0).is_err());
    }

    #[test]
    fn test_product_cardinality_mismatch() {
        let f1 = Factor::filled(vec![0, 1], vec![2, 2], 1.0).unwrap();
        let f2 = Factor::filled(vec![1], vec![3], 1.0).unwrap();
        assert_eq!(
            f1.product(&f2).unwrap_err(),
            CrfError::ScopeCardinalityMismatch {
                variable: 1,
                left: 2,
                right: 3
            }
        );
    }

    #[test]
    fn test_identity_product() {
        let factor = pair([3, 4], [0.1, 0.2, 0.3, 0.4]);
        assert_eq!(Factor::identity().product(&factor).unwrap(), factor);
        assert_eq!(factor.product(&Factor::identity()).unwrap(), factor);
    }

    #[test]
    fn test_factor_marginalize() {
        let factor = pair([0, 1], [0.1, 0.2, 0.3, 0.4]);

        let marginal = factor.marginalize(&[1]).unwrap();
        assert_eq!(marginal.scope(), &[0]);
        assert_abs_diff_eq!(marginal.values()[0], 0.4, epsilon = 1e-12);
        assert_abs_diff_eq!(marginal.values()[1], 0.6, epsilon = 1e-12);

        let marginal = factor.marginalize(&[0]).unwrap();
        assert_eq!(marginal.scope(), &[1]);
        assert_abs_diff_eq!(marginal.values()[0], 0.3, epsilon = 1e-12);
        assert_abs_diff_eq!(marginal.values()[1], 0.7, epsilon = 1e-12);

        let scalar = factor.marginalize(&[0, 1]).unwrap();
        assert!(scalar.scope().is_empty());
        assert_abs_diff_eq!(scalar.values()[0], 1.0, epsilon = 1e-12);

        assert_eq!(
            factor.marginalize(&[7]).unwrap_err(),
            CrfError::VariableNotFound(7)
        );
    }

    #[test]
    fn test_factor_maximize() {
        let factor = pair([0, 1], [0.1, 0.2, 0.3, 0.4]);
        let maximized = factor.maximize(&[1]).unwrap();
        assert_abs_diff_eq!(maximized.values()[0], 0.3, epsilon = 1e-12);
        assert_abs_diff_eq!(maximized.values()[1], 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_log_operations_match_linear() {
        let f1 = pair([0, 1], [0.1, 0.2, 0.3, 0.4]);
        let f2 = Factor::new(vec![1, 2], vec![2, 3], array![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();

        let linear = f1.product(&f2).unwrap().marginalize(&[1]).unwrap();
        let log = f1
            .map_values(f64::ln)
            .log_product(&f2.map_values(f64::ln))
            .unwrap()
            .log_marginalize(&[1])
            .unwrap();

        assert_eq!(linear.scope(), log.scope());
        for (a, b) in linear.values().iter().zip(log.values().iter()) {
            assert_abs_diff_eq!(a.ln(), *b, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_log_marginalize_zero_mass() {
        let factor = Factor::new(
            vec![0, 1],
            vec![2, 2],
            array![f64::NEG_INFINITY, 0.0, f64::NEG_INFINITY, 0.0],
        )
        .unwrap();
        let marginal = factor.log_marginalize(&[1]).unwrap();
        assert_eq!(marginal.values()[0], f64::NEG_INFINITY);
        assert_abs_diff_eq!(marginal.values()[1], 2f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_normalize() {
        let factor = pair([0, 1], [1.0, 2.0, 3.0, 4.0]);
        let normalized = factor.normalize().unwrap();
        assert_abs_diff_eq!(normalized.total(), 1.0, epsilon = 1e-12);

        let zero = Factor::filled(vec![0], vec![2], 0.0).unwrap();
        assert!(matches!(
            zero.normalize().unwrap_err(),
            CrfError::NumericInstability { .. }
        ));

        let log = factor.map_values(f64::ln).normalize_log().unwrap();
        for (a, b) in log.values().iter().zip(normalized.values().iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_reorder() {
        let factor = pair([0, 1], [0.1, 0.2, 0.3, 0.4]);
        let swapped = factor.reorder(&[1, 0]).unwrap();
        assert_eq!(swapped.scope(), &[1, 0]);
        assert_abs_diff_eq!(swapped.value_at(&[1, 0]).unwrap(), 0.3, epsilon = 1e-12);
        assert_abs_diff_eq!(swapped.value_at(&[0, 1]).unwrap(), 0.2, epsilon = 1e-12);
        assert_eq!(swapped.reorder(&[0, 1]).unwrap(), factor);
    }

    #[test]
    fn test_logsumexp() {
        assert_abs_diff_eq!(logsumexp([0.0, 0.0]), 2f64.ln(), epsilon = 1e-12);
        assert_abs_diff_eq!(
            logsumexp([1000.0, 1000.0]),
            1000.0 + 2f64.ln(),
            epsilon = 1e-9
        );
        assert_eq!(logsumexp(Vec::<f64>::new()), f64::NEG_INFINITY);
    }
}
