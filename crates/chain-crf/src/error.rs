//! Error types for chain CRF inference.

use thiserror::Error;

/// Errors that can occur while building factors, calibrating the clique tree
/// or assembling the objective.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CrfError {
    /// Two factors disagree on the cardinality of a shared variable.
    #[error("Cardinality mismatch for variable {variable}: {left} vs {right}")]
    ScopeCardinalityMismatch {
        variable: usize,
        left: usize,
        right: usize,
    },

    /// A feature references a scope the chain cannot represent.
    #[error("Unsupported feature scope {scope:?}: {reason}")]
    UnsupportedFeatureScope { scope: Vec<usize>, reason: String },

    /// A computed quantity left the finite range.
    #[error("Numeric instability in {quantity}: {value}")]
    NumericInstability { quantity: String, value: f64 },

    /// Dimension mismatch between tables, sequences or vectors.
    #[error("Dimension mismatch: expected {expected:?}, got {got:?}")]
    DimensionMismatch { expected: Vec<usize>, got: Vec<usize> },

    /// Variable not present in a factor or tree.
    #[error("Variable not found: {0}")]
    VariableNotFound(usize),

    /// Input violates the engine's data contract.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl CrfError {
    /// Build a [`CrfError::NumericInstability`] for `quantity`.
    pub(crate) fn unstable(quantity: impl Into<String>, value: f64) -> Self {
        Self::NumericInstability {
            quantity: quantity.into(),
            value,
        }
    }
}

/// Result type for chain CRF operations.
pub type Result<T> = std::result::Result<T, CrfError>;
