//! Error types for the IR crate.

use thiserror::Error;

/// Errors that can occur in IR operations.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Number of target groups does not match the operation arity.
    #[error("Operation '{gate_name}' expects {expected} target groups, got {got}")]
    ArityMismatch {
        /// Name of the operation.
        gate_name: String,
        /// Expected number of target groups (qubits + bits + zvars).
        expected: usize,
        /// Actual number of target groups provided.
        got: usize,
    },

    /// A target index is zero, duplicated, or its group is empty.
    #[error("Invalid target {target}: {reason}{}", format_gate_context(.gate_name))]
    InvalidTarget {
        /// The offending target index (as given by the caller).
        target: usize,
        /// What is wrong with it.
        reason: &'static str,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// Pure operators describe mathematical objects and cannot be pushed.
    #[error("Operator '{0}' is not a gate and cannot be added to a circuit directly")]
    NonGateOperator(String),

    /// Malformed pure operator.
    #[error("Invalid operator: {0}")]
    InvalidOperator(String),

    /// Inverse requested on an operation that has none.
    #[error("Operation '{0}' is not invertible")]
    NonInvertible(String),

    /// Power requested on an operation that cannot be exponentiated.
    #[error("Operation '{0}' cannot be exponentiated")]
    NonExponentiable(String),

    /// A unitary operation was required.
    #[error("Operation '{0}' is not unitary")]
    NotUnitary(String),

    /// Exponents must be finite and non-negative.
    #[error("Invalid exponent {0}: exponents must be finite and non-negative")]
    InvalidExponent(f64),

    /// Control modifiers need at least one control.
    #[error("Control modifier requires at least one control qubit")]
    InvalidControls,

    /// Parallel modifiers need at least one repetition.
    #[error("Parallel modifier requires at least one repetition")]
    InvalidRepeats,

    /// A concrete parameter is outside of its allowed range.
    #[error("Parameter '{name}' = {value} is out of range [{min}, {max}]")]
    OutOfRangeParameter {
        /// Name of the parameter.
        name: &'static str,
        /// The offending value.
        value: f64,
        /// Lower bound (inclusive).
        min: f64,
        /// Upper bound (inclusive).
        max: f64,
    },

    /// Parameter is unbound.
    #[error("Parameter '{0}' is unbound")]
    UnboundParameter(String),

    /// Insertion position past the end of the circuit.
    #[error("Position {position} is out of bounds for circuit of length {len}")]
    InvalidPosition {
        /// The requested position.
        position: usize,
        /// Current number of instructions.
        len: usize,
    },

    /// Matrix has the wrong shape for its operation.
    #[error("Matrix for '{gate_name}' must be {expected}x{expected}, got {rows}x{cols}")]
    MatrixDimension {
        /// Name of the gate.
        gate_name: String,
        /// Expected side length.
        expected: usize,
        /// Actual number of rows.
        rows: usize,
        /// Actual number of columns.
        cols: usize,
    },

    /// The eigendecomposition behind a fractional power did not converge.
    #[error("Eigendecomposition of a {dim}x{dim} matrix did not converge")]
    NoConvergence {
        /// Side length of the matrix.
        dim: usize,
    },
}

impl IrError {
    pub(crate) fn invalid_target(target: usize, reason: &'static str, gate_name: &str) -> Self {
        IrError::InvalidTarget {
            target,
            reason,
            gate_name: Some(gate_name.to_string()),
        }
    }
}

/// Helper function to format optional gate context.
#[allow(clippy::ref_option)]
fn format_gate_context(gate_name: &Option<String>) -> String {
    match gate_name {
        Some(name) => format!(" (gate: {name})"),
        None => String::new(),
    }
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
