//! Error types for the decompose crate.

use thiserror::Error;

/// Errors produced while lowering operations.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum DecomposeError {
    /// Building an instruction or operation failed.
    #[error("Circuit IR error: {0}")]
    Ir(#[from] kvant_ir::IrError),

    /// The operation has a structure no rule can lower.
    #[error("Operation '{0}' cannot be decomposed")]
    NotDecomposable(String),

    /// The fix-point driver was still rewriting after its last pass.
    #[error("Decomposition did not reach a fixed point after {passes} passes")]
    PassLimit {
        /// Number of passes that were run.
        passes: usize,
    },
}

/// Result type for decomposition.
pub type DecomposeResult<T> = Result<T, DecomposeError>;
