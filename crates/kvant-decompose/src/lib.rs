//! Kvant Decomposition Engine
//!
//! Rewrites composite and parameterized operations into circuits of simpler
//! gates. Decomposition is one level at a time: [`decompose`] lowers a single
//! operation, and [`Decomposer::decompose_until_fixed`] repeats whole-circuit
//! passes until nothing changes.
//!
//! # Rules
//!
//! | Operation | Lowering |
//! |-----------|----------|
//! | `swap`, `iswap`, `rxx`, `ryy`, `rzz`, `u` | exact elementary rewrites, applied recursively |
//! | `Inverse(g)` | decomposition of `g`, reversed, every gate inverted |
//! | `Parallel(n, g)` | decomposition of `g` on each block |
//! | `Power(p, g)` | repeated `g` for integer `p`, known roots, or the power of a single rewritten gate |
//! | `Control(n, g)` | controls pushed into the decomposition of `g`, multi-controlled X synthesis, or the square-root recursion |
//!
//! Anything else (measurements, resets, barriers, noise channels, custom
//! gates, singly-controlled single-qubit gates) is kept unchanged.
//!
//! # Example
//!
//! ```rust
//! use kvant_decompose::{Decomposer, DecomposerConfig};
//! use kvant_ir::{Circuit, Instruction, Operation, StandardGate};
//!
//! let c4x = Operation::Gate(StandardGate::X).control(4).unwrap();
//! let mut circuit = Circuit::new("c4x");
//! circuit.push_instruction(Instruction::gate(c4x, 0..5).unwrap());
//!
//! // Two spare qubits allow the linear Toffoli chain.
//! let decomposer = Decomposer::new(DecomposerConfig::new().with_ancillae([5, 6]));
//! let lowered = decomposer.decompose_until_fixed(&circuit).unwrap();
//! assert_eq!(lowered.count_operations()["ccx"], 8);
//! ```

pub mod config;
pub mod decompose;
pub mod decomposer;
pub mod error;
pub mod mcx;
pub mod rules;

pub use config::{DEFAULT_MAX_PASSES, DecomposerConfig};
pub use decompose::{decompose, decompose_into};
pub use decomposer::Decomposer;
pub use error::{DecomposeError, DecomposeResult};
pub use mcx::{controlled_root, synthesize_mcx};
