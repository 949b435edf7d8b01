//! Kvant Circuit Intermediate Representation
//!
//! This crate provides the core data structures for representing quantum
//! circuits in Kvant: operations with a fixed arity, the modifier algebra
//! built on top of them, validated instructions and circuits, and dense
//! matrix synthesis used to check lowering passes.
//!
//! # Core Components
//!
//! - **Scalars**: [`Scalar`] for concrete or symbolic gate parameters
//! - **Gates**: [`StandardGate`] for primitive gates and [`CustomGate`] for
//!   gates given by an explicit unitary
//! - **Operations**: [`Operation`], a closed sum of gates, modifiers
//!   ([`Control`], [`Power`], [`Inverse`], [`Parallel`]) and non-unitary
//!   operations (measurement, reset, barrier, noise, operators)
//! - **Instructions**: [`Instruction`] binding an operation to targets
//! - **Circuit**: [`Circuit`] with validated, broadcasting mutators
//! - **Matrices**: [`matrix`] for closed forms, powers and circuit unitaries
//!
//! # Example: Building a Bell State
//!
//! ```rust
//! use kvant_ir::Circuit;
//!
//! let mut circuit = Circuit::new("bell_state");
//!
//! // Targets are 1-based.
//! circuit.h(1).unwrap();
//! circuit.cx(1, 2).unwrap();
//! circuit.measure(1..=2, 1..=2).unwrap();
//!
//! assert_eq!(circuit.num_qubits(), 2);
//! assert_eq!(circuit.len(), 4);
//! ```
//!
//! # Example: Modifiers
//!
//! ```rust
//! use kvant_ir::{Operation, StandardGate};
//!
//! let x = Operation::Gate(StandardGate::X);
//! let c3x = x.clone().control(1).unwrap().control(2).unwrap();
//! assert_eq!(c3x.name(), "c3x");
//! assert_eq!(c3x.num_qubits(), 4);
//!
//! // Inverting twice gives back the original operation.
//! let t = Operation::Gate(StandardGate::T);
//! assert_eq!(t.clone().inverse().unwrap().inverse().unwrap(), t);
//! ```
//!
//! # Example: Parameterized Circuit
//!
//! ```rust
//! use kvant_ir::{Circuit, Scalar};
//! use std::f64::consts::PI;
//!
//! let mut circuit = Circuit::new("variational");
//! circuit.rx(Scalar::symbol("theta"), 1).unwrap();
//! assert!(circuit.is_symbolic());
//!
//! let bound = circuit
//!     .substitute(&[("theta".to_string(), PI / 4.0)].into_iter().collect())
//!     .unwrap();
//! assert!(!bound.is_symbolic());
//! ```

pub mod circuit;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod matrix;
pub mod noise;
pub mod operation;
pub mod scalar;

pub use circuit::{Circuit, Target};
pub use error::{IrError, IrResult};
pub use gate::{CustomGate, StandardGate};
pub use instruction::Instruction;
pub use matrix::{Matrix, circuit_unitary};
pub use noise::NoiseChannel;
pub use operation::{
    Arity, Control, ExpectationValue, Exponent, Inverse, Operation, OperationKind, Operator,
    Parallel, Pauli, Power,
};
pub use scalar::{Bindings, Expr, Scalar};
