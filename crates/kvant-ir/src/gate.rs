//! Primitive quantum gate types.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::scalar::{Bindings, Scalar};

/// Primitive gates with known semantics.
///
/// Controlled and daggered gates (CX, CCX, Sdg, ...) are not listed here: they
/// are expressed through the modifier algebra, see [`crate::Operation::cx`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StandardGate {
    // Single-qubit Pauli gates
    /// Identity gate.
    I,
    /// Pauli-X gate.
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate.
    Z,

    // Single-qubit Clifford gates
    /// Hadamard gate.
    H,
    /// S gate (sqrt(Z)).
    S,
    /// T gate (fourth root of Z).
    T,
    /// sqrt(X) gate.
    SX,

    // Single-qubit rotation gates
    /// Rotation around X axis.
    Rx(Scalar),
    /// Rotation around Y axis.
    Ry(Scalar),
    /// Rotation around Z axis.
    Rz(Scalar),
    /// Phase gate.
    P(Scalar),
    /// Universal single-qubit gate U(θ, φ, λ).
    U(Scalar, Scalar, Scalar),

    // Two-qubit gates
    /// SWAP gate.
    Swap,
    /// iSWAP gate.
    ISwap,
    /// XX rotation gate.
    RXX(Scalar),
    /// YY rotation gate.
    RYY(Scalar),
    /// ZZ rotation gate.
    RZZ(Scalar),
}

impl StandardGate {
    /// Get the name of this gate.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            StandardGate::I => "id",
            StandardGate::X => "x",
            StandardGate::Y => "y",
            StandardGate::Z => "z",
            StandardGate::H => "h",
            StandardGate::S => "s",
            StandardGate::T => "t",
            StandardGate::SX => "sx",
            StandardGate::Rx(_) => "rx",
            StandardGate::Ry(_) => "ry",
            StandardGate::Rz(_) => "rz",
            StandardGate::P(_) => "p",
            StandardGate::U(_, _, _) => "u",
            StandardGate::Swap => "swap",
            StandardGate::ISwap => "iswap",
            StandardGate::RXX(_) => "rxx",
            StandardGate::RYY(_) => "ryy",
            StandardGate::RZZ(_) => "rzz",
        }
    }

    /// Get the number of qubits this gate operates on.
    #[inline]
    pub fn num_qubits(&self) -> usize {
        match self {
            StandardGate::I
            | StandardGate::X
            | StandardGate::Y
            | StandardGate::Z
            | StandardGate::H
            | StandardGate::S
            | StandardGate::T
            | StandardGate::SX
            | StandardGate::Rx(_)
            | StandardGate::Ry(_)
            | StandardGate::Rz(_)
            | StandardGate::P(_)
            | StandardGate::U(_, _, _) => 1,

            StandardGate::Swap
            | StandardGate::ISwap
            | StandardGate::RXX(_)
            | StandardGate::RYY(_)
            | StandardGate::RZZ(_) => 2,
        }
    }

    /// Check if any parameter of this gate is symbolic.
    pub fn is_parameterized(&self) -> bool {
        self.parameters().iter().any(|p| p.is_symbolic())
    }

    /// Get parameters of this gate.
    pub fn parameters(&self) -> Vec<&Scalar> {
        match self {
            StandardGate::Rx(p)
            | StandardGate::Ry(p)
            | StandardGate::Rz(p)
            | StandardGate::P(p)
            | StandardGate::RXX(p)
            | StandardGate::RYY(p)
            | StandardGate::RZZ(p) => vec![p],

            StandardGate::U(a, b, c) => vec![a, b, c],

            _ => vec![],
        }
    }

    /// Return a copy of this gate with every parameter mapped through `f`.
    pub fn map_parameters(&self, f: impl Fn(&Scalar) -> Scalar) -> Self {
        match self {
            StandardGate::Rx(p) => StandardGate::Rx(f(p)),
            StandardGate::Ry(p) => StandardGate::Ry(f(p)),
            StandardGate::Rz(p) => StandardGate::Rz(f(p)),
            StandardGate::P(p) => StandardGate::P(f(p)),
            StandardGate::RXX(p) => StandardGate::RXX(f(p)),
            StandardGate::RYY(p) => StandardGate::RYY(f(p)),
            StandardGate::RZZ(p) => StandardGate::RZZ(f(p)),
            StandardGate::U(a, b, c) => StandardGate::U(f(a), f(b), f(c)),
            other => other.clone(),
        }
    }

    /// Substitute symbols in all parameters.
    pub fn substitute(&self, bindings: &Bindings) -> Self {
        self.map_parameters(|p| p.substitute(bindings))
    }
}

/// A named gate defined by an explicit unitary matrix.
///
/// This is the escape hatch for gates outside of [`StandardGate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CustomGateRepr")]
pub struct CustomGate {
    name: String,
    num_qubits: usize,
    params: Vec<Scalar>,
    /// Unitary matrix, row-major, 2^n × 2^n.
    matrix: Vec<Complex64>,
}

#[derive(Deserialize)]
struct CustomGateRepr {
    name: String,
    num_qubits: usize,
    params: Vec<Scalar>,
    matrix: Vec<Complex64>,
}

impl TryFrom<CustomGateRepr> for CustomGate {
    type Error = IrError;

    fn try_from(repr: CustomGateRepr) -> IrResult<Self> {
        Ok(CustomGate::new(repr.name, repr.num_qubits, repr.matrix)?.with_params(repr.params))
    }
}

impl CustomGate {
    /// Create a new custom gate from a row-major unitary matrix.
    ///
    /// Fails if the matrix is not `2^num_qubits` square or not unitary.
    pub fn new(
        name: impl Into<String>,
        num_qubits: usize,
        matrix: Vec<Complex64>,
    ) -> IrResult<Self> {
        let name = name.into();
        let dim = u32::try_from(num_qubits)
            .ok()
            .and_then(|n| 1usize.checked_shl(n))
            .filter(|d| d.checked_mul(*d).is_some())
            .ok_or(IrError::MatrixDimension {
                gate_name: name.clone(),
                expected: usize::MAX,
                rows: matrix.len(),
                cols: 1,
            })?;
        if matrix.len() != dim * dim {
            return Err(IrError::MatrixDimension {
                gate_name: name,
                expected: dim,
                rows: matrix.len() / dim,
                cols: dim,
            });
        }
        if !crate::matrix::is_unitary_row_major(&matrix, dim) {
            return Err(IrError::NotUnitary(name));
        }
        Ok(Self {
            name,
            num_qubits,
            params: vec![],
            matrix,
        })
    }

    /// Attach display parameters to the gate.
    #[must_use]
    pub fn with_params(mut self, params: Vec<Scalar>) -> Self {
        self.params = params;
        self
    }

    /// The gate name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Display parameters.
    pub fn params(&self) -> &[Scalar] {
        &self.params
    }

    /// Row-major matrix entries.
    pub fn matrix_entries(&self) -> &[Complex64] {
        &self.matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_standard_gate_properties() {
        assert_eq!(StandardGate::H.num_qubits(), 1);
        assert_eq!(StandardGate::Swap.num_qubits(), 2);
        assert_eq!(StandardGate::RZZ(Scalar::real(0.1)).num_qubits(), 2);

        assert!(!StandardGate::H.is_parameterized());
        assert!(!StandardGate::Rx(Scalar::real(PI)).is_parameterized());
        assert!(StandardGate::Rx(Scalar::symbol("theta")).is_parameterized());
    }

    #[test]
    fn test_u_parameters() {
        let u = StandardGate::U(Scalar::real(1.0), Scalar::real(2.0), Scalar::symbol("l"));
        assert_eq!(u.parameters().len(), 3);
        assert!(u.is_parameterized());

        let bound = u.substitute(&[("l".to_string(), 3.0)].into_iter().collect());
        assert!(!bound.is_parameterized());
    }

    #[test]
    fn test_custom_gate() {
        let one = Complex64::new(1.0, 0.0);
        let zero = Complex64::new(0.0, 0.0);
        let custom = CustomGate::new("my_x", 1, vec![zero, one, one, zero])
            .unwrap()
            .with_params(vec![Scalar::real(PI / 4.0)]);

        assert_eq!(custom.name(), "my_x");
        assert_eq!(custom.num_qubits(), 1);
        assert_eq!(custom.params().len(), 1);
    }

    #[test]
    fn test_custom_gate_rejects_bad_matrix() {
        let one = Complex64::new(1.0, 0.0);
        let zero = Complex64::new(0.0, 0.0);

        let wrong_size = CustomGate::new("bad", 1, vec![one, zero, zero]);
        assert!(matches!(wrong_size, Err(IrError::MatrixDimension { .. })));

        let not_unitary = CustomGate::new("bad", 1, vec![one, one, zero, one]);
        assert!(matches!(not_unitary, Err(IrError::NotUnitary(_))));

        let too_wide = CustomGate::new("bad", 64, vec![one]);
        assert!(matches!(too_wide, Err(IrError::MatrixDimension { .. })));
    }

    #[test]
    fn test_custom_gate_deserialize_validates() {
        let json = r#"{"name":"my_x","num_qubits":1,"params":[],"matrix":[[0,0],[1,0],[1,0],[0,0]]}"#;
        let custom: CustomGate = serde_json::from_str(json).unwrap();
        assert_eq!(custom.matrix_entries()[1], Complex64::new(1.0, 0.0));

        let not_unitary =
            r#"{"name":"bad","num_qubits":1,"params":[],"matrix":[[1,0],[1,0],[0,0],[1,0]]}"#;
        assert!(serde_json::from_str::<CustomGate>(not_unitary).is_err());

        let wrong_size = r#"{"name":"bad","num_qubits":2,"params":[],"matrix":[[1,0]]}"#;
        assert!(serde_json::from_str::<CustomGate>(wrong_size).is_err());
    }
}
