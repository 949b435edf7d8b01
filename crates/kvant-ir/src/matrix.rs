//! Dense matrices of operations and circuits.
//!
//! Qubit ordering is big-endian: the first target of an operation is the most
//! significant bit of the basis index.

use std::f64::consts::{FRAC_1_SQRT_2, PI};

use nalgebra::DMatrix;
use nalgebra::linalg::Schur;
use ndarray::{Array2, array, linalg::kron, s};
use num_complex::Complex64;

use crate::circuit::Circuit;
use crate::error::{IrError, IrResult};
use crate::gate::StandardGate;
use crate::operation::{Exponent, Operation, Operator, Pauli};
use crate::scalar::Scalar;

/// A dense complex matrix.
pub type Matrix = Array2<Complex64>;

/// Tolerance for floating point comparisons.
const EPSILON: f64 = 1e-10;

/// Arguments this close to -π are taken as +π (principal branch).
pub const BRANCH_CUT_TOLERANCE: f64 = 1e-9;

const SCHUR_EPSILON: f64 = 1e-14;
const SCHUR_MAX_ITERATIONS: usize = 10_000;

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);
const I: Complex64 = Complex64::new(0.0, 1.0);

#[inline]
fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

/// The `dim` x `dim` identity.
pub fn identity(dim: usize) -> Matrix {
    Matrix::eye(dim)
}

/// Conjugate transpose.
pub fn adjoint(m: &Matrix) -> Matrix {
    m.t().mapv(|z| z.conj())
}

/// Kronecker product `a ⊗ b`.
pub fn tensor(a: &Matrix, b: &Matrix) -> Matrix {
    kron(a, b)
}

/// Identity with `u` in the bottom-right block, for `num_controls` controls.
pub fn control_matrix(num_controls: usize, u: &Matrix) -> Matrix {
    let dim = u.nrows() << num_controls;
    let offset = dim - u.nrows();
    let mut m = identity(dim);
    m.slice_mut(s![offset.., offset..]).assign(u);
    m
}

/// Check two matrices for element-wise equality within `tolerance`.
pub fn approx_eq(a: &Matrix, b: &Matrix, tolerance: f64) -> bool {
    a.dim() == b.dim() && a.iter().zip(b.iter()).all(|(x, y)| (x - y).norm() < tolerance)
}

/// Check that a row-major `dim` x `dim` matrix is unitary.
pub fn is_unitary_row_major(entries: &[Complex64], dim: usize) -> bool {
    if entries.len() != dim * dim {
        return false;
    }
    for i in 0..dim {
        for j in 0..dim {
            let dot: Complex64 = (0..dim)
                .map(|k| entries[i * dim + k] * entries[j * dim + k].conj())
                .sum();
            let expected = if i == j { ONE } else { ZERO };
            if (dot - expected).norm() > 1e-8 {
                return false;
            }
        }
    }
    true
}

fn concrete_angle(param: &Scalar, gate: &StandardGate) -> IrResult<f64> {
    match param {
        Scalar::Symbolic(expr) => Err(IrError::UnboundParameter(expr.to_string())),
        Scalar::Concrete(_) => param
            .as_real()
            .ok_or_else(|| IrError::NotUnitary(gate.name().to_string())),
    }
}

/// Matrix of a primitive gate. Parameters must be concrete and real.
pub fn standard_gate_matrix(gate: &StandardGate) -> IrResult<Matrix> {
    let angle = |p: &Scalar| concrete_angle(p, gate);
    let m = match gate {
        StandardGate::I => identity(2),
        StandardGate::X => array![[ZERO, ONE], [ONE, ZERO]],
        StandardGate::Y => array![[ZERO, -I], [I, ZERO]],
        StandardGate::Z => array![[ONE, ZERO], [ZERO, -ONE]],
        StandardGate::H => {
            let h = c(FRAC_1_SQRT_2, 0.0);
            array![[h, h], [h, -h]]
        }
        StandardGate::S => array![[ONE, ZERO], [ZERO, I]],
        StandardGate::T => array![[ONE, ZERO], [ZERO, Complex64::from_polar(1.0, PI / 4.0)]],
        StandardGate::SX => {
            let p = c(0.5, 0.5);
            let m = c(0.5, -0.5);
            array![[p, m], [m, p]]
        }
        StandardGate::Rx(theta) => {
            let (sin, cos) = (angle(theta)? / 2.0).sin_cos();
            array![[c(cos, 0.0), c(0.0, -sin)], [c(0.0, -sin), c(cos, 0.0)]]
        }
        StandardGate::Ry(theta) => {
            let (sin, cos) = (angle(theta)? / 2.0).sin_cos();
            array![[c(cos, 0.0), c(-sin, 0.0)], [c(sin, 0.0), c(cos, 0.0)]]
        }
        StandardGate::Rz(theta) => {
            let half = angle(theta)? / 2.0;
            array![
                [Complex64::from_polar(1.0, -half), ZERO],
                [ZERO, Complex64::from_polar(1.0, half)]
            ]
        }
        StandardGate::P(lambda) => {
            array![[ONE, ZERO], [ZERO, Complex64::from_polar(1.0, angle(lambda)?)]]
        }
        StandardGate::U(theta, phi, lambda) => {
            let (sin, cos) = (angle(theta)? / 2.0).sin_cos();
            let phi = angle(phi)?;
            let lambda = angle(lambda)?;
            array![
                [c(cos, 0.0), -Complex64::from_polar(sin, lambda)],
                [
                    Complex64::from_polar(sin, phi),
                    Complex64::from_polar(cos, phi + lambda)
                ]
            ]
        }
        StandardGate::Swap => array![
            [ONE, ZERO, ZERO, ZERO],
            [ZERO, ZERO, ONE, ZERO],
            [ZERO, ONE, ZERO, ZERO],
            [ZERO, ZERO, ZERO, ONE]
        ],
        StandardGate::ISwap => array![
            [ONE, ZERO, ZERO, ZERO],
            [ZERO, ZERO, I, ZERO],
            [ZERO, I, ZERO, ZERO],
            [ZERO, ZERO, ZERO, ONE]
        ],
        StandardGate::RXX(theta) => {
            let (sin, cos) = (angle(theta)? / 2.0).sin_cos();
            let (cc, ms) = (c(cos, 0.0), c(0.0, -sin));
            array![
                [cc, ZERO, ZERO, ms],
                [ZERO, cc, ms, ZERO],
                [ZERO, ms, cc, ZERO],
                [ms, ZERO, ZERO, cc]
            ]
        }
        StandardGate::RYY(theta) => {
            let (sin, cos) = (angle(theta)? / 2.0).sin_cos();
            let (cc, ms, ps) = (c(cos, 0.0), c(0.0, -sin), c(0.0, sin));
            array![
                [cc, ZERO, ZERO, ps],
                [ZERO, cc, ms, ZERO],
                [ZERO, ms, cc, ZERO],
                [ps, ZERO, ZERO, cc]
            ]
        }
        StandardGate::RZZ(theta) => {
            let half = angle(theta)? / 2.0;
            let (even, odd) = (
                Complex64::from_polar(1.0, -half),
                Complex64::from_polar(1.0, half),
            );
            let mut m = Matrix::zeros((4, 4));
            for (i, phase) in [even, odd, odd, even].into_iter().enumerate() {
                m[[i, i]] = phase;
            }
            m
        }
    };
    Ok(m)
}

/// Matrix of a pure operator.
pub fn operator_matrix(operator: &Operator) -> Matrix {
    match operator {
        Operator::Projector0 => array![[ONE, ZERO], [ZERO, ZERO]],
        Operator::Projector1 => array![[ZERO, ZERO], [ZERO, ONE]],
        Operator::SigmaPlus => array![[ZERO, ONE], [ZERO, ZERO]],
        Operator::SigmaMinus => array![[ZERO, ZERO], [ONE, ZERO]],
        Operator::PauliString(paulis) => paulis
            .iter()
            .map(|p| pauli_matrix(*p))
            .fold(identity(1), |acc, m| kron(&acc, &m)),
    }
}

fn pauli_matrix(pauli: Pauli) -> Matrix {
    match pauli {
        Pauli::I => identity(2),
        Pauli::X => array![[ZERO, ONE], [ONE, ZERO]],
        Pauli::Y => array![[ZERO, -I], [I, ZERO]],
        Pauli::Z => array![[ONE, ZERO], [ZERO, -ONE]],
    }
}

/// Matrix of an operation.
///
/// Measurements, resets, barriers, noise channels and expectation values
/// have no matrix and fail with [`IrError::NotUnitary`].
pub fn operation_matrix(op: &Operation) -> IrResult<Matrix> {
    match op {
        Operation::Gate(g) => standard_gate_matrix(g),
        Operation::Custom(g) => {
            let dim = 1usize << g.num_qubits();
            Matrix::from_shape_vec((dim, dim), g.matrix_entries().to_vec()).map_err(|_| {
                IrError::MatrixDimension {
                    gate_name: g.name().to_string(),
                    expected: dim,
                    rows: g.matrix_entries().len() / dim,
                    cols: dim,
                }
            })
        }
        Operation::Control(ctrl) => Ok(control_matrix(
            ctrl.num_controls(),
            &operation_matrix(ctrl.wrapped())?,
        )),
        Operation::Power(p) => matrix_power(&operation_matrix(p.wrapped())?, &p.exponent()),
        Operation::Inverse(inv) => Ok(adjoint(&operation_matrix(inv.wrapped())?)),
        Operation::Parallel(par) => {
            let block = operation_matrix(par.wrapped())?;
            Ok((0..par.repeats()).fold(identity(1), |acc, _| kron(&acc, &block)))
        }
        Operation::Operator(o) => Ok(operator_matrix(o)),
        Operation::Measure
        | Operation::Reset
        | Operation::Barrier(_)
        | Operation::Channel(_)
        | Operation::ExpectationValue(_) => Err(IrError::NotUnitary(op.name().into_owned())),
    }
}

/// Raise a unitary to a non-negative power.
///
/// Integer exponents use repeated squaring. Other exponents take the principal
/// branch of every eigenvalue of a complex Schur decomposition.
pub fn matrix_power(u: &Matrix, exponent: &Exponent) -> IrResult<Matrix> {
    match exponent.as_integer() {
        Some(n) => Ok(integer_power(u, n)),
        None => fractional_power(u, exponent.as_f64()),
    }
}

fn integer_power(u: &Matrix, mut n: u32) -> Matrix {
    let mut result = identity(u.nrows());
    let mut base = u.clone();
    while n > 0 {
        if n & 1 == 1 {
            result = result.dot(&base);
        }
        n >>= 1;
        if n > 0 {
            base = base.dot(&base);
        }
    }
    result
}

fn principal_pow(z: Complex64, p: f64) -> Complex64 {
    let (r, mut theta) = z.to_polar();
    if (theta + PI).abs() < BRANCH_CUT_TOLERANCE {
        theta = PI;
    }
    Complex64::from_polar(r.powf(p), theta * p)
}

fn is_diagonal(m: &Matrix) -> bool {
    m.indexed_iter()
        .all(|((i, j), z)| i == j || z.norm() < EPSILON)
}

fn fractional_power(u: &Matrix, p: f64) -> IrResult<Matrix> {
    let n = u.nrows();
    if is_diagonal(u) {
        let mut out = Matrix::zeros((n, n));
        for i in 0..n {
            out[[i, i]] = principal_pow(u[[i, i]], p);
        }
        return Ok(out);
    }

    // U = Q T Q† with T upper triangular; T is diagonal for a normal U.
    let dense = DMatrix::from_fn(n, n, |i, j| u[[i, j]]);
    let (q, t) = Schur::try_new(dense, SCHUR_EPSILON, SCHUR_MAX_ITERATIONS)
        .ok_or(IrError::NoConvergence { dim: n })?
        .unpack();

    let powered = DMatrix::from_fn(n, n, |i, j| {
        if i == j {
            principal_pow(t[(i, i)], p)
        } else {
            ZERO
        }
    });
    let result = &q * powered * q.adjoint();
    Ok(Matrix::from_shape_fn((n, n), |(i, j)| result[(i, j)]))
}

/// Apply a `k`-qubit matrix to every column of `state` on `targets`.
fn apply_on_targets(state: &mut Matrix, gate: &Matrix, targets: &[usize], num_qubits: usize) {
    let dim = state.nrows();
    let local = gate.nrows();
    let k = targets.len();
    let masks: Vec<usize> = targets.iter().map(|t| 1 << (num_qubits - 1 - t)).collect();
    let target_mask: usize = masks.iter().sum();

    let mut indices = vec![0usize; local];
    let mut buffer = vec![ZERO; local];
    for base in (0..dim).filter(|b| b & target_mask == 0) {
        for (j, index) in indices.iter_mut().enumerate() {
            *index = base
                | masks
                    .iter()
                    .enumerate()
                    .filter(|(bit, _)| (j >> (k - 1 - bit)) & 1 == 1)
                    .map(|(_, mask)| mask)
                    .sum::<usize>();
        }
        for col in 0..state.ncols() {
            for (slot, &row) in buffer.iter_mut().zip(&indices) {
                *slot = state[[row, col]];
            }
            for (i, &row) in indices.iter().enumerate() {
                state[[row, col]] = (0..local).map(|j| gate[[i, j]] * buffer[j]).sum();
            }
        }
    }
}

/// Reconstruct the unitary of a circuit over `num_qubits` qubits.
///
/// Barriers act as identity. Any other non-unitary instruction fails with
/// [`IrError::NotUnitary`].
pub fn circuit_unitary(circuit: &Circuit, num_qubits: usize) -> IrResult<Matrix> {
    let mut unitary = identity(1 << num_qubits);
    for inst in circuit {
        if matches!(inst.operation(), Operation::Barrier(_)) {
            continue;
        }
        if let Some(&q) = inst.qubits().iter().find(|&&q| q >= num_qubits) {
            return Err(IrError::InvalidTarget {
                target: q + 1,
                reason: "qubit outside of the reconstructed register",
                gate_name: Some(inst.operation().name().into_owned()),
            });
        }
        let gate = operation_matrix(inst.operation())?;
        apply_on_targets(&mut unitary, &gate, inst.qubits(), num_qubits);
    }
    Ok(unitary)
}
