//! Elementary rewrite rules for primitive gates and known roots.
//!
//! Every rule is exact, including the global phase.

use std::f64::consts::{FRAC_PI_2, PI};

use kvant_ir::matrix::BRANCH_CUT_TOLERANCE;
use kvant_ir::{Exponent, Instruction, Operation, Scalar, StandardGate};

use crate::error::DecomposeResult;

fn gate(g: StandardGate, qubits: &[usize]) -> DecomposeResult<Instruction> {
    Ok(Instruction::gate(g, qubits.iter().copied())?)
}

fn op(o: Operation, qubits: &[usize]) -> DecomposeResult<Instruction> {
    Ok(Instruction::gate(o, qubits.iter().copied())?)
}

/// Rewrite a primitive gate into simpler gates.
///
/// Returns `None` for gates without a registered rule.
pub fn elementary(g: &StandardGate, qubits: &[usize]) -> DecomposeResult<Option<Vec<Instruction>>> {
    let rewrite = match g {
        StandardGate::Swap => {
            let (a, b) = (qubits[0], qubits[1]);
            vec![
                op(Operation::cx(), &[a, b])?,
                op(Operation::cx(), &[b, a])?,
                op(Operation::cx(), &[a, b])?,
            ]
        }
        StandardGate::ISwap => vec![
            gate(StandardGate::RXX(Scalar::real(-FRAC_PI_2)), qubits)?,
            gate(StandardGate::RYY(Scalar::real(-FRAC_PI_2)), qubits)?,
        ],
        StandardGate::RZZ(theta) => {
            let (a, b) = (qubits[0], qubits[1]);
            vec![
                op(Operation::cx(), &[a, b])?,
                gate(StandardGate::Rz(theta.clone()), &[b])?,
                op(Operation::cx(), &[a, b])?,
            ]
        }
        StandardGate::RXX(theta) => {
            let (a, b) = (qubits[0], qubits[1]);
            vec![
                gate(StandardGate::H, &[a])?,
                gate(StandardGate::H, &[b])?,
                gate(StandardGate::RZZ(theta.clone()), &[a, b])?,
                gate(StandardGate::H, &[a])?,
                gate(StandardGate::H, &[b])?,
            ]
        }
        StandardGate::RYY(theta) => {
            let (a, b) = (qubits[0], qubits[1]);
            vec![
                op(Operation::sdg(), &[a])?,
                op(Operation::sdg(), &[b])?,
                gate(StandardGate::H, &[a])?,
                gate(StandardGate::H, &[b])?,
                gate(StandardGate::RZZ(theta.clone()), &[a, b])?,
                gate(StandardGate::H, &[a])?,
                gate(StandardGate::H, &[b])?,
                gate(StandardGate::S, &[a])?,
                gate(StandardGate::S, &[b])?,
            ]
        }
        StandardGate::U(theta, phi, lambda) => vec![
            gate(StandardGate::P(lambda.clone()), qubits)?,
            gate(StandardGate::Ry(theta.clone()), qubits)?,
            gate(StandardGate::P(phi.clone()), qubits)?,
        ],
        _ => return Ok(None),
    };
    Ok(Some(rewrite))
}

/// Angle of a rotation whose principal power just scales the angle.
///
/// The eigenvalues of `Rx`, `Ry`, `Rz` and the two-qubit rotations are
/// `e^{±iθ/2}`, so scaling is exact while `|θ| < 2π`. Matrix powers move
/// arguments within [`BRANCH_CUT_TOLERANCE`] of `-π` onto `+π`, so that band
/// is excluded as well.
fn rotation_angle(theta: &Scalar) -> Option<f64> {
    let value = theta.as_real()?;
    (value.abs() < 2.0 * (PI - BRANCH_CUT_TOLERANCE)).then_some(value)
}

/// Phase of `P(λ)` whose principal power just scales it: `-π < λ ≤ π`, minus
/// the branch-cut band.
fn phase_angle(lambda: &Scalar) -> Option<f64> {
    let value = lambda.as_real()?;
    (value > -PI + BRANCH_CUT_TOLERANCE && value <= PI).then_some(value)
}

/// A primitive gate equal to `g^p`, if one is known.
pub fn known_root(g: &StandardGate, exponent: &Exponent) -> Option<StandardGate> {
    let p = exponent.as_f64();
    let rotation = |theta: &Scalar| rotation_angle(theta).map(|t| Scalar::real(p * t));
    let ratio = exponent.as_ratio().map(|r| (*r.numer(), *r.denom()));

    match (g, ratio) {
        (StandardGate::I, _) => Some(StandardGate::I),
        (StandardGate::X, Some((1, 2))) => Some(StandardGate::SX),
        (StandardGate::Z, Some((1, 2))) => Some(StandardGate::S),
        (StandardGate::Z, Some((1, 4))) => Some(StandardGate::T),
        (StandardGate::S, Some((1, 2))) => Some(StandardGate::T),
        (StandardGate::Rx(t), _) => rotation(t).map(StandardGate::Rx),
        (StandardGate::Ry(t), _) => rotation(t).map(StandardGate::Ry),
        (StandardGate::Rz(t), _) => rotation(t).map(StandardGate::Rz),
        (StandardGate::RXX(t), _) => rotation(t).map(StandardGate::RXX),
        (StandardGate::RYY(t), _) => rotation(t).map(StandardGate::RYY),
        (StandardGate::RZZ(t), _) => rotation(t).map(StandardGate::RZZ),
        (StandardGate::P(l), _) => phase_angle(l).map(|l| StandardGate::P(Scalar::real(p * l))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_rule() {
        let rewrite = elementary(&StandardGate::Swap, &[0, 3]).unwrap().unwrap();
        assert_eq!(rewrite.len(), 3);
        assert_eq!(rewrite[1].qubits(), &[3, 0]);
        assert!(rewrite.iter().all(|i| i.operation() == &Operation::cx()));
    }

    #[test]
    fn test_symbolic_angle_is_kept() {
        let rzz = StandardGate::RZZ(Scalar::symbol("theta"));
        let rewrite = elementary(&rzz, &[0, 1]).unwrap().unwrap();
        assert!(rewrite[1].operation().is_symbolic());
        assert_eq!(rewrite[1].qubits(), &[1]);
    }

    #[test]
    fn test_no_rule_for_leaf() {
        assert!(elementary(&StandardGate::H, &[0]).unwrap().is_none());
        assert!(elementary(&StandardGate::Rx(Scalar::real(0.1)), &[0]).unwrap().is_none());
    }

    #[test]
    fn test_known_roots() {
        let half = Exponent::half();
        assert_eq!(known_root(&StandardGate::X, &half), Some(StandardGate::SX));
        assert_eq!(known_root(&StandardGate::S, &half), Some(StandardGate::T));
        assert_eq!(known_root(&StandardGate::H, &half), None);
        assert_eq!(
            known_root(&StandardGate::Z, &Exponent::rational(1, 4).unwrap()),
            Some(StandardGate::T)
        );
    }

    #[test]
    fn test_rotation_roots_need_principal_angle() {
        let third = Exponent::rational(1, 3).unwrap();
        assert_eq!(
            known_root(&StandardGate::Rz(Scalar::real(1.0)), &Exponent::half()),
            Some(StandardGate::Rz(Scalar::real(0.5)))
        );
        assert_eq!(known_root(&StandardGate::Rz(Scalar::real(7.0)), &third), None);
        assert_eq!(known_root(&StandardGate::P(Scalar::real(-PI)), &third), None);
        assert_eq!(known_root(&StandardGate::Rz(Scalar::symbol("a")), &third), None);
    }

    #[test]
    fn test_roots_near_branch_cut_are_refused() {
        let half = Exponent::half();
        let near_cut = -2.0 * PI + 1e-10;
        assert_eq!(known_root(&StandardGate::Rz(Scalar::real(near_cut)), &half), None);
        assert_eq!(known_root(&StandardGate::RZZ(Scalar::real(-near_cut)), &half), None);
        assert_eq!(known_root(&StandardGate::P(Scalar::real(-PI + 1e-10)), &half), None);

        let inside = -2.0 * PI + 1e-6;
        assert!(known_root(&StandardGate::Rz(Scalar::real(inside)), &half).is_some());
        assert_eq!(
            known_root(&StandardGate::P(Scalar::real(PI)), &half),
            Some(StandardGate::P(Scalar::real(PI / 2.0)))
        );
    }
}
