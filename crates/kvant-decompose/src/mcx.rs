//! Multi-controlled gate synthesis.
//!
//! Three strategies are chosen from the number of controls `c` and the
//! number of borrowable qubits `a` (`total = c + 1 + a`):
//!
//! - enough dirty ancillae (`total >= 2c - 1`): the linear V-chain of
//!   `4(c - 2)` Toffolis (Barenco et al., Lemma 7.2);
//! - at least one ancilla: split the controls in two halves around one
//!   borrowed qubit (Lemma 7.3), each half again synthesized with the rest
//!   of the register as its pool;
//! - no ancilla: the square-root recursion (Lemma 7.5).
//!
//! Borrowed qubits may hold arbitrary data and are always restored.

use kvant_ir::{Circuit, Instruction, Operation, StandardGate};
use tracing::debug;

use crate::error::DecomposeResult;

fn push(circuit: &mut Circuit, op: Operation, qubits: &[usize]) -> DecomposeResult<()> {
    circuit.push_instruction(Instruction::gate(op, qubits.iter().copied())?);
    Ok(())
}

fn toffoli(circuit: &mut Circuit, a: usize, b: usize, target: usize) -> DecomposeResult<()> {
    push(circuit, Operation::ccx(), &[a, b, target])
}

/// Append a multi-controlled X on `controls → target` to `circuit`.
///
/// `free` lists qubits that may be borrowed as dirty ancillae. It must be
/// disjoint from `controls` and `target`. Every emitted gate acts only on
/// those qubits and has at most two controls, except for the square-root
/// recursion which emits singly-controlled roots of X.
pub fn synthesize_mcx(
    circuit: &mut Circuit,
    controls: &[usize],
    target: usize,
    free: &[usize],
) -> DecomposeResult<()> {
    let c = controls.len();
    let a = free.len();
    let total = c + 1 + a;

    match c {
        0 => return push(circuit, StandardGate::X.into(), &[target]),
        1 | 2 => {
            let mut qubits = controls.to_vec();
            qubits.push(target);
            return push(circuit, Operation::Gate(StandardGate::X).control(c)?, &qubits);
        }
        _ => {}
    }

    if total >= 2 * c - 1 {
        debug!("mcx: {c} controls, linear chain over {} ancillae", c - 2);
        linear_chain(circuit, controls, target, &free[..c - 2])
    } else if a > 0 {
        debug!("mcx: {c} controls, halving around qubit {}", free[0]);
        halving(circuit, controls, target, free)
    } else {
        debug!("mcx: {c} controls, square-root recursion");
        controlled_root(circuit, &Operation::Gate(StandardGate::X), controls, target, free)
    }
}

/// Linear chain with `controls.len() - 2` dirty ancillae.
fn linear_chain(
    circuit: &mut Circuit,
    controls: &[usize],
    target: usize,
    ancillae: &[usize],
) -> DecomposeResult<()> {
    let m = controls.len();
    // x_i = controls[i - 1], a_i = ancillae[i - 1]
    let x = |i: usize| controls[i - 1];
    let anc = |i: usize| ancillae[i - 1];

    let descend = |circuit: &mut Circuit| -> DecomposeResult<()> {
        for i in (3..m).rev() {
            toffoli(circuit, x(i), anc(i - 2), anc(i - 1))?;
        }
        Ok(())
    };
    let ascend = |circuit: &mut Circuit| -> DecomposeResult<()> {
        for i in 3..m {
            toffoli(circuit, x(i), anc(i - 2), anc(i - 1))?;
        }
        Ok(())
    };

    for _ in 0..2 {
        toffoli(circuit, x(m), anc(m - 2), target)?;
        descend(circuit)?;
        toffoli(circuit, x(1), x(2), anc(1))?;
        ascend(circuit)?;
    }
    Ok(())
}

/// Split the controls around one borrowed qubit.
fn halving(
    circuit: &mut Circuit,
    controls: &[usize],
    target: usize,
    free: &[usize],
) -> DecomposeResult<()> {
    let total = controls.len() + 1 + free.len();
    let k1 = total / 2;
    let borrowed = free[0];
    let rest = &free[1..];
    let (first, second) = controls.split_at(k1);

    let first_pool: Vec<usize> = second
        .iter()
        .copied()
        .chain(std::iter::once(target))
        .chain(rest.iter().copied())
        .collect();
    let second_controls: Vec<usize> = second
        .iter()
        .copied()
        .chain(std::iter::once(borrowed))
        .collect();
    let second_pool: Vec<usize> = first.iter().copied().chain(rest.iter().copied()).collect();

    for _ in 0..2 {
        synthesize_mcx(circuit, first, borrowed, &first_pool)?;
        synthesize_mcx(circuit, &second_controls, target, &second_pool)?;
    }
    Ok(())
}

/// Append `Control(controls.len(), wrapped)` using square roots of `wrapped`.
///
/// `wrapped` must be a single-qubit unitary and `controls` must hold at
/// least two qubits. The multi-controlled X gates in between borrow the
/// target and `free`.
pub fn controlled_root(
    circuit: &mut Circuit,
    wrapped: &Operation,
    controls: &[usize],
    target: usize,
    free: &[usize],
) -> DecomposeResult<()> {
    let Some((&last, rest)) = controls.split_last() else {
        return push(circuit, wrapped.clone(), &[target]);
    };
    if rest.is_empty() {
        return push(circuit, wrapped.clone().control(1)?, &[last, target]);
    }

    let root = wrapped.clone().sqrt()?;
    let root_dg = root.clone().inverse()?;
    let pool: Vec<usize> = std::iter::once(target).chain(free.iter().copied()).collect();

    push(circuit, root.clone().control(1)?, &[last, target])?;
    synthesize_mcx(circuit, rest, last, &pool)?;
    push(circuit, root_dg.control(1)?, &[last, target])?;
    synthesize_mcx(circuit, rest, last, &pool)?;

    if rest.len() == 1 {
        push(circuit, root.control(1)?, &[rest[0], target])
    } else {
        let widened: Vec<usize> = free.iter().copied().chain(std::iter::once(last)).collect();
        controlled_root(circuit, &root, rest, target, &widened)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvant_ir::matrix::{approx_eq, identity, tensor};
    use kvant_ir::{OperationKind, circuit_unitary};

    fn mcx_matrix(c: usize) -> kvant_ir::Matrix {
        Operation::Gate(StandardGate::X)
            .control(c)
            .unwrap()
            .matrix()
            .unwrap()
    }

    #[test]
    fn test_small_counts_are_primitive() {
        let mut circuit = Circuit::new("mcx");
        synthesize_mcx(&mut circuit, &[], 0, &[]).unwrap();
        synthesize_mcx(&mut circuit, &[0, 1], 2, &[]).unwrap();
        assert_eq!(circuit.len(), 2);
        assert_eq!(circuit.get(0).unwrap().operation(), &Operation::Gate(StandardGate::X));
        assert_eq!(circuit.get(1).unwrap().operation(), &Operation::ccx());
    }

    #[test]
    fn test_linear_chain_toffoli_count() {
        for c in 3..=6 {
            let controls: Vec<usize> = (0..c).collect();
            let free: Vec<usize> = (c + 1..2 * c - 1).collect();
            let mut circuit = Circuit::new("mcx");
            synthesize_mcx(&mut circuit, &controls, c, &free).unwrap();

            assert_eq!(circuit.len(), 4 * (c - 2));
            assert!(circuit.iter().all(|i| i.operation() == &Operation::ccx()));
        }
    }

    #[test]
    fn test_linear_chain_matrix() {
        // 4 controls on 0..4, target 4, dirty ancillae 5 and 6
        let mut circuit = Circuit::new("mcx");
        synthesize_mcx(&mut circuit, &[0, 1, 2, 3], 4, &[5, 6]).unwrap();

        let expected = tensor(&mcx_matrix(4), &identity(4));
        let actual = circuit_unitary(&circuit, 7).unwrap();
        assert!(approx_eq(&actual, &expected, 1e-10));
    }

    #[test]
    fn test_halving_matrix() {
        // 5 controls, one ancilla: total 7 < 9 forces the split
        let mut circuit = Circuit::new("mcx");
        synthesize_mcx(&mut circuit, &[0, 1, 2, 3, 4], 5, &[6]).unwrap();

        assert!(circuit.iter().all(|i| i.operation().num_qubits() <= 3));
        let expected = tensor(&mcx_matrix(5), &identity(2));
        let actual = circuit_unitary(&circuit, 7).unwrap();
        assert!(approx_eq(&actual, &expected, 1e-10));
    }

    #[test]
    fn test_root_recursion_without_ancillae() {
        let mut circuit = Circuit::new("mcx");
        synthesize_mcx(&mut circuit, &[0, 1, 2], 3, &[]).unwrap();

        assert!(
            circuit
                .iter()
                .any(|i| i.operation().wrapped().map(Operation::kind) == Some(OperationKind::Power))
        );
        let actual = circuit_unitary(&circuit, 4).unwrap();
        assert!(approx_eq(&actual, &mcx_matrix(3), 1e-10));
    }

    #[test]
    fn test_controlled_root_of_h() {
        let h = Operation::Gate(StandardGate::H);
        let mut circuit = Circuit::new("root");
        controlled_root(&mut circuit, &h, &[0, 1], 2, &[]).unwrap();

        let expected = h.control(2).unwrap().matrix().unwrap();
        let actual = circuit_unitary(&circuit, 3).unwrap();
        assert!(approx_eq(&actual, &expected, 1e-10));
    }
}
