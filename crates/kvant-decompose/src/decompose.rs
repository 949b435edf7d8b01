//! Per-variant decomposition dispatch.
//!
//! All target indices here are 0-based, as stored in [`Instruction`].

use kvant_ir::{Circuit, Control, Instruction, IrError, Operation, Parallel, Power, StandardGate};
use rustc_hash::FxHashSet;

use crate::error::{DecomposeError, DecomposeResult};
use crate::mcx::{controlled_root, synthesize_mcx};
use crate::rules::{elementary, known_root};

/// Append the decomposition of `operation` on the given targets to `circuit`.
///
/// Equivalent to [`decompose_into`] with no spare ancillae.
pub fn decompose(
    circuit: &mut Circuit,
    operation: &Operation,
    qubits: &[usize],
    bits: &[usize],
    zvars: &[usize],
) -> DecomposeResult<()> {
    decompose_into(circuit, operation, qubits, bits, zvars, &[])
}

/// Append the decomposition of `operation` on the given targets to `circuit`,
/// borrowing qubits from `ancillae` for multi-controlled synthesis.
///
/// Ancillae that the operation itself acts on are ignored. Operations
/// without an applicable rule are appended unchanged.
pub fn decompose_into(
    circuit: &mut Circuit,
    operation: &Operation,
    qubits: &[usize],
    bits: &[usize],
    zvars: &[usize],
    ancillae: &[usize],
) -> DecomposeResult<()> {
    let instruction = Instruction::new(
        operation.clone(),
        qubits.to_vec(),
        bits.to_vec(),
        zvars.to_vec(),
    )?;
    lower_instruction(circuit, &instruction, ancillae)
}

/// Append the decomposition of an already validated instruction.
pub(crate) fn lower_instruction(
    circuit: &mut Circuit,
    instruction: &Instruction,
    ancillae: &[usize],
) -> DecomposeResult<()> {
    let used: FxHashSet<usize> = instruction.qubits().iter().copied().collect();
    let free: Vec<usize> = ancillae
        .iter()
        .copied()
        .filter(|a| !used.contains(a))
        .collect();
    lower(circuit, instruction, &free)
}

fn lower(circuit: &mut Circuit, instruction: &Instruction, free: &[usize]) -> DecomposeResult<()> {
    let qubits = instruction.qubits();
    match instruction.operation() {
        Operation::Gate(gate) => lower_gate(circuit, instruction, gate, free),
        Operation::Inverse(inverse) => lower_inverse(circuit, inverse.wrapped(), qubits, free),
        Operation::Parallel(parallel) => lower_parallel(circuit, parallel, qubits, free),
        Operation::Power(power) => lower_power(circuit, instruction, power, free),
        Operation::Control(control) => lower_control(circuit, instruction, control, free),
        _ => {
            circuit.push_instruction(instruction.clone());
            Ok(())
        }
    }
}

fn on(operation: &Operation, qubits: &[usize]) -> DecomposeResult<Instruction> {
    Ok(Instruction::gate(operation.clone(), qubits.iter().copied())?)
}

/// Decompose `operation` on `qubits` into a fresh circuit.
fn lower_scratch(operation: &Operation, qubits: &[usize], free: &[usize]) -> DecomposeResult<Circuit> {
    let mut scratch = Circuit::new("scratch");
    lower(&mut scratch, &on(operation, qubits)?, free)?;
    Ok(scratch)
}

/// Whether `scratch` is just `operation @ qubits` again.
fn is_unchanged(scratch: &Circuit, operation: &Operation, qubits: &[usize]) -> bool {
    matches!(
        scratch.instructions(),
        [only] if only.operation() == operation && only.qubits() == qubits
    )
}

fn not_decomposable(err: IrError) -> DecomposeError {
    match err {
        IrError::NonInvertible(name) | IrError::NotUnitary(name) | IrError::NonExponentiable(name) => {
            DecomposeError::NotDecomposable(name)
        }
        other => DecomposeError::Ir(other),
    }
}

// =============================================================================
// Variants
// =============================================================================

fn lower_gate(
    circuit: &mut Circuit,
    instruction: &Instruction,
    gate: &StandardGate,
    free: &[usize],
) -> DecomposeResult<()> {
    match elementary(gate, instruction.qubits())? {
        Some(rewrite) => {
            for inst in &rewrite {
                lower(circuit, inst, free)?;
            }
        }
        None => {
            circuit.push_instruction(instruction.clone());
        }
    }
    Ok(())
}

fn lower_inverse(
    circuit: &mut Circuit,
    wrapped: &Operation,
    qubits: &[usize],
    free: &[usize],
) -> DecomposeResult<()> {
    let scratch = lower_scratch(wrapped, qubits, free)?;
    for inst in scratch.iter().rev() {
        circuit.push_instruction(inst.inverse().map_err(not_decomposable)?);
    }
    Ok(())
}

fn lower_parallel(
    circuit: &mut Circuit,
    parallel: &Parallel,
    qubits: &[usize],
    free: &[usize],
) -> DecomposeResult<()> {
    let wrapped = parallel.wrapped();
    let width = wrapped.num_qubits();
    if width == 0 {
        return Err(DecomposeError::NotDecomposable(wrapped.name().into_owned()));
    }
    for block in qubits.chunks(width) {
        lower(circuit, &on(wrapped, block)?, free)?;
    }
    Ok(())
}

fn lower_power(
    circuit: &mut Circuit,
    instruction: &Instruction,
    power: &Power,
    free: &[usize],
) -> DecomposeResult<()> {
    let wrapped = power.wrapped();
    let exponent = power.exponent();
    let qubits = instruction.qubits();

    if let Some(times) = exponent.as_integer() {
        for _ in 0..times {
            lower(circuit, &on(wrapped, qubits)?, free)?;
        }
        return Ok(());
    }

    if let Operation::Gate(gate) = wrapped {
        if let Some(root) = known_root(gate, &exponent) {
            return lower(circuit, &on(&root.into(), qubits)?, free);
        }
    }

    let scratch = lower_scratch(wrapped, qubits, free)?;
    if let [only] = scratch.instructions() {
        if !is_unchanged(&scratch, wrapped, qubits) {
            let powered = only
                .operation()
                .clone()
                .power(exponent)
                .map_err(not_decomposable)?;
            return lower(circuit, &on(&powered, only.qubits())?, free);
        }
    }

    circuit.push_instruction(instruction.clone());
    Ok(())
}

fn lower_control(
    circuit: &mut Circuit,
    instruction: &Instruction,
    control: &Control,
    free: &[usize],
) -> DecomposeResult<()> {
    let n = control.num_controls();
    let wrapped = control.wrapped();
    let (controls, targets) = instruction.qubits().split_at(n);
    let single_target = wrapped.num_qubits() == 1;

    // C(A·B) = C(A)·C(B): control every gate of the wrapped decomposition.
    if !(single_target && n == 1) {
        let scratch = lower_scratch(wrapped, targets, free)?;
        if !is_unchanged(&scratch, wrapped, targets) {
            for inst in &scratch {
                let controlled = inst.operation().clone().control(n).map_err(not_decomposable)?;
                let qubits: Vec<usize> = controls.iter().chain(inst.qubits()).copied().collect();
                circuit.push_instruction(Instruction::gate(controlled, qubits)?);
            }
            return Ok(());
        }
    }

    if !single_target || n == 1 {
        circuit.push_instruction(instruction.clone());
        return Ok(());
    }

    let target = targets[0];
    if *wrapped == Operation::Gate(StandardGate::X) {
        synthesize_mcx(circuit, controls, target, free)
    } else {
        controlled_root(circuit, wrapped, controls, target, free)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvant_ir::matrix::approx_eq;
    use kvant_ir::{Exponent, Scalar, circuit_unitary};

    fn lowered(op: &Operation, qubits: &[usize]) -> Circuit {
        let mut circuit = Circuit::new("t");
        decompose(&mut circuit, op, qubits, &[], &[]).unwrap();
        circuit
    }

    fn names(circuit: &Circuit) -> Vec<String> {
        circuit
            .iter()
            .map(|inst| inst.operation().name().into_owned())
            .collect()
    }

    #[test]
    fn test_leaf_is_unchanged() {
        let h = Operation::Gate(StandardGate::H);
        let circuit = lowered(&h, &[2]);
        assert_eq!(circuit.len(), 1);
        assert_eq!(circuit.get(0).unwrap().operation(), &h);
        assert_eq!(circuit.get(0).unwrap().qubits(), &[2]);
    }

    #[test]
    fn test_arity_is_checked() {
        let mut circuit = Circuit::new("t");
        let err = decompose(&mut circuit, &Operation::cx(), &[0], &[], &[]).unwrap_err();
        assert!(matches!(err, DecomposeError::Ir(IrError::ArityMismatch { .. })));
        assert!(circuit.is_empty());
    }

    #[test]
    fn test_measure_passes_through() {
        let mut circuit = Circuit::new("t");
        decompose(&mut circuit, &Operation::Measure, &[1], &[0], &[]).unwrap();
        assert_eq!(circuit.len(), 1);
        assert!(circuit.get(0).unwrap().is_measure());
        assert_eq!(circuit.get(0).unwrap().bits(), &[0]);
    }

    #[test]
    fn test_iswap_recurses_to_cx() {
        let circuit = lowered(&StandardGate::ISwap.into(), &[0, 1]);
        assert!(circuit.iter().all(|i| i.operation().num_qubits() <= 2));
        assert!(names(&circuit).iter().all(|n| n != "rxx" && n != "ryy" && n != "rzz"));

        let expected = Operation::Gate(StandardGate::ISwap).matrix().unwrap();
        assert!(approx_eq(&circuit_unitary(&circuit, 2).unwrap(), &expected, 1e-10));
    }

    #[test]
    fn test_inverse_reverses_order() {
        let u = Operation::Gate(StandardGate::U(
            Scalar::real(0.3),
            Scalar::real(1.1),
            Scalar::real(-0.4),
        ));
        let circuit = lowered(&u.clone().inverse().unwrap(), &[0]);
        assert_eq!(names(&circuit), ["pdg", "rydg", "pdg"]);
        assert_eq!(
            circuit.get(0).unwrap().operation(),
            &Operation::Gate(StandardGate::P(Scalar::real(1.1)))
                .inverse()
                .unwrap()
        );

        let expected = u.inverse().unwrap().matrix().unwrap();
        assert!(approx_eq(&circuit_unitary(&circuit, 1).unwrap(), &expected, 1e-10));
    }

    #[test]
    fn test_integer_power_repeats() {
        let op = Operation::Gate(StandardGate::H)
            .power(Exponent::integer(3))
            .unwrap();
        let circuit = lowered(&op, &[0]);
        assert_eq!(names(&circuit), ["h", "h", "h"]);

        let zero = Operation::Gate(StandardGate::H)
            .power(Exponent::integer(0))
            .unwrap();
        assert!(lowered(&zero, &[0]).is_empty());
    }

    #[test]
    fn test_power_root_table() {
        let sqrt_x = Operation::Gate(StandardGate::X).sqrt().unwrap();
        assert_eq!(names(&lowered(&sqrt_x, &[0])), ["sx"]);

        let quarter_z = Operation::Gate(StandardGate::Z)
            .power(Exponent::rational(1, 4).unwrap())
            .unwrap();
        assert_eq!(names(&lowered(&quarter_z, &[0])), ["t"]);
    }

    #[test]
    fn test_power_without_rule_is_kept() {
        let op = Operation::Gate(StandardGate::H).sqrt().unwrap();
        let circuit = lowered(&op, &[0]);
        assert_eq!(circuit.len(), 1);
        assert_eq!(circuit.get(0).unwrap().operation(), &op);
    }

    #[test]
    fn test_parallel_blocks() {
        let op = Operation::Gate(StandardGate::Swap).parallel(2).unwrap();
        let circuit = lowered(&op, &[0, 1, 2, 3]);
        assert_eq!(circuit.len(), 6);
        assert_eq!(circuit.get(3).unwrap().qubits(), &[2, 3]);

        let expected = op.matrix().unwrap();
        assert!(approx_eq(&circuit_unitary(&circuit, 4).unwrap(), &expected, 1e-10));
    }

    #[test]
    fn test_control_of_multi_qubit_gate() {
        let circuit = lowered(&Operation::cswap(), &[0, 1, 2]);
        assert_eq!(names(&circuit), ["ccx", "ccx", "ccx"]);
        assert_eq!(circuit.get(1).unwrap().qubits(), &[0, 2, 1]);
    }

    #[test]
    fn test_single_control_is_terminal() {
        let ch = Operation::ch();
        let circuit = lowered(&ch, &[0, 1]);
        assert_eq!(circuit.len(), 1);
        assert_eq!(circuit.get(0).unwrap().operation(), &ch);
    }

    #[test]
    fn test_mcx_uses_ancillae() {
        let op = Operation::Gate(StandardGate::X).control(4).unwrap();
        let mut circuit = Circuit::new("t");
        decompose_into(&mut circuit, &op, &[0, 1, 2, 3, 4], &[], &[], &[5, 6, 2]).unwrap();
        assert_eq!(circuit.len(), 8);
        assert!(circuit.iter().all(|i| i.operation() == &Operation::ccx()));
    }
}
