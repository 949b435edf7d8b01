//! Tests for circuit construction, broadcasting and the modifier algebra.

use kvant_ir::matrix::{approx_eq, identity, operation_matrix, tensor};
use kvant_ir::{
    Circuit, CustomGate, Exponent, IrError, NoiseChannel, Operation, OperationKind, Scalar,
    StandardGate, Target, circuit_unitary, targets,
};
use num_complex::Complex64;

fn gate(g: StandardGate) -> Operation {
    Operation::Gate(g)
}

// ---------------------------------------------------------------------------
// push / broadcast
// ---------------------------------------------------------------------------

#[test]
fn push_cx_register_with_shared_target() {
    let mut circuit = Circuit::new("t");
    circuit.push(Operation::cx(), targets![[1, 2], 3]).unwrap();

    let qubits: Vec<&[usize]> = circuit.iter().map(|inst| inst.qubits()).collect();
    assert_eq!(qubits, vec![&[0, 2][..], &[1, 2][..]]);
}

#[test]
fn push_x_on_range() {
    let mut circuit = Circuit::new("t");
    circuit.push(StandardGate::X, targets![1..=4]).unwrap();
    assert_eq!(circuit.len(), 4);
    assert_eq!(circuit.num_qubits(), 4);
}

#[test]
fn push_duplicate_leaves_circuit_unchanged() {
    let mut circuit = Circuit::new("t");
    circuit.x(1).unwrap();
    let before = circuit.clone();

    let err = circuit.push(Operation::cx(), targets![[1, 1], 2]).unwrap_err();
    assert!(matches!(err, IrError::InvalidTarget { .. }));
    assert_eq!(circuit, before);
}

#[test]
fn push_measure_broadcast_pairs_qubits_and_bits() {
    let mut circuit = Circuit::new("t");
    circuit.measure(1..=3, [4, 5, 6]).unwrap();

    assert_eq!(circuit.len(), 3);
    assert_eq!(circuit.num_bits(), 6);
    assert_eq!(circuit.get(2).unwrap().bits(), &[5]);
}

#[test]
fn push_barrier_over_all_qubits() {
    let mut circuit = Circuit::new("t");
    circuit.push(Operation::Barrier(3), targets![1, 2, 3]).unwrap();
    assert_eq!(circuit.len(), 1);
    assert_eq!(circuit.get(0).unwrap().qubits(), &[0, 1, 2]);
}

#[test]
fn push_channel_with_symbolic_probability() {
    let mut circuit = Circuit::new("t");
    let channel = NoiseChannel::depolarizing(Scalar::symbol("p")).unwrap();
    circuit.push(channel, vec![Target::Index(1)]).unwrap();

    let bad = circuit.substitute(&[("p".to_string(), 1.5)].into_iter().collect());
    assert!(matches!(bad, Err(IrError::OutOfRangeParameter { .. })));
}

#[test]
fn insert_splices_broadcast_block() {
    let mut circuit = Circuit::new("t");
    circuit.h(1).unwrap().h(2).unwrap();
    circuit.insert(1, StandardGate::Z, targets![1..=3]).unwrap();

    let names: Vec<String> = circuit
        .iter()
        .map(|inst| inst.operation().name().into_owned())
        .collect();
    assert_eq!(names, ["h", "z", "z", "z", "h"]);
}

// ---------------------------------------------------------------------------
// Modifier algebra
// ---------------------------------------------------------------------------

#[test]
fn control_of_control_matches_matrix() {
    let nested = gate(StandardGate::H)
        .control(1)
        .unwrap()
        .control(2)
        .unwrap();
    let flat = gate(StandardGate::H).control(3).unwrap();
    assert_eq!(nested, flat);
    assert!(approx_eq(
        &nested.matrix().unwrap(),
        &flat.matrix().unwrap(),
        1e-12
    ));
}

#[test]
fn wrapped_unwrapping_terminates() {
    let op = gate(StandardGate::S)
        .inverse()
        .unwrap()
        .power(Exponent::rational(1, 3).unwrap())
        .unwrap()
        .control(2)
        .unwrap();

    let mut kinds = vec![op.kind()];
    let mut current = &op;
    while let Some(inner) = current.wrapped() {
        kinds.push(inner.kind());
        current = inner;
    }
    assert_eq!(
        kinds,
        [
            OperationKind::Control,
            OperationKind::Power,
            OperationKind::Inverse,
            OperationKind::Gate
        ]
    );
}

#[test]
fn inverse_matrix_is_adjoint() {
    let u = gate(StandardGate::U(
        Scalar::real(0.7),
        Scalar::real(-0.2),
        Scalar::real(1.9),
    ));
    let product = u.matrix().unwrap().dot(&u.inverse().unwrap().matrix().unwrap());
    assert!(approx_eq(&product, &identity(2), 1e-12));
}

#[test]
fn custom_gate_controls() {
    let one = Complex64::new(1.0, 0.0);
    let zero = Complex64::new(0.0, 0.0);
    let my_x = CustomGate::new("my_x", 1, vec![zero, one, one, zero]).unwrap();
    let controlled = Operation::from(my_x).control(1).unwrap();

    assert_eq!(controlled.name(), "cmy_x");
    assert!(approx_eq(
        &controlled.matrix().unwrap(),
        &operation_matrix(&Operation::cx()).unwrap(),
        1e-12
    ));
}

#[test]
fn parallel_power_matches_tensor_of_roots() {
    let op = gate(StandardGate::X).parallel(2).unwrap().sqrt().unwrap();
    let sx = gate(StandardGate::SX).matrix().unwrap();
    assert!(approx_eq(&op.matrix().unwrap(), &tensor(&sx, &sx), 1e-10));
}

// ---------------------------------------------------------------------------
// Circuit transformations
// ---------------------------------------------------------------------------

#[test]
fn inverse_of_h_t() {
    let mut circuit = Circuit::new("t");
    circuit.h(1).unwrap().t(1).unwrap();
    let inv = circuit.inverse().unwrap();

    let ops: Vec<&Operation> = inv.iter().map(|inst| inst.operation()).collect();
    assert_eq!(
        ops,
        [
            &gate(StandardGate::T).inverse().unwrap(),
            &gate(StandardGate::H).inverse().unwrap()
        ]
    );
}

#[test]
fn circuit_times_inverse_is_identity() {
    let mut circuit = Circuit::new("t");
    circuit
        .h(1)
        .unwrap()
        .cx(1, 2)
        .unwrap()
        .rz(0.3, 2)
        .unwrap()
        .ccx(1, 2, 3)
        .unwrap();
    let mut round = circuit.clone();
    round.append(&circuit.inverse().unwrap());

    let u = circuit_unitary(&round, 3).unwrap();
    assert!(approx_eq(&u, &identity(8), 1e-10));
}

#[test]
fn count_operations_by_name() {
    let mut circuit = Circuit::ghz(4).unwrap();
    circuit.tdg(1).unwrap();
    let counts = circuit.count_operations();
    assert_eq!(counts["h"], 1);
    assert_eq!(counts["cx"], 3);
    assert_eq!(counts["measure"], 4);
    assert_eq!(counts["tdg"], 1);
}

#[test]
fn circuit_serialization_roundtrip() {
    let circuit = Circuit::qft(3).unwrap();
    let json = serde_json::to_string(&circuit).unwrap();
    let back: Circuit = serde_json::from_str(&json).unwrap();
    assert_eq!(back, circuit);
}
