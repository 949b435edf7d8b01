//! Benchmarks for Kvant circuit operations
//!
//! Run with: cargo bench -p kvant-ir

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use kvant_ir::{Circuit, Exponent, Operation, StandardGate, circuit_unitary, targets};
use std::f64::consts::PI;

/// Benchmark adding gates to a circuit
fn bench_gate_addition(c: &mut Criterion) {
    let mut group = c.benchmark_group("gate_addition");

    group.bench_function("h_gate", |b| {
        let mut circuit = Circuit::new("bench");
        b.iter(|| {
            circuit.h(black_box(1)).unwrap();
        });
    });

    group.bench_function("rx_gate", |b| {
        let mut circuit = Circuit::new("bench");
        b.iter(|| {
            circuit.rx(black_box(PI / 4.0), black_box(1)).unwrap();
        });
    });

    group.bench_function("cx_gate", |b| {
        let mut circuit = Circuit::new("bench");
        b.iter(|| {
            circuit.cx(black_box(1), black_box(2)).unwrap();
        });
    });

    group.finish();
}

/// Benchmark broadcasting a gate over a register
fn bench_broadcast(c: &mut Criterion) {
    let mut group = c.benchmark_group("broadcast");

    for n in [10usize, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("cx_register", n), &n, |b, &n| {
            b.iter(|| {
                let mut circuit = Circuit::new("broadcast");
                circuit
                    .push(Operation::cx(), targets![1..=n, (n + 1)..=(2 * n)])
                    .unwrap();
                circuit
            });
        });
    }

    group.finish();
}

/// Benchmark GHZ state circuit creation
fn bench_ghz_circuit(c: &mut Criterion) {
    let mut group = c.benchmark_group("ghz_circuit");

    for num_qubits in [3usize, 10, 50, 100] {
        group.bench_with_input(
            BenchmarkId::new("create", num_qubits),
            &num_qubits,
            |b, &n| {
                b.iter(|| Circuit::ghz(black_box(n)).unwrap());
            },
        );
    }

    group.finish();
}

/// Benchmark the modifier algebra and matrix synthesis
fn bench_modifiers(c: &mut Criterion) {
    let mut group = c.benchmark_group("modifiers");

    group.bench_function("control_flatten", |b| {
        b.iter(|| {
            (0..8).fold(Operation::Gate(StandardGate::X), |op, _| {
                op.control(black_box(1)).unwrap()
            })
        });
    });

    group.bench_function("sqrt_h_matrix", |b| {
        let op = Operation::Gate(StandardGate::H)
            .power(Exponent::half())
            .unwrap();
        b.iter(|| black_box(&op).matrix().unwrap());
    });

    for n in [2usize, 4, 6] {
        group.bench_with_input(BenchmarkId::new("qft_unitary", n), &n, |b, &n| {
            let circuit = Circuit::qft(n).unwrap();
            b.iter(|| circuit_unitary(black_box(&circuit), n).unwrap());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_gate_addition,
    bench_broadcast,
    bench_ghz_circuit,
    bench_modifiers,
);
criterion_main!(benches);
