//! Benchmarks for the decomposition engine
//!
//! Run with: cargo bench -p kvant-decompose

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use kvant_decompose::{Decomposer, DecomposerConfig, synthesize_mcx};
use kvant_ir::{Circuit, Instruction, Operation, StandardGate};

/// Benchmark the three multi-controlled X strategies
fn bench_mcx(c: &mut Criterion) {
    let mut group = c.benchmark_group("mcx");

    for controls in [4usize, 8, 16] {
        let qubits: Vec<usize> = (0..controls).collect();

        group.bench_with_input(BenchmarkId::new("linear", controls), &controls, |b, &n| {
            let free: Vec<usize> = (n + 1..2 * n).collect();
            b.iter(|| {
                let mut circuit = Circuit::new("mcx");
                synthesize_mcx(&mut circuit, black_box(&qubits), n, &free).unwrap();
                circuit
            });
        });

        group.bench_with_input(BenchmarkId::new("halving", controls), &controls, |b, &n| {
            b.iter(|| {
                let mut circuit = Circuit::new("mcx");
                synthesize_mcx(&mut circuit, black_box(&qubits), n, &[n + 1]).unwrap();
                circuit
            });
        });

        group.bench_with_input(BenchmarkId::new("root", controls), &controls, |b, &n| {
            b.iter(|| {
                let mut circuit = Circuit::new("mcx");
                synthesize_mcx(&mut circuit, black_box(&qubits), n, &[]).unwrap();
                circuit
            });
        });
    }

    group.finish();
}

/// Benchmark the fix-point driver on QFT circuits
fn bench_fixed_point(c: &mut Criterion) {
    let mut group = c.benchmark_group("fixed_point");
    let decomposer = Decomposer::default();

    for n in [5usize, 10, 20] {
        let circuit = Circuit::qft(n).unwrap();
        group.bench_with_input(BenchmarkId::new("qft", n), &circuit, |b, circuit| {
            b.iter(|| decomposer.decompose_until_fixed(black_box(circuit)).unwrap());
        });
    }

    let op = Operation::Gate(StandardGate::H).control(6).unwrap();
    let mut circuit = Circuit::new("c6h");
    circuit.push_instruction(Instruction::gate(op, 0..7).unwrap());
    let with_pool = Decomposer::new(DecomposerConfig::new().with_ancillae(7..12));
    group.bench_function("c6h_with_ancillae", |b| {
        b.iter(|| with_pool.decompose_until_fixed(black_box(&circuit)).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_mcx, bench_fixed_point);
criterion_main!(benches);
