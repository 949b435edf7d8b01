//! Quantum circuit representation.

use std::ops::{Range, RangeInclusive};

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{IrError, IrResult};
use crate::gate::StandardGate;
use crate::instruction::Instruction;
use crate::operation::Operation;
use crate::scalar::{Bindings, Scalar};

/// One target group of a [`Circuit::push`] call, using 1-based indices.
///
/// A register with several indices broadcasts the operation over them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    /// A single index.
    Index(usize),
    /// A list of indices.
    Register(Vec<usize>),
}

impl Target {
    fn indices(&self) -> &[usize] {
        match self {
            Target::Index(i) => std::slice::from_ref(i),
            Target::Register(r) => r,
        }
    }
}

impl From<usize> for Target {
    fn from(index: usize) -> Self {
        Target::Index(index)
    }
}

impl From<Vec<usize>> for Target {
    fn from(indices: Vec<usize>) -> Self {
        Target::Register(indices)
    }
}

impl From<&[usize]> for Target {
    fn from(indices: &[usize]) -> Self {
        Target::Register(indices.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for Target {
    fn from(indices: [usize; N]) -> Self {
        Target::Register(indices.to_vec())
    }
}

impl From<Range<usize>> for Target {
    fn from(range: Range<usize>) -> Self {
        Target::Register(range.collect())
    }
}

impl From<RangeInclusive<usize>> for Target {
    fn from(range: RangeInclusive<usize>) -> Self {
        Target::Register(range.collect())
    }
}

/// Build a `Vec<Target>` from indices, arrays, vectors and ranges.
///
/// ```rust
/// use kvant_ir::{targets, Target};
///
/// let t = targets![1, [2, 3], 4..=5];
/// assert_eq!(t[0], Target::Index(1));
/// assert_eq!(t[2], Target::Register(vec![4, 5]));
/// ```
#[macro_export]
macro_rules! targets {
    ($($target:expr),* $(,)?) => {
        vec![$($crate::Target::from($target)),*]
    };
}

fn validate_group(group: &Target, operation: &Operation) -> IrResult<()> {
    let indices = group.indices();
    let name = operation.name();
    if indices.is_empty() {
        return Err(IrError::invalid_target(0, "empty target group", &name));
    }
    let mut seen = FxHashSet::default();
    for &index in indices {
        if index == 0 {
            return Err(IrError::invalid_target(0, "target indices start at 1", &name));
        }
        if !seen.insert(index) {
            return Err(IrError::invalid_target(
                index,
                "index appears twice in one target group",
                &name,
            ));
        }
    }
    Ok(())
}

/// Shift a 0-based target error back to the 1-based numbering of `push`.
fn one_based(err: IrError) -> IrError {
    match err {
        IrError::InvalidTarget {
            target,
            reason,
            gate_name,
        } => IrError::InvalidTarget {
            target: target + 1,
            reason,
            gate_name,
        },
        other => other,
    }
}

/// Validate target groups and broadcast `operation` over them.
///
/// Nothing is returned unless every resulting instruction is valid.
fn broadcast(operation: &Operation, targets: &[Target]) -> IrResult<Vec<Instruction>> {
    let arity = operation.arity();
    if targets.len() != arity.total() {
        return Err(IrError::ArityMismatch {
            gate_name: operation.name().into_owned(),
            expected: arity.total(),
            got: targets.len(),
        });
    }
    for group in targets {
        validate_group(group, operation)?;
    }

    let count = targets
        .iter()
        .map(|t| t.indices().len())
        .filter(|&len| len > 1)
        .min()
        .unwrap_or(1);

    let pick = |group: &Target, i: usize| {
        let indices = group.indices();
        if indices.len() == 1 {
            indices[0] - 1
        } else {
            indices[i] - 1
        }
    };

    let (qubit_groups, rest) = targets.split_at(arity.qubits);
    let (bit_groups, zvar_groups) = rest.split_at(arity.bits);

    (0..count)
        .map(|i| {
            Instruction::new(
                operation.clone(),
                qubit_groups.iter().map(|g| pick(g, i)).collect(),
                bit_groups.iter().map(|g| pick(g, i)).collect(),
                zvar_groups.iter().map(|g| pick(g, i)).collect(),
            )
            .map_err(one_based)
        })
        .collect()
}

/// An ordered sequence of instructions.
///
/// Circuits only grow through validated mutators. Targets passed to
/// [`Circuit::push`] and the gate shortcuts are 1-based; instructions store
/// them 0-based.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    /// Name of the circuit.
    name: String,
    /// Instructions in application order.
    instructions: Vec<Instruction>,
}

impl Circuit {
    /// Create a new empty circuit.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: Vec::new(),
        }
    }

    // =========================================================================
    // Mutators
    // =========================================================================

    /// Append `operation` on the given target groups, broadcasting over
    /// registers.
    ///
    /// The groups are qubit groups first, then bit groups, then z-register
    /// groups. Registers of length greater than one are zipped, stopping at
    /// the shortest; single indices are reused by every instruction.
    pub fn push(
        &mut self,
        operation: impl Into<Operation>,
        targets: Vec<Target>,
    ) -> IrResult<&mut Self> {
        let operation = operation.into();
        let new = broadcast(&operation, &targets)?;
        trace!(
            operation = %operation.name(),
            count = new.len(),
            "push"
        );
        self.instructions.extend(new);
        Ok(self)
    }

    /// Insert `operation` at `position`, broadcasting like [`Circuit::push`].
    pub fn insert(
        &mut self,
        position: usize,
        operation: impl Into<Operation>,
        targets: Vec<Target>,
    ) -> IrResult<&mut Self> {
        if position > self.instructions.len() {
            return Err(IrError::InvalidPosition {
                position,
                len: self.instructions.len(),
            });
        }
        let operation = operation.into();
        let new = broadcast(&operation, &targets)?;
        trace!(
            operation = %operation.name(),
            position,
            count = new.len(),
            "insert"
        );
        self.instructions.splice(position..position, new);
        Ok(self)
    }

    /// Append all instructions of `other`.
    pub fn append(&mut self, other: &Circuit) -> &mut Self {
        self.instructions.extend(other.instructions.iter().cloned());
        self
    }

    /// Append an already validated instruction.
    pub fn push_instruction(&mut self, instruction: Instruction) -> &mut Self {
        self.instructions.push(instruction);
        self
    }

    /// Remove and return the instruction at `position`.
    pub fn remove(&mut self, position: usize) -> IrResult<Instruction> {
        if position >= self.instructions.len() {
            return Err(IrError::InvalidPosition {
                position,
                len: self.instructions.len(),
            });
        }
        Ok(self.instructions.remove(position))
    }

    // =========================================================================
    // Gate shortcuts
    // =========================================================================

    fn push_gate(&mut self, gate: StandardGate, targets: Vec<Target>) -> IrResult<&mut Self> {
        self.push(Operation::Gate(gate), targets)
    }

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: impl Into<Target>) -> IrResult<&mut Self> {
        self.push_gate(StandardGate::H, vec![qubit.into()])
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, qubit: impl Into<Target>) -> IrResult<&mut Self> {
        self.push_gate(StandardGate::X, vec![qubit.into()])
    }

    /// Apply Pauli-Y gate.
    pub fn y(&mut self, qubit: impl Into<Target>) -> IrResult<&mut Self> {
        self.push_gate(StandardGate::Y, vec![qubit.into()])
    }

    /// Apply Pauli-Z gate.
    pub fn z(&mut self, qubit: impl Into<Target>) -> IrResult<&mut Self> {
        self.push_gate(StandardGate::Z, vec![qubit.into()])
    }

    /// Apply S gate.
    pub fn s(&mut self, qubit: impl Into<Target>) -> IrResult<&mut Self> {
        self.push_gate(StandardGate::S, vec![qubit.into()])
    }

    /// Apply S-dagger gate.
    pub fn sdg(&mut self, qubit: impl Into<Target>) -> IrResult<&mut Self> {
        self.push(Operation::sdg(), vec![qubit.into()])
    }

    /// Apply T gate.
    pub fn t(&mut self, qubit: impl Into<Target>) -> IrResult<&mut Self> {
        self.push_gate(StandardGate::T, vec![qubit.into()])
    }

    /// Apply T-dagger gate.
    pub fn tdg(&mut self, qubit: impl Into<Target>) -> IrResult<&mut Self> {
        self.push(Operation::tdg(), vec![qubit.into()])
    }

    /// Apply sqrt(X) gate.
    pub fn sx(&mut self, qubit: impl Into<Target>) -> IrResult<&mut Self> {
        self.push_gate(StandardGate::SX, vec![qubit.into()])
    }

    /// Apply Rx rotation gate.
    pub fn rx(
        &mut self,
        theta: impl Into<Scalar>,
        qubit: impl Into<Target>,
    ) -> IrResult<&mut Self> {
        self.push_gate(StandardGate::Rx(theta.into()), vec![qubit.into()])
    }

    /// Apply Ry rotation gate.
    pub fn ry(
        &mut self,
        theta: impl Into<Scalar>,
        qubit: impl Into<Target>,
    ) -> IrResult<&mut Self> {
        self.push_gate(StandardGate::Ry(theta.into()), vec![qubit.into()])
    }

    /// Apply Rz rotation gate.
    pub fn rz(
        &mut self,
        theta: impl Into<Scalar>,
        qubit: impl Into<Target>,
    ) -> IrResult<&mut Self> {
        self.push_gate(StandardGate::Rz(theta.into()), vec![qubit.into()])
    }

    /// Apply phase gate.
    pub fn p(
        &mut self,
        lambda: impl Into<Scalar>,
        qubit: impl Into<Target>,
    ) -> IrResult<&mut Self> {
        self.push_gate(StandardGate::P(lambda.into()), vec![qubit.into()])
    }

    /// Apply CNOT (CX) gate.
    pub fn cx(
        &mut self,
        control: impl Into<Target>,
        target: impl Into<Target>,
    ) -> IrResult<&mut Self> {
        self.push(Operation::cx(), vec![control.into(), target.into()])
    }

    /// Apply CZ gate.
    pub fn cz(
        &mut self,
        control: impl Into<Target>,
        target: impl Into<Target>,
    ) -> IrResult<&mut Self> {
        self.push(Operation::cz(), vec![control.into(), target.into()])
    }

    /// Apply controlled-phase gate.
    pub fn cp(
        &mut self,
        lambda: impl Into<Scalar>,
        control: impl Into<Target>,
        target: impl Into<Target>,
    ) -> IrResult<&mut Self> {
        self.push(Operation::cp(lambda), vec![control.into(), target.into()])
    }

    /// Apply SWAP gate.
    pub fn swap(
        &mut self,
        q1: impl Into<Target>,
        q2: impl Into<Target>,
    ) -> IrResult<&mut Self> {
        self.push_gate(StandardGate::Swap, vec![q1.into(), q2.into()])
    }

    /// Apply Toffoli (CCX) gate.
    pub fn ccx(
        &mut self,
        c1: impl Into<Target>,
        c2: impl Into<Target>,
        target: impl Into<Target>,
    ) -> IrResult<&mut Self> {
        self.push(Operation::ccx(), vec![c1.into(), c2.into(), target.into()])
    }

    /// Measure a qubit into a classical bit.
    pub fn measure(
        &mut self,
        qubit: impl Into<Target>,
        bit: impl Into<Target>,
    ) -> IrResult<&mut Self> {
        self.push(Operation::Measure, vec![qubit.into(), bit.into()])
    }

    /// Reset a qubit to |0⟩.
    pub fn reset(&mut self, qubit: impl Into<Target>) -> IrResult<&mut Self> {
        self.push(Operation::Reset, vec![qubit.into()])
    }

    /// Apply a barrier over the given qubits.
    pub fn barrier(&mut self, qubits: impl IntoIterator<Item = usize>) -> IrResult<&mut Self> {
        let groups: Vec<Target> = qubits.into_iter().map(Target::Index).collect();
        self.push(Operation::Barrier(groups.len()), groups)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Get the circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of instructions.
    #[inline]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Check if the circuit has no instructions.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Instruction at `position`.
    pub fn get(&self, position: usize) -> Option<&Instruction> {
        self.instructions.get(position)
    }

    /// All instructions in order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Iterate over instructions in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }

    /// One more than the largest qubit index used, or 0.
    pub fn num_qubits(&self) -> usize {
        self.extent(Instruction::qubits)
    }

    /// One more than the largest classical bit index used, or 0.
    pub fn num_bits(&self) -> usize {
        self.extent(Instruction::bits)
    }

    /// One more than the largest z-register index used, or 0.
    pub fn num_zvars(&self) -> usize {
        self.extent(Instruction::zvars)
    }

    fn extent(&self, targets: fn(&Instruction) -> &[usize]) -> usize {
        self.instructions
            .iter()
            .flat_map(|inst| targets(inst).iter())
            .max()
            .map_or(0, |&max| max + 1)
    }

    /// Circuit depth over qubit and classical wires.
    ///
    /// Barriers synchronize their qubits without adding a layer.
    pub fn depth(&self) -> usize {
        let mut qubit_level = vec![0usize; self.num_qubits()];
        let mut bit_level = vec![0usize; self.num_bits()];
        let mut depth = 0;

        for inst in &self.instructions {
            let start = inst
                .qubits()
                .iter()
                .map(|&q| qubit_level[q])
                .chain(inst.bits().iter().map(|&b| bit_level[b]))
                .max()
                .unwrap_or(0);
            let level = if inst.is_barrier() { start } else { start + 1 };
            for &q in inst.qubits() {
                qubit_level[q] = level;
            }
            for &b in inst.bits() {
                bit_level[b] = level;
            }
            depth = depth.max(level);
        }
        depth
    }

    /// Check if any instruction has a symbolic parameter.
    pub fn is_symbolic(&self) -> bool {
        self.instructions
            .iter()
            .any(|inst| inst.operation().is_symbolic())
    }

    /// All free symbols in the circuit.
    pub fn symbols(&self) -> FxHashSet<String> {
        self.instructions
            .iter()
            .flat_map(|inst| inst.operation().parameters())
            .flat_map(Scalar::symbols)
            .collect()
    }

    /// Histogram of operation names.
    pub fn count_operations(&self) -> FxHashMap<String, usize> {
        let mut counts = FxHashMap::default();
        for inst in &self.instructions {
            *counts
                .entry(inst.operation().name().into_owned())
                .or_insert(0) += 1;
        }
        counts
    }

    // =========================================================================
    // Transformations
    // =========================================================================

    /// The inverse circuit: reversed order, every instruction inverted.
    pub fn inverse(&self) -> IrResult<Self> {
        let instructions = self
            .instructions
            .iter()
            .rev()
            .map(Instruction::inverse)
            .collect::<IrResult<Vec<_>>>()?;
        Ok(Self {
            name: self.name.clone(),
            instructions,
        })
    }

    /// A copy with symbols substituted in every instruction.
    pub fn substitute(&self, bindings: &Bindings) -> IrResult<Self> {
        let instructions = self
            .instructions
            .iter()
            .map(|inst| inst.substitute(bindings))
            .collect::<IrResult<Vec<_>>>()?;
        Ok(Self {
            name: self.name.clone(),
            instructions,
        })
    }

    // =========================================================================
    // Pre-built circuits
    // =========================================================================

    /// Create a Bell state circuit.
    pub fn bell() -> IrResult<Self> {
        let mut circuit = Self::new("bell");
        circuit.h(1)?.cx(1, 2)?.measure(1..=2, 1..=2)?;
        Ok(circuit)
    }

    /// Create a GHZ state circuit.
    pub fn ghz(n: usize) -> IrResult<Self> {
        let mut circuit = Self::new("ghz");
        if n == 0 {
            return Ok(circuit);
        }
        circuit.h(1)?;
        for i in 1..n {
            circuit.cx(i, i + 1)?;
        }
        circuit.measure(1..=n, 1..=n)?;
        Ok(circuit)
    }

    /// Create a QFT circuit (without measurements).
    #[allow(clippy::cast_precision_loss)]
    pub fn qft(n: usize) -> IrResult<Self> {
        use std::f64::consts::PI;

        let mut circuit = Self::new("qft");
        for i in 1..=n {
            circuit.h(i)?;
            for j in (i + 1)..=n {
                let angle = PI / (1u64 << (j - i)) as f64;
                circuit.cp(angle, j, i)?;
            }
        }
        for i in 1..=n / 2 {
            circuit.swap(i, n + 1 - i)?;
        }
        Ok(circuit)
    }
}

impl<'a> IntoIterator for &'a Circuit {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}

impl std::fmt::Display for Circuit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for inst in &self.instructions {
            writeln!(f, "{inst}")?;
        }
        Ok(())
    }
}
