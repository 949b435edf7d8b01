//! Operations bound to target indices.

use std::fmt;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::operation::Operation;
use crate::scalar::Bindings;

/// An operation applied to concrete qubits, classical bits and z-registers.
///
/// Indices are stored 0-based. The target lists always match the arity of
/// the operation and contain no duplicates; indices may repeat across lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "InstructionRepr")]
pub struct Instruction {
    operation: Operation,
    qubits: Vec<usize>,
    bits: Vec<usize>,
    zvars: Vec<usize>,
}

#[derive(Deserialize)]
struct InstructionRepr {
    operation: Operation,
    qubits: Vec<usize>,
    bits: Vec<usize>,
    zvars: Vec<usize>,
}

impl TryFrom<InstructionRepr> for Instruction {
    type Error = IrError;

    fn try_from(repr: InstructionRepr) -> IrResult<Self> {
        Instruction::new(repr.operation, repr.qubits, repr.bits, repr.zvars)
    }
}

fn check_distinct(indices: &[usize], operation: &Operation) -> IrResult<()> {
    let mut seen = FxHashSet::default();
    for &index in indices {
        if !seen.insert(index) {
            return Err(IrError::invalid_target(
                index,
                "index appears twice in one target list",
                &operation.name(),
            ));
        }
    }
    Ok(())
}

impl Instruction {
    /// Create a validated instruction from 0-based target lists.
    pub fn new(
        operation: Operation,
        qubits: Vec<usize>,
        bits: Vec<usize>,
        zvars: Vec<usize>,
    ) -> IrResult<Self> {
        if let Operation::Operator(_) = operation {
            return Err(IrError::NonGateOperator(operation.name().into_owned()));
        }

        let arity = operation.arity();
        let got = qubits.len() + bits.len() + zvars.len();
        if qubits.len() != arity.qubits || bits.len() != arity.bits || zvars.len() != arity.zvars
        {
            return Err(IrError::ArityMismatch {
                gate_name: operation.name().into_owned(),
                expected: arity.total(),
                got,
            });
        }

        check_distinct(&qubits, &operation)?;
        check_distinct(&bits, &operation)?;
        check_distinct(&zvars, &operation)?;

        Ok(Self {
            operation,
            qubits,
            bits,
            zvars,
        })
    }

    /// Create a purely quantum instruction.
    pub fn gate(
        operation: impl Into<Operation>,
        qubits: impl IntoIterator<Item = usize>,
    ) -> IrResult<Self> {
        Self::new(operation.into(), qubits.into_iter().collect(), vec![], vec![])
    }

    /// The applied operation.
    #[inline]
    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    /// Qubit indices (0-based).
    #[inline]
    pub fn qubits(&self) -> &[usize] {
        &self.qubits
    }

    /// Classical bit indices (0-based).
    #[inline]
    pub fn bits(&self) -> &[usize] {
        &self.bits
    }

    /// Z-register indices (0-based).
    #[inline]
    pub fn zvars(&self) -> &[usize] {
        &self.zvars
    }

    /// Inverse of this instruction on the same targets.
    pub fn inverse(&self) -> IrResult<Self> {
        Ok(Self {
            operation: self.operation.clone().inverse()?,
            qubits: self.qubits.clone(),
            bits: self.bits.clone(),
            zvars: self.zvars.clone(),
        })
    }

    /// The same targets with every parameter substituted.
    pub fn substitute(&self, bindings: &Bindings) -> IrResult<Self> {
        Ok(Self {
            operation: self.operation.substitute(bindings)?,
            qubits: self.qubits.clone(),
            bits: self.bits.clone(),
            zvars: self.zvars.clone(),
        })
    }

    /// Check if this is a measurement.
    pub fn is_measure(&self) -> bool {
        matches!(self.operation, Operation::Measure)
    }

    /// Check if this is a barrier.
    pub fn is_barrier(&self) -> bool {
        matches!(self.operation, Operation::Barrier(_))
    }

    /// Check if this is a noise channel.
    pub fn is_noise_channel(&self) -> bool {
        matches!(self.operation, Operation::Channel(_))
    }

    /// Check if the operation is unitary.
    pub fn is_unitary(&self) -> bool {
        self.operation.is_unitary()
    }
}

/// Renders 1-based targets, e.g. `cx @ q1, q3`.
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ ", self.operation)?;
        let targets: Vec<String> = self
            .qubits
            .iter()
            .map(|q| format!("q{}", q + 1))
            .chain(self.bits.iter().map(|b| format!("c{}", b + 1)))
            .chain(self.zvars.iter().map(|z| format!("z{}", z + 1)))
            .collect();
        write!(f, "{}", targets.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::StandardGate;
    use crate::operation::Operator;

    #[test]
    fn test_gate_instruction() {
        let inst = Instruction::gate(StandardGate::H, [0]).unwrap();
        assert_eq!(inst.qubits(), &[0]);
        assert!(inst.bits().is_empty());
        assert!(inst.is_unitary());
    }

    #[test]
    fn test_measure_instruction() {
        let inst = Instruction::new(Operation::Measure, vec![2], vec![2], vec![]).unwrap();
        assert!(inst.is_measure());
        assert_eq!(inst.to_string(), "measure @ q3, c3");
    }

    #[test]
    fn test_arity_mismatch() {
        let err = Instruction::gate(Operation::cx(), [0]).unwrap_err();
        assert_eq!(
            err,
            IrError::ArityMismatch {
                gate_name: "cx".into(),
                expected: 2,
                got: 1,
            }
        );
    }

    #[test]
    fn test_duplicate_qubits() {
        let err = Instruction::gate(Operation::cx(), [1, 1]).unwrap_err();
        assert!(matches!(err, IrError::InvalidTarget { target: 1, .. }));
    }

    #[test]
    fn test_deserialize_validates_targets() {
        let inst = Instruction::gate(Operation::cx(), [0, 1]).unwrap();
        let json = serde_json::to_string(&inst).unwrap();
        assert_eq!(serde_json::from_str::<Instruction>(&json).unwrap(), inst);

        let duplicate = json.replace(r#""qubits":[0,1]"#, r#""qubits":[0,0]"#);
        assert_ne!(duplicate, json);
        assert!(serde_json::from_str::<Instruction>(&duplicate).is_err());

        let short = json.replace(r#""qubits":[0,1]"#, r#""qubits":[0]"#);
        assert!(serde_json::from_str::<Instruction>(&short).is_err());
    }

    #[test]
    fn test_operator_rejected() {
        let err = Instruction::gate(Operator::Projector0, [0]).unwrap_err();
        assert!(matches!(err, IrError::NonGateOperator(_)));
    }

    #[test]
    fn test_inverse_keeps_targets() {
        let inst = Instruction::gate(StandardGate::T, [4]).unwrap();
        let inv = inst.inverse().unwrap();
        assert_eq!(inv.operation(), &Operation::tdg());
        assert_eq!(inv.qubits(), &[4]);

        let measure = Instruction::new(Operation::Measure, vec![0], vec![0], vec![]).unwrap();
        assert!(matches!(
            measure.inverse(),
            Err(IrError::NonInvertible(_))
        ));
    }

    #[test]
    fn test_display() {
        let inst = Instruction::gate(Operation::cp(0.25), [0, 2]).unwrap();
        assert_eq!(inst.to_string(), "cp(0.25) @ q1, q3");
    }
}
