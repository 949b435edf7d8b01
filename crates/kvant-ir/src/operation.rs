//! Operations and the modifier algebra.
//!
//! An [`Operation`] describes a quantum action with a fixed [`Arity`]. Leaf
//! gates, custom matrices and non-unitary operations are the atoms; the four
//! modifiers ([`Control`], [`Power`], [`Inverse`], [`Parallel`]) wrap another
//! operation.
//!
//! Modifiers are only built through the smart constructors on [`Operation`],
//! which validate their input and simplify nested modifiers once, at
//! construction:
//!
//! | Input | Result |
//! |-------|--------|
//! | `inverse(Inverse(x))` | `x` |
//! | `control(a, Control(b, x))` | `Control(a + b, x)` |
//! | `power(Power(x, p), q)` | `Power(x, p * q)` |
//! | `power(x, 1)` | `x` |
//! | `inverse(Control(n, x))` | `Control(n, inverse(x))` |
//! | `power(Control(n, x), p)` | `Control(n, power(x, p))` |
//! | `inverse(Parallel(n, x))` | `Parallel(n, inverse(x))` |
//! | `power(Parallel(n, x), p)` | `Parallel(n, power(x, p))` |
//! | `parallel(a, Parallel(b, x))` | `Parallel(a * b, x)` |
//! | `inverse(Barrier(n))` | `Barrier(n)` |

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use ndarray::Array2;
use num_complex::Complex64;
use num_rational::{Ratio, Rational64};
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::gate::{CustomGate, StandardGate};
use crate::noise::NoiseChannel;
use crate::scalar::{Bindings, Scalar};

/// Number of qubits, classical bits and z-registers an operation acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Arity {
    /// Number of qubits (N).
    pub qubits: usize,
    /// Number of classical bits (M).
    pub bits: usize,
    /// Number of z-registers (L).
    pub zvars: usize,
}

impl Arity {
    /// Arity of a purely quantum operation.
    pub const fn qubits(n: usize) -> Self {
        Self {
            qubits: n,
            bits: 0,
            zvars: 0,
        }
    }

    /// Total number of target groups.
    pub const fn total(&self) -> usize {
        self.qubits + self.bits + self.zvars
    }
}

/// Exponent of a [`Power`] modifier.
///
/// Always finite and non-negative. Rational exponents multiply exactly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ExponentRepr")]
pub enum Exponent {
    /// Exact rational exponent.
    Rational(Rational64),
    /// Floating-point exponent.
    Real(f64),
}

#[derive(Deserialize)]
enum ExponentRepr {
    Rational(Rational64),
    Real(f64),
}

impl TryFrom<ExponentRepr> for Exponent {
    type Error = IrError;

    fn try_from(repr: ExponentRepr) -> IrResult<Self> {
        match repr {
            ExponentRepr::Rational(r) => Exponent::rational(*r.numer(), *r.denom()),
            ExponentRepr::Real(v) => Exponent::real(v),
        }
    }
}

impl Exponent {
    /// An integer exponent.
    pub fn integer(value: u32) -> Self {
        Exponent::Rational(Rational64::from_integer(i64::from(value)))
    }

    /// A rational exponent `numer / denom`.
    ///
    /// Fails on a zero denominator, a negative value, or a reduced ratio that
    /// does not fit in `i64`.
    pub fn rational(numer: i64, denom: i64) -> IrResult<Self> {
        if denom == 0 {
            return Err(IrError::InvalidExponent(f64::INFINITY));
        }
        // Reduce in i128 so that sign normalization of i64::MIN cannot overflow.
        let wide = Ratio::<i128>::new(i128::from(numer), i128::from(denom));
        #[allow(clippy::cast_precision_loss)]
        let value = *wide.numer() as f64 / *wide.denom() as f64;
        if *wide.numer() < 0 {
            return Err(IrError::InvalidExponent(value));
        }
        match (i64::try_from(*wide.numer()), i64::try_from(*wide.denom())) {
            (Ok(n), Ok(d)) => Ok(Exponent::Rational(Rational64::new_raw(n, d))),
            _ => Err(IrError::InvalidExponent(value)),
        }
    }

    /// A real exponent.
    pub fn real(value: f64) -> IrResult<Self> {
        if !value.is_finite() || value < 0.0 {
            return Err(IrError::InvalidExponent(value));
        }
        Ok(Exponent::Real(value))
    }

    /// The exponent ½.
    pub fn half() -> Self {
        Exponent::Rational(Rational64::new(1, 2))
    }

    /// The exponent as a floating-point number.
    pub fn as_f64(&self) -> f64 {
        match self {
            Exponent::Rational(r) => ratio_to_f64(*r),
            Exponent::Real(v) => *v,
        }
    }

    /// The exponent as an integer, if it is one.
    pub fn as_integer(&self) -> Option<u32> {
        match self {
            Exponent::Rational(r) if r.is_integer() => u32::try_from(r.to_integer()).ok(),
            Exponent::Real(v) if v.fract() == 0.0 && *v <= f64::from(u32::MAX) => {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                Some(*v as u32)
            }
            _ => None,
        }
    }

    /// The exponent as an exact ratio, if it is rational.
    pub fn as_ratio(&self) -> Option<Rational64> {
        match self {
            Exponent::Rational(r) => Some(*r),
            Exponent::Real(_) => None,
        }
    }

    /// Check if this is the exponent 1.
    pub fn is_one(&self) -> bool {
        match self {
            Exponent::Rational(r) => *r == Rational64::from_integer(1),
            Exponent::Real(v) => *v == 1.0,
        }
    }

    /// Product of two exponents. Exact when both are rational and the
    /// product does not overflow.
    #[must_use]
    pub fn mul(&self, other: &Exponent) -> Exponent {
        if let (Exponent::Rational(a), Exponent::Rational(b)) = (self, other) {
            let numer = i128::from(*a.numer()) * i128::from(*b.numer());
            let denom = i128::from(*a.denom()) * i128::from(*b.denom());
            if let (Ok(n), Ok(d)) = (i64::try_from(numer), i64::try_from(denom)) {
                return Exponent::Rational(Rational64::new(n, d));
            }
        }
        Exponent::Real(self.as_f64() * other.as_f64())
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio_to_f64(r: Rational64) -> f64 {
    *r.numer() as f64 / *r.denom() as f64
}

impl From<u32> for Exponent {
    fn from(value: u32) -> Self {
        Exponent::integer(value)
    }
}

impl fmt::Display for Exponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exponent::Rational(r) if r.is_integer() => write!(f, "{}", r.numer()),
            Exponent::Rational(r) => write!(f, "{}/{}", r.numer(), r.denom()),
            Exponent::Real(v) => write!(f, "{v}"),
        }
    }
}

/// A single-qubit Pauli matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pauli {
    /// Identity.
    I,
    /// Pauli-X.
    X,
    /// Pauli-Y.
    Y,
    /// Pauli-Z.
    Z,
}

impl Pauli {
    fn symbol(self) -> char {
        match self {
            Pauli::I => 'I',
            Pauli::X => 'X',
            Pauli::Y => 'Y',
            Pauli::Z => 'Z',
        }
    }

    /// The equivalent standard gate.
    pub fn gate(self) -> StandardGate {
        match self {
            Pauli::I => StandardGate::I,
            Pauli::X => StandardGate::X,
            Pauli::Y => StandardGate::Y,
            Pauli::Z => StandardGate::Z,
        }
    }
}

/// A pure mathematical operator.
///
/// Operators have a matrix but are not gates: they cannot be pushed onto a
/// circuit directly, only used inside an [`ExpectationValue`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "OperatorRepr")]
pub enum Operator {
    /// Projector |0⟩⟨0|.
    Projector0,
    /// Projector |1⟩⟨1|.
    Projector1,
    /// Raising operator |0⟩⟨1|.
    SigmaPlus,
    /// Lowering operator |1⟩⟨0|.
    SigmaMinus,
    /// Tensor product of Pauli matrices, first factor on the first qubit.
    PauliString(Vec<Pauli>),
}

#[derive(Deserialize)]
enum OperatorRepr {
    Projector0,
    Projector1,
    SigmaPlus,
    SigmaMinus,
    PauliString(Vec<Pauli>),
}

impl TryFrom<OperatorRepr> for Operator {
    type Error = IrError;

    fn try_from(repr: OperatorRepr) -> IrResult<Self> {
        Ok(match repr {
            OperatorRepr::Projector0 => Operator::Projector0,
            OperatorRepr::Projector1 => Operator::Projector1,
            OperatorRepr::SigmaPlus => Operator::SigmaPlus,
            OperatorRepr::SigmaMinus => Operator::SigmaMinus,
            OperatorRepr::PauliString(paulis) => Operator::pauli_string(paulis)?,
        })
    }
}

impl Operator {
    /// Build a Pauli string operator. The string must not be empty.
    pub fn pauli_string(paulis: impl IntoIterator<Item = Pauli>) -> IrResult<Self> {
        let paulis: Vec<Pauli> = paulis.into_iter().collect();
        if paulis.is_empty() {
            return Err(IrError::InvalidOperator(
                "Pauli string must act on at least one qubit".into(),
            ));
        }
        Ok(Operator::PauliString(paulis))
    }

    /// Number of qubits this operator acts on.
    pub fn num_qubits(&self) -> usize {
        match self {
            Operator::PauliString(paulis) => paulis.len(),
            _ => 1,
        }
    }

    /// Operator name.
    pub fn name(&self) -> Cow<'static, str> {
        match self {
            Operator::Projector0 => Cow::Borrowed("proj0"),
            Operator::Projector1 => Cow::Borrowed("proj1"),
            Operator::SigmaPlus => Cow::Borrowed("sigma_plus"),
            Operator::SigmaMinus => Cow::Borrowed("sigma_minus"),
            Operator::PauliString(paulis) => {
                Cow::Owned(paulis.iter().map(|p| p.symbol()).collect())
            }
        }
    }
}

impl FromStr for Operator {
    type Err = IrError;

    /// Parse a Pauli string such as `"XZIY"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let paulis = s
            .chars()
            .map(|c| match c.to_ascii_uppercase() {
                'I' => Ok(Pauli::I),
                'X' => Ok(Pauli::X),
                'Y' => Ok(Pauli::Y),
                'Z' => Ok(Pauli::Z),
                other => Err(IrError::InvalidOperator(format!(
                    "'{other}' is not a Pauli symbol"
                ))),
            })
            .collect::<IrResult<Vec<_>>>()?;
        Operator::pauli_string(paulis)
    }
}

/// Control modifier: the first `num_controls` qubits control `wrapped`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ControlRepr")]
pub struct Control {
    num_controls: usize,
    wrapped: Box<Operation>,
}

#[derive(Deserialize)]
struct ControlRepr {
    num_controls: usize,
    wrapped: Box<Operation>,
}

impl TryFrom<ControlRepr> for Control {
    type Error = IrError;

    fn try_from(repr: ControlRepr) -> IrResult<Self> {
        if repr.num_controls == 0 {
            return Err(IrError::InvalidControls);
        }
        if !repr.wrapped.is_unitary() {
            return Err(IrError::NotUnitary(repr.wrapped.name().into_owned()));
        }
        Ok(Control {
            num_controls: repr.num_controls,
            wrapped: repr.wrapped,
        })
    }
}

impl Control {
    /// Number of control qubits.
    pub fn num_controls(&self) -> usize {
        self.num_controls
    }

    /// The controlled operation.
    pub fn wrapped(&self) -> &Operation {
        &self.wrapped
    }
}

/// Power modifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PowerRepr")]
pub struct Power {
    exponent: Exponent,
    wrapped: Box<Operation>,
}

#[derive(Deserialize)]
struct PowerRepr {
    exponent: Exponent,
    wrapped: Box<Operation>,
}

impl TryFrom<PowerRepr> for Power {
    type Error = IrError;

    fn try_from(repr: PowerRepr) -> IrResult<Self> {
        if !repr.wrapped.is_unitary() {
            return Err(IrError::NonExponentiable(repr.wrapped.name().into_owned()));
        }
        Ok(Power {
            exponent: repr.exponent,
            wrapped: repr.wrapped,
        })
    }
}

impl Power {
    /// The exponent.
    pub fn exponent(&self) -> Exponent {
        self.exponent
    }

    /// The exponentiated operation.
    pub fn wrapped(&self) -> &Operation {
        &self.wrapped
    }
}

/// Inverse (adjoint) modifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "InverseRepr")]
pub struct Inverse {
    wrapped: Box<Operation>,
}

#[derive(Deserialize)]
struct InverseRepr {
    wrapped: Box<Operation>,
}

impl TryFrom<InverseRepr> for Inverse {
    type Error = IrError;

    fn try_from(repr: InverseRepr) -> IrResult<Self> {
        if !repr.wrapped.is_unitary() {
            return Err(IrError::NonInvertible(repr.wrapped.name().into_owned()));
        }
        Ok(Inverse {
            wrapped: repr.wrapped,
        })
    }
}

impl Inverse {
    /// The inverted operation.
    pub fn wrapped(&self) -> &Operation {
        &self.wrapped
    }
}

/// Parallel modifier: `repeats` copies of `wrapped` on consecutive qubit blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ParallelRepr")]
pub struct Parallel {
    repeats: usize,
    wrapped: Box<Operation>,
}

#[derive(Deserialize)]
struct ParallelRepr {
    repeats: usize,
    wrapped: Box<Operation>,
}

impl TryFrom<ParallelRepr> for Parallel {
    type Error = IrError;

    fn try_from(repr: ParallelRepr) -> IrResult<Self> {
        if repr.repeats == 0 {
            return Err(IrError::InvalidRepeats);
        }
        if !repr.wrapped.is_unitary() {
            return Err(IrError::NotUnitary(repr.wrapped.name().into_owned()));
        }
        Ok(Parallel {
            repeats: repr.repeats,
            wrapped: repr.wrapped,
        })
    }
}

impl Parallel {
    /// Number of copies.
    pub fn repeats(&self) -> usize {
        self.repeats
    }

    /// The repeated operation.
    pub fn wrapped(&self) -> &Operation {
        &self.wrapped
    }
}

/// Expectation value of an operator, written to a z-register.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectationValue {
    operator: Operator,
}

impl ExpectationValue {
    /// The observed operator.
    pub fn operator(&self) -> &Operator {
        &self.operator
    }
}

/// Stable tag of every [`Operation`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    /// Primitive gate.
    Gate,
    /// Gate given by an explicit matrix.
    Custom,
    /// Control modifier.
    Control,
    /// Power modifier.
    Power,
    /// Inverse modifier.
    Inverse,
    /// Parallel modifier.
    Parallel,
    /// Measurement.
    Measure,
    /// Reset.
    Reset,
    /// Barrier.
    Barrier,
    /// Noise channel.
    Channel,
    /// Pure operator.
    Operator,
    /// Expectation value.
    ExpectationValue,
}

/// A quantum operation with fixed arity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    /// A primitive gate.
    Gate(StandardGate),
    /// A gate given by an explicit unitary matrix.
    Custom(CustomGate),
    /// Controlled operation.
    Control(Control),
    /// Operation raised to a power.
    Power(Power),
    /// Adjoint of an operation.
    Inverse(Inverse),
    /// Repeated operation on consecutive qubit blocks.
    Parallel(Parallel),
    /// Z-basis measurement of one qubit into one classical bit.
    Measure,
    /// Reset of one qubit to |0⟩.
    Reset,
    /// Barrier over the given number of qubits.
    Barrier(usize),
    /// Single-qubit noise channel.
    Channel(NoiseChannel),
    /// Pure operator, never pushable.
    Operator(Operator),
    /// Expectation value of an operator.
    ExpectationValue(ExpectationValue),
}

impl From<StandardGate> for Operation {
    fn from(gate: StandardGate) -> Self {
        Operation::Gate(gate)
    }
}

impl From<CustomGate> for Operation {
    fn from(gate: CustomGate) -> Self {
        Operation::Custom(gate)
    }
}

impl From<NoiseChannel> for Operation {
    fn from(channel: NoiseChannel) -> Self {
        Operation::Channel(channel)
    }
}

impl From<Operator> for Operation {
    fn from(operator: Operator) -> Self {
        Operation::Operator(operator)
    }
}

impl Operation {
    // =========================================================================
    // Named constructors
    // =========================================================================

    fn controlled_gate(num_controls: usize, gate: StandardGate) -> Self {
        Operation::Control(Control {
            num_controls,
            wrapped: Box::new(Operation::Gate(gate)),
        })
    }

    fn inverse_gate(gate: StandardGate) -> Self {
        Operation::Inverse(Inverse {
            wrapped: Box::new(Operation::Gate(gate)),
        })
    }

    /// CNOT, `Control(1, X)`.
    pub fn cx() -> Self {
        Self::controlled_gate(1, StandardGate::X)
    }

    /// Controlled-Y.
    pub fn cy() -> Self {
        Self::controlled_gate(1, StandardGate::Y)
    }

    /// Controlled-Z.
    pub fn cz() -> Self {
        Self::controlled_gate(1, StandardGate::Z)
    }

    /// Controlled-Hadamard.
    pub fn ch() -> Self {
        Self::controlled_gate(1, StandardGate::H)
    }

    /// Controlled phase.
    pub fn cp(lambda: impl Into<Scalar>) -> Self {
        Self::controlled_gate(1, StandardGate::P(lambda.into()))
    }

    /// Controlled Rx.
    pub fn crx(theta: impl Into<Scalar>) -> Self {
        Self::controlled_gate(1, StandardGate::Rx(theta.into()))
    }

    /// Controlled Ry.
    pub fn cry(theta: impl Into<Scalar>) -> Self {
        Self::controlled_gate(1, StandardGate::Ry(theta.into()))
    }

    /// Controlled Rz.
    pub fn crz(theta: impl Into<Scalar>) -> Self {
        Self::controlled_gate(1, StandardGate::Rz(theta.into()))
    }

    /// Toffoli, `Control(2, X)`.
    pub fn ccx() -> Self {
        Self::controlled_gate(2, StandardGate::X)
    }

    /// Fredkin, `Control(1, Swap)`.
    pub fn cswap() -> Self {
        Self::controlled_gate(1, StandardGate::Swap)
    }

    /// S-dagger, `Inverse(S)`.
    pub fn sdg() -> Self {
        Self::inverse_gate(StandardGate::S)
    }

    /// T-dagger, `Inverse(T)`.
    pub fn tdg() -> Self {
        Self::inverse_gate(StandardGate::T)
    }

    /// sqrt(X)-dagger, `Inverse(SX)`.
    pub fn sxdg() -> Self {
        Self::inverse_gate(StandardGate::SX)
    }

    /// Expectation value of `operator`.
    pub fn expectation_value(operator: Operator) -> Self {
        Operation::ExpectationValue(ExpectationValue { operator })
    }

    // =========================================================================
    // Modifier algebra
    // =========================================================================

    /// Add `num_controls` control qubits in front of this operation.
    pub fn control(self, num_controls: usize) -> IrResult<Self> {
        if num_controls == 0 {
            return Err(IrError::InvalidControls);
        }
        if !self.is_unitary() {
            return Err(IrError::NotUnitary(self.name().into_owned()));
        }
        Ok(match self {
            Operation::Control(inner) => Operation::Control(Control {
                num_controls: num_controls + inner.num_controls,
                wrapped: inner.wrapped,
            }),
            other => Operation::Control(Control {
                num_controls,
                wrapped: Box::new(other),
            }),
        })
    }

    /// Raise this operation to a non-negative power.
    pub fn power(self, exponent: Exponent) -> IrResult<Self> {
        if !self.is_unitary() {
            return Err(IrError::NonExponentiable(self.name().into_owned()));
        }
        if exponent.is_one() {
            return Ok(self);
        }
        Ok(match self {
            Operation::Power(inner) => (*inner.wrapped).power(inner.exponent.mul(&exponent))?,
            Operation::Control(inner) => Operation::Control(Control {
                num_controls: inner.num_controls,
                wrapped: Box::new((*inner.wrapped).power(exponent)?),
            }),
            Operation::Parallel(inner) => Operation::Parallel(Parallel {
                repeats: inner.repeats,
                wrapped: Box::new((*inner.wrapped).power(exponent)?),
            }),
            other => Operation::Power(Power {
                exponent,
                wrapped: Box::new(other),
            }),
        })
    }

    /// Shorthand for `power(1/2)`.
    pub fn sqrt(self) -> IrResult<Self> {
        self.power(Exponent::half())
    }

    /// The inverse (adjoint) of this operation.
    pub fn inverse(self) -> IrResult<Self> {
        if let Operation::Barrier(n) = self {
            return Ok(Operation::Barrier(n));
        }
        if !self.is_unitary() {
            return Err(IrError::NonInvertible(self.name().into_owned()));
        }
        Ok(match self {
            Operation::Inverse(inner) => *inner.wrapped,
            Operation::Control(inner) => Operation::Control(Control {
                num_controls: inner.num_controls,
                wrapped: Box::new((*inner.wrapped).inverse()?),
            }),
            Operation::Parallel(inner) => Operation::Parallel(Parallel {
                repeats: inner.repeats,
                wrapped: Box::new((*inner.wrapped).inverse()?),
            }),
            other => Operation::Inverse(Inverse {
                wrapped: Box::new(other),
            }),
        })
    }

    /// Repeat this operation on `repeats` consecutive qubit blocks.
    pub fn parallel(self, repeats: usize) -> IrResult<Self> {
        if repeats == 0 {
            return Err(IrError::InvalidRepeats);
        }
        if !self.is_unitary() {
            return Err(IrError::NotUnitary(self.name().into_owned()));
        }
        Ok(match self {
            Operation::Parallel(inner) => Operation::Parallel(Parallel {
                repeats: repeats * inner.repeats,
                wrapped: inner.wrapped,
            }),
            other => Operation::Parallel(Parallel {
                repeats,
                wrapped: Box::new(other),
            }),
        })
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// The variant tag of this operation.
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Gate(_) => OperationKind::Gate,
            Operation::Custom(_) => OperationKind::Custom,
            Operation::Control(_) => OperationKind::Control,
            Operation::Power(_) => OperationKind::Power,
            Operation::Inverse(_) => OperationKind::Inverse,
            Operation::Parallel(_) => OperationKind::Parallel,
            Operation::Measure => OperationKind::Measure,
            Operation::Reset => OperationKind::Reset,
            Operation::Barrier(_) => OperationKind::Barrier,
            Operation::Channel(_) => OperationKind::Channel,
            Operation::Operator(_) => OperationKind::Operator,
            Operation::ExpectationValue(_) => OperationKind::ExpectationValue,
        }
    }

    /// Conventional name of this operation (`cx`, `ccx`, `c3x`, `sdg`, ...).
    pub fn name(&self) -> Cow<'_, str> {
        match self {
            Operation::Gate(g) => Cow::Borrowed(g.name()),
            Operation::Custom(g) => Cow::Borrowed(g.name()),
            Operation::Control(c) => {
                let inner = c.wrapped.name();
                Cow::Owned(match c.num_controls {
                    1 => format!("c{inner}"),
                    2 => format!("cc{inner}"),
                    n => format!("c{n}{inner}"),
                })
            }
            Operation::Power(p) => Cow::Owned(format!("{}^{}", p.wrapped.name(), p.exponent)),
            Operation::Inverse(i) => match i.wrapped.as_ref() {
                Operation::Gate(g) => Cow::Owned(format!("{}dg", g.name())),
                other => Cow::Owned(format!("inv({})", other.name())),
            },
            Operation::Parallel(p) => {
                Cow::Owned(format!("parallel{}({})", p.repeats, p.wrapped.name()))
            }
            Operation::Measure => Cow::Borrowed("measure"),
            Operation::Reset => Cow::Borrowed("reset"),
            Operation::Barrier(_) => Cow::Borrowed("barrier"),
            Operation::Channel(c) => Cow::Borrowed(c.name()),
            Operation::Operator(o) => o.name(),
            Operation::ExpectationValue(e) => Cow::Owned(format!("expval({})", e.operator.name())),
        }
    }

    /// Number of qubits, bits and z-registers.
    pub fn arity(&self) -> Arity {
        match self {
            Operation::Gate(g) => Arity::qubits(g.num_qubits()),
            Operation::Custom(g) => Arity::qubits(g.num_qubits()),
            Operation::Control(c) => {
                let inner = c.wrapped.arity();
                Arity {
                    qubits: c.num_controls + inner.qubits,
                    ..inner
                }
            }
            Operation::Power(p) => p.wrapped.arity(),
            Operation::Inverse(i) => i.wrapped.arity(),
            Operation::Parallel(p) => Arity::qubits(p.repeats * p.wrapped.num_qubits()),
            Operation::Measure => Arity {
                qubits: 1,
                bits: 1,
                zvars: 0,
            },
            Operation::Reset | Operation::Channel(_) => Arity::qubits(1),
            Operation::Barrier(n) => Arity::qubits(*n),
            Operation::Operator(o) => Arity::qubits(o.num_qubits()),
            Operation::ExpectationValue(e) => Arity {
                qubits: e.operator.num_qubits(),
                bits: 0,
                zvars: 1,
            },
        }
    }

    /// Number of qubits (N).
    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.arity().qubits
    }

    /// Number of classical bits (M).
    #[inline]
    pub fn num_bits(&self) -> usize {
        self.arity().bits
    }

    /// Number of z-registers (L).
    #[inline]
    pub fn num_zvars(&self) -> usize {
        self.arity().zvars
    }

    /// Parameters of this operation. Modifiers expose the parameters of the
    /// wrapped operation; a power's exponent is not a parameter.
    pub fn parameters(&self) -> Vec<&Scalar> {
        match self {
            Operation::Gate(g) => g.parameters(),
            Operation::Custom(g) => g.params().iter().collect(),
            Operation::Control(c) => c.wrapped.parameters(),
            Operation::Power(p) => p.wrapped.parameters(),
            Operation::Inverse(i) => i.wrapped.parameters(),
            Operation::Parallel(p) => p.wrapped.parameters(),
            Operation::Channel(c) => vec![c.parameter()],
            Operation::Measure
            | Operation::Reset
            | Operation::Barrier(_)
            | Operation::Operator(_)
            | Operation::ExpectationValue(_) => vec![],
        }
    }

    /// Check if this operation is a unitary gate.
    pub fn is_unitary(&self) -> bool {
        match self {
            Operation::Gate(_) | Operation::Custom(_) => true,
            Operation::Control(c) => c.wrapped.is_unitary(),
            Operation::Power(p) => p.wrapped.is_unitary(),
            Operation::Inverse(i) => i.wrapped.is_unitary(),
            Operation::Parallel(p) => p.wrapped.is_unitary(),
            Operation::Measure
            | Operation::Reset
            | Operation::Barrier(_)
            | Operation::Channel(_)
            | Operation::Operator(_)
            | Operation::ExpectationValue(_) => false,
        }
    }

    /// Check if this is one of the four modifiers.
    pub fn is_modifier(&self) -> bool {
        self.wrapped().is_some()
    }

    /// Check if any parameter is still symbolic.
    pub fn is_symbolic(&self) -> bool {
        self.parameters().iter().any(|p| p.is_symbolic())
    }

    /// The operation immediately wrapped by a modifier.
    pub fn wrapped(&self) -> Option<&Operation> {
        match self {
            Operation::Control(c) => Some(&c.wrapped),
            Operation::Power(p) => Some(&p.wrapped),
            Operation::Inverse(i) => Some(&i.wrapped),
            Operation::Parallel(p) => Some(&p.wrapped),
            _ => None,
        }
    }

    /// The first non-modifier operation found by repeated unwrapping.
    pub fn innermost(&self) -> &Operation {
        let mut op = self;
        while let Some(inner) = op.wrapped() {
            op = inner;
        }
        op
    }

    /// Substitute symbols in every parameter.
    ///
    /// The modifier structure is kept as is. Noise channels re-check their
    /// probability once it becomes concrete.
    pub fn substitute(&self, bindings: &Bindings) -> IrResult<Self> {
        let sub = |op: &Operation| -> IrResult<Box<Operation>> { Ok(Box::new(op.substitute(bindings)?)) };
        Ok(match self {
            Operation::Gate(g) => Operation::Gate(g.substitute(bindings)),
            Operation::Custom(g) => {
                let params = g.params().iter().map(|p| p.substitute(bindings)).collect();
                Operation::Custom(g.clone().with_params(params))
            }
            Operation::Control(c) => Operation::Control(Control {
                num_controls: c.num_controls,
                wrapped: sub(&c.wrapped)?,
            }),
            Operation::Power(p) => Operation::Power(Power {
                exponent: p.exponent,
                wrapped: sub(&p.wrapped)?,
            }),
            Operation::Inverse(i) => Operation::Inverse(Inverse {
                wrapped: sub(&i.wrapped)?,
            }),
            Operation::Parallel(p) => Operation::Parallel(Parallel {
                repeats: p.repeats,
                wrapped: sub(&p.wrapped)?,
            }),
            Operation::Channel(c) => Operation::Channel(c.substitute(bindings)?),
            other => other.clone(),
        })
    }

    /// Dense matrix of this operation, big-endian over its qubits.
    pub fn matrix(&self) -> IrResult<Array2<Complex64>> {
        crate::matrix::operation_matrix(self)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())?;
        let params = self.parameters();
        if !params.is_empty() {
            let rendered: Vec<String> = params.iter().map(ToString::to_string).collect();
            write!(f, "({})", rendered.join(", "))?;
        }
        Ok(())
    }
}
