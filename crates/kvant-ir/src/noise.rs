//! Single-qubit noise channels.
//!
//! Channels are mixed-unitary (or damping) processes. They may appear in a
//! circuit, but they are not unitary: they have no matrix, no inverse and no
//! power, and decomposition leaves them untouched.

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::scalar::{Bindings, Scalar};

/// A noise channel model.
///
/// The probability-like parameter of every model must lie in `[0, 1]`. The
/// check runs at construction and again after substitution, but only once the
/// parameter is concrete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NoiseChannelRepr")]
pub enum NoiseChannel {
    /// Depolarizing channel: with probability `p`, replaces the state
    /// with the maximally mixed state.
    Depolarizing {
        /// Error probability.
        p: Scalar,
    },

    /// Bit-flip channel: applies X with probability `p`.
    BitFlip {
        /// Flip probability.
        p: Scalar,
    },

    /// Phase-flip channel: applies Z with probability `p`.
    PhaseFlip {
        /// Flip probability.
        p: Scalar,
    },

    /// Amplitude damping: models energy relaxation (T1 decay).
    AmplitudeDamping {
        /// Damping parameter.
        gamma: Scalar,
    },

    /// Phase damping: models dephasing (T2 decay without energy loss).
    PhaseDamping {
        /// Dephasing parameter.
        gamma: Scalar,
    },
}

#[derive(Deserialize)]
enum NoiseChannelRepr {
    Depolarizing { p: Scalar },
    BitFlip { p: Scalar },
    PhaseFlip { p: Scalar },
    AmplitudeDamping { gamma: Scalar },
    PhaseDamping { gamma: Scalar },
}

impl TryFrom<NoiseChannelRepr> for NoiseChannel {
    type Error = IrError;

    fn try_from(repr: NoiseChannelRepr) -> IrResult<Self> {
        match repr {
            NoiseChannelRepr::Depolarizing { p } => NoiseChannel::depolarizing(p),
            NoiseChannelRepr::BitFlip { p } => NoiseChannel::bit_flip(p),
            NoiseChannelRepr::PhaseFlip { p } => NoiseChannel::phase_flip(p),
            NoiseChannelRepr::AmplitudeDamping { gamma } => NoiseChannel::amplitude_damping(gamma),
            NoiseChannelRepr::PhaseDamping { gamma } => NoiseChannel::phase_damping(gamma),
        }
    }
}

impl NoiseChannel {
    /// Depolarizing channel with error probability `p`.
    pub fn depolarizing(p: impl Into<Scalar>) -> IrResult<Self> {
        Self::checked(NoiseChannel::Depolarizing { p: p.into() })
    }

    /// Bit-flip channel with flip probability `p`.
    pub fn bit_flip(p: impl Into<Scalar>) -> IrResult<Self> {
        Self::checked(NoiseChannel::BitFlip { p: p.into() })
    }

    /// Phase-flip channel with flip probability `p`.
    pub fn phase_flip(p: impl Into<Scalar>) -> IrResult<Self> {
        Self::checked(NoiseChannel::PhaseFlip { p: p.into() })
    }

    /// Amplitude damping with parameter `gamma`.
    pub fn amplitude_damping(gamma: impl Into<Scalar>) -> IrResult<Self> {
        Self::checked(NoiseChannel::AmplitudeDamping {
            gamma: gamma.into(),
        })
    }

    /// Phase damping with parameter `gamma`.
    pub fn phase_damping(gamma: impl Into<Scalar>) -> IrResult<Self> {
        Self::checked(NoiseChannel::PhaseDamping {
            gamma: gamma.into(),
        })
    }

    fn checked(self) -> IrResult<Self> {
        self.validate()?;
        Ok(self)
    }

    /// Get a human-readable name for this channel.
    pub fn name(&self) -> &'static str {
        match self {
            NoiseChannel::Depolarizing { .. } => "depolarizing",
            NoiseChannel::BitFlip { .. } => "bit_flip",
            NoiseChannel::PhaseFlip { .. } => "phase_flip",
            NoiseChannel::AmplitudeDamping { .. } => "amplitude_damping",
            NoiseChannel::PhaseDamping { .. } => "phase_damping",
        }
    }

    /// The channel parameter.
    pub fn parameter(&self) -> &Scalar {
        match self {
            NoiseChannel::Depolarizing { p }
            | NoiseChannel::BitFlip { p }
            | NoiseChannel::PhaseFlip { p } => p,
            NoiseChannel::AmplitudeDamping { gamma } | NoiseChannel::PhaseDamping { gamma } => {
                gamma
            }
        }
    }

    fn parameter_name(&self) -> &'static str {
        match self {
            NoiseChannel::Depolarizing { .. }
            | NoiseChannel::BitFlip { .. }
            | NoiseChannel::PhaseFlip { .. } => "p",
            NoiseChannel::AmplitudeDamping { .. } | NoiseChannel::PhaseDamping { .. } => "gamma",
        }
    }

    /// Check the parameter range. Symbolic parameters are accepted as is.
    pub fn validate(&self) -> IrResult<()> {
        let param = self.parameter();
        if param.is_symbolic() {
            return Ok(());
        }
        match param.as_real() {
            Some(value) if (0.0..=1.0).contains(&value) => Ok(()),
            other => Err(IrError::OutOfRangeParameter {
                name: self.parameter_name(),
                value: other.unwrap_or(f64::NAN),
                min: 0.0,
                max: 1.0,
            }),
        }
    }

    /// Substitute symbols and re-check the parameter range.
    pub fn substitute(&self, bindings: &Bindings) -> IrResult<Self> {
        let p = self.parameter().substitute(bindings);
        let channel = match self {
            NoiseChannel::Depolarizing { .. } => NoiseChannel::Depolarizing { p },
            NoiseChannel::BitFlip { .. } => NoiseChannel::BitFlip { p },
            NoiseChannel::PhaseFlip { .. } => NoiseChannel::PhaseFlip { p },
            NoiseChannel::AmplitudeDamping { .. } => NoiseChannel::AmplitudeDamping { gamma: p },
            NoiseChannel::PhaseDamping { .. } => NoiseChannel::PhaseDamping { gamma: p },
        };
        channel.checked()
    }
}

impl std::fmt::Display for NoiseChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}({}={})",
            self.name(),
            self.parameter_name(),
            self.parameter()
        )
    }
}
