//! Circuit-level decomposition driver.

use kvant_ir::{Circuit, Instruction};
use tracing::{debug, info, instrument};

use crate::config::DecomposerConfig;
use crate::decompose::lower_instruction;
use crate::error::{DecomposeError, DecomposeResult};

/// Rewrites circuits level by level using a shared configuration.
#[derive(Debug, Clone, Default)]
pub struct Decomposer {
    config: DecomposerConfig,
}

impl Decomposer {
    /// Create a decomposer with the given configuration.
    pub fn new(config: DecomposerConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &DecomposerConfig {
        &self.config
    }

    /// Decompose a single instruction one level.
    pub fn decompose_instruction(&self, instruction: &Instruction) -> DecomposeResult<Circuit> {
        let mut out = Circuit::new("decomposed");
        lower_instruction(&mut out, instruction, &self.config.ancillae)?;
        Ok(out)
    }

    /// Decompose every instruction of `circuit` one level.
    pub fn decompose_circuit(&self, circuit: &Circuit) -> DecomposeResult<Circuit> {
        self.pass(circuit).map(|(out, _)| out)
    }

    /// Repeat [`Self::decompose_circuit`] until no instruction changes.
    ///
    /// Fails with [`DecomposeError::PassLimit`] if the circuit is still
    /// changing after `max_passes` passes.
    #[instrument(skip(self, circuit), fields(circuit = circuit.name()))]
    pub fn decompose_until_fixed(&self, circuit: &Circuit) -> DecomposeResult<Circuit> {
        info!(
            "Decomposing circuit with {} instructions, at most {} passes",
            circuit.len(),
            self.config.max_passes
        );

        let mut current = circuit.clone();
        for pass in 1..=self.config.max_passes {
            let (next, changed) = self.pass(&current)?;
            debug!("Pass {pass}: {changed} instructions rewritten, {} total", next.len());
            if changed == 0 {
                info!("Decomposition reached a fixed point after {pass} passes");
                return Ok(next);
            }
            current = next;
        }

        Err(DecomposeError::PassLimit {
            passes: self.config.max_passes,
        })
    }

    /// One pass; also returns the number of rewritten instructions.
    fn pass(&self, circuit: &Circuit) -> DecomposeResult<(Circuit, usize)> {
        let mut out = Circuit::new(circuit.name());
        let mut changed = 0;

        for instruction in circuit {
            let lowered = self.decompose_instruction(instruction)?;
            if !matches!(lowered.instructions(), [only] if only == instruction) {
                changed += 1;
            }
            out.append(&lowered);
        }

        Ok((out, changed))
    }
}
