//! Decomposer configuration.

use serde::{Deserialize, Serialize};

/// Default limit for [`crate::Decomposer::decompose_until_fixed`].
pub const DEFAULT_MAX_PASSES: usize = 16;

/// Settings shared by every decomposition run of a [`crate::Decomposer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecomposerConfig {
    /// Spare qubits (0-based) that multi-controlled synthesis may borrow.
    ///
    /// Borrowed qubits are always returned to their original state, so they
    /// may hold live data. Qubits an instruction acts on are never borrowed
    /// for that instruction.
    pub ancillae: Vec<usize>,
    /// Maximum number of passes of the fix-point driver.
    pub max_passes: usize,
}

impl Default for DecomposerConfig {
    fn default() -> Self {
        Self {
            ancillae: Vec::new(),
            max_passes: DEFAULT_MAX_PASSES,
        }
    }
}

impl DecomposerConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the spare ancilla pool (0-based qubit indices).
    #[must_use]
    pub fn with_ancillae(mut self, ancillae: impl IntoIterator<Item = usize>) -> Self {
        self.ancillae = ancillae.into_iter().collect();
        self.ancillae.sort_unstable();
        self.ancillae.dedup();
        self
    }

    /// Set the maximum number of fix-point passes (at least 1).
    #[must_use]
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DecomposerConfig::default();
        assert!(config.ancillae.is_empty());
        assert_eq!(config.max_passes, DEFAULT_MAX_PASSES);
    }

    #[test]
    fn test_builder() {
        let config = DecomposerConfig::new()
            .with_ancillae([7, 5, 7])
            .with_max_passes(0);
        assert_eq!(config.ancillae, vec![5, 7]);
        assert_eq!(config.max_passes, 1);
    }

    #[test]
    fn test_partial_deserialization() {
        let config: DecomposerConfig = serde_json::from_str(r#"{"ancillae": [3]}"#).unwrap();
        assert_eq!(config.ancillae, vec![3]);
        assert_eq!(config.max_passes, DEFAULT_MAX_PASSES);
    }
}
