//! Ledger configuration.

use std::path::Path;

use docchain_core::{attempt_ceiling, mining::MAX_DIFFICULTY, DEFAULT_DIFFICULTY, MINER};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

/// Default factor applied to the expected search space when bounding mining.
pub const DEFAULT_ATTEMPT_MULTIPLIER: u64 = 10;

/// Configuration for the Ledger.
///
/// Every field has a default, so a TOML file only needs the keys it changes:
///
/// ```toml
/// difficulty = 3
/// max_mining_attempts = 1000000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerConfig {
    /// Leading hex-zero characters required of every new block.
    pub difficulty: u32,
    /// Mining gives up after `attempt_multiplier * 16^difficulty` digests.
    pub attempt_multiplier: u64,
    /// Explicit attempt ceiling; takes precedence over the multiplier.
    pub max_mining_attempts: Option<u64>,
    /// Recorded as `miner` on new blocks.
    pub miner: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            attempt_multiplier: DEFAULT_ATTEMPT_MULTIPLIER,
            max_mining_attempts: None,
            miner: MINER.to_string(),
        }
    }
}

impl LedgerConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).map_err(|e| LedgerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| LedgerError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    pub fn with_difficulty(mut self, difficulty: u32) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_max_mining_attempts(mut self, attempts: u64) -> Self {
        self.max_mining_attempts = Some(attempts);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.difficulty > MAX_DIFFICULTY {
            return Err(LedgerError::Config(format!(
                "difficulty {} is out of range (0..={MAX_DIFFICULTY})",
                self.difficulty
            )));
        }
        if self.attempt_multiplier == 0 && self.max_mining_attempts.is_none() {
            return Err(LedgerError::Config(
                "attempt_multiplier must be positive".into(),
            ));
        }
        if self.miner.trim().is_empty() {
            return Err(LedgerError::Config("miner must not be empty".into()));
        }
        Ok(())
    }

    /// Attempt ceiling for mining a block at the configured difficulty.
    pub fn max_attempts(&self) -> u64 {
        self.max_mining_attempts
            .unwrap_or_else(|| attempt_ceiling(self.difficulty, self.attempt_multiplier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::default();
        assert_eq!(config.difficulty, 4);
        assert_eq!(config.miner, "DOCScoin-Audit-System");
        assert_eq!(config.max_attempts(), 655_360);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = LedgerConfig::from_toml_str("difficulty = 2\n").unwrap();
        assert_eq!(config.difficulty, 2);
        assert_eq!(config.attempt_multiplier, DEFAULT_ATTEMPT_MULTIPLIER);
        assert_eq!(config.max_attempts(), 2_560);
    }

    #[test]
    fn test_explicit_ceiling_wins() {
        let config = LedgerConfig::from_toml_str(
            "difficulty = 5\nattempt_multiplier = 3\nmax_mining_attempts = 7\n",
        )
        .unwrap();
        assert_eq!(config.max_attempts(), 7);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            LedgerConfig::from_toml_str("difficulty = 65"),
            Err(LedgerError::Config(_))
        ));
        assert!(matches!(
            LedgerConfig::from_toml_str("miner = \"  \""),
            Err(LedgerError::Config(_))
        ));
        assert!(matches!(
            LedgerConfig::from_toml_str("dificulty = 2"),
            Err(LedgerError::Config(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docchain.toml");
        std::fs::write(&path, "difficulty = 1\nminer = \"test-miner\"\n").unwrap();

        let config = LedgerConfig::load(&path).unwrap();
        assert_eq!(config.difficulty, 1);
        assert_eq!(config.miner, "test-miner");

        assert!(LedgerConfig::load(dir.path().join("missing.toml")).is_err());
    }
}
