//! FamilyConfig — how a family is bootstrapped
//!
//! Loaded from JSON by the CLI; every key is optional and falls back to the
//! defaults below.

use super::registry::FamilyError;
use super::DEFAULT_DEPTH_LIMIT;
use crate::genome::GenomeLayout;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Configuration for bootstrapping and inspecting a family
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FamilyConfig {
    /// Layout of founder genomes
    pub layout: GenomeLayout,
    /// Founders created at generation 0
    pub founders: usize,
    /// Offspring bred from the running pool
    pub offspring: usize,
    /// Recursion bound for ancestry rendering
    pub depth_limit: usize,
    /// Seed for the bootstrap generator; `None` draws from OS entropy
    pub rng_seed: Option<u64>,
}

impl Default for FamilyConfig {
    fn default() -> Self {
        Self {
            layout: GenomeLayout::default(),
            founders: 4,
            offspring: 10,
            depth_limit: DEFAULT_DEPTH_LIMIT,
            rng_seed: None,
        }
    }
}

impl FamilyConfig {
    /// Default config with a fixed generator seed (reproducible runs)
    pub fn seeded(rng_seed: u64) -> Self {
        Self {
            rng_seed: Some(rng_seed),
            ..Self::default()
        }
    }

    /// Parse a config from JSON; missing keys take their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check the layout and that offspring can actually be paired
    pub fn validate(&self) -> Result<(), FamilyError> {
        self.layout.validate()?;
        if self.offspring > 0 && self.founders < 2 {
            return Err(FamilyError::PoolTooSmall {
                needed: 2,
                available: self.founders,
            });
        }
        Ok(())
    }

    /// Generator threaded through `Family::bootstrap`
    pub fn rng(&self) -> ChaCha8Rng {
        match self.rng_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }
}
