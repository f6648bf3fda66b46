//! GenomeLayout — the fixed geometry shared by every genome in a population
//!
//! A layout pins the block length `L` (which fixes the seed base `L + 1`)
//! and the width of the four inheritance fields. Two genomes can only be
//! crossed or compared when their layouts match.

use super::GenomeError;
use serde::{Deserialize, Serialize};

/// Number of seed digits, blocks and fields in every genome
pub const DIGITS: usize = 4;

/// Largest supported block length (seed digits fit in a `u8`)
pub const MAX_BLOCK_LEN: u32 = 255;

/// Largest supported field width (four fields must fold into 128 bits)
pub const MAX_FIELD_SIZE: u32 = 32;

/// Block and field geometry for a genome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenomeLayout {
    /// Binary digits per block (`L`)
    pub block_len: u32,
    /// Bits per field
    pub field_size: u32,
}

impl Default for GenomeLayout {
    fn default() -> Self {
        Self {
            block_len: 8,
            field_size: 16,
        }
    }
}

impl GenomeLayout {
    /// Small genomes: base-5 seeds and byte-wide fields
    pub fn compact() -> Self {
        Self {
            block_len: 4,
            field_size: 8,
        }
    }

    /// Large genomes: base-17 seeds and 32-bit fields
    pub fn wide() -> Self {
        Self {
            block_len: 16,
            field_size: 32,
        }
    }

    /// Check that the layout can be encoded
    pub fn validate(&self) -> Result<(), GenomeError> {
        if self.block_len == 0 || self.block_len > MAX_BLOCK_LEN {
            return Err(GenomeError::InvalidLayout(format!(
                "block_len must be in 1..={}, got {}",
                MAX_BLOCK_LEN, self.block_len
            )));
        }
        if self.field_size == 0 || self.field_size > MAX_FIELD_SIZE {
            return Err(GenomeError::InvalidLayout(format!(
                "field_size must be in 1..={}, got {}",
                MAX_FIELD_SIZE, self.field_size
            )));
        }
        Ok(())
    }

    /// Seed digit base (`L + 1`)
    pub fn base(&self) -> u64 {
        u64::from(self.block_len) + 1
    }

    /// Largest valid seed (`base^4 - 1`)
    pub fn max_seed(&self) -> u64 {
        self.base().pow(DIGITS as u32) - 1
    }

    /// Mask selecting the low `field_size` bits
    pub fn field_mask(&self) -> u64 {
        (1u64 << self.field_size) - 1
    }

    /// Total number of binary digits across all blocks
    pub fn block_count(&self) -> usize {
        self.block_len as usize * DIGITS
    }

    /// Split a seed into its four base-`base` digits, least significant first
    pub fn digits(&self, seed: u64) -> [u32; DIGITS] {
        let base = self.base();
        let mut digits = [0u32; DIGITS];
        let mut rest = seed;
        for digit in digits.iter_mut() {
            *digit = (rest % base) as u32;
            rest /= base;
        }
        digits
    }
}
