//! Genome metrics — fitness proxy and pairwise distance
//!
//! Both are pure reads of the block and field layout; neither touches the
//! bitmask state.

use super::{Genome, GenomeError};

/// Weight of the normalised field distance
const FIELD_WEIGHT: f64 = 0.3;
/// Weight of the normalised block Hamming distance
const BLOCK_WEIGHT: f64 = 0.7;

impl Genome {
    /// Number of adjacent block bits that differ across the whole block array
    pub fn block_transitions(&self) -> u32 {
        self.blocks()
            .windows(2)
            .filter(|pair| pair[0] != pair[1])
            .count() as u32
    }

    /// Active bits plus local structure: `sum(blocks) + block_transitions()`
    pub fn fitness(&self) -> u32 {
        let active: u32 = self.blocks().iter().map(|b| u32::from(*b)).sum();
        active + self.block_transitions()
    }

    /// Weighted distance in `[0, 1]`:
    /// `0.3 * sum|fa - fb| / (4 * 2^fs) + 0.7 * differing_block_bits / (4L)`
    pub fn distance(&self, other: &Genome) -> Result<f64, GenomeError> {
        let layout = self.layout();
        if layout != other.layout() {
            return Err(GenomeError::LayoutMismatch {
                left: layout,
                right: other.layout(),
            });
        }

        let field_diff: u64 = self
            .fields()
            .iter()
            .zip(other.fields().iter())
            .map(|(a, b)| a.abs_diff(*b))
            .sum();
        let field_span = self.fields().len() as f64 * (1u64 << layout.field_size) as f64;

        let block_diff = self
            .blocks()
            .iter()
            .zip(other.blocks())
            .filter(|(a, b)| a != b)
            .count();

        let field_dist = field_diff as f64 / field_span;
        let block_dist = block_diff as f64 / self.blocks().len() as f64;
        Ok(FIELD_WEIGHT * field_dist + BLOCK_WEIGHT * block_dist)
    }
}
