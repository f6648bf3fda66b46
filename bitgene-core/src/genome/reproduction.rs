//! Reproduction — bitmask-driven crossover and single-parent replication
//!
//! Each genome carries a rolling 16-bit inheritance state. Every reproduction
//! advances it once; its low nibble decides, field by field, which parent the
//! child leans toward. A mutation bit taken from the parents' top field bits
//! can invert that choice. All randomness comes from a ChaCha8 generator
//! seeded from the parents, the mask and the branch code.

use super::layout::{GenomeLayout, DIGITS};
use super::{Genome, GenomeError};
use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Multiplier of the bitmask transition
const BITMASK_MULTIPLIER: u16 = 5;
/// Increment of the bitmask transition
const BITMASK_INCREMENT: u16 = 3;

impl Genome {
    /// Advance the inheritance state and return its low nibble.
    ///
    /// `state = ((5 * state + 3) XOR sum(field & 0xF)) & 0xFFFF`
    ///
    /// Every call mutates the genome, so two consecutive calls generally
    /// return different masks.
    pub fn next_bitmask(&mut self) -> u8 {
        let hash = Self::nibble_sum(&self.fields());
        self.bitmask_state = self
            .bitmask_state
            .wrapping_mul(BITMASK_MULTIPLIER)
            .wrapping_add(BITMASK_INCREMENT)
            ^ hash;
        (self.bitmask_state & 0xF) as u8
    }

    /// Cross this genome with `other`, advancing this genome's bitmask state.
    ///
    /// Field `i` of the child is a per-bit mux of both parents under a random
    /// mask; bit `i` of the (possibly inverted) bitmask decides whether the
    /// masked bits come from `self` or from `other`. The child seed is the
    /// fold of its four fields, and its canonical id covers those fields.
    pub fn crossover(&mut self, other: &Genome, branch_code: u64) -> Result<Genome, GenomeError> {
        let layout = self.layout();
        if layout != other.layout() {
            return Err(GenomeError::LayoutMismatch {
                left: layout,
                right: other.layout(),
            });
        }

        let mut bitmask = self.next_bitmask();
        let (mine, theirs) = (self.fields(), other.fields());
        let top = layout.field_size - 1;
        let mutation = ((mine[3] >> top) ^ (theirs[3] >> top)) & 1 == 1;
        if mutation {
            bitmask = !bitmask & 0xF;
        }

        let mut rng = ChaCha8Rng::seed_from_u64(
            self.seed()
                .wrapping_add(other.seed())
                .wrapping_add(u64::from(bitmask))
                .wrapping_add(branch_code),
        );
        let field_mask = layout.field_mask();
        let mut fields = [0u64; DIGITS];
        for (i, field) in fields.iter_mut().enumerate() {
            let m = rng.gen::<u64>() & field_mask;
            let (kept, other_side) = if bitmask & (1 << i) != 0 {
                (mine[i], theirs[i])
            } else {
                (theirs[i], mine[i])
            };
            *field = ((kept & m) | (other_side & !m)) & field_mask;
        }

        let seed = fields_to_seed(&fields, &layout);
        debug!(
            "crossover {} x {} (branch {}) mask={:#06b} mutation={} -> seed {}",
            self.seed(),
            other.seed(),
            branch_code,
            bitmask,
            mutation,
            seed
        );
        Ok(Genome::assemble(seed, fields, layout))
    }

    /// Single-parent reproduction: fields whose bitmask bit is set are copied,
    /// the rest are drawn fresh from the seeded generator.
    pub fn replicate(&mut self, branch_code: u64) -> Genome {
        let layout = self.layout();
        let bitmask = self.next_bitmask();
        let mut rng = ChaCha8Rng::seed_from_u64(
            self.seed()
                .wrapping_add(u64::from(bitmask))
                .wrapping_add(branch_code),
        );
        let parent = self.fields();
        let field_mask = layout.field_mask();
        let mut fields = [0u64; DIGITS];
        for (i, field) in fields.iter_mut().enumerate() {
            *field = if bitmask & (1 << i) != 0 {
                parent[i]
            } else {
                rng.gen::<u64>() & field_mask
            };
        }
        let seed = fields_to_seed(&fields, &layout);
        debug!("replicate {} (branch {}) mask={:#06b} -> seed {}", self.seed(), branch_code, bitmask, seed);
        Genome::assemble(seed, fields, layout)
    }
}

/// Fold four fields into a seed: `acc = (acc << field_size) | field`, then
/// reduce modulo `max_seed + 1`.
pub fn fields_to_seed(fields: &[u64; DIGITS], layout: &GenomeLayout) -> u64 {
    let mask = layout.field_mask();
    let acc = fields.iter().fold(0u128, |acc, f| {
        (acc << layout.field_size) | u128::from(f & mask)
    });
    (acc % (u128::from(layout.max_seed()) + 1)) as u64
}
