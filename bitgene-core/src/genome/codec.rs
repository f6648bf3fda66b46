//! Genome — seed-derived blocks, fields and canonical identity
//!
//! A genome is fully determined by its seed and layout:
//! - blocks: one shuffled block of `L` bits per base-`(L+1)` seed digit
//! - fields: four `field_size`-bit windows sliced from SHA256(seed)
//! - canonical id: SHA256 over `"{seed}:{f0},{f1},{f2},{f3}"`
//!
//! Every pseudo-random step uses a ChaCha8 generator seeded from the inputs,
//! so the same seed yields the same genome in every process.

use super::layout::{GenomeLayout, DIGITS};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Content-addressed identity of a genome (hex SHA256 of seed + fields)
pub type CanonicalId = String;

/// Registry-assigned identity of one registered genome
pub type InstanceId = u64;

/// A synthetic genome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genome {
    seed: u64,
    layout: GenomeLayout,
    blocks: Vec<u8>,
    sums: [u32; DIGITS],
    fields: [u64; DIGITS],
    pub(crate) bitmask_state: u16,
    canonical_id: Option<CanonicalId>,
    pub(crate) instance_id: Option<InstanceId>,
}

impl Genome {
    /// Build a genome from a seed using the default layout
    pub fn new(seed: u64) -> Result<Self, GenomeError> {
        Self::from_seed(seed, GenomeLayout::default())
    }

    /// Build a genome from a seed. Seeds above `layout.max_seed()` are rejected.
    pub fn from_seed(seed: u64, layout: GenomeLayout) -> Result<Self, GenomeError> {
        layout.validate()?;
        let max = layout.max_seed();
        if seed > max {
            return Err(GenomeError::InvalidSeed { seed, max });
        }
        let fields = Self::derive_fields(seed, &layout);
        Ok(Self::build(seed, fields, Self::initial_bitmask(&fields), layout))
    }

    /// Build a genome from a seed drawn uniformly from `[0, max_seed]`
    pub fn random<R: Rng>(layout: GenomeLayout, rng: &mut R) -> Result<Self, GenomeError> {
        layout.validate()?;
        let seed = rng.gen_range(0..=layout.max_seed());
        Self::from_seed(seed, layout)
    }

    /// Assemble a genome that carries `fields` instead of the seed-derived ones.
    /// The inheritance state still starts from the seed-derived fields; the
    /// canonical id covers the carried ones.
    /// Callers guarantee the seed is in range and the fields fit the layout.
    pub(crate) fn assemble(seed: u64, fields: [u64; DIGITS], layout: GenomeLayout) -> Self {
        let derived = Self::derive_fields(seed, &layout);
        Self::build(seed, fields, Self::initial_bitmask(&derived), layout)
    }

    fn build(seed: u64, fields: [u64; DIGITS], bitmask_state: u16, layout: GenomeLayout) -> Self {
        let blocks = Self::generate_blocks(seed, &layout);
        let sums = Self::block_sums(&blocks, &layout);
        Self {
            seed,
            layout,
            blocks,
            sums,
            fields,
            bitmask_state,
            canonical_id: Some(Self::compute_canonical_id(seed, &fields)),
            instance_id: None,
        }
    }

    /// Check a genome that did not come through the constructors (e.g. one
    /// loaded from disk): layout, seed range, field widths and block shape.
    pub fn validate(&self) -> Result<(), GenomeError> {
        self.layout.validate()?;
        let max = self.layout.max_seed();
        if self.seed > max {
            return Err(GenomeError::InvalidSeed { seed: self.seed, max });
        }
        let mask = self.layout.field_mask();
        if let Some((index, &value)) = self.fields.iter().enumerate().find(|(_, f)| **f > mask) {
            return Err(GenomeError::FieldOutOfRange {
                index,
                value,
                field_size: self.layout.field_size,
            });
        }
        if self.blocks.len() != self.layout.block_count()
            || self.blocks.iter().any(|b| *b > 1)
            || Self::block_sums(&self.blocks, &self.layout) != self.sums
            || self.sums != self.layout.digits(self.seed)
        {
            return Err(GenomeError::Inconsistent(format!(
                "blocks of seed {} do not match its digits",
                self.seed
            )));
        }
        Ok(())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn layout(&self) -> GenomeLayout {
        self.layout
    }

    /// All `4 * L` block bits, block 0 first
    pub fn blocks(&self) -> &[u8] {
        &self.blocks
    }

    /// Ones per block; equal to the seed digits
    pub fn sums(&self) -> [u32; DIGITS] {
        self.sums
    }

    pub fn fields(&self) -> [u64; DIGITS] {
        self.fields
    }

    /// Current 16-bit inheritance state (advanced by `next_bitmask`)
    pub fn bitmask_state(&self) -> u16 {
        self.bitmask_state
    }

    /// Cached canonical id; `None` after `set_fields` until recomputed
    pub fn canonical_id(&self) -> Option<&str> {
        self.canonical_id.as_deref()
    }

    /// Return the canonical id, computing it from the current seed and fields if unset
    pub fn ensure_canonical_id(&mut self) -> &str {
        let (seed, fields) = (self.seed, self.fields);
        self.canonical_id
            .get_or_insert_with(|| Self::compute_canonical_id(seed, &fields))
            .as_str()
    }

    pub fn instance_id(&self) -> Option<InstanceId> {
        self.instance_id
    }

    pub fn is_registered(&self) -> bool {
        self.instance_id.is_some()
    }

    /// Replace the fields. The cached canonical id is dropped; blocks and
    /// bitmask state are left as they are.
    pub fn set_fields(&mut self, fields: [u64; DIGITS]) -> Result<(), GenomeError> {
        let mask = self.layout.field_mask();
        if let Some((index, &value)) = fields.iter().enumerate().find(|(_, f)| **f > mask) {
            return Err(GenomeError::FieldOutOfRange {
                index,
                value,
                field_size: self.layout.field_size,
            });
        }
        self.fields = fields;
        self.canonical_id = None;
        Ok(())
    }

    /// Canonical id for a `(seed, fields)` pair
    pub fn compute_canonical_id(seed: u64, fields: &[u64; DIGITS]) -> CanonicalId {
        let joined = fields
            .iter()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let digest = Sha256::digest(format!("{}:{}", seed, joined).as_bytes());
        hex::encode(digest)
    }

    /// Slice SHA256(decimal seed) into four fields. The digest is read as a
    /// big-endian integer and field `i` starts at bit `i * field_size` from
    /// the least significant end, so only the low 128 bits are ever used.
    fn derive_fields(seed: u64, layout: &GenomeLayout) -> [u64; DIGITS] {
        let digest = Sha256::digest(seed.to_string().as_bytes());
        let mut low = [0u8; 16];
        low.copy_from_slice(&digest[16..]);
        let value = u128::from_be_bytes(low);
        let mask = layout.field_mask();
        let mut fields = [0u64; DIGITS];
        for (i, field) in fields.iter_mut().enumerate() {
            let shift = i as u32 * layout.field_size;
            *field = (value >> shift) as u64 & mask;
        }
        fields
    }

    fn generate_blocks(seed: u64, layout: &GenomeLayout) -> Vec<u8> {
        let len = layout.block_len as usize;
        let mut blocks = Vec::with_capacity(layout.block_count());
        for (i, digit) in layout.digits(seed).iter().enumerate() {
            let ones = *digit as usize;
            let mut block: Vec<u8> = std::iter::repeat(1)
                .take(ones)
                .chain(std::iter::repeat(0).take(len - ones))
                .collect();
            let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(i as u64));
            block.shuffle(&mut rng);
            blocks.extend(block);
        }
        blocks
    }

    fn block_sums(blocks: &[u8], layout: &GenomeLayout) -> [u32; DIGITS] {
        let mut sums = [0u32; DIGITS];
        for (sum, block) in sums.iter_mut().zip(blocks.chunks(layout.block_len as usize)) {
            *sum = block.iter().map(|b| u32::from(*b)).sum();
        }
        sums
    }

    /// Sum of the fields' low nibbles
    pub(crate) fn nibble_sum(fields: &[u64; DIGITS]) -> u16 {
        fields.iter().map(|f| (f & 0xF) as u16).sum()
    }

    fn initial_bitmask(fields: &[u64; DIGITS]) -> u16 {
        Self::nibble_sum(fields) & 0xF
    }

    pub fn summary(&self) -> String {
        let id = match self.instance_id {
            Some(id) => id.to_string(),
            None => "-".into(),
        };
        format!(
            "Genome(seed={}, L={}, fs={}) | id={} | sums={:?} | fields={:?} | bitmask={:#06b}",
            self.seed,
            self.layout.block_len,
            self.layout.field_size,
            id,
            self.sums,
            self.fields,
            self.bitmask_state & 0xF
        )
    }
}

/// Genome codec and reproduction errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenomeError {
    #[error("Seed {seed} out of range 0..={max}")]
    InvalidSeed { seed: u64, max: u64 },

    #[error("Invalid genome layout: {0}")]
    InvalidLayout(String),

    #[error("Field {index} value {value} does not fit in {field_size} bits")]
    FieldOutOfRange { index: usize, value: u64, field_size: u32 },

    #[error("Genome layouts differ: {left:?} vs {right:?}")]
    LayoutMismatch { left: GenomeLayout, right: GenomeLayout },

    #[error("Inconsistent genome: {0}")]
    Inconsistent(String),
}
