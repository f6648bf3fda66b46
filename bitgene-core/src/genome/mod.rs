//! Genome — the seed-addressed unit of inheritance
//!
//! A genome encodes: blocks (one shuffled bit block per seed digit)
//! + fields (four hash-derived integers) + identity (canonical content hash)
//! + inheritance state (a rolling bitmask advanced by every reproduction).

mod codec;
mod layout;
mod metrics;
mod reproduction;

pub use codec::{CanonicalId, Genome, GenomeError, InstanceId};
pub use layout::{GenomeLayout, DIGITS, MAX_BLOCK_LEN, MAX_FIELD_SIZE};
pub use reproduction::fields_to_seed;
