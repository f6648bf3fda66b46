//! Lineage records and parent references
//!
//! A record is written once, when its genome joins a family, and is never
//! touched again. Parents are stored by instance id in the order given.

use crate::genome::{CanonicalId, Genome, InstanceId};
use serde::{Deserialize, Serialize};

/// Per-instance lineage metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageRecord {
    /// Parent instance ids (empty for founders, at most two)
    pub parents: Vec<InstanceId>,
    /// Canonical id of the genome at registration
    pub canonical_id: CanonicalId,
    /// Bitmask state snapshot at registration
    pub bitmask: u16,
    /// Branch code the genome was bred with
    pub branch_code: u64,
    /// Depth in the lineage graph (0 = founder)
    pub generation: u32,
}

impl LineageRecord {
    pub fn is_founder(&self) -> bool {
        self.parents.is_empty()
    }
}

/// A parent handed to `Family::register` or `Family::pair`
#[derive(Debug)]
pub enum ParentRef<'a> {
    /// An existing member, by instance id
    Id(InstanceId),
    /// A live genome; registered first when the family does not know it yet
    Genome(&'a mut Genome),
}

impl From<InstanceId> for ParentRef<'_> {
    fn from(id: InstanceId) -> Self {
        ParentRef::Id(id)
    }
}

impl<'a> From<&'a mut Genome> for ParentRef<'a> {
    fn from(genome: &'a mut Genome) -> Self {
        ParentRef::Genome(genome)
    }
}
