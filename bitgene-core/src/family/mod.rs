//! Family — the registry that gives genomes identity and ancestry
//!
//! - Family: instance ids, members, write-once lineage, canonical grouping
//! - LineageRecord / ParentRef: what is recorded and how parents are named
//! - AncestryNode: depth-bounded pedigree reconstruction
//! - FamilyConfig: bootstrap parameters

mod ancestry;
mod config;
mod lineage;
mod registry;

pub use ancestry::{AncestryNode, DEFAULT_DEPTH_LIMIT, DEPTH_LIMIT_MARKER, EXTERNAL_MARKER};
pub use config::FamilyConfig;
pub use lineage::{LineageRecord, ParentRef};
pub use registry::{Family, FamilyError};
