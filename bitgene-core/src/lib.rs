//! bitgene — bit-packed synthetic genomes with family lineage
//!
//! A genome is fully determined by one seed. Two genomes breed through a
//! deterministic bitwise crossover, and a family registry records who came
//! from whom under stable canonical and instance identities.

pub mod family;
pub mod genome;
pub mod storage;

pub use family::{Family, FamilyConfig, FamilyError, LineageRecord, ParentRef};
pub use genome::{Genome, GenomeError, GenomeLayout};
pub use storage::FamilyStore;
