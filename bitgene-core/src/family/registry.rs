//! Family registry — instance identities, lineage and canonical grouping
//!
//! Responsibilities:
//! - hand out strictly increasing instance ids, starting at 1
//! - keep a copy of every member and its write-once lineage record
//! - group members by canonical id to expose duplicate content
//! - breed registered (or live) genomes and record the child

use super::lineage::{LineageRecord, ParentRef};
use crate::genome::{CanonicalId, Genome, GenomeError, GenomeLayout, InstanceId};
use log::{debug, info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Most parents a genome can have
const MAX_PARENTS: usize = 2;

/// A family of genomes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Family {
    layout: GenomeLayout,
    next_instance_id: InstanceId,
    members: BTreeMap<InstanceId, Genome>,
    lineage: BTreeMap<InstanceId, LineageRecord>,
    by_canonical: HashMap<CanonicalId, Vec<InstanceId>>,
}

impl Default for Family {
    fn default() -> Self {
        Self::with_layout(GenomeLayout::default())
    }
}

impl Family {
    /// Create an empty family using the default layout for founders
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty family whose bootstrapped founders use `layout`
    pub fn with_layout(layout: GenomeLayout) -> Self {
        Self {
            layout,
            next_instance_id: 1,
            members: BTreeMap::new(),
            lineage: BTreeMap::new(),
            by_canonical: HashMap::new(),
        }
    }

    /// Register a genome with optional parents and return its instance id.
    ///
    /// A genome whose instance id is already a member is returned as is.
    /// Parents given as ids must be members; parents given as genomes are
    /// registered first (at `generation - 1`) when the family does not know
    /// them. Invalid references are reported before any id is allocated.
    pub fn register(
        &mut self,
        genome: &mut Genome,
        parents: Vec<ParentRef<'_>>,
        branch_code: u64,
        generation: u32,
    ) -> Result<InstanceId, FamilyError> {
        if let Some(id) = self.known_id(genome) {
            return Ok(id);
        }
        if parents.len() > MAX_PARENTS {
            return Err(FamilyError::TooManyParents(parents.len()));
        }
        for parent in &parents {
            if let ParentRef::Id(id) = parent {
                if !self.members.contains_key(id) {
                    warn!("Rejecting registration: unknown parent id {}", id);
                    return Err(FamilyError::InvalidParentReference(*id));
                }
            }
        }

        let parent_generation = generation.saturating_sub(1);
        let mut resolved = Vec::with_capacity(parents.len());
        for parent in parents {
            let id = match parent {
                ParentRef::Id(id) => id,
                ParentRef::Genome(parent) => {
                    self.register(parent, Vec::new(), 0, parent_generation)?
                }
            };
            resolved.push(id);
        }

        let canonical_id = genome.ensure_canonical_id().to_owned();
        let id = self.allocate_instance_id();
        genome.instance_id = Some(id);
        self.members.insert(id, genome.clone());
        self.by_canonical
            .entry(canonical_id.clone())
            .or_default()
            .push(id);
        debug!(
            "Registered genome {} (seed {}, G{}) parents={:?}",
            id,
            genome.seed(),
            generation,
            resolved
        );
        self.lineage.insert(
            id,
            LineageRecord {
                parents: resolved,
                canonical_id,
                bitmask: genome.bitmask_state(),
                branch_code,
                generation,
            },
        );
        Ok(id)
    }

    /// Cross two parents and register the child at one generation past the
    /// most recent of them. `parent_a` is the side whose bitmask advances;
    /// when it is a live genome that is already a member, the stored copy
    /// advances with it.
    pub fn pair(
        &mut self,
        parent_a: ParentRef<'_>,
        parent_b: ParentRef<'_>,
        branch_code: u64,
    ) -> Result<Genome, FamilyError> {
        self.breed(parent_a, parent_b, branch_code)
            .map(|(_, child)| child)
    }

    /// Create `founder_count` random founders, then breed `offspring_count`
    /// children from two distinct members of the running pool each round.
    /// Returns founders followed by offspring in creation order.
    pub fn bootstrap<R: Rng>(
        &mut self,
        founder_count: usize,
        offspring_count: usize,
        rng: &mut R,
    ) -> Result<Vec<Genome>, FamilyError> {
        if offspring_count > 0 && founder_count < MAX_PARENTS {
            return Err(FamilyError::PoolTooSmall {
                needed: MAX_PARENTS,
                available: founder_count,
            });
        }

        let mut pool = Vec::with_capacity(founder_count + offspring_count);
        for _ in 0..founder_count {
            let mut founder = Genome::random(self.layout, rng)?;
            pool.push(self.register(&mut founder, Vec::new(), 0, 0)?);
        }
        for _ in 0..offspring_count {
            let picks = rand::seq::index::sample(rng, pool.len(), MAX_PARENTS);
            let (a, b) = (pool[picks.index(0)], pool[picks.index(1)]);
            let (child_id, _) = self.breed(ParentRef::Id(a), ParentRef::Id(b), 0)?;
            pool.push(child_id);
        }

        info!(
            "Bootstrapped {} founders and {} offspring ({} members total)",
            founder_count,
            offspring_count,
            self.members.len()
        );
        Ok(pool
            .iter()
            .filter_map(|id| self.members.get(id).cloned())
            .collect())
    }

    /// Check a family that did not come through `register` (e.g. one loaded
    /// from disk): its layout, every member, and the id counter.
    pub fn validate(&self) -> Result<(), GenomeError> {
        self.layout.validate()?;
        for genome in self.members.values() {
            genome.validate()?;
        }
        if let Some(last) = self.members.keys().next_back() {
            if *last >= self.next_instance_id {
                return Err(GenomeError::Inconsistent(format!(
                    "member id {} not below next instance id {}",
                    last, self.next_instance_id
                )));
            }
        }
        Ok(())
    }

    pub fn layout(&self) -> GenomeLayout {
        self.layout
    }

    pub fn get(&self, id: InstanceId) -> Option<&Genome> {
        self.members.get(&id)
    }

    pub fn lineage_of(&self, id: InstanceId) -> Option<&LineageRecord> {
        self.lineage.get(&id)
    }

    pub fn generation_of(&self, id: InstanceId) -> Option<u32> {
        self.lineage.get(&id).map(|record| record.generation)
    }

    /// Recorded generation of a genome; 0 when it is not a member
    pub fn generation_of_genome(&self, genome: &Genome) -> u32 {
        genome
            .instance_id()
            .and_then(|id| self.generation_of(id))
            .unwrap_or(0)
    }

    pub fn members(&self) -> &BTreeMap<InstanceId, Genome> {
        &self.members
    }

    pub fn lineage(&self) -> &BTreeMap<InstanceId, LineageRecord> {
        &self.lineage
    }

    pub fn by_canonical(&self) -> &HashMap<CanonicalId, Vec<InstanceId>> {
        &self.by_canonical
    }

    /// Instance ids sharing a canonical id
    pub fn instances_of(&self, canonical_id: &str) -> &[InstanceId] {
        self.by_canonical
            .get(canonical_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Canonical ids carried by more than one member, sorted by id
    pub fn duplicates(&self) -> Vec<(&str, &[InstanceId])> {
        let mut dups: Vec<(&str, &[InstanceId])> = self
            .by_canonical
            .iter()
            .filter(|(_, ids)| ids.len() > 1)
            .map(|(canonical, ids)| (canonical.as_str(), ids.as_slice()))
            .collect();
        dups.sort_by(|a, b| a.0.cmp(b.0));
        dups
    }

    /// Member ids grouped by generation
    pub fn by_generation(&self) -> BTreeMap<u32, Vec<InstanceId>> {
        let mut groups: BTreeMap<u32, Vec<InstanceId>> = BTreeMap::new();
        for (id, record) in &self.lineage {
            groups.entry(record.generation).or_default().push(*id);
        }
        groups
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn summary(&self) -> String {
        let generations = self.by_generation();
        let deepest = generations.keys().next_back().copied().unwrap_or(0);
        format!(
            "Family | {} members | {} generations (deepest G{}) | {} duplicated canonical ids",
            self.members.len(),
            generations.len(),
            deepest,
            self.duplicates().len()
        )
    }

    fn breed(
        &mut self,
        mut parent_a: ParentRef<'_>,
        parent_b: ParentRef<'_>,
        branch_code: u64,
    ) -> Result<(InstanceId, Genome), FamilyError> {
        let other = match &parent_b {
            ParentRef::Id(id) => self
                .members
                .get(id)
                .cloned()
                .ok_or(FamilyError::InvalidParentReference(*id))?,
            ParentRef::Genome(genome) => (**genome).clone(),
        };
        let generation = self
            .parent_generation(&parent_a)?
            .max(self.parent_generation(&parent_b)?)
            .saturating_add(1);

        let mut child = match &mut parent_a {
            ParentRef::Id(id) => {
                let id = *id;
                self.members
                    .get_mut(&id)
                    .ok_or(FamilyError::InvalidParentReference(id))?
                    .crossover(&other, branch_code)?
            }
            ParentRef::Genome(genome) => {
                let child = genome.crossover(&other, branch_code)?;
                if let Some(stored) = genome.instance_id().and_then(|id| self.members.get_mut(&id)) {
                    stored.bitmask_state = genome.bitmask_state();
                }
                child
            }
        };
        let id = self.register(&mut child, vec![parent_a, parent_b], branch_code, generation)?;
        Ok((id, child))
    }

    fn parent_generation(&self, parent: &ParentRef<'_>) -> Result<u32, FamilyError> {
        match parent {
            ParentRef::Id(id) => self
                .generation_of(*id)
                .ok_or(FamilyError::InvalidParentReference(*id)),
            ParentRef::Genome(genome) => Ok(self.generation_of_genome(genome)),
        }
    }

    fn known_id(&self, genome: &Genome) -> Option<InstanceId> {
        genome
            .instance_id()
            .filter(|id| self.members.contains_key(id))
    }

    fn allocate_instance_id(&mut self) -> InstanceId {
        let id = self.next_instance_id;
        self.next_instance_id += 1;
        id
    }
}

/// Family registry errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FamilyError {
    #[error("Invalid parent reference: no member with instance id {0}")]
    InvalidParentReference(InstanceId),

    #[error("A genome has at most two parents, got {0}")]
    TooManyParents(usize),

    #[error("Pool too small to pair: need {needed} members, have {available}")]
    PoolTooSmall { needed: usize, available: usize },

    #[error(transparent)]
    Genome(#[from] GenomeError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn founders(family: &mut Family, seeds: &[u64]) -> Vec<InstanceId> {
        seeds
            .iter()
            .map(|seed| {
                let mut genome = Genome::new(*seed).unwrap();
                family.register(&mut genome, Vec::new(), 0, 0).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_ids_start_at_one_and_increase() {
        let mut family = Family::new();
        let ids = founders(&mut family, &[10, 20, 30]);
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(family.len(), 3);
        assert!(family.lineage_of(2).unwrap().is_founder());
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut family = Family::new();
        let mut genome = Genome::new(77).unwrap();
        let first = family.register(&mut genome, Vec::new(), 0, 0).unwrap();
        let second = family.register(&mut genome, Vec::new(), 5, 3).unwrap();
        assert_eq!(first, second);
        assert_eq!(genome.instance_id(), Some(first));
        assert_eq!(family.members().len(), 1);
        assert_eq!(family.lineage().len(), 1);
        assert_eq!(family.generation_of(first), Some(0));
        assert_eq!(family.lineage_of(first).unwrap().branch_code, 0);
    }

    #[test]
    fn test_register_restores_missing_canonical_id() {
        let mut family = Family::new();
        let mut genome = Genome::new(3).unwrap();
        genome.set_fields([9, 8, 7, 6]).unwrap();
        let id = family.register(&mut genome, Vec::new(), 0, 0).unwrap();
        let expected = Genome::compute_canonical_id(3, &[9, 8, 7, 6]);
        assert_eq!(family.lineage_of(id).unwrap().canonical_id, expected);
        assert_eq!(family.instances_of(&expected), &[id]);
    }

    #[test]
    fn test_duplicate_content_grouped() {
        let mut family = Family::new();
        let ids = founders(&mut family, &[42, 42, 43]);
        let canonical = family.get(ids[0]).unwrap().canonical_id().unwrap().to_owned();
        assert_eq!(family.instances_of(&canonical), &[1, 2]);
        let dups = family.duplicates();
        assert_eq!(dups.len(), 1);
        assert_eq!(dups[0].1, &[1, 2]);
    }

    #[test]
    fn test_unknown_parent_id_rejected_without_side_effects() {
        let mut family = Family::new();
        founders(&mut family, &[1]);
        let mut genome = Genome::new(2).unwrap();
        let err = family
            .register(&mut genome, vec![ParentRef::Id(1), ParentRef::Id(99)], 0, 1)
            .unwrap_err();
        assert_eq!(err, FamilyError::InvalidParentReference(99));
        assert_eq!(family.len(), 1);
        assert!(!genome.is_registered());
        let next = founders(&mut family, &[3]);
        assert_eq!(next, vec![2]);
    }

    #[test]
    fn test_too_many_parents_rejected() {
        let mut family = Family::new();
        founders(&mut family, &[1, 2, 3]);
        let mut genome = Genome::new(4).unwrap();
        let parents = vec![ParentRef::Id(1), ParentRef::Id(2), ParentRef::Id(3)];
        let err = family.register(&mut genome, parents, 0, 1).unwrap_err();
        assert_eq!(err, FamilyError::TooManyParents(3));
    }

    #[test]
    fn test_genome_parents_registered_first() {
        let mut family = Family::new();
        let mut mother = Genome::new(100).unwrap();
        let mut father = Genome::new(200).unwrap();
        let mut child = Genome::new(300).unwrap();
        let id = family
            .register(
                &mut child,
                vec![ParentRef::from(&mut mother), ParentRef::from(&mut father)],
                0,
                3,
            )
            .unwrap();
        assert_eq!(mother.instance_id(), Some(1));
        assert_eq!(father.instance_id(), Some(2));
        assert_eq!(id, 3);
        assert_eq!(family.lineage_of(3).unwrap().parents, vec![1, 2]);
        assert_eq!(family.generation_of(1), Some(2));
        assert_eq!(family.generation_of(3), Some(3));
    }

    #[test]
    fn test_pair_sets_generation_and_parents() {
        let mut family = Family::new();
        let ids = founders(&mut family, &[11, 22]);
        let child = family.pair(ParentRef::Id(ids[0]), ParentRef::Id(ids[1]), 0).unwrap();
        let child_id = child.instance_id().unwrap();
        assert_eq!(family.generation_of(child_id), Some(1));
        assert_eq!(family.lineage_of(child_id).unwrap().parents, ids);

        let grandchild = family.pair(ParentRef::Id(child_id), ParentRef::Id(ids[0]), 0).unwrap();
        assert_eq!(family.generation_of_genome(&grandchild), 2);
    }

    #[test]
    fn test_pair_advances_stored_parent_bitmask() {
        let mut family = Family::new();
        let ids = founders(&mut family, &[1234, 5678]);
        let before = family.get(ids[0]).unwrap().bitmask_state();
        let snapshot = family.lineage_of(ids[0]).unwrap().bitmask;
        family.pair(ParentRef::Id(ids[0]), ParentRef::Id(ids[1]), 0).unwrap();
        assert_ne!(family.get(ids[0]).unwrap().bitmask_state(), before);
        assert_eq!(family.lineage_of(ids[0]).unwrap().bitmask, snapshot);
    }

    #[test]
    fn test_pair_live_genomes() {
        let mut family = Family::new();
        let mut a = Genome::new(1234).unwrap();
        let mut b = Genome::new(5678).unwrap();
        let expected = a.clone().crossover(&b, 4).unwrap();
        let child = family
            .pair(ParentRef::from(&mut a), ParentRef::from(&mut b), 4)
            .unwrap();
        assert_eq!(child.fields(), expected.fields());
        assert_eq!(child.seed(), expected.seed());
        assert_eq!(family.generation_of_genome(&a), 0);
        assert_eq!(family.generation_of_genome(&child), 1);
        assert_eq!(family.lineage_of(3).unwrap().branch_code, 4);
    }

    #[test]
    fn test_pair_live_member_keeps_stored_copy_in_step() {
        let mut family = Family::new();
        let mut a = Genome::new(1234).unwrap();
        let mut b = Genome::new(5678).unwrap();
        let id_a = family.register(&mut a, Vec::new(), 0, 0).unwrap();
        let id_b = family.register(&mut b, Vec::new(), 0, 0).unwrap();

        family
            .pair(ParentRef::from(&mut a), ParentRef::from(&mut b), 0)
            .unwrap();
        assert_eq!(a.bitmask_state(), 49);
        assert_eq!(family.get(id_a).unwrap().bitmask_state(), a.bitmask_state());
        assert_eq!(family.lineage_of(id_a).unwrap().bitmask, 7);

        let by_id = family
            .clone()
            .pair(ParentRef::Id(id_a), ParentRef::Id(id_b), 0)
            .unwrap();
        let live = family
            .pair(ParentRef::from(&mut a), ParentRef::from(&mut b), 0)
            .unwrap();
        assert_eq!(by_id.seed(), live.seed());
        assert_eq!(by_id.fields(), live.fields());
    }

    #[test]
    fn test_validate_rejects_loaded_corruption() {
        let mut family = Family::new();
        founders(&mut family, &[1234, 5678]);
        assert!(family.validate().is_ok());

        let mut json: serde_json::Value = serde_json::to_value(&family).unwrap();
        json["members"]["1"]["layout"]["field_size"] = 0.into();
        let loaded: Family = serde_json::from_str(&json.to_string()).unwrap();
        assert!(matches!(loaded.validate(), Err(GenomeError::InvalidLayout(_))));

        let mut json: serde_json::Value = serde_json::to_value(&family).unwrap();
        json["next_instance_id"] = 2.into();
        let loaded: Family = serde_json::from_str(&json.to_string()).unwrap();
        assert!(matches!(loaded.validate(), Err(GenomeError::Inconsistent(_))));
    }

    #[test]
    fn test_pair_unknown_id() {
        let mut family = Family::new();
        founders(&mut family, &[5]);
        let err = family.pair(ParentRef::Id(1), ParentRef::Id(8), 0).unwrap_err();
        assert_eq!(err, FamilyError::InvalidParentReference(8));
        assert_eq!(family.len(), 1);
    }

    #[test]
    fn test_bootstrap_orders_founders_then_offspring() {
        let mut family = Family::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let members = family.bootstrap(4, 6, &mut rng).unwrap();
        assert_eq!(members.len(), 10);
        let ids: Vec<InstanceId> = members.iter().filter_map(Genome::instance_id).collect();
        assert_eq!(ids, (1..=10).collect::<Vec<_>>());
        for genome in &members[..4] {
            assert_eq!(family.generation_of_genome(genome), 0);
        }
        for genome in &members[4..] {
            let record = family.lineage_of(genome.instance_id().unwrap()).unwrap();
            assert_eq!(record.parents.len(), 2);
            assert_ne!(record.parents[0], record.parents[1]);
        }
    }

    #[test]
    fn test_bootstrap_is_reproducible() {
        let run = |seed| {
            let mut family = Family::new();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            family
                .bootstrap(5, 8, &mut rng)
                .unwrap()
                .iter()
                .map(Genome::seed)
                .collect::<Vec<_>>()
        };
        assert_eq!(run(21), run(21));
    }

    #[test]
    fn test_generation_is_one_past_parents() {
        let mut family = Family::new();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        family.bootstrap(6, 30, &mut rng).unwrap();
        for record in family.lineage().values() {
            if record.is_founder() {
                assert_eq!(record.generation, 0);
                continue;
            }
            let oldest = record
                .parents
                .iter()
                .map(|p| family.generation_of(*p).unwrap())
                .max()
                .unwrap();
            assert_eq!(record.generation, oldest + 1);
        }
    }

    #[test]
    fn test_bootstrap_needs_two_founders() {
        let mut family = Family::new();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let err = family.bootstrap(1, 3, &mut rng).unwrap_err();
        assert_eq!(err, FamilyError::PoolTooSmall { needed: 2, available: 1 });
        assert!(family.is_empty());
        assert_eq!(family.bootstrap(1, 0, &mut rng).unwrap().len(), 1);
    }

    #[test]
    fn test_by_generation_and_summary() {
        let mut family = Family::new();
        let ids = founders(&mut family, &[1, 2]);
        family.pair(ParentRef::Id(ids[0]), ParentRef::Id(ids[1]), 0).unwrap();
        let groups = family.by_generation();
        assert_eq!(groups[&0], vec![1, 2]);
        assert_eq!(groups[&1], vec![3]);
        assert!(family.summary().contains("3 members"));
    }
}
