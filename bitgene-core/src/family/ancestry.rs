//! Ancestry — recursive pedigree reconstruction
//!
//! Lineage built through `register`/`pair` is acyclic, since a child's
//! generation is always past its parents'. Loaded or hand-built records
//! carry no such guarantee, so rendering stops at the depth limit and at any
//! id already on the current path.

use super::registry::Family;
use crate::genome::{Genome, InstanceId};
use std::fmt;

/// Default recursion bound for ancestry queries
pub const DEFAULT_DEPTH_LIMIT: usize = 50;

/// Rendered for ids the family does not know
pub const EXTERNAL_MARKER: &str = "External";

/// Rendered in place of a node past the depth limit
pub const DEPTH_LIMIT_MARKER: &str = "… (depth limit)";

/// A node of a reconstructed pedigree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AncestryNode {
    Member {
        id: InstanceId,
        generation: u32,
        parents: Vec<AncestryNode>,
    },
    /// Recursion stopped here
    Truncated,
}

impl AncestryNode {
    pub fn parents(&self) -> &[AncestryNode] {
        match self {
            AncestryNode::Member { parents, .. } => parents,
            AncestryNode::Truncated => &[],
        }
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, AncestryNode::Truncated)
    }

    /// Longest chain of nodes from this one down to a founder or cut-off
    pub fn depth(&self) -> usize {
        1 + self.parents().iter().map(AncestryNode::depth).max().unwrap_or(0)
    }
}

impl fmt::Display for AncestryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AncestryNode::Truncated => f.write_str(DEPTH_LIMIT_MARKER),
            AncestryNode::Member {
                id,
                generation,
                parents,
            } => {
                write!(f, "Genome({}) (G{})", id, generation)?;
                for (i, parent) in parents.iter().enumerate() {
                    f.write_str(if i == 0 { " ← " } else { " + " })?;
                    write!(f, "{}", parent)?;
                }
                Ok(())
            }
        }
    }
}

impl Family {
    /// Reconstruct the pedigree of a member; `None` for unknown ids
    pub fn ancestry_tree(&self, id: InstanceId, depth_limit: usize) -> Option<AncestryNode> {
        self.lineage_of(id)?;
        let mut path = Vec::new();
        Some(self.build_node(id, 0, depth_limit, &mut path))
    }

    /// Human-readable pedigree, e.g. `Genome(5) (G1) ← Genome(1) (G0) + Genome(3) (G0)`
    pub fn ancestry(&self, id: InstanceId, depth_limit: usize) -> String {
        match self.ancestry_tree(id, depth_limit) {
            Some(tree) => tree.to_string(),
            None => EXTERNAL_MARKER.to_string(),
        }
    }

    /// Pedigree of a genome; unregistered genomes render as external
    pub fn ancestry_of(&self, genome: &Genome, depth_limit: usize) -> String {
        match genome.instance_id() {
            Some(id) => self.ancestry(id, depth_limit),
            None => EXTERNAL_MARKER.to_string(),
        }
    }

    fn build_node(
        &self,
        id: InstanceId,
        depth: usize,
        depth_limit: usize,
        path: &mut Vec<InstanceId>,
    ) -> AncestryNode {
        if depth > depth_limit || path.contains(&id) {
            return AncestryNode::Truncated;
        }
        let record = self.lineage_of(id);
        let generation = record.map_or(0, |r| r.generation);
        let parent_ids = record.map(|r| r.parents.as_slice()).unwrap_or(&[]);

        path.push(id);
        let parents = parent_ids
            .iter()
            .map(|parent| self.build_node(*parent, depth + 1, depth_limit, path))
            .collect();
        path.pop();

        AncestryNode::Member {
            id,
            generation,
            parents,
        }
    }
}
