//! Cost-ordered beams.
//!
//! A beam is the multiset of lattice nodes retained for one timestep, kept
//! as a vector sorted by ascending accumulated cost. At the sizes involved
//! (a few hundred entries, fan-out of a few dozen) binary-search insertion
//! beats a tree multiset. Insertion after equal costs keeps ties in arrival
//! order, which makes runs deterministic.

use crate::lattice::HmmNodeId;

#[derive(Debug, Default)]
pub struct Beam {
    entries: Vec<(f64, HmmNodeId)>,
}

impl Beam {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a node at its cost-sorted position, after any equal costs.
    pub fn insert(&mut self, cost: f64, node: HmmNodeId) {
        let at = self.entries.partition_point(|&(c, _)| c <= cost);
        self.entries.insert(at, (cost, node));
    }

    /// Drops every entry past the `breadth` cheapest.
    pub fn truncate(&mut self, breadth: usize) {
        self.entries.truncate(breadth);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Replaces the whole beam with a single pinned node.
    pub fn collapse_to(&mut self, cost: f64, node: HmmNodeId) {
        self.entries.clear();
        self.entries.push((cost, node));
    }

    /// Keeps only the nodes the predicate accepts, preserving cost order.
    pub fn retain(&mut self, mut keep: impl FnMut(HmmNodeId) -> bool) {
        self.entries.retain(|&(_, node)| keep(node));
    }

    /// The cheapest node, if any.
    pub fn best(&self) -> Option<HmmNodeId> {
        self.entries.first().map(|&(_, node)| node)
    }

    pub fn nodes(&self) -> impl Iterator<Item = HmmNodeId> + '_ {
        self.entries.iter().map(|&(_, node)| node)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
