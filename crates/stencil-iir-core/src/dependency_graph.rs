//! Access dependency graph carried by a do-method.
//!
//! The graph is built by the stage-splitting pass; the IR only stores it,
//! drops it with the derived info and deep-copies it on clone.

use crate::ids::AccessId;
use indexmap::IndexSet;
use rustc_hash::{FxBuildHasher, FxHashMap};

/// Directed graph over access IDs: an edge `a -> b` means that a write of
/// `a` depends on a read of `b`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessDependencyGraph {
    edges: FxHashMap<AccessId, IndexSet<AccessId, FxBuildHasher>>,
}

impl AccessDependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, id: AccessId) {
        self.edges.entry(id).or_default();
    }

    pub fn add_edge(&mut self, from: AccessId, to: AccessId) {
        self.edges.entry(from).or_default().insert(to);
        self.add_node(to);
    }

    /// Successors of `id` in insertion order.
    pub fn successors(&self, id: AccessId) -> impl Iterator<Item = AccessId> + '_ {
        self.edges.get(&id).into_iter().flatten().copied()
    }

    pub fn contains(&self, id: AccessId) -> bool {
        self.edges.contains_key(&id)
    }

    pub fn num_nodes(&self) -> usize {
        self.edges.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.values().map(IndexSet::len).sum()
    }
}
