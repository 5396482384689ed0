//! Node sets and typed views over a node's partners.
use std::fmt;

use crate::{
    capability::{Capability, CapabilityId},
    AssocGraph, BuildZwoHasher, NodeId,
};

/// An unordered set of node handles.
///
/// Returned by queries as a snapshot: later mutations of the graph are not reflected and may
/// leave handles in the set stale.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct NodeSet {
    nodes: hashbrown::HashSet<NodeId, BuildZwoHasher>,
}

impl NodeSet {
    /// Returns an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of nodes in the set.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the set is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns `true` if the set contains the given node.
    #[inline]
    pub fn contains(&self, node: &NodeId) -> bool {
        self.nodes.contains(node)
    }

    /// Adds a node, returning `true` if it was not present before.
    #[inline]
    pub fn insert(&mut self, node: NodeId) -> bool {
        self.nodes.insert(node)
    }

    /// Removes a node, returning `true` if it was present.
    #[inline]
    pub fn remove(&mut self, node: &NodeId) -> bool {
        self.nodes.remove(node)
    }

    /// Iterates over the nodes in arbitrary order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }

    /// Returns the nodes ordered by [`KeyId`][crate::KeyId].
    pub fn to_sorted_vec(&self) -> Vec<NodeId> {
        let mut sorted = Vec::from_iter(self.iter());
        sorted.sort_unstable();
        sorted
    }

    /// Returns the node with the smallest [`KeyId`][crate::KeyId], if any.
    pub fn first(&self) -> Option<NodeId> {
        self.iter().min()
    }

    /// Adds all nodes of `other` to this set.
    pub fn merge(&mut self, other: &NodeSet) {
        self.nodes.extend(other.iter());
    }
}

/// Returns the union of two node sets.
///
/// Commutative and idempotent, used to combine the results of several queries.
pub fn merge(a: &NodeSet, b: &NodeSet) -> NodeSet {
    let (mut larger, smaller) = if a.len() >= b.len() { (a.clone(), b) } else { (b.clone(), a) };
    larger.merge(smaller);
    larger
}

impl fmt::Debug for NodeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.to_sorted_vec()).finish()
    }
}

impl FromIterator<NodeId> for NodeSet {
    fn from_iter<T: IntoIterator<Item = NodeId>>(iter: T) -> Self {
        Self {
            nodes: hashbrown::HashSet::from_iter(iter),
        }
    }
}

impl Extend<NodeId> for NodeSet {
    fn extend<T: IntoIterator<Item = NodeId>>(&mut self, iter: T) {
        self.nodes.extend(iter)
    }
}

impl IntoIterator for NodeSet {
    type Item = NodeId;
    type IntoIter = hashbrown::hash_set::IntoIter<NodeId>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

impl<'a> IntoIterator for &'a NodeSet {
    type Item = NodeId;
    type IntoIter = std::iter::Copied<hashbrown::hash_set::Iter<'a, NodeId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter().copied()
    }
}

/// Typed views.
///
/// Partners are indexed by the capabilities they declare, so these are direct lookups that do not
/// scan the full partner set.
impl AssocGraph {
    /// Returns the partners of `node` that declare capability `T`.
    ///
    /// # Panics
    ///
    /// Panics if `node` was destroyed.
    #[track_caller]
    pub fn query<T: Capability>(&self, node: NodeId) -> NodeSet {
        self.indexed_partners::<T>(node).cloned().unwrap_or_default()
    }

    /// Returns the partners of `node` that declare the given interned capability.
    ///
    /// # Panics
    ///
    /// Panics if `node` was destroyed.
    #[track_caller]
    pub fn query_by_id(&self, node: NodeId, capability: CapabilityId) -> NodeSet {
        self.expect_live(node)
            .by_capability
            .get(&capability)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the number of partners of `node` that declare capability `T`.
    ///
    /// # Panics
    ///
    /// Panics if `node` was destroyed.
    #[track_caller]
    pub fn query_count<T: Capability>(&self, node: NodeId) -> usize {
        self.indexed_partners::<T>(node).map_or(0, NodeSet::len)
    }

    /// Returns `true` if `node` has at least one partner declaring capability `T`.
    ///
    /// # Panics
    ///
    /// Panics if `node` was destroyed.
    #[track_caller]
    pub fn has_associated<T: Capability>(&self, node: NodeId) -> bool {
        self.query_count::<T>(node) != 0
    }

    /// Returns the oldest partner of `node` that declares capability `T`.
    ///
    /// # Panics
    ///
    /// Panics if `node` was destroyed.
    #[track_caller]
    pub fn first_of<T: Capability>(&self, node: NodeId) -> Option<NodeId> {
        self.indexed_partners::<T>(node).and_then(NodeSet::first)
    }

    #[track_caller]
    fn indexed_partners<T: Capability>(&self, node: NodeId) -> Option<&NodeSet> {
        let state = self.expect_live(node);
        // a capability that was never interned cannot be declared by any partner
        let capability = self.capabilities.lookup::<T>()?;
        state.by_capability.get(&capability)
    }
}
