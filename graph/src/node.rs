//! Node handles and per-node state.
use std::{fmt, hash::Hash};

use keyset_ids::Id;

use crate::{
    capability::{CapabilityId, CapabilitySet},
    view::NodeSet,
    BuildZwoHasher,
};

/// Identity of a node, unique among all nodes ever created by one graph.
///
/// Allocated in strictly increasing order and never reused.
#[derive(Id, Debug)]
#[repr(transparent)]
pub struct KeyId(u64);

/// Position of a node in the graph's slab.
///
/// Slots are reused after the node occupying them was destroyed.
#[derive(Id, Debug)]
#[repr(transparent)]
pub struct SlotId(u32);

/// Handle to a node of an [`AssocGraph`][crate::AssocGraph].
///
/// A handle stays valid until its node is destroyed. Using it afterwards is detected by the graph,
/// even when the slot was reused by a newer node, since that node has a different [`KeyId`].
///
/// Equality, ordering and hashing only consider the [`KeyId`].
#[derive(Clone, Copy)]
pub struct NodeId {
    key: KeyId,
    slot: SlotId,
}

impl NodeId {
    pub(crate) fn new(key: KeyId, slot: SlotId) -> Self {
        Self { key, slot }
    }

    /// Returns the node's identity.
    #[inline(always)]
    pub fn key_id(self) -> KeyId {
        self.key
    }

    #[inline(always)]
    pub(crate) fn slot(self) -> SlotId {
        self.slot
    }
}

impl PartialEq for NodeId {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for NodeId {}

impl Hash for NodeId {
    #[inline(always)]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key.hash(state)
    }
}

impl PartialOrd for NodeId {
    #[inline(always)]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NodeId {
    #[inline(always)]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key.cmp(&other.key)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.key.id_index())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

pub(crate) enum Slot {
    Vacant,
    Live(NodeState),
}

impl Slot {
    #[inline(always)]
    pub(crate) fn live(&self) -> Option<&NodeState> {
        match self {
            Slot::Live(state) => Some(state),
            Slot::Vacant => None,
        }
    }

    #[inline(always)]
    pub(crate) fn live_mut(&mut self) -> Option<&mut NodeState> {
        match self {
            Slot::Live(state) => Some(state),
            Slot::Vacant => None,
        }
    }
}

/// State of a live node.
///
/// `by_capability[c]` holds exactly those partners that declare capability `c`. Empty index
/// entries are removed.
pub(crate) struct NodeState {
    pub(crate) key: KeyId,
    pub(crate) capabilities: CapabilitySet,
    pub(crate) partners: NodeSet,
    pub(crate) by_capability: hashbrown::HashMap<CapabilityId, NodeSet, BuildZwoHasher>,
}

impl NodeState {
    pub(crate) fn new(key: KeyId, capabilities: CapabilitySet) -> Self {
        Self {
            key,
            capabilities,
            partners: NodeSet::default(),
            by_capability: Default::default(),
        }
    }

    pub(crate) fn index_partner(&mut self, partner: NodeId, capabilities: &CapabilitySet) {
        for capability in capabilities.iter() {
            self.index_partner_capability(partner, capability);
        }
    }

    pub(crate) fn index_partner_capability(&mut self, partner: NodeId, capability: CapabilityId) {
        self.by_capability
            .entry(capability)
            .or_default()
            .insert(partner);
    }

    pub(crate) fn unindex_partner(&mut self, partner: NodeId, capabilities: &CapabilitySet) {
        for capability in capabilities.iter() {
            self.unindex_partner_capability(partner, capability);
        }
    }

    pub(crate) fn unindex_partner_capability(&mut self, partner: NodeId, capability: CapabilityId) {
        if let Some(indexed) = self.by_capability.get_mut(&capability) {
            indexed.remove(&partner);
            if indexed.is_empty() {
                self.by_capability.remove(&capability);
            }
        }
    }
}
