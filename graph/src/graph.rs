//! The association registry.
use keyset_ids::{IdAlloc, IdVec};

use crate::{
    capability::{Capability, CapabilityId, CapabilityRegistry, CapabilitySet},
    error::{ContractViolation, InvariantViolation},
    node::{KeyId, NodeState, Slot, SlotId},
    view::NodeSet,
    NodeId,
};

/// Registry of nodes and their symmetric, non-owning associations.
///
/// Participant objects own a node each (see [`Key`][crate::Key] for an owning handle) and use the
/// graph to record which other participants they are related to. The graph maintains, after every
/// successful mutation:
///
/// * no node is its own partner,
/// * `b` is a partner of `a` if and only if `a` is a partner of `b`,
/// * destroyed nodes are not a partner of any node.
///
/// Nodes live in slab storage and are referred to by [`NodeId`] handles. Operations taking a
/// handle of a destroyed node panic, as does associating a node with itself. The `try_` variants
/// return a [`ContractViolation`] instead. Either way a rejected operation leaves the graph
/// unchanged.
///
/// The graph performs no internal locking. Sharing it between threads requires serializing all
/// mutations externally.
#[derive(Default)]
pub struct AssocGraph {
    keys: IdAlloc<KeyId>,
    slots: IdVec<SlotId, Slot>,
    free_slots: Vec<SlotId>,
    pub(crate) capabilities: CapabilityRegistry,
    live_count: usize,
}

impl std::fmt::Debug for AssocGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for node in self.nodes() {
            map.entry(&node, &self.expect_live(node).partners);
        }
        map.finish()
    }
}

/// Builder for nodes declaring several capabilities, see [`AssocGraph::builder`].
pub struct NodeBuilder<'a> {
    graph: &'a mut AssocGraph,
    capabilities: CapabilitySet,
}

impl NodeBuilder<'_> {
    /// Declares capability `T` for the node being built.
    pub fn capability<T: Capability>(mut self) -> Self {
        let capability = self.graph.capabilities.intern::<T>();
        self.capabilities.insert(capability);
        self
    }

    /// Creates the node.
    pub fn build(self) -> NodeId {
        self.graph.create_with_capabilities(self.capabilities)
    }
}

impl AssocGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty graph with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: IdVec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Creates a node without capabilities and without partners.
    pub fn create(&mut self) -> NodeId {
        self.create_with_capabilities(CapabilitySet::default())
    }

    /// Creates a node declaring capability `T`.
    pub fn create_with<T: Capability>(&mut self) -> NodeId {
        self.builder().capability::<T>().build()
    }

    /// Returns a builder for a node declaring any number of capabilities.
    pub fn builder(&mut self) -> NodeBuilder<'_> {
        NodeBuilder {
            graph: self,
            capabilities: CapabilitySet::default(),
        }
    }

    fn create_with_capabilities(&mut self, capabilities: CapabilitySet) -> NodeId {
        let key = match self.keys.alloc() {
            Ok(key) => key,
            Err(err) => panic!("cannot create node: {err}"),
        };
        let state = NodeState::new(key, capabilities);
        let slot = match self.free_slots.pop() {
            Some(slot) => {
                self.slots[slot] = Slot::Live(state);
                slot
            }
            None => self.slots.push(Slot::Live(state)).0,
        };
        self.live_count += 1;
        let node = NodeId::new(key, slot);
        log::debug!("created {node:?}");
        node
    }

    /// Returns `true` if `node` has not been destroyed.
    pub fn is_live(&self, node: NodeId) -> bool {
        self.live(node).is_ok()
    }

    /// Returns the number of live nodes.
    pub fn live_count(&self) -> usize {
        self.live_count
    }

    /// Returns the number of associations.
    pub fn edge_count(&self) -> usize {
        self.slots
            .values()
            .iter()
            .filter_map(Slot::live)
            .map(|state| state.partners.len())
            .sum::<usize>()
            / 2
    }

    /// Iterates over all live nodes, ordered by slot.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots
            .iter()
            .filter_map(|(slot, entry)| entry.live().map(|state| NodeId::new(state.key, slot)))
    }

    /// Returns the [`KeyId`] that the next created node will receive.
    pub fn next_key_id(&self) -> Option<KeyId> {
        self.keys.peek().ok()
    }

    pub(crate) fn live(&self, node: NodeId) -> Result<&NodeState, ContractViolation> {
        match self.slots.get(node.slot()).and_then(Slot::live) {
            Some(state) if state.key == node.key_id() => Ok(state),
            _ => Err(ContractViolation::StaleHandle { node }),
        }
    }

    fn live_mut(&mut self, node: NodeId) -> Result<&mut NodeState, ContractViolation> {
        match self.slots.get_mut(node.slot()).and_then(Slot::live_mut) {
            Some(state) if state.key == node.key_id() => Ok(state),
            _ => Err(ContractViolation::StaleHandle { node }),
        }
    }

    #[track_caller]
    pub(crate) fn expect_live(&self, node: NodeId) -> &NodeState {
        match self.live(node) {
            Ok(state) => state,
            Err(err) => err.raise(),
        }
    }

    #[track_caller]
    fn expect_live_mut(&mut self, node: NodeId) -> &mut NodeState {
        match self.live_mut(node) {
            Ok(state) => state,
            Err(err) => err.raise(),
        }
    }

    /// Returns the states of two distinct live nodes.
    fn live_pair_mut(
        &mut self,
        a: NodeId,
        b: NodeId,
    ) -> Result<(&mut NodeState, &mut NodeState), ContractViolation> {
        self.live(a)?;
        self.live(b)?;
        if a == b {
            return Err(ContractViolation::SelfAssociation { node: a });
        }
        // two live nodes never share a slot
        match self.slots.get_pair_mut(a.slot(), b.slot()) {
            Some((Slot::Live(state_a), Slot::Live(state_b))) => Ok((state_a, state_b)),
            _ => unreachable!("live nodes {a:?} and {b:?} share a slot"),
        }
    }

    /// Associates `a` and `b`, returning `true` if they were not associated before.
    ///
    /// # Panics
    ///
    /// Panics if `a == b` or if either node was destroyed.
    #[track_caller]
    pub fn associate(&mut self, a: NodeId, b: NodeId) -> bool {
        match self.try_associate(a, b) {
            Ok(added) => added,
            Err(err) => err.raise(),
        }
    }

    /// Associates `a` and `b`, returning `true` if they were not associated before.
    ///
    /// Fails without modifying the graph if `a == b` or if either node was destroyed.
    pub fn try_associate(&mut self, a: NodeId, b: NodeId) -> Result<bool, ContractViolation> {
        let (state_a, state_b) = self.live_pair_mut(a, b)?;
        if !state_a.partners.insert(b) {
            return Ok(false);
        }
        state_a.index_partner(b, &state_b.capabilities);
        state_b.partners.insert(a);
        state_b.index_partner(a, &state_a.capabilities);
        log::trace!("associated {a:?} with {b:?}");
        Ok(true)
    }

    /// Associates `node` with every node of `partners`, returning the number of new associations.
    ///
    /// # Panics
    ///
    /// Panics if `partners` contains `node` or a destroyed node. Associations added for earlier
    /// partners are kept in that case.
    #[track_caller]
    pub fn associate_all(
        &mut self,
        node: NodeId,
        partners: impl IntoIterator<Item = NodeId>,
    ) -> usize {
        let mut added = 0;
        for partner in partners {
            if self.associate(node, partner) {
                added += 1;
            }
        }
        added
    }

    /// Removes the association between `a` and `b`, returning `true` if there was one.
    ///
    /// Disassociating nodes that are not associated is a no-op.
    ///
    /// # Panics
    ///
    /// Panics if either node was destroyed.
    #[track_caller]
    pub fn disassociate(&mut self, a: NodeId, b: NodeId) -> bool {
        match self.try_disassociate(a, b) {
            Ok(removed) => removed,
            Err(err) => err.raise(),
        }
    }

    /// Removes the association between `a` and `b`, returning `true` if there was one.
    ///
    /// Fails without modifying the graph if either node was destroyed.
    pub fn try_disassociate(&mut self, a: NodeId, b: NodeId) -> Result<bool, ContractViolation> {
        match self.live_pair_mut(a, b) {
            Ok((state_a, state_b)) => Ok(Self::unlink(a, state_a, b, state_b)),
            // a node is never its own partner
            Err(ContractViolation::SelfAssociation { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn unlink(a: NodeId, state_a: &mut NodeState, b: NodeId, state_b: &mut NodeState) -> bool {
        if !state_a.partners.remove(&b) {
            return false;
        }
        state_a.unindex_partner(b, &state_b.capabilities);
        state_b.partners.remove(&a);
        state_b.unindex_partner(a, &state_a.capabilities);
        log::trace!("disassociated {a:?} from {b:?}");
        true
    }

    /// Removes the association between a live node and one of its partners.
    fn unlink_partner(&mut self, node: NodeId, partner: NodeId) -> bool {
        match self.live_pair_mut(node, partner) {
            Ok((state_node, state_partner)) => {
                Self::unlink(node, state_node, partner, state_partner)
            }
            Err(err) => unreachable!("partner {partner:?} of {node:?} is invalid: {err}"),
        }
    }

    /// Returns `true` if `a` and `b` are associated.
    ///
    /// A destroyed `b` is not associated with anything, so this returns `false` for it.
    ///
    /// # Panics
    ///
    /// Panics if `a` was destroyed.
    #[track_caller]
    pub fn is_associated(&self, a: NodeId, b: NodeId) -> bool {
        match self.try_is_associated(a, b) {
            Ok(associated) => associated,
            Err(err) => err.raise(),
        }
    }

    /// Returns `true` if `a` and `b` are associated.
    ///
    /// Fails if `a` was destroyed.
    pub fn try_is_associated(&self, a: NodeId, b: NodeId) -> Result<bool, ContractViolation> {
        // destroyed nodes are removed from all partner sets
        Ok(self.live(a)?.partners.contains(&b))
    }

    /// Returns a snapshot of all partners of `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` was destroyed.
    #[track_caller]
    pub fn associated(&self, node: NodeId) -> NodeSet {
        self.expect_live(node).partners.clone()
    }

    /// Returns the number of partners of `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` was destroyed.
    #[track_caller]
    pub fn partner_count(&self, node: NodeId) -> usize {
        self.expect_live(node).partners.len()
    }

    /// Disassociates `node` from all its partners, returning how many there were.
    ///
    /// The node stays live.
    ///
    /// # Panics
    ///
    /// Panics if `node` was destroyed.
    #[track_caller]
    pub fn clear_associations(&mut self, node: NodeId) -> usize {
        match self.try_clear_associations(node) {
            Ok(count) => count,
            Err(err) => err.raise(),
        }
    }

    /// Disassociates `node` from all its partners, returning how many there were.
    ///
    /// Fails without modifying the graph if `node` was destroyed.
    pub fn try_clear_associations(&mut self, node: NodeId) -> Result<usize, ContractViolation> {
        let partners = self.live(node)?.partners.to_sorted_vec();
        for &partner in &partners {
            self.unlink_partner(node, partner);
        }
        Ok(partners.len())
    }

    /// Disassociates `node` from those partners that declare capability `T`, returning how many
    /// there were.
    ///
    /// # Panics
    ///
    /// Panics if `node` was destroyed.
    #[track_caller]
    pub fn clear_associations_of<T: Capability>(&mut self, node: NodeId) -> usize {
        let capability = self.capabilities.lookup::<T>();
        let partners = match capability {
            Some(capability) => self.query_by_id(node, capability),
            None => {
                self.expect_live(node);
                return 0;
            }
        };
        for partner in &partners {
            self.unlink_partner(node, partner);
        }
        partners.len()
    }

    /// Destroys `node`, first removing it from the partner sets of all its partners.
    ///
    /// Returns the number of partners it had. The handle, and every copy of it, becomes stale.
    ///
    /// # Panics
    ///
    /// Panics if `node` was already destroyed.
    #[track_caller]
    pub fn destroy(&mut self, node: NodeId) -> usize {
        match self.try_destroy(node) {
            Ok(count) => count,
            Err(err) => err.raise(),
        }
    }

    /// Destroys `node`, first removing it from the partner sets of all its partners.
    ///
    /// Fails without modifying the graph if `node` was already destroyed.
    pub fn try_destroy(&mut self, node: NodeId) -> Result<usize, ContractViolation> {
        let count = self.try_clear_associations(node)?;
        self.slots[node.slot()] = Slot::Vacant;
        self.free_slots.push(node.slot());
        self.live_count -= 1;
        log::debug!("destroyed {node:?}, detached from {count} partners");
        Ok(count)
    }

    /// Creates a new node with the capabilities and partners of `node`.
    ///
    /// The copy is not associated with `node` itself. `node` keeps all of its associations.
    ///
    /// # Panics
    ///
    /// Panics if `node` was destroyed.
    #[track_caller]
    pub fn copy(&mut self, node: NodeId) -> NodeId {
        match self.try_copy(node) {
            Ok(copy) => copy,
            Err(err) => err.raise(),
        }
    }

    /// Creates a new node with the capabilities and partners of `node`.
    ///
    /// Fails without modifying the graph if `node` was destroyed.
    pub fn try_copy(&mut self, node: NodeId) -> Result<NodeId, ContractViolation> {
        let state = self.live(node)?;
        let partners = state.partners.to_sorted_vec();
        let capabilities = state.capabilities.clone();

        let copy = self.create_with_capabilities(capabilities);
        for &partner in &partners {
            let linked = self.try_associate(copy, partner);
            debug_assert_eq!(linked, Ok(true));
        }
        log::debug!("copied {node:?} to {copy:?} with {} partners", partners.len());
        Ok(copy)
    }

    /// Returns the capabilities declared by `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` was destroyed.
    #[track_caller]
    pub fn capabilities(&self, node: NodeId) -> &CapabilitySet {
        &self.expect_live(node).capabilities
    }

    /// Returns `true` if `node` declares capability `T`.
    ///
    /// # Panics
    ///
    /// Panics if `node` was destroyed.
    #[track_caller]
    pub fn has_capability<T: Capability>(&self, node: NodeId) -> bool {
        let state = self.expect_live(node);
        self.capabilities
            .lookup::<T>()
            .is_some_and(|capability| state.capabilities.contains(capability))
    }

    /// Returns the interned id of capability `T`, if any node ever declared it.
    pub fn capability_id<T: Capability>(&self) -> Option<CapabilityId> {
        self.capabilities.lookup::<T>()
    }

    /// Returns the name of an interned capability.
    pub fn capability_name(&self, capability: CapabilityId) -> Option<&'static str> {
        self.capabilities.name(capability)
    }

    /// Returns the number of distinct capabilities declared so far.
    pub fn capability_count(&self) -> usize {
        self.capabilities.len()
    }

    /// Declares capability `T` for an existing node, returning `true` if it was not declared yet.
    ///
    /// The node immediately shows up in typed queries of its partners.
    ///
    /// # Panics
    ///
    /// Panics if `node` was destroyed.
    #[track_caller]
    pub fn grant_capability<T: Capability>(&mut self, node: NodeId) -> bool {
        self.expect_live(node);
        let capability = self.capabilities.intern::<T>();
        let state = self.expect_live_mut(node);
        if !state.capabilities.insert(capability) {
            return false;
        }
        for partner in state.partners.to_sorted_vec() {
            self.expect_live_mut(partner)
                .index_partner_capability(node, capability);
        }
        true
    }

    /// Withdraws capability `T` from a node, returning `true` if it was declared.
    ///
    /// # Panics
    ///
    /// Panics if `node` was destroyed.
    #[track_caller]
    pub fn revoke_capability<T: Capability>(&mut self, node: NodeId) -> bool {
        let state = self.expect_live(node);
        let Some(capability) = self.capabilities.lookup::<T>() else {
            return false;
        };
        if !state.capabilities.contains(capability) {
            return false;
        }
        let state = self.expect_live_mut(node);
        state.capabilities.remove(capability);
        for partner in state.partners.to_sorted_vec() {
            self.expect_live_mut(partner)
                .unindex_partner_capability(node, capability);
        }
        true
    }

    /// Verifies all graph invariants, including the consistency of the capability index.
    ///
    /// This visits every association and is meant for tests and debugging.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let mut found = 0;
        for node in self.nodes() {
            found += 1;
            let state = self.expect_live(node);

            for partner in &state.partners {
                if partner == node {
                    return Err(InvariantViolation::SelfAssociation { node });
                }
                let Ok(partner_state) = self.live(partner) else {
                    return Err(InvariantViolation::Dangling { node, partner });
                };
                if !partner_state.partners.contains(&node) {
                    return Err(InvariantViolation::Asymmetric { node, partner });
                }
                for capability in partner_state.capabilities.iter() {
                    let indexed = state
                        .by_capability
                        .get(&capability)
                        .is_some_and(|indexed| indexed.contains(&partner));
                    if !indexed {
                        return Err(InvariantViolation::CapabilityIndex { node, partner });
                    }
                }
            }

            for (&capability, indexed) in &state.by_capability {
                for partner in indexed {
                    let declared = self.live(partner).is_ok_and(|partner_state| {
                        partner_state.capabilities.contains(capability)
                    });
                    if !declared || !state.partners.contains(&partner) {
                        return Err(InvariantViolation::CapabilityIndex { node, partner });
                    }
                }
            }
        }

        if found != self.live_count {
            return Err(InvariantViolation::LiveCount {
                tracked: self.live_count,
                found,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/test_assoc_graph.rs"]
mod test_assoc_graph;
