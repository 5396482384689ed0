#![allow(missing_docs)]
use super::*;
use crate::{capability::Capability, node::KeyId};
use keyset_ids::Id;
use rand::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

#[cfg(miri)]
const STEPS: usize = 200;
#[cfg(not(miri))]
const STEPS: usize = 20_000;

struct Document;
impl Capability for Document {
    const NAME: &'static str = "document";
}

struct View;
impl Capability for View {
    const NAME: &'static str = "view";
}

struct Session;
impl Capability for Session {
    const NAME: &'static str = "session";
}

const CAPABILITY_NAMES: [&str; 3] = [Document::NAME, View::NAME, Session::NAME];

/// Runs every operation on both the graph and a naive reference model and compares the results.
struct CheckedGraph {
    dut: AssocGraph,
    partners: BTreeMap<KeyId, BTreeSet<KeyId>>,
    capabilities: BTreeMap<KeyId, BTreeSet<&'static str>>,
    live: Vec<NodeId>,
    dead: Vec<NodeId>,
}

impl CheckedGraph {
    fn new() -> Self {
        CheckedGraph {
            dut: AssocGraph::new(),
            partners: BTreeMap::new(),
            capabilities: BTreeMap::new(),
            live: vec![],
            dead: vec![],
        }
    }

    fn register(&mut self, node: NodeId, capabilities: BTreeSet<&'static str>) {
        if let Some(&newest) = self.partners.keys().next_back() {
            assert!(node.key_id() > newest);
        }
        self.partners.insert(node.key_id(), BTreeSet::new());
        self.capabilities.insert(node.key_id(), capabilities);
        self.live.push(node);
    }

    fn create(&mut self, rng: &mut impl Rng) -> NodeId {
        let mut builder = self.dut.builder();
        let mut capabilities = BTreeSet::new();
        if rng.gen_bool(0.4) {
            builder = builder.capability::<Document>();
            capabilities.insert(Document::NAME);
        }
        if rng.gen_bool(0.4) {
            builder = builder.capability::<View>();
            capabilities.insert(View::NAME);
        }
        if rng.gen_bool(0.2) {
            builder = builder.capability::<Session>();
            capabilities.insert(Session::NAME);
        }
        let node = builder.build();
        self.register(node, capabilities);
        node
    }

    fn associate(&mut self, a: NodeId, b: NodeId) {
        if a == b {
            assert_eq!(
                self.dut.try_associate(a, b),
                Err(ContractViolation::SelfAssociation { node: a })
            );
            return;
        }
        let expected = self.partners.get_mut(&a.key_id()).unwrap().insert(b.key_id());
        self.partners.get_mut(&b.key_id()).unwrap().insert(a.key_id());
        assert_eq!(self.dut.associate(a, b), expected);
    }

    fn disassociate(&mut self, a: NodeId, b: NodeId) {
        let expected = self.partners.get_mut(&a.key_id()).unwrap().remove(&b.key_id());
        self.partners.get_mut(&b.key_id()).unwrap().remove(&a.key_id());
        assert_eq!(self.dut.disassociate(a, b), expected);
    }

    fn detach_all(&mut self, node: NodeId, only: Option<&'static str>) -> usize {
        let targets: Vec<KeyId> = self.partners[&node.key_id()]
            .iter()
            .copied()
            .filter(|partner| only.map_or(true, |name| self.capabilities[partner].contains(name)))
            .collect();
        for partner in &targets {
            self.partners.get_mut(partner).unwrap().remove(&node.key_id());
            self.partners.get_mut(&node.key_id()).unwrap().remove(partner);
        }
        targets.len()
    }

    fn clear(&mut self, node: NodeId) {
        let expected = self.detach_all(node, None);
        assert_eq!(self.dut.clear_associations(node), expected);
    }

    fn clear_views(&mut self, node: NodeId) {
        let expected = self.detach_all(node, Some(View::NAME));
        assert_eq!(self.dut.clear_associations_of::<View>(node), expected);
    }

    fn destroy(&mut self, index: usize) {
        let node = self.live.swap_remove(index);
        let expected = self.detach_all(node, None);
        self.partners.remove(&node.key_id());
        self.capabilities.remove(&node.key_id());
        assert_eq!(self.dut.destroy(node), expected);
        self.dead.push(node);
    }

    fn copy(&mut self, node: NodeId) {
        let copy = self.dut.copy(node);
        let partners = self.partners[&node.key_id()].clone();
        let capabilities = self.capabilities[&node.key_id()].clone();
        self.register(copy, capabilities);
        for partner in &partners {
            self.partners.get_mut(partner).unwrap().insert(copy.key_id());
        }
        self.partners.insert(copy.key_id(), partners);
        assert!(!self.dut.is_associated(node, copy));
    }

    fn grant_view(&mut self, node: NodeId) {
        let expected = self
            .capabilities
            .get_mut(&node.key_id())
            .unwrap()
            .insert(View::NAME);
        assert_eq!(self.dut.grant_capability::<View>(node), expected);
    }

    fn revoke_view(&mut self, node: NodeId) {
        let expected = self
            .capabilities
            .get_mut(&node.key_id())
            .unwrap()
            .remove(View::NAME);
        assert_eq!(self.dut.revoke_capability::<View>(node), expected);
    }

    fn expected_query(&self, node: NodeId, name: &str) -> BTreeSet<KeyId> {
        self.partners[&node.key_id()]
            .iter()
            .copied()
            .filter(|partner| self.capabilities[partner].contains(name))
            .collect()
    }

    fn check_node(&self, node: NodeId) {
        let keys = |set: NodeSet| set.iter().map(NodeId::key_id).collect::<BTreeSet<_>>();

        assert_eq!(keys(self.dut.associated(node)), self.partners[&node.key_id()]);
        assert_eq!(self.dut.partner_count(node), self.partners[&node.key_id()].len());
        assert_eq!(
            keys(self.dut.query::<Document>(node)),
            self.expected_query(node, Document::NAME)
        );
        assert_eq!(keys(self.dut.query::<View>(node)), self.expected_query(node, View::NAME));
        assert_eq!(
            self.dut.query_count::<Session>(node),
            self.expected_query(node, Session::NAME).len()
        );
        assert_eq!(
            self.dut.first_of::<View>(node).map(NodeId::key_id),
            self.expected_query(node, View::NAME).first().copied()
        );
        for name in CAPABILITY_NAMES {
            let declared = match name {
                "document" => self.dut.has_capability::<Document>(node),
                "view" => self.dut.has_capability::<View>(node),
                _ => self.dut.has_capability::<Session>(node),
            };
            assert_eq!(declared, self.capabilities[&node.key_id()].contains(name));
        }
    }

    fn check_all(&self) {
        self.dut.check_invariants().unwrap();
        assert_eq!(self.dut.live_count(), self.live.len());
        assert_eq!(
            self.dut.edge_count(),
            self.partners.values().map(BTreeSet::len).sum::<usize>() / 2
        );
        for &node in &self.live {
            self.check_node(node);
        }
        for &node in &self.dead {
            assert!(!self.dut.is_live(node));
            assert_eq!(
                self.dut.try_is_associated(node, node),
                Err(ContractViolation::StaleHandle { node })
            );
            if let Some(&live) = self.live.first() {
                assert_eq!(self.dut.try_is_associated(live, node), Ok(false));
            }
        }
    }
}

#[test]
fn random_operations_match_reference_model() {
    let mut rng = SmallRng::seed_from_u64(0x6b65_7973);
    let mut checked = CheckedGraph::new();

    for step in 0..STEPS {
        if checked.live.len() < 2 || rng.gen_bool(0.1) {
            checked.create(&mut rng);
            continue;
        }
        let a = *checked.live.choose(&mut rng).unwrap();
        let b = *checked.live.choose(&mut rng).unwrap();
        match rng.gen_range(0..100) {
            0..=39 => checked.associate(a, b),
            40..=59 => checked.disassociate(a, b),
            60..=64 => checked.clear(a),
            65..=69 => checked.clear_views(a),
            70..=79 => {
                let index = rng.gen_range(0..checked.live.len());
                checked.destroy(index)
            }
            80..=84 => checked.copy(a),
            85..=89 => checked.grant_view(a),
            90..=94 => checked.revoke_view(a),
            _ => checked.check_node(a),
        }
        if step % 97 == 0 {
            checked.check_all();
        }
    }
    checked.check_all();
}

#[test]
fn freed_slots_are_reused_with_fresh_keys() {
    let mut graph = AssocGraph::new();
    let a = graph.create();
    let b = graph.create();
    graph.associate(a, b);
    graph.destroy(a);

    let c = graph.create();
    assert_eq!(c.slot(), a.slot());
    assert!(c.key_id() > b.key_id());
    assert!(!graph.is_live(a));
    assert!(graph.is_live(c));
    assert!(!graph.is_associated(b, c));
    assert_eq!(
        graph.try_associate(a, b),
        Err(ContractViolation::StaleHandle { node: a })
    );
    graph.check_invariants().unwrap();
}

#[test]
fn rejected_operations_leave_graph_unchanged() {
    let mut graph = AssocGraph::new();
    let a = graph.create_with::<View>();
    let b = graph.create();
    let gone = graph.create();
    graph.associate(a, b);
    graph.destroy(gone);

    assert_eq!(
        graph.try_associate(a, a),
        Err(ContractViolation::SelfAssociation { node: a })
    );
    assert_eq!(
        graph.try_associate(a, gone),
        Err(ContractViolation::StaleHandle { node: gone })
    );
    assert_eq!(
        graph.try_disassociate(gone, b),
        Err(ContractViolation::StaleHandle { node: gone })
    );
    assert_eq!(
        graph.try_copy(gone),
        Err(ContractViolation::StaleHandle { node: gone })
    );
    assert_eq!(
        graph.try_clear_associations(gone),
        Err(ContractViolation::StaleHandle { node: gone })
    );

    assert_eq!(graph.live_count(), 2);
    assert_eq!(graph.edge_count(), 1);
    assert_eq!(graph.associated(a).to_sorted_vec(), [b]);
    assert_eq!(graph.query::<View>(b).to_sorted_vec(), [a]);
    graph.check_invariants().unwrap();
}

#[test]
fn check_invariants_detects_corruption() {
    let mut graph = AssocGraph::new();
    let a = graph.create_with::<View>();
    let b = graph.create();
    graph.associate(a, b);

    graph.live_mut(a).unwrap().partners.remove(&b);
    assert_eq!(
        graph.check_invariants(),
        Err(InvariantViolation::Asymmetric { node: b, partner: a })
    );

    graph.live_mut(a).unwrap().partners.insert(b);
    let view = graph.capability_id::<View>().unwrap();
    graph
        .live_mut(b)
        .unwrap()
        .unindex_partner_capability(a, view);
    assert_eq!(
        graph.check_invariants(),
        Err(InvariantViolation::CapabilityIndex { node: b, partner: a })
    );
}

#[test]
fn key_ids_follow_allocation_order() {
    let mut graph = AssocGraph::with_capacity(4);
    let expected = graph.next_key_id().unwrap();
    let first = graph.create();
    assert_eq!(first.key_id(), expected);
    assert_eq!(first.key_id().id_index() + 1, graph.create().key_id().id_index());
}
