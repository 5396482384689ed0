//! Declared capability tags used for typed queries.
//!
//! A capability names the kind of participant that owns a node, e.g. a document or a view. Nodes
//! declare their capabilities explicitly, the graph never inspects the participant objects.
use std::any::TypeId;

use keyset_ids::{Id, IdVec};

use crate::BuildZwoHasher;

/// A capability that nodes can declare.
///
/// Usually implemented by the participant type itself or by a zero-sized marker type.
///
/// ```
/// # use keyset_graph::{AssocGraph, Capability};
/// struct Document;
///
/// impl Capability for Document {
///     const NAME: &'static str = "document";
/// }
///
/// let mut graph = AssocGraph::new();
/// let doc = graph.create_with::<Document>();
/// assert!(graph.has_capability::<Document>(doc));
/// ```
pub trait Capability: 'static {
    /// Human readable name, used for diagnostics only.
    const NAME: &'static str;
}

/// Interned capability, local to one graph.
#[derive(Id, Debug)]
#[repr(transparent)]
pub struct CapabilityId(u32);

/// The set of capabilities declared by a node.
///
/// Nodes rarely declare more than a handful of capabilities, so this is a sorted vector.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct CapabilitySet {
    sorted: Vec<CapabilityId>,
}

impl CapabilitySet {
    /// Returns `true` if the set contains the given capability.
    pub fn contains(&self, capability: CapabilityId) -> bool {
        self.sorted.binary_search(&capability).is_ok()
    }

    /// Adds a capability, returning `true` if it was not present before.
    pub fn insert(&mut self, capability: CapabilityId) -> bool {
        match self.sorted.binary_search(&capability) {
            Ok(_) => false,
            Err(pos) => {
                self.sorted.insert(pos, capability);
                true
            }
        }
    }

    /// Removes a capability, returning `true` if it was present.
    pub fn remove(&mut self, capability: CapabilityId) -> bool {
        match self.sorted.binary_search(&capability) {
            Ok(pos) => {
                self.sorted.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    /// Iterates over the capabilities in ascending order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = CapabilityId> + '_ {
        self.sorted.iter().copied()
    }

    /// Returns the number of capabilities.
    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    /// Returns `true` if no capability is declared.
    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }
}

impl FromIterator<CapabilityId> for CapabilitySet {
    fn from_iter<T: IntoIterator<Item = CapabilityId>>(iter: T) -> Self {
        let mut sorted = Vec::from_iter(iter);
        sorted.sort_unstable();
        sorted.dedup();
        Self { sorted }
    }
}

/// Interns capability types as [`CapabilityId`]s.
#[derive(Default)]
pub(crate) struct CapabilityRegistry {
    by_type: hashbrown::HashMap<TypeId, CapabilityId, BuildZwoHasher>,
    names: IdVec<CapabilityId, &'static str>,
}

impl CapabilityRegistry {
    pub(crate) fn intern<T: Capability>(&mut self) -> CapabilityId {
        let names = &mut self.names;
        *self.by_type.entry(TypeId::of::<T>()).or_insert_with(|| {
            let (id, _) = names.push(T::NAME);
            log::debug!("registered capability {:?} as {id:?}", T::NAME);
            id
        })
    }

    pub(crate) fn lookup<T: Capability>(&self) -> Option<CapabilityId> {
        self.by_type.get(&TypeId::of::<T>()).copied()
    }

    pub(crate) fn name(&self, capability: CapabilityId) -> Option<&'static str> {
        self.names.get(capability).copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.names.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Document;
    impl Capability for Document {
        const NAME: &'static str = "document";
    }

    struct View;
    impl Capability for View {
        const NAME: &'static str = "view";
    }

    #[test]
    fn interning_is_stable() {
        let mut registry = CapabilityRegistry::default();
        assert_eq!(registry.lookup::<View>(), None);

        let document = registry.intern::<Document>();
        let view = registry.intern::<View>();
        assert_ne!(document, view);
        assert_eq!(registry.intern::<Document>(), document);
        assert_eq!(registry.lookup::<View>(), Some(view));
        assert_eq!(registry.name(view), Some("view"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn set_stays_sorted_and_deduplicated() {
        let [a, b, c] = [0, 1, 2].map(CapabilityId::from_id_index);
        let mut set = CapabilitySet::from_iter([c, a, c]);
        assert_eq!(set.iter().collect::<Vec<_>>(), [a, c]);

        assert!(set.insert(b));
        assert!(!set.insert(b));
        assert_eq!(set.iter().collect::<Vec<_>>(), [a, b, c]);

        assert!(set.remove(a));
        assert!(!set.remove(a));
        assert!(set.contains(c));
        assert!(!set.contains(a));
        assert_eq!(set.len(), 2);
    }
}
