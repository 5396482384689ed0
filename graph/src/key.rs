//! Owning node handles for participant objects.
use std::{
    cell::RefCell,
    fmt,
    hash::Hash,
    rc::{Rc, Weak},
};

use crate::{capability::Capability, view::NodeSet, AssocGraph, KeyId, NodeId};

/// A graph shared by all participants of one thread.
pub type SharedGraph = Rc<RefCell<AssocGraph>>;

impl AssocGraph {
    /// Wraps the graph for use with [`Key`]s.
    pub fn into_shared(self) -> SharedGraph {
        Rc::new(RefCell::new(self))
    }
}

/// A node owned by a participant object.
///
/// Participants embed a `Key` to take part in the association graph. Dropping the key destroys
/// its node, which removes it from the partner sets of all its partners. Cloning a key creates a
/// new node with the same capabilities and partners, see [`AssocGraph::copy`].
///
/// A key only holds a weak reference to its graph. Once the graph is gone, dropping the key does
/// nothing, while any other operation panics.
///
/// ```
/// # use keyset_graph::{AssocGraph, Capability, Key};
/// struct View;
///
/// impl Capability for View {
///     const NAME: &'static str = "view";
/// }
///
/// let graph = AssocGraph::new().into_shared();
/// let document = Key::new(&graph);
/// let view = Key::with_capability::<View>(&graph);
///
/// document.associate(&view);
/// assert_eq!(document.query::<View>().len(), 1);
///
/// drop(view);
/// assert!(document.query::<View>().is_empty());
/// ```
pub struct Key {
    graph: Weak<RefCell<AssocGraph>>,
    node: NodeId,
}

impl Key {
    /// Creates a key owning a new node without capabilities.
    pub fn new(graph: &SharedGraph) -> Self {
        let node = graph.borrow_mut().create();
        Self::adopt(graph, node)
    }

    /// Creates a key owning a new node declaring capability `T`.
    pub fn with_capability<T: Capability>(graph: &SharedGraph) -> Self {
        let node = graph.borrow_mut().create_with::<T>();
        Self::adopt(graph, node)
    }

    /// Takes ownership of an existing node, which will be destroyed when the key is dropped.
    ///
    /// # Panics
    ///
    /// Panics if `node` was destroyed.
    #[track_caller]
    pub fn adopt(graph: &SharedGraph, node: NodeId) -> Self {
        if let Err(err) = graph.borrow().live(node) {
            err.raise()
        }
        Self {
            graph: Rc::downgrade(graph),
            node,
        }
    }

    /// Returns the handle of the owned node.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Returns the identity of the owned node.
    pub fn id(&self) -> KeyId {
        self.node.key_id()
    }

    /// Returns the graph this key belongs to.
    ///
    /// # Panics
    ///
    /// Panics if the graph was dropped.
    #[track_caller]
    pub fn graph(&self) -> SharedGraph {
        match self.graph.upgrade() {
            Some(graph) => graph,
            None => panic!("graph of {:?} was dropped", self.node),
        }
    }

    #[track_caller]
    fn same_graph(&self, other: &Key) -> SharedGraph {
        if !Weak::ptr_eq(&self.graph, &other.graph) {
            panic!("{:?} and {:?} belong to different graphs", self.node, other.node);
        }
        self.graph()
    }

    /// Associates this key's node with the node of `other`.
    ///
    /// Returns `true` if they were not associated before.
    ///
    /// # Panics
    ///
    /// Panics if both keys are the same or belong to different graphs.
    #[track_caller]
    pub fn associate(&self, other: &Key) -> bool {
        self.same_graph(other)
            .borrow_mut()
            .associate(self.node, other.node)
    }

    /// Removes the association with the node of `other`, returning `true` if there was one.
    ///
    /// # Panics
    ///
    /// Panics if the keys belong to different graphs.
    #[track_caller]
    pub fn disassociate(&self, other: &Key) -> bool {
        self.same_graph(other)
            .borrow_mut()
            .disassociate(self.node, other.node)
    }

    /// Returns `true` if this key's node is associated with the node of `other`.
    ///
    /// # Panics
    ///
    /// Panics if the keys belong to different graphs.
    #[track_caller]
    pub fn is_associated(&self, other: &Key) -> bool {
        self.same_graph(other)
            .borrow()
            .is_associated(self.node, other.node)
    }

    /// Returns a snapshot of all partners.
    #[track_caller]
    pub fn associated(&self) -> NodeSet {
        self.graph().borrow().associated(self.node)
    }

    /// Returns the partners declaring capability `T`.
    #[track_caller]
    pub fn query<T: Capability>(&self) -> NodeSet {
        self.graph().borrow().query::<T>(self.node)
    }

    /// Returns the oldest partner declaring capability `T`.
    #[track_caller]
    pub fn first_of<T: Capability>(&self) -> Option<NodeId> {
        self.graph().borrow().first_of::<T>(self.node)
    }

    /// Disassociates from all partners, returning how many there were.
    #[track_caller]
    pub fn clear_associations(&self) -> usize {
        self.graph().borrow_mut().clear_associations(self.node)
    }

    /// Disassociates from all partners declaring capability `T`, returning how many there were.
    #[track_caller]
    pub fn clear_associations_of<T: Capability>(&self) -> usize {
        self.graph()
            .borrow_mut()
            .clear_associations_of::<T>(self.node)
    }
}

impl Clone for Key {
    #[track_caller]
    fn clone(&self) -> Self {
        let graph = self.graph();
        let node = graph.borrow_mut().copy(self.node);
        Self {
            graph: self.graph.clone(),
            node,
        }
    }
}

impl Drop for Key {
    fn drop(&mut self) {
        let Some(graph) = self.graph.upgrade() else {
            return;
        };
        let borrowed = graph.try_borrow_mut();
        match borrowed {
            Ok(mut graph) => {
                // the node may have been destroyed through the graph directly
                if graph.is_live(self.node) {
                    graph.destroy(self.node);
                }
            }
            Err(_) if std::thread::panicking() => {
                log::error!("leaking {:?}, graph is borrowed during unwinding", self.node);
            }
            Err(err) => panic!(
                "cannot destroy {:?} while its graph is borrowed: {err}",
                self.node
            ),
        }
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node && Weak::ptr_eq(&self.graph, &other.graph)
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.node.hash(state)
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Key").field(&self.node).finish()
    }
}
