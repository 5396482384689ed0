//! Keyset - associations between otherwise unrelated long-lived objects
//!
//! Participant objects embed a [`Key`] to join an association graph. Keys are associated pairwise,
//! every association is visible from both ends, and dropping a key removes its node from the
//! partner sets of all its partners. Typed queries find the partners of a given [`Capability`].
//!
//! ```
//! use keyset::prelude::*;
//!
//! struct Document {
//!     key: Key,
//! }
//!
//! struct View {
//!     key: Key,
//! }
//!
//! impl Capability for View {
//!     const NAME: &'static str = "view";
//! }
//!
//! let graph = AssocGraph::new().into_shared();
//! let document = Document { key: Key::new(&graph) };
//! let views: Vec<View> = (0..3)
//!     .map(|_| View { key: Key::with_capability::<View>(&graph) })
//!     .collect();
//!
//! for view in &views {
//!     view.key.associate(&document.key);
//! }
//! assert_eq!(document.key.query::<View>().len(), 3);
//!
//! drop(views);
//! assert!(document.key.associated().is_empty());
//! ```
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub use keyset_graph::{
    capability, error, key, merge, node, view, AssocGraph, Capability, CapabilityId,
    CapabilitySet, ContractViolation, InvariantViolation, Key, KeyId, NodeBuilder, NodeId,
    NodeSet, SharedGraph,
};

pub use keyset_ids as ids;

pub mod prelude {
    //! Re-exports of the commonly used association graph types.
    pub use keyset_graph::{AssocGraph, Capability, Key, NodeId, NodeSet, SharedGraph};
}
