//! Symmetric, non-owning associations between otherwise unrelated participant objects.
//!
//! Each participant owns a node of an [`AssocGraph`], usually through a [`Key`]. Nodes are
//! associated pairwise, every association is visible from both ends, and destroying a node removes
//! it from all partner sets. Nodes declare [`Capability`] tags describing what kind of participant
//! owns them, which allows typed queries such as "all views associated with this document".
#![deny(unsafe_code)]
#![warn(missing_docs)]

use std::hash::BuildHasherDefault;

use zwohash::ZwoHasher;

pub mod capability;
pub mod error;
mod graph;
pub mod key;
pub mod node;
pub mod view;

pub use capability::{Capability, CapabilityId, CapabilitySet};
pub use error::{ContractViolation, InvariantViolation};
pub use graph::{AssocGraph, NodeBuilder};
pub use key::{Key, SharedGraph};
pub use node::{KeyId, NodeId};
pub use view::{merge, NodeSet};

pub(crate) type BuildZwoHasher = BuildHasherDefault<ZwoHasher>;
