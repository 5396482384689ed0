//! Contract violations and invariant check failures.
use std::fmt;

use crate::NodeId;

/// A misuse of the graph API by the caller.
///
/// The panicking operations of [`AssocGraph`][crate::AssocGraph] raise these as panics, the `try_`
/// variants return them. In both cases the graph is left untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContractViolation {
    /// An attempt to associate a node with itself.
    SelfAssociation {
        /// The node passed as both endpoints.
        node: NodeId,
    },
    /// A handle referring to a node that was destroyed.
    StaleHandle {
        /// The stale handle.
        node: NodeId,
    },
}

impl ContractViolation {
    /// Panics with this violation as message.
    #[track_caller]
    #[cold]
    pub fn raise(self) -> ! {
        panic!("{self}")
    }

    /// Returns the node handle that caused the violation.
    pub fn node(&self) -> NodeId {
        match *self {
            ContractViolation::SelfAssociation { node } => node,
            ContractViolation::StaleHandle { node } => node,
        }
    }
}

impl fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractViolation::SelfAssociation { node } => {
                write!(f, "cannot associate {node:?} with itself")
            }
            ContractViolation::StaleHandle { node } => {
                write!(f, "{node:?} refers to a destroyed node")
            }
        }
    }
}

impl std::error::Error for ContractViolation {}

/// Corruption found by [`AssocGraph::check_invariants`][crate::AssocGraph::check_invariants].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    /// A node lists itself as a partner.
    SelfAssociation {
        /// The offending node.
        node: NodeId,
    },
    /// A node lists a partner that is no longer live.
    Dangling {
        /// The node holding the partner entry.
        node: NodeId,
        /// The destroyed partner.
        partner: NodeId,
    },
    /// A node lists a partner that does not list it back.
    Asymmetric {
        /// The node holding the partner entry.
        node: NodeId,
        /// The partner missing the reverse entry.
        partner: NodeId,
    },
    /// The per-capability partner index of a node disagrees with its partners' capabilities.
    CapabilityIndex {
        /// The node whose index is inconsistent.
        node: NodeId,
        /// The partner that is missing from or wrongly present in the index.
        partner: NodeId,
    },
    /// The number of live slots differs from the tracked live node count.
    LiveCount {
        /// The tracked count.
        tracked: usize,
        /// The number of live slots found.
        found: usize,
    },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantViolation::SelfAssociation { node } => {
                write!(f, "{node:?} is associated with itself")
            }
            InvariantViolation::Dangling { node, partner } => {
                write!(f, "{node:?} lists destroyed partner {partner:?}")
            }
            InvariantViolation::Asymmetric { node, partner } => {
                write!(f, "{node:?} lists {partner:?} but not the other way round")
            }
            InvariantViolation::CapabilityIndex { node, partner } => {
                write!(f, "capability index of {node:?} is inconsistent for {partner:?}")
            }
            InvariantViolation::LiveCount { tracked, found } => {
                write!(f, "tracking {tracked} live nodes but found {found}")
            }
        }
    }
}

impl std::error::Error for InvariantViolation {}
