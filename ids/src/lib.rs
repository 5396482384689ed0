//! Type checked integer ids, a monotonic id allocator and id indexed storage.
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod id;
pub mod id_alloc;
pub mod id_vec;

/// Derives an [`Id`] instance for a newtype wrapper around an existing [`Id`] type.
///
/// Deriving an [`Id`] instance requires the `#[repr(transparent)]` attribute on the target struct.
///
/// This also derives [`Id`]'s supertraits [`Clone`], [`Copy`], [`PartialEq`], [`Eq`],
/// [`PartialOrd`], [`Ord`] and [`Hash`] by forwarding to the wrapped id, so that they agree with
/// [`Id::id_index`]. [`Debug`][core::fmt::Debug] is left to the user.
pub use keyset_derive::Id;

pub use id::Id;

pub use id_alloc::{IdAlloc, IdAllocError};

pub use id_vec::IdVec;
