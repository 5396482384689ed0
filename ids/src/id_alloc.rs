//! A monotonic allocator for IDs.
use std::sync::atomic::Ordering::Relaxed;
use std::{fmt, marker::PhantomData, ops::Range, sync::atomic::AtomicUsize};

use crate::Id;

/// A monotonic allocator for IDs.
///
/// Every allocated ID is strictly larger than all IDs allocated before it by the same allocator.
/// IDs are never handed out twice and the allocator cannot be reset, so exhausting the index range
/// of `T` is reported as an error instead of wrapping around.
///
/// The counter is atomic, so an allocator can be shared between threads even when the data
/// structures using the allocated IDs are not.
pub struct IdAlloc<T> {
    counter: AtomicUsize,
    _phantom: PhantomData<T>,
}

impl<T: Id> Default for IdAlloc<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for IdAlloc<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdAlloc")
            .field("allocated", &self.counter.load(Relaxed))
            .finish()
    }
}

/// `IdAllocError` indicates that there are not enough IDs remaining.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdAllocError;

impl fmt::Display for IdAllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("id allocator exhausted")
    }
}

impl std::error::Error for IdAllocError {}

impl<T: Id> IdAlloc<T> {
    /// Constructs a new ID allocator.
    pub const fn new() -> Self {
        Self {
            counter: AtomicUsize::new(0),
            _phantom: PhantomData,
        }
    }

    fn alloc_indices(&self, n: usize) -> Result<usize, IdAllocError> {
        self.counter
            .fetch_update(Relaxed, Relaxed, |current_id| {
                current_id
                    .checked_add(n)
                    .filter(|&index| index <= T::MAX_ID_INDEX.saturating_add(1))
            })
            .map_err(|_| IdAllocError)
    }

    /// Allocates a single ID.
    pub fn alloc(&self) -> Result<T, IdAllocError> {
        self.alloc_indices(1).map(T::from_id_index)
    }

    /// Allocates `n` consecutive IDs, returned as their index range.
    pub fn alloc_range(&self, n: usize) -> Result<Range<usize>, IdAllocError> {
        self.alloc_indices(n).map(|start| start..start + n)
    }

    /// Returns the ID that would be allocated by the next call to `alloc`.
    pub fn peek(&self) -> Result<T, IdAllocError> {
        T::try_from_id_index(self.counter.load(Relaxed)).ok_or(IdAllocError)
    }

    /// Returns how many IDs were handed out so far.
    pub fn allocated(&self) -> usize {
        self.counter.load(Relaxed)
    }
}
