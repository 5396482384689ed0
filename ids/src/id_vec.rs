//! [`Vec`] wrapper with [`Id`] indexing.
use core::{
    fmt::{self, Debug},
    iter::FusedIterator,
    marker::PhantomData,
    ops::{Index, IndexMut},
};

use crate::Id;

/// [`Vec`] wrapper, representing a collection that maps `K` keys to `V` values.
///
/// It has entries `(k, v)` with `v` being the item at position [`k.id_index()`][Id::id_index] of
/// the wrapped vector. This means the keys always span a contiguous range of ids starting at
/// [`K::MIN_ID`][Id::MIN_ID], having index `0`.
///
/// Pushing beyond the index range of `K` panics, so every entry always has a valid key.
pub struct IdVec<K, V> {
    values: Vec<V>,
    _phantom: PhantomData<K>,
}

impl<K: Id, V: Clone> Clone for IdVec<K, V> {
    #[inline(always)]
    fn clone(&self) -> Self {
        Self {
            values: self.values.clone(),
            _phantom: PhantomData,
        }
    }
}

impl<K: Id, V> Default for IdVec<K, V> {
    #[inline(always)]
    fn default() -> Self {
        Self {
            values: Default::default(),
            _phantom: PhantomData,
        }
    }
}

impl<K: Id, V> IdVec<K, V> {
    /// Creates an empty `IdVec` with at least the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
            _phantom: PhantomData,
        }
    }

    /// Returns the key that the next [`push`][Self::push] will use.
    ///
    /// Returns `None` when `K` cannot represent any further keys.
    #[inline]
    pub fn next_key(&self) -> Option<K> {
        K::try_from_id_index(self.values.len())
    }

    /// Appends a value, returning its key together with a mutable reference to it.
    ///
    /// # Panics
    ///
    /// Panics when `K` cannot index the new entry.
    #[inline]
    #[track_caller]
    pub fn push(&mut self, value: V) -> (K, &mut V) {
        let key = K::from_id_index(self.values.len());
        self.values.push(value);
        let last = self.values.len() - 1;
        (key, &mut self.values[last])
    }

    /// Returns a reference to the value associated with the given key.
    ///
    /// Returns `None` when the key is out-of-bounds.
    #[inline(always)]
    pub fn get(&self, key: K) -> Option<&V> {
        self.values.get(key.id_index())
    }

    /// Returns a mutable reference to the value associated with the given key.
    ///
    /// Returns `None` when the key is out-of-bounds.
    #[inline(always)]
    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        self.values.get_mut(key.id_index())
    }

    /// Returns mutable references to the values of two distinct keys.
    ///
    /// Returns `None` when either key is out-of-bounds or both keys are equal.
    pub fn get_pair_mut(&mut self, key_a: K, key_b: K) -> Option<(&mut V, &mut V)> {
        let (a, b) = (key_a.id_index(), key_b.id_index());
        if a == b || a >= self.values.len() || b >= self.values.len() {
            return None;
        }
        if a < b {
            let (lo, hi) = self.values.split_at_mut(b);
            Some((&mut lo[a], &mut hi[0]))
        } else {
            let (lo, hi) = self.values.split_at_mut(a);
            Some((&mut hi[0], &mut lo[b]))
        }
    }

    /// Returns the number of entries in the collection.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if there are no entries in the collection.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Removes all entries.
    #[inline(always)]
    pub fn clear(&mut self) {
        self.values.clear()
    }

    /// Returns the values as a slice.
    #[inline(always)]
    pub fn values(&self) -> &[V] {
        &self.values
    }

    /// Returns an iterator over all keys in ascending order.
    #[inline(always)]
    pub fn keys(&self) -> impl FusedIterator<Item = K> + DoubleEndedIterator + ExactSizeIterator {
        (0..self.values.len()).map(K::from_id_index)
    }

    /// Returns an iterator over all entries using value references.
    #[inline(always)]
    pub fn iter(
        &self,
    ) -> impl FusedIterator<Item = (K, &V)> + DoubleEndedIterator + ExactSizeIterator {
        self.values
            .iter()
            .enumerate()
            .map(|(index, value)| (K::from_id_index(index), value))
    }

    /// Returns an iterator over all entries using mutable value references.
    #[inline(always)]
    pub fn iter_mut(
        &mut self,
    ) -> impl FusedIterator<Item = (K, &mut V)> + DoubleEndedIterator + ExactSizeIterator {
        self.values
            .iter_mut()
            .enumerate()
            .map(|(index, value)| (K::from_id_index(index), value))
    }
}

impl<K: Id, V> Index<K> for IdVec<K, V> {
    type Output = V;

    #[inline(always)]
    #[track_caller]
    fn index(&self, index: K) -> &Self::Output {
        &self.values[index.id_index()]
    }
}

impl<K: Id, V> IndexMut<K> for IdVec<K, V> {
    #[inline(always)]
    #[track_caller]
    fn index_mut(&mut self, index: K) -> &mut Self::Output {
        &mut self.values[index.id_index()]
    }
}

impl<K: Id, V: Debug> Debug for IdVec<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
