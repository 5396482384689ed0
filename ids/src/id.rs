use core::{fmt::Debug, hash::Hash};

/// Types that represent integer ids
///
/// A type of this trait represents an `usize` index value in the range `0..=Self::MAX_ID_INDEX`,
/// with the specific representation being up to the implementing type.
///
/// Implementations are expected to behave as if the type was a `struct` containing
/// [`index: usize`][`Self::id_index()`] as only field with derived [`PartialEq`], [`Eq`],
/// [`PartialOrd`], [`Ord`] and [`Hash`] implementations. Newtype wrappers around an existing id
/// type should use [`#[derive(Id)]`][crate::Id] which upholds this by forwarding.
pub trait Id: Copy + Ord + Hash + Send + Sync + Debug {
    /// The largest index representable by this id type.
    const MAX_ID_INDEX: usize;
    /// The id with index zero.
    const MIN_ID: Self;
    /// The id with the largest representable index.
    const MAX_ID: Self;

    /// Returns the index represented by this id.
    fn id_index(self) -> usize;

    /// Returns the id with a given index, if it is valid.
    ///
    /// This returns `None` if and only if `index > Self::MAX_ID_INDEX`.
    ///
    /// Never panics.
    fn try_from_id_index(index: usize) -> Option<Self>;

    /// Returns the id with a given index, panicking when the index is invalid.
    ///
    /// This panics if and only if `index > Self::MAX_ID_INDEX`.
    #[inline(always)]
    #[track_caller]
    fn from_id_index(index: usize) -> Self {
        match Self::try_from_id_index(index) {
            Some(id) => id,
            None => panic!(
                "id index {index} out of range for {}",
                core::any::type_name::<Self>()
            ),
        }
    }
}

macro_rules! impl_id_for_primitive {
    ($($ty:ty),*) => {
        $(
            impl Id for $ty {
                #[allow(clippy::unnecessary_cast)]
                const MAX_ID_INDEX: usize = if (<$ty>::MAX as u128) < (usize::MAX as u128) {
                    <$ty>::MAX as usize
                } else {
                    usize::MAX
                };
                const MIN_ID: Self = 0;
                const MAX_ID: Self = Self::MAX_ID_INDEX as $ty;

                #[inline(always)]
                fn id_index(self) -> usize {
                    self as usize
                }

                #[inline(always)]
                fn try_from_id_index(index: usize) -> Option<Self> {
                    <$ty>::try_from(index).ok()
                }
            }
        )*
    };
}

impl_id_for_primitive!(u8, u16, u32, u64, usize);
