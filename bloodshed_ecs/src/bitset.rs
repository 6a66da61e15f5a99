//! Fixed-width bitsets used for component type and group matching.

use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

/// Maximum count of distinct component types which can be registered.
pub const MAX_COMPONENTS: usize = 32;

/// Maximum count of distinct groups an entity can be tagged with.
pub const MAX_GROUPS: usize = 32;

/// Bitset with `N` meaningful bits, `N` must not exceed 64.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Bitset<const N: usize> {
    bits: u64,
}

/// One bit per registered component type index.
pub type TypeIdsBitset = Bitset<MAX_COMPONENTS>;

/// One bit per group.
pub type GroupBitset = Bitset<MAX_GROUPS>;

impl<const N: usize> Bitset<N> {
    const MASK: u64 = if N >= 64 { u64::MAX } else { (1 << N) - 1 };

    /// Creates a bitset with no bits set.
    pub const fn new() -> Self {
        assert!(N <= 64, "bitset width cannot exceed 64 bits");
        Self { bits: 0 }
    }

    /// Creates a bitset with exactly the given bits set.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of range.
    ///
    pub fn from_indices(indices: impl IntoIterator<Item = usize>) -> Self {
        let mut bitset = Self::new();
        for index in indices {
            bitset.set(index);
        }
        bitset
    }

    /// Count of meaningful bits.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Sets the bit at `index`.
    pub fn set(&mut self, index: usize) {
        assert!(index < N, "bit index {} is out of range 0..{}", index, N);
        self.bits |= 1 << index;
    }

    /// Clears the bit at `index`.
    pub fn reset(&mut self, index: usize) {
        assert!(index < N, "bit index {} is out of range 0..{}", index, N);
        self.bits &= !(1 << index);
    }

    /// Clears every bit.
    pub fn clear(&mut self) {
        self.bits = 0;
    }

    /// Returns `true` if the bit at `index` is set.
    pub fn test(&self, index: usize) -> bool {
        index < N && self.bits & (1 << index) != 0
    }

    /// Returns `true` if every bit set in `other` is also set in `self`.
    pub fn contains_all(&self, other: &Self) -> bool {
        self.bits & other.bits == other.bits
    }

    /// Returns `true` if at least one bit is set in both bitsets.
    pub fn intersects(&self, other: &Self) -> bool {
        self.bits & other.bits != 0
    }

    /// Returns `true` if no bit is set.
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Count of set bits.
    pub fn count(&self) -> usize {
        self.bits.count_ones() as usize
    }

    /// Iterates over indices of set bits in ascending order.
    pub fn iter(&self) -> Iter {
        Iter { bits: self.bits }
    }
}

impl<const N: usize> BitAnd for Bitset<N> {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self {
            bits: self.bits & rhs.bits,
        }
    }
}

impl<const N: usize> BitOr for Bitset<N> {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self {
            bits: self.bits | rhs.bits,
        }
    }
}

impl<const N: usize> Not for Bitset<N> {
    type Output = Self;

    fn not(self) -> Self::Output {
        Self {
            bits: !self.bits & Self::MASK,
        }
    }
}

impl<const N: usize> FromIterator<usize> for Bitset<N> {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self::from_indices(iter)
    }
}

impl<const N: usize> fmt::Debug for Bitset<N> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Iterator over set bits of a [`Bitset`].
pub struct Iter {
    bits: u64,
}

impl Iterator for Iter {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        if self.bits == 0 {
            return None;
        }
        let index = self.bits.trailing_zeros() as usize;
        self.bits &= self.bits - 1;
        Some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_reset() {
        let mut bitset = TypeIdsBitset::new();
        assert!(bitset.is_empty());

        bitset.set(3);
        bitset.set(31);
        assert!(bitset.test(3));
        assert!(bitset.test(31));
        assert!(!bitset.test(4));
        assert_eq!(bitset.count(), 2);

        bitset.reset(3);
        assert!(!bitset.test(3));
        assert_eq!(bitset.iter().collect::<Vec<_>>(), vec![31]);
    }

    #[test]
    fn test_matching() {
        let entity: TypeIdsBitset = [0, 2, 5].into_iter().collect();
        let signature: TypeIdsBitset = [0, 5].into_iter().collect();
        let other: TypeIdsBitset = [1, 5].into_iter().collect();

        assert!(entity.contains_all(&signature));
        assert!(!entity.contains_all(&other));
        assert!(entity.intersects(&other));
        assert_eq!(entity & signature, signature);
        assert_eq!((!entity).count(), MAX_COMPONENTS - 3);
    }

    #[test]
    #[should_panic]
    fn test_out_of_range() {
        let mut bitset = GroupBitset::new();
        bitset.set(MAX_GROUPS);
    }
}
