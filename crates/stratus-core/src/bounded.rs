//! Fixed-capacity sequence with a runtime capacity
//!
//! `heapless::Vec` fixes its capacity at compile time; forecast capacities
//! come from configuration instead, so this wraps an `alloc` vector that
//! never grows past the capacity it was created with.

extern crate alloc;

use alloc::vec::Vec;
use core::ops::Deref;

/// A sequence that refuses elements once it holds `capacity` of them.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedVec<T> {
    items: Vec<T>,
    capacity: usize,
}

impl<T> BoundedVec<T> {
    /// Create an empty sequence that accepts at most `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append if there is room.
    ///
    /// Hands the element back as `Err` when the sequence is full, the same
    /// contract as `heapless::Vec::push`.
    pub fn push(&mut self, item: T) -> Result<(), T> {
        if self.is_full() {
            return Err(item);
        }
        self.items.push(item);
        Ok(())
    }

    /// Maximum number of elements
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T> Deref for BoundedVec<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        &self.items
    }
}

impl<'a, T> IntoIterator for &'a BoundedVec<T> {
    type Item = &'a T;
    type IntoIter = core::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_until_full() {
        let mut seq = BoundedVec::with_capacity(2);
        assert_eq!(seq.push(1), Ok(()));
        assert_eq!(seq.push(2), Ok(()));
        assert!(seq.is_full());
        assert_eq!(seq.push(3), Err(3));
        assert_eq!(seq.as_slice(), &[1, 2]);
    }

    #[test]
    fn test_zero_capacity_rejects_everything() {
        let mut seq = BoundedVec::with_capacity(0);
        assert!(seq.is_full());
        assert_eq!(seq.push('a'), Err('a'));
        assert!(seq.is_empty());
    }
}
