//! Delta type for incremental view maintenance.
//!
//! A delta is one Add or Remove event for a single logical row; a batch of
//! deltas is the unit of atomicity throughout the engine.

use alloc::vec::Vec;

/// A differential change to a data item.
///
/// The `diff` field is the multiplicity of the change: `+1` for an
/// insertion, `-1` for a deletion.
#[derive(Clone, Debug, PartialEq)]
pub struct Delta<T> {
    /// The data being changed
    pub data: T,
    /// The differential: +1 for insert, -1 for delete
    pub diff: i32,
}

impl<T> Delta<T> {
    /// Creates a new delta with the given data and diff.
    #[inline]
    pub fn new(data: T, diff: i32) -> Self {
        Self { data, diff }
    }

    /// Creates an insertion delta (+1).
    #[inline]
    pub fn insert(data: T) -> Self {
        Self { data, diff: 1 }
    }

    /// Creates a deletion delta (-1).
    #[inline]
    pub fn delete(data: T) -> Self {
        Self { data, diff: -1 }
    }

    /// Returns true if this is an insertion (diff > 0).
    #[inline]
    pub fn is_insert(&self) -> bool {
        self.diff > 0
    }

    /// Returns true if this is a deletion (diff < 0).
    #[inline]
    pub fn is_delete(&self) -> bool {
        self.diff < 0
    }

    /// Maps the data to a new type, keeping the diff.
    #[inline]
    pub fn map<U, F>(self, f: F) -> Delta<U>
    where
        F: FnOnce(T) -> U,
    {
        Delta {
            data: f(self.data),
            diff: self.diff,
        }
    }
}

/// A batch of deltas, applied atomically.
pub type DeltaBatch<T> = Vec<Delta<T>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_insert_delete() {
        let i = Delta::insert(42);
        assert!(i.is_insert());
        assert!(!i.is_delete());

        let d = Delta::delete(42);
        assert!(d.is_delete());
        assert_eq!(d.diff, -1);
    }

    #[test]
    fn test_delta_map() {
        let d = Delta::insert(21).map(|x| x * 2);
        assert_eq!(d.data, 42);
        assert_eq!(d.diff, 1);
    }
}
