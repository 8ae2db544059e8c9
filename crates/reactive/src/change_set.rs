//! Change set delivered to view subscribers.
//!
//! A change set carries the net effect of one applied batch: the rows that
//! entered the result, the rows that left it, and the complete result
//! after the batch. Group-row updates appear as a removal of the old row
//! plus an addition of the new one.

use alloc::vec::Vec;
use rill_core::Document;

/// The net result changes caused by one applied batch.
#[derive(Clone, Debug, Default)]
pub struct ChangeSet {
    /// Rows that entered the result
    pub added: Vec<Document>,
    /// Rows that left the result
    pub removed: Vec<Document>,
    /// The complete current result after applying the batch
    pub current: Vec<Document>,
}

impl ChangeSet {
    /// Creates a new empty change set.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the batch had no net effect on the result.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Returns the total number of row changes.
    #[inline]
    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len()
    }

    /// Records a row entering the result.
    #[inline]
    pub fn add(&mut self, doc: Document) {
        self.added.push(doc);
    }

    /// Records a row leaving the result.
    #[inline]
    pub fn remove(&mut self, doc: Document) {
        self.removed.push(doc);
    }
}
