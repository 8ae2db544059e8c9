//! Bounded top-K maintenance for sort-then-limit.
//!
//! The selector holds at most `k` entries ordered by `(SortKey, RowId)`;
//! the row id is the deterministic tie-break, so the held set is a pure
//! function of the live rows regardless of arrival history. When a held
//! entry is removed the owning stage refills from its live candidates by
//! re-offering them; `offer` only ever accepts an entry that belongs in the
//! current top k.

use alloc::collections::BTreeMap;
use core::cmp::Ordering;
use rill_core::{Document, RowId};

use crate::row::SortKey;

/// Capacity-bounded ordered selection of the best-ranked rows.
#[derive(Debug)]
pub struct TopKSelector {
    k: usize,
    held: BTreeMap<(SortKey, RowId), Document>,
}

impl TopKSelector {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            held: BTreeMap::new(),
        }
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.held.len()
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    /// True once the held set has reached capacity.
    pub fn is_full(&self) -> bool {
        self.held.len() >= self.k
    }

    /// Offers a candidate; clones it into the held set only if it ranks
    /// within the current top k. Returns whether the row is held afterward.
    pub fn offer(&mut self, key: &SortKey, id: &RowId, doc: &Document) -> bool {
        if self.k == 0 {
            return false;
        }
        if self.held.contains_key(&(key.clone(), id.clone())) {
            return true;
        }
        if self.held.len() < self.k {
            self.held.insert((key.clone(), id.clone()), doc.clone());
            return true;
        }
        let beats_worst = match self.held.keys().next_back() {
            Some((wk, wid)) => match key.cmp(wk) {
                Ordering::Less => true,
                Ordering::Greater => false,
                Ordering::Equal => id < wid,
            },
            None => true,
        };
        if beats_worst {
            self.held.pop_last();
            self.held.insert((key.clone(), id.clone()), doc.clone());
            true
        } else {
            false
        }
    }

    /// Removes a held entry; returns false if it was not held.
    ///
    /// After a successful removal the held set may be smaller than both `k`
    /// and the live row count; the owner is expected to re-offer its live
    /// candidates.
    pub fn remove(&mut self, key: &SortKey, id: &RowId) -> bool {
        self.held.remove(&(key.clone(), id.clone())).is_some()
    }

    /// Held entries in final sort order.
    pub fn iter(&self) -> impl Iterator<Item = (&(SortKey, RowId), &Document)> {
        self.held.iter()
    }
}
