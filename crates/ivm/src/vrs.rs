//! Virtual row identity for one-to-many (flatten) stages.
//!
//! A flattened array element gets a synthetic `RowId` derived from its
//! parent, its slot index, and a per-parent generation counter. Retiring a
//! parent bumps the generation, so children minted for a replacement array
//! can never alias children of the array they replaced.

use alloc::vec::Vec;
use hashbrown::HashMap;
use rill_core::RowId;

/// Mints and retires synthetic identities for flattened rows.
#[derive(Debug, Default)]
pub struct VirtualRowSpace {
    generations: HashMap<RowId, u32>,
}

impl VirtualRowSpace {
    pub fn new() -> Self {
        Self {
            generations: HashMap::new(),
        }
    }

    /// Allocates one child id per array slot under the parent's current
    /// generation.
    pub fn mint(&mut self, parent: &RowId, len: usize) -> Vec<RowId> {
        let generation = *self.generations.entry(parent.clone()).or_insert(0);
        (0..len as u32)
            .map(|slot| RowId::virtual_child(parent, slot, generation))
            .collect()
    }

    /// Invalidates the parent's currently minted children.
    ///
    /// Generations only ever advance; a parent id that returns later mints
    /// under a fresh generation rather than reusing a stale one.
    pub fn retire(&mut self, parent: &RowId) {
        *self.generations.entry(parent.clone()).or_insert(0) += 1;
    }
}
