//! Array-flattening stage (one-to-many).
//!
//! Child rows carry identities minted by the Virtual Row Space; the stage
//! records the children emitted for each parent so a parent's remove (or
//! replacement, modeled as remove-then-add of the same id) retracts
//! exactly the rows it produced, with no residue from the old array.

use alloc::vec::Vec;
use hashbrown::HashMap;
use rill_core::{DocValue, RowId};
use rill_expr::Evaluator;

use crate::compiler::FlattenSpec;
use crate::delta::{Delta, DeltaBatch};
use crate::row::DocRow;
use crate::stage::Stage;
use crate::vrs::VirtualRowSpace;

/// Expands each parent row into one row per array element.
pub struct FlattenStage {
    spec: FlattenSpec,
    vrs: VirtualRowSpace,
    children: HashMap<RowId, Vec<DocRow>>,
}

impl FlattenStage {
    pub fn new(spec: FlattenSpec) -> Self {
        Self {
            spec,
            vrs: VirtualRowSpace::new(),
            children: HashMap::new(),
        }
    }

    fn expand(&mut self, parent: &DocRow) -> Vec<DocRow> {
        let elements: Vec<DocValue> = match parent.doc.path(&self.spec.path) {
            Some(DocValue::Array(items)) => items.clone(),
            Some(DocValue::Null) | None => Vec::new(),
            // A scalar at the flatten path unwinds as a single element.
            Some(other) => {
                let mut single = Vec::with_capacity(1);
                single.push(other.clone());
                single
            }
        };

        if elements.is_empty() {
            if !self.spec.keep_empty {
                return Vec::new();
            }
            // One placeholder row keeps the parent visible downstream.
            let ids = self.vrs.mint(&parent.id, 1);
            let mut doc = parent.doc.clone();
            doc.set_path(&self.spec.path, DocValue::Null);
            if let Some(index_field) = &self.spec.index_field {
                doc.set_path(index_field, DocValue::Null);
            }
            return ids
                .into_iter()
                .map(|id| DocRow::new(id, doc.clone()))
                .collect();
        }

        let ids = self.vrs.mint(&parent.id, elements.len());
        ids.into_iter()
            .zip(elements)
            .enumerate()
            .map(|(slot, (id, element))| {
                let mut doc = parent.doc.clone();
                doc.set_path(&self.spec.path, element);
                if let Some(index_field) = &self.spec.index_field {
                    doc.set_path(index_field, DocValue::Number(slot as f64));
                }
                DocRow::new(id, doc)
            })
            .collect()
    }
}

impl Stage for FlattenStage {
    fn apply(&mut self, batch: &[Delta<DocRow>], _eval: &dyn Evaluator) -> DeltaBatch<DocRow> {
        let mut out = DeltaBatch::new();
        for d in batch {
            if d.is_insert() {
                if self.children.contains_key(&d.data.id) {
                    continue;
                }
                let rows = self.expand(&d.data);
                for row in &rows {
                    out.push(Delta::insert(row.clone()));
                }
                self.children.insert(d.data.id.clone(), rows);
            } else if d.is_delete() {
                if let Some(rows) = self.children.remove(&d.data.id) {
                    for row in rows {
                        out.push(Delta::delete(row));
                    }
                    self.vrs.retire(&d.data.id);
                }
            }
        }
        out
    }
}
