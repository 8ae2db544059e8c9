//! Incremental group stage.
//!
//! Per-key accumulator bundles are created on the first contributing row
//! and destroyed when the contributing count returns to zero. Output rows
//! carry a key-derived identity (`RowId::group`), so group identity and
//! ordering never depend on delta arrival history. Within one batch the
//! stage emits only the net effect per touched key: delete of the old
//! group row (if any) followed by insert of the new one.

use alloc::vec::Vec;
use hashbrown::{HashMap, HashSet};
use rill_core::{DocObject, DocValue, Document, RowId};
use rill_expr::Evaluator;

use crate::accumulator::AccumulatorState;
use crate::compiler::GroupSpec;
use crate::delta::{Delta, DeltaBatch};
use crate::row::DocRow;
use crate::stage::Stage;

struct GroupState {
    count: i64,
    accs: Vec<AccumulatorState>,
    emitted: Option<Document>,
}

impl GroupState {
    fn new(spec: &GroupSpec) -> Self {
        Self {
            count: 0,
            accs: spec.accumulators.iter().map(|a| a.kind.init()).collect(),
            emitted: None,
        }
    }

    fn render(&self, key: &DocValue, spec: &GroupSpec) -> Document {
        let mut obj = DocObject::with_capacity(spec.accumulators.len() + 1);
        obj.insert("_id", key.clone());
        for (acc_spec, acc) in spec.accumulators.iter().zip(&self.accs) {
            obj.insert(acc_spec.field.clone(), acc.value());
        }
        DocValue::Object(obj)
    }
}

/// Groups rows by an evaluated key and maintains invertible accumulators.
pub struct GroupStage {
    spec: GroupSpec,
    groups: HashMap<DocValue, GroupState>,
    /// Arrival sequence per contributing row, consumed by positional
    /// accumulators (first/last/push) and released on remove.
    row_seq: HashMap<RowId, u64>,
    next_seq: u64,
}

impl GroupStage {
    pub fn new(spec: GroupSpec) -> Self {
        Self {
            spec,
            groups: HashMap::new(),
            row_seq: HashMap::new(),
            next_seq: 0,
        }
    }
}

impl Stage for GroupStage {
    fn apply(&mut self, batch: &[Delta<DocRow>], eval: &dyn Evaluator) -> DeltaBatch<DocRow> {
        let mut touched: Vec<DocValue> = Vec::new();
        let mut touched_set: HashSet<DocValue> = HashSet::new();

        for d in batch {
            let key = eval
                .evaluate(&self.spec.key, &d.data.doc)
                .unwrap_or(DocValue::Null);

            if d.is_insert() {
                if self.row_seq.contains_key(&d.data.id) {
                    continue;
                }
                let seq = self.next_seq;
                self.next_seq += 1;
                self.row_seq.insert(d.data.id.clone(), seq);

                let state = self
                    .groups
                    .entry(key.clone())
                    .or_insert_with(|| GroupState::new(&self.spec));
                state.count += 1;
                for (acc_spec, acc) in self.spec.accumulators.iter().zip(&mut state.accs) {
                    let value = eval.evaluate(&acc_spec.expr, &d.data.doc);
                    acc.apply(value.as_ref(), seq, 1);
                }
            } else if d.is_delete() {
                // Unknown row: the remove is a silent no-op.
                let seq = match self.row_seq.remove(&d.data.id) {
                    Some(seq) => seq,
                    None => continue,
                };
                let state = match self.groups.get_mut(&key) {
                    Some(state) => state,
                    None => continue,
                };
                state.count -= 1;
                for (acc_spec, acc) in self.spec.accumulators.iter().zip(&mut state.accs) {
                    let value = eval.evaluate(&acc_spec.expr, &d.data.doc);
                    acc.apply(value.as_ref(), seq, -1);
                }
            }

            if touched_set.insert(key.clone()) {
                touched.push(key);
            }
        }

        let mut out = DeltaBatch::new();
        for key in touched {
            let state = match self.groups.get_mut(&key) {
                Some(state) => state,
                None => continue,
            };
            if state.count <= 0 {
                if let Some(old) = state.emitted.take() {
                    out.push(Delta::delete(DocRow::new(RowId::group(key.clone()), old)));
                }
                self.groups.remove(&key);
                continue;
            }
            let doc = state.render(&key, &self.spec);
            if state.emitted.as_ref() == Some(&doc) {
                continue;
            }
            if let Some(old) = state.emitted.take() {
                out.push(Delta::delete(DocRow::new(RowId::group(key.clone()), old)));
            }
            out.push(Delta::insert(DocRow::new(RowId::group(key.clone()), doc.clone())));
            state.emitted = Some(doc);
        }
        out
    }
}
