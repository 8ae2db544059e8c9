//! Ordered output stage: sort fused with limit and skip.
//!
//! With a limit and no skip the stage delegates to the bounded top-K
//! selector; otherwise it maintains a fully ordered index and windows it.
//! A stage compiled without sort keys of its own (a limit or skip
//! separated from its sort) orders by the rank carried on incoming rows,
//! falling back to `RowId` order for unranked input. After every batch the
//! stage diffs the current window against the previously emitted one and
//! forwards only the net row changes, deletes before inserts. Rows equal
//! under the sort key are ordered by `RowId`, a stable rule independent of
//! arrival history.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use hashbrown::{HashMap, HashSet};
use rill_core::{DocValue, Document, RowId};
use rill_expr::Evaluator;

use crate::compiler::SortSpec;
use crate::delta::{Delta, DeltaBatch};
use crate::row::{DocRow, SortKey, SortKeyPart};
use crate::stage::Stage;
use crate::topk::TopKSelector;

enum OrderedIndex {
    /// Bounded selection; `live` holds every candidate for refill after a
    /// held entry is removed.
    TopK {
        selector: TopKSelector,
        live: HashMap<RowId, (SortKey, Document)>,
    },
    /// Fully ordered index, windowed by skip/limit at emission.
    Full {
        entries: BTreeMap<(SortKey, RowId), Document>,
    },
}

/// Maintains the pipeline's ordered output window.
pub struct OrderedStage {
    keys: Vec<SortSpec>,
    limit: Option<usize>,
    skip: usize,
    index: OrderedIndex,
    /// Sort key per live row, also the dedup guard for double adds.
    by_id: HashMap<RowId, SortKey>,
    /// The window emitted after the previous batch.
    emitted: HashMap<RowId, (Option<SortKey>, Document)>,
}

impl OrderedStage {
    pub fn new(keys: Vec<SortSpec>, limit: Option<usize>, skip: usize) -> Self {
        let index = match limit {
            Some(k) if skip == 0 => OrderedIndex::TopK {
                selector: TopKSelector::new(k),
                live: HashMap::new(),
            },
            _ => OrderedIndex::Full {
                entries: BTreeMap::new(),
            },
        };
        Self {
            keys,
            limit,
            skip,
            index,
            by_id: HashMap::new(),
            emitted: HashMap::new(),
        }
    }

    /// The entry's sort key: evaluated from this stage's keys, or the rank
    /// carried from an upstream ordered stage when it has none.
    fn entry_key(&self, row: &DocRow) -> SortKey {
        if self.keys.is_empty() {
            return row.rank.clone().unwrap_or_else(|| SortKey::new(Vec::new()));
        }
        SortKey::new(
            self.keys
                .iter()
                .map(|k| {
                    let value = row.doc.path(&k.path).cloned().unwrap_or(DocValue::Null);
                    SortKeyPart::new(value, k.descending)
                })
                .collect(),
        )
    }

    /// The current window in final order.
    #[cfg(test)]
    fn window(&self) -> Vec<(RowId, SortKey, Document)> {
        match &self.index {
            OrderedIndex::TopK { selector, .. } => selector
                .iter()
                .map(|((key, id), doc)| (id.clone(), key.clone(), doc.clone()))
                .collect(),
            OrderedIndex::Full { entries } => entries
                .iter()
                .skip(self.skip)
                .take(self.limit.unwrap_or(usize::MAX))
                .map(|((key, id), doc)| (id.clone(), key.clone(), doc.clone()))
                .collect(),
        }
    }
}

impl Stage for OrderedStage {
    fn apply(&mut self, batch: &[Delta<DocRow>], _eval: &dyn Evaluator) -> DeltaBatch<DocRow> {
        let mut held_removed = false;
        for d in batch {
            if d.is_insert() {
                if self.by_id.contains_key(&d.data.id) {
                    continue;
                }
                let key = self.entry_key(&d.data);
                self.by_id.insert(d.data.id.clone(), key.clone());
                match &mut self.index {
                    OrderedIndex::TopK { selector, live } => {
                        selector.offer(&key, &d.data.id, &d.data.doc);
                        live.insert(d.data.id.clone(), (key, d.data.doc.clone()));
                    }
                    OrderedIndex::Full { entries } => {
                        entries.insert((key, d.data.id.clone()), d.data.doc.clone());
                    }
                }
            } else if d.is_delete() {
                let key = match self.by_id.remove(&d.data.id) {
                    Some(key) => key,
                    None => continue,
                };
                match &mut self.index {
                    OrderedIndex::TopK { selector, live } => {
                        if selector.remove(&key, &d.data.id) {
                            held_removed = true;
                        }
                        live.remove(&d.data.id);
                    }
                    OrderedIndex::Full { entries } => {
                        entries.remove(&(key, d.data.id.clone()));
                    }
                }
            }
        }

        // Removing a held entry leaves the selection stale: candidates
        // rejected earlier only because the structure was full may now
        // belong, even when later inserts in the same batch refilled it.
        // Re-offer every live candidate before emitting.
        if held_removed {
            if let OrderedIndex::TopK { selector, live } = &mut self.index {
                if live.len() > selector.len() {
                    for (id, (key, doc)) in live.iter() {
                        selector.offer(key, id, doc);
                    }
                }
            }
        }

        let window: Vec<(&SortKey, &RowId, &Document)> = match &self.index {
            OrderedIndex::TopK { selector, .. } => selector
                .iter()
                .map(|((key, id), doc)| (key, id, doc))
                .collect(),
            OrderedIndex::Full { entries } => entries
                .iter()
                .skip(self.skip)
                .take(self.limit.unwrap_or(usize::MAX))
                .map(|((key, id), doc)| (key, id, doc))
                .collect(),
        };

        // Diff against the previous emission in place; unchanged rows are
        // compared but never cloned.
        let mut out = DeltaBatch::new();
        let mut inserts = DeltaBatch::new();
        let mut retained: HashSet<&RowId> = HashSet::with_capacity(window.len());
        for (key, id, doc) in window {
            retained.insert(id);
            let ranked = !key.is_empty();
            let unchanged = self.emitted.get(id).is_some_and(|(prev_rank, prev_doc)| {
                let rank_matches = match prev_rank {
                    Some(prev) => ranked && prev == key,
                    None => !ranked,
                };
                rank_matches && prev_doc == doc
            });
            if unchanged {
                continue;
            }
            let rank = ranked.then(|| key.clone());
            if let Some((old_rank, old_doc)) =
                self.emitted.insert(id.clone(), (rank.clone(), doc.clone()))
            {
                out.push(Delta::delete(DocRow {
                    id: id.clone(),
                    doc: old_doc,
                    rank: old_rank,
                }));
            }
            inserts.push(Delta::insert(DocRow {
                id: id.clone(),
                doc: doc.clone(),
                rank,
            }));
        }

        let gone: Vec<RowId> = self
            .emitted
            .keys()
            .filter(|id| !retained.contains(*id))
            .cloned()
            .collect();
        for id in gone {
            if let Some((rank, doc)) = self.emitted.remove(&id) {
                out.push(Delta::delete(DocRow { id, doc, rank }));
            }
        }
        out.extend(inserts);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use rill_core::{DocObject, DocValue};
    use rill_expr::DefaultEvaluator;

    fn row(id: u64, score: f64) -> DocRow {
        let mut obj = DocObject::new();
        obj.insert("score", DocValue::Number(score));
        DocRow::new(RowId::source(id), DocValue::Object(obj))
    }

    fn ranked_row(id: u64, score: f64) -> DocRow {
        let rank = SortKey::new(vec![SortKeyPart::new(DocValue::Number(score), true)]);
        let mut obj = DocObject::new();
        obj.insert("score", DocValue::Number(score));
        DocRow::ranked(RowId::source(id), DocValue::Object(obj), rank)
    }

    fn scores(stage: &OrderedStage) -> Vec<f64> {
        stage
            .window()
            .iter()
            .filter_map(|(_, _, doc)| doc.path("score").and_then(DocValue::as_f64))
            .collect()
    }

    fn desc_by_score() -> Vec<SortSpec> {
        vec![SortSpec::desc("score")]
    }

    #[test]
    fn test_sort_desc_limit_two() {
        let mut stage = OrderedStage::new(desc_by_score(), Some(2), 0);
        stage.apply(
            &[
                Delta::insert(row(1, 85.0)),
                Delta::insert(row(2, 92.0)),
                Delta::insert(row(3, 78.0)),
                Delta::insert(row(4, 95.0)),
            ],
            &DefaultEvaluator,
        );
        assert_eq!(scores(&stage), vec![95.0, 92.0]);
    }

    #[test]
    fn test_removing_max_refills_window() {
        let mut stage = OrderedStage::new(desc_by_score(), Some(2), 0);
        stage.apply(
            &[
                Delta::insert(row(1, 85.0)),
                Delta::insert(row(2, 92.0)),
                Delta::insert(row(3, 78.0)),
                Delta::insert(row(4, 95.0)),
            ],
            &DefaultEvaluator,
        );
        let out = stage.apply(&[Delta::delete(row(4, 95.0))], &DefaultEvaluator);
        assert_eq!(scores(&stage), vec![92.0, 85.0]);

        // Net change: 95 leaves the window, 85 enters it.
        let deleted: Vec<_> = out.iter().filter(|d| d.is_delete()).collect();
        let inserted: Vec<_> = out.iter().filter(|d| d.is_insert()).collect();
        assert_eq!(deleted.len(), 1);
        assert_eq!(inserted.len(), 1);
        assert_eq!(
            inserted[0].data.doc.path("score"),
            Some(&DocValue::Number(85.0))
        );
    }

    #[test]
    fn test_replace_in_full_window_readmits_excluded_candidate() {
        let mut stage = OrderedStage::new(vec![SortSpec::asc("score")], Some(2), 0);
        stage.apply(
            &[
                Delta::insert(row(1, 10.0)),
                Delta::insert(row(2, 20.0)),
                Delta::insert(row(3, 30.0)),
            ],
            &DefaultEvaluator,
        );
        assert_eq!(scores(&stage), vec![10.0, 20.0]);

        // One batch frees a held slot and immediately fills it with a
        // worse-ranked row; the earlier excluded candidate takes the slot.
        stage.apply(
            &[Delta::delete(row(1, 10.0)), Delta::insert(row(4, 40.0))],
            &DefaultEvaluator,
        );
        assert_eq!(scores(&stage), vec![20.0, 30.0]);
    }

    #[test]
    fn test_skip_windows_full_index() {
        let mut stage = OrderedStage::new(vec![SortSpec::asc("score")], Some(2), 1);
        stage.apply(
            &[
                Delta::insert(row(1, 10.0)),
                Delta::insert(row(2, 20.0)),
                Delta::insert(row(3, 30.0)),
                Delta::insert(row(4, 40.0)),
            ],
            &DefaultEvaluator,
        );
        assert_eq!(scores(&stage), vec![20.0, 30.0]);
    }

    #[test]
    fn test_unranked_limit_orders_by_row_id() {
        let mut stage = OrderedStage::new(vec![], Some(2), 0);
        let out = stage.apply(
            &[
                Delta::insert(row(3, 30.0)),
                Delta::insert(row(1, 10.0)),
                Delta::insert(row(2, 20.0)),
            ],
            &DefaultEvaluator,
        );
        assert_eq!(scores(&stage), vec![10.0, 20.0]);
        assert!(out.iter().all(|d| d.data.rank.is_none()));
    }

    #[test]
    fn test_carried_rank_orders_keyless_window() {
        // A limit compiled apart from its sort has no keys of its own; the
        // rank carried on incoming rows decides which rows survive.
        let mut stage = OrderedStage::new(vec![], Some(2), 0);
        let out = stage.apply(
            &[
                Delta::insert(ranked_row(1, 85.0)),
                Delta::insert(ranked_row(2, 92.0)),
                Delta::insert(ranked_row(3, 78.0)),
                Delta::insert(ranked_row(4, 95.0)),
            ],
            &DefaultEvaluator,
        );
        assert_eq!(scores(&stage), vec![95.0, 92.0]);
        assert!(out.iter().all(|d| d.data.rank.is_some()));
    }

    #[test]
    fn test_emits_rank_for_downstream_ordering() {
        let mut stage = OrderedStage::new(desc_by_score(), None, 0);
        let out = stage.apply(&[Delta::insert(row(1, 85.0))], &DefaultEvaluator);
        assert_eq!(out.len(), 1);
        assert!(out[0].data.rank.is_some());
    }

    #[test]
    fn test_ties_break_by_row_id() {
        let mut stage = OrderedStage::new(vec![SortSpec::asc("score")], Some(1), 0);
        stage.apply(
            &[Delta::insert(row(9, 50.0)), Delta::insert(row(2, 50.0))],
            &DefaultEvaluator,
        );
        let window = stage.window();
        assert_eq!(window[0].0, RowId::source(2));
    }
}
