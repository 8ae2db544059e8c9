//! Incremental filter stage.

use hashbrown::HashSet;
use rill_core::RowId;
use rill_expr::{Evaluator, Predicate};

use crate::delta::{Delta, DeltaBatch};
use crate::row::DocRow;
use crate::stage::Stage;

/// Filters rows by a predicate.
///
/// The currently-passing set is tracked by `RowId`, so a remove passes
/// through exactly when the row previously passed, without re-evaluating
/// the predicate against possibly stale content.
pub struct FilterStage {
    predicate: Predicate,
    passing: HashSet<RowId>,
}

impl FilterStage {
    pub fn new(predicate: Predicate) -> Self {
        Self {
            predicate,
            passing: HashSet::new(),
        }
    }
}

impl Stage for FilterStage {
    fn apply(&mut self, batch: &[Delta<DocRow>], eval: &dyn Evaluator) -> DeltaBatch<DocRow> {
        let mut out = DeltaBatch::new();
        for d in batch {
            if d.is_insert() {
                if eval.matches(&self.predicate, &d.data.doc)
                    && self.passing.insert(d.data.id.clone())
                {
                    out.push(Delta::insert(d.data.clone()));
                }
            } else if d.is_delete() && self.passing.remove(&d.data.id) {
                out.push(Delta::delete(d.data.clone()));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rill_core::{DocObject, DocValue};
    use rill_expr::DefaultEvaluator;

    fn row(id: u64, a: f64) -> DocRow {
        let mut obj = DocObject::new();
        obj.insert("a", DocValue::Number(a));
        DocRow::new(RowId::source(id), DocValue::Object(obj))
    }

    #[test]
    fn test_add_passes_only_matching() {
        let mut stage = FilterStage::new(Predicate::eq("a", 1));
        let out = stage.apply(
            &[Delta::insert(row(1, 1.0)), Delta::insert(row(2, 2.0))],
            &DefaultEvaluator,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].data.id, RowId::source(1));
    }

    #[test]
    fn test_remove_passes_only_previously_passing() {
        let mut stage = FilterStage::new(Predicate::eq("a", 1.0));
        stage.apply(&[Delta::insert(row(1, 1.0))], &DefaultEvaluator);

        // Row 2 never passed; its remove is dropped.
        let out = stage.apply(
            &[Delta::delete(row(1, 1.0)), Delta::delete(row(2, 2.0))],
            &DefaultEvaluator,
        );
        assert_eq!(out.len(), 1);
        assert!(out[0].is_delete());
        assert_eq!(out[0].data.id, RowId::source(1));
    }

    #[test]
    fn test_double_remove_is_noop() {
        let mut stage = FilterStage::new(Predicate::eq("a", 1.0));
        stage.apply(&[Delta::insert(row(1, 1.0))], &DefaultEvaluator);
        stage.apply(&[Delta::delete(row(1, 1.0))], &DefaultEvaluator);
        let out = stage.apply(&[Delta::delete(row(1, 1.0))], &DefaultEvaluator);
        assert!(out.is_empty());
    }
}
