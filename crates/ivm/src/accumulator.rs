//! The invertible accumulator state machine behind grouping.
//!
//! Every accumulator supports one uniform operation, `apply(value, seq,
//! diff)`, where `diff` is +1 for an add and -1 for the matching remove.
//! Each kind keeps exactly the running state it needs to stay invertible:
//! min/max hold a value multiset so removing the current extreme falls back
//! to the next one without a rescan, first/last/push hold an
//! arrival-ordered index keyed by a per-stage sequence number, and the
//! variance family holds invertible moments (count, sum, sum of squares).

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use rill_core::DocValue;

/// The closed set of accumulator kinds recognized by a group stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccKind {
    Sum,
    Count,
    Avg,
    Min,
    Max,
    First,
    Last,
    Push,
    AddToSet,
    StdDevPop,
    StdDevSamp,
    VariancePop,
    VarianceSamp,
}

impl AccKind {
    /// Resolves an accumulator operator name from a group spec.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sum" => Some(AccKind::Sum),
            "count" => Some(AccKind::Count),
            "avg" => Some(AccKind::Avg),
            "min" => Some(AccKind::Min),
            "max" => Some(AccKind::Max),
            "first" => Some(AccKind::First),
            "last" => Some(AccKind::Last),
            "push" => Some(AccKind::Push),
            "addToSet" => Some(AccKind::AddToSet),
            "stdDevPop" => Some(AccKind::StdDevPop),
            "stdDevSamp" => Some(AccKind::StdDevSamp),
            "variancePop" => Some(AccKind::VariancePop),
            "varianceSamp" => Some(AccKind::VarianceSamp),
            _ => None,
        }
    }

    /// Creates the empty state for this kind.
    pub fn init(self) -> AccumulatorState {
        match self {
            AccKind::Sum => AccumulatorState::Sum { sum: 0.0 },
            AccKind::Count => AccumulatorState::Count { count: 0 },
            AccKind::Avg => AccumulatorState::Avg { sum: 0.0, count: 0 },
            AccKind::Min => AccumulatorState::Min {
                values: BTreeMap::new(),
            },
            AccKind::Max => AccumulatorState::Max {
                values: BTreeMap::new(),
            },
            AccKind::First => AccumulatorState::First {
                entries: BTreeMap::new(),
            },
            AccKind::Last => AccumulatorState::Last {
                entries: BTreeMap::new(),
            },
            AccKind::Push => AccumulatorState::Push {
                entries: BTreeMap::new(),
            },
            AccKind::AddToSet => AccumulatorState::AddToSet {
                values: BTreeMap::new(),
            },
            AccKind::StdDevPop => AccumulatorState::StdDevPop(Moments::default()),
            AccKind::StdDevSamp => AccumulatorState::StdDevSamp(Moments::default()),
            AccKind::VariancePop => AccumulatorState::VariancePop(Moments::default()),
            AccKind::VarianceSamp => AccumulatorState::VarianceSamp(Moments::default()),
        }
    }
}

/// Invertible moments shared by the variance/stddev family.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Moments {
    count: i64,
    sum: f64,
    sum_sq: f64,
}

impl Moments {
    fn apply(&mut self, value: Option<&DocValue>, diff: i32) {
        if let Some(n) = value.and_then(DocValue::as_f64) {
            self.count += diff as i64;
            self.sum += n * diff as f64;
            self.sum_sq += n * n * diff as f64;
        }
    }

    /// Population variance, or None when empty. Floating-point cancellation
    /// can push the raw expression slightly negative, so it is clamped.
    fn variance_pop(&self) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        let n = self.count as f64;
        let mean = self.sum / n;
        Some(f64::max(self.sum_sq / n - mean * mean, 0.0))
    }

    /// Sample variance, or None with fewer than two values.
    fn variance_samp(&self) -> Option<f64> {
        if self.count < 2 {
            return None;
        }
        let n = self.count as f64;
        Some(f64::max(
            (self.sum_sq - self.sum * self.sum / n) / (n - 1.0),
            0.0,
        ))
    }
}

/// Running state for one accumulator of one group.
#[derive(Clone, Debug, PartialEq)]
pub enum AccumulatorState {
    Sum { sum: f64 },
    Count { count: i64 },
    Avg { sum: f64, count: i64 },
    /// Multiset of observed values; the minimum is the first key.
    Min { values: BTreeMap<DocValue, i32> },
    /// Multiset of observed values; the maximum is the last key.
    Max { values: BTreeMap<DocValue, i32> },
    /// Arrival-ordered values; the earliest surviving entry wins.
    First { entries: BTreeMap<u64, DocValue> },
    /// Arrival-ordered values; the latest surviving entry wins.
    Last { entries: BTreeMap<u64, DocValue> },
    /// All surviving values in arrival order.
    Push { entries: BTreeMap<u64, DocValue> },
    /// Reference-counted distinct values, rendered in value order.
    AddToSet { values: BTreeMap<DocValue, i32> },
    StdDevPop(Moments),
    StdDevSamp(Moments),
    VariancePop(Moments),
    VarianceSamp(Moments),
}

impl AccumulatorState {
    /// Applies one contributing row.
    ///
    /// `value` is the evaluated accumulator expression (`None` = missing),
    /// `seq` the row's arrival sequence within the owning group stage, and
    /// `diff` +1 for an add or -1 for the matching remove. Numeric kinds
    /// ignore non-numeric values; positional kinds record a missing value
    /// as null so arrival order stays faithful to the input.
    pub fn apply(&mut self, value: Option<&DocValue>, seq: u64, diff: i32) {
        match self {
            AccumulatorState::Sum { sum } => {
                if let Some(n) = value.and_then(DocValue::as_f64) {
                    *sum += n * diff as f64;
                }
            }
            AccumulatorState::Count { count } => {
                *count += diff as i64;
            }
            AccumulatorState::Avg { sum, count } => {
                if let Some(n) = value.and_then(DocValue::as_f64) {
                    *sum += n * diff as f64;
                    *count += diff as i64;
                }
            }
            AccumulatorState::Min { values } | AccumulatorState::Max { values } => {
                if let Some(v) = value {
                    multiset_apply(values, v, diff);
                }
            }
            AccumulatorState::First { entries }
            | AccumulatorState::Last { entries }
            | AccumulatorState::Push { entries } => {
                if diff > 0 {
                    entries.insert(seq, value.cloned().unwrap_or(DocValue::Null));
                } else {
                    entries.remove(&seq);
                }
            }
            AccumulatorState::AddToSet { values } => {
                if let Some(v) = value {
                    multiset_apply(values, v, diff);
                }
            }
            AccumulatorState::StdDevPop(m)
            | AccumulatorState::StdDevSamp(m)
            | AccumulatorState::VariancePop(m)
            | AccumulatorState::VarianceSamp(m) => m.apply(value, diff),
        }
    }

    /// Renders the current aggregate value for the group's output row.
    pub fn value(&self) -> DocValue {
        match self {
            AccumulatorState::Sum { sum } => DocValue::Number(*sum),
            AccumulatorState::Count { count } => DocValue::Number(*count as f64),
            AccumulatorState::Avg { sum, count } => {
                if *count == 0 {
                    DocValue::Null
                } else {
                    DocValue::Number(*sum / *count as f64)
                }
            }
            AccumulatorState::Min { values } => values
                .keys()
                .next()
                .cloned()
                .unwrap_or(DocValue::Null),
            AccumulatorState::Max { values } => values
                .keys()
                .next_back()
                .cloned()
                .unwrap_or(DocValue::Null),
            AccumulatorState::First { entries } => entries
                .values()
                .next()
                .cloned()
                .unwrap_or(DocValue::Null),
            AccumulatorState::Last { entries } => entries
                .values()
                .next_back()
                .cloned()
                .unwrap_or(DocValue::Null),
            AccumulatorState::Push { entries } => {
                DocValue::Array(entries.values().cloned().collect())
            }
            AccumulatorState::AddToSet { values } => {
                DocValue::Array(values.keys().cloned().collect::<Vec<_>>())
            }
            AccumulatorState::StdDevPop(m) => {
                number_or_null(m.variance_pop().map(libm::sqrt))
            }
            AccumulatorState::StdDevSamp(m) => {
                number_or_null(m.variance_samp().map(libm::sqrt))
            }
            AccumulatorState::VariancePop(m) => number_or_null(m.variance_pop()),
            AccumulatorState::VarianceSamp(m) => number_or_null(m.variance_samp()),
        }
    }
}

fn number_or_null(value: Option<f64>) -> DocValue {
    match value {
        Some(n) => DocValue::Number(n),
        None => DocValue::Null,
    }
}

fn multiset_apply(values: &mut BTreeMap<DocValue, i32>, value: &DocValue, diff: i32) {
    let count = values.entry(value.clone()).or_insert(0);
    *count += diff;
    if *count <= 0 {
        values.remove(value);
    }
}
