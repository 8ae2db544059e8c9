//! Property-based tests for accumulator invertibility.
//!
//! Applying a sequence of adds and then removing an arbitrary subset must
//! leave every accumulator kind in the same observable state as applying
//! only the surviving values, regardless of removal order.

use proptest::prelude::*;
use rill_core::DocValue;
use rill_ivm::AccKind;

const KINDS: &[AccKind] = &[
    AccKind::Sum,
    AccKind::Count,
    AccKind::Avg,
    AccKind::Min,
    AccKind::Max,
    AccKind::First,
    AccKind::Last,
    AccKind::Push,
    AccKind::AddToSet,
    AccKind::StdDevPop,
    AccKind::StdDevSamp,
    AccKind::VariancePop,
    AccKind::VarianceSamp,
];

/// Integer-valued inputs keep the float arithmetic exact, so removal is an
/// exact inverse of addition. The flag marks entries that survive.
fn entries() -> impl Strategy<Value = Vec<(i64, bool)>> {
    prop::collection::vec((-50i64..50, any::<bool>()), 0..30)
}

proptest! {
    #[test]
    fn removal_inverts_addition(entries in entries()) {
        for kind in KINDS {
            let mut acc = kind.init();
            for (seq, (v, _)) in entries.iter().enumerate() {
                acc.apply(Some(&DocValue::Number(*v as f64)), seq as u64, 1);
            }
            for (seq, (v, keep)) in entries.iter().enumerate() {
                if !keep {
                    acc.apply(Some(&DocValue::Number(*v as f64)), seq as u64, -1);
                }
            }

            let mut oracle = kind.init();
            for (seq, (v, keep)) in entries.iter().enumerate() {
                if *keep {
                    oracle.apply(Some(&DocValue::Number(*v as f64)), seq as u64, 1);
                }
            }

            prop_assert_eq!(acc.value(), oracle.value(), "kind {:?}", kind);
        }
    }

    #[test]
    fn non_numeric_values_leave_numeric_kinds_untouched(
        strings in prop::collection::vec("[a-z]{1,3}", 1..10)
    ) {
        for kind in [AccKind::Sum, AccKind::Avg, AccKind::StdDevPop, AccKind::VariancePop] {
            let mut acc = kind.init();
            for (seq, s) in strings.iter().enumerate() {
                acc.apply(Some(&DocValue::from(s.as_str())), seq as u64, 1);
            }
            prop_assert_eq!(acc.value(), kind.init().value(), "kind {:?}", kind);
        }
    }
}
