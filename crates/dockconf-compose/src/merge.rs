//! Option record merging.
//!
//! Conflicting keys are combined by shape:
//! - mapping + mapping: merged recursively,
//! - list + list: base items followed by override items,
//! - anything else: the override value replaces the base value.
//!
//! Keys keep their first-seen position, so base keys come first and keys
//! introduced by an override are appended in the override's order.

use dockconf_common::types::{OptionRecord, OptionValue};

/// Merges `overlay` onto `base`, returning a new record.
///
/// Neither input is modified.
#[must_use]
pub fn merge(base: &OptionRecord, overlay: &OptionRecord) -> OptionRecord {
    let mut merged = base.clone();
    merge_into(&mut merged, overlay);
    merged
}

/// Merges `overlay` onto `target` in place.
pub fn merge_into(target: &mut OptionRecord, overlay: &OptionRecord) {
    for (key, value) in overlay {
        match target.get_mut(key) {
            Some(existing) => merge_value(existing, value),
            None => {
                let _ = target.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Folds a chain of records left to right; later records take priority.
#[must_use]
pub fn merge_chain<'a, I>(records: I) -> OptionRecord
where
    I: IntoIterator<Item = &'a OptionRecord>,
{
    let mut merged = OptionRecord::new();
    for record in records {
        merge_into(&mut merged, record);
    }
    merged
}

fn merge_value(existing: &mut OptionValue, overlay: &OptionValue) {
    match (existing, overlay) {
        (OptionValue::Mapping(base), OptionValue::Mapping(over)) => merge_into(base, over),
        (OptionValue::List(base), OptionValue::List(over)) => base.extend(over.iter().cloned()),
        (slot, value) => *slot = value.clone(),
    }
}


#[cfg(test)]
mod proptest_tests {
    use dockconf_common::types::{OptionRecord, OptionValue};
    use proptest::prelude::*;

    use super::{merge, merge_chain};

    fn scalar() -> impl Strategy<Value = OptionValue> {
        prop_oneof![
            Just(OptionValue::Null),
            any::<bool>().prop_map(OptionValue::Bool),
            any::<i64>().prop_map(OptionValue::Integer),
            "[a-z]{0,6}".prop_map(OptionValue::String),
        ]
    }

    fn value() -> impl Strategy<Value = OptionValue> {
        scalar().prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(OptionValue::List),
                prop::collection::vec(("[a-d]", inner), 0..4)
                    .prop_map(|pairs| OptionValue::Mapping(pairs.into_iter().collect())),
            ]
        })
    }

    fn record_with_keys(keys: &'static str) -> impl Strategy<Value = OptionRecord> {
        prop::collection::vec((keys, value()), 0..6)
            .prop_map(|pairs| pairs.into_iter().collect::<OptionRecord>())
    }

    proptest! {
        /// Property: records without shared keys merge into their union
        #[test]
        fn disjoint_records_merge_to_union(
            a in record_with_keys("[a-e]"),
            b in record_with_keys("[f-j]"),
        ) {
            let merged = merge(&a, &b);
            let union: OptionRecord = a.clone().into_iter().chain(b.clone()).collect();
            prop_assert_eq!(merged, union);
        }

        /// Property: the empty record is a left and right identity
        #[test]
        fn empty_record_is_identity(a in record_with_keys("[a-e]")) {
            prop_assert_eq!(merge(&a, &OptionRecord::new()), a.clone());
            prop_assert_eq!(merge(&OptionRecord::new(), &a), a);
        }

        /// Property: an override value that cannot be combined always wins
        #[test]
        fn uncombinable_override_wins(
            a in record_with_keys("[a-e]"),
            b in record_with_keys("[a-e]"),
        ) {
            let merged = merge(&a, &b);
            for (key, over) in &b {
                let combinable = matches!(
                    (a.get(key), over),
                    (Some(OptionValue::List(_)), OptionValue::List(_))
                        | (Some(OptionValue::Mapping(_)), OptionValue::Mapping(_))
                );
                if !combinable {
                    prop_assert_eq!(&merged[key], over);
                }
            }
        }

        /// Property: list-valued keys concatenate base then override
        #[test]
        fn lists_concatenate_in_order(
            left in prop::collection::vec(scalar(), 0..4),
            right in prop::collection::vec(scalar(), 0..4),
        ) {
            let a: OptionRecord = [("env".to_owned(), OptionValue::List(left.clone()))].into_iter().collect();
            let b: OptionRecord = [("env".to_owned(), OptionValue::List(right.clone()))].into_iter().collect();
            let expected: Vec<OptionValue> = left.into_iter().chain(right).collect();
            prop_assert_eq!(&merge(&a, &b)["env"], &OptionValue::List(expected));
        }

        /// Property: folding a chain equals nested pairwise merges
        #[test]
        fn chain_matches_pairwise_fold(
            a in record_with_keys("[a-e]"),
            b in record_with_keys("[a-e]"),
            c in record_with_keys("[a-e]"),
        ) {
            prop_assert_eq!(merge_chain([&a, &b, &c]), merge(&merge(&a, &b), &c));
        }
    }
}
