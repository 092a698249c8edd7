//! Idempotent record merge
//!
//! # Rules
//!
//! - Existing records carrying a `geocode_source` are never touched
//! - Existing unresolved records are updated in place by id
//! - Unknown ids are appended in input order
//!
//! Merging the same input twice yields the same store as merging it once.

use indexmap::map::Entry;
use indexmap::IndexMap;
use sl_record::{RecordId, ServiceLineRecord};

/// Merge statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// New ids appended
    pub appended: usize,
    /// Unresolved records replaced in place
    pub updated: usize,
    /// Incoming records ignored because the stored record is resolved
    pub preserved: usize,
}

impl MergeOutcome {
    /// Number of incoming records considered
    #[inline]
    #[must_use]
    pub fn total(&self) -> usize {
        self.appended + self.updated + self.preserved
    }
}

/// Combine `existing` with `incoming`
///
/// Order of `existing` is kept; duplicate ids inside `existing` collapse to
/// the first occurrence.
#[must_use]
pub fn merge_records<I>(
    existing: Vec<ServiceLineRecord>,
    incoming: I,
) -> (Vec<ServiceLineRecord>, MergeOutcome)
where
    I: IntoIterator<Item = ServiceLineRecord>,
{
    let mut index: IndexMap<RecordId, ServiceLineRecord> = IndexMap::with_capacity(existing.len());
    for record in existing {
        index.entry(record.id.clone()).or_insert(record);
    }

    let mut outcome = MergeOutcome::default();
    for mut record in incoming {
        match index.entry(record.id.clone()) {
            Entry::Occupied(mut slot) => {
                let current = slot.get();
                if current.is_resolved() {
                    outcome.preserved += 1;
                    continue;
                }
                if record.position.is_none() && !record.is_resolved() {
                    record.position = current.position;
                }
                slot.insert(record);
                outcome.updated += 1;
            }
            Entry::Vacant(slot) => {
                slot.insert(record);
                outcome.appended += 1;
            }
        }
    }

    tracing::debug!(
        appended = outcome.appended,
        updated = outcome.updated,
        preserved = outcome.preserved,
        "merge complete"
    );
    (index.into_values().collect(), outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use sl_record::Material;
    use sl_test_utils::{record, resolved_record};

    #[test]
    fn appends_new_ids_in_order() {
        let existing = vec![record("a", "1 A St", "12309")];
        let incoming = vec![record("c", "3 C St", "12309"), record("b", "2 B St", "12309")];

        let (merged, outcome) = merge_records(existing, incoming);
        let ids: Vec<_> = merged.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "b"]);
        assert_eq!(outcome.appended, 2);
    }

    #[test]
    fn resolved_records_are_never_overwritten() {
        let existing = vec![resolved_record("a", "1 A St", "12309", -73.8, 42.8)];
        let mut changed = record("a", "1 A Street", "12309");
        changed.private_type = Material::Lead;

        let (merged, outcome) = merge_records(existing.clone(), vec![changed]);
        assert_eq!(merged, existing);
        assert_eq!(outcome.preserved, 1);
    }

    #[test]
    fn unresolved_records_update_in_place() {
        let existing = vec![record("a", "1 A St", "12309"), record("b", "2 B St", "12309")];
        let mut changed = record("a", "1 A St", "12309");
        changed.public_type = Material::Lead;

        let (merged, outcome) = merge_records(existing, vec![changed]);
        assert_eq!(merged[0].public_type, Material::Lead);
        assert_eq!(merged.len(), 2);
        assert_eq!(outcome.updated, 1);
    }

    fn arb_record() -> impl Strategy<Value = ServiceLineRecord> {
        (0u8..12, any::<bool>()).prop_map(|(n, resolved)| {
            let id = format!("id{n}");
            let address = format!("{n} Elm St");
            if resolved {
                resolved_record(&id, &address, "12309", -73.9, 42.8)
            } else {
                record(&id, &address, "12304")
            }
        })
    }

    proptest! {
        #[test]
        fn merging_twice_equals_merging_once(
            existing in prop::collection::vec(arb_record(), 0..10),
            incoming in prop::collection::vec(arb_record(), 0..10),
        ) {
            let (once, _) = merge_records(existing, incoming.clone());
            let (twice, _) = merge_records(once.clone(), incoming);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn merged_ids_are_unique(
            existing in prop::collection::vec(arb_record(), 0..10),
            incoming in prop::collection::vec(arb_record(), 0..10),
        ) {
            let (merged, _) = merge_records(existing, incoming);
            let mut ids: Vec<_> = merged.iter().map(|r| r.id.clone()).collect();
            let before = ids.len();
            ids.sort();
            ids.dedup();
            prop_assert_eq!(ids.len(), before);
        }
    }
}
