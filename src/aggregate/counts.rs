use std::collections::BTreeMap;

use serde::Serialize;

use crate::data::model::{Field, NumericField, OrderedCategory, Record};

/// Values of the grouping fields for one group, in the order the fields were given.
pub type GroupKey = Vec<String>;

pub(crate) fn group_key(record: &Record, fields: &[Field]) -> GroupKey {
    fields.iter().map(|&f| record.get(f).to_string()).collect()
}

/// One step of the empirical CDF.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CumulativePoint {
    /// Position of the record in the input slice.
    pub index: usize,
    pub value: f64,
    /// Running count, `1..=n`.
    pub count: usize,
}

/// Records with a value for `field`, sorted ascending (stable), with running counts.
pub fn cumulative_counts(records: &[Record], field: NumericField) -> Vec<CumulativePoint> {
    let mut present: Vec<(usize, f64)> = records
        .iter()
        .enumerate()
        .filter_map(|(i, r)| field.get(r).map(|v| (i, v)))
        .collect();
    // sort_by is stable: equal scores keep load order
    present.sort_by(|a, b| a.1.total_cmp(&b.1));

    present
        .into_iter()
        .enumerate()
        .map(|(n, (index, value))| CumulativePoint { index, value, count: n + 1 })
        .collect()
}

/// Record count per distinct combination of `fields` values.
///
/// Only combinations that occur are reported; see [`category_counts`] for
/// zero-filled tallies over a fixed enumeration.
pub fn grouped_counts(records: &[Record], fields: &[Field]) -> BTreeMap<GroupKey, usize> {
    let mut counts = BTreeMap::new();
    for rec in records {
        *counts.entry(group_key(rec, fields)).or_default() += 1;
    }
    counts
}

/// Per partition key, the count of every category of `C` in enumeration order.
///
/// Categories without records are reported as zero. With no partition fields
/// the single empty key is always present, even for empty input. Records
/// outside the enumeration are not counted.
pub fn category_counts<C: OrderedCategory>(
    records: &[Record],
    partition: &[Field],
) -> BTreeMap<GroupKey, Vec<(C, usize)>> {
    let zeroed = || C::ALL.iter().map(|&c| (c, 0usize)).collect::<Vec<_>>();

    let mut tallies: BTreeMap<GroupKey, Vec<(C, usize)>> = BTreeMap::new();
    if partition.is_empty() {
        tallies.insert(GroupKey::new(), zeroed());
    }

    let mut fields = partition.to_vec();
    fields.push(C::FIELD);
    for (mut key, n) in grouped_counts(records, &fields) {
        let Some(label) = key.pop() else { continue };
        let row = tallies.entry(key).or_insert_with(zeroed);
        if let Some(cat) = C::parse(&label) {
            if let Some(slot) = row.iter_mut().find(|(c, _)| *c == cat) {
                slot.1 += n;
            }
        }
    }
    tallies
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::rec;
    use crate::data::model::AuditStatus;

    #[test]
    fn cumulative_counts_are_sorted_and_stable() {
        let records = vec![
            rec("A", "X", "Outstanding", Some(70.0)),
            rec("B", "X", "Outstanding", None),
            rec("C", "X", "Outstanding", Some(40.0)),
            rec("D", "X", "Outstanding", Some(70.0)),
        ];
        let cdf = cumulative_counts(&records, NumericField::Result);
        let order: Vec<(usize, usize)> = cdf.iter().map(|p| (p.index, p.count)).collect();
        assert_eq!(order, vec![(2, 1), (0, 2), (3, 3)]);
        assert_eq!(cdf.last().map(|p| p.count), Some(3));
        assert!(cdf.windows(2).all(|w| w[0].value <= w[1].value && w[0].count < w[1].count));
    }

    #[test]
    fn grouped_counts_by_two_fields() {
        let records = vec![
            rec("Opera", "FR", "Outstanding", Some(1.0)),
            rec("Opera", "FR", "Outstanding", None),
            rec("Opera", "FR", "Needs Improvement", Some(1.0)),
            rec("Mall", "AE", "Outstanding", Some(1.0)),
        ];
        let counts = grouped_counts(&records, &[Field::Store, Field::AuditStatus]);
        assert_eq!(counts.len(), 3);
        assert_eq!(counts[&vec!["Opera".to_string(), "Outstanding".to_string()]], 2);
        assert_eq!(counts[&vec!["Mall".to_string(), "Outstanding".to_string()]], 1);
    }

    #[test]
    fn category_counts_include_zero_categories() {
        let records = vec![
            rec("Opera", "FR", "Outstanding", Some(1.0)),
            rec("Opera", "FR", "outstanding", Some(1.0)),
            rec("Mall", "AE", "Below Expectation", None),
            rec("Mall", "AE", "Good", Some(1.0)),
        ];
        let overall = category_counts::<AuditStatus>(&records, &[]);
        assert_eq!(
            overall[&GroupKey::new()],
            vec![
                (AuditStatus::BelowExpectation, 1),
                (AuditStatus::NeedsImprovement, 0),
                (AuditStatus::MeetsExpectation, 0),
                (AuditStatus::Outstanding, 2),
            ]
        );

        let by_store = category_counts::<AuditStatus>(&records, &[Field::Store]);
        assert_eq!(by_store.len(), 2);
        for row in by_store.values() {
            assert_eq!(row.len(), AuditStatus::ALL.len());
        }
        assert_eq!(by_store[&vec!["Mall".to_string()]][0], (AuditStatus::BelowExpectation, 1));
    }

    #[test]
    fn category_counts_on_empty_input() {
        let overall = category_counts::<AuditStatus>(&[], &[]);
        assert_eq!(overall.len(), 1);
        assert!(overall[&GroupKey::new()].iter().all(|(_, n)| *n == 0));
        assert!(category_counts::<AuditStatus>(&[], &[Field::Country]).is_empty());
    }
}
