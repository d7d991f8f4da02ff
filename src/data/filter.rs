use std::collections::{BTreeMap, BTreeSet};

use super::model::{Field, Record, RecordSet};

// ---------------------------------------------------------------------------
// FilterSpec: which values are allowed per field
// ---------------------------------------------------------------------------

/// Per-field selection state: maps field → set of allowed values.
///
/// A field absent from the spec imposes no constraint. A field present with
/// an empty set matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    allowed: BTreeMap<Field, BTreeSet<String>>,
}

impl FilterSpec {
    /// A spec with every observed value selected for every filterable field.
    pub fn select_everything(dataset: &RecordSet) -> Self {
        let allowed = Field::FILTERABLE
            .iter()
            .filter_map(|&f| dataset.distinct(f).map(|vals| (f, vals.clone())))
            .collect();
        FilterSpec { allowed }
    }

    /// A spec constraining a single field to a single value.
    pub fn only(field: Field, value: &str) -> Self {
        let mut spec = FilterSpec::default();
        spec.set(field, [value.to_string()].into());
        spec
    }

    pub fn allowed(&self, field: Field) -> Option<&BTreeSet<String>> {
        self.allowed.get(&field)
    }

    pub fn set(&mut self, field: Field, values: BTreeSet<String>) {
        self.allowed.insert(field, values);
    }

    /// Add or remove a single value from a field's selection.
    pub fn toggle(&mut self, field: Field, value: &str) {
        let selected = self.allowed.entry(field).or_default();
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
    }
}

// ---------------------------------------------------------------------------
// Applying a spec
// ---------------------------------------------------------------------------

/// Return indices of records that pass all active filters.
///
/// A record passes a field filter when:
/// * The field is not present in `spec` → passes (no constraint)
/// * The allowed set for that field is empty → nothing selected → fails
/// * The record's value for that field is in the allowed set → passes
pub fn filtered_indices(dataset: &RecordSet, spec: &FilterSpec) -> Vec<usize> {
    // Fields whose selection covers every value in this set cannot exclude anything.
    let active: Vec<(Field, &BTreeSet<String>)> = spec
        .allowed
        .iter()
        .filter(|(field, selected)| match dataset.distinct(**field) {
            Some(all_vals) => !all_vals.is_subset(selected),
            None => false,
        })
        .map(|(field, selected)| (*field, selected))
        .collect();

    dataset
        .records()
        .iter()
        .enumerate()
        .filter(|(_, rec)| {
            active
                .iter()
                .all(|(field, selected)| selected.contains(rec.get(*field)))
        })
        .map(|(i, _)| i)
        .collect()
}

/// The subset of `dataset` matching `spec`, as a new set in load order.
///
/// The input is never modified.
pub fn apply(dataset: &RecordSet, spec: &FilterSpec) -> RecordSet {
    let records: Vec<Record> = filtered_indices(dataset, spec)
        .into_iter()
        .map(|i| dataset.records()[i].clone())
        .collect();
    log::debug!("Filter kept {} of {} records", records.len(), dataset.len());
    RecordSet::from_records(records)
}

/// Sorted distinct values of `field` across `records`.
pub fn distinct_values(records: &[Record], field: Field) -> BTreeSet<String> {
    records.iter().map(|r| r.get(field).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::rec;

    fn sample() -> RecordSet {
        RecordSet::from_records(vec![
            rec("Opera", "France", "Outstanding", Some(91.0)),
            rec("Opera", "France", "Needs Improvement", Some(55.0)),
            rec("Mall", "UAE", "Meets Expectation", Some(72.0)),
            rec("Harrods", "UK", "Outstanding", None),
            rec("Mall", "UAE", "Below Expectation", Some(30.0)),
        ])
    }

    fn stores(set: &RecordSet) -> Vec<&str> {
        set.records().iter().map(|r| r.store.as_str()).collect()
    }

    #[test]
    fn absent_fields_impose_no_constraint() {
        let data = sample();
        assert_eq!(apply(&data, &FilterSpec::default()), data);
        assert_eq!(apply(&data, &FilterSpec::select_everything(&data)), data);
    }

    #[test]
    fn and_across_fields_or_within_field() {
        let data = sample();
        let mut spec = FilterSpec::default();
        spec.set(Field::Country, ["France".to_string(), "UAE".to_string()].into());
        spec.set(Field::AuditStatus, ["Outstanding".to_string(), "Below Expectation".to_string()].into());
        let out = apply(&data, &spec);
        assert_eq!(stores(&out), vec!["Opera", "Mall"]);
        assert_eq!(out.records()[1].result, Some(30.0));
    }

    #[test]
    fn empty_selection_yields_empty_result() {
        let data = sample();
        let mut spec = FilterSpec::select_everything(&data);
        spec.set(Field::Store, BTreeSet::new());
        assert!(apply(&data, &spec).is_empty());
    }

    #[test]
    fn applying_twice_is_idempotent() {
        let data = sample();
        let mut spec = FilterSpec::select_everything(&data);
        spec.toggle(Field::Country, "UK");
        spec.toggle(Field::AuditStatus, "Meets Expectation");
        let once = apply(&data, &spec);
        assert_eq!(apply(&once, &spec), once);
        assert_eq!(stores(&once), vec!["Opera", "Opera", "Mall"]);
    }

    #[test]
    fn same_sized_selection_on_a_subset_still_filters_by_members() {
        // The subset observes {Harrods, Opera}; {Mall, Opera} has the same size but must still exclude.
        let data = sample();
        let subset = apply(&data, &FilterSpec::only(Field::AuditStatus, "Outstanding"));
        let mut spec = FilterSpec::default();
        spec.set(Field::Store, ["Opera".to_string(), "Mall".to_string()].into());
        assert_eq!(stores(&apply(&subset, &spec)), vec!["Opera"]);
        spec.set(Field::Store, ["Opera".to_string(), "Harrods".to_string()].into());
        assert_eq!(stores(&apply(&subset, &spec)), vec!["Opera", "Harrods"]);
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut spec = FilterSpec::default();
        spec.toggle(Field::Store, "Opera");
        assert!(spec.allowed(Field::Store).is_some_and(|s| s.contains("Opera")));
        spec.toggle(Field::Store, "Opera");
        assert!(spec.allowed(Field::Store).is_some_and(|s| s.is_empty()));
    }

    #[test]
    fn distinct_values_ignore_other_field_filters() {
        let data = sample();
        let before = distinct_values(data.records(), Field::Country);
        let mut spec = FilterSpec::select_everything(&data);
        spec.set(Field::Store, ["Mall".to_string()].into());
        let _view = apply(&data, &spec);
        assert_eq!(distinct_values(data.records(), Field::Country), before);
        assert_eq!(before.len(), 3);
    }

    #[test]
    fn filtering_does_not_mutate_input() {
        let data = sample();
        let copy = data.clone();
        let _ = apply(&data, &FilterSpec::only(Field::Store, "Mall"));
        assert_eq!(data, copy);
    }
}
