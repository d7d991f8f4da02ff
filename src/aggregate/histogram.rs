use std::collections::BTreeMap;

use serde::Serialize;

use crate::data::model::{Field, NumericField, OrderedCategory, Record};

// ---------------------------------------------------------------------------
// Bin layout
// ---------------------------------------------------------------------------

/// One equal-width histogram bin.
///
/// Bins are `[low, high)` except the last one, which is `[low, high]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bin {
    pub low: f64,
    pub high: f64,
    pub count: usize,
}

impl Bin {
    pub fn mid(&self) -> f64 {
        (self.low + self.high) / 2.0
    }
}

/// Bin whose counts are split by a categorical field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedBin {
    pub low: f64,
    pub high: f64,
    /// Group value → count; groups with no record in this bin are absent.
    pub counts: BTreeMap<String, usize>,
}

/// Bin of a cumulative stacked series, one entry per category in caller order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackedBin<C> {
    pub low: f64,
    pub high: f64,
    /// Running total per category over this bin and all bins below it.
    pub cumulative: Vec<(C, usize)>,
}

impl<C> StackedBin<C> {
    pub fn mid(&self) -> f64 {
        (self.low + self.high) / 2.0
    }
}

/// Equal-width edges over `[min, max]` of a sample.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BinEdges {
    min: f64,
    max: f64,
    width: f64,
    count: usize,
}

impl BinEdges {
    /// `None` for an empty sample or a zero bin count. Identical values
    /// collapse to a single `[v, v]` bin.
    pub(crate) fn over(values: &[f64], bin_count: usize) -> Option<Self> {
        if values.is_empty() || bin_count == 0 {
            return None;
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if (max - min).abs() < f64::EPSILON {
            return Some(BinEdges { min, max, width: 0.0, count: 1 });
        }
        Some(BinEdges {
            min,
            max,
            width: (max - min) / bin_count as f64,
            count: bin_count,
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.count
    }

    pub(crate) fn index(&self, value: f64) -> usize {
        if self.width == 0.0 {
            return 0;
        }
        let idx = ((value - self.min) / self.width).floor() as usize;
        idx.min(self.count - 1)
    }

    pub(crate) fn bounds(&self, idx: usize) -> (f64, f64) {
        let low = self.min + idx as f64 * self.width;
        let high = if idx + 1 == self.count {
            self.max
        } else {
            self.min + (idx + 1) as f64 * self.width
        };
        (low, high)
    }
}

/// Non-missing values of `field`, in record order.
pub(crate) fn present_values(records: &[Record], field: NumericField) -> Vec<f64> {
    records.iter().filter_map(|r| field.get(r)).collect()
}

// ---------------------------------------------------------------------------
// Histograms
// ---------------------------------------------------------------------------

/// Equal-width histogram of `field` over `[min, max]` of the non-missing values.
pub fn histogram_bins(records: &[Record], field: NumericField, bin_count: usize) -> Vec<Bin> {
    let values = present_values(records, field);
    let Some(edges) = BinEdges::over(&values, bin_count) else {
        return Vec::new();
    };

    let mut counts = vec![0usize; edges.len()];
    for &v in &values {
        counts[edges.index(v)] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| {
            let (low, high) = edges.bounds(i);
            Bin { low, high, count }
        })
        .collect()
}

/// Histogram of `field` with each bin's count broken down by `group`.
///
/// Uses the same edges as [`histogram_bins`] over the same records.
pub fn grouped_histogram(
    records: &[Record],
    field: NumericField,
    bin_count: usize,
    group: Field,
) -> Vec<GroupedBin> {
    let values = present_values(records, field);
    let Some(edges) = BinEdges::over(&values, bin_count) else {
        return Vec::new();
    };

    let mut bins: Vec<GroupedBin> = (0..edges.len())
        .map(|i| {
            let (low, high) = edges.bounds(i);
            GroupedBin { low, high, counts: BTreeMap::new() }
        })
        .collect();

    for rec in records {
        if let Some(v) = field.get(rec) {
            *bins[edges.index(v)]
                .counts
                .entry(rec.get(group).to_string())
                .or_default() += 1;
        }
    }
    bins
}

/// Cumulative per-category counts over ascending bins of `field`.
///
/// Each bin reports, for every category in `order`, how many records of that
/// category fall in this bin or any lower one. Categories keep the caller's
/// order so stacked layers stay put across bins and refreshes. Records whose
/// category is missing from `order` are skipped.
pub fn cumulative_stacked_series<C: OrderedCategory>(
    records: &[Record],
    field: NumericField,
    bin_count: usize,
    order: &[C],
) -> Vec<StackedBin<C>> {
    let values = present_values(records, field);
    let Some(edges) = BinEdges::over(&values, bin_count) else {
        return Vec::new();
    };

    // per_bin[bin][position in order]
    let mut per_bin = vec![vec![0usize; order.len()]; edges.len()];
    for rec in records {
        let (Some(v), Some(cat)) = (field.get(rec), C::of(rec)) else {
            continue;
        };
        if let Some(pos) = order.iter().position(|c| *c == cat) {
            per_bin[edges.index(v)][pos] += 1;
        }
    }

    let mut running = vec![0usize; order.len()];
    per_bin
        .into_iter()
        .enumerate()
        .map(|(i, counts)| {
            for (total, n) in running.iter_mut().zip(counts) {
                *total += n;
            }
            let (low, high) = edges.bounds(i);
            StackedBin {
                low,
                high,
                cumulative: order.iter().copied().zip(running.iter().copied()).collect(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::rec;
    use crate::data::model::AuditStatus;

    fn scores(vals: &[Option<f64>]) -> Vec<Record> {
        vals.iter().map(|&v| rec("S", "C", "Outstanding", v)).collect()
    }

    #[test]
    fn two_bins_last_edge_closed() {
        let records = vec![
            rec("S", "C", "A", Some(50.0)),
            rec("S", "C", "A", Some(60.0)),
            rec("S", "C", "B", Some(70.0)),
        ];
        let bins = histogram_bins(&records, NumericField::Result, 2);
        assert_eq!(
            bins,
            vec![
                Bin { low: 50.0, high: 60.0, count: 1 },
                Bin { low: 60.0, high: 70.0, count: 2 },
            ]
        );
        assert_eq!(bins[1].mid(), 65.0);
    }

    #[test]
    fn counts_sum_to_non_missing_records() {
        let records = scores(&[Some(3.0), None, Some(97.5), Some(41.0), None, Some(41.0), Some(0.0)]);
        let bins = histogram_bins(&records, NumericField::Result, 20);
        assert_eq!(bins.len(), 20);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 5);
        assert_eq!(bins[0].low, 0.0);
        assert_eq!(bins[19].high, 97.5);
    }

    #[test]
    fn empty_or_all_missing_input_has_no_bins() {
        assert!(histogram_bins(&[], NumericField::Result, 20).is_empty());
        assert!(histogram_bins(&scores(&[None, None]), NumericField::Result, 20).is_empty());
        assert!(histogram_bins(&scores(&[Some(1.0)]), NumericField::Result, 0).is_empty());
    }

    #[test]
    fn identical_values_share_one_bin() {
        let bins = histogram_bins(&scores(&[Some(80.0), Some(80.0)]), NumericField::Result, 20);
        assert_eq!(bins, vec![Bin { low: 80.0, high: 80.0, count: 2 }]);
    }

    #[test]
    fn grouped_histogram_splits_by_status() {
        let records = vec![
            rec("S", "C", "A", Some(50.0)),
            rec("S", "C", "A", Some(60.0)),
            rec("S", "C", "B", Some(70.0)),
            rec("S", "C", "B", None),
        ];
        let bins = grouped_histogram(&records, NumericField::Result, 2, Field::AuditStatus);
        assert_eq!(bins.len(), 2);
        assert_eq!(bins[0].counts, BTreeMap::from([("A".to_string(), 1)]));
        assert_eq!(
            bins[1].counts,
            BTreeMap::from([("A".to_string(), 1), ("B".to_string(), 1)])
        );
    }

    #[test]
    fn stacked_series_accumulates_over_bins_in_given_order() {
        let records = vec![
            rec("S", "C", "Outstanding", Some(90.0)),
            rec("S", "C", "Below Expectation", Some(10.0)),
            rec("S", "C", "Below Expectation", Some(20.0)),
            rec("S", "C", "Meets Expectation", Some(60.0)),
            rec("S", "C", "Good", Some(50.0)),
        ];
        let series =
            cumulative_stacked_series(&records, NumericField::Result, 2, AuditStatus::ALL);
        assert_eq!(series.len(), 2);
        assert_eq!(
            series[0].cumulative,
            vec![
                (AuditStatus::BelowExpectation, 2),
                (AuditStatus::NeedsImprovement, 0),
                (AuditStatus::MeetsExpectation, 0),
                (AuditStatus::Outstanding, 0),
            ]
        );
        assert_eq!(
            series[1].cumulative,
            vec![
                (AuditStatus::BelowExpectation, 2),
                (AuditStatus::NeedsImprovement, 0),
                (AuditStatus::MeetsExpectation, 1),
                (AuditStatus::Outstanding, 1),
            ]
        );
        for pair in series.windows(2) {
            for (a, b) in pair[0].cumulative.iter().zip(&pair[1].cumulative) {
                assert!(a.1 <= b.1);
            }
        }
    }

    #[test]
    fn stacked_series_respects_custom_order() {
        let records = vec![
            rec("S", "C", "Outstanding", Some(90.0)),
            rec("S", "C", "Below Expectation", Some(10.0)),
        ];
        let order = [AuditStatus::Outstanding, AuditStatus::BelowExpectation];
        let series = cumulative_stacked_series(&records, NumericField::Result, 4, &order);
        let last = series.last().map(|b| b.cumulative.clone()).unwrap_or_default();
        assert_eq!(
            last,
            vec![(AuditStatus::Outstanding, 1), (AuditStatus::BelowExpectation, 1)]
        );
    }
}
