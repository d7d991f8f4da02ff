use serde::{Deserialize, Serialize};

use crate::aggregate::counts::{category_counts, cumulative_counts, CumulativePoint, GroupKey};
use crate::aggregate::density::{normal_density, NormalCurve};
use crate::aggregate::groups::{group_means, top_bottom_by_group, GroupExtremes};
use crate::aggregate::histogram::{
    cumulative_stacked_series, grouped_histogram, histogram_bins, Bin, GroupedBin, StackedBin,
};
use crate::config::DashboardConfig;
use crate::data::filter::{apply, distinct_values, FilterSpec};
use crate::data::model::{AuditStatus, Field, NumericField, OrderedCategory, RecordSet};
use crate::error::AggregateError;

// ---------------------------------------------------------------------------
// Chart catalogue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChartKind {
    ScoreHistogram,
    CumulativeDistribution,
    HistogramByCountry,
    HistogramByStore,
    StatusIceberg,
    IcebergByCountry,
    IcebergByStore,
    StackedArea,
    NormalOverlay,
    MeanByCountry,
    MeanByStore,
    TopBottomStores,
}

impl ChartKind {
    pub const ALL: [ChartKind; 12] = [
        ChartKind::ScoreHistogram,
        ChartKind::CumulativeDistribution,
        ChartKind::HistogramByCountry,
        ChartKind::HistogramByStore,
        ChartKind::StatusIceberg,
        ChartKind::IcebergByCountry,
        ChartKind::IcebergByStore,
        ChartKind::StackedArea,
        ChartKind::NormalOverlay,
        ChartKind::MeanByCountry,
        ChartKind::MeanByStore,
        ChartKind::TopBottomStores,
    ];

    pub fn title(self) -> &'static str {
        match self {
            ChartKind::ScoreHistogram => "Overall Distribution by Audit Status",
            ChartKind::CumulativeDistribution => "Cumulative Distribution of Performance Scores",
            ChartKind::HistogramByCountry => "Country-wise Performance Distribution",
            ChartKind::HistogramByStore => "Store-wise Performance Distribution",
            ChartKind::StatusIceberg => "Cumulative Audit Status (Iceberg)",
            ChartKind::IcebergByCountry => "Iceberg by Country",
            ChartKind::IcebergByStore => "Iceberg by Store",
            ChartKind::StackedArea => "Cumulative Audit Status by Score",
            ChartKind::NormalOverlay => "Score Distribution with Normal Curve",
            ChartKind::MeanByCountry => "Average Score by Country",
            ChartKind::MeanByStore => "Average Score by Store",
            ChartKind::TopBottomStores => "Top and Bottom Store per Country",
        }
    }

    /// Index in [`ChartKind::ALL`].
    pub fn position(self) -> usize {
        ChartKind::ALL
            .iter()
            .position(|k| *k == self)
            .unwrap_or(ChartKind::ALL.len())
    }
}

// ---------------------------------------------------------------------------
// Chart data handed to the presentation layer
// ---------------------------------------------------------------------------

/// Plain data behind one chart. Nothing here depends on a plotting library.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ChartData {
    /// Score bins split by audit status.
    GroupedHistogram(Vec<GroupedBin>),
    Cumulative(Vec<CumulativePoint>),
    /// One status-split histogram per group value (small multiples).
    PerGroupHistograms(Vec<(String, Vec<GroupedBin>)>),
    /// Row label → count of every audit status, in status order.
    StatusTallies(Vec<(String, Vec<(AuditStatus, usize)>)>),
    Stacked(Vec<StackedBin<AuditStatus>>),
    NormalOverlay { bins: Vec<Bin>, curve: NormalCurve },
    /// Group label → mean score.
    Means(Vec<(String, f64)>),
    Extremes(Vec<GroupExtremes>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartOutput {
    pub kind: ChartKind,
    pub result: Result<ChartData, AggregateError>,
}

/// Everything computed for one filter state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub records: usize,
    pub missing_results: usize,
    pub charts: Vec<ChartOutput>,
}

// ---------------------------------------------------------------------------
// Running the pipeline
// ---------------------------------------------------------------------------

/// Compute every configured chart over an (already filtered) view.
///
/// A chart that fails carries its error; the remaining charts are still computed.
pub fn run(view: &RecordSet, config: &DashboardConfig) -> Report {
    let charts = config
        .charts
        .iter()
        .map(|&kind| {
            let result = compute(kind, view, config);
            if let Err(e) = &result {
                log::warn!("{}: {e}", kind.title());
            }
            ChartOutput { kind, result }
        })
        .collect();

    Report {
        records: view.len(),
        missing_results: view.missing_results(),
        charts,
    }
}

fn compute(
    kind: ChartKind,
    view: &RecordSet,
    config: &DashboardConfig,
) -> Result<ChartData, AggregateError> {
    let records = view.records();
    let score = NumericField::Result;
    let bins = config.bin_count;

    let data = match kind {
        ChartKind::ScoreHistogram => {
            ChartData::GroupedHistogram(grouped_histogram(records, score, bins, Field::AuditStatus))
        }
        ChartKind::CumulativeDistribution => ChartData::Cumulative(cumulative_counts(records, score)),
        ChartKind::HistogramByCountry => per_group_histograms(view, Field::Country, bins),
        ChartKind::HistogramByStore => per_group_histograms(view, Field::Store, bins),
        ChartKind::StatusIceberg => status_tallies(view, &[], "Cumulative"),
        ChartKind::IcebergByCountry => status_tallies(view, &[Field::Country], ""),
        ChartKind::IcebergByStore => status_tallies(view, &[Field::Store], ""),
        ChartKind::StackedArea => ChartData::Stacked(cumulative_stacked_series(
            records,
            score,
            bins,
            AuditStatus::ALL,
        )),
        ChartKind::NormalOverlay => ChartData::NormalOverlay {
            bins: histogram_bins(records, score, bins),
            curve: normal_density(records, score, config.density_samples, config.density_domain)?,
        },
        ChartKind::MeanByCountry => means(view, Field::Country),
        ChartKind::MeanByStore => means(view, Field::Store),
        ChartKind::TopBottomStores => ChartData::Extremes(top_bottom_by_group(
            records,
            Field::Country,
            Field::Store,
            score,
        )),
    };
    Ok(data)
}

fn label(key: &GroupKey, fallback: &str) -> String {
    if key.is_empty() {
        fallback.to_string()
    } else {
        key.join(" / ")
    }
}

fn per_group_histograms(view: &RecordSet, field: Field, bin_count: usize) -> ChartData {
    let groups = distinct_values(view.records(), field)
        .into_iter()
        .map(|value| {
            let subset = apply(view, &FilterSpec::only(field, &value));
            let bins = grouped_histogram(
                subset.records(),
                NumericField::Result,
                bin_count,
                Field::AuditStatus,
            );
            (value, bins)
        })
        .collect();
    ChartData::PerGroupHistograms(groups)
}

fn status_tallies(view: &RecordSet, partition: &[Field], overall_label: &str) -> ChartData {
    let rows = category_counts::<AuditStatus>(view.records(), partition)
        .into_iter()
        .map(|(key, counts)| (label(&key, overall_label), counts))
        .collect();
    ChartData::StatusTallies(rows)
}

fn means(view: &RecordSet, field: Field) -> ChartData {
    let rows = group_means(view.records(), &[field])
        .into_iter()
        .map(|(key, mean)| (label(&key, ""), mean))
        .collect();
    ChartData::Means(rows)
}
