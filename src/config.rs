use serde::{Deserialize, Serialize};

use crate::aggregate::density::DensityDomain;
use crate::pipeline::ChartKind;

/// Knobs of the aggregation pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Number of equal-width score bins in every histogram.
    pub bin_count: usize,
    /// Points on each normal density curve.
    pub density_samples: usize,
    pub density_domain: DensityDomain,
    /// Charts to compute, in display order.
    pub charts: Vec<ChartKind>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            bin_count: 20,
            density_samples: 500,
            density_domain: DensityDomain::Fixed { low: 0.0, high: 100.0 },
            charts: ChartKind::ALL.to_vec(),
        }
    }
}

impl DashboardConfig {
    /// Turn a chart on or off, keeping [`ChartKind::ALL`] order.
    pub fn set_chart(&mut self, kind: ChartKind, enabled: bool) {
        self.charts.retain(|k| *k != kind);
        if enabled {
            self.charts.push(kind);
            self.charts.sort_by_key(|k| k.position());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg: DashboardConfig =
            serde_json::from_str(r#"{"bin_count": 10, "charts": ["NormalOverlay", "ScoreHistogram"]}"#)
                .unwrap();
        assert_eq!(cfg.bin_count, 10);
        assert_eq!(cfg.density_samples, 500);
        assert_eq!(cfg.density_domain, DensityDomain::Fixed { low: 0.0, high: 100.0 });
        assert_eq!(cfg.charts, vec![ChartKind::NormalOverlay, ChartKind::ScoreHistogram]);
    }

    #[test]
    fn observed_domain_from_json() {
        let cfg: DashboardConfig = serde_json::from_str(r#"{"density_domain": "Observed"}"#).unwrap();
        assert_eq!(cfg.density_domain, DensityDomain::Observed);
        assert_eq!(cfg.charts.len(), ChartKind::ALL.len());
    }

    #[test]
    fn toggling_a_chart_keeps_canonical_order() {
        let mut cfg = DashboardConfig::default();
        cfg.set_chart(ChartKind::ScoreHistogram, false);
        assert!(!cfg.charts.contains(&ChartKind::ScoreHistogram));
        cfg.set_chart(ChartKind::ScoreHistogram, true);
        assert_eq!(cfg.charts, ChartKind::ALL.to_vec());
        cfg.set_chart(ChartKind::StackedArea, true);
        assert_eq!(cfg.charts.len(), ChartKind::ALL.len());
    }
}
