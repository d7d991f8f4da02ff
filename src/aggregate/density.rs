use serde::{Deserialize, Serialize};
use statrs::distribution::{Continuous, Normal};
use statrs::statistics::Statistics;

use super::histogram::present_values;
use crate::data::model::{NumericField, Record};
use crate::error::AggregateError;

/// Sample statistics of a numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SampleStats {
    pub count: usize,
    pub mean: f64,
    /// Bessel-corrected (n − 1) standard deviation.
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

/// Mean, sample standard deviation and range. Needs at least two values.
pub fn describe(values: &[f64]) -> Result<SampleStats, AggregateError> {
    if values.len() < 2 {
        return Err(AggregateError::InsufficientData {
            needed: 2,
            found: values.len(),
        });
    }
    Ok(SampleStats {
        count: values.len(),
        mean: values.iter().mean(),
        std_dev: values.iter().std_dev(),
        min: values.iter().copied().fold(f64::INFINITY, f64::min),
        max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    })
}

/// Interval the density curve is sampled over.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DensityDomain {
    /// `[min, max]` of the sample.
    Observed,
    Fixed { low: f64, high: f64 },
}

/// Gaussian fitted to a sample, evaluated on an even grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalCurve {
    pub stats: SampleStats,
    /// `(x, density)` pairs, ascending in `x`.
    pub points: Vec<(f64, f64)>,
}

/// Fit a normal distribution to `field` and sample its density `samples` times.
///
/// Fails with `InsufficientData` below two values and `ZeroVariance` when
/// every value is the same.
pub fn normal_density(
    records: &[Record],
    field: NumericField,
    samples: usize,
    domain: DensityDomain,
) -> Result<NormalCurve, AggregateError> {
    let stats = describe(&present_values(records, field))?;
    // Streaming variance of repeated non-integer values leaves a residue
    // near 1e-15, so a flat sample is detected by its range.
    if stats.max <= stats.min || stats.std_dev.is_nan() || stats.std_dev <= 0.0 {
        return Err(AggregateError::ZeroVariance { mean: stats.mean });
    }
    let normal = Normal::new(stats.mean, stats.std_dev)
        .map_err(|_| AggregateError::ZeroVariance { mean: stats.mean })?;

    let (low, high) = match domain {
        DensityDomain::Observed => (stats.min, stats.max),
        DensityDomain::Fixed { low, high } => (low, high),
    };

    let points = linspace(low, high, samples)
        .map(|x| (x, normal.pdf(x)))
        .collect();

    Ok(NormalCurve { stats, points })
}

/// `n` evenly spaced values from `low` to `high` inclusive.
fn linspace(low: f64, high: f64, n: usize) -> impl Iterator<Item = f64> {
    let step = if n > 1 { (high - low) / (n - 1) as f64 } else { 0.0 };
    (0..n).map(move |i| if i + 1 == n && n > 1 { high } else { low + i as f64 * step })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::rec;

    fn scores(vals: &[f64]) -> Vec<Record> {
        vals.iter().map(|&v| rec("S", "C", "Outstanding", Some(v))).collect()
    }

    fn trapezoid(points: &[(f64, f64)]) -> f64 {
        points
            .windows(2)
            .map(|w| (w[1].0 - w[0].0) * (w[0].1 + w[1].1) / 2.0)
            .sum()
    }

    #[test]
    fn describe_uses_sample_std_dev() {
        let stats = describe(&[10.0, 20.0, 30.0]).unwrap();
        assert_eq!(stats.count, 3);
        assert!((stats.mean - 20.0).abs() < 1e-12);
        assert!((stats.std_dev - 10.0).abs() < 1e-9);
        assert_eq!((stats.min, stats.max), (10.0, 30.0));
    }

    #[test]
    fn single_value_is_insufficient() {
        let err = normal_density(&scores(&[42.0]), NumericField::Result, 500, DensityDomain::Observed)
            .unwrap_err();
        assert_eq!(err, AggregateError::InsufficientData { needed: 2, found: 1 });
        assert!(normal_density(&[], NumericField::Result, 500, DensityDomain::Observed).is_err());
    }

    #[test]
    fn missing_scores_do_not_count() {
        let records = vec![
            rec("S", "C", "Outstanding", Some(42.0)),
            rec("S", "C", "Outstanding", None),
        ];
        assert!(matches!(
            normal_density(&records, NumericField::Result, 10, DensityDomain::Observed),
            Err(AggregateError::InsufficientData { found: 1, .. })
        ));
    }

    #[test]
    fn identical_values_have_no_density() {
        let err = normal_density(&scores(&[75.0, 75.0, 75.0]), NumericField::Result, 50, DensityDomain::Observed)
            .unwrap_err();
        assert_eq!(err, AggregateError::ZeroVariance { mean: 75.0 });
    }

    #[test]
    fn identical_fractional_values_have_no_density() {
        let records = scores(&[72.3; 6]);
        let result = normal_density(&records, NumericField::Result, 500, DensityDomain::Observed);
        assert!(
            matches!(result, Err(AggregateError::ZeroVariance { .. })),
            "got {result:?}"
        );
    }

    #[test]
    fn density_integrates_to_one_over_four_sigma() {
        // mean 20, sd 10 → ±4σ is [-20, 60]
        let curve = normal_density(
            &scores(&[10.0, 20.0, 30.0]),
            NumericField::Result,
            500,
            DensityDomain::Fixed { low: -20.0, high: 60.0 },
        )
        .unwrap();
        assert_eq!(curve.points.len(), 500);
        assert_eq!(curve.points[0].0, -20.0);
        assert_eq!(curve.points[499].0, 60.0);
        let area = trapezoid(&curve.points);
        assert!((area - 1.0).abs() < 0.05, "area = {area}");

        let peak = 1.0 / (10.0 * (2.0 * std::f64::consts::PI).sqrt());
        let max_density = curve.points.iter().map(|p| p.1).fold(0.0, f64::max);
        assert!((max_density - peak).abs() < 1e-4);
    }

    #[test]
    fn observed_domain_spans_min_to_max() {
        let curve = normal_density(&scores(&[55.0, 70.0, 85.0, 60.0]), NumericField::Result, 5, DensityDomain::Observed)
            .unwrap();
        let xs: Vec<f64> = curve.points.iter().map(|p| p.0).collect();
        assert_eq!(xs, vec![55.0, 62.5, 70.0, 77.5, 85.0]);
        assert!(curve.points.iter().all(|p| p.1.is_finite() && p.1 > 0.0));
    }
}
