use std::collections::BTreeMap;

use crate::model::{CandidateModel, Direction, Metric};

/// Score given when statistics are degenerate or a raw value is unknown.
pub const NEUTRAL: f64 = 50.0;

/// Scales MAD to a standard-deviation estimate under normality.
pub const MAD_CONSISTENCY: f64 = 1.4826;

/// Fitted mapping from a raw metric value to a score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricScale {
    /// Median/MAD z-score: `50 + k·d·(v − median) / (1.4826·MAD)`, clamped to 0..=100.
    Robust { median: f64, mad: f64, k: f64 },
    /// Linear min-max onto `0..=ceiling`.
    Linear { min: f64, max: f64, ceiling: f64 },
    /// Every value maps to the same score.
    Constant(f64),
}

impl MetricScale {
    pub fn score(&self, value: f64, direction: Direction) -> f64 {
        match *self {
            Self::Robust { median, mad, k } => {
                if value.is_nan() {
                    return NEUTRAL;
                }
                let z = (value - median) / (MAD_CONSISTENCY * mad);
                (NEUTRAL + k * direction.sign() * z).clamp(0.0, 100.0)
            }
            Self::Linear { min, max, ceiling } => {
                if value.is_nan() {
                    return 0.0;
                }
                let t = (value.clamp(min, max) - min) / (max - min);
                let t = match direction {
                    Direction::HigherBetter => t,
                    Direction::LowerBetter => 1.0 - t,
                };
                (t * ceiling).clamp(0.0, ceiling)
            }
            Self::Constant(v) => v,
        }
    }
}

/// A normalization strategy: calibrate on a reference population, then score.
pub trait Normalizer {
    fn fit(&self, metric: Metric, reference: &[f64]) -> MetricScale;
}

/// Outlier-resistant z-scores: winsorize, then median and MAD.
#[derive(Debug, Clone, Copy)]
pub struct RobustZScore {
    pub lower_pct: f64,
    pub upper_pct: f64,
}

impl Default for RobustZScore {
    fn default() -> Self {
        Self {
            lower_pct: 0.05,
            upper_pct: 0.95,
        }
    }
}

impl Normalizer for RobustZScore {
    fn fit(&self, metric: Metric, reference: &[f64]) -> MetricScale {
        let mut values = finite_sorted(reference);
        if values.is_empty() {
            return MetricScale::Constant(NEUTRAL);
        }
        winsorize(&mut values, self.lower_pct, self.upper_pct);
        let med = median(&values);
        let mad = median_abs_deviation(&values, med);
        if mad <= 0.0 || !mad.is_finite() {
            return MetricScale::Constant(NEUTRAL);
        }
        MetricScale::Robust {
            median: med,
            mad,
            k: metric.scale(),
        }
    }
}

/// Plain min-max onto `0..=ceiling`. A zero range maps everything to the ceiling.
#[derive(Debug, Clone, Copy)]
pub struct MinMax {
    pub ceiling: f64,
}

impl Normalizer for MinMax {
    fn fit(&self, _metric: Metric, reference: &[f64]) -> MetricScale {
        let values = finite_sorted(reference);
        match (values.first(), values.last()) {
            (Some(&min), Some(&max)) if max > min => MetricScale::Linear {
                min,
                max,
                ceiling: self.ceiling,
            },
            _ => MetricScale::Constant(self.ceiling),
        }
    }
}

fn finite_sorted(values: &[f64]) -> Vec<f64> {
    let mut out: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    out.sort_by(f64::total_cmp);
    out
}

/// Nearest-rank quantile of an ascending, non-empty slice.
pub fn quantile_nearest_rank(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    let rank = (p * n as f64).ceil().clamp(1.0, n as f64) as usize;
    sorted[rank - 1]
}

/// Clip an ascending slice to its `lower`/`upper` nearest-rank quantiles in place.
pub fn winsorize(sorted: &mut [f64], lower: f64, upper: f64) {
    if sorted.is_empty() {
        return;
    }
    let lo = quantile_nearest_rank(sorted, lower);
    let hi = quantile_nearest_rank(sorted, upper);
    for v in sorted.iter_mut() {
        *v = v.clamp(lo, hi);
    }
}

/// Median of an ascending, non-empty slice.
pub fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

pub fn median_abs_deviation(values: &[f64], center: f64) -> f64 {
    let mut dev: Vec<f64> = values.iter().map(|v| (v - center).abs()).collect();
    dev.sort_by(f64::total_cmp);
    median(&dev)
}

/// Request-scoped calibration for every metric, fitted on a reference pool.
#[derive(Debug, Clone)]
pub struct ReferenceStats {
    scales: BTreeMap<Metric, MetricScale>,
}

impl ReferenceStats {
    pub fn calibrate<N: Normalizer + ?Sized>(normalizer: &N, pool: &[&CandidateModel]) -> Self {
        let scales = Metric::all()
            .map(|metric| {
                let values: Vec<f64> = pool.iter().filter_map(|c| c.raw(metric)).collect();
                (metric, normalizer.fit(metric, &values))
            })
            .collect();
        Self { scales }
    }

    pub fn scale(&self, metric: Metric) -> MetricScale {
        self.scales
            .get(&metric)
            .copied()
            .unwrap_or(MetricScale::Constant(NEUTRAL))
    }

    /// Score a raw value in `metric`'s direction; `None` when the value is missing.
    pub fn score(&self, metric: Metric, value: Option<f64>) -> Option<f64> {
        value.map(|v| self.scale(metric).score(v, metric.direction()))
    }
}
