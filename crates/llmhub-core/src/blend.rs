use serde::{Deserialize, Serialize};

use crate::model::{CandidateModel, Metric, QualityMetric};
use crate::normalize::{ReferenceStats, NEUTRAL};
use crate::profile::DimensionWeights;
use crate::scenario::QualityWeights;

/// Per-dimension scores for one candidate, each in 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub quality: f64,
    pub cost: f64,
    pub latency: f64,
    pub throughput: f64,
    pub total: f64,
}

fn round1(v: f64) -> f64 {
    ((v * 10.0).round() / 10.0).clamp(0.0, 100.0)
}

impl DimensionScore {
    /// Every field at one decimal, as reported to callers.
    pub fn rounded(self) -> Self {
        Self {
            quality: round1(self.quality),
            cost: round1(self.cost),
            latency: round1(self.latency),
            throughput: round1(self.throughput),
            total: round1(self.total),
        }
    }
}

/// Scenario-weighted quality over the sub-metrics the candidate reports.
/// Missing sub-metrics drop out and the remaining weights are renormalized.
pub fn quality_score(
    candidate: &CandidateModel,
    weights: &QualityWeights,
    stats: &ReferenceStats,
) -> f64 {
    let mut sum = 0.0;
    let mut weight = 0.0;
    for (&metric, &w) in weights {
        if w <= 0.0 {
            continue;
        }
        if let Some(s) = stats.score(Metric::Quality(metric), candidate.quality(metric)) {
            sum += w * s;
            weight += w;
        }
    }
    if weight > 0.0 {
        return sum / weight;
    }

    let intelligence = QualityMetric::IntelligenceIndex;
    stats
        .score(Metric::Quality(intelligence), candidate.quality(intelligence))
        .unwrap_or(NEUTRAL)
}

/// Score all four dimensions and combine them under `dims`. Values are left
/// unrounded so ranking sees the exact totals; see [`DimensionScore::rounded`].
pub fn blend(
    candidate: &CandidateModel,
    quality_weights: &QualityWeights,
    dims: &DimensionWeights,
    stats: &ReferenceStats,
) -> DimensionScore {
    let quality = quality_score(candidate, quality_weights, stats);
    let operational =
        |metric: Metric| stats.score(metric, candidate.raw(metric)).unwrap_or(NEUTRAL);
    let cost = operational(Metric::Cost);
    let latency = operational(Metric::Latency);
    let throughput = operational(Metric::Throughput);

    let mut total = quality * dims.quality
        + cost * dims.cost
        + latency * dims.latency
        + throughput * dims.throughput;
    let weight_sum = dims.sum();
    if weight_sum > 0.0 && (weight_sum - 1.0).abs() > 1e-9 {
        total /= weight_sum;
    }

    DimensionScore {
        quality,
        cost,
        latency,
        throughput,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::RobustZScore;
    use crate::profile::OptimizationProfile;

    fn pool() -> Vec<CandidateModel> {
        (0..10)
            .map(|i| {
                let x = f64::from(i);
                CandidateModel {
                    slug: format!("m{i}"),
                    intelligence_index: Some(20.0 + 4.0 * x),
                    coding_index: Some(15.0 + 5.0 * x),
                    ttft_seconds: Some(0.3 + 0.2 * x),
                    tokens_per_second: Some(40.0 + 15.0 * x),
                    price_blended_usd: Some(0.5 + 1.5 * x),
                    ..Default::default()
                }
            })
            .collect()
    }

    fn stats(models: &[CandidateModel]) -> ReferenceStats {
        let refs: Vec<&CandidateModel> = models.iter().collect();
        ReferenceStats::calibrate(&RobustZScore::default(), &refs)
    }

    #[test]
    fn missing_sub_metric_is_excluded() {
        let models = pool();
        let st = stats(&models);
        let weights = QualityWeights::from([
            (QualityMetric::IntelligenceIndex, 0.5),
            (QualityMetric::Tau2, 0.5),
        ]);
        // tau2 absent everywhere: quality equals the intelligence score alone
        let c = &models[7];
        let only_intel = st
            .score(Metric::Quality(QualityMetric::IntelligenceIndex), c.intelligence_index)
            .unwrap();
        assert!((quality_score(c, &weights, &st) - only_intel).abs() < 1e-9);
    }

    #[test]
    fn no_weighted_metric_present_uses_intelligence_then_neutral() {
        let models = pool();
        let st = stats(&models);
        let weights = QualityWeights::from([(QualityMetric::Hle, 1.0)]);
        let c = &models[9];
        assert!(quality_score(c, &weights, &st) > 50.0);

        let bare = CandidateModel::default();
        assert_eq!(quality_score(&bare, &weights, &st), NEUTRAL);
    }

    #[test]
    fn missing_operational_values_are_neutral() {
        let models = pool();
        let st = stats(&models);
        let c = CandidateModel {
            intelligence_index: Some(38.0),
            ..Default::default()
        };
        let s = blend(
            &c,
            &QualityWeights::from([(QualityMetric::IntelligenceIndex, 1.0)]),
            &OptimizationProfile::Balanced.weights(),
            &st,
        );
        assert_eq!(s.cost, 50.0);
        assert_eq!(s.latency, 50.0);
        assert_eq!(s.throughput, 50.0);
    }

    #[test]
    fn scores_bounded_and_rounded() {
        let models = pool();
        let st = stats(&models);
        let weights = QualityWeights::from([(QualityMetric::CodingIndex, 1.0)]);
        for c in &models {
            let s = blend(c, &weights, &OptimizationProfile::Fastest.weights(), &st).rounded();
            for v in [s.quality, s.cost, s.latency, s.throughput, s.total] {
                assert!((0.0..=100.0).contains(&v));
                assert!(((v * 10.0).round() - v * 10.0).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn cheapest_profile_ignores_speed() {
        let models = pool();
        let st = stats(&models);
        let weights = QualityWeights::from([(QualityMetric::IntelligenceIndex, 1.0)]);
        let mut slow = models[4].clone();
        slow.ttft_seconds = Some(30.0);
        slow.tokens_per_second = Some(1.0);
        let a = blend(&models[4], &weights, &OptimizationProfile::Cheapest.weights(), &st);
        let b = blend(&slow, &weights, &OptimizationProfile::Cheapest.weights(), &st);
        assert_eq!(a.total, b.total);
        assert!(b.latency < a.latency);
    }
}
