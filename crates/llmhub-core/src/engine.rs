//! The full recommendation pipeline: filter, calibrate, weight, blend, rank,
//! explain.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::blend::{blend, DimensionScore};
use crate::config::EngineConfig;
use crate::error::{AdvisorError, Result};
use crate::explain::{explain, ExplainContext};
use crate::filter::{filter_candidates, HardFilters, Rejection};
use crate::model::{CandidateModel, Confidence};
use crate::normalize::{Normalizer, ReferenceStats, RobustZScore};
use crate::profile::{effective_weights, OptimizationProfile, SpeedPreference};
use crate::provider::Region;
use crate::rank::{rank_all, Scored};
use crate::reference::{select_reference_pool, PoolSummary};
use crate::scenario::{Scenario, ScenarioWeightResolver};

/// Error code attached to a well-formed but empty result.
pub const NO_FEASIBLE_CANDIDATES: &str = "no_feasible_candidates";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationRequest {
    pub scenario: Scenario,
    pub region: Region,
    pub profile: OptimizationProfile,
    #[serde(alias = "speed_profile")]
    pub speed: SpeedPreference,
    pub filters: HardFilters,
    /// Overrides the configured result count.
    pub top_k: Option<usize>,
    /// End of the recent reference window; defaults to the newest release date.
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub rank: usize,
    pub candidate: CandidateModel,
    pub scores: DimensionScore,
    pub explanations: Vec<String>,
    pub tradeoffs: Vec<String>,
    pub confidence: Confidence,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub results: Vec<RecommendationResult>,
    pub rejected: Vec<Rejection>,
    pub reference_pool: PoolSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Recommendation {
    /// Nothing survived the hard filters.
    pub fn no_feasible_candidates(&self) -> bool {
        self.error.as_deref() == Some(NO_FEASIBLE_CANDIDATES)
    }
}

/// Holds the injected weight table and settings. Cheap to share behind an
/// `Arc`; every call computes its own statistics.
#[derive(Debug, Clone)]
pub struct Recommender {
    resolver: ScenarioWeightResolver,
    config: EngineConfig,
}

impl Recommender {
    pub fn new(resolver: ScenarioWeightResolver, config: EngineConfig) -> Self {
        Self { resolver, config }
    }

    /// Bundled weight table, default settings.
    pub fn bundled() -> Result<Self> {
        Ok(Self::new(ScenarioWeightResolver::bundled()?, EngineConfig::default()))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn resolver(&self) -> &ScenarioWeightResolver {
        &self.resolver
    }

    /// Rank `candidates` for `request` with robust z-score normalization.
    pub fn recommend(
        &self,
        candidates: &[CandidateModel],
        request: &RecommendationRequest,
    ) -> Result<Recommendation> {
        self.recommend_with(&RobustZScore::default(), candidates, request)
    }

    pub fn recommend_with<N: Normalizer + ?Sized>(
        &self,
        normalizer: &N,
        candidates: &[CandidateModel],
        request: &RecommendationRequest,
    ) -> Result<Recommendation> {
        validate(candidates, request)?;
        let top_k = request.top_k.unwrap_or(self.config.top_k);

        let outcome = filter_candidates(candidates, request.region, &request.filters);
        let pool = select_reference_pool(candidates, request.as_of, &self.config.pool_settings());
        let reference_pool = pool.summary();

        if outcome.accepted.is_empty() {
            tracing::warn!(
                scenario = %request.scenario.label(),
                rejected = outcome.rejected.len(),
                "no candidate passed the hard filters"
            );
            return Ok(Recommendation {
                results: Vec::new(),
                rejected: outcome.rejected,
                reference_pool,
                error: Some(NO_FEASIBLE_CANDIDATES.to_string()),
            });
        }

        let stats = ReferenceStats::calibrate(normalizer, &pool.members);
        let quality_weights = self.resolver.resolve(&request.scenario);
        let dims = effective_weights(request.profile, request.speed, self.config.speed_shift);

        let scored = outcome
            .accepted
            .iter()
            .map(|&candidate| Scored {
                candidate,
                scores: blend(candidate, &quality_weights, &dims, &stats),
            })
            .collect();
        let mut ranked = rank_all(scored);
        let runner_up_total = ranked.get(1).map(|s| s.scores.rounded().total);
        ranked.truncate(top_k);

        let results = ranked
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let rank = i + 1;
                let scores = s.scores.rounded();
                let e = explain(&ExplainContext {
                    candidate: s.candidate,
                    scores: &scores,
                    scenario: &request.scenario,
                    region: request.region,
                    rank,
                    runner_up_total,
                    close_margin: self.config.close_margin,
                    usd_to_cny: self.config.usd_to_cny,
                });
                RecommendationResult {
                    rank,
                    candidate: s.candidate.clone(),
                    scores,
                    explanations: e.explanations,
                    tradeoffs: e.tradeoffs,
                    confidence: s.candidate.confidence(),
                }
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            scenario = %request.scenario.label(),
            profile = %request.profile,
            returned = results.len(),
            "ranked candidates"
        );

        Ok(Recommendation {
            results,
            rejected: outcome.rejected,
            reference_pool,
            error: None,
        })
    }
}

fn validate(candidates: &[CandidateModel], request: &RecommendationRequest) -> Result<()> {
    if candidates.is_empty() {
        return Err(AdvisorError::InvalidRequest(
            "candidate list must not be empty".into(),
        ));
    }
    if request.scenario.category.trim().is_empty() {
        return Err(AdvisorError::InvalidRequest(
            "scenario category is required".into(),
        ));
    }
    if request.top_k == Some(0) {
        return Err(AdvisorError::InvalidRequest("top_k must be at least 1".into()));
    }
    Ok(())
}
