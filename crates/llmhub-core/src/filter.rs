use serde::{Deserialize, Serialize};

use crate::model::CandidateModel;
use crate::provider::Region;

/// Why a candidate was removed before scoring. The serialized codes are shared
/// by the full engine and the simplified evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    IncompleteData,
    RegionUnavailable,
    ContextWindowTooSmall,
    MissingToolSupport,
    MissingJsonSchemaSupport,
    MissingMultimodalSupport,
    LatencyAboveTarget,
    CostAboveLimit,
}

impl RejectionReason {
    pub fn code(self) -> &'static str {
        match self {
            Self::IncompleteData => "incomplete_data",
            Self::RegionUnavailable => "region_unavailable",
            Self::ContextWindowTooSmall => "context_window_too_small",
            Self::MissingToolSupport => "missing_tool_support",
            Self::MissingJsonSchemaSupport => "missing_json_schema_support",
            Self::MissingMultimodalSupport => "missing_multimodal_support",
            Self::LatencyAboveTarget => "latency_above_target",
            Self::CostAboveLimit => "cost_above_limit",
        }
    }
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    pub name: String,
    pub reasons: Vec<RejectionReason>,
}

/// Pass/fail deployment constraints ("advanced filters").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HardFilters {
    pub min_context_window: Option<u64>,
    pub require_tools: bool,
    pub require_structured_output: bool,
    pub require_multimodal: bool,
    /// Upper bound on time to first token, seconds.
    pub max_ttft_seconds: Option<f64>,
    /// Upper bound on blended USD per 1M tokens.
    pub max_price_per_m: Option<f64>,
}

/// Every constraint `candidate` violates, in a fixed order. A limit on a value
/// the snapshot does not carry counts as violated.
pub fn rejection_reasons(
    candidate: &CandidateModel,
    region: Region,
    filters: &HardFilters,
) -> Vec<RejectionReason> {
    let mut reasons = Vec::new();

    if !candidate.is_complete() {
        reasons.push(RejectionReason::IncompleteData);
    }
    if !region.admits(candidate.is_cn()) {
        reasons.push(RejectionReason::RegionUnavailable);
    }
    if let Some(min) = filters.min_context_window {
        if candidate.context_window().unwrap_or(0) < min {
            reasons.push(RejectionReason::ContextWindowTooSmall);
        }
    }
    if filters.require_tools && !candidate.has_tools() {
        reasons.push(RejectionReason::MissingToolSupport);
    }
    if filters.require_structured_output && !candidate.has_structured_output() {
        reasons.push(RejectionReason::MissingJsonSchemaSupport);
    }
    if filters.require_multimodal && !candidate.has_multimodal() {
        reasons.push(RejectionReason::MissingMultimodalSupport);
    }
    if let Some(max) = filters.max_ttft_seconds {
        if candidate.ttft_seconds.map_or(true, |t| t > max) {
            reasons.push(RejectionReason::LatencyAboveTarget);
        }
    }
    if let Some(max) = filters.max_price_per_m {
        if candidate.blended_price().map_or(true, |p| p > max) {
            reasons.push(RejectionReason::CostAboveLimit);
        }
    }

    reasons
}

#[derive(Debug, Default)]
pub struct FilterOutcome<'a> {
    pub accepted: Vec<&'a CandidateModel>,
    pub rejected: Vec<Rejection>,
}

/// Split candidates into those that satisfy every hard constraint and the
/// rejected ones with their reasons. An empty `accepted` is a valid outcome.
pub fn filter_candidates<'a>(
    candidates: &'a [CandidateModel],
    region: Region,
    filters: &HardFilters,
) -> FilterOutcome<'a> {
    let mut out = FilterOutcome::default();
    for c in candidates {
        let reasons = rejection_reasons(c, region, filters);
        if reasons.is_empty() {
            out.accepted.push(c);
        } else {
            out.rejected.push(Rejection {
                name: c.slug.clone(),
                reasons,
            });
        }
    }
    tracing::debug!(
        accepted = out.accepted.len(),
        rejected = out.rejected.len(),
        "filtered candidates"
    );
    out
}

/// Candidates with complete data, ignoring every scenario-specific filter.
pub fn completeness_baseline(candidates: &[CandidateModel]) -> Vec<&CandidateModel> {
    candidates.iter().filter(|c| c.is_complete()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete(slug: &str) -> CandidateModel {
        CandidateModel {
            slug: slug.into(),
            intelligence_index: Some(40.0),
            has_benchmarks: true,
            has_routing: true,
            context_length: Some(128_000),
            ttft_seconds: Some(0.8),
            price_blended_usd: Some(2.0),
            ..Default::default()
        }
    }

    #[test]
    fn complete_candidate_passes_empty_filters() {
        let c = complete("a");
        assert!(rejection_reasons(&c, Region::Global, &HardFilters::default()).is_empty());
    }

    #[test]
    fn incomplete_sources_rejected() {
        let mut c = complete("a");
        c.has_routing = false;
        assert_eq!(
            rejection_reasons(&c, Region::Global, &HardFilters::default()),
            vec![RejectionReason::IncompleteData]
        );
        let mut c = complete("b");
        c.intelligence_index = None;
        assert!(!rejection_reasons(&c, Region::Global, &HardFilters::default()).is_empty());
    }

    #[test]
    fn region_policy_applies() {
        let mut c = complete("a");
        c.is_cn_provider = Some(false);
        assert_eq!(
            rejection_reasons(&c, Region::Cn, &HardFilters::default()),
            vec![RejectionReason::RegionUnavailable]
        );
        c.is_cn_provider = None;
        c.creator = Some("DeepSeek".into());
        assert!(rejection_reasons(&c, Region::Cn, &HardFilters::default()).is_empty());
    }

    #[test]
    fn collects_all_reasons() {
        let mut c = complete("a");
        c.supports_tools = Some(false);
        c.ttft_seconds = None;
        let filters = HardFilters {
            min_context_window: Some(200_000),
            require_tools: true,
            max_ttft_seconds: Some(1.0),
            max_price_per_m: Some(1.0),
            ..Default::default()
        };
        assert_eq!(
            rejection_reasons(&c, Region::Global, &filters),
            vec![
                RejectionReason::ContextWindowTooSmall,
                RejectionReason::MissingToolSupport,
                RejectionReason::LatencyAboveTarget,
                RejectionReason::CostAboveLimit,
            ]
        );
    }

    #[test]
    fn filter_splits_and_keeps_order() {
        let mut no_tools = complete("b");
        no_tools.supports_tools = Some(false);
        let all = vec![complete("a"), no_tools, complete("c")];
        let filters = HardFilters {
            require_tools: true,
            ..Default::default()
        };
        let out = filter_candidates(&all, Region::Global, &filters);
        let slugs: Vec<_> = out.accepted.iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(slugs, vec!["a", "c"]);
        assert_eq!(out.rejected.len(), 1);
        assert_eq!(out.rejected[0].name, "b");
        assert_eq!(out.rejected[0].reasons[0].code(), "missing_tool_support");
    }

    #[test]
    fn reason_codes_serialize_snake_case() {
        let json = serde_json::to_string(&RejectionReason::MissingJsonSchemaSupport).unwrap();
        assert_eq!(json, "\"missing_json_schema_support\"");
    }
}
