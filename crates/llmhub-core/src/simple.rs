//! The simplified evaluator behind the HTTP surface.
//!
//! Candidates arrive pre-shaped on 0–10 scales. Hard constraints reject, cost
//! and latency are min-max normalized within the feasible set, and a weighted
//! sum over five dimensions ranks the rest. When a request carries no
//! candidates, snapshot records can be shaped into candidates first.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::engine::NO_FEASIBLE_CANDIDATES;
use crate::error::{AdvisorError, Result};
use crate::filter::{Rejection, RejectionReason};
use crate::model::{CandidateModel, Direction, Metric};
use crate::normalize::{MinMax, Normalizer};
use crate::pricing::blended_per_1k;
use crate::provider::Region;
use crate::snapshot::latest_per_slug;

const SCALE_MAX: f64 = 10.0;
/// Added to the latency score of candidates that meet the latency target.
const LATENCY_TARGET_BONUS: f64 = 0.5;
const DEFAULT_OUTPUT_TOKENS: f64 = 500.0;
const DEFAULT_TTFT_MS: f64 = 900.0;
const DEFAULT_DECODE_MS: f64 = 1200.0;
const DEFAULT_QUALITY: f64 = 5.5;
const DEFAULT_RELIABILITY: f64 = 6.5;

/// Workload description and hard limits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimpleScenario {
    pub input_tokens_p50: Option<f64>,
    pub output_tokens_p50: Option<f64>,
    pub context_window_min_tokens: Option<u64>,
    pub must_support_tools: bool,
    pub must_support_json_schema: bool,
    pub must_support_multimodal: bool,
    pub p95_latency_ms_target: Option<f64>,
    pub max_cost_per_1k_tokens_usd: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimplePricing {
    pub input_per_1k_usd: f64,
    pub output_per_1k_usd: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimpleLimits {
    pub context_window_tokens: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimpleCapabilities {
    pub tools: bool,
    pub json_schema: bool,
    pub multimodal: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimplePerformance {
    pub quality_0_10: Option<f64>,
    pub reliability_0_10: Option<f64>,
    pub p95_latency_ms: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimpleCandidate {
    pub name: String,
    pub provider: String,
    pub pricing: SimplePricing,
    pub limits: SimpleLimits,
    pub capabilities: SimpleCapabilities,
    pub performance: SimplePerformance,
    pub integration_fit_0_10: Option<f64>,
}

/// Caller-supplied relative weights; missing dimensions count as 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawWeights {
    pub quality: Option<f64>,
    pub cost: Option<f64>,
    pub latency: Option<f64>,
    pub reliability: Option<f64>,
    pub integration_fit: Option<f64>,
}

/// Five-dimension weights summing to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimpleWeights {
    pub quality: f64,
    pub cost: f64,
    pub latency: f64,
    pub reliability: f64,
    pub integration_fit: f64,
}

impl Default for SimpleWeights {
    fn default() -> Self {
        Self {
            quality: 0.35,
            cost: 0.2,
            latency: 0.2,
            reliability: 0.15,
            integration_fit: 0.1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimplePayload {
    #[serde(default, deserialize_with = "object_or_default")]
    pub scenario: SimpleScenario,
    #[serde(default)]
    pub weights: Option<RawWeights>,
    /// Anything but an array means "none supplied".
    #[serde(default, deserialize_with = "array_or_empty")]
    pub candidates: Vec<SimpleCandidate>,
    /// Only consulted when shaping snapshot records.
    #[serde(default)]
    pub region_preference: Option<Region>,
}

/// A non-object `scenario` (e.g. a bare category string) carries no limits.
fn object_or_default<'de, D>(de: D) -> std::result::Result<SimpleScenario, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(de)? {
        v @ Value::Object(_) => serde_json::from_value(v).map_err(serde::de::Error::custom),
        _ => Ok(SimpleScenario::default()),
    }
}

fn array_or_empty<'de, D>(de: D) -> std::result::Result<Vec<SimpleCandidate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(de)? {
        v @ Value::Array(_) => serde_json::from_value(v).map_err(serde::de::Error::custom),
        _ => Ok(Vec::new()),
    }
}

impl SimplePayload {
    /// Accept only a JSON object.
    pub fn from_value(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(AdvisorError::InvalidRequest(
                "Payload must be a JSON object.".into(),
            ));
        }
        Ok(serde_json::from_value(value)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimpleDimensionScores {
    pub quality: f64,
    pub cost: f64,
    pub latency: f64,
    pub reliability: f64,
    pub integration_fit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub name: String,
    pub provider: String,
    pub weighted_score_0_10: f64,
    pub dimension_scores_0_10: SimpleDimensionScores,
    pub estimated_cost_per_1k_usd: f64,
}

/// Where shaped candidates came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    pub source: String,
    pub snapshot_date: Option<NaiveDate>,
    pub total_rows: usize,
    pub filtered_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleResponse {
    pub weights_normalized: SimpleWeights,
    pub ranking: Vec<RankedCandidate>,
    pub rejected: Vec<Rejection>,
    pub assumptions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceMetadata>,
}

impl SimpleResponse {
    pub fn no_feasible_candidates(&self) -> bool {
        self.error.as_deref() == Some(NO_FEASIBLE_CANDIDATES)
    }
}

fn finite_or_zero(v: Option<f64>) -> f64 {
    v.filter(|v| v.is_finite()).unwrap_or(0.0)
}

fn clamp_0_10(v: f64) -> f64 {
    if v.is_finite() {
        v.clamp(0.0, SCALE_MAX)
    } else {
        0.0
    }
}

fn round_to(v: f64, decimals: i32) -> f64 {
    let f = 10f64.powi(decimals);
    (v * f).round() / f
}

/// Rescale to sum 1. Absent, or summing to zero or less, means the defaults.
pub fn normalize_weights(raw: Option<&RawWeights>) -> SimpleWeights {
    let Some(raw) = raw else {
        return SimpleWeights::default();
    };
    let w = [
        finite_or_zero(raw.quality),
        finite_or_zero(raw.cost),
        finite_or_zero(raw.latency),
        finite_or_zero(raw.reliability),
        finite_or_zero(raw.integration_fit),
    ];
    let total: f64 = w.iter().sum();
    if total <= 0.0 {
        return SimpleWeights::default();
    }
    SimpleWeights {
        quality: w[0] / total,
        cost: w[1] / total,
        latency: w[2] / total,
        reliability: w[3] / total,
        integration_fit: w[4] / total,
    }
}

/// Expected USD per 1K tokens for the scenario's token mix.
pub fn estimated_cost_per_1k(pricing: &SimplePricing, scenario: &SimpleScenario) -> f64 {
    blended_per_1k(
        pricing.input_per_1k_usd,
        pricing.output_per_1k_usd,
        finite_or_zero(scenario.input_tokens_p50),
        finite_or_zero(scenario.output_tokens_p50),
    )
}

/// Constraint violations, in a fixed order. Missing latency fails any target.
pub fn hard_rejection_reasons(c: &SimpleCandidate, scenario: &SimpleScenario) -> Vec<RejectionReason> {
    let mut reasons = Vec::new();
    if let Some(min) = scenario.context_window_min_tokens {
        if c.limits.context_window_tokens.unwrap_or(0) < min {
            reasons.push(RejectionReason::ContextWindowTooSmall);
        }
    }
    if scenario.must_support_tools && !c.capabilities.tools {
        reasons.push(RejectionReason::MissingToolSupport);
    }
    if scenario.must_support_json_schema && !c.capabilities.json_schema {
        reasons.push(RejectionReason::MissingJsonSchemaSupport);
    }
    if scenario.must_support_multimodal && !c.capabilities.multimodal {
        reasons.push(RejectionReason::MissingMultimodalSupport);
    }
    if let Some(target) = scenario.p95_latency_ms_target {
        if c.performance.p95_latency_ms.unwrap_or(f64::INFINITY) > target {
            reasons.push(RejectionReason::LatencyAboveTarget);
        }
    }
    if let Some(max) = scenario.max_cost_per_1k_tokens_usd {
        if estimated_cost_per_1k(&c.pricing, scenario) > max {
            reasons.push(RejectionReason::CostAboveLimit);
        }
    }
    reasons
}

struct Feasible<'a> {
    candidate: &'a SimpleCandidate,
    cost: f64,
    latency_ms: f64,
}

/// Score and rank a payload.
pub fn evaluate(payload: &SimplePayload) -> Result<SimpleResponse> {
    let scenario = &payload.scenario;
    let weights = normalize_weights(payload.weights.as_ref());

    if payload.candidates.is_empty() {
        return Err(AdvisorError::InvalidRequest(
            "Payload must include non-empty 'candidates'.".into(),
        ));
    }

    let mut assumptions = Vec::new();
    if scenario.output_tokens_p50.is_none() {
        assumptions.push(
            "output token estimate defaults to input-token-weighted pricing behavior.".to_string(),
        );
    }

    let mut rejected = Vec::new();
    let mut feasible = Vec::new();
    for c in &payload.candidates {
        if c.name.is_empty() {
            return Err(AdvisorError::InvalidRequest(
                "Each candidate must include non-empty 'name'.".into(),
            ));
        }
        let reasons = hard_rejection_reasons(c, scenario);
        if !reasons.is_empty() {
            rejected.push(Rejection {
                name: c.name.clone(),
                reasons,
            });
            continue;
        }
        feasible.push(Feasible {
            candidate: c,
            cost: estimated_cost_per_1k(&c.pricing, scenario),
            latency_ms: c.performance.p95_latency_ms.unwrap_or(f64::INFINITY),
        });
    }

    if feasible.is_empty() {
        tracing::warn!(rejected = rejected.len(), "no feasible candidates");
        return Ok(SimpleResponse {
            weights_normalized: weights,
            ranking: Vec::new(),
            rejected,
            assumptions,
            error: Some(NO_FEASIBLE_CANDIDATES.to_string()),
            source: None,
        });
    }

    let min_max = MinMax { ceiling: SCALE_MAX };
    let costs: Vec<f64> = feasible.iter().map(|f| f.cost).collect();
    let latencies: Vec<f64> = feasible.iter().map(|f| f.latency_ms).collect();
    let cost_scale = min_max.fit(Metric::Cost, &costs);
    let latency_scale = min_max.fit(Metric::Latency, &latencies);

    let mut ranking: Vec<RankedCandidate> = feasible
        .iter()
        .map(|f| {
            let perf = &f.candidate.performance;
            let mut latency = latency_scale.score(f.latency_ms, Direction::LowerBetter);
            if scenario.p95_latency_ms_target.is_some_and(|t| f.latency_ms <= t) {
                latency = (latency + LATENCY_TARGET_BONUS).min(SCALE_MAX);
            }
            let dims = SimpleDimensionScores {
                quality: round_to(clamp_0_10(finite_or_zero(perf.quality_0_10)), 4),
                cost: round_to(clamp_0_10(cost_scale.score(f.cost, Direction::LowerBetter)), 4),
                latency: round_to(clamp_0_10(latency), 4),
                reliability: round_to(clamp_0_10(finite_or_zero(perf.reliability_0_10)), 4),
                integration_fit: round_to(
                    clamp_0_10(finite_or_zero(f.candidate.integration_fit_0_10)),
                    4,
                ),
            };
            let total = dims.quality * weights.quality
                + dims.cost * weights.cost
                + dims.latency * weights.latency
                + dims.reliability * weights.reliability
                + dims.integration_fit * weights.integration_fit;
            RankedCandidate {
                name: f.candidate.name.clone(),
                provider: f.candidate.provider.clone(),
                weighted_score_0_10: round_to(total, 4),
                dimension_scores_0_10: dims,
                estimated_cost_per_1k_usd: round_to(f.cost, 6),
            }
        })
        .collect();

    ranking.sort_by(|a, b| {
        b.weighted_score_0_10
            .total_cmp(&a.weighted_score_0_10)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.provider.cmp(&b.provider))
    });

    Ok(SimpleResponse {
        weights_normalized: weights,
        ranking,
        rejected,
        assumptions,
        error: None,
        source: None,
    })
}

// ── snapshot shaping ─────────────────────────────────────────────────────

/// Candidates shaped from snapshot records, plus what was assumed doing so.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapedCandidates {
    pub candidates: Vec<SimpleCandidate>,
    pub assumptions: Vec<String>,
    pub metadata: SourceMetadata,
}

/// Benchmark value on 0–10: as-is up to 10, percent-like up to 100, else 10.
fn to_0_10(v: Option<f64>) -> Option<f64> {
    let v = v.filter(|v| v.is_finite())?;
    Some(if v <= 10.0 {
        v.max(0.0)
    } else if v <= 100.0 {
        (v / 10.0).min(SCALE_MAX)
    } else {
        SCALE_MAX
    })
}

fn mean_0_10(values: &[Option<f64>], default: f64) -> f64 {
    let present: Vec<f64> = values.iter().filter_map(|v| to_0_10(*v)).collect();
    if present.is_empty() {
        return default;
    }
    round_to(present.iter().sum::<f64>() / present.len() as f64, 4)
}

/// TTFT plus decode time for the expected output length, in ms.
fn estimate_latency_ms(row: &CandidateModel, output_tokens: Option<f64>) -> f64 {
    let out = output_tokens
        .filter(|v| v.is_finite())
        .unwrap_or(DEFAULT_OUTPUT_TOKENS)
        .max(1.0);
    let ttft_ms = row
        .ttft_seconds
        .filter(|v| v.is_finite())
        .map_or(DEFAULT_TTFT_MS, |s| s * 1000.0);
    let decode_ms = match row.tokens_per_second {
        Some(tps) if tps.is_finite() && tps > 0.0 => out / tps * 1000.0,
        _ => DEFAULT_DECODE_MS,
    };
    (ttft_ms + decode_ms).round()
}

fn passes_light_filters(row: &CandidateModel, payload: &SimplePayload) -> bool {
    if !row.has_benchmarks {
        return false;
    }
    if row
        .modality
        .as_deref()
        .is_some_and(|m| !m.eq_ignore_ascii_case("llm"))
    {
        return false;
    }
    if let Some(region) = payload.region_preference {
        if !region.admits(row.is_cn()) {
            return false;
        }
    }
    let scenario = &payload.scenario;
    if scenario.must_support_multimodal {
        return false;
    }
    if let Some(min) = scenario.context_window_min_tokens {
        if row.context_window().unwrap_or(0) < min {
            return false;
        }
    }
    true
}

fn to_candidate(row: &CandidateModel, scenario: &SimpleScenario) -> SimpleCandidate {
    let per_1k = |per_1m: Option<f64>| round_to(finite_or_zero(per_1m) / 1000.0, 8);
    SimpleCandidate {
        name: row.slug.clone(),
        provider: row.creator.clone().unwrap_or_default(),
        pricing: SimplePricing {
            input_per_1k_usd: per_1k(row.price_input_usd),
            output_per_1k_usd: per_1k(row.price_output_usd),
        },
        limits: SimpleLimits {
            context_window_tokens: Some(row.context_window().unwrap_or(0)),
        },
        capabilities: SimpleCapabilities {
            tools: row.has_tools(),
            json_schema: row.has_structured_output(),
            multimodal: row.has_multimodal(),
        },
        performance: SimplePerformance {
            quality_0_10: Some(mean_0_10(
                &[row.intelligence_index, row.coding_index, row.gpqa],
                DEFAULT_QUALITY,
            )),
            reliability_0_10: Some(mean_0_10(
                &[row.ifbench, row.lcr, row.tau2, row.hle],
                DEFAULT_RELIABILITY,
            )),
            p95_latency_ms: Some(estimate_latency_ms(row, scenario.output_tokens_p50)),
        },
        integration_fit_0_10: Some(if row.has_routing { 8.0 } else { 6.8 }),
    }
}

/// Turn snapshot records into simplified candidates for `payload`.
pub fn shape_snapshots(rows: &[CandidateModel], payload: &SimplePayload, source: &str) -> ShapedCandidates {
    let latest = latest_per_slug(rows);
    let filtered: Vec<&CandidateModel> = latest
        .into_iter()
        .filter(|r| passes_light_filters(r, payload))
        .collect();
    let candidates = filtered
        .iter()
        .map(|r| to_candidate(r, &payload.scenario))
        .collect();

    tracing::debug!(total = rows.len(), filtered = filtered.len(), "shaped snapshot rows");

    ShapedCandidates {
        candidates,
        assumptions: vec![
            "Capabilities are inferred from snapshot fields; validate tools/json-schema support for final procurement.".into(),
            "Latency is estimated from ttft+tps and expected output tokens.".into(),
        ],
        metadata: SourceMetadata {
            source: source.to_string(),
            snapshot_date: rows.iter().filter_map(|r| r.record_date).max(),
            total_rows: rows.len(),
            filtered_rows: filtered.len(),
        },
    }
}

/// Evaluate `payload`, shaping candidates from `rows` when it carries none.
/// Shaping assumptions and source metadata are attached to the response.
pub fn evaluate_with_snapshots(
    mut payload: SimplePayload,
    rows: &[CandidateModel],
    source: &str,
) -> Result<SimpleResponse> {
    if !payload.candidates.is_empty() {
        return evaluate(&payload);
    }
    let shaped = shape_snapshots(rows, &payload, source);
    payload.candidates = shaped.candidates;
    let mut response = evaluate(&payload)?;
    response.assumptions.extend(shaped.assumptions);
    response.source = Some(shaped.metadata);
    Ok(response)
}
