use serde::Serialize;
use wasm_bindgen::prelude::*;

use llmhub_core::engine::{RecommendationRequest, Recommender};
use llmhub_core::model::CandidateModel;
use llmhub_core::pricing;
use llmhub_core::profile::OptimizationProfile;
use llmhub_core::scenario::ScenarioWeightResolver;
use llmhub_core::simple::{self, SimplePayload};
use llmhub_core::snapshot;

fn to_js<T: Serialize>(value: &T) -> JsValue {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .unwrap_or(JsValue::NULL)
}

fn js_error(e: impl std::fmt::Display) -> JsError {
    JsError::new(&e.to_string())
}

// ---------------------------------------------------------------------------
// Recommendation
// ---------------------------------------------------------------------------

/// Rank `candidates` (snapshot records) for `request` with the bundled
/// scenario weights. Throws on an invalid request.
#[wasm_bindgen]
pub fn recommend(candidates: JsValue, request: JsValue) -> Result<JsValue, JsError> {
    let candidates: Vec<CandidateModel> =
        serde_wasm_bindgen::from_value(candidates).map_err(js_error)?;
    let request: RecommendationRequest =
        serde_wasm_bindgen::from_value(request).map_err(js_error)?;
    let out = Recommender::bundled()
        .and_then(|r| r.recommend(&candidates, &request))
        .map_err(js_error)?;
    Ok(to_js(&out))
}

/// Same as `recommend`, over the sample snapshot compiled into the module.
#[wasm_bindgen]
pub fn recommend_sample(request: JsValue) -> Result<JsValue, JsError> {
    let rows = snapshot::load_bundled_snapshots().map_err(js_error)?;
    let latest: Vec<CandidateModel> = snapshot::latest_per_slug(&rows).into_iter().cloned().collect();
    let request: RecommendationRequest =
        serde_wasm_bindgen::from_value(request).map_err(js_error)?;
    let out = Recommender::bundled()
        .and_then(|r| r.recommend(&latest, &request))
        .map_err(js_error)?;
    Ok(to_js(&out))
}

// ---------------------------------------------------------------------------
// Simplified 0-10 evaluator
// ---------------------------------------------------------------------------

/// Score a simplified payload. Without candidates, the bundled sample
/// snapshot is shaped into candidates.
#[wasm_bindgen]
pub fn evaluate(payload: JsValue) -> Result<JsValue, JsError> {
    let value: serde_json::Value = serde_wasm_bindgen::from_value(payload).map_err(js_error)?;
    let payload = SimplePayload::from_value(value).map_err(js_error)?;
    let rows = if payload.candidates.is_empty() {
        snapshot::load_bundled_snapshots().map_err(js_error)?
    } else {
        Vec::new()
    };
    let out = simple::evaluate_with_snapshots(payload, &rows, "bundled").map_err(js_error)?;
    Ok(to_js(&out))
}

// ---------------------------------------------------------------------------
// Catalogue
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct CategoryJs<'a> {
    category: &'a str,
    sub_categories: Vec<&'a str>,
}

/// Scenario categories with their sub-categories, or null.
#[wasm_bindgen]
pub fn scenario_catalog() -> JsValue {
    let resolver = match ScenarioWeightResolver::bundled() {
        Ok(r) => r,
        Err(_) => return JsValue::NULL,
    };
    let catalog: Vec<CategoryJs> = resolver
        .table()
        .catalog()
        .map(|(category, sub_categories)| CategoryJs {
            category,
            sub_categories,
        })
        .collect();
    to_js(&catalog)
}

#[derive(Serialize)]
struct ProfileJs {
    name: String,
    quality: f64,
    cost: f64,
    latency: f64,
    throughput: f64,
}

/// Optimization profiles and their dimension weights.
#[wasm_bindgen]
pub fn profiles() -> JsValue {
    let list: Vec<ProfileJs> = OptimizationProfile::ALL
        .iter()
        .map(|p| {
            let w = p.weights();
            ProfileJs {
                name: p.to_string(),
                quality: w.quality,
                cost: w.cost,
                latency: w.latency,
                throughput: w.throughput,
            }
        })
        .collect();
    to_js(&list)
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// "$1.000 (≈¥7.25)"
#[wasm_bindgen]
pub fn fmt_usd_cny(usd: f64, usd_to_cny: f64) -> String {
    pricing::fmt_usd_cny(usd, usd_to_cny)
}

/// Token count as "128K", "1M", etc.
#[wasm_bindgen]
pub fn fmt_context(tokens: f64) -> String {
    CandidateModel::fmt_context(tokens.max(0.0) as u64)
}
