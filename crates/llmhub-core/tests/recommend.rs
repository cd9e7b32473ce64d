use llmhub_core::engine::{RecommendationRequest, Recommender};
use llmhub_core::filter::{HardFilters, RejectionReason};
use llmhub_core::model::CandidateModel;
use llmhub_core::profile::{OptimizationProfile, SpeedPreference};
use llmhub_core::provider::Region;
use llmhub_core::reference::PoolTier;
use llmhub_core::scenario::Scenario;
use llmhub_core::snapshot::{latest_per_slug, load_bundled_snapshots};

fn make_model(slug: &str, intel: f64, coding: f64, price: f64) -> CandidateModel {
    CandidateModel {
        slug: slug.to_string(),
        name: slug.to_string(),
        creator: Some("Test Lab".to_string()),
        is_cn_provider: Some(false),
        intelligence_index: Some(intel),
        coding_index: Some(coding),
        ifbench: Some(0.5),
        ttft_seconds: Some(0.8),
        tokens_per_second: Some(80.0),
        price_blended_usd: Some(price),
        context_length: Some(128_000),
        has_benchmarks: true,
        has_routing: true,
        ..Default::default()
    }
}

/// A spread-out population so medians and MADs are non-degenerate.
fn background() -> Vec<CandidateModel> {
    (0..12)
        .map(|i| {
            let x = f64::from(i);
            let mut m = make_model(&format!("bg-{i:02}"), 25.0 + 3.5 * x, 20.0 + 3.0 * x, 0.3 + 0.9 * x);
            m.ttft_seconds = Some(0.3 + 0.15 * x);
            m.tokens_per_second = Some(30.0 + 12.0 * x);
            m
        })
        .collect()
}

fn request(category: &str, subs: &[&str]) -> RecommendationRequest {
    RecommendationRequest {
        scenario: Scenario::new(category, subs),
        top_k: Some(50),
        ..Default::default()
    }
}

fn position(out: &llmhub_core::Recommendation, slug: &str) -> Option<usize> {
    out.results.iter().position(|r| r.candidate.slug == slug)
}

fn sample() -> Vec<CandidateModel> {
    let rows = load_bundled_snapshots().expect("bundled sample");
    latest_per_slug(&rows).into_iter().cloned().collect()
}

#[test]
fn better_coder_at_lower_cost_ranks_higher() {
    let mut models = background();
    models.push(make_model("x", 45.0, 55.0, 1.0));
    models.push(make_model("y", 45.0, 30.0, 8.0));

    let r = Recommender::bundled().unwrap();
    let out = r.recommend(&models, &request("code", &["generation"])).unwrap();
    let x = position(&out, "x").expect("x ranked");
    let y = position(&out, "y").expect("y ranked");
    assert!(x < y, "x at {x}, y at {y}");
    let (sx, sy) = (&out.results[x].scores, &out.results[y].scores);
    assert!(sx.quality > sy.quality);
    assert!(sx.cost > sy.cost);
}

#[test]
fn tool_requirement_rejects_without_ranking() {
    let mut models = background();
    let mut no_tools = make_model("no-tools", 60.0, 60.0, 0.5);
    no_tools.supports_tools = Some(false);
    models.push(no_tools);

    let mut req = request("agent", &["tool_use"]);
    req.filters = HardFilters {
        require_tools: true,
        ..Default::default()
    };
    let out = Recommender::bundled().unwrap().recommend(&models, &req).unwrap();

    assert!(position(&out, "no-tools").is_none());
    let rejection = out
        .rejected
        .iter()
        .find(|r| r.name == "no-tools")
        .expect("rejected entry");
    assert_eq!(rejection.reasons, vec![RejectionReason::MissingToolSupport]);
    assert_eq!(out.results.len(), 12);
}

#[test]
fn nothing_feasible_is_a_signal_not_an_error() {
    let models = background();
    let mut req = request("rag", &["long_doc"]);
    req.filters.min_context_window = Some(10_000_000);

    let out = Recommender::bundled().unwrap().recommend(&models, &req).unwrap();
    assert!(out.results.is_empty());
    assert!(out.no_feasible_candidates());
    assert_eq!(out.error.as_deref(), Some("no_feasible_candidates"));
    assert_eq!(out.rejected.len(), models.len());
    assert!(out
        .rejected
        .iter()
        .all(|r| r.reasons.contains(&RejectionReason::ContextWindowTooSmall)));
    assert_eq!(out.reference_pool.size, models.len());
}

#[test]
fn cheapest_profile_prefers_cheap_when_cost_gap_dominates() {
    let mut models = background();
    models.push(make_model("cheap-weak", 28.0, 22.0, 0.2));
    models.push(make_model("pricey-strong", 68.0, 60.0, 30.0));

    let mut req = request("chat", &["general"]);
    req.profile = OptimizationProfile::Cheapest;
    let out = Recommender::bundled().unwrap().recommend(&models, &req).unwrap();
    let cheap = position(&out, "cheap-weak").unwrap();
    let pricey = position(&out, "pricey-strong").unwrap();
    assert!(cheap < pricey);

    req.profile = OptimizationProfile::BestQuality;
    let out = Recommender::bundled().unwrap().recommend(&models, &req).unwrap();
    assert!(position(&out, "pricey-strong").unwrap() < position(&out, "cheap-weak").unwrap());
}

#[test]
fn repeated_calls_are_identical() {
    let models = sample();
    let mut req = request("code", &["debugging", "testing"]);
    req.speed = SpeedPreference::LowLatency;
    let r = Recommender::bundled().unwrap();
    let a = serde_json::to_value(r.recommend(&models, &req).unwrap()).unwrap();
    let b = serde_json::to_value(r.recommend(&models, &req).unwrap()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn every_score_is_bounded() {
    let models = sample();
    let r = Recommender::bundled().unwrap();
    let table = r.resolver().table().clone();
    for (category, subs) in table.catalog() {
        for profile in OptimizationProfile::ALL {
            let mut req = request(category, &subs[..1]);
            req.profile = profile;
            let out = r.recommend(&models, &req).unwrap();
            for res in &out.results {
                let s = res.scores;
                for v in [s.quality, s.cost, s.latency, s.throughput, s.total] {
                    assert!((0.0..=100.0).contains(&v), "{category} {profile}: {v}");
                }
            }
        }
    }
}

#[test]
fn default_top_k_is_four_and_larger_k_returns_all_feasible() {
    let models = sample();
    let r = Recommender::bundled().unwrap();
    let mut req = request("chat", &[]);
    req.top_k = None;
    assert_eq!(r.recommend(&models, &req).unwrap().results.len(), 4);

    let few: Vec<_> = background().into_iter().take(3).collect();
    req.top_k = Some(10);
    let out = r.recommend(&few, &req).unwrap();
    assert_eq!(out.results.len(), 3);
    let ranks: Vec<_> = out.results.iter().map(|r| r.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3]);
}

#[test]
fn single_candidate_pool_is_neutral() {
    let models = vec![make_model("solo", 40.0, 40.0, 2.0)];
    let out = Recommender::bundled()
        .unwrap()
        .recommend(&models, &request("code", &["generation"]))
        .unwrap();
    assert_eq!(out.reference_pool.size, 1);
    assert_eq!(out.reference_pool.tier, PoolTier::Supplied);
    assert_eq!(out.results[0].scores.total, 50.0);
    assert!(!out.results[0].explanations.is_empty());
    assert_eq!(out.results[0].tradeoffs.len(), 1);
}

#[test]
fn sample_pool_is_calibrated_on_baseline_or_recent() {
    let models = sample();
    let out = Recommender::bundled()
        .unwrap()
        .recommend(&models, &request("agent", &["tool_use"]))
        .unwrap();
    assert_ne!(out.reference_pool.tier, PoolTier::Supplied);
    assert!(out.reference_pool.size >= 30);
}

#[test]
fn cn_region_keeps_domestic_vendors_only() {
    let models = sample();
    let mut req = request("code", &["generation"]);
    req.region = Region::Cn;
    req.top_k = Some(50);
    let out = Recommender::bundled().unwrap().recommend(&models, &req).unwrap();
    assert!(!out.results.is_empty());
    assert!(out.results.iter().all(|r| r.candidate.is_cn()));
    assert!(out.results[0]
        .explanations
        .iter()
        .any(|e| e.contains("mainland China")));
    assert!(out
        .rejected
        .iter()
        .any(|r| r.reasons.contains(&RejectionReason::RegionUnavailable)));
}

#[test]
fn scores_are_rounded_to_one_decimal() {
    let models = sample();
    let out = Recommender::bundled()
        .unwrap()
        .recommend(&models, &request("math", &["aime"]))
        .unwrap();
    for res in &out.results {
        let t = res.scores.total * 10.0;
        assert!((t - t.round()).abs() < 1e-6);
    }
}
