use chrono::NaiveDate;
use llmhub_core::model::{CandidateModel, Confidence, QualityMetric};
use serde_json::json;

fn parse(v: serde_json::Value) -> CandidateModel {
    serde_json::from_value(v).expect("should parse")
}

#[test]
fn parse_store_row() {
    let m = parse(json!({
        "aa_slug": "deepseek-v3-2",
        "aa_name": "DeepSeek V3.2",
        "aa_model_creator_name": "DeepSeek",
        "aa_modality": "llm",
        "aa_intelligence_index": 65.9,
        "aa_coding_index": 52.8,
        "aa_tau2": 0.91,
        "aa_ttft_seconds": 1.12,
        "aa_tps": 32.0,
        "aa_price_input_usd": 0.28,
        "aa_price_output_usd": 0.42,
        "aa_context_length": 128000,
        "or_context_length": 163840,
        "or_architecture_input_modalities": ["text"],
        "aa_release_date": "2025-12-01",
        "record_date": "2026-02-10T06:00:00+00:00",
        "has_aa": true,
        "has_or": true,
        "match_confidence": "medium",
        "some_future_column": 1
    }));

    assert_eq!(m.slug, "deepseek-v3-2");
    assert_eq!(m.display_name(), "DeepSeek V3.2");
    assert_eq!(m.quality(QualityMetric::Tau2), Some(0.91));
    assert_eq!(m.context_window(), Some(163840));
    assert_eq!(m.release_date, NaiveDate::from_ymd_opt(2025, 12, 1));
    assert_eq!(m.record_date, NaiveDate::from_ymd_opt(2026, 2, 10));
    assert!(m.is_complete());
    assert!(m.is_cn());
    assert!(!m.has_multimodal());
    assert_eq!(m.confidence(), Confidence::Medium);

    // (0.28 + 3 * 0.42) / 4
    let blended = m.blended_price().unwrap();
    assert!((blended - 0.385).abs() < 1e-9);
}

#[test]
fn parse_sparse_row() {
    let m = parse(json!({
        "aa_slug": "mystery",
        "aa_release_date": "soon",
        "aa_intelligence_index": null,
        "has_aa": true
    }));
    assert_eq!(m.display_name(), "mystery");
    assert!(m.release_date.is_none());
    assert!(!m.is_complete());
    assert!(m.blended_price().is_none());
    assert_eq!(m.confidence(), Confidence::Low);
}

#[test]
fn explicit_cn_flag_beats_registry() {
    let m = parse(json!({
        "aa_slug": "hosted-qwen",
        "aa_model_creator_name": "Alibaba",
        "is_cn_provider": false
    }));
    assert!(!m.is_cn());
}

#[test]
fn plain_field_names_also_parse() {
    let m = parse(json!({
        "slug": "plain",
        "name": "Plain",
        "intelligence_index": 40.0,
        "has_benchmarks": true,
        "has_routing": true
    }));
    assert!(m.is_complete());
}

#[test]
fn missing_slug_is_an_error() {
    let r: Result<CandidateModel, _> = serde_json::from_value(json!({ "aa_name": "x" }));
    assert!(r.is_err());
}
