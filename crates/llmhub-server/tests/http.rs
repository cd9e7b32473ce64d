use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use llmhub_core::{snapshot::load_bundled_snapshots, Recommender};
use llmhub_server::{router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> Router {
    let rows = load_bundled_snapshots().unwrap();
    let state = AppState::new(Recommender::bundled().unwrap(), rows, "bundled".into());
    router(Arc::new(state))
}

async fn send(req: Request<Body>) -> (StatusCode, Option<String>, Value) {
    let res = app().oneshot(req).await.unwrap();
    let status = res.status();
    let allow = res
        .headers()
        .get(header::ALLOW)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, allow, body)
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn candidate(name: &str, latency: f64) -> Value {
    json!({
        "name": name,
        "provider": "lab",
        "pricing": { "input_per_1k_usd": 0.001, "output_per_1k_usd": 0.002 },
        "limits": { "context_window_tokens": 128000 },
        "capabilities": { "tools": true, "json_schema": true },
        "performance": { "quality_0_10": 7.5, "reliability_0_10": 8.0, "p95_latency_ms": latency },
        "integration_fit_0_10": 7.0
    })
}

#[tokio::test]
async fn health_reports_service() {
    let req = Request::get("/health").body(Body::empty()).unwrap();
    let (status, _, body) = send(req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["service"], "model-recommendation-api");
    assert!(body["now"].as_str().is_some());
}

#[tokio::test]
async fn simple_evaluation_ranks_supplied_candidates() {
    let payload = json!({
        "scenario": { "output_tokens_p50": 800 },
        "candidates": [candidate("slow", 3000.0), candidate("fast", 900.0)]
    });
    let (status, _, body) = send(post_json("/v1/model-recommendation", &payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ranking"][0]["name"], "fast");
    assert!(body.get("source").is_none());
}

#[tokio::test]
async fn alias_route_shapes_snapshots() {
    let payload = json!({ "scenario": { "must_support_tools": true } });
    let (status, _, body) = send(post_json("/api/recommendations", &payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"]["source"], "bundled");
    assert!(!body["ranking"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn null_candidates_shape_snapshots() {
    let payload = json!({ "scenario": {}, "candidates": null });
    let (status, _, body) = send(post_json("/v1/model-recommendation", &payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"]["source"], "bundled");
}

#[tokio::test]
async fn infeasible_is_unprocessable() {
    let payload = json!({
        "scenario": { "context_window_min_tokens": 50_000_000 },
        "candidates": [candidate("small", 900.0)]
    });
    let (status, _, body) = send(post_json("/v1/model-recommendation", &payload)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "no_feasible_candidates");
    assert_eq!(body["rejected"][0]["reasons"][0], "context_window_too_small");
}

#[tokio::test]
async fn bad_payloads_are_rejected() {
    let req = Request::post("/v1/model-recommendation")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _, body) = send(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_payload");

    let (status, _, body) = send(post_json("/v1/model-recommendation", &json!([1, 2]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Payload must be a JSON object.");

    let payload = json!({ "candidates": [{ "provider": "x" }] });
    let (status, _, body) = send(post_json("/v1/model-recommendation", &payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("non-empty 'name'"));
}

#[tokio::test]
async fn wrong_method_gets_allow_header() {
    let req = Request::get("/v1/model-recommendation").body(Body::empty()).unwrap();
    let (status, allow, body) = send(req).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(allow.as_deref(), Some("POST"));
    assert_eq!(body["error"], "method_not_allowed");
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let req = Request::get("/nope").body(Body::empty()).unwrap();
    let (status, _, body) = send(req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
    assert_eq!(body["message"], "Route not found: GET /nope");
}

#[tokio::test]
async fn full_engine_uses_snapshots_by_default() {
    let payload = json!({
        "scenario": { "category": "code", "sub_scenario": "generation" },
        "profile": "best_value"
    });
    let (status, _, body) = send(post_json("/v1/recommend", &payload)).await;
    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 4);
    assert_eq!(results[0]["rank"], 1);
    let total = results[0]["scores"]["total"].as_f64().unwrap();
    assert!((0.0..=100.0).contains(&total));
}

#[tokio::test]
async fn full_engine_requires_a_category() {
    let (status, _, body) = send(post_json("/v1/recommend", &json!({ "top_k": 2 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_payload");
}
