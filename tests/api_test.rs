//! HTTP tests for the form page, JSON API and chart files
//!
//! The router runs in-process against fixture models and a temporary
//! static directory.

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use project_feasibility::api::{build_router, AppState};
use project_feasibility::ml::{FeatureEncoder, ModelStore, PredictionService};
use project_feasibility::visualization::{ChartKind, ChartRenderer};
use std::sync::Arc;
use strum::IntoEnumIterator;
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    static_dir: std::path::PathBuf,
    _models: TempDir,
    _static: TempDir,
}

fn build_test_app() -> TestApp {
    let models = tempfile::tempdir().unwrap();
    let static_root = tempfile::tempdir().unwrap();

    let config = common::write_models(models.path());
    let store = Arc::new(ModelStore::load(&config).unwrap());
    let service = Arc::new(PredictionService::new(store, FeatureEncoder::new()));
    let static_dir = static_root.path().join("static");
    let renderer = Arc::new(ChartRenderer::new(&static_dir).unwrap());

    TestApp {
        router: build_router(AppState::new(service, renderer)),
        static_dir,
        _models: models,
        _static: static_root,
    }
}

const ROAD_FORM: &str = "Project_Type=Road&Estimated_Cost_USD=500000&Time_Estimate_Days=120\
&Resource_Allocation_Score=7&Risk_Assessment_Score=6&Environmental_Impact_Score=5\
&Historical_Cost_Deviation_=10&Stakeholder_Priority_Score=8&Scope_Complexity_Numeric=2";

fn road_json() -> String {
    serde_json::to_string(&common::road_project()).unwrap()
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, content_type: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_form_page() {
    let app = build_test_app();
    let (status, body) = send(app.router, get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("action=\"/predict\""));
    assert!(body.contains("name=\"Scope_Complexity_Numeric\""));
    assert!(!body.contains("<iframe"));
}

#[tokio::test]
async fn test_form_submission_renders_result_and_charts() {
    let app = build_test_app();
    let (status, body) = send(
        app.router,
        post(
            "/predict",
            "application/x-www-form-urlencoded",
            ROAD_FORM.to_string(),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Not Feasible"));
    assert!(body.contains("50.0%"));
    assert!(body.contains("106,000.00"));
    assert!(body.contains("150 days"));

    for kind in ChartKind::iter() {
        assert!(body.contains(&format!("/static/{}?v=", kind.file_name())));

        let html = std::fs::read_to_string(app.static_dir.join(kind.file_name())).unwrap();
        assert!(!html.is_empty());
    }

    // Submitted values are kept in the form
    assert!(body.contains("value=\"500000\""));
    assert!(body.contains("<option value=\"Road\" selected>"));
}

#[tokio::test]
async fn test_form_with_missing_field_is_rejected() {
    let app = build_test_app();
    let (status, body) = send(
        app.router,
        post(
            "/predict",
            "application/x-www-form-urlencoded",
            "Project_Type=Road&Estimated_Cost_USD=500000".to_string(),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("INVALID_INPUT"));
}

#[tokio::test]
async fn test_chart_files_are_served() {
    let app = build_test_app();
    let (status, _) = send(
        app.router.clone(),
        post(
            "/predict",
            "application/x-www-form-urlencoded",
            ROAD_FORM.to_string(),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(app.router, get("/static/gauge_chart.html?v=1")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<html"));
}

#[tokio::test]
async fn test_favicon_has_no_content() {
    let app = build_test_app();
    let (status, body) = send(app.router, get("/favicon.ico")).await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_health_check() {
    let app = build_test_app();
    let (status, body) = send(app.router, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_create_assessment() {
    let app = build_test_app();
    let (status, body) = send(
        app.router,
        post("/v1/assessments", "application/json", road_json()),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["feasibility"]["value"], "Not Feasible");
    assert_eq!(json["estimated_cost"]["value"], 106_000.0);
    assert_eq!(json["estimated_time"]["value"], 150.0);
    assert_eq!(json["features"]["values"].as_array().unwrap().len(), 12);
}

#[tokio::test]
async fn test_single_model_predictions() {
    let app = build_test_app();

    let (status, body) = send(
        app.router.clone(),
        post("/v1/predictions/cost", "application/json", road_json()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["value"], 106_000.0);
    assert!(json["confidence"].is_null());

    let (status, body) = send(
        app.router.clone(),
        post("/v1/predictions/time", "application/json", road_json()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["value"], 150.0);

    let (status, body) = send(
        app.router,
        post("/v1/predictions/feasibility", "application/json", road_json()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["value"], "Not Feasible");
    assert_eq!(json["confidence"]["source"], "model_probability");
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let app = build_test_app();
    let (status, body) = send(
        app.router,
        post(
            "/v1/assessments",
            "application/json",
            "{\"project_type\": \"Road\"".to_string(),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"]["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_list_models() {
    let app = build_test_app();
    let (status, body) = send(app.router, get("/v1/models")).await;

    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    let models = json.as_array().unwrap();
    assert_eq!(models.len(), 3);
    assert_eq!(models[0]["name"], "feasibility-ensemble");
}
