/// Integration tests for the prediction pipeline
///
/// These tests verify the complete path from a project input to
/// predictions:
/// - Feature encoding per model order
/// - Classification with probability-based or fallback confidence
/// - Cost and time regression
/// - Combined assessments
mod common;

use project_feasibility::ml::{
    ConfidenceSource, FeatureEncoder, ModelRole, ModelStore, PredictionService, DEFAULT_CONFIDENCE,
};
use project_feasibility::models::FeasibilityLabel;
use project_feasibility::AppError;
use std::sync::Arc;

fn setup_service(dir: &std::path::Path) -> PredictionService {
    let config = common::write_models(dir);
    let store = Arc::new(ModelStore::load(&config).unwrap());
    PredictionService::new(store, FeatureEncoder::new())
}

#[test]
fn test_feasibility_from_tree_ensemble() {
    let dir = tempfile::tempdir().unwrap();
    let service = setup_service(dir.path());

    let prediction = service.predict_feasibility(&common::road_project()).unwrap();
    assert_eq!(prediction.value, FeasibilityLabel::NotFeasible);

    let confidence = prediction.confidence.unwrap();
    assert_eq!(confidence.source, ConfidenceSource::ModelProbability);
    assert!((confidence.value - 0.5).abs() < 1e-12);

    let total: f64 = prediction.probabilities.values().sum();
    assert!((total - 1.0).abs() < 1e-12);
}

#[test]
fn test_confidence_is_max_probability() {
    let dir = tempfile::tempdir().unwrap();
    let service = setup_service(dir.path());

    for (project_type, risk, label, confidence) in [
        ("Road", 3.0, FeasibilityLabel::Feasible, 0.55),
        ("Bridge", 3.0, FeasibilityLabel::Feasible, 0.7),
        ("Road", 6.0, FeasibilityLabel::NotFeasible, 0.5),
    ] {
        let prediction = service
            .predict_feasibility(&common::project(project_type, risk))
            .unwrap();
        assert_eq!(prediction.value, label);

        let max = prediction
            .probabilities
            .values()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        let value = prediction.confidence.unwrap().value;
        assert_eq!(value, max);
        assert!((value - confidence).abs() < 1e-12);
    }
}

#[test]
fn test_tied_probabilities_pick_first_class() {
    let dir = tempfile::tempdir().unwrap();
    let service = setup_service(dir.path());

    // [0.35, 0.35, 0.3]
    let prediction = service
        .predict_feasibility(&common::project("Bridge", 6.0))
        .unwrap();
    assert_eq!(prediction.value, FeasibilityLabel::NotFeasible);
}

#[test]
fn test_forest_classifier_uses_default_confidence() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::write_models_with(dir.path(), common::forest_feasibility_artifact());
    let store = Arc::new(ModelStore::load(&config).unwrap());
    let service = PredictionService::new(store, FeatureEncoder::new());

    let prediction = service.predict_feasibility(&common::road_project()).unwrap();
    let confidence = prediction.confidence.unwrap();

    assert_eq!(confidence.value, DEFAULT_CONFIDENCE);
    assert_eq!(confidence.value, 0.85);
    assert!(confidence.is_fallback());
    assert!(prediction.probabilities.is_empty());
}

#[test]
fn test_cost_and_time_use_their_own_orders() {
    let dir = tempfile::tempdir().unwrap();
    let service = setup_service(dir.path());

    let cost = service.predict_cost(&common::road_project()).unwrap();
    assert_eq!(cost.value, 106_000.0);
    assert!(cost.confidence.is_none());

    let time = service.predict_time(&common::road_project()).unwrap();
    assert_eq!(time.value, 150.0);
}

#[test]
fn test_project_type_indicator_reaches_cost_model() {
    let dir = tempfile::tempdir().unwrap();
    let service = setup_service(dir.path());

    let building = service.predict_cost(&common::project("Building", 6.0)).unwrap();
    let road = service.predict_cost(&common::project("Road", 6.0)).unwrap();
    assert_eq!(building.value - road.value, 100_000.0);
}

#[test]
fn test_unknown_project_type_matches_reference() {
    let dir = tempfile::tempdir().unwrap();
    let service = setup_service(dir.path());

    let bridge = service.assess(&common::project("Bridge", 3.0)).unwrap();
    let tunnel = service.assess(&common::project("Tunnel", 3.0)).unwrap();

    assert_eq!(bridge.features, tunnel.features);
    assert_eq!(bridge.feasibility.value, tunnel.feasibility.value);
    assert_eq!(bridge.estimated_cost.value, tunnel.estimated_cost.value);
    assert_eq!(bridge.estimated_time.value, tunnel.estimated_time.value);
}

#[test]
fn test_strict_encoder_rejects_unknown_project_type() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::write_models(dir.path());
    let store = Arc::new(ModelStore::load(&config).unwrap());
    let service = PredictionService::new(store, FeatureEncoder::strict());

    let err = service
        .predict_cost(&common::project("Tunnel", 3.0))
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
}

#[test]
fn test_assessment_carries_feasibility_vector() {
    let dir = tempfile::tempdir().unwrap();
    let service = setup_service(dir.path());

    let assessment = service.assess(&common::road_project()).unwrap();
    assert_eq!(assessment.features.role(), ModelRole::Feasibility);
    assert_eq!(
        assessment.features.values(),
        &[500_000.0, 120.0, 7.0, 6.0, 5.0, 10.0, 8.0, 2.0, 0.0, 0.0, 1.0, 0.0]
    );
    assert!((assessment.confidence() - 0.5).abs() < 1e-12);
}

#[test]
fn test_inputs_pass_through_unvalidated() {
    let dir = tempfile::tempdir().unwrap();
    let service = setup_service(dir.path());

    let mut input = common::road_project();
    input.resource_allocation_score = -40.0;
    input.scope_complexity = 0;

    // time = 10 * -40 + 30 * 0 + 20
    assert_eq!(service.predict_time(&input).unwrap().value, -380.0);
}

fn assert_same_assessment(service: &PredictionService) {
    let input = common::road_project();
    let first = service.assess(&input).unwrap();
    let second = service.assess(&input).unwrap();

    assert_eq!(first.feasibility.value, second.feasibility.value);
    assert_eq!(first.feasibility.confidence, second.feasibility.confidence);
    assert_eq!(first.feasibility.probabilities, second.feasibility.probabilities);
    assert_eq!(first.estimated_cost.value, second.estimated_cost.value);
    assert_eq!(first.estimated_time.value, second.estimated_time.value);
    assert_eq!(first.features, second.features);
}

#[test]
fn test_identical_inputs_give_identical_assessments() {
    let dir = tempfile::tempdir().unwrap();
    assert_same_assessment(&setup_service(dir.path()));

    let forest_dir = tempfile::tempdir().unwrap();
    let config =
        common::write_models_with(forest_dir.path(), common::forest_feasibility_artifact());
    let store = Arc::new(ModelStore::load(&config).unwrap());
    assert_same_assessment(&PredictionService::new(store, FeatureEncoder::new()));
}
