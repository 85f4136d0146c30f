use crate::api::{pages, AppState};
use crate::error::Result;
use crate::ml::{ModelMetadata, Prediction, ProjectAssessment};
use crate::models::{FeasibilityLabel, ProjectInput};
use crate::visualization::ChartRequest;
use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        State,
    },
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Browsers ask for a favicon on every page load; answer with no content
pub async fn favicon() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// The empty input form
pub async fn form_page() -> Html<String> {
    Html(pages::form_page().into_string())
}

/// Form fields as posted by the input page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectForm {
    #[serde(rename = "Project_Type")]
    pub project_type: String,
    #[serde(rename = "Estimated_Cost_USD")]
    pub estimated_cost_usd: f64,
    #[serde(rename = "Time_Estimate_Days")]
    pub time_estimate_days: i64,
    #[serde(rename = "Resource_Allocation_Score")]
    pub resource_allocation_score: f64,
    #[serde(rename = "Risk_Assessment_Score")]
    pub risk_assessment_score: f64,
    #[serde(rename = "Environmental_Impact_Score")]
    pub environmental_impact_score: f64,
    #[serde(rename = "Historical_Cost_Deviation_")]
    pub historical_cost_deviation_pct: f64,
    #[serde(rename = "Stakeholder_Priority_Score")]
    pub stakeholder_priority_score: f64,
    #[serde(rename = "Scope_Complexity_Numeric")]
    pub scope_complexity: i64,
}

impl From<&ProjectForm> for ProjectInput {
    fn from(form: &ProjectForm) -> Self {
        ProjectInput {
            project_type: form.project_type.clone(),
            estimated_cost_usd: form.estimated_cost_usd,
            time_estimate_days: form.time_estimate_days,
            resource_allocation_score: form.resource_allocation_score,
            risk_assessment_score: form.risk_assessment_score,
            environmental_impact_score: form.environmental_impact_score,
            historical_cost_deviation_pct: form.historical_cost_deviation_pct,
            stakeholder_priority_score: form.stakeholder_priority_score,
            scope_complexity: form.scope_complexity,
        }
    }
}

/// Assess a submitted form and render the result page with fresh charts
pub async fn predict_form(
    State(state): State<AppState>,
    form: std::result::Result<Form<ProjectForm>, FormRejection>,
) -> Result<Html<String>> {
    let Form(form) = form?;
    let input = ProjectInput::from(&form);

    let assessment = state.service.assess(&input)?;
    let request = ChartRequest::from_assessment(&assessment, state.service.store());
    let charts = state.renderer.clone().render_blocking(request).await?;

    info!(
        project_type = %input.project_type,
        result = %assessment.feasibility.value,
        confidence = assessment.confidence(),
        "Form assessment rendered"
    );

    Ok(Html(
        pages::result_page(&form, &assessment, &charts).into_string(),
    ))
}

/// Predict feasibility from a JSON project
pub async fn predict_feasibility(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ProjectInput>, JsonRejection>,
) -> Result<Json<Prediction<FeasibilityLabel>>> {
    let Json(input) = payload?;
    Ok(Json(state.service.predict_feasibility(&input)?))
}

/// Predict cost in USD from a JSON project
pub async fn predict_cost(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ProjectInput>, JsonRejection>,
) -> Result<Json<Prediction<f64>>> {
    let Json(input) = payload?;
    Ok(Json(state.service.predict_cost(&input)?))
}

/// Predict duration in days from a JSON project
pub async fn predict_time(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ProjectInput>, JsonRejection>,
) -> Result<Json<Prediction<f64>>> {
    let Json(input) = payload?;
    Ok(Json(state.service.predict_time(&input)?))
}

/// Run all three models on a JSON project
pub async fn create_assessment(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ProjectInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ProjectAssessment>)> {
    let Json(input) = payload?;
    let assessment = state.service.assess(&input)?;
    Ok((StatusCode::CREATED, Json(assessment)))
}

/// Metadata of the loaded models
pub async fn list_models(State(state): State<AppState>) -> Json<Vec<ModelMetadata>> {
    Json(state.service.model_metadata())
}

/// Prometheus metrics endpoint
///
/// Returns metrics in Prometheus text exposition format
pub async fn metrics() -> impl IntoResponse {
    let metrics = crate::metrics::gather_metrics();
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics,
    )
}
