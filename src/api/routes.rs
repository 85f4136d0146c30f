use crate::api::{handlers, AppState};
use crate::visualization::STATIC_PREFIX;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

/// Build the main router: form page, JSON API and chart files
pub fn build_router(state: AppState) -> Router {
    let static_files = ServeDir::new(state.static_dir());

    Router::new()
        // Form page
        .route("/", get(handlers::form_page))
        .route("/predict", post(handlers::predict_form))
        .route("/favicon.ico", get(handlers::favicon))
        // Health and metrics
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
        // JSON API
        .route("/v1/predictions/feasibility", post(handlers::predict_feasibility))
        .route("/v1/predictions/cost", post(handlers::predict_cost))
        .route("/v1/predictions/time", post(handlers::predict_time))
        .route("/v1/assessments", post(handlers::create_assessment))
        .route("/v1/models", get(handlers::list_models))
        .nest_service(STATIC_PREFIX, static_files)
        // Add state
        .with_state(state)
        // Add middleware
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
}
