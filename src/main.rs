use project_feasibility::{
    api::{build_router, AppState},
    config::Config,
    ml::{FeatureEncoder, ModelStore, PredictionService},
    visualization::ChartRenderer,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("Using default configuration");
        Config::default()
    });

    init_tracing(&config);

    tracing::info!("Starting Project Feasibility v{}", env!("CARGO_PKG_VERSION"));

    // Initialize Prometheus metrics
    if config.observability.prometheus_enabled {
        if let Err(e) = project_feasibility::metrics::init_metrics() {
            tracing::warn!("Failed to initialize metrics: {}", e);
            tracing::warn!("Continuing without metrics");
        } else {
            tracing::info!("✅ Prometheus metrics initialized");
        }
    } else {
        tracing::info!("⚠️  Prometheus metrics disabled in configuration");
    }

    // Models are required; a missing or inconsistent artifact stops start-up
    let store = match ModelStore::load(&config.models) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::error!("Failed to load models: {}", e);
            return Err(e.into());
        }
    };

    let encoder = FeatureEncoder::new().with_strict_project_type(config.models.strict_project_type);
    let service = Arc::new(PredictionService::new(store, encoder));
    tracing::info!("✅ Prediction service initialized");

    let renderer = Arc::new(ChartRenderer::new(&config.charts.static_dir)?);
    tracing::info!(
        "✅ Chart renderer writing to {}",
        config.charts.static_dir.display()
    );

    let app = build_router(AppState::new(service, renderer));

    // Start HTTP server
    let http_addr = format!("{}:{}", config.server.host, config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_addr).await?;

    tracing::info!("🚀 HTTP server listening on http://{}", http_addr);
    tracing::info!("   Form: http://{}/", http_addr);
    tracing::info!("   Health check: http://{}/health", http_addr);
    tracing::info!("   REST API: http://{}/v1/assessments", http_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let http_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(http_listener, app).await {
            tracing::error!("HTTP server error: {}", e);
        }
    });

    tokio::select! {
        _ = http_handle => {
            tracing::warn!("HTTP server stopped");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    tracing::info!("Shutting down gracefully...");
    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "project_feasibility={},tower_http=info",
            config.observability.log_level
        )
        .into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.observability.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
