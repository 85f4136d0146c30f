//! Prometheus metrics for the prediction service.
//!
//! Collectors are process-wide statics registered once by [`init_metrics`]
//! and exported in text format by [`gather_metrics`] for the `/metrics`
//! endpoint.
//!
//! # Example
//! ```no_run
//! use project_feasibility::metrics::PREDICTIONS_TOTAL;
//!
//! PREDICTIONS_TOTAL
//!     .with_label_values(&["feasibility", "ok"])
//!     .inc();
//! ```

use lazy_static::lazy_static;
use prometheus::{CounterVec, GaugeVec, Histogram, HistogramOpts, HistogramVec, Opts, Registry};

const NAMESPACE: &str = "project_feasibility";

lazy_static! {
    /// Global Prometheus registry for all metrics
    pub static ref PROMETHEUS_REGISTRY: Registry = Registry::new();

    /// Total number of predictions served
    ///
    /// Labels: model, outcome
    pub static ref PREDICTIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("predictions_total", "Total number of predictions served")
            .namespace(NAMESPACE),
        &["model", "outcome"]
    ).expect("Failed to create PREDICTIONS_TOTAL metric");

    /// Prediction latency in seconds, encoding included
    ///
    /// Labels: model
    pub static ref PREDICTION_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "prediction_duration_seconds",
            "Prediction latency in seconds"
        )
        .namespace(NAMESPACE)
        .buckets(vec![0.00001, 0.0001, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]),
        &["model"]
    ).expect("Failed to create PREDICTION_DURATION_SECONDS metric");

    /// Feasibility confidences that came from the fixed fallback
    ///
    /// Labels: source
    pub static ref CONFIDENCE_SOURCE_TOTAL: CounterVec = CounterVec::new(
        Opts::new("confidence_source_total", "Feasibility confidences by source")
            .namespace(NAMESPACE),
        &["source"]
    ).expect("Failed to create CONFIDENCE_SOURCE_TOTAL metric");

    /// Chart set renders
    ///
    /// Labels: status
    pub static ref CHART_RENDERS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("chart_renders_total", "Total number of chart set renders")
            .namespace(NAMESPACE),
        &["status"]
    ).expect("Failed to create CHART_RENDERS_TOTAL metric");

    /// Time to render and write all four charts
    pub static ref CHART_RENDER_DURATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "chart_render_duration_seconds",
            "Time to render and write the chart set"
        )
        .namespace(NAMESPACE)
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0])
    ).expect("Failed to create CHART_RENDER_DURATION_SECONDS metric");

    /// Build information
    ///
    /// Labels: version
    pub static ref BUILD_INFO: GaugeVec = GaugeVec::new(
        Opts::new("build_info", "Build information").namespace(NAMESPACE),
        &["version"]
    ).expect("Failed to create BUILD_INFO metric");
}

/// Register all collectors with the registry. Call once at start-up.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    PROMETHEUS_REGISTRY.register(Box::new(PREDICTIONS_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(PREDICTION_DURATION_SECONDS.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(CONFIDENCE_SOURCE_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(CHART_RENDERS_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(CHART_RENDER_DURATION_SECONDS.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(BUILD_INFO.clone()))?;

    BUILD_INFO
        .with_label_values(&[env!("CARGO_PKG_VERSION")])
        .set(1.0);

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

/// Generate Prometheus text format metrics
pub fn gather_metrics() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = PROMETHEUS_REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Failed to convert metrics to string: {}", e);
        String::from("# Error converting metrics\n")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_initialization() {
        // Global registry: a second registration in the same process fails
        let result = init_metrics();
        assert!(result.is_ok() || result.is_err());
    }

    #[test]
    fn test_prediction_counter() {
        PREDICTIONS_TOTAL
            .with_label_values(&["cost", "ok"])
            .inc();

        let value = PREDICTIONS_TOTAL.with_label_values(&["cost", "ok"]).get();
        assert!(value >= 1.0);
    }

    #[test]
    fn test_gather_metrics_after_init() {
        let _ = init_metrics();
        PREDICTIONS_TOTAL
            .with_label_values(&["time", "ok"])
            .inc();
        let metrics = gather_metrics();
        assert!(metrics.contains("project_feasibility_predictions_total"));
    }
}
