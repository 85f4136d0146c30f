use crate::error::{AppError, Result};
use crate::metrics::{CHART_RENDERS_TOTAL, CHART_RENDER_DURATION_SECONDS};
use crate::ml::schema::{ModelRole, FEASIBILITY_SCHEMA};
use crate::ml::service::ProjectAssessment;
use crate::ml::store::ModelStore;
use crate::models::FeasibilityLabel;
use crate::visualization::charts::{self, CHARTED_FEATURES};
use parking_lot::Mutex;
use plotly::Plot;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use strum::{EnumIter, IntoEnumIterator};
use tracing::{debug, error};

/// URL prefix the static directory is served under
pub const STATIC_PREFIX: &str = "/static";

/// The four charts produced per assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum ChartKind {
    FeatureImportance,
    Radar,
    Gauge,
    Distribution,
}

impl ChartKind {
    /// Fixed file name inside the static directory
    pub fn file_name(&self) -> &'static str {
        match self {
            ChartKind::FeatureImportance => "feature_importance.html",
            ChartKind::Radar => "radar_chart.html",
            ChartKind::Gauge => "gauge_chart.html",
            ChartKind::Distribution => "distribution_chart.html",
        }
    }
}

/// Everything the four charts are drawn from
#[derive(Debug, Clone)]
pub struct ChartRequest {
    pub feature_names: Vec<String>,
    pub feature_importances: Option<Vec<f64>>,
    /// The eight raw inputs in feasibility column order
    pub inputs: Vec<f64>,
    pub risk_score: f64,
    pub label: FeasibilityLabel,
}

impl ChartRequest {
    /// Build a request from an assessment and the feasibility model's importances
    pub fn from_assessment(assessment: &ProjectAssessment, store: &ModelStore) -> Self {
        let values = assessment.features.values();
        let inputs: Vec<f64> = values.iter().take(CHARTED_FEATURES).copied().collect();
        let risk_score = inputs.get(3).copied().unwrap_or_default();

        Self {
            feature_names: FEASIBILITY_SCHEMA.field_names(),
            feature_importances: store
                .feature_importances(ModelRole::Feasibility)
                .map(<[f64]>::to_vec),
            inputs,
            risk_score,
            label: assessment.feasibility.value,
        }
    }
}

/// Cache-busted URLs of one rendered chart set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartPaths {
    pub feature_importance: String,
    pub radar: String,
    pub gauge: String,
    pub distribution: String,
    /// Unix timestamp appended as `?v=`
    pub version: i64,
}

impl ChartPaths {
    pub fn new(version: i64) -> Self {
        let url = |kind: ChartKind| format!("{}/{}?v={}", STATIC_PREFIX, kind.file_name(), version);
        Self {
            feature_importance: url(ChartKind::FeatureImportance),
            radar: url(ChartKind::Radar),
            gauge: url(ChartKind::Gauge),
            distribution: url(ChartKind::Distribution),
            version,
        }
    }
}

/// Writes chart documents to fixed paths under the static directory.
///
/// Concurrent requests overwrite the same files; the lock only keeps one
/// request's four files from interleaving with another's.
pub struct ChartRenderer {
    static_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl ChartRenderer {
    /// Create a renderer, creating the static directory if needed
    pub fn new(static_dir: impl Into<PathBuf>) -> Result<Self> {
        let static_dir = static_dir.into();
        std::fs::create_dir_all(&static_dir).map_err(|e| {
            AppError::Rendering(format!(
                "cannot create static directory {}: {}",
                static_dir.display(),
                e
            ))
        })?;

        Ok(Self {
            static_dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn static_dir(&self) -> &Path {
        &self.static_dir
    }

    /// Path of a chart file on disk
    pub fn chart_path(&self, kind: ChartKind) -> PathBuf {
        self.static_dir.join(kind.file_name())
    }

    /// Render and write all four charts
    pub fn render_all(&self, request: &ChartRequest) -> Result<ChartPaths> {
        let timer = CHART_RENDER_DURATION_SECONDS.start_timer();

        let result = self.write_charts(request);
        timer.observe_duration();

        match &result {
            Ok(_) => CHART_RENDERS_TOTAL.with_label_values(&["ok"]).inc(),
            Err(e) => {
                error!("Chart rendering failed: {}", e);
                CHART_RENDERS_TOTAL.with_label_values(&["error"]).inc();
            }
        }

        result
    }

    /// Render on the blocking pool
    pub async fn render_blocking(self: Arc<Self>, request: ChartRequest) -> Result<ChartPaths> {
        tokio::task::spawn_blocking(move || self.render_all(&request))
            .await
            .map_err(|e| AppError::Internal(format!("chart rendering task failed: {}", e)))?
    }

    fn write_charts(&self, request: &ChartRequest) -> Result<ChartPaths> {
        if request.inputs.len() < CHARTED_FEATURES {
            return Err(AppError::Rendering(format!(
                "expected {} chart inputs, got {}",
                CHARTED_FEATURES,
                request.inputs.len()
            )));
        }

        // Build every document before touching the files
        let documents: Vec<(ChartKind, String)> = ChartKind::iter()
            .map(|kind| (kind, Self::build(kind, request).to_html()))
            .collect();

        let _guard = self.write_lock.lock();
        for (kind, html) in &documents {
            let path = self.chart_path(*kind);
            std::fs::write(&path, html).map_err(|e| {
                AppError::Rendering(format!("cannot write {}: {}", path.display(), e))
            })?;
        }

        let version = chrono::Utc::now().timestamp();
        debug!(dir = %self.static_dir.display(), version, "Charts written");
        Ok(ChartPaths::new(version))
    }

    fn build(kind: ChartKind, request: &ChartRequest) -> Plot {
        match kind {
            ChartKind::FeatureImportance => charts::feature_importance(
                &request.feature_names,
                request.feature_importances.as_deref(),
            ),
            ChartKind::Radar => charts::radar(&request.inputs),
            ChartKind::Gauge => charts::gauge(request.risk_score, request.label),
            ChartKind::Distribution => charts::distribution(&request.inputs),
        }
    }
}
