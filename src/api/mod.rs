pub mod handlers;
pub mod pages;
pub mod routes;

pub use routes::*;

use crate::ml::PredictionService;
use crate::visualization::ChartRenderer;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PredictionService>,
    pub renderer: Arc<ChartRenderer>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(service: Arc<PredictionService>, renderer: Arc<ChartRenderer>) -> Self {
        Self {
            service,
            renderer,
            started_at: Instant::now(),
        }
    }

    /// Directory served under `/static`
    pub fn static_dir(&self) -> PathBuf {
        self.renderer.static_dir().to_path_buf()
    }
}
