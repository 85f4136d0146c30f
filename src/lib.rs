//! Construction project feasibility service.
//!
//! Encodes project attributes for three externally trained models
//! (feasibility classifier, cost and time regressors), runs them, and renders
//! the results with four charts behind an axum web front end.

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod ml;
pub mod models;
pub mod visualization;

pub use error::{AppError, Result};
