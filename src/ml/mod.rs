/// Model loading and inference for project feasibility assessment
///
/// This module provides:
/// - Named training-time feature orderings for each model
/// - Encoding of project inputs into those orderings
/// - Artifact-backed classifiers and regressors
/// - A prediction service combining the three models

pub mod artifact;
pub mod estimator;
pub mod features;
pub mod models;
pub mod schema;
pub mod service;
pub mod store;

pub use artifact::{EstimatorSpec, ModelArtifact};
pub use estimator::{Classifier, DecisionTree, Regressor, TreeNode};
pub use features::{EncodedVector, FeatureEncoder};
pub use models::{Confidence, ConfidenceSource, ModelMetadata, ModelType, Prediction, DEFAULT_CONFIDENCE};
pub use schema::{FeatureField, ModelRole, ModelSchema, ModelTask, COST_SCHEMA, FEASIBILITY_SCHEMA, TIME_SCHEMA};
pub use service::{PredictionService, ProjectAssessment};
pub use store::{LoadedClassifier, LoadedRegressor, ModelStore};
