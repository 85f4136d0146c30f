//! On-disk model artifacts.
//!
//! An artifact is a JSON document carrying the estimator together with the
//! column order it was trained on. Training happens elsewhere; this module
//! only reads, checks and instantiates artifacts.

use crate::error::{AppError, Result};
use crate::ml::estimator::{
    Classifier, DecisionTree, ForestClassifier, ForestRegressor, LinearRegressor, Regressor,
    TreeEnsembleClassifier, TreeEnsembleRegressor,
};
use crate::ml::schema::{ModelRole, ModelTask};
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_classifier::RandomForestClassifier;
use smartcore::ensemble::random_forest_regressor::RandomForestRegressor;
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Serialized estimator, tagged by `kind`
#[derive(Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EstimatorSpec {
    TreeEnsemble {
        trees: Vec<DecisionTree>,
        /// Classes per leaf; absent for regression
        #[serde(default)]
        n_classes: Option<usize>,
    },
    Linear {
        coefficients: Vec<f64>,
        intercept: f64,
    },
    RandomForestClassifier {
        n_classes: usize,
        model: RandomForestClassifier<f64, i32, DenseMatrix<f64>, Vec<i32>>,
    },
    RandomForestRegressor {
        model: RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>,
    },
}

impl EstimatorSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            EstimatorSpec::TreeEnsemble { .. } => "tree_ensemble",
            EstimatorSpec::Linear { .. } => "linear",
            EstimatorSpec::RandomForestClassifier { .. } => "random_forest_classifier",
            EstimatorSpec::RandomForestRegressor { .. } => "random_forest_regressor",
        }
    }
}

/// A persisted, externally trained model
#[derive(Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Human readable name
    pub name: String,

    /// Artifact version
    #[serde(default = "default_version")]
    pub version: String,

    /// Learning task the estimator was trained for
    pub task: ModelTask,

    /// Training-time column names, in order
    pub feature_names: Vec<String>,

    /// Importances recorded at training time
    #[serde(default)]
    pub feature_importances: Option<Vec<f64>>,

    /// The estimator itself
    pub estimator: EstimatorSpec,
}

fn default_version() -> String {
    "1".to_string()
}

impl ModelArtifact {
    /// Read an artifact from a JSON file
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            AppError::ModelUnavailable(format!("cannot open {}: {}", path.display(), e))
        })?;

        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            AppError::ModelUnavailable(format!("cannot parse {}: {}", path.display(), e))
        })
    }

    /// Write an artifact as JSON
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer(BufWriter::new(file), self)?;
        Ok(())
    }

    /// Check the artifact header against the schema of a model role
    pub fn check_against(&self, role: ModelRole) -> Result<()> {
        if self.task != role.task() {
            return Err(AppError::ModelUnavailable(format!(
                "{} artifact '{}' is a {} model, expected {}",
                role,
                self.name,
                self.task,
                role.task()
            )));
        }

        role.schema()
            .check_names(&self.feature_names)
            .map_err(|message| AppError::encoding_mismatch(role.to_string(), message))?;

        if let Some(importances) = &self.feature_importances {
            if importances.len() != self.feature_names.len() {
                return Err(AppError::encoding_mismatch(
                    role.to_string(),
                    format!(
                        "{} importances for {} features",
                        importances.len(),
                        self.feature_names.len()
                    ),
                ));
            }
        }

        Ok(())
    }

    /// Instantiate the estimator as a classifier
    pub fn into_classifier(self) -> Result<Box<dyn Classifier>> {
        let n_features = self.feature_names.len();
        match self.estimator {
            EstimatorSpec::TreeEnsemble { trees, n_classes } => {
                let n_classes = n_classes.ok_or_else(|| {
                    AppError::ModelUnavailable(format!(
                        "classifier '{}' does not declare n_classes",
                        self.name
                    ))
                })?;
                Ok(Box::new(TreeEnsembleClassifier::new(trees, n_features, n_classes)?))
            }
            EstimatorSpec::RandomForestClassifier { n_classes, model } => {
                Ok(Box::new(ForestClassifier::new(model, n_features, n_classes)?))
            }
            other => Err(AppError::ModelUnavailable(format!(
                "'{}' estimator of '{}' cannot classify",
                other.kind(),
                self.name
            ))),
        }
    }

    /// Instantiate the estimator as a regressor
    pub fn into_regressor(self) -> Result<Box<dyn Regressor>> {
        let n_features = self.feature_names.len();
        match self.estimator {
            EstimatorSpec::TreeEnsemble { trees, .. } => {
                Ok(Box::new(TreeEnsembleRegressor::new(trees, n_features)?))
            }
            EstimatorSpec::Linear {
                coefficients,
                intercept,
            } => Ok(Box::new(LinearRegressor::new(coefficients, intercept, n_features)?)),
            EstimatorSpec::RandomForestRegressor { model } => {
                Ok(Box::new(ForestRegressor::new(model, n_features)?))
            }
            other => Err(AppError::ModelUnavailable(format!(
                "'{}' estimator of '{}' cannot regress",
                other.kind(),
                self.name
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::schema::{COST_SCHEMA, TIME_SCHEMA};

    fn linear_artifact(feature_names: Vec<String>) -> ModelArtifact {
        let n = feature_names.len();
        ModelArtifact {
            name: "cost".to_string(),
            version: "1".to_string(),
            task: ModelTask::Regression,
            feature_names,
            feature_importances: None,
            estimator: EstimatorSpec::Linear {
                coefficients: vec![1.0; n],
                intercept: 0.0,
            },
        }
    }

    #[test]
    fn test_check_against_accepts_matching_schema() {
        let artifact = linear_artifact(COST_SCHEMA.field_names());
        assert!(artifact.check_against(ModelRole::Cost).is_ok());
    }

    #[test]
    fn test_check_against_rejects_swapped_order() {
        let artifact = linear_artifact(TIME_SCHEMA.field_names());
        let err = artifact.check_against(ModelRole::Cost).unwrap_err();
        assert!(matches!(err, AppError::EncodingMismatch { .. }));
    }

    #[test]
    fn test_check_against_rejects_wrong_task() {
        let artifact = linear_artifact(COST_SCHEMA.field_names());
        let err = artifact.check_against(ModelRole::Feasibility).unwrap_err();
        assert!(matches!(err, AppError::ModelUnavailable(_)));
    }

    #[test]
    fn test_linear_cannot_classify() {
        let artifact = linear_artifact(COST_SCHEMA.field_names());
        assert!(artifact.into_classifier().is_err());
    }

    #[test]
    fn test_parse_tree_ensemble_json() {
        let json = r#"{
            "name": "toy",
            "task": "regression",
            "feature_names": ["a"],
            "estimator": {
                "kind": "tree_ensemble",
                "trees": [{"nodes": [
                    {"type": "split", "feature": 0, "threshold": 1.5, "left": 1, "right": 2},
                    {"type": "leaf", "value": [10.0]},
                    {"type": "leaf", "value": [20.0]}
                ]}]
            }
        }"#;
        let artifact: ModelArtifact = serde_json::from_str(json).unwrap();
        assert_eq!(artifact.version, "1");
        assert_eq!(artifact.estimator.kind(), "tree_ensemble");

        let regressor = artifact.into_regressor().unwrap();
        let x = ndarray::array![[2.0]];
        assert_eq!(regressor.predict(&x).unwrap(), vec![20.0]);
    }

    #[test]
    fn test_missing_file_is_model_unavailable() {
        let err = ModelArtifact::from_path(Path::new("/nonexistent/model.json"))
            .err()
            .unwrap();
        assert!(matches!(err, AppError::ModelUnavailable(_)));
    }
}
