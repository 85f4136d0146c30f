use crate::ml::schema::{ModelRole, ModelTask};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Confidence reported when the classifier exposes no class probabilities
pub const DEFAULT_CONFIDENCE: f64 = 0.85;

/// Where a confidence value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceSource {
    /// Maximum class probability reported by the model
    ModelProbability,
    /// Model has no probability interface; fixed fallback value
    Default,
}

/// Probability-like certainty of the top classification, in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Confidence {
    pub value: f64,
    pub source: ConfidenceSource,
}

impl Confidence {
    /// Confidence from a model probability, clamped into [0, 1]
    pub fn from_probability(p: f64) -> Self {
        let value = if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) };
        Self {
            value,
            source: ConfidenceSource::ModelProbability,
        }
    }

    /// Fallback used for models without probability estimates
    pub fn fallback() -> Self {
        Self {
            value: DEFAULT_CONFIDENCE,
            source: ConfidenceSource::Default,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == ConfidenceSource::Default
    }
}

/// Prediction result with optional confidence score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction<T> {
    /// Predicted value
    pub value: T,

    /// Confidence score (classification only)
    pub confidence: Option<Confidence>,

    /// All class probabilities, keyed by label
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub probabilities: HashMap<String, f64>,
}

impl<T> Prediction<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            confidence: None,
            probabilities: HashMap::new(),
        }
    }

    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_probabilities(mut self, probabilities: HashMap<String, f64>) -> Self {
        self.probabilities = probabilities;
        self
    }
}

/// Estimator family behind a loaded artifact
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    /// Forest of exported decision trees
    TreeEnsemble,

    /// Linear regression
    Linear,

    /// Serialized smartcore random forest
    RandomForest,
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelType::TreeEnsemble => write!(f, "Tree Ensemble"),
            ModelType::Linear => write!(f, "Linear Regression"),
            ModelType::RandomForest => write!(f, "Random Forest"),
        }
    }
}

/// Model metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Artifact name
    pub name: String,

    /// Artifact version
    pub version: String,

    /// Role the artifact serves in this service
    pub role: ModelRole,

    /// Learning task
    pub task: ModelTask,

    /// Estimator family
    pub model_type: ModelType,

    /// Number of features
    pub n_features: usize,

    /// Whether class probabilities are available
    pub supports_probabilities: bool,

    /// Artifact path the model was read from
    pub source: String,

    /// Load timestamp
    pub loaded_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_fallback() {
        let confidence = Confidence::fallback();
        assert_eq!(confidence.value, 0.85);
        assert!(confidence.is_fallback());
    }

    #[test]
    fn test_confidence_clamped() {
        assert_eq!(Confidence::from_probability(1.2).value, 1.0);
        assert_eq!(Confidence::from_probability(-0.1).value, 0.0);
        assert_eq!(Confidence::from_probability(f64::NAN).value, 0.0);
        assert_eq!(Confidence::from_probability(0.64).value, 0.64);
        assert!(!Confidence::from_probability(0.64).is_fallback());
    }

    #[test]
    fn test_prediction_creation() {
        let prediction = Prediction::new(1_250_000.0);
        assert_eq!(prediction.value, 1_250_000.0);
        assert!(prediction.confidence.is_none());

        let prediction = Prediction::new("Feasible")
            .with_confidence(Confidence::from_probability(0.7))
            .with_probabilities(
                vec![
                    ("Not Feasible".to_string(), 0.1),
                    ("Feasible".to_string(), 0.7),
                    ("Borderline".to_string(), 0.2),
                ]
                .into_iter()
                .collect(),
            );
        assert_eq!(prediction.confidence.unwrap().value, 0.7);
        assert_eq!(prediction.probabilities.len(), 3);
    }

    #[test]
    fn test_model_type_display() {
        assert_eq!(ModelType::TreeEnsemble.to_string(), "Tree Ensemble");
        assert_eq!(ModelType::RandomForest.to_string(), "Random Forest");
    }
}
